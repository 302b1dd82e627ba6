//! Per-node images, environments and file templates.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use data_encoding::BASE64;
use testbed_common::constants::DEFAULT_IMAGE_TAG;
use testbed_common::error::{Result, TestbedError};
use testbed_common::value::{self, Value, ValueMap};

use super::SizedBuild;
use crate::images::ImageAliasTable;
use crate::normalize;

/// Assigns one image per node.
///
/// A node takes its indexed `--image`, else the unindexed one, else keeps
/// an inherited image, else the `stable` alias. Every name given on the
/// command line goes through the alias table.
///
/// # Errors
///
/// Returns the override parser's errors, or
/// [`TestbedError::IndexOutOfRange`] for an index past the last node.
pub fn apply_images(
    sized: &mut SizedBuild<'_>,
    images: Option<&[String]>,
    table: &ImageAliasTable,
) -> Result<()> {
    let nodes = sized.nodes();
    let overrides = match images {
        Some(tokens) => {
            let parsed = normalize::parse_indexed(tokens, "images")?;
            parsed.check_range("--image", nodes)?;
            parsed
        }
        None => normalize::IndexedOverrides::default(),
    };

    let doc = sized.document();
    let blockchain = doc.blockchain.clone();
    let inherited = std::mem::take(&mut doc.images);
    doc.images = (0..nodes)
        .map(|i| match overrides.value_for(i) {
            Some(name) => table.resolve(&blockchain, name),
            None => inherited
                .get(i)
                .or_else(|| inherited.first())
                .filter(|image| !image.is_empty())
                .cloned()
                .unwrap_or_else(|| table.resolve(&blockchain, DEFAULT_IMAGE_TAG)),
        })
        .collect();
    tracing::debug!(images = ?doc.images, "assigned images");
    Ok(())
}

/// Replaces the environments with the `--env` pairs.
///
/// `KEY=value` goes to every node; `index:KEY=value` goes to one node and
/// wins over a broadcast of the same key, whatever the order given.
///
/// # Errors
///
/// Returns [`TestbedError::MalformedOverride`] for a token without `=` or
/// with an empty variable name, or [`TestbedError::IndexOutOfRange`] for a
/// bad node prefix.
pub fn apply_env(sized: &mut SizedBuild<'_>, env: Option<&[String]>) -> Result<()> {
    let Some(tokens) = env else {
        return Ok(());
    };
    let nodes = sized.nodes();
    let mut broadcast = Vec::new();
    let mut indexed = Vec::new();

    for token in tokens {
        let (key, val) = normalize::split_pair(token)?;
        let (index, name) = normalize::split_env_key(key);
        let name = name.trim();
        if name.is_empty() {
            return Err(TestbedError::MalformedOverride {
                raw: token.clone(),
                reason: "empty variable name".into(),
            });
        }
        match index {
            Some(index) => {
                let node = normalize::check_index("--env", index, nodes)?;
                indexed.push((node, name, val));
            }
            None => broadcast.push((name, val)),
        }
    }

    let mut environments = vec![BTreeMap::new(); nodes];
    for (name, val) in broadcast {
        for env in &mut environments {
            let _ = env.insert(name.to_string(), val.to_string());
        }
    }
    for (node, name, val) in indexed {
        let _ = environments[node].insert(name.to_string(), val.to_string());
    }
    sized.document().environments = environments;
    Ok(())
}

/// A parsed `--template` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Template {
    /// `dest;src` or `dest=src`: shared by every node.
    Shared {
        /// Path inside the node.
        dest: String,
        /// Local file to read.
        src: PathBuf,
    },
    /// `index;dest;src`: one node only.
    Node {
        /// Target node.
        index: i64,
        /// Path inside the node.
        dest: String,
        /// Local file to read.
        src: PathBuf,
    },
}

/// Parses one `--template` argument.
///
/// # Errors
///
/// Returns [`TestbedError::MalformedOverride`] if the argument has no
/// separator, or [`TestbedError::InvalidInteger`] for a bad node index.
pub fn parse_template(raw: &str) -> Result<Template> {
    let mut parts: Vec<&str> = raw.splitn(3, ';').collect();
    if parts.len() < 3 {
        parts = match raw.split_once(';').or_else(|| raw.split_once('=')) {
            Some((dest, src)) => vec![dest, src],
            None => {
                return Err(TestbedError::MalformedOverride {
                    raw: raw.to_string(),
                    reason: "expected dest;src or index;dest;src".into(),
                });
            }
        };
    }
    let parts: Vec<&str> = parts.into_iter().map(str::trim).collect();
    match parts.as_slice() {
        [index, dest, src] => Ok(Template::Node {
            index: normalize::parse_int("node number provided to -t", index)?,
            dest: (*dest).to_string(),
            src: PathBuf::from(src),
        }),
        [dest, src] => Ok(Template::Shared {
            dest: (*dest).to_string(),
            src: PathBuf::from(src),
        }),
        _ => Err(TestbedError::MalformedOverride {
            raw: raw.to_string(),
            reason: "expected dest;src or index;dest;src".into(),
        }),
    }
}

/// Reads every `--template` file into the build, base64-encoded.
///
/// Shared templates go to `extras.defaults.files`; per-node ones are added
/// to that node's file map. All indices are checked before any file is read.
///
/// # Errors
///
/// Returns a parse error, [`TestbedError::IndexOutOfRange`], or
/// [`TestbedError::Io`] if a file cannot be read.
pub fn apply_templates(sized: &mut SizedBuild<'_>, templates: Option<&[String]>) -> Result<()> {
    let Some(tokens) = templates else {
        return Ok(());
    };
    let nodes = sized.nodes();
    let parsed = tokens
        .iter()
        .map(|raw| parse_template(raw))
        .collect::<Result<Vec<_>>>()?;
    for template in &parsed {
        if let Template::Node { index, .. } = template {
            let _ = normalize::check_index("--template", *index, nodes)?;
        }
    }

    let doc = sized.document();
    doc.files.resize_with(nodes, BTreeMap::new);
    let mut defaults = ValueMap::new();
    for template in parsed {
        match template {
            Template::Shared { dest, src } => {
                let _ = defaults.insert(dest, Value::Str(read_base64(&src)?));
            }
            Template::Node { index, dest, src } => {
                let node = normalize::check_index("--template", index, nodes)?;
                let _ = doc.files[node].insert(dest, read_base64(&src)?);
            }
        }
    }
    value::set_path(&mut doc.extras, &["defaults", "files"], defaults)
}

pub(crate) fn read_base64(path: &Path) -> Result<String> {
    let data = std::fs::read(path).map_err(|e| TestbedError::io(path, e))?;
    Ok(BASE64.encode(&data))
}
