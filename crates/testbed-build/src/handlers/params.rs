//! Blockchain-specific parameters typed by the service schema.

use std::collections::BTreeMap;
use std::path::Path;

use testbed_client::api::{ParamKind, ParamSpec};
use testbed_common::error::{Result, TestbedError};
use testbed_common::types::BuildConfiguration;
use testbed_common::value::{Value, ValueMap};

use crate::normalize;
use crate::prompt::Prompter;

/// Converts raw text into the value `spec` calls for.
///
/// Returns `None` for a type this client cannot enter. List values accept
/// commas or spaces as separators.
///
/// # Errors
///
/// Returns [`TestbedError::InvalidInteger`] or
/// [`TestbedError::InvalidBoolean`] naming the parameter.
pub fn typed_param(spec: &ParamSpec, raw: &str) -> Result<Option<Value>> {
    let value = match &spec.kind {
        ParamKind::String => Value::Str(raw.to_string()),
        ParamKind::StringList => Value::List(
            raw.replace(' ', ",")
                .split(',')
                .filter(|item| !item.is_empty())
                .map(ToString::to_string)
                .collect(),
        ),
        ParamKind::Int => Value::Int(normalize::parse_int(&spec.name, raw)?),
        ParamKind::Bool => Value::Bool(normalize::parse_bool(&spec.name, raw)?),
        ParamKind::Unsupported(kind) => {
            tracing::warn!(name = %spec.name, %kind, "unsupported parameter type, skipping");
            return Ok(None);
        }
    };
    Ok(Some(value))
}

/// Replaces the parameters with the JSON object in `path`.
///
/// # Errors
///
/// Returns [`TestbedError::Io`] if the file cannot be read, or
/// [`TestbedError::Serialization`] if it is not a JSON object.
pub fn apply_file(path: &Path, config: &mut BuildConfiguration) -> Result<()> {
    let content = std::fs::read_to_string(path).map_err(|e| TestbedError::io(path, e))?;
    let params: ValueMap = serde_json::from_str(&content)?;
    tracing::debug!(path = %path.display(), count = params.len(), "loaded parameters file");
    config.params = params;
    Ok(())
}

/// Merges `name=value` options into the parameters, typed by `schema`.
/// Names missing from the schema are ignored.
///
/// # Errors
///
/// Returns [`TestbedError::MalformedOverride`] for a token without `=`, or
/// a typing error from [`typed_param`].
pub fn apply_options(
    options: &[String],
    schema: &[ParamSpec],
    config: &mut BuildConfiguration,
) -> Result<()> {
    let mut given = BTreeMap::new();
    for token in options {
        let (name, raw) = normalize::split_pair(token)?;
        let _ = given.insert(name, raw);
    }

    for spec in schema {
        let Some(raw) = given.remove(spec.name.as_str()) else {
            continue;
        };
        if let Some(value) = typed_param(spec, raw)? {
            let _ = config.params.insert(spec.name.clone(), value);
        }
    }
    for name in given.keys() {
        tracing::debug!(%name, "ignoring option not in the parameter schema");
    }
    Ok(())
}

/// Asks for each schema entry in turn.
///
/// An empty answer leaves the parameter unset. An answer that does not
/// parse is reported and the same entry is asked again.
///
/// # Errors
///
/// Returns the prompter's error.
pub fn prompt_params(
    prompter: &mut dyn Prompter,
    schema: &[ParamSpec],
    config: &mut BuildConfiguration,
) -> Result<()> {
    for spec in schema {
        if let ParamKind::Unsupported(kind) = &spec.kind {
            tracing::warn!(name = %spec.name, %kind, "unsupported parameter type, skipping");
            continue;
        }
        let label = format!("{} ({})", spec.name, spec.kind.as_str());
        loop {
            let answer = prompter.read_line(&label)?;
            let answer = answer.trim();
            if answer.is_empty() {
                break;
            }
            match typed_param(spec, answer) {
                Ok(Some(value)) => {
                    let _ = config.params.insert(spec.name.clone(), value);
                    break;
                }
                Ok(None) => break,
                Err(e) => prompter.notify(&e.to_string()),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::testing::ScriptedPrompter;

    fn spec(name: &str, kind: ParamKind) -> ParamSpec {
        ParamSpec {
            name: name.into(),
            kind,
        }
    }

    fn schema() -> Vec<ParamSpec> {
        vec![
            spec("chainId", ParamKind::Int),
            spec("bootnodes", ParamKind::StringList),
            spec("mining", ParamKind::Bool),
            spec("network", ParamKind::String),
        ]
    }

    #[test]
    fn typed_param_splits_lists_on_spaces_and_commas() {
        let value = typed_param(&spec("peers", ParamKind::StringList), "a b,c")
            .expect("typing failed");
        assert_eq!(value, Some(Value::List(vec!["a".into(), "b".into(), "c".into()])));
    }

    #[test]
    fn typed_param_skips_unsupported_types() {
        let value = typed_param(&spec("ratio", ParamKind::Unsupported("float".into())), "1.5")
            .expect("typing failed");
        assert!(value.is_none());
    }

    #[test]
    fn options_merge_typed_values_and_ignore_unknown_names() {
        let mut config = BuildConfiguration::default();
        let _ = config.params.insert("network".into(), Value::from("main"));
        let options: Vec<String> = ["chainId=0x10", "mining=yes", "bogus=1"]
            .iter()
            .map(ToString::to_string)
            .collect();

        apply_options(&options, &schema(), &mut config).expect("apply failed");

        assert_eq!(config.params["chainId"], Value::Int(16));
        assert_eq!(config.params["mining"], Value::Bool(true));
        assert_eq!(config.params["network"], Value::from("main"));
        assert!(!config.params.contains_key("bogus"));
    }

    #[test]
    fn options_reject_bad_boolean() {
        let mut config = BuildConfiguration::default();
        let err = apply_options(&["mining=true".to_string()], &schema(), &mut config)
            .expect_err("should fail");
        assert!(matches!(err, TestbedError::InvalidBoolean { ref field, .. } if field == "mining"));
    }

    #[test]
    fn prompt_reasks_same_entry_on_parse_failure() {
        let mut config = BuildConfiguration::default();
        let mut prompter = ScriptedPrompter::new(&["twelve", "12", "", "y", "dev"]);

        prompt_params(&mut prompter, &schema(), &mut config).expect("prompt failed");

        assert_eq!(config.params["chainId"], Value::Int(12));
        assert!(!config.params.contains_key("bootnodes"));
        assert_eq!(config.params["mining"], Value::Bool(true));
        assert_eq!(config.params["network"], Value::from("dev"));
        assert_eq!(prompter.prompts[0], "chainId (int)");
        assert_eq!(prompter.prompts[1], "chainId (int)");
        assert_eq!(prompter.notices.len(), 1);
    }

    #[test]
    fn params_file_replaces_parameters() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let path = dir.path().join("params.json");
        std::fs::write(&path, r#"{"chainId": 7, "extraAccounts": ["0xabc"]}"#).expect("write failed");

        let mut config = BuildConfiguration::default();
        let _ = config.params.insert("stale".into(), Value::Bool(true));
        apply_file(&path, &mut config).expect("apply failed");

        assert_eq!(config.params.len(), 2);
        assert_eq!(config.params["chainId"], Value::Int(7));
    }
}
