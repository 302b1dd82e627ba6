//! Tagged values for the free-form `params`, `extras` and `meta` maps.
//!
//! Nested keys are addressed by path (`["prebuild", "auth"]`). Intermediate
//! maps are created on first write; walking through a non-map value yields
//! [`TestbedError::ShapeMismatch`] instead of a panic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TestbedError};

/// String-keyed map of [`Value`]s.
pub type ValueMap = BTreeMap<String, Value>;

/// A JSON value restricted to the shapes the build document uses.
///
/// Anything that fits none of the typed variants (floats, heterogeneous
/// arrays) is kept verbatim in [`Value::Other`] so a document fetched from
/// the service can be resubmitted unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// `true` / `false`.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// UTF-8 string.
    Str(String),
    /// List of strings.
    List(Vec<String>),
    /// Nested map.
    Map(ValueMap),
    /// Any other JSON shape, carried through untouched.
    Other(serde_json::Value),
}

impl Value {
    /// Returns the variant name used in shape-mismatch diagnostics.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "a boolean",
            Self::Int(_) => "an integer",
            Self::Str(_) => "a string",
            Self::List(_) => "a list of strings",
            Self::Map(_) => "a map",
            Self::Other(_) => "an untyped value",
        }
    }

    /// Returns the string if this is [`Value::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this is [`Value::Int`].
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the boolean if this is [`Value::Bool`].
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the list if this is [`Value::List`].
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    /// Returns the map if this is [`Value::Map`].
    pub const fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<Vec<String>> for Value {
    fn from(l: Vec<String>) -> Self {
        Self::List(l)
    }
}

impl From<ValueMap> for Value {
    fn from(m: ValueMap) -> Self {
        Self::Map(m)
    }
}

/// Returns the map at `path`, creating empty maps for missing segments.
///
/// # Errors
///
/// Returns [`TestbedError::ShapeMismatch`] if a segment already holds a
/// non-map value.
pub fn map_at<'a>(root: &'a mut ValueMap, path: &[&str]) -> Result<&'a mut ValueMap> {
    let mut current = root;
    for (depth, segment) in path.iter().enumerate() {
        let slot = current
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Map(ValueMap::new()));
        current = match slot {
            Value::Map(map) => map,
            _ => {
                return Err(TestbedError::ShapeMismatch {
                    key: path[..=depth].join("."),
                    expected: "a map",
                });
            }
        };
    }
    Ok(current)
}

/// Writes `value` at `path`, creating parent maps on the way.
///
/// An empty path is a no-op.
///
/// # Errors
///
/// Returns [`TestbedError::ShapeMismatch`] if a parent segment holds a
/// non-map value.
pub fn set_path(root: &mut ValueMap, path: &[&str], value: impl Into<Value>) -> Result<()> {
    let Some((last, parents)) = path.split_last() else {
        return Ok(());
    };
    let parent = map_at(root, parents)?;
    let _ = parent.insert((*last).to_string(), value.into());
    Ok(())
}

/// Reads the value at `path`, if every segment exists.
pub fn get_path<'a>(root: &'a ValueMap, path: &[&str]) -> Option<&'a Value> {
    let (last, parents) = path.split_last()?;
    let mut current = root;
    for segment in parents {
        current = current.get(*segment)?.as_map()?;
    }
    current.get(*last)
}
