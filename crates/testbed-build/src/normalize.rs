//! Pure conversions from raw flag text into typed values.

use std::collections::BTreeMap;

use testbed_common::error::{Result, TestbedError};

/// Per-node values from `index=value` tokens plus an optional bare default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexedOverrides {
    /// Values keyed by the index given in the token. Later tokens win.
    pub explicit: BTreeMap<i64, String>,
    /// The single unindexed value, if any.
    pub default: Option<String>,
}

impl IndexedOverrides {
    /// Returns the value for `index`: the explicit one, else the default.
    pub fn value_for(&self, index: usize) -> Option<&str> {
        i64::try_from(index)
            .ok()
            .and_then(|i| self.explicit.get(&i))
            .or(self.default.as_ref())
            .map(String::as_str)
    }

    /// Checks that every explicit index lies in `[0, nodes)`.
    ///
    /// # Errors
    ///
    /// Returns [`TestbedError::IndexOutOfRange`] for the first offending index.
    pub fn check_range(&self, flag: &'static str, nodes: usize) -> Result<()> {
        for &index in self.explicit.keys() {
            let _ = check_index(flag, index, nodes)?;
        }
        Ok(())
    }
}

/// Splits `value` / `index=value` tokens.
///
/// # Errors
///
/// Returns [`TestbedError::MalformedOverride`] for an empty token, empty
/// value or non-integer index, and [`TestbedError::TooManyDefaults`] if more
/// than one token has no index.
pub fn parse_indexed(tokens: &[String], category: &'static str) -> Result<IndexedOverrides> {
    let mut overrides = IndexedOverrides::default();
    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            return Err(malformed(token, "empty value"));
        }
        match token.split_once('=') {
            Some((index, value)) => {
                let index = index
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| malformed(token, "index is not an integer"))?;
                if value.is_empty() {
                    return Err(malformed(token, "empty value"));
                }
                let _ = overrides.explicit.insert(index, value.to_string());
            }
            None => {
                if overrides.default.is_some() {
                    return Err(TestbedError::TooManyDefaults { category });
                }
                overrides.default = Some(token.to_string());
            }
        }
    }
    tracing::trace!(category, ?overrides, "parsed indexed overrides");
    Ok(overrides)
}

fn malformed(raw: &str, reason: &str) -> TestbedError {
    TestbedError::MalformedOverride {
        raw: raw.to_string(),
        reason: reason.to_string(),
    }
}

/// Converts `index` to a node position, checking it lies in `[0, nodes)`.
///
/// # Errors
///
/// Returns [`TestbedError::IndexOutOfRange`] otherwise.
pub fn check_index(flag: &'static str, index: i64, nodes: usize) -> Result<usize> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < nodes)
        .ok_or(TestbedError::IndexOutOfRange { flag, index, nodes })
}

/// Parses an integer, detecting the base from its prefix: `0x` hex, `0b`
/// binary, `0o` or a leading `0` octal, otherwise decimal.
///
/// # Errors
///
/// Returns [`TestbedError::InvalidInteger`] naming `field` and the raw text.
pub fn parse_int(field: &str, raw: &str) -> Result<i64> {
    let invalid = || TestbedError::InvalidInteger {
        field: field.to_string(),
        raw: raw.to_string(),
    };

    let text = raw.trim();
    let (negative, unsigned) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let lower = unsigned.to_ascii_lowercase();
    let (radix, digits) = if let Some(rest) = lower.strip_prefix("0x") {
        (16, rest)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (2, rest)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (8, rest)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (8, &lower[1..])
    } else {
        (10, lower.as_str())
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(invalid());
    }

    let magnitude = u64::from_str_radix(digits, radix).map_err(|_| invalid())?;
    if negative {
        0_i64.checked_sub_unsigned(magnitude).ok_or_else(invalid)
    } else {
        i64::try_from(magnitude).map_err(|_| invalid())
    }
}

/// Parses a plain base-10 integer; leading zeros carry no radix meaning.
///
/// # Errors
///
/// Returns [`TestbedError::InvalidInteger`] naming `field` and the raw text.
pub fn parse_decimal(field: &str, raw: &str) -> Result<i64> {
    raw.trim().parse().map_err(|_| TestbedError::InvalidInteger {
        field: field.to_string(),
        raw: raw.to_string(),
    })
}

/// Parses a boolean from `y`, `yes`, `1` (true) or `n`, `no`, `0` (false).
///
/// # Errors
///
/// Returns [`TestbedError::InvalidBoolean`] for anything else.
pub fn parse_bool(field: &str, raw: &str) -> Result<bool> {
    match raw.trim() {
        "y" | "yes" | "1" => Ok(true),
        "n" | "no" | "0" => Ok(false),
        _ => Err(TestbedError::InvalidBoolean {
            field: field.to_string(),
            raw: raw.to_string(),
        }),
    }
}

/// Parses `index=host:container` tokens, grouping bindings per node in
/// the order given.
///
/// # Errors
///
/// Returns [`TestbedError::MalformedPortMapping`] if a token has no `=`,
/// a non-integer index, or a binding without `:`.
pub fn parse_port_mappings(tokens: &[String]) -> Result<BTreeMap<i64, Vec<String>>> {
    let mut mapping: BTreeMap<i64, Vec<String>> = BTreeMap::new();
    for token in tokens {
        let malformed = || TestbedError::MalformedPortMapping { raw: token.clone() };
        let (index, binding) = token.trim().split_once('=').ok_or_else(malformed)?;
        let index = index.trim().parse::<i64>().map_err(|_| malformed())?;
        let binding = binding.trim();
        if !binding.contains(':') {
            return Err(malformed());
        }
        mapping.entry(index).or_default().push(binding.to_string());
    }
    Ok(mapping)
}

/// Splits an environment key into an optional node index and the variable
/// name: `"3:FOO"` is node 3, `"FOO"` applies to every node.
pub fn split_env_key(key: &str) -> (Option<i64>, &str) {
    if let Some((prefix, name)) = key.split_once(':') {
        if let Ok(index) = prefix.trim().parse::<i64>() {
            return (Some(index), name);
        }
    }
    (None, key)
}

/// Splits a `key=value` token at the first `=`.
///
/// # Errors
///
/// Returns [`TestbedError::MalformedOverride`] if there is no `=` or the
/// key is empty.
pub fn split_pair(token: &str) -> Result<(&str, &str)> {
    match token.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => Err(malformed(token, "expected key=value")),
    }
}
