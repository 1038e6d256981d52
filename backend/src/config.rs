//! Runtime configuration from the environment.
//!
//! Values come from process environment variables, typically populated from
//! a `.env` file loaded by the binary with `dotenvy`:
//!
//! | Variable              | Default | Meaning                              |
//! |-----------------------|---------|--------------------------------------|
//! | `CSVMAP_MAX_FILES`    | 10      | Files one session may hold           |
//! | `CSVMAP_MAX_WARNINGS` | 200     | Parse warnings kept per file         |

use crate::error::{ConfigError, ConfigResult};
use crate::parser::MAX_PARSE_WARNINGS;

pub const ENV_MAX_FILES: &str = "CSVMAP_MAX_FILES";
pub const ENV_MAX_WARNINGS: &str = "CSVMAP_MAX_WARNINGS";

/// Default session capacity.
pub const DEFAULT_MAX_FILES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub max_files: usize,
    pub max_parse_warnings: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_FILES,
            max_parse_warnings: MAX_PARSE_WARNINGS,
        }
    }
}

impl Config {
    /// Read the configuration from environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let defaults = Self::default();
        Ok(Self {
            max_files: read_count(&lookup, ENV_MAX_FILES, defaults.max_files)?,
            max_parse_warnings: read_count(&lookup, ENV_MAX_WARNINGS, defaults.max_parse_warnings)?,
        })
    }
}

/// Positive integer variable; blank means unset.
fn read_count(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: usize,
) -> ConfigResult<usize> {
    let Some(raw) = lookup(name) else {
        return Ok(default);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(default);
    }

    match trimmed.parse::<usize>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidEnv {
            name: name.to_string(),
            value: raw,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.max_files, 10);
        assert_eq!(config.max_parse_warnings, 200);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            (ENV_MAX_FILES, "3"),
            (ENV_MAX_WARNINGS, " 50 "),
        ]))
        .unwrap();

        assert_eq!(config.max_files, 3);
        assert_eq!(config.max_parse_warnings, 50);
    }

    #[test]
    fn test_blank_is_default() {
        let config = Config::from_lookup(lookup(&[(ENV_MAX_FILES, "  ")])).unwrap();
        assert_eq!(config.max_files, DEFAULT_MAX_FILES);
    }

    #[test]
    fn test_invalid_values_rejected() {
        for bad in ["zero", "0", "-1", "2.5"] {
            let err = Config::from_lookup(lookup(&[(ENV_MAX_FILES, bad)])).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidEnv { ref name, .. } if name == ENV_MAX_FILES));
        }
    }
}
