//! Environment-driven settings (paths and cache policy).
//!
//! A `.env` file in the working directory is loaded first; real environment
//! variables win over it. CLI flags override whatever is resolved here.
//!
//! | variable                        | default        |
//! |---------------------------------|----------------|
//! | `MORTALITY_DATA_DIR`            | `data/raw`     |
//! | `MORTALITY_CACHE_DIR`           | `data/cache`   |
//! | `MORTALITY_ARCHIVE_DIR`         | `data/archive` |
//! | `MORTALITY_CACHE_TIMEOUT_HOURS` | `24`           |

use std::path::PathBuf;

use crate::error::MortalityError;

pub const DATA_DIR_VAR: &str = "MORTALITY_DATA_DIR";
pub const CACHE_DIR_VAR: &str = "MORTALITY_CACHE_DIR";
pub const ARCHIVE_DIR_VAR: &str = "MORTALITY_ARCHIVE_DIR";
pub const CACHE_TIMEOUT_VAR: &str = "MORTALITY_CACHE_TIMEOUT_HOURS";

pub const DEFAULT_CACHE_TIMEOUT_HOURS: f64 = 24.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub cache_timeout_hours: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/raw"),
            cache_dir: PathBuf::from("data/cache"),
            archive_dir: PathBuf::from("data/archive"),
            cache_timeout_hours: DEFAULT_CACHE_TIMEOUT_HOURS,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, MortalityError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through `lookup` (a variable name to its value).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MortalityError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let cache_timeout_hours = match value(CACHE_TIMEOUT_VAR) {
            Some(raw) => raw
                .parse::<f64>()
                .ok()
                .filter(|h| h.is_finite() && *h >= 0.0)
                .ok_or_else(|| {
                    MortalityError::invalid_input(format!("{CACHE_TIMEOUT_VAR} must be a non-negative number, got '{raw}'."))
                })?,
            None => defaults.cache_timeout_hours,
        };

        Ok(Self {
            data_dir: value(DATA_DIR_VAR).map(PathBuf::from).unwrap_or(defaults.data_dir),
            cache_dir: value(CACHE_DIR_VAR).map(PathBuf::from).unwrap_or(defaults.cache_dir),
            archive_dir: value(ARCHIVE_DIR_VAR).map(PathBuf::from).unwrap_or(defaults.archive_dir),
            cache_timeout_hours,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_when_unset() {
        let settings = Settings::from_lookup(|_| None).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn variables_override_defaults() {
        let env: HashMap<&str, &str> = [
            (DATA_DIR_VAR, "/srv/raw"),
            (CACHE_TIMEOUT_VAR, " 6 "),
            (ARCHIVE_DIR_VAR, ""),
        ]
        .into_iter()
        .collect();
        let settings = Settings::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("/srv/raw"));
        assert_eq!(settings.cache_timeout_hours, 6.0);
        assert_eq!(settings.archive_dir, PathBuf::from("data/archive"));
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let err = Settings::from_lookup(|k| (k == CACHE_TIMEOUT_VAR).then(|| "soon".to_string())).unwrap_err();
        assert!(matches!(err, MortalityError::InvalidInput { .. }));
    }
}
