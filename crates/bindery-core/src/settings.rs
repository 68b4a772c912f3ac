//! Engine settings
//!
//! Read from TOML. Missing fields take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diagnostics::LogLevel;
use crate::error::{BindingError, BindingResult};

/// Default number of root ids kept in the history
const DEFAULT_HISTORY_LIMIT: usize = 64;

fn default_root_history() -> bool {
    true
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

/// Settings for a [`BindingEngine`](crate::BindingEngine)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Verbosity of the diagnostics sink
    #[serde(default)]
    pub log_level: LogLevel,
    /// Record the ids of bound roots so they can be restored later
    #[serde(default = "default_root_history")]
    pub root_history: bool,
    /// Maximum number of remembered roots; 0 keeps all of them
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            root_history: default_root_history(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl EngineSettings {
    pub fn from_toml_str(source: &str) -> BindingResult<Self> {
        toml::from_str(source).map_err(|e| BindingError::InvalidSettings(e.to_string()))
    }

    /// Load settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> BindingResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn to_toml_string(&self) -> BindingResult<String> {
        toml::to_string_pretty(self).map_err(|e| BindingError::InvalidSettings(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_fields_take_defaults() {
        let settings = EngineSettings::from_toml_str("log_level = \"error\"").unwrap();
        assert_eq!(settings.log_level, LogLevel::Error);
        assert!(settings.root_history);
        assert_eq!(settings.history_limit, 64);
        assert_eq!(EngineSettings::from_toml_str("").unwrap(), EngineSettings::default());
    }

    #[test]
    fn test_malformed_settings_are_rejected() {
        assert!(matches!(
            EngineSettings::from_toml_str("log_level = \"loud\""),
            Err(BindingError::InvalidSettings(_))
        ));
        assert!(matches!(
            EngineSettings::from_toml_str("history_limit = -1"),
            Err(BindingError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "root_history = false\nhistory_limit = 3").unwrap();

        let settings = EngineSettings::load(file.path()).unwrap();
        assert!(!settings.root_history);
        assert_eq!(settings.history_limit, 3);
        assert_eq!(settings.log_level, LogLevel::Info);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = EngineSettings::load(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(BindingError::Io(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let settings = EngineSettings {
            log_level: LogLevel::None,
            root_history: true,
            history_limit: 0,
        };
        let text = settings.to_toml_string().unwrap();
        assert_eq!(EngineSettings::from_toml_str(&text).unwrap(), settings);
    }
}
