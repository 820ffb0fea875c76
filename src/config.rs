//! Application configuration, loaded from TOML.
//!
//! ```toml
//! cookie_prefix = "ifarch_"
//! db_path = "/var/ifarchive/lib/sql/admin.db"
//! trash_dir = "/var/ifarchive/lib/trash"
//! max_session_age = 1209600
//! max_trash_age = 604800
//! log_level = "info"
//! ```
//!
//! Every key is optional.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::web::Cookies;

/// Environment variable naming the config file when `--config` is absent.
pub const CONFIG_ENV: &str = "TINYAPP_CONFIG";

const DAY: u64 = 24 * 60 * 60;

/// Error loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("cannot read config {}: {source}", path.display())]
    Io {
        /// Path that was read
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
    /// The file is not valid TOML for [`AppConfig`]
    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value is out of range
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings shared by the web front end and the admin commands.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Prepended to `sessionid` to form the session cookie name
    pub cookie_prefix: String,
    /// SQLite database file
    pub db_path: PathBuf,
    /// Seconds since last refresh before a session is discarded
    pub max_session_age: u64,
    /// Directory of deleted uploads awaiting purge
    pub trash_dir: PathBuf,
    /// Seconds a trash file is kept
    pub max_trash_age: u64,
    /// Fallback `tracing` filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cookie_prefix: String::new(),
            db_path: PathBuf::from("tinyapp.db"),
            max_session_age: 14 * DAY,
            trash_dir: PathBuf::from("trash"),
            max_trash_age: 7 * DAY,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Reads and validates the config file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if given, else the file named by [`CONFIG_ENV`], else
    /// the defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => match std::env::var_os(CONFIG_ENV) {
                Some(path) => Self::load(Path::new(&path)),
                None => Ok(Self::default()),
            },
        }
    }

    /// Returns the session cookie name.
    pub fn session_cookie_name(&self) -> String {
        format!("{}sessionid", self.cookie_prefix)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !Cookies::is_valid_name(&self.session_cookie_name()) {
            return Err(ConfigError::Invalid(format!(
                "cookie_prefix {:?} is not usable in a cookie name",
                self.cookie_prefix
            )));
        }
        if self.max_session_age == 0 {
            return Err(ConfigError::Invalid("max_session_age must be positive".into()));
        }
        if self.max_trash_age == 0 {
            return Err(ConfigError::Invalid("max_trash_age must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.max_session_age, 1_209_600);
        assert_eq!(config.max_trash_age, 604_800);
        assert_eq!(config.session_cookie_name(), "sessionid");
    }

    #[test]
    fn partial_file_overrides() {
        let config = AppConfig::from_toml_str(
            r#"
            cookie_prefix = "ifarch_"
            max_trash_age = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.session_cookie_name(), "ifarch_sessionid");
        assert_eq!(config.max_trash_age, 60);
        assert_eq!(config.max_session_age, 14 * DAY);
    }

    #[test]
    fn unknown_key_is_parse_error() {
        let err = AppConfig::from_toml_str("cookie_prefx = \"x\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn bad_values_are_rejected() {
        for text in [
            "cookie_prefix = \"a b\"",
            "cookie_prefix = \"a=\"",
            "cookie_prefix = \"if@rch_\"",
            "cookie_prefix = 'x\"'",
            "cookie_prefix = \"$\"",
            "max_session_age = 0",
            "max_trash_age = 0",
        ] {
            let err = AppConfig::from_toml_str(text).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{}", text);
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = AppConfig::load(Path::new("/nonexistent/tinyapp.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/tinyapp.toml"));
    }
}
