//! Runtime configuration from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `FRAILSIGHT_MODEL_PATH` | `xgb_model.json` |
//! | `FRAILSIGHT_MODEL_PUBKEY_HEX` | unset (signature not required) |
//! | `FRAILSIGHT_LOG_MODE` | `auto` (`file` on a TTY, else `stdout`) |
//! | `FRAILSIGHT_LOG_FILE` | `frailsight.log` |

use std::path::PathBuf;

use crate::adapters::xgboost::IntegrityPolicy;
use crate::adapters::ModelLoadError;

pub const MODEL_PATH_ENV: &str = "FRAILSIGHT_MODEL_PATH";
pub const MODEL_PUBKEY_ENV: &str = "FRAILSIGHT_MODEL_PUBKEY_HEX";
pub const LOG_MODE_ENV: &str = "FRAILSIGHT_LOG_MODE";
pub const LOG_FILE_ENV: &str = "FRAILSIGHT_LOG_FILE";

pub const DEFAULT_MODEL_PATH: &str = "xgb_model.json";
pub const DEFAULT_LOG_FILE: &str = "frailsight.log";

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// File when stdout is a terminal, stdout otherwise.
    Auto,
    File,
    Stdout,
}

impl LogMode {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "file" => Self::File,
            "stdout" => Self::Stdout,
            _ => Self::Auto,
        }
    }

    /// Resolve `Auto` against whether stdout is interactive.
    #[must_use]
    pub fn use_file(self, interactive: bool) -> bool {
        match self {
            Self::File => true,
            Self::Stdout => false,
            Self::Auto => interactive,
        }
    }
}

/// Process settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub model_path: PathBuf,
    pub model_pubkey_hex: Option<String>,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            model_pubkey_hex: None,
            log_mode: LogMode::Auto,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Read settings through an arbitrary lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            model_path: lookup(MODEL_PATH_ENV)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            model_pubkey_hex: lookup(MODEL_PUBKEY_ENV).filter(|v| !v.trim().is_empty()),
            log_mode: lookup(LOG_MODE_ENV)
                .map(|v| LogMode::parse(&v))
                .unwrap_or(defaults.log_mode),
            log_file: lookup(LOG_FILE_ENV)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file),
        }
    }

    /// Integrity policy implied by the configured verifying key.
    ///
    /// # Errors
    /// A malformed key is a load failure, never silently ignored.
    pub fn integrity_policy(&self) -> Result<IntegrityPolicy, ModelLoadError> {
        match &self.model_pubkey_hex {
            Some(hex) => IntegrityPolicy::from_public_key_hex(hex),
            None => Ok(IntegrityPolicy::permissive()),
        }
    }
}
