//! Shift configuration (`semcheck.toml`).
//!
//! Describes the environment overhead applied to predictions:
//!
//! ```toml
//! [environment]
//! bookkeeping = true
//! instrumentation_level = 2
//!
//! [overhead]
//! per_container = 1
//! top_level_move = 1
//!
//! [overhead.handle_units]
//! no_copy_propagation = 1
//! move_propagation = 2
//! swap_propagation = 1
//! no_propagation = 3
//! ```
//!
//! Every field is optional. Missing file → all defaults, which describe an
//! inactive environment.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::allocation::shifter::{OverheadTable, ShiftEnvironment};

/// Environment variable naming the configuration file read by
/// [`ShiftConfig::from_env`].
pub const CONFIG_ENV_VAR: &str = "SEMCHECK_SHIFT_CONFIG";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level shift configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShiftConfig {
    /// Build environment flags.
    #[serde(default)]
    pub environment: EnvironmentConfig,

    /// Overhead multipliers.
    #[serde(default)]
    pub overhead: OverheadTable,
}

/// Build environment flags.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentConfig {
    /// Whether the build performs per-container bookkeeping acquisitions
    /// (default: `false`).
    #[serde(default)]
    pub bookkeeping: bool,

    /// Instrumentation level; zero disables shifting (default: `0`).
    #[serde(default)]
    pub instrumentation_level: u32,
}

impl ShiftConfig {
    /// The shift environment this configuration describes.
    #[must_use]
    pub const fn environment(&self) -> ShiftEnvironment {
        ShiftEnvironment {
            bookkeeping: self.environment.bookkeeping,
            instrumentation_level: self.environment.instrumentation_level,
            table: self.overhead,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Error loading a shift configuration file.
#[derive(Debug)]
pub struct ConfigError {
    /// The path that was being loaded (if available).
    pub path: Option<PathBuf>,
    /// Human-readable message with line-level detail when possible.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = &self.path {
            write!(f, "{}: {}", p.display(), self.message)
        } else {
            write!(f, "config error: {}", self.message)
        }
    }
}

impl std::error::Error for ConfigError {}

impl ShiftConfig {
    /// Load configuration from a TOML file.
    ///
    /// - If the file does not exist, returns all defaults (not an error).
    /// - If the file exists but contains invalid TOML or unknown fields,
    ///   returns a [`ConfigError`] with line-level detail.
    ///
    /// # Errors
    /// Returns `ConfigError` on I/O errors (other than not-found) or parse errors.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no shift config, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError {
                    path: Some(path.to_owned()),
                    message: format!("could not read file: {e}"),
                });
            }
        };
        Self::parse(&contents).map_err(|mut e| {
            e.path = Some(path.to_owned());
            e
        })
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `ConfigError` on invalid TOML or unknown fields.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| {
            let mut message = e.message().to_owned();
            if let Some(span) = e.span() {
                let line = toml_str[..span.start]
                    .chars()
                    .filter(|&c| c == '\n')
                    .count()
                    + 1;
                message = format!("line {line}: {message}");
            }
            ConfigError {
                path: None,
                message,
            }
        })
    }

    /// Load the file named by `SEMCHECK_SHIFT_CONFIG`, or defaults if the
    /// variable is unset or empty.
    ///
    /// # Errors
    /// As [`ShiftConfig::load`].
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) if !path.is_empty() => Self::load(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_inactive() {
        let cfg = ShiftConfig::default();
        assert!(!cfg.environment.bookkeeping);
        assert_eq!(cfg.environment.instrumentation_level, 0);
        assert_eq!(cfg.overhead.per_container, 1);
        assert_eq!(cfg.overhead.top_level_move, 1);
        assert_eq!(cfg.overhead.handle_units.move_propagation, 2);
        assert!(!cfg.environment().is_active());
    }

    #[test]
    fn parse_empty_string() {
        assert_eq!(ShiftConfig::parse("").unwrap(), ShiftConfig::default());
    }

    #[test]
    fn parse_full_config() {
        let toml = r"
[environment]
bookkeeping = true
instrumentation_level = 2

[overhead]
per_container = 2
top_level_move = 3

[overhead.handle_units]
no_copy_propagation = 4
move_propagation = 5
swap_propagation = 6
no_propagation = 7
";
        let cfg = ShiftConfig::parse(toml).unwrap();
        let env = cfg.environment();
        assert!(env.is_active());
        assert_eq!(env.instrumentation_level, 2);
        assert_eq!(env.table.per_container, 2);
        assert_eq!(env.table.top_level_move, 3);
        assert_eq!(env.table.handle_units.no_copy_propagation, 4);
        assert_eq!(env.table.handle_units.no_propagation, 7);
    }

    #[test]
    fn parse_partial_config_uses_defaults() {
        let cfg = ShiftConfig::parse("[overhead.handle_units]\nno_propagation = 9\n").unwrap();
        assert_eq!(cfg.overhead.handle_units.no_propagation, 9);
        assert_eq!(cfg.overhead.handle_units.move_propagation, 2);
        assert_eq!(cfg.overhead.per_container, 1);
    }

    #[test]
    fn parse_rejects_unknown_fields() {
        assert!(ShiftConfig::parse("[environment]\nverbose = true\n").is_err());
        assert!(ShiftConfig::parse("[overhead]\nper_level = 1\n").is_err());
        assert!(ShiftConfig::parse("[logging]\n").is_err());
    }

    #[test]
    fn parse_includes_line_number_on_error() {
        let toml = "[environment]\nbookkeeping = true\ninstrumentation_level = \"high\"\n";
        let err = ShiftConfig::parse(toml).unwrap_err();
        assert!(
            err.message.contains("line 3"),
            "error should include line number: {}",
            err.message
        );
    }

    #[test]
    fn load_missing_file_returns_defaults() {
        let cfg = ShiftConfig::load(Path::new("/nonexistent/semcheck.toml")).unwrap();
        assert_eq!(cfg, ShiftConfig::default());
    }

    #[test]
    fn load_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("semcheck.toml");
        std::fs::write(&path, "[environment]\nbookkeeping = true\ninstrumentation_level = 1\n")
            .unwrap();
        let cfg = ShiftConfig::load(&path).unwrap();
        assert!(cfg.environment().is_active());
    }

    #[test]
    fn load_invalid_file_shows_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "not valid [[[toml").unwrap();
        let err = ShiftConfig::load(&path).unwrap_err();
        assert_eq!(err.path.as_deref(), Some(path.as_path()));
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn config_error_display_without_path() {
        let err = ConfigError {
            path: None,
            message: "parse error".to_owned(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("config error"));
        assert!(msg.contains("parse error"));
    }
}
