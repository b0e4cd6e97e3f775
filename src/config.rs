//! Runtime settings read from the environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `DIABETES_RISK_MODEL_PATH` | `models` |
//! | `DIABETES_RISK_LOG_MODE` | `auto` (`file`, `stdout`) |
//! | `DIABETES_RISK_LOG_FILE` | `diabetes-risk.log` |
//! | `DIABETES_RISK_MODEL_PUBKEY_FILE` | unset |
//! | `DIABETES_RISK_ALLOW_UNSIGNED_MODELS` | `false`, debug builds only |
//! | `DIABETES_RISK_SANITIZE_MAX_BYTES` | `16384`, per log line |

use std::path::PathBuf;

use crate::adapters::artifacts::ArtifactLoader;
use crate::adapters::sanitize::DEFAULT_SANITIZE_MAX_BYTES;
use crate::DiabetesRiskError;

const MODEL_PATH_ENV: &str = "DIABETES_RISK_MODEL_PATH";
const LOG_MODE_ENV: &str = "DIABETES_RISK_LOG_MODE";
const LOG_FILE_ENV: &str = "DIABETES_RISK_LOG_FILE";
const PUBKEY_FILE_ENV: &str = "DIABETES_RISK_MODEL_PUBKEY_FILE";
const ALLOW_UNSIGNED_ENV: &str = "DIABETES_RISK_ALLOW_UNSIGNED_MODELS";
const SANITIZE_MAX_BYTES_ENV: &str = "DIABETES_RISK_SANITIZE_MAX_BYTES";

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    File,
    Stdout,
    /// File when stdout is a terminal, stdout otherwise
    Auto,
}

impl LogMode {
    fn parse(value: &str) -> Self {
        match value {
            "file" => Self::File,
            "stdout" => Self::Stdout,
            _ => Self::Auto,
        }
    }

    /// Whether to log to a file given whether stdout is interactive.
    #[must_use]
    pub fn use_file(self, interactive: bool) -> bool {
        match self {
            Self::File => true,
            Self::Stdout => false,
            Self::Auto => interactive,
        }
    }
}

/// Parsed settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub model_path: PathBuf,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
    pub pubkey_file: Option<PathBuf>,
    pub allow_unsigned_models: bool,
    /// Bytes of each log line inspected by the sanitizer
    pub sanitize_max_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models"),
            log_mode: LogMode::Auto,
            log_file: PathBuf::from("diabetes-risk.log"),
            pubkey_file: None,
            allow_unsigned_models: false,
            sanitize_max_bytes: DEFAULT_SANITIZE_MAX_BYTES,
        }
    }
}

pub(crate) fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "YES")
}

impl Settings {
    /// Read settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup (the environment in
    /// production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // Unsigned artifacts are a development convenience only.
        let allow_unsigned_models = cfg!(debug_assertions)
            && lookup(ALLOW_UNSIGNED_ENV).is_some_and(|v| parse_bool(&v));

        Self {
            model_path: lookup(MODEL_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            log_mode: lookup(LOG_MODE_ENV)
                .map(|v| LogMode::parse(&v))
                .unwrap_or(defaults.log_mode),
            log_file: lookup(LOG_FILE_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file),
            pubkey_file: lookup(PUBKEY_FILE_ENV).map(PathBuf::from),
            allow_unsigned_models,
            sanitize_max_bytes: lookup(SANITIZE_MAX_BYTES_ENV)
                .and_then(|v| v.trim().parse::<usize>().ok())
                .filter(|&v| v > 0)
                .unwrap_or(defaults.sanitize_max_bytes),
        }
    }

    /// Build the artifact loader these settings call for.
    ///
    /// A configured public key always wins. Without one, unsigned loading
    /// must be explicitly allowed.
    ///
    /// # Errors
    /// Returns `Config` if neither a key nor unsigned loading is available,
    /// or `Model` if the key file is invalid.
    pub fn artifact_loader(&self) -> Result<ArtifactLoader, DiabetesRiskError> {
        if let Some(path) = &self.pubkey_file {
            return Ok(ArtifactLoader::from_pubkey_file(path)?);
        }
        if self.allow_unsigned_models {
            return Ok(ArtifactLoader::unsigned());
        }
        Err(DiabetesRiskError::Config(format!(
            "No model verifying key configured. Set {PUBKEY_FILE_ENV}, or {ALLOW_UNSIGNED_ENV}=true in debug builds."
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Settings {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[]);
        assert_eq!(s.model_path, PathBuf::from("models"));
        assert_eq!(s.log_mode, LogMode::Auto);
        assert!(s.pubkey_file.is_none());
        assert!(!s.allow_unsigned_models);
        assert_eq!(s.sanitize_max_bytes, DEFAULT_SANITIZE_MAX_BYTES);
    }

    #[test]
    fn test_sanitize_limit_override() {
        assert_eq!(
            settings(&[(SANITIZE_MAX_BYTES_ENV, "4096")]).sanitize_max_bytes,
            4096
        );
        for bad in ["0", "-1", "lots"] {
            assert_eq!(
                settings(&[(SANITIZE_MAX_BYTES_ENV, bad)]).sanitize_max_bytes,
                DEFAULT_SANITIZE_MAX_BYTES
            );
        }
    }

    #[test]
    fn test_overrides() {
        let s = settings(&[
            (MODEL_PATH_ENV, "/srv/models"),
            (LOG_MODE_ENV, "stdout"),
            (LOG_FILE_ENV, "/tmp/risk.log"),
        ]);
        assert_eq!(s.model_path, PathBuf::from("/srv/models"));
        assert_eq!(s.log_mode, LogMode::Stdout);
        assert_eq!(s.log_file, PathBuf::from("/tmp/risk.log"));
    }

    #[test]
    fn test_log_mode_auto_follows_terminal() {
        assert!(LogMode::Auto.use_file(true));
        assert!(!LogMode::Auto.use_file(false));
        assert!(LogMode::File.use_file(false));
        assert!(!LogMode::Stdout.use_file(true));
    }

    #[test]
    fn test_loader_requires_key_or_explicit_bypass() {
        assert!(matches!(
            settings(&[]).artifact_loader(),
            Err(DiabetesRiskError::Config(_))
        ));
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_unsigned_bypass_in_debug_builds() {
        let s = settings(&[(ALLOW_UNSIGNED_ENV, "yes")]);
        assert!(s.allow_unsigned_models);
        let loader = s.artifact_loader().expect("Should allow unsigned");
        assert!(!loader.verifies_signatures());
    }

    #[test]
    fn test_parse_bool() {
        for v in ["1", "true", "TRUE", "yes", "YES"] {
            assert!(parse_bool(v));
        }
        for v in ["0", "false", "no", ""] {
            assert!(!parse_bool(v));
        }
    }
}
