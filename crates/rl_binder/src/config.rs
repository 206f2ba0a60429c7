//! Binder configuration.
//!
//! Defaults are built in. A TOML file named by `RL_BINDER_CONFIG` overrides
//! them; a missing file keeps the defaults, a malformed one is an error.

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "RL_BINDER_CONFIG";

const MIN_BIND_DEPTH: usize = 16;
const DEFAULT_BIND_DEPTH: usize = 512;
const DEFAULT_HIDDEN_VAR_PREFIX: &str = "tmp$";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read binder configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse binder configuration{}: {source}", path_suffix(.path))]
    Parse {
        path: Option<PathBuf>,
        #[source]
        source: toml::de::Error,
    },
}

fn path_suffix(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|path| format!(" {}", path.display()))
        .unwrap_or_default()
}

/// What the conditional binder does when two branches share no common type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WideningFailure {
    /// Report an error and substitute an error node.
    #[default]
    Error,
    /// Keep both branches unconverted, type the result as the object root and warn.
    KeepBranches,
}

/// Options consulted while binding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BinderConfig {
    pub widening_failure: WideningFailure,
    /// Emit a warning when a deprecated method is selected.
    pub report_deprecations: bool,
    /// Name prefix of hidden aggregate loop variables.
    pub hidden_var_prefix: String,
    /// Case-sensitive variable lookup.
    pub strict_variable_lookup: bool,
    /// Nesting limit of bound expressions.
    pub max_bind_depth: usize,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            widening_failure: WideningFailure::Error,
            report_deprecations: true,
            hidden_var_prefix: DEFAULT_HIDDEN_VAR_PREFIX.to_string(),
            strict_variable_lookup: true,
            max_bind_depth: DEFAULT_BIND_DEPTH,
        }
    }
}

impl BinderConfig {
    /// Clamps values that would make binding unusable.
    pub fn sanitized(mut self) -> Self {
        if self.max_bind_depth < MIN_BIND_DEPTH {
            self.max_bind_depth = MIN_BIND_DEPTH;
        }
        if self.hidden_var_prefix.trim().is_empty() {
            self.hidden_var_prefix = DEFAULT_HIDDEN_VAR_PREFIX.to_string();
        }
        self
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str::<Self>(source)
            .map(Self::sanitized)
            .map_err(|source| ConfigError::Parse { path: None, source })
    }

    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "binder configuration not found, using defaults");
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str::<Self>(&contents)
            .map(Self::sanitized)
            .map_err(|source| ConfigError::Parse {
                path: Some(path.to_path_buf()),
                source,
            })
    }

    /// Loads the file named by [`CONFIG_ENV`], or the defaults when unset.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        match env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = BinderConfig::default();
        assert_eq!(config.widening_failure, WideningFailure::Error);
        assert!(config.report_deprecations);
        assert_eq!(config.hidden_var_prefix, "tmp$");
        assert!(config.strict_variable_lookup);
        assert_eq!(config.max_bind_depth, 512);
    }

    #[test]
    fn parses_partial_toml_and_sanitizes() {
        let config = BinderConfig::from_toml_str(
            "widening_failure = \"keep-branches\"\nmax_bind_depth = 2\nhidden_var_prefix = \" \"\n",
        )
        .unwrap();
        assert_eq!(config.widening_failure, WideningFailure::KeepBranches);
        assert_eq!(config.max_bind_depth, MIN_BIND_DEPTH);
        assert_eq!(config.hidden_var_prefix, "tmp$");
        assert!(config.report_deprecations);
    }

    #[test]
    fn rejects_unknown_keys() {
        let error = BinderConfig::from_toml_str("no_such_option = true").unwrap_err();
        assert!(matches!(error, ConfigError::Parse { path: None, .. }));
    }

    #[test]
    fn load_reads_file_and_tolerates_missing_file() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let path = dir.path().join("binder.toml");
        let mut file = fs::File::create(&path).expect("create config");
        writeln!(file, "report_deprecations = false").expect("write config");

        let config = BinderConfig::load(&path).expect("config loads");
        assert!(!config.report_deprecations);

        let missing = BinderConfig::load(&dir.path().join("absent.toml")).expect("defaults");
        assert_eq!(missing, BinderConfig::default());
    }

    #[test]
    fn load_reports_malformed_file() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let path = dir.path().join("broken.toml");
        fs::write(&path, "this is not toml").expect("write config");
        let error = BinderConfig::load(&path).unwrap_err();
        assert!(error.to_string().contains("broken.toml"));
    }
}
