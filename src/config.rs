//! `csets.toml` configuration for the command-line tool.
//!
//! ```toml
//! compartment_sets_file = "circuit/compartment_sets.json"
//! log_filter = "sonata_compartments=debug"
//! ```
//!
//! A relative `compartment_sets_file` is resolved against the directory that
//! holds the configuration file.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compartment::{CompartmentError, CompartmentSets};

/// Default name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "csets.toml";

/// Errors from loading the configuration or the sets it points to.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("cannot read config file {path}")]
    #[diagnostic(
        code(sonata::config::read),
        help("Check that the file exists and is readable, or pass a different --config.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {message}")]
    #[diagnostic(
        code(sonata::config::parse),
        help("Known keys are `compartment_sets_file` (string) and `log_filter` (string).")
    )]
    Parse { path: String, message: String },

    #[error("no compartment sets file given")]
    #[diagnostic(
        code(sonata::config::missing_sets_file),
        help("Pass the file on the command line or set `compartment_sets_file` in csets.toml.")
    )]
    MissingSetsFile,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Compartment(#[from] CompartmentError),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Settings for the `csets` tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CsetsConfig {
    /// Compartment sets file used when none is given on the command line.
    pub compartment_sets_file: Option<PathBuf>,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for CsetsConfig {
    fn default() -> Self {
        Self {
            compartment_sets_file: None,
            log_filter: "warn".into(),
        }
    }
}

impl CsetsConfig {
    /// Load a configuration file, resolving relative paths against its directory.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut config: CsetsConfig = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        if let Some(file) = config.compartment_sets_file.take() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            config.compartment_sets_file = Some(if file.is_relative() {
                base.join(file)
            } else {
                file
            });
        }
        Ok(config)
    }

    /// Load `explicit` if given, else `csets.toml` in the working directory
    /// if present, else defaults.
    pub fn discover(explicit: Option<&Path>) -> ConfigResult<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let local = Path::new(CONFIG_FILE_NAME);
                if local.exists() {
                    Self::load(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Pick the sets file: the explicit one, or the configured one.
    pub fn sets_file(&self, explicit: Option<&Path>) -> ConfigResult<PathBuf> {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| self.compartment_sets_file.clone())
            .ok_or(ConfigError::MissingSetsFile)
    }

    /// Load the compartment sets chosen by [`sets_file`](Self::sets_file).
    pub fn load_sets(&self, explicit: Option<&Path>) -> ConfigResult<CompartmentSets> {
        let path = self.sets_file(explicit)?;
        Ok(CompartmentSets::from_file(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CsetsConfig::default();
        assert_eq!(config.compartment_sets_file, None);
        assert_eq!(config.log_filter, "warn");
        assert!(matches!(
            config.sets_file(None),
            Err(ConfigError::MissingSetsFile)
        ));
    }

    #[test]
    fn relative_sets_file_resolves_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "compartment_sets_file = \"data/sets.json\"\n").unwrap();

        let config = CsetsConfig::load(&path).unwrap();
        assert_eq!(
            config.compartment_sets_file,
            Some(dir.path().join("data/sets.json"))
        );
        assert_eq!(config.log_filter, "warn");
    }

    #[test]
    fn explicit_file_wins() {
        let config = CsetsConfig {
            compartment_sets_file: Some("/configured.json".into()),
            ..Default::default()
        };
        assert_eq!(
            config.sets_file(Some(Path::new("/cli.json"))).unwrap(),
            PathBuf::from("/cli.json")
        );
        assert_eq!(config.sets_file(None).unwrap(), PathBuf::from("/configured.json"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "compartment_set_file = \"typo.json\"\n").unwrap();
        assert!(matches!(
            CsetsConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn load_sets_reads_configured_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("sets.json"),
            r#"{"cs0": {"population": "pop0", "compartment_set": [[1, 2, 0.5]]}}"#,
        )
        .unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "compartment_sets_file = \"sets.json\"\nlog_filter = \"debug\"\n").unwrap();

        let config = CsetsConfig::load(&path).unwrap();
        assert_eq!(config.log_filter, "debug");
        let sets = config.load_sets(None).unwrap();
        assert!(sets.contains("cs0"));
    }

    #[test]
    fn missing_sets_file_surfaces_compartment_io_error() {
        let config = CsetsConfig::default();
        let err = config.load_sets(Some(Path::new("/no/such/sets.json"))).unwrap_err();
        match err {
            ConfigError::Compartment(inner) => {
                assert_eq!(inner.kind(), crate::compartment::ErrorKind::Io)
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
