//! Analysis options and the `corvid.toml` file they are read from

use cv_inherit::{DiagnosticKind, InheritOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the options file looked up next to a declaration file
pub const CONFIG_FILE_NAME: &str = "corvid.toml";

/// Failure to read an options file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// The options file
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid options table
    #[error("invalid options in {path}: {source}")]
    Parse {
        /// The options file
        path: PathBuf,
        /// Parser error with its location
        #[source]
        source: toml::de::Error,
    },
}

/// Options of one analysis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisOptions {
    /// Overrides may narrow a reference return type
    pub covariant_returns: bool,

    /// The target runtime supports covariant returns of classes
    pub covariant_runtime: bool,

    /// Analyze the types of one inheritance level in parallel
    pub parallel: bool,

    /// Report warnings as errors
    pub warnings_as_errors: bool,

    /// Diagnostic kinds that are dropped from the report
    pub suppress: Vec<DiagnosticKind>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            covariant_returns: false,
            covariant_runtime: false,
            parallel: true,
            warnings_as_errors: false,
            suppress: Vec::new(),
        }
    }
}

impl AnalysisOptions {
    /// Parse options from TOML text
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read options from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    /// Read `corvid.toml` from `dir`, or use the defaults when there is none
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            tracing::debug!(path = %path.display(), "loading analysis options");
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// The subset of options the member checks depend on
    pub fn inherit_options(&self) -> InheritOptions {
        InheritOptions {
            covariant_returns: self.covariant_returns,
            covariant_runtime: self.covariant_runtime,
        }
    }
}
