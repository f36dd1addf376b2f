// ABOUTME: Optional TOML configuration for the inspector and comparator
// ABOUTME: Loads schema-drift.toml and converts it into runtime options

use crate::diff::CompareOptions;
use crate::error::{DriftError, DriftResult};
use crate::inspect::{InspectorOptions, TblsSource};
use crate::schema::Normalizer;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "schema-drift.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub inspector: InspectorConfig,
    pub compare: CompareConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InspectorConfig {
    /// Name or path of the tbls executable
    pub tbls: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub preflight: bool,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            tbls: "tbls".to_string(),
            timeout_secs: 120,
            connect_timeout_secs: 10,
            preflight: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompareConfig {
    /// Groups of type names treated as the same type
    pub equivalent_types: Vec<Vec<String>>,
    pub ignore_tables: Vec<String>,
    pub ignore_comments: bool,
}

impl Config {
    /// Load a config file
    pub fn load(path: impl AsRef<Path>) -> DriftResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DriftError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config: Self = contents.parse()?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load `path` if given, otherwise `schema-drift.toml` if it exists,
    /// otherwise defaults. An explicit path that doesn't exist is an error.
    pub fn load_or_default(path: Option<&Path>) -> DriftResult<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.is_file() {
            return Self::load(default_path);
        }
        Ok(Self::default())
    }

    pub fn tbls_source(&self) -> TblsSource {
        TblsSource::new()
            .program(&self.inspector.tbls)
            .timeout(Duration::from_secs(self.inspector.timeout_secs))
    }

    pub fn inspector_options(&self) -> InspectorOptions {
        InspectorOptions {
            preflight: self.inspector.preflight,
            connect_timeout: Duration::from_secs(self.inspector.connect_timeout_secs),
            ..Default::default()
        }
    }

    pub fn compare_options(&self) -> CompareOptions {
        CompareOptions {
            normalizer: Normalizer::with_equivalent_types(&self.compare.equivalent_types),
            ignore_tables: self.compare.ignore_tables.iter().cloned().collect(),
            ignore_comments: self.compare.ignore_comments,
        }
    }
}

impl FromStr for Config {
    type Err = DriftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Self = toml::from_str(s)
            .map_err(|e| DriftError::Config(format!("Invalid configuration: {}", e)))?;

        if config.inspector.tbls.trim().is_empty() {
            return Err(DriftError::Config("inspector.tbls cannot be empty".to_string()));
        }
        if config.inspector.timeout_secs == 0 || config.inspector.connect_timeout_secs == 0 {
            return Err(DriftError::Config("timeouts must be at least one second".to_string()));
        }
        Ok(config)
    }
}
