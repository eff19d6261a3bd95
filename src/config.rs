//! Analysis configuration.
//!
//! Loaded from a TOML file; every field is optional and falls back to the
//! defaults below.
//!
//! ```toml
//! architecture_name = "Package"
//! path_separator = "."
//! max_depth = 3
//! excludes = ["java.**", "javax.**"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::matcher::{NameMatcher, DEFAULT_SEPARATOR};
use crate::{Error, Result};

pub const DEFAULT_ARCHITECTURE_NAME: &str = "Package";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Name of the generated package architecture.
    pub architecture_name: String,

    /// Separator between name segments, used for patterns and packages.
    pub path_separator: String,

    /// Maximum package depth of generated components. 0 means unbounded.
    pub max_depth: usize,

    /// Property the architecture view is filtered on. Defaults to the
    /// architecture name.
    pub view_tag: Option<String>,

    /// Node name patterns to analyze. Empty means all.
    pub includes: Vec<String>,

    /// Node name patterns to ignore.
    pub excludes: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            architecture_name: DEFAULT_ARCHITECTURE_NAME.to_owned(),
            path_separator: DEFAULT_SEPARATOR.to_owned(),
            max_depth: 0,
            view_tag: None,
            includes: Vec::new(),
            excludes: Vec::new(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AnalysisConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.architecture_name.is_empty() {
            return Err(Error::InvalidArgument("architecture_name must not be empty".to_owned()));
        }
        if self.path_separator.is_empty() {
            return Err(Error::InvalidArgument("path_separator must not be empty".to_owned()));
        }
        Ok(())
    }

    pub fn matcher(&self) -> NameMatcher {
        NameMatcher::new(self.path_separator.clone())
    }

    /// Default config file content.
    pub fn default_config_string() -> String {
        toml::to_string_pretty(&AnalysisConfig::default()).unwrap_or_default()
    }
}
