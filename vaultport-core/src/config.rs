//! Conversion settings.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

/// Settings for one conversion run, loadable from a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Site title, used in the generated site configuration
    #[serde(default = "default_site_name")]
    pub site_name: String,

    #[serde(default = "default_description")]
    pub description: String,

    #[serde(default)]
    pub author: String,

    /// GitHub username for the publish target URL
    #[serde(default)]
    pub github_username: String,

    /// GitHub repository name for the publish target URL
    #[serde(default = "default_repo_name")]
    pub repo_name: String,

    /// Wrap display math in `$$$$` delimiters
    #[serde(default)]
    pub math_alt_delimiters: bool,

    /// Double `\\` line breaks inside display math
    #[serde(default)]
    pub math_alt_line_breaks: bool,

    /// Keep the site-configuration file from an uploaded archive instead
    /// of regenerating it
    #[serde(default = "default_true")]
    pub preserve_site_config: bool,
}

fn default_site_name() -> String {
    String::from("My Blog")
}

fn default_description() -> String {
    String::from("A blog powered by Hugo and PaperMod")
}

fn default_repo_name() -> String {
    String::from("my-blog")
}

fn default_true() -> bool {
    true
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            site_name: default_site_name(),
            description: default_description(),
            author: String::new(),
            github_username: String::new(),
            repo_name: default_repo_name(),
            math_alt_delimiters: false,
            math_alt_line_breaks: false,
            preserve_site_config: default_true(),
        }
    }
}

impl ConvertConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: ConvertConfig = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Both GitHub fields set, so a full publishable site can be scaffolded
    pub fn has_publish_target(&self) -> bool {
        !self.github_username.trim().is_empty() && !self.repo_name.trim().is_empty()
    }
}
