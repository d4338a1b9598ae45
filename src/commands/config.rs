use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

/// Project configuration loaded from sqlgate.yaml
#[derive(Debug, Serialize, Deserialize)]
pub struct SqlGateConfig {
    /// Name of the project
    pub name: String,

    /// Project version
    #[serde(default = "default_version")]
    pub version: String,

    /// Fully qualified name of the table-catalog object (SCHEMA.NAME)
    #[serde(default)]
    pub table_catalog: String,

    /// Default path to the SQL file or directory to analyze
    #[serde(default)]
    pub sql_path: Option<PathBuf>,

    /// Default output format (text, json, csv, dot)
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

impl Default for SqlGateConfig {
    fn default() -> Self {
        Self {
            name: "sqlgate_project".to_string(),
            version: default_version(),
            table_catalog: String::new(),
            sql_path: None,
            format: default_format(),
        }
    }
}

/// Reads the configuration file from the specified path or looks for
/// sqlgate.yaml in the current directory
pub fn read_config(config_path: Option<PathBuf>) -> Result<SqlGateConfig, ConfigError> {
    let config_path = match config_path {
        Some(path) => path,
        None => PathBuf::from("sqlgate.yaml"),
    };

    if !config_path.exists() {
        return Err(ConfigError::NotFound(config_path));
    }

    let config_str =
        std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Unreadable {
            path: config_path.clone(),
            source,
        })?;
    serde_yaml::from_str(&config_str).map_err(|source| ConfigError::Malformed {
        path: config_path,
        source,
    })
}
