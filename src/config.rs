use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::reference::{ISO_URL, LICENSE_URL};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub global: GlobalConfig,
    pub reference: ReferenceConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Parent directory for archive extraction (system temp dir when unset)
    pub temp_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReferenceConfig {
    pub iso_url: String,
    pub license_url: String,
    /// Local copies; take precedence over the URLs
    pub iso_csv: Option<PathBuf>,
    pub license_csv: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            iso_url: ISO_URL.to_string(),
            license_url: LICENSE_URL.to_string(),
            iso_csv: None,
            license_csv: None,
            timeout_secs: 60,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;
        Ok(config)
    }
}
