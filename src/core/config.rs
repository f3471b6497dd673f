//! Optional TOML configuration.
//!
//! Looked up at `--config <path>` first, then `<config_dir>/storescrub/config.toml`.
//! A missing default file means defaults; a missing explicit file is an error.

use crate::core::error::ScrubError;
use crate::core::terms::BUILTIN_SEEDS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_DIR_NAME: &str = "storescrub";
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScrubConfig {
    pub terms: TermsConfig,
    pub regenerate: RegenerateConfig,
    pub discovery: DiscoveryConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TermsConfig {
    /// Base64 seeds appended after the built-in ones.
    pub extra_seeds: Vec<String>,
    /// Use only `extra_seeds`.
    pub replace_builtin: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegenerateConfig {
    pub lock: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// Descriptor keys to target; empty means all.
    pub apps: Vec<String>,
    pub family_scan: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            apps: Vec::new(),
            family_scan: true,
        }
    }
}

impl ScrubConfig {
    /// Seeds to decode, built-in first unless replaced.
    pub fn seeds(&self) -> Vec<String> {
        let mut seeds: Vec<String> = if self.terms.replace_builtin {
            Vec::new()
        } else {
            BUILTIN_SEEDS.iter().map(|s| s.to_string()).collect()
        };
        seeds.extend(self.terms.extra_seeds.iter().cloned());
        seeds
    }

    pub fn parse(content: &str) -> Result<Self, ScrubError> {
        toml::from_str(content).map_err(|e| ScrubError::ConfigError(e.to_string()))
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load from an explicit path or the default location.
pub fn load_config(explicit: Option<&Path>) -> Result<ScrubConfig, ScrubError> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(ScrubError::ConfigError(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        return read_config(path);
    }

    match default_config_path() {
        Some(path) if path.is_file() => read_config(&path),
        // No config = defaults (not an error)
        _ => Ok(ScrubConfig::default()),
    }
}

fn read_config(path: &Path) -> Result<ScrubConfig, ScrubError> {
    let content = fs::read_to_string(path).map_err(ScrubError::IoError)?;
    ScrubConfig::parse(&content)
        .map_err(|e| ScrubError::ConfigError(format!("{}: {}", path.display(), e)))
}
