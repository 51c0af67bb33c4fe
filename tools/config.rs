use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use metadata::ScannerConfig;
use serde::{Deserialize, Serialize};

pub const CONFIG_VERSION: u32 = 1;
const CONFIG_FILE: &str = "scan.yaml";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub version: u32,
    pub media_dir: String,
    pub timeout_ms: u64,
    pub extensions: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            media_dir: String::new(),
            timeout_ms: ScannerConfig::default().timeout_ms,
            extensions: default_extensions(),
        }
    }
}

impl ScanConfig {
    pub fn scanner(&self) -> ScannerConfig {
        ScannerConfig {
            timeout_ms: self.timeout_ms,
        }
    }
}

fn default_extensions() -> Vec<String> {
    ["mp3", "flac", "ogg", "opus", "m4a", "wav", "aiff", "ape", "wv"]
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, source: std::io::Error },
    Write { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_yaml::Error },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "cannot read scan config {:?}: {}", path, source)
            }
            ConfigError::Write { path, source } => {
                write!(f, "cannot write scan config {:?}: {}", path, source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "invalid scan config {:?}: {}", path, source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } | ConfigError::Write { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

/// `SCAN_CONFIG` when set, otherwise `scan.yaml` beside the executable.
pub fn config_path_from_env() -> PathBuf {
    if let Ok(value) = env::var("SCAN_CONFIG") {
        if !value.trim().is_empty() {
            return PathBuf::from(value);
        }
    }
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(CONFIG_FILE)))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
}

pub fn load_or_create_config(path: &Path) -> Result<(ScanConfig, bool), ConfigError> {
    if !path.exists() {
        let config = ScanConfig::default();
        write_config(path, &config)?;
        return Ok((config, true));
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config: ScanConfig =
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    config.version = config.version.max(CONFIG_VERSION);
    if config.timeout_ms == 0 {
        config.timeout_ms = ScannerConfig::default().timeout_ms;
    }
    config.extensions = config
        .extensions
        .iter()
        .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect();
    if config.extensions.is_empty() {
        config.extensions = default_extensions();
    }
    Ok((config, false))
}

fn write_config(path: &Path, config: &ScanConfig) -> Result<(), ConfigError> {
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let contents = serde_yaml::to_string(config).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, contents).map_err(write_err)
}

/// Media directories given relative in the config hang off the config's
/// own directory.
pub fn resolve_media_dir(config_path: &Path, value: &str) -> Option<PathBuf> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let dir = Path::new(value);
    if dir.is_absolute() {
        return Some(dir.to_path_buf());
    }
    let base = config_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Some(base.join(dir))
}
