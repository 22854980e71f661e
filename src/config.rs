use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_LOG_FILE, DEFAULT_LOG_LEVEL, DEFAULT_WELCOME_MESSAGE,
};
use crate::errors::{AskchatError, AskchatResult};
use once_cell::sync::Lazy;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
};

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scheme, host and port of the answer service; endpoint paths are appended.
    pub base_url: String,
    /// Whether new submissions use `/ask-stream` instead of `/ask`.
    pub streaming: bool,
    pub welcome_message: String,
    pub log_level: String,
    pub log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            streaming: true,
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

static CONFIG: Lazy<RwLock<Config>> = Lazy::new(|| RwLock::new(Config::default()));

/// Loads the config file (writing the defaults on first run), applies
/// environment overrides and installs the result as the process config.
pub fn initialize_config() -> AskchatResult<Config> {
    dotenv::dotenv().ok();

    let config_path = get_config_path()?;
    let mut config = if config_path.exists() {
        load_config_from(&config_path)?
    } else {
        let config = Config::default();
        save_config_to(&config_path, &config)?;
        config
    };

    apply_env_overrides(&mut config)?;
    validate_config(&config)?;

    *CONFIG.write().unwrap_or_else(PoisonError::into_inner) = config.clone();
    Ok(config)
}

fn get_config_path() -> AskchatResult<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| AskchatError::config_error("Could not determine home directory"))?;

    Ok(home_dir.join(".config").join("askchat").join("config.json"))
}

pub fn load_config_from(path: &Path) -> AskchatResult<Config> {
    let config_str = fs::read_to_string(path)
        .map_err(|e| AskchatError::config_error(format!("Failed to read config file: {}", e)))?;

    serde_json::from_str(&config_str)
        .map_err(|e| AskchatError::config_error(format!("Failed to parse config: {}", e)))
}

pub fn save_config_to(path: &Path, config: &Config) -> AskchatResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AskchatError::config_error(format!("Failed to create config directory: {}", e))
        })?;
    }

    let config_str = serde_json::to_string_pretty(config)?;
    fs::write(path, config_str)
        .map_err(|e| AskchatError::config_error(format!("Failed to write config file: {}", e)))
}

fn apply_env_overrides(config: &mut Config) -> AskchatResult<()> {
    apply_overrides(config, |key| dotenv::var(key).ok())
}

fn apply_overrides<F>(config: &mut Config, lookup: F) -> AskchatResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("ASKCHAT_BASE_URL") {
        config.base_url = url;
    }
    if let Some(streaming) = lookup("ASKCHAT_STREAMING") {
        config.streaming = parse_flag(&streaming).ok_or_else(|| {
            AskchatError::config_error(format!("ASKCHAT_STREAMING is not a boolean: {}", streaming))
        })?;
    }
    if let Some(level) = lookup("ASKCHAT_LOG_LEVEL") {
        config.log_level = level.to_lowercase();
    }
    Ok(())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn validate_config(config: &Config) -> AskchatResult<()> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| AskchatError::config_error(format!("Invalid base_url: {}", e)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(AskchatError::config_error(
            "base_url must use http or https",
        ));
    }

    if config.welcome_message.trim().is_empty() {
        return Err(AskchatError::config_error("welcome_message must not be empty"));
    }

    if !LOG_LEVELS.contains(&config.log_level.as_str()) {
        return Err(AskchatError::config_error(format!(
            "log_level must be one of {}",
            LOG_LEVELS.join(", ")
        )));
    }

    if config.log_file.trim().is_empty() {
        return Err(AskchatError::config_error("log_file must not be empty"));
    }

    Ok(())
}

pub fn get_config() -> Config {
    CONFIG
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Saves the streaming mode to the config file and the process config.
///
/// The file is re-read so environment overrides in the process config never
/// end up on disk.
pub fn persist_streaming(enabled: bool) -> AskchatResult<()> {
    save_streaming_to(&get_config_path()?, enabled)?;
    CONFIG.write().unwrap_or_else(PoisonError::into_inner).streaming = enabled;
    Ok(())
}

fn save_streaming_to(path: &Path, enabled: bool) -> AskchatResult<()> {
    let mut stored = if path.exists() {
        load_config_from(path)?
    } else {
        Config::default()
    };
    stored.streaming = enabled;
    save_config_to(path, &stored)
}
