//! Configuration management module.
//!
//! Settings come from a YAML file (`~/.config/eeu-complaints/config.yml` by
//! default) and are then overridden by environment variables. A missing file
//! means defaults; nothing is written until `save` is called.

mod error;

pub use error::ConfigError;

use crate::error::AppError;
use log::*;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

/// Deployed backend endpoint.
pub const APPS_SCRIPT_URL: &str = "https://script.google.com/macros/s/AKfycbwRtSTJjIA9_Hx-SpX95dJ2hRg1SSkEGLlyqjWElWJoiGQWtLzt7pwYeyeycah7KpI/exec";

pub const ENV_BASE_URL: &str = "EEU_API_BASE_URL";
pub const ENV_FORCE_DEMO_MODE: &str = "EEU_FORCE_DEMO_MODE";
pub const ENV_BACKEND_URL: &str = "EEU_BACKEND_URL";
pub const ENV_PORT: &str = "PORT";

const FILE_NAME: &str = "config.yml";
const DEFAULT_DIRECTORY_PATH: &str = ".config/eeu-complaints";

/// Oversees management of configuration file.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub base_url: String,
    pub force_demo_mode: bool,
    pub refresh_interval_secs: u64,
    pub proxy: ProxyConfig,
    file_path: Option<PathBuf>,
}

/// Settings for the `proxy` subcommand.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        ProxyConfig {
            port: default_port(),
            backend_url: default_backend_url(),
        }
    }
}

/// Define layout of the configuration file.
///
#[derive(Serialize, Deserialize)]
struct FileSpec {
    #[serde(default = "default_backend_url")]
    pub base_url: String,
    #[serde(default)]
    pub force_demo_mode: bool,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default)]
    pub proxy: ProxyConfig,
}

fn default_backend_url() -> String {
    APPS_SCRIPT_URL.to_string()
}

fn default_refresh_interval_secs() -> u64 {
    300
}

fn default_port() -> u16 {
    3001
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

impl Config {
    /// Return a new instance holding the defaults.
    ///
    pub fn new() -> Config {
        Config {
            base_url: default_backend_url(),
            force_demo_mode: false,
            refresh_interval_secs: default_refresh_interval_secs(),
            proxy: ProxyConfig::default(),
            file_path: None,
        }
    }

    /// Load the configuration file from the custom directory if provided,
    /// or the default directory otherwise, then apply environment
    /// overrides.
    ///
    pub fn load(&mut self, custom_path: Option<&str>) -> Result<(), AppError> {
        let dir_path = match custom_path {
            Some(path) => Path::new(&path).to_path_buf(),
            None => Config::default_path()?,
        };
        self.load_file(dir_path.join(Path::new(FILE_NAME)))?;
        self.apply_env(|key| std::env::var(key).ok())?;
        Ok(())
    }

    fn load_file(&mut self, file_path: PathBuf) -> Result<(), ConfigError> {
        if file_path.exists() {
            let contents = fs::read_to_string(&file_path).map_err(|e| ConfigError::LoadFailed {
                path: file_path.clone(),
                message: format!("IO error: {}", e),
            })?;
            let data: FileSpec = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::DeserializationFailed(e.to_string()))?;
            if data.refresh_interval_secs == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "refresh_interval_secs".to_string(),
                    value: "0".to_string(),
                });
            }
            self.base_url = data.base_url;
            self.force_demo_mode = data.force_demo_mode;
            self.refresh_interval_secs = data.refresh_interval_secs;
            self.proxy = data.proxy;
            debug!("Loaded configuration from {}", file_path.display());
        } else {
            debug!(
                "No configuration file at {}; using defaults",
                file_path.display()
            );
        }
        self.file_path = Some(file_path);
        Ok(())
    }

    /// Override settings from environment variables, looked up through
    /// `lookup`.
    ///
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(value) = lookup(ENV_FORCE_DEMO_MODE) {
            self.force_demo_mode = match value.trim().to_lowercase().as_str() {
                "true" | "1" => true,
                "false" | "0" | "" => false,
                _ => return Err(invalid(ENV_FORCE_DEMO_MODE, value)),
            };
        }
        if let Some(url) = lookup(ENV_BACKEND_URL) {
            self.proxy.backend_url = url;
        }
        if let Some(value) = lookup(ENV_PORT) {
            self.proxy.port = value
                .trim()
                .parse()
                .map_err(|_| invalid(ENV_PORT, value.clone()))?;
        }
        Ok(())
    }

    /// Interval between dashboard refreshes.
    ///
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Render the effective settings as YAML.
    ///
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(&self.file_spec())
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))
    }

    /// Save the current configuration to disk, creating the directory when
    /// needed.
    ///
    pub fn save(&self) -> Result<(), AppError> {
        let file_path = self.file_path.as_ref().ok_or(ConfigError::FilePathNotSet)?;
        let content = self.to_yaml()?;

        if let Some(parent) = file_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| ConfigError::CreateDirectoryFailed {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let mut file = fs::File::create(file_path).map_err(|e| ConfigError::SaveFailed {
            path: file_path.clone(),
            source: e,
        })?;
        write!(file, "{}", content).map_err(|e| ConfigError::SaveFailed {
            path: file_path.clone(),
            source: e,
        })?;
        file.flush().map_err(|e| ConfigError::SaveFailed {
            path: file_path.clone(),
            source: e,
        })?;
        info!("Saved configuration to {}", file_path.display());
        Ok(())
    }

    fn file_spec(&self) -> FileSpec {
        FileSpec {
            base_url: self.base_url.clone(),
            force_demo_mode: self.force_demo_mode,
            refresh_interval_secs: self.refresh_interval_secs,
            proxy: self.proxy.clone(),
        }
    }

    /// Returns the path buffer for the default configuration directory or
    /// an error if the home directory could not be found.
    ///
    fn default_path() -> Result<PathBuf, AppError> {
        match dirs::home_dir() {
            Some(home) => Ok(Path::new(&home).join(Path::new(DEFAULT_DIRECTORY_PATH))),
            None => Err(ConfigError::HomeDirectoryNotFound.into()),
        }
    }
}

fn invalid(key: &str, value: String) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    }
}
