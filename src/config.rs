use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::api::DEFAULT_HOST;

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_copy_window_ms() -> u64 {
    2000
}

fn default_company_options() -> Vec<String> {
    ["AmazonHelp", "AppleSupport", "Uber_Support", "SpotifyCares", "Delta"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_width() -> u32 {
    900
}

fn default_height() -> u32 {
    760
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub companies: CompanyConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ServiceConfig {
    #[serde(default = "default_host")]
    pub host: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CompanyConfig {
    #[serde(default = "default_company_options")]
    pub options: Vec<String>,
    #[serde(default)]
    pub default: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct WindowConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct FeedbackConfig {
    #[serde(default = "default_copy_window_ms")]
    pub copy_window_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig { host: default_host() }
    }
}

impl Default for CompanyConfig {
    fn default() -> Self {
        let options = default_company_options();
        CompanyConfig {
            default: options[0].clone(),
            options,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            width: default_width(),
            height: default_height(),
        }
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        FeedbackConfig {
            copy_window_ms: default_copy_window_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            service: ServiceConfig::default(),
            companies: CompanyConfig::default(),
            window: WindowConfig::default(),
            feedback: FeedbackConfig::default(),
        }
    }
}

impl CompanyConfig {
    /// The company selected at startup. Falls back to the first option when
    /// the configured default is not one of the options.
    pub fn initial(&self) -> String {
        if self.options.iter().any(|o| o == &self.default) {
            return self.default.clone();
        }
        self.options.first().cloned().unwrap_or_else(|| self.default.clone())
    }
}

impl FeedbackConfig {
    pub fn copy_window(&self) -> Duration {
        Duration::from_millis(self.copy_window_ms)
    }
}

impl Config {
    pub fn load() -> Self {
        let config_path = Self::get_config_path();

        if config_path.exists() {
            match fs::read_to_string(&config_path) {
                Ok(contents) => match Self::parse(&contents) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!(
                        path = %config_path.display(),
                        error = %e,
                        "invalid config, using defaults"
                    ),
                },
                Err(e) => tracing::warn!(
                    path = %config_path.display(),
                    error = %e,
                    "unreadable config, using defaults"
                ),
            }
        } else if let Some(parent) = config_path.parent() {
            let _ = fs::create_dir_all(parent);
        }

        Config::default()
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn get_config_path() -> PathBuf {
        Self::get_config_dir().join("config.toml")
    }

    pub fn get_config_dir() -> PathBuf {
        if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home).join(".config/reply-desk")
        } else {
            PathBuf::from(".")
        }
    }
}
