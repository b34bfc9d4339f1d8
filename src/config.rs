// src/config.rs

use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct ProbeConfig {
    #[serde(default = "default_security_txt_timeout")]
    pub security_txt_timeout_secs: u64,
    #[serde(default = "default_homepage_timeout")]
    pub homepage_timeout_secs: u64,
    #[serde(default = "default_platform_timeout")]
    pub platform_timeout_secs: u64,
    #[serde(default)]
    pub homepage_http_fallback: bool,
    #[serde(default = "default_scheme")]
    pub scheme: String,  // Scheme used for security.txt and homepage fetches
    #[serde(default = "default_platform_templates")]
    pub platform_templates: Vec<String>,  // `{domain}` is substituted
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_security_txt_timeout() -> u64 { 5 }
fn default_homepage_timeout() -> u64 { 8 }
fn default_platform_timeout() -> u64 { 3 }
fn default_scheme() -> String { "https".to_string() }
fn default_user_agent() -> String {
    format!("bounty-scout/{}", env!("CARGO_PKG_VERSION"))
}

pub fn default_platform_templates() -> Vec<String> {
    vec![
        "https://hackerone.com/{domain}".to_string(),
        "https://bugcrowd.com/{domain}".to_string(),
        "https://yeswehack.com/programs/{domain}".to_string(),
        "https://intigriti.com/bug-bounty/{domain}".to_string(),
    ]
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            security_txt_timeout_secs: default_security_txt_timeout(),
            homepage_timeout_secs: default_homepage_timeout(),
            platform_timeout_secs: default_platform_timeout(),
            homepage_http_fallback: false,
            scheme: default_scheme(),
            platform_templates: default_platform_templates(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

fn default_cache_ttl() -> u64 { 600 }

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SettingsConfig {
    #[serde(default = "default_settings_path")]
    pub path: String,
}

fn default_settings_path() -> String { "bounty-scout-settings.json".to_string() }

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: default_settings_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlatformsConfig {
    #[serde(default = "default_hackerone_api_url")]
    pub hackerone_api_url: String,
    #[serde(default = "default_bugcrowd_api_url")]
    pub bugcrowd_api_url: String,
    #[serde(default = "default_platform_api_timeout")]
    pub api_timeout_secs: u64,
}

fn default_hackerone_api_url() -> String { "https://api.hackerone.com".to_string() }
fn default_bugcrowd_api_url() -> String { "https://api.bugcrowd.com".to_string() }
fn default_platform_api_timeout() -> u64 { 10 }

impl Default for PlatformsConfig {
    fn default() -> Self {
        Self {
            hackerone_api_url: default_hackerone_api_url(),
            bugcrowd_api_url: default_bugcrowd_api_url(),
            api_timeout_secs: default_platform_api_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub probes: ProbeConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub platforms: PlatformsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let cfg: Config = toml::from_str(&contents)?;
        Ok(cfg)
    }

    /// Load the config file if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!("Config file {:?} not found, using defaults", path);
            Ok(Self::default())
        }
    }
}
