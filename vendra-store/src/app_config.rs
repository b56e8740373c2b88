use std::collections::HashMap;
use std::env;

use serde::Deserialize;
use vendra_core::ProviderCredentials;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    /// Absent means the in-memory stores back the service.
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    /// Provider name → credentials. Only listed providers get an adapter.
    #[serde(default)]
    pub providers: HashMap<String, ProviderCredentials>,
    #[serde(default)]
    pub import: ImportSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImportSettings {
    #[serde(default = "default_markup_factor")]
    pub markup_factor: f64,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
    #[serde(default = "default_burst")]
    pub burst: u32,
    #[serde(default = "default_category_limit")]
    pub category_limit: usize,
}

fn default_markup_factor() -> f64 {
    1.3
}
fn default_page_size() -> u32 {
    40
}
fn default_max_pages() -> u32 {
    5
}
fn default_max_concurrent() -> usize {
    3
}
fn default_requests_per_minute() -> u32 {
    60
}
fn default_burst() -> u32 {
    5
}
fn default_category_limit() -> usize {
    10
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            markup_factor: default_markup_factor(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            max_concurrent: default_max_concurrent(),
            requests_per_minute: default_requests_per_minute(),
            burst: default_burst(),
            category_limit: default_category_limit(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file
            // Default to 'development' env
            // Note that this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of VENDRA)
            // Eg.. `VENDRA__SERVER__PORT=9090` would set the server port
            .add_source(config::Environment::with_prefix("VENDRA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
