//! Server configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file (`QUIRE_CONFIG`, default `quire.toml`), then `QUIRE_*` environment
//! variables.

use anyhow::{Context, Result};
use ::config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_JWT_SECRET: &str = "change-me";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub data_dir: PathBuf,
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub media_root: Option<PathBuf>,
    pub media_url: String,
    pub static_dir: PathBuf,
    pub site_title: String,
    /// Slug of the page shown on `/`
    pub homepage: String,
    #[serde(default)]
    pub analytics_code: Option<String>,
    #[serde(default)]
    pub analytics_domain: Option<String>,
    pub page_size: u64,
    pub fragment_cache_ttl_secs: u64,
    pub jwt_secret: String,
    #[serde(default)]
    pub admin_email: Option<String>,
    #[serde(default)]
    pub admin_password: Option<String>,
    pub fetch_timeout_secs: u64,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".to_string(),
            data_dir: PathBuf::from("data"),
            database_path: None,
            media_root: None,
            media_url: "/media".to_string(),
            static_dir: PathBuf::from("static"),
            site_title: "Quire".to_string(),
            homepage: String::new(),
            analytics_code: None,
            analytics_domain: None,
            page_size: 10,
            fragment_cache_ttl_secs: 30,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            admin_email: None,
            admin_password: None,
            fetch_timeout_secs: 10,
            log_format: LogFormat::Text,
        }
    }
}

impl ServerConfig {
    /// Load from `QUIRE_CONFIG` (or `quire.toml`) and the environment
    pub fn load() -> Result<Self> {
        let path = std::env::var("QUIRE_CONFIG").unwrap_or_else(|_| "quire.toml".to_string());
        Self::load_from(&path, Environment::with_prefix("QUIRE").try_parsing(true))
    }

    fn load_from(path: &str, env: Environment) -> Result<Self> {
        let defaults = Self::default();
        let settings = Config::builder()
            .set_default("bind_address", defaults.bind_address)?
            .set_default("data_dir", defaults.data_dir.to_string_lossy().to_string())?
            .set_default("media_url", defaults.media_url)?
            .set_default(
                "static_dir",
                defaults.static_dir.to_string_lossy().to_string(),
            )?
            .set_default("site_title", defaults.site_title)?
            .set_default("homepage", defaults.homepage)?
            .set_default("page_size", defaults.page_size)?
            .set_default("fragment_cache_ttl_secs", defaults.fragment_cache_ttl_secs)?
            .set_default("jwt_secret", defaults.jwt_secret)?
            .set_default("fetch_timeout_secs", defaults.fetch_timeout_secs)?
            .set_default("log_format", "text")?
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(env)
            .build()
            .with_context(|| format!("Failed to read configuration ({})", path))?;

        let config: ServerConfig = settings
            .try_deserialize()
            .context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            anyhow::bail!("page_size must be at least 1");
        }
        self.socket_addr()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind_address
            .parse()
            .with_context(|| format!("Failed to parse bind address: {}", self.bind_address))
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("quire.sqlite"))
    }

    pub fn media_root(&self) -> PathBuf {
        self.media_root
            .clone()
            .unwrap_or_else(|| self.data_dir.join("media"))
    }
}
