use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::http::connection::DEFAULT_REQUEST_BUFFER_SIZE;
use crate::http::response::DEFAULT_HEADER_CAPACITY;

/// Config file read when `STATICD_CONFIG` is not set, if it exists.
pub const DEFAULT_CONFIG_FILE: &str = "staticd.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Connections served at the same time.
    pub workers: usize,
    /// Accepted connections allowed to wait for a worker.
    pub queue_depth: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            workers: 5,
            queue_depth: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Directory to serve. Canonicalized once at startup.
    pub root: PathBuf,
    pub request_buffer_size: usize,
    pub header_capacity: usize,
    /// Value of the `Server` response header.
    pub server_name: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            request_buffer_size: DEFAULT_REQUEST_BUFFER_SIZE,
            header_capacity: DEFAULT_HEADER_CAPACITY,
            server_name: env!("CARGO_PKG_NAME").to_string(),
        }
    }
}

impl Config {
    /// Loads the YAML config file, if any, then applies environment
    /// overrides (`LISTEN`, `STATICD_ROOT`).
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var_os("STATICD_CONFIG") {
            Some(path) => Self::from_file(Path::new(&path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        if let Ok(listen_addr) = std::env::var("LISTEN") {
            cfg.server.listen_addr = listen_addr;
        }
        if let Some(root) = std::env::var_os("STATICD_ROOT") {
            cfg.http.root = PathBuf::from(root);
        }

        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        let cfg: Config = serde_yaml::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.server.workers == 0 {
            anyhow::bail!("server.workers must be at least 1");
        }
        if self.http.request_buffer_size < 16 {
            anyhow::bail!("http.request_buffer_size is too small to hold a request line");
        }
        if self.http.header_capacity < 2 {
            anyhow::bail!("http.header_capacity cannot hold the header terminator");
        }
        Ok(())
    }
}
