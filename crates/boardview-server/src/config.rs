use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use boardview_core::{CATALOG_TTL_SECS, DEFAULT_TTL_SECS};
use boardview_remote::DEFAULT_BASE_URL;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Entries live as memories of the cache holder assistant.
    #[default]
    Remote,
    /// Entries live in this process only.
    Local,
}

impl CacheBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "remote" => Some(Self::Remote),
            "local" | "memory" => Some(Self::Local),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub base_url: String,
    /// Used when a request carries no session key.
    pub default_api_key: Option<String>,
    pub request_timeout: Duration,
    pub cache_backend: CacheBackend,
    pub cache_ttl_secs: u64,
    /// Sweep interval for the local backend; `None` disables the sweeper.
    pub cache_sweep_secs: Option<u64>,
    pub catalog_ttl_secs: u64,
    pub cors_origins: Vec<String>,
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: default_base_url(),
            default_api_key: None,
            request_timeout: Duration::from_secs(default_timeout_secs()),
            cache_backend: CacheBackend::default(),
            cache_ttl_secs: DEFAULT_TTL_SECS,
            cache_sweep_secs: Some(default_sweep_secs()),
            catalog_ttl_secs: CATALOG_TTL_SECS,
            cors_origins: Vec::new(),
            static_dir: None,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    server: ServerSection,
    #[serde(default)]
    remote: RemoteSection,
    #[serde(default)]
    cache: CacheSection,
    #[serde(default)]
    catalog: CatalogSection,
}

#[derive(Debug, Deserialize)]
struct ServerSection {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    cors_origins: Vec<String>,
    #[serde(default)]
    static_dir: Option<PathBuf>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            static_dir: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RemoteSection {
    #[serde(default = "default_base_url")]
    base_url: String,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CacheSection {
    #[serde(default)]
    backend: CacheBackend,
    #[serde(default = "default_cache_ttl")]
    ttl_secs: u64,
    #[serde(default = "default_sweep")]
    sweep_interval_secs: Option<u64>,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            ttl_secs: default_cache_ttl(),
            sweep_interval_secs: default_sweep(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CatalogSection {
    #[serde(default = "default_catalog_ttl")]
    ttl_secs: u64,
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            ttl_secs: default_catalog_ttl(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_cache_ttl() -> u64 {
    DEFAULT_TTL_SECS
}

fn default_sweep_secs() -> u64 {
    300
}

fn default_sweep() -> Option<u64> {
    Some(default_sweep_secs())
}

fn default_catalog_ttl() -> u64 {
    CATALOG_TTL_SECS
}

impl ServerConfig {
    pub fn load() -> anyhow::Result<Self> {
        if let Some(path) = config_path() {
            return Self::from_file(&path);
        }

        Ok(Self::from_lookup(|name| env::var(name).ok()))
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|err| anyhow::anyhow!("Failed to read config {}: {}", path.display(), err))?;
        let parsed: FileConfig = toml::from_str(&contents)
            .map_err(|err| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), err))?;

        Ok(Self {
            host: parsed.server.host,
            port: parsed.server.port,
            base_url: parsed.remote.base_url,
            default_api_key: non_blank(parsed.remote.api_key),
            request_timeout: Duration::from_secs(parsed.remote.timeout_secs),
            cache_backend: parsed.cache.backend,
            cache_ttl_secs: parsed.cache.ttl_secs,
            cache_sweep_secs: parsed.cache.sweep_interval_secs.filter(|secs| *secs > 0),
            catalog_ttl_secs: parsed.catalog.ttl_secs,
            cors_origins: parsed.server.cors_origins,
            static_dir: parsed.server.static_dir,
        })
    }

    /// Build from environment-style variables supplied by `lookup`.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let host = lookup("BOARDVIEW_HOST").unwrap_or(defaults.host);
        let port = lookup("BOARDVIEW_PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(defaults.port);
        let base_url = lookup("BACKBOARD_API_BASE_URL").unwrap_or(defaults.base_url);
        let cache_backend = lookup("BOARDVIEW_CACHE_BACKEND")
            .and_then(|value| CacheBackend::parse(&value))
            .unwrap_or(defaults.cache_backend);
        let cors_origins = lookup("BOARDVIEW_CORS_ORIGINS")
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            host,
            port,
            base_url,
            default_api_key: non_blank(lookup("BACKBOARD_API_KEY")),
            cache_backend,
            cors_origins,
            static_dir: lookup("BOARDVIEW_STATIC_DIR").map(PathBuf::from),
            ..defaults
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var("BOARDVIEW_SERVER_CONFIG") {
        return Some(PathBuf::from(path));
    }
    let local = Path::new("server.toml");
    local.exists().then(|| local.to_path_buf())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
