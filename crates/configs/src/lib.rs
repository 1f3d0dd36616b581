use std::io::ErrorKind;
use std::path::Path;

use anyhow::anyhow;
use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub authorizer: AuthorizerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    /// Bind address of the `/healthz` + `/metrics` server; disabled when absent.
    #[serde(default)]
    pub admin_addr: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8081, worker_threads: None, admin_addr: None }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_table_name")]
    pub table_name: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { backend: StorageBackend::File, data_dir: default_data_dir(), table_name: default_table_name() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizerConfig {
    #[serde(default = "default_authz_base_url")]
    pub base_url: String,
    /// Path below `base_url`; `{urn}` is replaced by the caller-supplied identifier.
    #[serde(default = "default_check_path")]
    pub check_path: String,
    #[serde(default = "default_authz_timeout")]
    pub timeout_secs: u64,
}

impl Default for AuthorizerConfig {
    fn default() -> Self {
        Self {
            base_url: default_authz_base_url(),
            check_path: default_check_path(),
            timeout_secs: default_authz_timeout(),
        }
    }
}

fn default_data_dir() -> String { "data".into() }
fn default_table_name() -> String { "AttributesTable".into() }
fn default_authz_base_url() -> String { "https://developer.api.autodesk.com".into() }
fn default_check_path() -> String { "modelderivative/v2/designdata/{urn}/metadata".into() }
fn default_authz_timeout() -> u64 { 10 }

/// Config file location, `CONFIG_PATH` or `config.toml`.
pub fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load from file when present, otherwise build from defaults plus environment.
    pub fn load_or_env() -> Result<Self> {
        Self::load_or_env_from(Path::new(&config_path()))
    }

    /// Like [`AppConfig::load_or_env`] for an explicit path. Only a missing file
    /// falls back to defaults; an unreadable or malformed file is an error.
    pub fn load_or_env_from(path: &Path) -> Result<Self> {
        let mut cfg = match std::fs::read_to_string(path) {
            Ok(content) => parse(&content).with_context(|| format!("parsing {}", path.display()))?,
            Err(e) if e.kind() == ErrorKind::NotFound => AppConfig::default(),
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize_from_env();
        self.server.normalize()?;
        self.storage.normalize_from_env();
        self.storage.validate()?;
        self.authorizer.normalize_from_env();
        self.authorizer.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    pub fn normalize_from_env(&mut self) {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            if !host.trim().is_empty() {
                self.host = host;
            }
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }
        if self.worker_threads.is_none() {
            self.worker_threads = std::env::var("TOKIO_WORKER_THREADS").ok().and_then(|v| v.parse::<usize>().ok());
        }
    }

    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        if let Some(addr) = &self.admin_addr {
            if addr.trim().is_empty() {
                self.admin_addr = None;
            }
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl StorageConfig {
    pub fn normalize_from_env(&mut self) {
        if let Ok(dir) = std::env::var("STORAGE_DIR") {
            if !dir.trim().is_empty() {
                self.data_dir = dir;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.table_name.trim().is_empty() {
            return Err(anyhow!("storage.table_name is empty"));
        }
        if self.table_name.contains(['/', '\\']) {
            return Err(anyhow!("storage.table_name must not contain path separators"));
        }
        if self.backend == StorageBackend::File && self.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir is empty; set it in config.toml or STORAGE_DIR"));
        }
        Ok(())
    }
}

impl AuthorizerConfig {
    pub fn normalize_from_env(&mut self) {
        if let Ok(url) = std::env::var("AUTHZ_BASE_URL") {
            if !url.trim().is_empty() {
                self.base_url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let lower = self.base_url.to_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Err(anyhow!("authorizer.base_url must start with http:// or https://"));
        }
        if !self.check_path.contains("{urn}") {
            return Err(anyhow!("authorizer.check_path must contain the {{urn}} placeholder"));
        }
        if self.timeout_secs == 0 {
            return Err(anyhow!("authorizer.timeout_secs must be a positive number of seconds"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() -> Result<()> {
        let cfg = parse("")?;
        assert_eq!(cfg.server.port, 8081);
        assert_eq!(cfg.storage.backend, StorageBackend::File);
        assert_eq!(cfg.storage.table_name, "AttributesTable");
        assert!(cfg.authorizer.check_path.contains("{urn}"));
        Ok(())
    }

    #[test]
    fn parses_all_sections() -> Result<()> {
        let cfg = parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000
            admin_addr = "127.0.0.1:9100"

            [storage]
            backend = "memory"
            table_name = "Attrs"

            [authorizer]
            base_url = "http://localhost:7000"
            check_path = "check/{urn}"
            timeout_secs = 3
            "#,
        )?;
        assert_eq!(cfg.server.bind_addr(), "0.0.0.0:9000");
        assert_eq!(cfg.server.admin_addr.as_deref(), Some("127.0.0.1:9100"));
        assert_eq!(cfg.storage.backend, StorageBackend::Memory);
        assert_eq!(cfg.storage.data_dir, "data");
        assert_eq!(cfg.authorizer.timeout_secs, 3);
        Ok(())
    }

    fn temp_config(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("attr_cfg_{}_{name}.toml", std::process::id()));
        std::fs::write(&path, content).expect("write temp config");
        path
    }

    #[test]
    fn malformed_file_is_an_error() {
        let path = temp_config(
            "malformed",
            r#"
            [authorizer]
            base_url = "http://localhost:7000"
            timeout_secs = "ten"
            "#,
        );
        let res = AppConfig::load_or_env_from(&path);
        let _ = std::fs::remove_file(&path);
        assert!(res.is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() -> Result<()> {
        let path = std::env::temp_dir().join(format!("attr_cfg_{}_absent.toml", std::process::id()));
        let cfg = AppConfig::load_or_env_from(&path)?;
        assert_eq!(cfg.storage.table_name, "AttributesTable");
        assert_eq!(cfg.server.worker_threads.map(|w| w > 0), Some(true));
        Ok(())
    }

    #[test]
    fn existing_file_is_used() -> Result<()> {
        let path = temp_config(
            "valid",
            r#"
            [storage]
            table_name = "FromFile"
            "#,
        );
        let res = AppConfig::load_or_env_from(&path);
        let _ = std::fs::remove_file(&path);
        assert_eq!(res?.storage.table_name, "FromFile");
        Ok(())
    }

    #[test]
    fn rejects_check_path_without_placeholder() {
        let cfg = AuthorizerConfig { check_path: "metadata".into(), ..AuthorizerConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_non_http_base_url() {
        let cfg = AuthorizerConfig { base_url: "ftp://example.com".into(), ..AuthorizerConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_bad_table_name() {
        let cfg = StorageConfig { table_name: "../escape".into(), ..StorageConfig::default() };
        assert!(cfg.validate().is_err());
        let cfg = StorageConfig { table_name: "  ".into(), ..StorageConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn normalize_fills_worker_threads() -> Result<()> {
        let mut server = ServerConfig { worker_threads: Some(0), ..ServerConfig::default() };
        server.normalize()?;
        assert_eq!(server.worker_threads, Some(4));
        let mut server = ServerConfig { port: 0, ..ServerConfig::default() };
        assert!(server.normalize().is_err());
        Ok(())
    }
}
