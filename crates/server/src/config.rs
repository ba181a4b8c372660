use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LOG_FILE: &str = "network_devices.log";
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_file: PathBuf,
    pub max_body_bytes: usize,
    /// Apply the single-record field check to every PUT/PATCH element.
    pub validate_batches: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            validate_batches: true,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Default, Clone)]
pub struct CliServerOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_file: Option<PathBuf>,
    pub lenient_batches: bool,
}

#[derive(Debug, Default, Clone)]
pub struct FileServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_file: Option<PathBuf>,
    pub max_body_bytes: Option<usize>,
    pub validate_batches: Option<bool>,
}

#[derive(Deserialize)]
struct RootConfig {
    #[serde(default)]
    server: Option<RawFileServerConfig>,
}

#[derive(Deserialize, Default)]
struct RawFileServerConfig {
    host: Option<String>,
    port: Option<u16>,
    log_file: Option<String>,
    max_body_bytes: Option<usize>,
    validate_batches: Option<bool>,
}

/// Reads the `[server]` table from a TOML file. A missing file is not an error.
pub fn load_file_config(path: Option<&Path>) -> Result<Option<FileServerConfig>> {
    let Some(path) = path else {
        return Ok(None);
    };

    if !path.exists() {
        tracing::debug!("config file {} not found; using defaults", path.display());
        return Ok(None);
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read server config from {}", path.display()))?;
    let parsed: RootConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse TOML config {}", path.display()))?;

    Ok(parsed
        .server
        .map(|raw| raw.into_runtime_config(path.parent().unwrap_or(Path::new(".")))))
}

/// Layers CLI options over the file config over the built-in defaults.
pub fn resolve_config(cli: &CliServerOptions, file_cfg: Option<&FileServerConfig>) -> ServerConfig {
    let defaults = ServerConfig::default();

    let host = cli
        .host
        .clone()
        .or_else(|| file_cfg.and_then(|cfg| cfg.host.clone()))
        .unwrap_or(defaults.host);

    let port = cli
        .port
        .or_else(|| file_cfg.and_then(|cfg| cfg.port))
        .unwrap_or(defaults.port);

    let log_file = cli
        .log_file
        .clone()
        .or_else(|| file_cfg.and_then(|cfg| cfg.log_file.clone()))
        .unwrap_or(defaults.log_file);

    let max_body_bytes = file_cfg
        .and_then(|cfg| cfg.max_body_bytes)
        .unwrap_or(defaults.max_body_bytes);

    let validate_batches = if cli.lenient_batches {
        false
    } else {
        file_cfg
            .and_then(|cfg| cfg.validate_batches)
            .unwrap_or(defaults.validate_batches)
    };

    ServerConfig {
        host,
        port,
        log_file,
        max_body_bytes,
        validate_batches,
    }
}

fn resolve_relative(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

impl RawFileServerConfig {
    fn into_runtime_config(self, base: &Path) -> FileServerConfig {
        FileServerConfig {
            host: self.host,
            port: self.port,
            log_file: self
                .log_file
                .map(|value| resolve_relative(base, Path::new(&value))),
            max_body_bytes: self.max_body_bytes,
            validate_batches: self.validate_batches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_fixed_constants() {
        let config = resolve_config(&CliServerOptions::default(), None);
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_addr(), "localhost:8080");
        assert_eq!(config.log_file, PathBuf::from("network_devices.log"));
        assert!(config.validate_batches);
    }

    #[test]
    fn file_config_is_loaded_and_paths_resolved() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("netdev.toml");
        fs::write(
            &path,
            r#"
[server]
host = "0.0.0.0"
port = 9090
log_file = "logs/devices.log"
max_body_bytes = 1024
validate_batches = false
"#,
        )
        .expect("write config");

        let file_cfg = load_file_config(Some(&path))
            .expect("load config")
            .expect("server table");
        let config = resolve_config(&CliServerOptions::default(), Some(&file_cfg));

        assert_eq!(config.bind_addr(), "0.0.0.0:9090");
        assert_eq!(config.log_file, dir.path().join("logs/devices.log"));
        assert_eq!(config.max_body_bytes, 1024);
        assert!(!config.validate_batches);
    }

    #[test]
    fn missing_file_is_ignored() {
        let dir = tempdir().expect("tempdir");
        let loaded = load_file_config(Some(&dir.path().join("absent.toml"))).expect("load");
        assert!(loaded.is_none());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[server\nport = ").expect("write config");
        assert!(load_file_config(Some(&path)).is_err());
    }

    #[test]
    fn cli_overrides_file() {
        let file_cfg = FileServerConfig {
            host: Some("0.0.0.0".to_string()),
            port: Some(4000),
            log_file: Some(PathBuf::from("/var/log/devices.log")),
            max_body_bytes: None,
            validate_batches: Some(true),
        };
        let cli = CliServerOptions {
            host: Some("127.0.0.1".to_string()),
            port: Some(9000),
            log_file: None,
            lenient_batches: true,
        };

        let config = resolve_config(&cli, Some(&file_cfg));
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
        assert_eq!(config.log_file, PathBuf::from("/var/log/devices.log"));
        assert!(!config.validate_batches);
    }
}
