// Configuration module entry point
// Loads layered configuration and builds the per-server runtime state

mod state;
mod types;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::StartupError;

// Re-export public types
pub use state::AppState;
pub use types::{Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig, StorageConfig};

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    ///
    /// Precedence: built-in defaults, then the file, then `FILEDROP_*`
    /// environment variables (`FILEDROP_SERVER__PORT=9000`).
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("FILEDROP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("storage.index_files"),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Absolute served root, checked to be an existing directory
    pub fn resolve_serve_root(&self) -> Result<PathBuf, StartupError> {
        resolve_dir(&self.storage.serve_root)
    }

    /// Absolute write root, checked to be an existing directory
    pub fn resolve_upload_root(&self) -> Result<PathBuf, StartupError> {
        resolve_dir(&self.storage.upload_root)
    }
}

fn resolve_dir(path: &str) -> Result<PathBuf, StartupError> {
    let root_error = |source| StartupError::Root {
        path: PathBuf::from(path),
        source,
    };
    let canonical = Path::new(path).canonicalize().map_err(root_error)?;
    if !canonical.is_dir() {
        return Err(root_error(std::io::Error::other("not a directory")));
    }
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_binding() {
        let cfg = Config::default();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.storage.serve_root, ".");
        assert_eq!(cfg.storage.upload_root, ".");
        assert!(cfg.storage.directory_listing);
        assert!(!cfg.performance.sequential);
    }

    #[test]
    fn test_socket_addr() {
        let mut cfg = Config::default();
        assert_eq!(
            cfg.get_socket_addr().unwrap(),
            "0.0.0.0:8000".parse::<SocketAddr>().unwrap()
        );
        cfg.server.host = "not an ip".to_string();
        assert!(cfg.get_socket_addr().is_err());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let cfg = Config::load_from("definitely-missing-filedrop-config").unwrap();
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.http.max_body_size, 1_073_741_824);
        assert_eq!(cfg.logging.access_log_format, "common");
    }

    #[test]
    fn test_resolve_missing_root() {
        let mut cfg = Config::default();
        cfg.storage.serve_root = "/definitely/missing/filedrop/root".to_string();
        assert!(matches!(
            cfg.resolve_serve_root(),
            Err(StartupError::Root { .. })
        ));
    }
}
