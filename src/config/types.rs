// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
}

/// Listener configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Tokio worker threads, CPU cores when unset
    #[serde(default)]
    pub workers: Option<usize>,
}

/// Where files are served from and written to
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    /// Served root for GET/HEAD
    pub serve_root: String,
    /// Write root for POST uploads
    pub upload_root: String,
    #[serde(default = "default_index_files")]
    pub index_files: Vec<String>,
    #[serde(default = "default_directory_listing")]
    pub directory_listing: bool,
}

fn default_index_files() -> Vec<String> {
    vec!["index.html".to_string(), "index.htm".to_string()]
}

#[allow(clippy::missing_const_for_fn)]
fn default_directory_listing() -> bool {
    true
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    pub show_headers: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

fn default_access_log_format() -> String {
    "common".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    /// Seconds allowed for request headers and for each body read
    pub read_timeout: u64,
    #[serde(default)]
    pub max_connections: Option<u64>,
    /// Serve one connection at a time instead of a task per connection
    #[serde(default)]
    pub sequential: bool,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    /// Largest accepted upload in bytes
    pub max_body_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                workers: None,
            },
            storage: StorageConfig {
                serve_root: ".".to_string(),
                upload_root: ".".to_string(),
                index_files: default_index_files(),
                directory_listing: default_directory_listing(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                access_log: true,
                show_headers: false,
                access_log_format: default_access_log_format(),
                access_log_file: None,
                error_log_file: None,
            },
            performance: PerformanceConfig {
                keep_alive: true,
                read_timeout: 30,
                max_connections: None,
                sequential: false,
            },
            http: HttpConfig {
                server_name: concat!("filedrop/", env!("CARGO_PKG_VERSION")).to_string(),
                max_body_size: 1_073_741_824, // 1GB
            },
        }
    }
}
