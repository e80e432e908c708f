//! Startup error type
//!
//! Everything that can go wrong before the accept loop runs. Per-request
//! failures never reach this type; they are mapped to HTTP statuses by the
//! handlers.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug)]
pub enum StartupError {
    /// Configuration sources could not be read or deserialized
    Config(config::ConfigError),
    /// `server.host` / `server.port` do not form a socket address
    InvalidAddress(String),
    /// A configured root is missing or not a directory
    Root { path: PathBuf, source: io::Error },
    /// Log files could not be opened
    Logger(io::Error),
    /// The listener could not be bound (e.g. port already in use)
    Bind { addr: SocketAddr, source: io::Error },
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid configuration: {e}"),
            Self::InvalidAddress(msg) => write!(f, "{msg}"),
            Self::Root { path, source } => {
                write!(f, "root directory '{}' is unusable: {source}", path.display())
            }
            Self::Logger(e) => write!(f, "cannot open log file: {e}"),
            Self::Bind { addr, source } => write!(f, "failed to bind {addr}: {source}"),
        }
    }
}

impl std::error::Error for StartupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::InvalidAddress(_) => None,
            Self::Root { source, .. } | Self::Logger(source) | Self::Bind { source, .. } => {
                Some(source)
            }
        }
    }
}

impl From<config::ConfigError> for StartupError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e)
    }
}
