// Application state module
// Per-server runtime state shared by every connection

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::types::Config;
use crate::error::StartupError;

/// Application state
///
/// One instance per running server, shared through an `Arc`. Nothing here is
/// process-global, so several servers can run side by side.
pub struct AppState {
    pub config: Config,
    /// Canonical served root
    pub serve_root: PathBuf,
    /// Canonical write root
    pub upload_root: PathBuf,
    /// Connections currently being served
    pub active_connections: AtomicUsize,
    upload_seq: AtomicU64,
}

impl AppState {
    /// Build state from configuration, resolving both roots up front
    pub fn new(config: Config) -> Result<Self, StartupError> {
        let serve_root = config.resolve_serve_root()?;
        let upload_root = config.resolve_upload_root()?;

        Ok(Self {
            config,
            serve_root,
            upload_root,
            active_connections: AtomicUsize::new(0),
            upload_seq: AtomicU64::new(0),
        })
    }

    pub const fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.config.performance.read_timeout)
    }

    /// Sequence number for naming an in-progress upload file
    pub fn next_upload_seq(&self) -> u64 {
        self.upload_seq.fetch_add(1, Ordering::Relaxed)
    }
}
