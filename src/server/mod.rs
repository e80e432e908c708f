// Server module entry
// Binds the listener and runs the accept loop

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the module is named server_loop
#[path = "loop.rs"]
pub mod server_loop;

pub use listener::create_listener;
pub use signal::start_signal_handler;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Notify;

use crate::config::{AppState, Config};
use crate::error::StartupError;
use crate::logger;

/// A bound, not yet running server
pub struct Server {
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: Arc<Notify>,
}

/// Stops a running [`Server`] from another task
#[derive(Clone)]
pub struct ShutdownHandle(Arc<Notify>);

impl ShutdownHandle {
    /// Stop accepting connections; `Server::run` returns once in-flight
    /// connections have drained
    pub fn shutdown(&self) {
        self.0.notify_one();
    }
}

impl Server {
    /// Resolve both roots and bind the listening socket.
    ///
    /// Must be called from within a tokio runtime. A port that is already in
    /// use yields [`StartupError::Bind`].
    pub fn bind(config: Config) -> Result<Self, StartupError> {
        let addr = config
            .get_socket_addr()
            .map_err(StartupError::InvalidAddress)?;
        let state = AppState::new(config)?;
        let listener =
            create_listener(addr).map_err(|source| StartupError::Bind { addr, source })?;

        Ok(Self {
            listener,
            state: Arc::new(state),
            shutdown: Arc::new(Notify::new()),
        })
    }

    /// Address actually bound (resolves port 0)
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(Arc::clone(&self.shutdown))
    }

    /// Serve until shut down
    pub async fn run(self) {
        if let Ok(addr) = self.listener.local_addr() {
            logger::log_server_start(
                &addr,
                &self.state.serve_root,
                &self.state.upload_root,
                &self.state.config,
            );
        }
        server_loop::run_accept_loop(self.listener, self.state, self.shutdown).await;
    }
}
