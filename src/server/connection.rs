// Connection handling module
// Accepts a single TCP connection and serves HTTP/1.1 on it

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::TcpStream;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Admit a connection against `performance.max_connections`.
///
/// Returns `false` when the connection was refused and dropped. On success
/// the active-connection counter has been incremented; [`serve_connection`]
/// decrements it when the connection ends.
pub fn accept_connection(stream: &TcpStream, peer_addr: SocketAddr, state: &AppState) -> bool {
    // Increment first, then check, so two racing accepts cannot both pass
    let prev_count = state.active_connections.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            state.active_connections.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            return false;
        }
    }

    if let Err(e) = stream.set_nodelay(true) {
        logger::log_debug(&format!("Failed to set TCP_NODELAY for {peer_addr}: {e}"));
    }
    logger::log_connection_accepted(&peer_addr);
    true
}

/// Serve every request on the connection until it closes.
///
/// Header reads are bounded by `performance.read_timeout`; body reads are
/// bounded per frame by the upload handler.
pub async fn serve_connection(stream: TcpStream, peer_addr: SocketAddr, state: Arc<AppState>) {
    let io = TokioIo::new(stream);

    let mut builder = http1::Builder::new();
    builder
        .keep_alive(state.config.performance.keep_alive)
        .timer(TokioTimer::new())
        .header_read_timeout(state.read_timeout());

    let service_state = Arc::clone(&state);
    let conn = builder.serve_connection(
        io,
        service_fn(move |req| handler::handle_request(req, Arc::clone(&service_state), peer_addr)),
    );

    if let Err(err) = conn.await {
        if err.is_timeout() {
            logger::log_debug(&format!("Connection from {peer_addr} timed out waiting for headers"));
        } else if !err.is_incomplete_message() {
            logger::log_connection_error(&err);
        }
    }

    state.active_connections.fetch_sub(1, Ordering::SeqCst);
}
