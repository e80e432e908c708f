// Server loop module
// Accept loop with shutdown handling

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::connection::{accept_connection, serve_connection};
use crate::config::AppState;
use crate::logger;

/// How long in-flight connections get to finish after shutdown
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);
const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Accept connections until `shutdown` is notified.
///
/// Each connection runs in its own task unless `performance.sequential` is
/// set, in which case connections are served one at a time on this task.
pub async fn run_accept_loop(listener: TcpListener, state: Arc<AppState>, shutdown: Arc<Notify>) {
    let sequential = state.config.performance.sequential;

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                let (stream, peer_addr) = match accept_result {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                        continue;
                    }
                };

                if !accept_connection(&stream, peer_addr, &state) {
                    continue;
                }

                if sequential {
                    tokio::select! {
                        () = serve_connection(stream, peer_addr, Arc::clone(&state)) => {}
                        () = shutdown.notified() => {
                            state.active_connections.fetch_sub(1, Ordering::SeqCst);
                            break;
                        }
                    }
                } else {
                    tokio::spawn(serve_connection(stream, peer_addr, Arc::clone(&state)));
                }
            }

            () = shutdown.notified() => break,
        }
    }

    if let Ok(addr) = listener.local_addr() {
        logger::log_server_stopped(&addr);
    }
    drop(listener);
    drain_connections(&state).await;
}

/// Wait for spawned connections to finish, up to [`DRAIN_TIMEOUT`]
async fn drain_connections(state: &AppState) {
    let deadline = tokio::time::Instant::now() + DRAIN_TIMEOUT;

    loop {
        let active = state.active_connections.load(Ordering::SeqCst);
        if active == 0 {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            logger::log_warning(&format!(
                "Shutting down with {active} connection(s) still open"
            ));
            return;
        }
        tokio::time::sleep(DRAIN_POLL).await;
    }
}
