//! HTTP server loop.
//!
//! One spawned task per connection, served by hyper's auto (HTTP/1 + HTTP/2)
//! connection builder. On shutdown the listener stops accepting, every
//! connection is told to finish its in-flight requests, and the drain is
//! bounded by `shutdown_timeout_secs`.

use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::{debug, error, info};

use crate::app::AppState;
use crate::router::handle_request;
use crate::shutdown::ShutdownCoordinator;

/// Serve connections from `listener` until `shutdown` resolves, then drain
pub async fn serve<F>(state: Arc<AppState>, listener: TcpListener, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()>,
{
    let coordinator = ShutdownCoordinator::new(state.config.shutdown_timeout());
    info!(address = %listener.local_addr()?, "Mirror listening");

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, peer_addr)) => {
                        let state = Arc::clone(&state);
                        let guard = coordinator.track_connection();
                        let mut shutdown_rx = coordinator.subscribe();

                        tokio::spawn(async move {
                            serve_connection(stream, peer_addr, state, &mut shutdown_rx).await;
                            drop(guard);
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to accept connection");
                    }
                }
            }

            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping new connections");
                break;
            }
        }
    }

    coordinator.request_shutdown();
    if coordinator.wait_for_drain().await {
        info!("Shut down cleanly");
    }
    Ok(())
}

async fn serve_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    shutdown_rx: &mut broadcast::Receiver<()>,
) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!(peer = %peer_addr, error = %e, "Failed to set TCP_NODELAY");
    }

    let io = TokioIo::new(stream);
    let service = service_fn(move |req: Request<Incoming>| {
        let state = Arc::clone(&state);
        async move { Ok::<_, Infallible>(handle_request(state, req).await) }
    });

    let builder = auto::Builder::new(TokioExecutor::new());
    let conn = builder.serve_connection(io, service);
    tokio::pin!(conn);

    tokio::select! {
        result = conn.as_mut() => {
            if let Err(e) = result {
                debug!(peer = %peer_addr, error = %e, "Connection error");
            }
        }
        _ = shutdown_rx.recv() => {
            debug!(peer = %peer_addr, "Closing connection for shutdown");
            conn.as_mut().graceful_shutdown();
            if let Err(e) = conn.await {
                debug!(peer = %peer_addr, error = %e, "Connection error during shutdown");
            }
        }
    }
}
