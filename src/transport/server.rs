use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, instrument, warn};

use crate::config::{ServerConfig, TransportConfig};
use crate::core::size::warm_size_cache;
use crate::error::{ProtocolError, Result};
use crate::protocol::dispatcher::Dispatcher;
use crate::protocol::message::MessageType;
use crate::transport::connection::Connection;
use crate::utils::metrics::CodecMetrics;

/// Answer requests on one connection until the peer leaves.
///
/// Every request gets exactly one reply. A clean close or an idle timeout
/// ends the session with `Ok`; codec and handler errors end it with the error.
pub async fn serve_connection<S>(mut connection: Connection<S>, dispatcher: &Dispatcher) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let request = match connection.receive_frame().await {
            Ok(frame) => frame,
            Err(ProtocolError::ConnectionClosed) => return Ok(()),
            Err(ProtocolError::Timeout) => {
                debug!("Session idle, closing");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let reply = dispatcher.dispatch(&request)?;
        connection.send_frame(reply).await?;
    }
}

/// Accept matchmaking clients on `listener` until `shutdown_rx` fires.
#[instrument(skip_all, fields(address = %config.address))]
pub async fn start_server_with_shutdown(
    listener: TcpListener,
    dispatcher: Dispatcher,
    config: ServerConfig,
    transport: TransportConfig,
    metrics: Arc<CodecMetrics>,
    mut shutdown_rx: mpsc::Receiver<()>,
) -> Result<()> {
    if transport.warm_size_cache {
        let warmed = warm_size_cache(&MessageType::all_body_descriptors())?;
        debug!(warmed, "Size cache warmed");
    }
    info!("Listening for matchmaking clients");

    let active_connections = Arc::new(Mutex::new(0u32));

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                info!("Shutting down server. Waiting for connections to close...");

                let timeout = tokio::time::sleep(Duration::from_secs(10));
                tokio::pin!(timeout);

                loop {
                    tokio::select! {
                        _ = &mut timeout => {
                            warn!("Shutdown timeout reached, forcing exit");
                            break;
                        }
                        _ = tokio::time::sleep(Duration::from_millis(100)) => {
                            let connections = *active_connections.lock().await;
                            if connections == 0 {
                                info!("All connections closed, shutting down");
                                break;
                            }
                        }
                    }
                }

                return Ok(());
            }

            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer)) => {
                        info!(%peer, "New connection established");
                        if let Err(e) = stream.set_nodelay(true) {
                            warn!(%peer, error = %e, "Failed to disable Nagle");
                        }

                        let connection = Connection::server(stream, &config, &transport, Arc::clone(&metrics));
                        let dispatcher = dispatcher.clone();
                        let active_connections = Arc::clone(&active_connections);
                        *active_connections.lock().await += 1;

                        tokio::spawn(async move {
                            match serve_connection(connection, &dispatcher).await {
                                Ok(()) => {}
                                Err(e) if e.is_codec_error() => {
                                    warn!(%peer, error = %e, "Dropping peer after malformed message");
                                }
                                Err(e) => warn!(%peer, error = %e, "Session ended with error"),
                            }
                            *active_connections.lock().await -= 1;
                            info!(%peer, "Connection closed");
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "Error accepting connection");
                    }
                }
            }
        }
    }
}

/// Bind the configured address and serve until CTRL+C.
pub async fn start_server(dispatcher: Dispatcher, config: ServerConfig, transport: TransportConfig) -> Result<()> {
    let listener = TcpListener::bind(&config.address).await?;
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            info!("Received CTRL+C signal, shutting down");
            let _ = shutdown_tx.send(()).await;
        }
    });

    let metrics = Arc::new(CodecMetrics::new());
    let result = start_server_with_shutdown(listener, dispatcher, config, transport, Arc::clone(&metrics), shutdown_rx).await;
    metrics.log_metrics();
    result
}
