//! WebSocket accept loop and per-connection session driver.
//!
//! Each accepted connection gets its own task: the WebSocket handshake,
//! a writer task draining the connection's outbound queue, and a read
//! loop feeding inbound text frames to the protocol dispatch. When the
//! loop ends, for any reason, the connection is unregistered and every
//! call it participated in is torn down.

use crate::error::Result;
use crate::server::SignalRelay;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message as WsMessage};

/// Bind the listener and accept connections until the task is dropped.
///
/// Each accepted connection is handed to its own task so one slow
/// client never blocks the rest.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound.
pub async fn run_server(relay: Arc<SignalRelay>) -> Result<()> {
    let bind_address = relay.config().server.bind_address.clone();
    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!("Signaling relay listening on {bind_address}");

    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                let relay = relay.clone();
                tokio::spawn(async move {
                    handle_connection(relay, stream, peer_addr).await;
                });
            }
            Err(e) => {
                // Transient accept failure; keep serving.
                tracing::error!("Accept error: {e}");
            }
        }
    }
}

/// Run one session and log how it ended.
async fn handle_connection(relay: Arc<SignalRelay>, stream: TcpStream, peer_addr: SocketAddr) {
    match run_session(relay, stream, peer_addr).await {
        Ok(()) => tracing::debug!("Session {peer_addr} closed"),
        Err(e) => tracing::debug!("Session {peer_addr} ended with error: {e}"),
    }
}

/// Complete lifecycle of a single client connection.
async fn run_session(
    relay: Arc<SignalRelay>,
    stream: TcpStream,
    peer_addr: SocketAddr,
) -> Result<()> {
    let ws_stream = accept_async(stream).await?;
    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let conn = relay.register_connection(tx);
    tracing::info!("New client {conn} connected from {peer_addr}");

    // Writer: drains the outbound queue into WebSocket text frames.
    // Ends when the connection is unregistered (sender dropped) or the
    // socket rejects a write.
    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if ws_tx.send(WsMessage::Text(frame)).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    // Reader: one frame at a time, preserving per-connection order.
    while let Some(frame) = ws_rx.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => relay.handle_text(conn, &text),
            Ok(WsMessage::Binary(_)) => {
                // The protocol is JSON text only.
                tracing::warn!("Ignoring binary frame from {conn}");
            }
            Ok(WsMessage::Ping(_)) | Ok(WsMessage::Pong(_)) => {
                // Transport-level liveness; tungstenite answers pings
                // on its own. Not to be confused with the protocol's
                // own ping broadcast.
            }
            Ok(WsMessage::Close(_)) => break,
            Ok(WsMessage::Frame(_)) => {}
            Err(e) => {
                tracing::debug!("Connection error on {conn}: {e}");
                break;
            }
        }
    }

    // Close, error, or EOF: same teardown either way.
    relay.unregister_connection(conn);
    drop(writer);

    Ok(())
}
