//! WebSocket accept loop and per-connection plumbing.
//!
//! Each connection gets an unbounded outbound channel; a writer task drains
//! it onto the socket while the reader loop feeds frames to the router.
//! When either side closes, the connection's registry entry is removed.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use uuid::Uuid;

use craftpilot_core::error::{CraftError, Result};
use craftpilot_core::OutboundMessage;

use crate::router::MessageRouter;

/// Bind the gateway listener and accept connections until shutdown.
pub async fn start_gateway(port: u16, router: Arc<MessageRouter>) -> Result<()> {
    let addr = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| CraftError::Gateway(format!("Failed to bind {}: {}", addr, e)))?;
    info!("Gateway listening on ws://{}", addr);

    loop {
        let (stream, peer) = listener
            .accept()
            .await
            .map_err(|e| CraftError::Gateway(format!("Accept failed: {}", e)))?;
        debug!(%peer, "Incoming connection");

        let router = router.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, router).await {
                debug!(%peer, error = %e, "Connection ended with error");
            }
        });
    }
}

async fn handle_connection(stream: TcpStream, router: Arc<MessageRouter>) -> Result<()> {
    let ws = tokio_tungstenite::accept_async(stream)
        .await
        .map_err(|e| CraftError::Gateway(format!("Handshake failed: {}", e)))?;

    let connection_id = Uuid::new_v4();
    debug!(%connection_id, "Connection established");

    let (mut ws_tx, mut ws_rx) = ws.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<OutboundMessage>();

    // Writer: serialize outbound messages onto the socket until the channel
    // or the socket closes.
    let writer = tokio::spawn(async move {
        while let Some(message) = out_rx.recv().await {
            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "Skipping unserializable outbound message");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = ws_rx.next().await {
        match frame {
            Ok(Message::Text(text)) => router.route_text(connection_id, text.as_ref(), &out_tx),
            Ok(Message::Close(_)) => break,
            // Pings are answered by tungstenite; binary frames are not part
            // of the protocol.
            Ok(_) => {}
            Err(e) => {
                debug!(%connection_id, error = %e, "Read error, closing");
                break;
            }
        }
    }

    router.disconnected(connection_id);
    writer.abort();
    debug!(%connection_id, "Connection closed");
    Ok(())
}
