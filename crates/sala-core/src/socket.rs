use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::channel::{MembershipConnection, MembershipConnector};
use crate::errors::SalaError;
use crate::protocol::{ClientMessage, ServerMessage};

/// WebSocket transport for the room membership service.
///
/// Exchanges JSON text frames in the service's event envelope. Unknown
/// or malformed frames are logged and skipped. A dropped connection
/// ends both pump tasks; the channel layer treats that as "no further
/// updates" and does not reconnect.
pub struct WebSocketConnector;

#[async_trait]
impl MembershipConnector for WebSocketConnector {
    async fn connect(&self, url: &str) -> Result<MembershipConnection, SalaError> {
        let parsed = url::Url::parse(url)
            .map_err(|e| SalaError::Channel(format!("service url '{url}': {e}")))?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(SalaError::Channel(format!(
                "service url scheme must be ws or wss, got '{}'",
                parsed.scheme()
            )));
        }

        tracing::info!("connecting to room service: {url}");
        let (ws, _) = connect_async(url)
            .await
            .map_err(|e| SalaError::Channel(format!("connect {url}: {e}")))?;
        let (mut write, mut read) = ws.split();

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ClientMessage>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<ServerMessage>();

        // outbound pump: serialize and send until the channel closes
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::warn!("failed to encode outbound message: {e}");
                        continue;
                    }
                };
                if let Err(e) = write.send(Message::Text(json)).await {
                    tracing::warn!("websocket send failed: {e}");
                    break;
                }
            }
            let _ = write.close().await;
            tracing::debug!("outbound pump ended");
        });

        // inbound pump: decode frames into membership messages
        tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ServerMessage>(&text) {
                        Ok(msg) => {
                            if in_tx.send(msg).is_err() {
                                break;
                            }
                        }
                        Err(e) => tracing::warn!("unrecognized room service frame: {e}"),
                    },
                    Ok(Message::Close(_)) => {
                        tracing::info!("room service closed the connection");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!("websocket receive failed: {e}");
                        break;
                    }
                }
            }
            tracing::debug!("inbound pump ended");
        });

        Ok(MembershipConnection {
            tx: out_tx,
            rx: in_rx,
        })
    }
}
