//! WebSocket connection to the relay

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Failed to encode or decode event: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Live relay connection split into event channels
pub struct RelayConnection {
    /// Events from the relay, in delivery order
    pub inbound: mpsc::UnboundedReceiver<ServerMsg>,
    /// Events to the relay
    pub outbound: mpsc::UnboundedSender<ClientMsg>,
    pub tasks: SocketTasks,
}

/// Read/write tasks pumping the socket
pub struct SocketTasks {
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl SocketTasks {
    /// Stop both socket tasks
    pub fn close(self) {
        self.reader.abort();
        self.writer.abort();
    }
}

/// Encode an outbound event as one text frame
pub fn encode(msg: &ClientMsg) -> Result<String, TransportError> {
    Ok(serde_json::to_string(msg)?)
}

/// Decode one inbound text frame
pub fn decode(text: &str) -> Result<ServerMsg, TransportError> {
    Ok(serde_json::from_str(text)?)
}

/// Connect to the relay and spawn the read/write tasks
pub async fn connect(url: &str) -> Result<RelayConnection, TransportError> {
    let (socket, _response) = tokio_tungstenite::connect_async(url).await?;
    info!(url = %url, "Connected to relay");

    let (mut ws_sink, mut ws_stream) = socket.split();
    let (inbound_tx, inbound) = mpsc::unbounded_channel::<ServerMsg>();
    let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<ClientMsg>();

    // Writer task: outbound events -> WebSocket
    let writer = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            let text = match encode(&msg) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "Failed to encode outbound event");
                    continue;
                }
            };
            if let Err(e) = ws_sink.send(Message::Text(text)).await {
                debug!(error = %e, "WebSocket send failed");
                break;
            }
        }
        let _ = ws_sink.close().await;
    });

    // Reader task: WebSocket -> inbound events
    let reader = tokio::spawn(async move {
        while let Some(result) = ws_stream.next().await {
            match result {
                Ok(Message::Text(text)) => match decode(&text) {
                    Ok(msg) => {
                        if inbound_tx.send(msg).is_err() {
                            debug!("Inbound channel closed");
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to parse relay event");
                    }
                },
                Ok(Message::Binary(_)) => {
                    warn!("Received binary message, ignoring");
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {}
                Ok(Message::Close(_)) => {
                    info!("Relay closed the connection");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "WebSocket error");
                    break;
                }
            }
        }
    });

    Ok(RelayConnection {
        inbound,
        outbound,
        tasks: SocketTasks { reader, writer },
    })
}
