//! WebSocket client for the report hub.
//!
//! [`HubClient`] holds the hub address. Call [`HubClient::connect`] to
//! open the socket and complete the protocol handshake, yielding a live
//! [`HubConnection`].

use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream};

use crate::messages::{handshake_request, parse_handshake_response, split_records};

pub type HubStream = tokio_tungstenite::WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Address of one report hub.
#[derive(Debug, Clone)]
pub struct HubClient {
    hub_url: String,
}

/// A live, handshaken connection to the hub.
#[derive(Debug)]
pub struct HubConnection {
    /// The raw WebSocket stream for reading/writing frames.
    pub ws_stream: HubStream,
    /// Records that arrived in the same frame as the handshake reply.
    pub pending_records: Vec<String>,
}

impl HubClient {
    /// Build a client for the hub at `hub_path` on the service at
    /// `api_url`. `http`/`https` map to `ws`/`wss`.
    pub fn new(api_url: &str, hub_path: &str) -> Result<Self, HubClientError> {
        let base = api_url.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else if base.starts_with("ws://") || base.starts_with("wss://") {
            base.to_string()
        } else {
            return Err(HubClientError::Connection(format!(
                "Unsupported URL scheme in {api_url}"
            )));
        };

        let path = if hub_path.starts_with('/') {
            hub_path.to_string()
        } else {
            format!("/{hub_path}")
        };

        Ok(Self {
            hub_url: format!("{ws_base}{path}"),
        })
    }

    /// WebSocket URL of the hub, e.g. `wss://host:7232/reportHub`.
    pub fn hub_url(&self) -> &str {
        &self.hub_url
    }

    /// Open the socket and run the JSON protocol handshake.
    pub async fn connect(&self) -> Result<HubConnection, HubClientError> {
        let (mut ws_stream, _response) = connect_async(self.hub_url.as_str()).await.map_err(|e| {
            HubClientError::Connection(format!("Failed to connect to hub at {}: {e}", self.hub_url))
        })?;

        ws_stream
            .send(Message::Text(handshake_request()))
            .await
            .map_err(|e| HubClientError::Handshake(format!("Failed to send handshake: {e}")))?;

        let pending_records = loop {
            match ws_stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    let mut records = split_records(&text);
                    let reply = records.next().unwrap_or("{}");
                    parse_handshake_response(reply).map_err(HubClientError::Handshake)?;
                    break records.map(str::to_string).collect::<Vec<_>>();
                }
                Some(Ok(Message::Close(frame))) => {
                    return Err(HubClientError::Handshake(format!(
                        "Hub closed during handshake: {frame:?}"
                    )));
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    return Err(HubClientError::Protocol(format!(
                        "Receive error during handshake: {e}"
                    )));
                }
                None => {
                    return Err(HubClientError::Handshake(
                        "Hub stream ended during handshake".into(),
                    ));
                }
            }
        };

        tracing::info!(hub_url = %self.hub_url, "Connected to report hub");

        Ok(HubConnection {
            ws_stream,
            pending_records,
        })
    }
}

/// Errors that can occur when working with the hub client.
#[derive(Debug, thiserror::Error)]
pub enum HubClientError {
    /// Failed to establish the WebSocket connection.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The hub rejected or broke the protocol handshake.
    #[error("Handshake error: {0}")]
    Handshake(String),

    /// A protocol-level error on an already-established connection.
    #[error("Protocol error: {0}")]
    Protocol(String),
}
