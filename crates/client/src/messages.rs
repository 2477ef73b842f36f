//! Report hub message types and parser.
//!
//! The hub speaks the JSON hub protocol (version 1): every record is a
//! JSON object terminated by the `0x1E` record separator, and one
//! WebSocket text frame may carry several records. The numeric `type`
//! field selects the message kind. Only the kinds this client acts on are
//! modelled; anything else is surfaced as [`HubMessage::Other`].

use reportdesk_core::ReportJob;
use serde::Deserialize;

/// Terminates every hub protocol record.
pub const RECORD_SEPARATOR: char = '\u{1e}';

/// Hub method the service invokes once per job status change.
pub const RECEIVE_UPDATE_TARGET: &str = "ReceiveUpdate";

const TYPE_INVOCATION: u8 = 1;
const TYPE_PING: u8 = 6;
const TYPE_CLOSE: u8 = 7;

/// A decoded hub record.
#[derive(Debug, Clone, PartialEq)]
pub enum HubMessage {
    /// The server invoked a client method.
    Invocation {
        target: String,
        arguments: Vec<serde_json::Value>,
    },

    /// Keep-alive from the server.
    Ping,

    /// The server is closing the connection.
    Close {
        /// Reason supplied by the server, if any.
        error: Option<String>,
        allow_reconnect: bool,
    },

    /// A valid record of a kind this client ignores (stream items,
    /// completions, acks, ...).
    Other { kind: u8 },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHubMessage {
    #[serde(rename = "type")]
    kind: u8,
    target: Option<String>,
    #[serde(default)]
    arguments: Vec<serde_json::Value>,
    error: Option<String>,
    #[serde(default)]
    allow_reconnect: bool,
}

/// Reply to the client's handshake request.
#[derive(Debug, Deserialize)]
struct HandshakeResponse {
    error: Option<String>,
}

/// The handshake record sent right after the socket opens.
pub fn handshake_request() -> String {
    format!(r#"{{"protocol":"json","version":1}}{RECORD_SEPARATOR}"#)
}

/// Client keep-alive record.
pub fn ping_record() -> String {
    format!(r#"{{"type":{TYPE_PING}}}{RECORD_SEPARATOR}"#)
}

/// Split a text frame into its non-empty records.
pub fn split_records(frame: &str) -> impl Iterator<Item = &str> {
    frame
        .split(RECORD_SEPARATOR)
        .filter(|record| !record.trim().is_empty())
}

/// Check the server's handshake reply. `Err` carries the server's reason.
pub fn parse_handshake_response(record: &str) -> Result<(), String> {
    let response: HandshakeResponse =
        serde_json::from_str(record).map_err(|e| format!("malformed handshake response: {e}"))?;
    match response.error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

/// Parse one hub record (without its separator).
///
/// Returns `Err` for malformed JSON or a record with no `type`.
/// Callers should log and continue.
pub fn parse_message(record: &str) -> Result<HubMessage, serde_json::Error> {
    let raw: RawHubMessage = serde_json::from_str(record)?;
    Ok(match raw.kind {
        TYPE_INVOCATION => HubMessage::Invocation {
            target: raw.target.unwrap_or_default(),
            arguments: raw.arguments,
        },
        TYPE_PING => HubMessage::Ping,
        TYPE_CLOSE => HubMessage::Close {
            error: raw.error,
            allow_reconnect: raw.allow_reconnect,
        },
        kind => HubMessage::Other { kind },
    })
}

/// Extract the job carried by a `ReceiveUpdate` invocation.
///
/// Returns `None` for any other message, and `Some(Err)` when the
/// invocation is a job update whose payload does not decode.
pub fn decode_job_update(message: &HubMessage) -> Option<Result<ReportJob, serde_json::Error>> {
    match message {
        HubMessage::Invocation { target, arguments }
            if target.eq_ignore_ascii_case(RECEIVE_UPDATE_TARGET) =>
        {
            let payload = arguments.first().cloned().unwrap_or(serde_json::Value::Null);
            Some(serde_json::from_value(payload))
        }
        _ => None,
    }
}
