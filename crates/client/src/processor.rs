//! Hub message processing loop.
//!
//! Reads frames from a hub connection, splits them into records, turns
//! `ReceiveUpdate` invocations into registry merges and keeps the
//! connection alive with periodic pings.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::client::HubConnection;
use crate::messages::{decode_job_update, parse_message, ping_record, split_records, HubMessage};
use crate::reconciler::MergeHandle;

/// How often the client pings the hub. The hub drops clients it has not
/// heard from in 30 seconds.
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The cancellation token fired.
    Cancelled,
    /// The reconciler is gone; nothing left to feed.
    MergesClosed,
    /// The hub sent a close record or frame, or the stream ended.
    Closed { reason: Option<String> },
    /// A receive or send error broke the socket.
    Failed(String),
}

enum RecordAction {
    Continue,
    End(SessionEnd),
}

/// Process hub traffic until the connection ends or `cancel` fires.
pub async fn process_messages(
    connection: HubConnection,
    merges: &MergeHandle,
    keep_alive: Duration,
    cancel: &CancellationToken,
) -> SessionEnd {
    let HubConnection {
        ws_stream,
        pending_records,
    } = connection;
    let (mut sink, mut stream) = ws_stream.split();

    for record in &pending_records {
        if let RecordAction::End(end) = handle_record(record, merges).await {
            return end;
        }
    }

    let mut ping = tokio::time::interval_at(tokio::time::Instant::now() + keep_alive, keep_alive);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                return SessionEnd::Cancelled;
            }
            _ = ping.tick() => {
                if let Err(e) = sink.send(Message::Text(ping_record())).await {
                    tracing::warn!(error = %e, "Failed to send hub keep-alive");
                    return SessionEnd::Failed(e.to_string());
                }
            }
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    for record in split_records(&text) {
                        if let RecordAction::End(end) = handle_record(record, merges).await {
                            return end;
                        }
                    }
                }
                Some(Ok(Message::Binary(_))) => {
                    tracing::trace!("Ignoring binary hub frame");
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                    // Handled automatically by tungstenite.
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!(?frame, "Report hub WebSocket closed");
                    return SessionEnd::Closed { reason: frame.map(|f| f.reason.to_string()) };
                }
                Some(Ok(Message::Frame(_))) => {}
                Some(Err(e)) => {
                    tracing::error!(error = %e, "Hub receive error");
                    return SessionEnd::Failed(e.to_string());
                }
                None => return SessionEnd::Closed { reason: None },
            },
        }
    }
}

/// Dispatch a single record.
async fn handle_record(record: &str, merges: &MergeHandle) -> RecordAction {
    let message = match parse_message(record) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(error = %e, raw_message = %record, "Failed to parse hub message");
            return RecordAction::Continue;
        }
    };

    if let Some(decoded) = decode_job_update(&message) {
        return match decoded {
            Ok(job) => {
                tracing::debug!(job_id = %job.id, status = ?job.status, "Job update received");
                if merges.apply_update(job).await {
                    RecordAction::Continue
                } else {
                    RecordAction::End(SessionEnd::MergesClosed)
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, raw_message = %record, "Undecodable job update");
                RecordAction::Continue
            }
        };
    }

    match message {
        HubMessage::Close { error, allow_reconnect } => {
            tracing::info!(?error, allow_reconnect, "Hub sent close");
            RecordAction::End(SessionEnd::Closed { reason: error })
        }
        HubMessage::Ping => RecordAction::Continue,
        HubMessage::Invocation { target, .. } => {
            tracing::debug!(target = %target, "Ignoring hub invocation");
            RecordAction::Continue
        }
        HubMessage::Other { kind } => {
            tracing::trace!(kind, "Ignoring hub message");
            RecordAction::Continue
        }
    }
}
