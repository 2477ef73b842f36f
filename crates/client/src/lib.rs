//! Report service client library.
//!
//! Provides the REST API wrapper, the hub WebSocket client with typed
//! message parsing and reconnection, and the two update sources (poll and
//! push) that feed one reconciler owning the job registry.

pub mod api;
pub mod client;
pub mod events;
pub mod feed;
pub mod messages;
pub mod poll;
pub mod processor;
pub mod push;
pub mod reconciler;
pub mod reconnect;

pub use api::{ReportApi, ReportApiError, ReportService};
pub use events::{ConnectionStatus, LoadState};
pub use feed::{FeedSettings, JobFeed};
