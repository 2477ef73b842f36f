//! Terminal front-end for the report service.
//!
//! - [`config`]: environment-driven client configuration.
//! - [`router`]: the two navigable views.
//! - [`views`]: list and create-form view models plus table rendering.
//! - [`shell`]: the line-oriented terminal loop the binary runs.

pub mod config;
pub mod error;
pub mod router;
pub mod shell;
pub mod views;
