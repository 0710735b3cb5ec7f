//! Async client for tabular task results.
//!
//! A backend computes dataset reads asynchronously: an HTTP request returns
//! a task identifier, and the task's result — a sequence of uniform-shape
//! row records — is delivered over a WebSocket keyed by that identifier.
//! This crate is the client side of that contract:
//!
//! - [`TableClient`] requests a read of a named dataset and extracts the
//!   task identifier (with an HTTP polling fallback for the result).
//! - [`ResultListener`] subscribes to the task's result over a WebSocket,
//!   publishes the latest payload through a watch channel, and caches it
//!   by query identity in a [`ResultCache`].
//! - [`TableView`] renders delivered records as a header/body grid.
//! - [`TableSession`] composes the three for the common case.
//!
//! Payloads are validated at the decode boundary: the column set is derived
//! from the first row and every other row is checked against it. The cache
//! is bounded and context-scoped; a cached result is served only while the
//! backend still names the same task identifier for the request.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use gridstream::{EndpointConfig, TableSession};
//!
//! #[tokio::main]
//! async fn main() -> gridstream::Result<()> {
//!     let session = TableSession::new(EndpointConfig::default());
//!     session.open("user").await?;
//!
//!     let mut results = session.results();
//!     if results.changed().await.is_ok() {
//!         if let Some(view) = session.current_view() {
//!             print!("{view}");
//!         }
//!     }
//!
//!     session.close().await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod cache;
pub mod client;
pub mod error;
pub mod listener;
pub mod render;
pub mod session;
pub mod types;

pub use cache::ResultCache;
pub use client::{EndpointConfig, TableClient};
pub use error::{Error, Result};
pub use listener::ResultListener;
pub use render::TableView;
pub use session::TableSession;
pub use types::{QueryKey, ResultPayload, RowRecord, TableSchema, TaskId};
