//! Client-side buffer for Nextflow weblog events.
//!
//! The websocket ingestion task ([`ingest`]) decodes raw payloads and
//! appends them to an in-memory append-only log owned by a dedicated actor
//! ([`actors::weblog_store`]). Consumers read through point-in-time
//! snapshots and the pure query helpers in [`query`].

pub mod actors;
pub mod config;
pub mod ingest;
pub mod query;

pub use actors::weblog_store::{StoreUnavailable, WeblogLog, WeblogStoreMsg};
pub use config::Config;
