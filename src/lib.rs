//! Swiftlet: self-hosted web analytics.
//!
//! Two halves share this crate. The `tracker` module is the client core:
//! browser-signal fingerprinting and the resilient delivery transport
//! sequence, with browser facilities behind traits so both are testable
//! without a browser. Everything else is the server: an axum ingestion
//! endpoint that appends one row per page view to a DuckDB log, and the
//! aggregation queries the dashboard reads from it.

pub mod api;
pub mod config;
pub mod ingest;
pub mod query;
pub mod server;
pub mod storage;
pub mod tracker;
