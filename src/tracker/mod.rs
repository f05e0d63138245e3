//! Rust model of the browser tracking client: fingerprint generation from
//! browser signals and the prioritized event delivery sequence.
//!
//! Browser facilities (durable storage, the beacon/pixel/fetch transports)
//! are traits so embedders plug in real implementations while tests run
//! deterministically.

pub mod delivery;
pub mod fingerprint;
