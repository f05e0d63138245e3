//! Dashboard API: account context extraction, stats handlers, and the
//! shared error type.

pub mod context;
pub mod errors;
pub mod stats;
