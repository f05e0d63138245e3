//! Page-view ingestion: payload validation, user-agent parsing, and the
//! `/track` endpoints (JSON POST and image-pixel GET).

pub mod handler;
pub mod useragent;
