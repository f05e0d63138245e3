//! Prioritized, loss-tolerant event delivery.
//!
//! The browser offers three ways to get an event off the page: sendBeacon,
//! an image pixel, and fetch with keepalive. Each can silently fail in a
//! different environment (page unload, ad blockers, service workers), so
//! delivery layers them rather than trusting any one.
//!
//! The embedding snippet is responsible for collection timing (waiting
//! ~100 ms after the load event before calling [`deliver`]); this module
//! only runs the transport sequence.

use serde::{Deserialize, Serialize};
use url::Url;

/// Load times outside this range are dropped before sending.
const MAX_PLAUSIBLE_LOAD_TIME_MS: i64 = 60_000;

/// One page-view event as the tracker sends it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedPageView {
    pub site_id: String,
    pub page_url: String,
    pub page_title: Option<String>,
    pub referrer: Option<String>,
    pub screen_width: Option<i32>,
    pub screen_height: Option<i32>,
    pub fingerprint: String,
    pub load_time: Option<i64>,
}

impl TrackedPageView {
    /// Drop a load time that is negative or implausibly large; clock
    /// adjustments mid-load produce both.
    pub fn with_plausible_load_time(mut self) -> Self {
        self.load_time = self
            .load_time
            .filter(|&ms| (0..=MAX_PLAUSIBLE_LOAD_TIME_MS).contains(&ms));
        self
    }
}

/// A transport attempt that did not get the event out.
#[derive(Debug, Clone)]
pub struct TransportError(pub String);

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "transport failed: {}", self.0)
    }
}

impl std::error::Error for TransportError {}

/// The browser delivery mechanisms, supplied by the embedder.
pub trait Transport {
    /// navigator.sendBeacon: fire-and-forget POST. The returned bool is
    /// queue acceptance, not delivery.
    fn send_beacon(&mut self, endpoint: &str, event: &TrackedPageView) -> bool;

    /// Image pixel: GET with the event URL-encoded as query parameters.
    fn send_pixel(&mut self, pixel_url: &str) -> Result<(), TransportError>;

    /// fetch with keepalive, no credentials, no cache.
    fn send_fetch(&mut self, endpoint: &str, event: &TrackedPageView) -> Result<(), TransportError>;
}

/// Which transports fired for one event. Purely informational; delivery
/// never reports an error to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delivery {
    pub beacon_accepted: bool,
    pub pixel_sent: bool,
    pub fetch_sent: bool,
}

/// Build the pixel GET URL for an event. Absent optional fields are
/// omitted rather than sent empty.
pub fn pixel_url(endpoint: &str, event: &TrackedPageView) -> Result<String, url::ParseError> {
    let mut url = Url::parse(endpoint)?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("site_id", &event.site_id);
        pairs.append_pair("page_url", &event.page_url);
        if let Some(title) = &event.page_title {
            pairs.append_pair("page_title", title);
        }
        if let Some(referrer) = &event.referrer {
            pairs.append_pair("referrer", referrer);
        }
        if let Some(w) = event.screen_width {
            pairs.append_pair("screen_width", &w.to_string());
        }
        if let Some(h) = event.screen_height {
            pairs.append_pair("screen_height", &h.to_string());
        }
        pairs.append_pair("fingerprint", &event.fingerprint);
        if let Some(ms) = event.load_time {
            pairs.append_pair("load_time", &ms.to_string());
        }
    }
    Ok(url.into())
}

/// Run the transport sequence for one event.
///
/// Beacon goes first as a best-effort optimization. The pixel is then
/// attempted regardless of the beacon outcome, since a beacon "accepted"
/// can be a false positive under service-worker interception while the
/// pixel GET bypasses workers entirely. Fetch runs only when the pixel
/// attempt itself failed. Every failure is swallowed; the report says
/// which transports fired.
pub fn deliver(
    transport: &mut dyn Transport,
    endpoint: &str,
    event: &TrackedPageView,
) -> Delivery {
    let event = event.clone().with_plausible_load_time();

    let beacon_accepted = transport.send_beacon(endpoint, &event);

    let pixel_sent = match pixel_url(endpoint, &event) {
        Ok(url) => match transport.send_pixel(&url) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "pixel transport failed");
                false
            }
        },
        Err(e) => {
            tracing::debug!(error = %e, "pixel url construction failed");
            false
        }
    };

    let fetch_sent = if pixel_sent {
        false
    } else {
        match transport.send_fetch(endpoint, &event) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "fetch transport failed");
                false
            }
        }
    };

    Delivery {
        beacon_accepted,
        pixel_sent,
        fetch_sent,
    }
}
