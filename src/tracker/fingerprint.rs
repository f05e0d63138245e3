//! Visitor fingerprinting from ambient browser signals.
//!
//! The token format and hash are bit-for-bit compatible with the original
//! JavaScript snippet, so a Rust embedder and the JS tracker produce the
//! same hash for the same signal string.

/// Ambient browser signals, in the fixed order they are hashed.
///
/// Optional numeric capabilities render as "unknown" when the browser does
/// not expose them; a blocked canvas simply contributes nothing.
#[derive(Debug, Clone)]
pub struct BrowserSignals {
    pub user_agent: String,
    pub language: String,
    pub screen_width: u32,
    pub screen_height: u32,
    pub color_depth: u32,
    pub timezone_offset: i32,
    pub session_storage: bool,
    pub local_storage: bool,
    pub platform: String,
    pub hardware_concurrency: Option<u32>,
    pub device_memory: Option<u32>,
    pub canvas_data: Option<String>,
}

impl BrowserSignals {
    /// Join the signals into the canonical `|`-separated string that gets
    /// hashed. Order is part of the wire contract.
    pub fn joined(&self) -> String {
        let mut parts = vec![
            self.user_agent.clone(),
            self.language.clone(),
            format!("{}x{}", self.screen_width, self.screen_height),
            self.color_depth.to_string(),
            self.timezone_offset.to_string(),
            self.session_storage.to_string(),
            self.local_storage.to_string(),
            self.platform.clone(),
            self.hardware_concurrency
                .map_or_else(|| "unknown".to_string(), |n| n.to_string()),
            self.device_memory
                .map_or_else(|| "unknown".to_string(), |n| n.to_string()),
        ];
        if let Some(canvas) = &self.canvas_data {
            parts.push(canvas.clone());
        }
        parts.join("|")
    }
}

/// The JS rolling hash `h = (h << 5) - h + c` over UTF-16 code units,
/// with 32-bit overflow wrapping.
pub fn signal_hash(s: &str) -> u32 {
    let mut h: i32 = 0;
    for unit in s.encode_utf16() {
        h = h.wrapping_shl(5).wrapping_sub(h).wrapping_add(i32::from(unit));
    }
    h.unsigned_abs()
}

/// Lowercase base-36, matching JS `Number.toString(36)`.
pub fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while n > 0 {
        buf.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    buf.reverse();
    // Digits are always ASCII
    String::from_utf8_lossy(&buf).into_owned()
}

/// Generate a fresh fingerprint token: `fp_<hash36>_<millis36>`.
///
/// The creation-time suffix keeps two devices with identical signals from
/// colliding. `now_millis` is passed in so generation stays deterministic
/// under test.
pub fn generate(signals: &BrowserSignals, now_millis: u64) -> String {
    let hash = signal_hash(&signals.joined());
    format!("fp_{}_{}", to_base36(u64::from(hash)), to_base36(now_millis))
}

/// Durable client-side storage for the fingerprint token.
///
/// Browsers back this with localStorage; privacy modes make every call
/// fallible.
pub trait FingerprintStore {
    fn load(&self) -> Option<String>;
    /// Persist the token. Failure is tolerated by callers.
    fn store(&mut self, token: &str) -> Result<(), StoreError>;
}

/// A storage failure. Carries no detail; the caller's only move is to
/// continue without persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError;

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fingerprint store unavailable")
    }
}

impl std::error::Error for StoreError {}

/// Return the stored token, or generate, best-effort persist, and return a
/// fresh one.
///
/// A failing store degrades to a fresh non-persisted token: visitor
/// continuity is lost but tracking continues.
pub fn acquire(
    store: &mut dyn FingerprintStore,
    signals: &BrowserSignals,
    now_millis: u64,
) -> String {
    if let Some(existing) = store.load() {
        return existing;
    }
    let token = generate(signals, now_millis);
    if let Err(e) = store.store(&token) {
        tracing::debug!(error = %e, "fingerprint not persisted");
    }
    token
}

/// In-memory store for tests and non-browser embedders.
#[derive(Debug, Default)]
pub struct MemoryStore {
    token: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FingerprintStore for MemoryStore {
    fn load(&self) -> Option<String> {
        self.token.clone()
    }

    fn store(&mut self, token: &str) -> Result<(), StoreError> {
        self.token = Some(token.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals() -> BrowserSignals {
        BrowserSignals {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) Firefox/121.0".to_string(),
            language: "en-US".to_string(),
            screen_width: 1920,
            screen_height: 1080,
            color_depth: 24,
            timezone_offset: -60,
            session_storage: true,
            local_storage: true,
            platform: "Linux x86_64".to_string(),
            hardware_concurrency: Some(8),
            device_memory: None,
            canvas_data: None,
        }
    }

    #[test]
    fn test_joined_order_and_sentinels() {
        let joined = signals().joined();
        assert_eq!(
            joined,
            "Mozilla/5.0 (X11; Linux x86_64) Firefox/121.0|en-US|1920x1080|24|-60|true|true|Linux x86_64|8|unknown"
        );
    }

    #[test]
    fn test_joined_appends_canvas_when_present() {
        let mut s = signals();
        s.canvas_data = Some("data:image/png;base64,AAAA".to_string());
        assert!(s.joined().ends_with("|data:image/png;base64,AAAA"));
    }

    // Vectors computed with the original JS: `h = (h << 5) - h + c` over
    // charCodeAt, then Math.abs(h).toString(36).
    #[test]
    fn test_signal_hash_js_vectors() {
        assert_eq!(signal_hash(""), 0);
        assert_eq!(signal_hash("a"), 97);
        assert_eq!(signal_hash("abc"), 96354);
        assert_eq!(signal_hash("hello world"), 1794106052);
    }

    #[test]
    fn test_signal_hash_wraps_like_js() {
        // Long input overflows i32 repeatedly; must stay deterministic
        let long = "x".repeat(10_000);
        assert_eq!(signal_hash(&long), signal_hash(&long));
    }

    #[test]
    fn test_signal_hash_utf16_units() {
        // '𝄞' is the surrogate pair 0xD834 0xDD1E; both units are hashed:
        // 31 * 0xD834 + 0xDD1E
        assert_eq!(signal_hash("𝄞"), 1_772_394);
    }

    #[test]
    fn test_base36_matches_js() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_794_106_052), "to5x38");
    }

    #[test]
    fn test_generate_token_format() {
        let token = generate(&signals(), 1_700_000_000_000);
        assert!(token.starts_with("fp_"));
        let parts: Vec<&str> = token.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2], to_base36(1_700_000_000_000));
    }

    #[test]
    fn test_same_signals_same_hash_prefix() {
        let a = generate(&signals(), 1000);
        let b = generate(&signals(), 2000);
        let prefix = |t: &str| t.rsplit_once('_').map(|(p, _)| p.to_string());
        assert_eq!(prefix(&a), prefix(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_acquire_prefers_stored_token() {
        let mut store = MemoryStore::new();
        store.store("fp_existing_1").unwrap();
        let token = acquire(&mut store, &signals(), 1000);
        assert_eq!(token, "fp_existing_1");
    }

    #[test]
    fn test_acquire_persists_fresh_token() {
        let mut store = MemoryStore::new();
        let token = acquire(&mut store, &signals(), 1000);
        assert_eq!(store.load().as_deref(), Some(token.as_str()));
    }

    #[test]
    fn test_acquire_survives_failing_store() {
        struct BrokenStore;
        impl FingerprintStore for BrokenStore {
            fn load(&self) -> Option<String> {
                None
            }
            fn store(&mut self, _token: &str) -> Result<(), StoreError> {
                Err(StoreError)
            }
        }

        let token = acquire(&mut BrokenStore, &signals(), 1000);
        assert!(token.starts_with("fp_"));
    }
}
