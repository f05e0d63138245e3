/// Minimal User-Agent parser for browser and device classification.
///
/// Simple substring matching covers the browsers that matter for the
/// dashboard breakdowns; anything else reports as unparsed.
#[derive(Debug, Clone, Default)]
pub struct ParsedUserAgent {
    pub browser: Option<String>,
    pub device_type: Option<String>,
}

/// Parse a User-Agent string into browser and device components.
pub fn parse_user_agent(ua: &str) -> ParsedUserAgent {
    ParsedUserAgent {
        browser: detect_browser(ua),
        device_type: detect_device(ua),
    }
}

fn detect_browser(ua: &str) -> Option<String> {
    // Order matters: check more specific patterns first
    if ua.contains("Edg/") || ua.contains("Edge/") {
        Some("Edge".to_string())
    } else if ua.contains("OPR/") || ua.contains("Opera") {
        Some("Opera".to_string())
    } else if ua.contains("Chrome/") && !ua.contains("Chromium/") {
        Some("Chrome".to_string())
    } else if ua.contains("Safari/") && !ua.contains("Chrome/") {
        Some("Safari".to_string())
    } else if ua.contains("Firefox/") {
        Some("Firefox".to_string())
    } else {
        None
    }
}

fn detect_device(ua: &str) -> Option<String> {
    if ua.is_empty() {
        return None;
    }
    // iPads report "Mobile" in some configurations, so check tablets first
    if ua.contains("iPad") || (ua.contains("Android") && !ua.contains("Mobile")) {
        Some("tablet".to_string())
    } else if ua.contains("Mobile") || ua.contains("iPhone") || ua.contains("Android") {
        Some("mobile".to_string())
    } else {
        Some("desktop".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chrome_windows() {
        let ua = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.6099.130 Safari/537.36";
        let parsed = parse_user_agent(ua);
        assert_eq!(parsed.browser.as_deref(), Some("Chrome"));
        assert_eq!(parsed.device_type.as_deref(), Some("desktop"));
    }

    #[test]
    fn test_parse_firefox_linux() {
        let ua = "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";
        let parsed = parse_user_agent(ua);
        assert_eq!(parsed.browser.as_deref(), Some("Firefox"));
        assert_eq!(parsed.device_type.as_deref(), Some("desktop"));
    }

    #[test]
    fn test_parse_safari_macos() {
        let ua = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15";
        let parsed = parse_user_agent(ua);
        assert_eq!(parsed.browser.as_deref(), Some("Safari"));
    }

    #[test]
    fn test_parse_edge() {
        let ua = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.2210.91";
        let parsed = parse_user_agent(ua);
        assert_eq!(parsed.browser.as_deref(), Some("Edge"));
    }

    #[test]
    fn test_parse_android_phone() {
        let ua = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.6099.144 Mobile Safari/537.36";
        let parsed = parse_user_agent(ua);
        assert_eq!(parsed.browser.as_deref(), Some("Chrome"));
        assert_eq!(parsed.device_type.as_deref(), Some("mobile"));
    }

    #[test]
    fn test_parse_android_tablet() {
        let ua = "Mozilla/5.0 (Linux; Android 13; SM-X710) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
        let parsed = parse_user_agent(ua);
        assert_eq!(parsed.device_type.as_deref(), Some("tablet"));
    }

    #[test]
    fn test_parse_iphone() {
        let ua = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_2_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Mobile/15E148 Safari/604.1";
        let parsed = parse_user_agent(ua);
        assert_eq!(parsed.browser.as_deref(), Some("Safari"));
        assert_eq!(parsed.device_type.as_deref(), Some("mobile"));
    }

    #[test]
    fn test_parse_ipad() {
        let ua = "Mozilla/5.0 (iPad; CPU OS 17_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Mobile/15E148 Safari/604.1";
        let parsed = parse_user_agent(ua);
        assert_eq!(parsed.device_type.as_deref(), Some("tablet"));
    }

    #[test]
    fn test_parse_empty_ua() {
        let parsed = parse_user_agent("");
        assert!(parsed.browser.is_none());
        assert!(parsed.device_type.is_none());
    }

    #[test]
    fn test_parse_unknown_ua() {
        let parsed = parse_user_agent("SomeBot/1.0");
        assert!(parsed.browser.is_none());
        assert_eq!(parsed.device_type.as_deref(), Some("desktop"));
    }
}
