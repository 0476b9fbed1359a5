// src/routing.rs
use percent_encoding::percent_decode_str;
use regex::Regex;

/// Reduces request paths to their leading segment for route matching.
///
/// `/path/to/file`, `/path` and `path/` all normalize to `path`, so only the
/// first segment decides whether a request is an upload.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    pattern: Regex,
}

impl PathMatcher {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(r"^/?([A-Za-z0-9_.\-]+)?/?")?,
        })
    }

    /// Leading path segment of `raw`, without leading or trailing slash.
    pub fn leading_segment(&self, raw: &str) -> String {
        let decoded = query_unescape(raw).unwrap_or_else(|| raw.to_string());

        self.pattern
            .captures(&decoded)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }

    pub fn matches(&self, raw: &str, segment: &str) -> bool {
        self.leading_segment(raw) == segment
    }
}

/// Query-style unescaping: `+` becomes a space and every `%` must start a
/// two digit hex escape, otherwise the input is rejected.
///
/// `percent_decode_str` passes malformed escapes through untouched, so the
/// strict check runs first.
fn query_unescape(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let malformed = bytes.iter().enumerate().any(|(i, &b)| {
        b == b'%'
            && !bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit))
    });
    if malformed {
        return None;
    }

    let spaced = raw.replace('+', " ");
    Some(percent_decode_str(&spaced).decode_utf8_lossy().into_owned())
}
