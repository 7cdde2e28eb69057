//! URL canonicalization
//!
//! Structural, rule-agnostic normalization applied before rule matching:
//! scheme and host lower-casing, default port removal, dot-segment
//! resolution, percent-escape normalization and (for signing) a
//! deterministic query order.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use url::form_urlencoded;
use url::Url;

/// Error type for URL normalization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("empty URL")]
    Empty,
    #[error("invalid URL: {0}")]
    Parse(#[from] url::ParseError),
    #[error("URL has no host")]
    MissingHost,
}

// =============================================================================
// Normalization
// =============================================================================

/// Normalize a URL for signing: structural normalization plus a stable
/// query order.
pub fn normalize(raw: &str) -> Result<String, NormalizeError> {
    Ok(normalize_url(raw, true)?.into())
}

/// Structural normalization only; the query keeps its original order.
pub fn normalize_structure(raw: &str) -> Result<String, NormalizeError> {
    Ok(normalize_url(raw, false)?.into())
}

/// Normalize and return the parsed URL.
pub fn normalize_url(raw: &str, sort_query: bool) -> Result<Url, NormalizeError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(NormalizeError::Empty);
    }

    // Scheme/host lower-casing, default ports and dot segments are handled
    // by the WHATWG parser.
    let mut url = Url::parse(raw)?;
    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(NormalizeError::MissingHost),
    }

    if let Some(path) = owned(normalize_escapes(url.path())) {
        url.set_path(&path);
    }

    let query = url.query().map(|q| {
        if sort_query {
            sort_query_pairs(q)
        } else {
            normalize_escapes(q).into_owned()
        }
    });
    match query {
        Some(q) if !q.is_empty() => url.set_query(Some(&q)),
        _ => url.set_query(None),
    }

    if let Some(fragment) = url.fragment().and_then(|f| owned(normalize_escapes(f))) {
        url.set_fragment(Some(&fragment));
    }

    Ok(url)
}

/// Stable-sort query pairs by key. Values for a repeated key keep their
/// relative order. The form encoder escapes `~`, so escapes are normalized
/// again afterwards.
fn sort_query_pairs(query: &str) -> String {
    let mut pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in &pairs {
        serializer.append_pair(key, value);
    }
    let encoded = serializer.finish();
    owned(normalize_escapes(&encoded)).unwrap_or(encoded)
}

#[inline]
fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

#[inline]
fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Decode escapes of unreserved characters and upper-case the hex digits
/// of every escape that remains. Borrows when nothing changes.
pub fn normalize_escapes(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    if !bytes.contains(&b'%') {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut changed = false;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                let decoded = hi << 4 | lo;
                if is_unreserved(decoded) {
                    out.push(decoded as char);
                    changed = true;
                } else {
                    let upper = [b'%', bytes[i + 1].to_ascii_uppercase(), bytes[i + 2].to_ascii_uppercase()];
                    changed |= upper[1] != bytes[i + 1] || upper[2] != bytes[i + 2];
                    out.push('%');
                    out.push(upper[1] as char);
                    out.push(upper[2] as char);
                }
                i += 3;
                continue;
            }
        }
        // Copy the whole UTF-8 sequence starting here.
        let ch_len = utf8_len(bytes[i]);
        out.push_str(&s[i..i + ch_len]);
        i += ch_len;
    }

    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(s)
    }
}

/// The new value if `normalize_escapes` changed anything.
#[inline]
fn owned(value: Cow<'_, str>) -> Option<String> {
    match value {
        Cow::Owned(s) => Some(s),
        Cow::Borrowed(_) => None,
    }
}

#[inline]
fn utf8_len(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        _ => 4,
    }
}

// =============================================================================
// Component Access
// =============================================================================

/// Percent-decoded path, the form rule patterns are matched against.
pub fn decoded_path(url: &Url) -> Cow<'_, str> {
    percent_decode_str(url.path()).decode_utf8_lossy()
}

/// First non-empty value of a query parameter.
pub fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, v)| k == key && !v.is_empty())
        .map(|(_, v)| v.into_owned())
}

/// Label-aligned domain suffix test: `sub.example.com` is within
/// `example.com`, `notexample.com` is not.
pub fn host_in_domain(host: &str, domain: &str) -> bool {
    let host = host.trim_end_matches('.');
    let domain = domain.trim_end_matches('.');
    if domain.is_empty() || host.len() < domain.len() {
        return false;
    }

    let split = host.len() - domain.len();
    if !host.is_char_boundary(split) || !host[split..].eq_ignore_ascii_case(domain) {
        return false;
    }
    split == 0 || host.as_bytes()[split - 1] == b'.'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_scheme_and_host() {
        assert_eq!(normalize("HTTPS://Example.COM/Path").unwrap(), "https://example.com/Path");
    }

    #[test]
    fn test_remove_default_port() {
        assert_eq!(normalize("https://example.com:443/a").unwrap(), "https://example.com/a");
        assert_eq!(normalize("http://example.com:80/a").unwrap(), "http://example.com/a");
        assert_eq!(normalize("http://example.com:8080/a").unwrap(), "http://example.com:8080/a");
    }

    #[test]
    fn test_remove_dot_segments() {
        assert_eq!(normalize("http://host/path/./a/b/../c").unwrap(), "http://host/path/a/c");
    }

    #[test]
    fn test_sort_query_params() {
        assert_eq!(
            normalize("http://host/path?c=3&b=2&a=1&b=1").unwrap(),
            "http://host/path?a=1&b=2&b=1&c=3"
        );
        assert_eq!(
            normalize_structure("http://host/path?c=3&b=2&a=1").unwrap(),
            "http://host/path?c=3&b=2&a=1"
        );
    }

    #[test]
    fn test_sorted_query_keeps_unreserved_decoded() {
        assert_eq!(normalize("http://h.test/p?b=1&a=~x").unwrap(), "http://h.test/p?a=~x&b=1");
        assert_eq!(normalize("http://h.test/p?a=%7Ex&b=1").unwrap(), "http://h.test/p?a=~x&b=1");
        assert_eq!(normalize("http://h.test/p?q=a%2Fb").unwrap(), "http://h.test/p?q=a%2Fb");
    }

    #[test]
    fn test_remove_empty_query() {
        assert_eq!(normalize("https://example.com/a?").unwrap(), "https://example.com/a");
        assert_eq!(normalize_structure("https://example.com/a?").unwrap(), "https://example.com/a");
    }

    #[test]
    fn test_decode_unreserved_escapes() {
        assert_eq!(normalize("https://example.com/%7Euser/%41b").unwrap(), "https://example.com/~user/Ab");
        assert_eq!(normalize("https://example.com/a%2fb").unwrap(), "https://example.com/a%2Fb");
        assert_eq!(normalize_escapes("a%2Fb"), Cow::Borrowed("a%2Fb"));
    }

    #[test]
    fn test_normalize_escapes_handles_truncated_and_utf8() {
        assert_eq!(normalize_escapes("100%"), "100%");
        assert_eq!(normalize_escapes("%4"), "%4");
        assert_eq!(normalize_escapes("ä%2d"), "ä-");
    }

    #[test]
    fn test_idempotent() {
        let once = normalize("HTTPS://Sub.Example.com:443/x/../y/%7e?b=2&a=1#Frag").unwrap();
        assert_eq!(normalize(&once).unwrap(), once);
    }

    #[test]
    fn test_malformed() {
        assert_eq!(normalize(""), Err(NormalizeError::Empty));
        assert_eq!(normalize("   "), Err(NormalizeError::Empty));
        assert!(matches!(normalize("not a url"), Err(NormalizeError::Parse(_))));
        assert!(matches!(normalize("https://"), Err(NormalizeError::Parse(_))));
        assert_eq!(normalize("mailto:someone@example.com"), Err(NormalizeError::MissingHost));
    }

    #[test]
    fn test_decoded_path() {
        let url = Url::parse("https://example.com/caf%C3%A9/a%20b").unwrap();
        assert_eq!(decoded_path(&url), "/café/a b");
    }

    #[test]
    fn test_query_value() {
        let url = Url::parse("https://example.com/?id=&id=5&q=a+b").unwrap();
        assert_eq!(query_value(&url, "id").as_deref(), Some("5"));
        assert_eq!(query_value(&url, "q").as_deref(), Some("a b"));
        assert_eq!(query_value(&url, "missing"), None);
    }

    #[test]
    fn test_host_in_domain() {
        assert!(host_in_domain("example.com", "example.com"));
        assert!(host_in_domain("sub.example.com", "example.com"));
        assert!(host_in_domain("a.b.example.com", "example.com"));
        assert!(host_in_domain("Sub.Example.com.", "example.com"));
        assert!(!host_in_domain("notexample.com", "example.com"));
        assert!(!host_in_domain("example.com.evil", "example.com"));
        assert!(!host_in_domain("com", "example.com"));
        assert!(!host_in_domain("example.com", ""));
    }
}
