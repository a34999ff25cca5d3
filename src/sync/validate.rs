//! Bookmark key validation

use url::Url;

/// Whether `key` is an absolute http(s) URL
pub fn is_valid_bookmark_url(key: &str) -> bool {
    match Url::parse(key) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.has_host(),
        Err(_) => false,
    }
}

/// Like [`is_valid_bookmark_url`], logging a warning for rejected keys
pub fn check_bookmark_url(key: &str) -> bool {
    let valid = is_valid_bookmark_url(key);
    if !valid {
        tracing::warn!(url = %key, "Skipping bookmark with invalid URL");
    }
    valid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_absolute_http_urls() {
        assert!(is_valid_bookmark_url("https://example.com/"));
        assert!(is_valid_bookmark_url("http://example.com/path?q=1#frag"));
        assert!(is_valid_bookmark_url("https://sub.example.org:8443/a/b"));
    }

    #[test]
    fn test_rejects_other_keys() {
        assert!(!is_valid_bookmark_url(""));
        assert!(!is_valid_bookmark_url("example.com"));
        assert!(!is_valid_bookmark_url("/relative/path"));
        assert!(!is_valid_bookmark_url("ftp://example.com/file"));
        assert!(!is_valid_bookmark_url("javascript:alert(1)"));
        assert!(!is_valid_bookmark_url("not a url"));
    }
}
