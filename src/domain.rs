//! Utility functions for handling domain names and URLs.

use crate::error::{AppError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static SCHEME_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://").expect("scheme prefix pattern is valid")
});

/// Extracts a bare, lowercase hostname from a free-text URL input.
///
/// Accepts anything the lead might type: with or without scheme, with or
/// without `www.`, with paths, queries or ports. Proper URL parsing is tried
/// first; when that fails the input is stripped textually. The function never
/// fails and is idempotent: it always returns *some* string usable as a
/// data-source key.
///
/// # Arguments
/// * `input` - The raw URL text as submitted.
///
/// # Returns
/// * The normalized hostname, or a best-effort textual strip of the input.
pub(crate) fn normalize_domain(input: &str) -> String {
    let trimmed = input.trim();

    let with_scheme = if SCHEME_PREFIX.is_match(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    if let Ok(url) = Url::parse(&with_scheme) {
        if let Some(host) = url.host_str() {
            let host = host.strip_prefix("www.").unwrap_or(host);
            if !host.is_empty() {
                return host.to_lowercase();
            }
        }
    }

    tracing::debug!(
        "URL parse failed for '{}', falling back to textual strip",
        trimmed
    );

    let stripped = SCHEME_PREFIX.replace(trimmed, "");
    let stripped = stripped.strip_prefix("www.").unwrap_or(&stripped);
    let host = stripped.split('/').next().unwrap_or("").trim();

    if host.is_empty() {
        trimmed.to_lowercase()
    } else {
        host.to_lowercase()
    }
}

/// Parses the input into a fetchable `Url`, adding an `https://` scheme when
/// none is present. Unlike [`normalize_domain`] this can fail; it is only
/// called after request validation.
pub(crate) fn normalize_url(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AppError::Config("Page URL is empty".to_string()));
    }
    let with_scheme = if SCHEME_PREFIX.is_match(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    Url::parse(&with_scheme).map_err(AppError::UrlParse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_domain_simple() {
        assert_eq!(normalize_domain("https://www.example.com"), "example.com");
        assert_eq!(normalize_domain("http://example.com"), "example.com");
        assert_eq!(normalize_domain("example.com"), "example.com");
        assert_eq!(normalize_domain("www.example.com"), "example.com");
    }

    #[test]
    fn test_normalize_domain_strips_path_query_port() {
        assert_eq!(
            normalize_domain("https://EXAMPLE.com/path?query=1"),
            "example.com"
        );
        assert_eq!(normalize_domain("http://example.com:8080"), "example.com");
        assert_eq!(
            normalize_domain("example.com/fr/tarifs#section"),
            "example.com"
        );
        assert_eq!(
            normalize_domain("https://sub.domain.example.co.uk"),
            "sub.domain.example.co.uk"
        );
    }

    #[test]
    fn test_normalize_domain_textual_fallback() {
        // Spaces inside the authority defeat the URL parser.
        assert_eq!(
            normalize_domain("https://www.exa mple.com/page"),
            "exa mple.com"
        );
        assert_eq!(normalize_domain("  example.com  "), "example.com");
    }

    #[test]
    fn test_normalize_domain_never_fails() {
        // Degenerate inputs still come back as strings, not panics.
        assert_eq!(normalize_domain("http://"), "http://");
        assert_eq!(normalize_domain("///"), "///");
        assert_eq!(normalize_domain(""), "");
    }

    #[test]
    fn test_normalize_domain_idempotent() {
        let inputs = [
            "https://www.Example.com/path?q=1",
            "example.com",
            "www.example.com:443/fr",
            "http://",
            "///",
            "not a url at all",
            "sub.domain.example.co.uk",
        ];
        for input in inputs {
            let once = normalize_domain(input);
            let twice = normalize_domain(&once);
            assert_eq!(once, twice, "not idempotent for input '{}'", input);
        }
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            normalize_url("example.com").unwrap().as_str(),
            "https://example.com/"
        );
        assert_eq!(
            normalize_url("http://example.com/page").unwrap().as_str(),
            "http://example.com/page"
        );
        assert!(normalize_url("").is_err());
        assert!(normalize_url("http://").is_err());
    }
}
