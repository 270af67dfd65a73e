//! Shared utility functions used across multiple modules.

use reqwest::Url;

use crate::error::{Error, Result};

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Check if a string starts with `http://` or `https://`.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Truncate text to at most 180 characters for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Current Unix timestamp in milliseconds.
pub fn unix_millis_now() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Normalize a user-entered server address into a base URL.
///
/// Bare domains such as `write.as` are assumed to be served over https.
/// Trailing slashes are removed so paths can be appended directly.
pub fn normalize_server_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidServerUrl);
    }

    let candidate = if is_http_url(trimmed) {
        trimmed.to_string()
    } else if trimmed.contains("://") {
        return Err(Error::InvalidServerUrl);
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&candidate).map_err(|_| Error::InvalidServerUrl)?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(Error::InvalidServerUrl);
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_option_rejects_empty() {
        assert_eq!(normalize_text_option(None), None);
        assert_eq!(normalize_text_option(Some("   ".to_string())), None);
    }

    #[test]
    fn normalize_text_option_trims_value() {
        assert_eq!(
            normalize_text_option(Some(" https://example.com ".to_string())),
            Some("https://example.com".to_string())
        );
    }

    #[test]
    fn normalize_server_url_adds_https_to_bare_domain() {
        assert_eq!(normalize_server_url("write.as").unwrap(), "https://write.as");
    }

    #[test]
    fn normalize_server_url_strips_trailing_slash() {
        assert_eq!(
            normalize_server_url(" https://blog.example.com/ ").unwrap(),
            "https://blog.example.com"
        );
        assert_eq!(
            normalize_server_url("http://localhost:8080/").unwrap(),
            "http://localhost:8080"
        );
    }

    #[test]
    fn normalize_server_url_rejects_garbage() {
        assert!(matches!(
            normalize_server_url(""),
            Err(Error::InvalidServerUrl)
        ));
        assert!(matches!(
            normalize_server_url("ftp://example.com"),
            Err(Error::InvalidServerUrl)
        ));
        assert!(matches!(
            normalize_server_url("exa mple.com"),
            Err(Error::InvalidServerUrl)
        ));
    }
}
