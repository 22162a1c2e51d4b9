//! Utility functions shared by the fetcher and the CLI.
//!
//! - **URL validation**: only HTTP(S) feed URLs are ever requested
//! - **Time formatting**: Unix timestamps rendered for listings

mod url_validator;

pub use url_validator::{validate_feed_url, UrlValidationError};

/// Render a Unix timestamp (seconds) as RFC 3339 UTC, or `"never"`.
pub fn format_timestamp(ts: Option<i64>) -> String {
    ts.and_then(|secs| chrono::DateTime::<chrono::Utc>::from_timestamp(secs, 0))
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| "never".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(None), "never");
        assert_eq!(format_timestamp(Some(0)), "1970-01-01T00:00:00+00:00");
    }
}
