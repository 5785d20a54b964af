//! Error types for the image source.

use thiserror::Error;

/// Errors that can occur while building or issuing an image request.
///
/// The enum is `Clone` so mock HTTP clients can hand out pre-baked error
/// responses in tests, mirroring how successful responses are cloned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// No base URL has been configured on the source.
    ///
    /// `ImageSource::get_image` returns `None` in this case; the URL builder
    /// raises this error if it is ever reached without one.
    #[error("no base URL configured; set one with `set_url`")]
    MissingUrl,

    /// HTTP transport failure (connection, status, or body read).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The `postData` parameter could not be serialized to JSON.
    #[error("invalid postData parameter: {0}")]
    PostData(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_url_display() {
        let err = SourceError::MissingUrl;
        assert!(err.to_string().contains("set_url"));
    }

    #[test]
    fn test_http_error_display() {
        let err = SourceError::Http("HTTP 503 from http://example.com".to_string());
        assert!(err.to_string().contains("503"));
    }
}
