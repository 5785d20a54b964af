//! HTTP client abstraction for testability.

use crate::error::SourceError;

/// Trait for the HTTP operations the source needs.
///
/// This abstraction allows for dependency injection and easier testing by
/// enabling mock HTTP clients in tests. The source issues plain GETs for
/// load-function fetches and binary POSTs for direct image rendering.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    ///
    /// # Returns
    ///
    /// The response body as bytes or an error.
    fn get(&self, url: &str) -> Result<Vec<u8>, SourceError>;

    /// Performs an HTTP POST request and returns the raw response body.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    /// * `body` - The request body bytes
    /// * `content_type` - Value for the `Content-type` header
    fn post(&self, url: &str, body: &[u8], content_type: &str)
        -> Result<Vec<u8>, SourceError>;
}

/// Real HTTP client implementation using reqwest.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with default configuration.
    pub fn new() -> Result<Self, SourceError> {
        Self::with_timeout(30)
    }

    /// Creates a new ReqwestClient with custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, SourceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SourceError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    fn read_response(
        url: &str,
        response: reqwest::blocking::Response,
    ) -> Result<Vec<u8>, SourceError> {
        if !response.status().is_success() {
            return Err(SourceError::Http(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| SourceError::Http(format!("Failed to read response: {}", e)))
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new().expect("Failed to create default HTTP client")
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| SourceError::Http(format!("Request failed: {}", e)))?;

        Self::read_response(url, response)
    }

    fn post(
        &self,
        url: &str,
        body: &[u8],
        content_type: &str,
    ) -> Result<Vec<u8>, SourceError> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body.to_vec())
            .send()
            .map_err(|e| SourceError::Http(format!("Request failed: {}", e)))?;

        Self::read_response(url, response)
    }
}
