//! Fetch strategies and the binary-to-image decoder.
//!
//! The Spectrum Spatial service is reached two ways. Without a map name, the
//! source POSTs the render request and receives raw image bytes, which are
//! re-encoded as a base64 data URI and handed to the image payload. With a
//! map name, the built URL is passed to an image-load function (the
//! configured one, or a default that GETs the URL) which owns fetch and
//! decode.

use std::sync::Arc;

use base64::Engine;
use tracing::debug;

use crate::fetch::http::HttpClient;
use crate::image::{Image, Loader};

/// Content type of the binary POST body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// How a built request is issued and its response handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// POST the render request; the response is raw image bytes.
    BinaryPost,
    /// Hand the URL to the image-load function.
    LoadFunction,
}

impl FetchStrategy {
    /// Selects the strategy from the presence of a map name.
    ///
    /// An empty map name counts as absent. The presence check happens before
    /// the URL builder strips `mapName` from the parameter set, so a
    /// configured map name reliably routes to the load-function path.
    pub fn for_map_name(map_name: Option<&str>) -> Self {
        match map_name {
            Some(name) if !name.is_empty() => FetchStrategy::LoadFunction,
            _ => FetchStrategy::BinaryPost,
        }
    }
}

/// HTTP method of a [`RequestDescriptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Ephemeral description of one image request.
///
/// Built by the URL builder, consumed once by the fetch strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    /// Final request URL, delimiters already rewritten.
    pub url: String,
    /// HTTP method the strategy will use.
    pub method: HttpMethod,
    /// JSON-serialized `postData` parameter, if one was supplied.
    pub body: Option<String>,
    /// Declared response image type, e.g. `"png"`.
    pub image_type: String,
}

/// Callback that loads an image given its request URL.
///
/// Used by the load-function strategy; embedders can install their own to
/// route fetches through custom transports or credentials.
pub type ImageLoadFunction = Arc<dyn Fn(&Image, &str) + Send + Sync>;

/// Default image-load function: GET the URL and feed the bytes to the
/// payload decoder.
pub fn default_image_load_function<C: HttpClient + 'static>(client: Arc<C>) -> ImageLoadFunction {
    Arc::new(move |image: &Image, url: &str| match client.get(url) {
        Ok(bytes) => image.set_raw_bytes(&bytes),
        Err(e) => image.fail(e.to_string()),
    })
}

/// Encodes raw response bytes as a self-contained image reference:
/// `data:image/<type>;base64,<payload>`.
pub fn encode_data_uri(bytes: &[u8], image_type: &str) -> String {
    format!(
        "data:image/{};base64,{}",
        image_type,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Builds the single-shot loader for the binary POST strategy.
///
/// An absent `postData` sends an empty body. The response is not inspected
/// here; undecodable bytes fail inside the payload's own decode step.
pub(crate) fn binary_post_loader<C: HttpClient + 'static>(
    client: Arc<C>,
    descriptor: RequestDescriptor,
) -> Loader {
    Box::new(move |image: &Image| {
        debug!(url = %descriptor.url, "issuing binary POST image request");
        let body = descriptor.body.as_deref().unwrap_or("");
        match client.post(&descriptor.url, body.as_bytes(), JSON_CONTENT_TYPE) {
            Ok(bytes) => image.set_data_uri(&encode_data_uri(&bytes, &descriptor.image_type)),
            Err(e) => image.fail(e.to_string()),
        }
    })
}

/// Builds the single-shot loader for the load-function strategy.
pub(crate) fn load_function_loader(load_function: ImageLoadFunction, url: String) -> Loader {
    Box::new(move |image: &Image| {
        debug!(url = %url, "delegating image request to load function");
        load_function(image, &url);
    })
}
