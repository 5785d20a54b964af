//! Network fetch layer: HTTP client abstraction and fetch strategies.

mod http;
mod strategy;

pub use http::{HttpClient, ReqwestClient};
pub use strategy::{
    default_image_load_function, encode_data_uri, FetchStrategy, HttpMethod, ImageLoadFunction,
    RequestDescriptor, JSON_CONTENT_TYPE,
};

pub(crate) use strategy::{binary_post_loader, load_function_loader};

#[cfg(test)]
pub use http::tests::{MockHttpClient, RecordedRequest};
