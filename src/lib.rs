//! SpectrumSpatial - single-image map source client
//!
//! This library implements the client-side image source for Spectrum Spatial
//! mapping services: a single-slot request cache plus the request
//! construction (URL, query parameters, optional POST body) needed to fetch
//! untiled map images for a viewport.
//!
//! # Overview
//!
//! The renderer asks [`ImageSource::get_image`] for an image covering an
//! extent at a resolution and pixel ratio. The source enlarges the request
//! by an oversampling ratio so small pans are served from the retained
//! image, and only refetches when the viewport, resolution, pixel ratio, or
//! source configuration actually changed. Requests either POST a render
//! description and re-encode the binary response as a data URI, or hand a
//! built URL to an image-load function, depending on whether a map name is
//! configured.
//!
//! ```ignore
//! use spectrumspatial::{
//!     Extent, ImageSource, ImageSourceOptions, ParameterSet, Projection, ReqwestClient,
//! };
//!
//! let mut params = ParameterSet::new();
//! params.set("mapName", "world");
//!
//! let mut source = ImageSource::new(
//!     ReqwestClient::new()?,
//!     ImageSourceOptions::new()
//!         .with_url("http://host/rest/Spatial/MapTilingService")
//!         .with_params(params),
//! );
//!
//! let projection = Projection::new("EPSG:3857");
//! let image = source.get_image(Extent::new(0.0, 0.0, 100.0, 100.0), 1.0, 1.0, &projection);
//! ```

mod error;
mod extent;
mod fetch;
mod image;
mod notify;
mod params;
mod projection;
mod source;

pub use error::SourceError;
pub use extent::{Extent, Size};
pub use fetch::{
    default_image_load_function, encode_data_uri, FetchStrategy, HttpClient, HttpMethod,
    ImageLoadFunction, ReqwestClient, RequestDescriptor, JSON_CONTENT_TYPE,
};
pub use image::{Image, ImageState, Loader};
pub use notify::{SourceLifecycle, SourceNotifier};
pub use params::{
    ParameterSet, BBOX_KEY, DEFAULT_DPI, DPI_KEY, HEIGHT_KEY, IMAGE_TYPE_KEY, MAP_NAME_KEY,
    POST_DATA_KEY, WIDTH_KEY,
};
pub use projection::Projection;
pub use source::{
    ImageSource, ImageSourceEvent, ImageSourceOptions, RequestGeometry, DEFAULT_RATIO,
};
