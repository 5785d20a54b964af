//! The image source: single-slot request cache and fetch orchestration.
//!
//! [`ImageSource`] sits between a map renderer and the network transport.
//! [`ImageSource::get_image`] runs synchronously on the caller's thread:
//! compute the request geometry, check the retained image against it, and on
//! a miss build the request URL, pick a fetch strategy, and return a fresh
//! handle whose fetch completes in the background. Only the most recent
//! handle is retained; a superseded fetch completes into its own handle and
//! is ignored by construction.

mod geometry;
mod request;

pub use geometry::RequestGeometry;

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error};

use crate::error::SourceError;
use crate::extent::Extent;
use crate::fetch::{
    binary_post_loader, default_image_load_function, load_function_loader, FetchStrategy,
    HttpClient, HttpMethod, ImageLoadFunction, RequestDescriptor,
};
use crate::image::{Image, ImageState};
use crate::notify::{SourceLifecycle, SourceNotifier};
use crate::params::{self, ParameterSet, MAP_NAME_KEY, POST_DATA_KEY};
use crate::projection::Projection;
use request::build_request;

/// Default oversampling ratio applied to request extents.
pub const DEFAULT_RATIO: f64 = 1.5;

/// Load progress events forwarded from the current image handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSourceEvent {
    /// A fetch was issued.
    ImageLoadStart,
    /// The current image finished loading.
    ImageLoadEnd,
    /// The current image failed to load or decode.
    ImageLoadError,
}

/// Configuration for an [`ImageSource`].
#[derive(Clone)]
pub struct ImageSourceOptions {
    /// Base endpoint URL. Without one, `get_image` returns `None`.
    pub url: Option<String>,
    /// User parameters merged over the fixed defaults on every request.
    pub params: ParameterSet,
    /// Honor caller-supplied pixel ratios. When `false`, the pixel ratio is
    /// forced to 1.
    pub hidpi: bool,
    /// Oversampling ratio for request extents.
    pub ratio: f64,
    /// Advisory cross-origin hint passed through to embedders.
    pub cross_origin: Option<String>,
    /// Fixed resolution set; requests snap to the nearest entry.
    pub resolutions: Option<Vec<f64>>,
    /// Load function for map-name fetches; defaults to a plain GET through
    /// the source's HTTP client.
    pub image_load_function: Option<ImageLoadFunction>,
}

impl Default for ImageSourceOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageSourceOptions {
    /// Creates options with the defaults: hidpi enabled, ratio 1.5.
    pub fn new() -> Self {
        Self {
            url: None,
            params: ParameterSet::new(),
            hidpi: true,
            ratio: DEFAULT_RATIO,
            cross_origin: None,
            resolutions: None,
            image_load_function: None,
        }
    }

    /// Sets the base endpoint URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the user parameters.
    pub fn with_params(mut self, params: ParameterSet) -> Self {
        self.params = params;
        self
    }

    /// Disables or enables hidpi request sizing.
    pub fn with_hidpi(mut self, hidpi: bool) -> Self {
        self.hidpi = hidpi;
        self
    }

    /// Sets the oversampling ratio.
    pub fn with_ratio(mut self, ratio: f64) -> Self {
        self.ratio = ratio;
        self
    }

    /// Sets the cross-origin hint.
    pub fn with_cross_origin(mut self, cross_origin: impl Into<String>) -> Self {
        self.cross_origin = Some(cross_origin.into());
        self
    }

    /// Sets the fixed resolution set.
    pub fn with_resolutions(mut self, resolutions: Vec<f64>) -> Self {
        self.resolutions = Some(resolutions);
        self
    }

    /// Sets a custom image-load function.
    pub fn with_image_load_function(mut self, load_function: ImageLoadFunction) -> Self {
        self.image_load_function = Some(load_function);
        self
    }
}

/// The single cache slot: the current handle plus the source revision it was
/// created under.
struct RetainedImage {
    image: Arc<Image>,
    revision: u64,
}

/// Single-image source for a Spectrum Spatial mapping service.
///
/// Generic over the HTTP client so tests can inject a mock transport, in
/// the same shape as the imagery providers this crate is modeled on.
pub struct ImageSource<C: HttpClient> {
    http: Arc<C>,
    lifecycle: Arc<SourceNotifier>,
    url: Option<String>,
    params: ParameterSet,
    image_load_function: ImageLoadFunction,
    hidpi: bool,
    ratio: f64,
    cross_origin: Option<String>,
    retained: Option<RetainedImage>,
    load_listeners: Arc<Mutex<Vec<Box<dyn Fn(ImageSourceEvent) + Send + Sync>>>>,
}

impl<C: HttpClient + 'static> ImageSource<C> {
    /// Creates a source over the given HTTP client.
    pub fn new(http_client: C, options: ImageSourceOptions) -> Self {
        let http = Arc::new(http_client);
        let lifecycle = Arc::new(match options.resolutions {
            Some(resolutions) => SourceNotifier::with_resolutions(resolutions),
            None => SourceNotifier::new(),
        });
        let image_load_function = options
            .image_load_function
            .unwrap_or_else(|| default_image_load_function(Arc::clone(&http)));

        Self {
            http,
            lifecycle,
            url: options.url,
            params: options.params,
            image_load_function,
            hidpi: options.hidpi,
            ratio: options.ratio,
            cross_origin: options.cross_origin,
            retained: None,
            load_listeners: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns the cached or freshly requested image for a viewport.
    ///
    /// Returns `None` when no base URL is configured. On a cache hit the
    /// returned handle is the retained one (`Arc::ptr_eq` holds between
    /// calls); on a miss a new handle is returned with its fetch already
    /// issued, readiness observable via the handle's change listeners.
    pub fn get_image(
        &mut self,
        extent: Extent,
        resolution: f64,
        pixel_ratio: f64,
        projection: &Projection,
    ) -> Option<Arc<Image>> {
        if self.url.is_none() {
            debug!("get_image called without a configured URL");
            return None;
        }

        let resolution = self.lifecycle.find_nearest_resolution(resolution);
        let pixel_ratio = if self.hidpi { pixel_ratio } else { 1.0 };
        let geometry = RequestGeometry::compute(&extent, resolution, pixel_ratio, self.ratio);

        if let Some(retained) = &self.retained {
            if can_reuse(
                retained,
                &geometry.view_extent,
                resolution,
                pixel_ratio,
                self.lifecycle.revision(),
            ) {
                debug!("serving retained image");
                return Some(Arc::clone(&retained.image));
            }
        }

        match self.issue_fetch(&geometry, resolution, pixel_ratio, projection) {
            Ok(image) => Some(image),
            Err(e) => {
                error!(error = %e, "failed to build image request");
                None
            }
        }
    }

    /// Builds the request, creates the handle, issues the fetch, and
    /// replaces the retained slot.
    fn issue_fetch(
        &mut self,
        geometry: &RequestGeometry,
        resolution: f64,
        pixel_ratio: f64,
        projection: &Projection,
    ) -> Result<Arc<Image>, SourceError> {
        let mut merged = ParameterSet::defaults();
        merged.merge(&self.params);

        // Strategy selection must see the map name before the URL builder
        // strips it from the parameter set.
        let map_name = merged.get(MAP_NAME_KEY).map(params::value_to_query);
        let strategy = FetchStrategy::for_map_name(map_name.as_deref());
        let post_data = merged.remove(POST_DATA_KEY);

        let built = build_request(
            self.url.as_deref(),
            &geometry.request_extent,
            geometry.request_size,
            pixel_ratio,
            projection,
            &mut merged,
        )?;
        debug!(url = %built.url, map_name = ?built.map_name, ?strategy, "built image request");

        let image = match strategy {
            FetchStrategy::BinaryPost => {
                let body = post_data
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()
                    .map_err(|e| SourceError::PostData(e.to_string()))?;
                let descriptor = RequestDescriptor {
                    url: built.url,
                    method: HttpMethod::Post,
                    body,
                    image_type: built.image_type,
                };
                Image::new(
                    geometry.request_extent,
                    resolution,
                    pixel_ratio,
                    None,
                    binary_post_loader(Arc::clone(&self.http), descriptor),
                )
            }
            FetchStrategy::LoadFunction => Image::new(
                geometry.request_extent,
                resolution,
                pixel_ratio,
                Some(built.url.clone()),
                load_function_loader(Arc::clone(&self.image_load_function), built.url),
            ),
        };

        let listeners = Arc::clone(&self.load_listeners);
        image.on_change(move |state| {
            let event = match state {
                ImageState::Loading => ImageSourceEvent::ImageLoadStart,
                ImageState::Loaded => ImageSourceEvent::ImageLoadEnd,
                ImageState::Error => ImageSourceEvent::ImageLoadError,
                ImageState::Idle => return,
            };
            for listener in listeners.lock().iter() {
                listener(event);
            }
        });
        image.load();

        self.retained = Some(RetainedImage {
            image: Arc::clone(&image),
            revision: self.lifecycle.revision(),
        });
        Ok(image)
    }

    /// The configured base URL.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Sets the base URL. A changed URL drops the retained image and emits a
    /// change notification; setting the same URL is a no-op.
    pub fn set_url(&mut self, url: Option<String>) {
        if url != self.url {
            self.url = url;
            self.invalidate();
        }
    }

    /// The user-provided parameters (not including the fixed defaults).
    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    /// Merges `updates` into the user parameters and invalidates the cache.
    pub fn update_params(&mut self, updates: &ParameterSet) {
        self.params.merge(updates);
        self.invalidate();
    }

    /// The load function used for map-name fetches.
    pub fn image_load_function(&self) -> ImageLoadFunction {
        Arc::clone(&self.image_load_function)
    }

    /// Replaces the image-load function and invalidates the cache.
    pub fn set_image_load_function(&mut self, load_function: ImageLoadFunction) {
        self.image_load_function = load_function;
        self.invalidate();
    }

    /// The advisory cross-origin hint.
    pub fn cross_origin(&self) -> Option<&str> {
        self.cross_origin.as_deref()
    }

    /// The oversampling ratio.
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Whether hidpi request sizing is enabled.
    pub fn hidpi(&self) -> bool {
        self.hidpi
    }

    /// The lifecycle capability: revision counter and change observers.
    pub fn lifecycle(&self) -> &Arc<SourceNotifier> {
        &self.lifecycle
    }

    /// Registers a listener for load progress events of the current image.
    pub fn on_image_load(&self, listener: impl Fn(ImageSourceEvent) + Send + Sync + 'static) {
        self.load_listeners.lock().push(Box::new(listener));
    }

    fn invalidate(&mut self) {
        debug!("source configuration changed, dropping retained image");
        self.retained = None;
        self.lifecycle.changed();
    }
}

/// The cache gate: decides whether the retained image can serve a request.
///
/// Resolution and pixel ratio must match exactly (no resampling support);
/// the extent check is full containment, which lets one oversampled fetch
/// serve several nearby viewports.
fn can_reuse(
    retained: &RetainedImage,
    view_extent: &Extent,
    resolution: f64,
    pixel_ratio: f64,
    current_revision: u64,
) -> bool {
    retained.revision == current_revision
        && retained.image.resolution() == resolution
        && retained.image.pixel_ratio() == pixel_ratio
        && retained.image.extent().contains(view_extent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MockHttpClient;
    use crate::image::tests::tiny_png;

    fn retained(extent: Extent, resolution: f64, pixel_ratio: f64, revision: u64) -> RetainedImage {
        RetainedImage {
            image: Image::new(extent, resolution, pixel_ratio, None, Box::new(|_| {})),
            revision,
        }
    }

    fn source(options: ImageSourceOptions) -> ImageSource<MockHttpClient> {
        ImageSource::new(MockHttpClient::new(Ok(tiny_png())), options)
    }

    #[test]
    fn test_can_reuse_when_all_conditions_hold() {
        let slot = retained(Extent::new(0.0, 0.0, 100.0, 100.0), 1.0, 1.0, 3);
        let view = Extent::new(10.0, 10.0, 90.0, 90.0);
        assert!(can_reuse(&slot, &view, 1.0, 1.0, 3));
    }

    #[test]
    fn test_no_reuse_on_revision_change() {
        let slot = retained(Extent::new(0.0, 0.0, 100.0, 100.0), 1.0, 1.0, 3);
        let view = Extent::new(10.0, 10.0, 90.0, 90.0);
        assert!(!can_reuse(&slot, &view, 1.0, 1.0, 4));
    }

    #[test]
    fn test_no_reuse_on_resolution_mismatch() {
        let slot = retained(Extent::new(0.0, 0.0, 100.0, 100.0), 1.0, 1.0, 0);
        let view = Extent::new(10.0, 10.0, 90.0, 90.0);
        assert!(!can_reuse(&slot, &view, 2.0, 1.0, 0));
    }

    #[test]
    fn test_no_reuse_on_pixel_ratio_mismatch() {
        let slot = retained(Extent::new(0.0, 0.0, 100.0, 100.0), 1.0, 1.0, 0);
        let view = Extent::new(10.0, 10.0, 90.0, 90.0);
        assert!(!can_reuse(&slot, &view, 1.0, 2.0, 0));
    }

    #[test]
    fn test_no_reuse_when_view_extent_not_contained() {
        let slot = retained(Extent::new(0.0, 0.0, 100.0, 100.0), 1.0, 1.0, 0);
        let partly_outside = Extent::new(50.0, 50.0, 150.0, 150.0);
        assert!(!can_reuse(&slot, &partly_outside, 1.0, 1.0, 0));
    }

    #[test]
    fn test_get_image_without_url_returns_none() {
        let mut source = source(ImageSourceOptions::new());
        let image = source.get_image(
            Extent::new(0.0, 0.0, 100.0, 100.0),
            1.0,
            1.0,
            &Projection::new("EPSG:3857"),
        );
        assert!(image.is_none());
    }

    #[test]
    fn test_hidpi_disabled_forces_pixel_ratio_one() {
        let mut source = source(
            ImageSourceOptions::new()
                .with_url("http://example.com/rest")
                .with_hidpi(false),
        );
        let image = source
            .get_image(
                Extent::new(0.0, 0.0, 100.0, 100.0),
                1.0,
                2.0,
                &Projection::new("EPSG:3857"),
            )
            .expect("image handle");
        assert_eq!(image.pixel_ratio(), 1.0);
    }

    #[test]
    fn test_set_url_same_value_keeps_revision() {
        let mut source = source(ImageSourceOptions::new().with_url("http://example.com"));
        let before = source.lifecycle().revision();
        source.set_url(Some("http://example.com".to_string()));
        assert_eq!(source.lifecycle().revision(), before);
    }

    #[test]
    fn test_set_url_change_bumps_revision() {
        let mut source = source(ImageSourceOptions::new().with_url("http://example.com"));
        let before = source.lifecycle().revision();
        source.set_url(Some("http://other.example.com".to_string()));
        assert_eq!(source.lifecycle().revision(), before + 1);
    }

    #[test]
    fn test_update_params_reflected_by_accessor() {
        let mut source = source(ImageSourceOptions::new());
        let mut updates = ParameterSet::new();
        updates.set("x", 1);
        source.update_params(&updates);
        assert_eq!(source.params().get("x"), Some(&serde_json::json!(1)));
    }

    #[test]
    fn test_resolution_snapping_applies_to_handle() {
        let mut source = source(
            ImageSourceOptions::new()
                .with_url("http://example.com/rest")
                .with_resolutions(vec![8.0, 4.0, 2.0, 1.0]),
        );
        let image = source
            .get_image(
                Extent::new(0.0, 0.0, 100.0, 100.0),
                3.7,
                1.0,
                &Projection::new("EPSG:3857"),
            )
            .expect("image handle");
        assert_eq!(image.resolution(), 4.0);
    }
}
