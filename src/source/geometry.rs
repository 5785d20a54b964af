//! Request geometry calculator.
//!
//! Turns a requested viewport into two rectangles: the minimal view extent
//! the renderer actually needs, and an enlarged request extent whose
//! oversampling absorbs small pans and rounding mismatches so that nearby
//! viewport requests can be served from one fetch.

use crate::extent::{Extent, Size};

/// Geometry of one image request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestGeometry {
    /// Map units per device pixel (`resolution / pixel_ratio`).
    pub image_resolution: f64,
    /// Minimal extent covering the requested viewport.
    pub view_extent: Extent,
    /// Pixel size of the view extent.
    pub view_size: Size,
    /// Enlarged extent actually requested from the service.
    pub request_extent: Extent,
    /// Pixel size of the request extent.
    pub request_size: Size,
}

impl RequestGeometry {
    /// Computes view and request geometry for a viewport.
    ///
    /// `ratio` is the oversampling factor; with `ratio >= 1` the request
    /// extent always contains the view extent. A zero-area input extent
    /// still produces a 1×1 pixel request.
    pub fn compute(extent: &Extent, resolution: f64, pixel_ratio: f64, ratio: f64) -> Self {
        let image_resolution = resolution / pixel_ratio;
        let center = extent.center();

        let view_size = Size::new(
            pixel_span(extent.width(), image_resolution),
            pixel_span(extent.height(), image_resolution),
        );
        let view_extent = Extent::for_center_and_size(center, image_resolution, view_size);

        let request_size = Size::new(
            pixel_span(ratio * extent.width(), image_resolution),
            pixel_span(ratio * extent.height(), image_resolution),
        );
        let request_extent = Extent::for_center_and_size(center, image_resolution, request_size);

        Self {
            image_resolution,
            view_extent,
            view_size,
            request_extent,
            request_size,
        }
    }
}

/// Whole-pixel span of `units` map units at `image_resolution`, at least 1.
fn pixel_span(units: f64, image_resolution: f64) -> u32 {
    ((units / image_resolution).ceil() as u32).max(1)
}
