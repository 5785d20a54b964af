//! URL and parameter builder for the Spectrum Spatial image endpoint.
//!
//! The endpoint has two quirks the builder normalizes: bounding boxes are
//! sent in the projection's axis order with the projection code appended,
//! and the query string uses `;` delimiters throughout — the conventional
//! `?` and `&` are rewritten after assembly.

use crate::error::SourceError;
use crate::extent::{Extent, Size};
use crate::params::{
    self, ParameterSet, BBOX_KEY, DEFAULT_DPI, DPI_KEY, HEIGHT_KEY, IMAGE_TYPE_KEY, MAP_NAME_KEY,
    WIDTH_KEY,
};
use crate::projection::Projection;

/// Fixed path segment between the base URL and the map-name segment.
const MAPS_PATH: &str = "/maps";

/// Result of building one request URL.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BuiltRequest {
    /// Final URL with the endpoint's `;` delimiters.
    pub url: String,
    /// Declared response image type, extracted from the parameters.
    pub image_type: String,
    /// Map name extracted from the parameters, path-segment normalization
    /// already applied to the URL.
    pub map_name: Option<String>,
}

/// Builds the request URL for the given geometry and parameters.
///
/// `params` must already hold the merged defaults and user overrides; the
/// control parameters `imageType` and `mapName` are removed from it here so
/// they never appear in the query string. Fails with
/// [`SourceError::MissingUrl`] before any other work when no base URL is
/// set.
pub(crate) fn build_request(
    base_url: Option<&str>,
    extent: &Extent,
    size: Size,
    pixel_ratio: f64,
    projection: &Projection,
    params: &mut ParameterSet,
) -> Result<BuiltRequest, SourceError> {
    let base_url = base_url.ok_or(SourceError::MissingUrl)?;

    if pixel_ratio != 1.0 {
        // The service takes whole pixels-per-inch; 1.5x density yields 135.
        params.set(DPI_KEY, (DEFAULT_DPI * pixel_ratio).round() as i64);
    }

    params.set(WIDTH_KEY, size.width);
    params.set(HEIGHT_KEY, size.height);
    params.set(BBOX_KEY, bbox_value(extent, projection));

    let image_type = params
        .remove(IMAGE_TYPE_KEY)
        .map(|v| params::value_to_query(&v))
        .unwrap_or_else(|| "png".to_string());
    // An empty map name counts as absent, matching strategy selection.
    let map_name = params
        .remove(MAP_NAME_KEY)
        .map(|v| params::value_to_query(&v))
        .filter(|name| !name.is_empty());

    let map_segment = match map_name.as_deref() {
        None => String::new(),
        Some(name) if name.starts_with('/') => name.to_string(),
        Some(name) => format!("/{}", name),
    };

    let mut url = format!(
        "{}{}{}/image.{}",
        base_url, MAPS_PATH, map_segment, image_type
    );
    let query = params.query_string();
    if !query.is_empty() {
        url.push('?');
        url.push_str(&query);
    }

    Ok(BuiltRequest {
        url: rewrite_delimiters(&url),
        image_type,
        map_name,
    })
}

/// Serializes the bounding box in the projection's axis order, with the
/// projection code as the trailing component.
fn bbox_value(extent: &Extent, projection: &Projection) -> String {
    let ordered = if projection.north_east_order() {
        [extent.min_y, extent.min_x, extent.max_y, extent.max_x]
    } else {
        [extent.min_x, extent.min_y, extent.max_x, extent.max_y]
    };
    format!(
        "{},{},{},{},{}",
        ordered[0],
        ordered[1],
        ordered[2],
        ordered[3],
        projection.code()
    )
}

/// Rewrites conventional query delimiters to the endpoint's `;` form: every
/// `&` becomes `;`, the first `?` becomes `;`.
fn rewrite_delimiters(url: &str) -> String {
    url.replace('&', ";").replacen('?', ";", 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASE_URL: &str = "http://example.com/rest/Spatial/MapTilingService";

    fn build(
        pixel_ratio: f64,
        projection: &Projection,
        params: &mut ParameterSet,
    ) -> BuiltRequest {
        build_request(
            Some(BASE_URL),
            &Extent::new(0.0, 0.0, 100.0, 100.0),
            Size::new(150, 150),
            pixel_ratio,
            projection,
            params,
        )
        .expect("request builds")
    }

    #[test]
    fn test_missing_url_is_checked_first() {
        let mut params = ParameterSet::defaults();
        let result = build_request(
            None,
            &Extent::new(0.0, 0.0, 1.0, 1.0),
            Size::new(1, 1),
            1.0,
            &Projection::new("EPSG:3857"),
            &mut params,
        );
        assert_eq!(result.unwrap_err(), SourceError::MissingUrl);
    }

    #[test]
    fn test_full_url_shape() {
        let mut params = ParameterSet::defaults();
        let built = build(1.0, &Projection::new("EPSG:3857"), &mut params);

        assert_eq!(
            built.url,
            format!(
                "{}/maps/image.png;b=0,0,100,100,EPSG:3857;h=150;r=90;w=150",
                BASE_URL
            )
        );
        assert_eq!(built.image_type, "png");
        assert_eq!(built.map_name, None);
    }

    #[test]
    fn test_axis_reordering_north_east_first() {
        let projection = Projection::new("EPSG:4326").with_axis_orientation("neu");
        let mut params = ParameterSet::defaults();
        build_request(
            Some(BASE_URL),
            &Extent::new(1.0, 2.0, 3.0, 4.0),
            Size::new(10, 10),
            1.0,
            &projection,
            &mut params,
        )
        .unwrap();

        assert_eq!(params.get(BBOX_KEY), Some(&json!("2,1,4,3,EPSG:4326")));
    }

    #[test]
    fn test_axis_order_east_first_unchanged() {
        let projection = Projection::new("EPSG:4326").with_axis_orientation("enu");
        let mut params = ParameterSet::defaults();
        build_request(
            Some(BASE_URL),
            &Extent::new(1.0, 2.0, 3.0, 4.0),
            Size::new(10, 10),
            1.0,
            &projection,
            &mut params,
        )
        .unwrap();

        assert_eq!(params.get(BBOX_KEY), Some(&json!("1,2,3,4,EPSG:4326")));
    }

    #[test]
    fn test_hidpi_overrides_dpi_parameter() {
        let mut params = ParameterSet::defaults();
        let built = build(2.0, &Projection::new("EPSG:3857"), &mut params);
        assert!(built.url.contains(";r=180;"));
    }

    #[test]
    fn test_unit_pixel_ratio_keeps_default_dpi() {
        let mut params = ParameterSet::defaults();
        let built = build(1.0, &Projection::new("EPSG:3857"), &mut params);
        assert!(built.url.contains(";r=90;"));
    }

    #[test]
    fn test_map_name_becomes_path_segment() {
        let mut params = ParameterSet::defaults();
        params.set(MAP_NAME_KEY, "foo");
        let built = build(1.0, &Projection::new("EPSG:3857"), &mut params);

        assert!(built.url.starts_with(&format!("{}/maps/foo/image.png", BASE_URL)));
        assert_eq!(built.map_name.as_deref(), Some("foo"));
        // Control parameter never reaches the query string.
        assert!(!built.url.contains("mapName"));
    }

    #[test]
    fn test_empty_map_name_adds_no_path_segment() {
        let mut params = ParameterSet::defaults();
        params.set(MAP_NAME_KEY, "");
        let built = build(1.0, &Projection::new("EPSG:3857"), &mut params);

        assert!(built.url.starts_with(&format!("{}/maps/image.png", BASE_URL)));
        assert!(!built.url.contains("//image"));
        assert_eq!(built.map_name, None);
    }

    #[test]
    fn test_map_name_with_leading_separator_is_not_doubled() {
        let mut params = ParameterSet::defaults();
        params.set(MAP_NAME_KEY, "/foo");
        let built = build(1.0, &Projection::new("EPSG:3857"), &mut params);

        assert!(built.url.starts_with(&format!("{}/maps/foo/image.png", BASE_URL)));
    }

    #[test]
    fn test_image_type_extracted_from_params() {
        let mut params = ParameterSet::defaults();
        params.set(IMAGE_TYPE_KEY, "jpeg");
        let built = build(1.0, &Projection::new("EPSG:3857"), &mut params);

        assert!(built.url.contains("/image.jpeg;"));
        assert_eq!(built.image_type, "jpeg");
        assert!(!built.url.contains("imageType"));
    }

    #[test]
    fn test_user_params_survive_into_query() {
        let mut params = ParameterSet::defaults();
        params.set("watermark", "none");
        let built = build(1.0, &Projection::new("EPSG:3857"), &mut params);
        assert!(built.url.contains(";watermark=none"));
    }

    #[test]
    fn test_rewrite_delimiters_ampersands() {
        assert_eq!(rewrite_delimiters("a=1&b=2"), "a=1;b=2");
    }

    #[test]
    fn test_rewrite_delimiters_leading_question_mark() {
        assert_eq!(rewrite_delimiters("path?a=1"), "path;a=1");
    }

    #[test]
    fn test_rewrite_delimiters_combined() {
        assert_eq!(
            rewrite_delimiters("http://h/maps/image.png?a=1&b=2&c=3"),
            "http://h/maps/image.png;a=1;b=2;c=3"
        );
    }
}
