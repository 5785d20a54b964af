//! Projection descriptor consumed by the URL builder.
//!
//! The source only needs two facts about the active projection: its code
//! (e.g. `EPSG:4326`), appended to the serialized bounding box, and its axis
//! orientation, which decides whether bounding-box coordinates are sent
//! east-first or north-first.

/// Default axis orientation: easting, northing, up.
const DEFAULT_AXIS_ORIENTATION: &str = "enu";

/// Map projection metadata relevant to request construction.
///
/// Axis orientation follows the proj convention: a three-letter string such
/// as `"enu"` (east/north first) or `"neu"` (north/east first). Projections
/// whose orientation starts with `"ne"` expect bounding boxes with the
/// northing serialized before the easting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    code: String,
    axis_orientation: String,
}

impl Projection {
    /// Creates a projection with the conventional east-first axis order.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            axis_orientation: DEFAULT_AXIS_ORIENTATION.to_string(),
        }
    }

    /// Sets an explicit axis orientation (e.g. `"neu"` for EPSG:4326 as
    /// registered by some authorities).
    pub fn with_axis_orientation(mut self, axis_orientation: impl Into<String>) -> Self {
        self.axis_orientation = axis_orientation.into();
        self
    }

    /// The projection code, e.g. `"EPSG:3857"`.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The axis orientation string.
    pub fn axis_orientation(&self) -> &str {
        &self.axis_orientation
    }

    /// Whether coordinates are ordered north/east first.
    pub fn north_east_order(&self) -> bool {
        self.axis_orientation.starts_with("ne")
    }
}
