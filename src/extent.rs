//! Extent and pixel-size value types.
//!
//! An [`Extent`] is an axis-aligned rectangle in projected map coordinates,
//! `[min_x, min_y, max_x, max_y]`. A [`Size`] is a pair of whole-pixel
//! dimensions derived from an extent and a resolution (map units per pixel).

/// Axis-aligned rectangle in projected map coordinates.
///
/// Invariant: `min_x <= max_x` and `min_y <= max_y`. A degenerate (zero-area)
/// extent is valid; callers deriving pixel sizes clamp to at least one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    /// Creates an extent from its corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        debug_assert!(min_x <= max_x, "extent min_x must not exceed max_x");
        debug_assert!(min_y <= max_y, "extent min_y must not exceed max_y");
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Width of the extent in map units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the extent in map units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Center point of the extent as `(x, y)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Returns `true` if `other` lies fully inside this extent.
    ///
    /// Containment is inclusive: an extent contains itself. Mere
    /// intersection is not enough, which is what lets the cache gate
    /// guarantee a retained image fully covers the requested viewport.
    pub fn contains(&self, other: &Extent) -> bool {
        self.min_x <= other.min_x
            && self.min_y <= other.min_y
            && self.max_x >= other.max_x
            && self.max_y >= other.max_y
    }

    /// Builds the extent covering `size` pixels at `resolution`, centered on
    /// `center`.
    pub fn for_center_and_size(center: (f64, f64), resolution: f64, size: Size) -> Self {
        let dx = resolution * f64::from(size.width) / 2.0;
        let dy = resolution * f64::from(size.height) / 2.0;
        Self::new(center.0 - dx, center.1 - dy, center.0 + dx, center.1 + dy)
    }
}

/// Whole-pixel dimensions of a requested image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    /// Creates a size from pixel dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_height_center() {
        let extent = Extent::new(0.0, 0.0, 100.0, 50.0);
        assert_eq!(extent.width(), 100.0);
        assert_eq!(extent.height(), 50.0);
        assert_eq!(extent.center(), (50.0, 25.0));
    }

    #[test]
    fn test_contains_self() {
        let extent = Extent::new(-10.0, -10.0, 10.0, 10.0);
        assert!(extent.contains(&extent));
    }

    #[test]
    fn test_contains_inner_extent() {
        let outer = Extent::new(0.0, 0.0, 100.0, 100.0);
        let inner = Extent::new(25.0, 25.0, 75.0, 75.0);
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
    }

    #[test]
    fn test_intersection_is_not_containment() {
        let a = Extent::new(0.0, 0.0, 100.0, 100.0);
        let b = Extent::new(50.0, 50.0, 150.0, 150.0);
        assert!(!a.contains(&b));
        assert!(!b.contains(&a));
    }

    #[test]
    fn test_for_center_and_size() {
        let extent = Extent::for_center_and_size((50.0, 50.0), 1.0, Size::new(150, 150));
        assert_eq!(extent, Extent::new(-25.0, -25.0, 125.0, 125.0));
    }

    #[test]
    fn test_for_center_and_size_applies_resolution() {
        let extent = Extent::for_center_and_size((0.0, 0.0), 2.0, Size::new(10, 20));
        assert_eq!(extent, Extent::new(-10.0, -20.0, 10.0, 20.0));
    }
}
