//! Axis-aligned 2D bounding areas

use crate::foundation::math::Vec2;

/// Smallest extent a bounding area may have along either axis.
///
/// Non-positive sizes are clamped to this rather than rejected, so a
/// degenerate renderable still occupies a valid (if tiny) region.
pub const MINIMUM_SIZE: f32 = 1e-4;

/// Axis-aligned bounding area for spatial queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingArea {
    /// Minimum corner of the area
    pub minimum: Vec2,
    /// Maximum corner of the area
    pub maximum: Vec2,
}

impl Default for BoundingArea {
    fn default() -> Self {
        Self::from_center_size(Vec2::zeros(), Vec2::zeros())
    }
}

impl BoundingArea {
    /// Create a new area from two corners, normalizing their ordering
    pub fn new(a: Vec2, b: Vec2) -> Self {
        let minimum = Vec2::new(a.x.min(b.x), a.y.min(b.y));
        let maximum = Vec2::new(a.x.max(b.x), a.y.max(b.y));
        Self::from_center_size(
            (minimum + maximum) * 0.5,
            maximum - minimum,
        )
    }

    /// Create an area centered at a point with the given size
    ///
    /// Sizes at or below zero are clamped to [`MINIMUM_SIZE`].
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = Vec2::new(
            size.x.max(MINIMUM_SIZE) * 0.5,
            size.y.max(MINIMUM_SIZE) * 0.5,
        );
        Self {
            minimum: center - half,
            maximum: center + half,
        }
    }

    /// Get the center of the area
    pub fn center(&self) -> Vec2 {
        (self.minimum + self.maximum) * 0.5
    }

    /// Get the size of the area
    pub fn size(&self) -> Vec2 {
        self.maximum - self.minimum
    }

    /// Get the extents (half-size) of the area
    pub fn extents(&self) -> Vec2 {
        (self.maximum - self.minimum) * 0.5
    }

    /// Check if this area contains a point
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.minimum.x
            && point.x <= self.maximum.x
            && point.y >= self.minimum.y
            && point.y <= self.maximum.y
    }

    /// Check if this area fully contains another area
    pub fn contains(&self, other: &BoundingArea) -> bool {
        other.minimum.x >= self.minimum.x
            && other.maximum.x <= self.maximum.x
            && other.minimum.y >= self.minimum.y
            && other.maximum.y <= self.maximum.y
    }

    /// Check if this area intersects another area
    pub fn intersects(&self, other: &BoundingArea) -> bool {
        self.minimum.x <= other.maximum.x
            && self.maximum.x >= other.minimum.x
            && self.minimum.y <= other.maximum.y
            && self.maximum.y >= other.minimum.y
    }

    /// Combine this area with another into the smallest area covering both
    pub fn combine(&self, other: &BoundingArea) -> BoundingArea {
        BoundingArea {
            minimum: Vec2::new(
                self.minimum.x.min(other.minimum.x),
                self.minimum.y.min(other.minimum.y),
            ),
            maximum: Vec2::new(
                self.maximum.x.max(other.maximum.x),
                self.maximum.y.max(other.maximum.y),
            ),
        }
    }

    /// Grow the area outward by a margin on all sides
    pub fn expand(&self, margin: f32) -> BoundingArea {
        let margin = margin.max(0.0);
        let offset = Vec2::new(margin, margin);
        BoundingArea {
            minimum: self.minimum - offset,
            maximum: self.maximum + offset,
        }
    }
}
