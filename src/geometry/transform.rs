//! Rotation of layer outlines around their center.
//!
//! Layers store an `angle` in radians, clockwise positive in the canvas
//! coordinate system (Y pointing down). Outline vertices are rotated around
//! the layer's unrotated center before any segment or bounds computation.
//!
//! ## Loose Bounds
//!
//! Rotated bounds are computed by rotating every outline vertex and taking the
//! axis-aligned box of the result. For rectangles that is the exact box of the
//! rotated shape; for ellipses it over-estimates, which is acceptable for
//! containment and alignment decisions.

use super::types::{BoundingBox, Point};

/// A 2D rotation around a center point
#[derive(Debug, Clone, Copy)]
pub struct RotationTransform {
    /// Rotation angle in radians (clockwise positive)
    pub angle: f64,
    /// Center of rotation, normally the layer's unrotated center
    pub center: Point,
}

impl RotationTransform {
    pub fn new(angle: f64, center: Point) -> Self {
        Self { angle, center }
    }

    /// Returns true if the rotation would not produce any visible change.
    pub fn is_identity(&self) -> bool {
        self.angle.abs() < f64::EPSILON
    }

    /// Rotate a point around the center.
    ///
    /// ```text
    /// x' = cx + (x - cx) * cos(θ) - (y - cy) * sin(θ)
    /// y' = cy + (x - cx) * sin(θ) + (y - cy) * cos(θ)
    /// ```
    pub fn transform_point(&self, point: Point) -> Point {
        if self.is_identity() {
            return point;
        }

        let (sin_a, cos_a) = self.angle.sin_cos();
        let dx = point.x - self.center.x;
        let dy = point.y - self.center.y;

        Point {
            x: self.center.x + dx * cos_a - dy * sin_a,
            y: self.center.y + dx * sin_a + dy * cos_a,
        }
    }

    /// Rotate every point of a polyline or polygon
    pub fn transform_points(&self, points: &[Point]) -> Vec<Point> {
        points.iter().map(|p| self.transform_point(*p)).collect()
    }

    /// Transform a bounding box using the loose bounds algorithm
    pub fn transform_bounds(&self, bounds: &BoundingBox) -> BoundingBox {
        if self.is_identity() {
            return *bounds;
        }
        let rotated = bounds.corners().map(|p| self.transform_point(p));
        BoundingBox::from_points(rotated).unwrap_or(*bounds)
    }
}
