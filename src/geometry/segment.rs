//! Line segment intersection.
//!
//! Classic two-step test: reject when the segments' bounding boxes do not
//! overlap, then require that each segment touches or straddles the line
//! through the other one. Both directions are needed; a segment that only
//! meets the infinite extension of the other does not intersect it.

use super::types::{BoundingBox, Point};

/// Tolerance for treating a point as lying on a line
pub const ON_LINE_EPSILON: f64 = 1e-6;

/// A line segment between two points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Axis-aligned box spanned by the two endpoints
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_min_max(
            self.start.x.min(self.end.x),
            self.start.y.min(self.end.y),
            self.start.x.max(self.end.x),
            self.start.y.max(self.end.y),
        )
    }

    /// Cross product of this segment's direction with `start -> p`
    fn cross(&self, p: Point) -> f64 {
        let (ax, ay) = (self.end.x - self.start.x, self.end.y - self.start.y);
        let (bx, by) = (p.x - self.start.x, p.y - self.start.y);
        ax * by - bx * ay
    }

    fn is_point_on_line(&self, p: Point) -> bool {
        self.cross(p).abs() < ON_LINE_EPSILON
    }

    fn is_point_right_of_line(&self, p: Point) -> bool {
        self.cross(p) < 0.0
    }

    /// True when `other` touches or crosses the infinite line through `self`
    fn touches_or_crosses_line(&self, other: &Segment) -> bool {
        self.is_point_on_line(other.start)
            || self.is_point_on_line(other.end)
            || (self.is_point_right_of_line(other.start)
                != self.is_point_right_of_line(other.end))
    }
}

/// Edge-inclusive overlap test used for the bounding-box reject step
fn boxes_overlap(a: &BoundingBox, b: &BoundingBox) -> bool {
    a.x <= b.right() && a.right() >= b.x && a.y <= b.bottom() && a.bottom() >= b.y
}

/// Returns true iff the two segments touch or cross.
pub fn segments_intersect(a: &Segment, b: &Segment) -> bool {
    boxes_overlap(&a.bounds(), &b.bounds())
        && a.touches_or_crosses_line(b)
        && b.touches_or_crosses_line(a)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(x1: f64, y1: f64, x2: f64, y2: f64) -> Segment {
        Segment::new(Point::new(x1, y1), Point::new(x2, y2))
    }

    #[test]
    fn test_crossing_segments() {
        assert!(segments_intersect(
            &seg(0.0, 0.0, 10.0, 0.0),
            &seg(5.0, -5.0, 5.0, 5.0)
        ));
    }

    #[test]
    fn test_parallel_segments_do_not_intersect() {
        assert!(!segments_intersect(
            &seg(0.0, 0.0, 10.0, 0.0),
            &seg(0.0, 5.0, 10.0, 5.0)
        ));
    }

    #[test]
    fn test_touching_endpoint_counts() {
        assert!(segments_intersect(
            &seg(0.0, 0.0, 10.0, 0.0),
            &seg(10.0, 0.0, 10.0, 10.0)
        ));
    }

    #[test]
    fn test_extension_of_line_does_not_count() {
        // (20,-5)-(20,5) crosses the infinite x-axis line but not the segment
        assert!(!segments_intersect(
            &seg(0.0, 0.0, 10.0, 0.0),
            &seg(20.0, -5.0, 20.0, 5.0)
        ));
        // boxes overlap, but the second segment stays above the first line
        assert!(!segments_intersect(
            &seg(0.0, 0.0, 10.0, 10.0),
            &seg(0.0, 10.0, 4.0, 6.5)
        ));
    }

    #[test]
    fn test_collinear_overlap() {
        assert!(segments_intersect(
            &seg(0.0, 0.0, 10.0, 0.0),
            &seg(5.0, 0.0, 15.0, 0.0)
        ));
    }
}
