//! Geometry used to decide frame overlap and to align layers

pub mod outline;
pub mod segment;
pub mod transform;
pub mod types;

pub use outline::{
    bounds_contained_by, common_bounds, layer_bounds, layer_intersects_frame, layer_segments,
    overlaps_frame,
};
pub use segment::{segments_intersect, Segment, ON_LINE_EPSILON};
pub use transform::RotationTransform;
pub use types::{Axis, BoundingBox, Point};
