//! Layer outlines and the frame overlap predicates built on them

use crate::model::{Layer, LayerKind};

use super::segment::{segments_intersect, Segment};
use super::transform::RotationTransform;
use super::types::{BoundingBox, Point};

/// Bounds of a layer before rotation is applied
pub fn unrotated_bounds(layer: &Layer) -> BoundingBox {
    match layer.points() {
        Some(points) => BoundingBox::from_points(points.iter().map(|p| p.offset(layer.x, layer.y)))
            .unwrap_or_else(|| BoundingBox::new(layer.x, layer.y, 0.0, 0.0)),
        None => BoundingBox::new(layer.x, layer.y, layer.width, layer.height),
    }
}

fn rotation_of(layer: &Layer) -> RotationTransform {
    RotationTransform::new(layer.angle, unrotated_bounds(layer).center())
}

/// Vertices of the layer's outline in absolute, rotated coordinates.
///
/// Closed shapes return their polygon (rectangles and frames their 4 corners,
/// diamonds and ellipses the 4 edge midpoints); linear and freedraw layers
/// return their polyline.
pub fn layer_outline(layer: &Layer) -> Vec<Point> {
    let rotation = rotation_of(layer);
    if let Some(points) = layer.points() {
        let absolute: Vec<Point> = points.iter().map(|p| p.offset(layer.x, layer.y)).collect();
        return rotation.transform_points(&absolute);
    }

    let bounds = unrotated_bounds(layer);
    let center = bounds.center();
    let vertices = match layer.kind {
        LayerKind::Diamond | LayerKind::Ellipse => vec![
            Point::new(center.x, bounds.y),
            Point::new(bounds.right(), center.y),
            Point::new(center.x, bounds.bottom()),
            Point::new(bounds.x, center.y),
        ],
        _ => bounds.corners().to_vec(),
    };
    rotation.transform_points(&vertices)
}

/// Decompose a layer's outline into line segments
pub fn layer_segments(layer: &Layer) -> Vec<Segment> {
    let outline = layer_outline(layer);
    let mut segments: Vec<Segment> = outline
        .windows(2)
        .map(|pair| Segment::new(pair[0], pair[1]))
        .collect();
    if layer.points().is_none() && outline.len() > 2 {
        segments.push(Segment::new(outline[outline.len() - 1], outline[0]));
    }
    segments
}

/// Axis-aligned bounds of the rotated layer
pub fn layer_bounds(layer: &Layer) -> BoundingBox {
    if layer.points().is_some() {
        return BoundingBox::from_points(layer_outline(layer))
            .unwrap_or_else(|| unrotated_bounds(layer));
    }
    rotation_of(layer).transform_bounds(&unrotated_bounds(layer))
}

/// Union of the bounds of every layer, `None` when there are none
pub fn common_bounds<'a, I>(layers: I) -> Option<BoundingBox>
where
    I: IntoIterator<Item = &'a Layer>,
{
    layers
        .into_iter()
        .map(layer_bounds)
        .reduce(|acc, b| acc.union(&b))
}

/// `inner`'s bounds lie entirely within `outer`'s bounds
pub fn bounds_contained_by(inner: &Layer, outer: &Layer) -> bool {
    layer_bounds(outer).contains_box(&layer_bounds(inner))
}

/// Any outline segment of the layer touches any outline segment of the frame
pub fn layer_intersects_frame(layer: &Layer, frame: &Layer) -> bool {
    let frame_segments = layer_segments(frame);
    let own_segments = layer_segments(layer);
    frame_segments
        .iter()
        .any(|f| own_segments.iter().any(|l| segments_intersect(f, l)))
}

/// The layer is inside the frame, crosses its outline, or encloses it
pub fn overlaps_frame(layer: &Layer, frame: &Layer) -> bool {
    bounds_contained_by(layer, frame)
        || layer_intersects_frame(layer, frame)
        || bounds_contained_by(frame, layer)
}
