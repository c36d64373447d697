//! Alignment and distribution of the selection.
//!
//! Both work on maximal groups: a group moves as one rigid block, and a
//! container's bound text moves with it. Only coordinates change; order,
//! groups and frame membership are untouched here.

use std::collections::HashMap;

use tracing::debug;

use crate::geometry::{common_bounds, Axis, BoundingBox};
use crate::group::maximal_groups;
use crate::model::{Layer, LayerId};

/// Which edge (or the midpoint) to line up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlignPosition {
    Start,
    Center,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Alignment {
    pub axis: Axis,
    pub position: AlignPosition,
}

impl Alignment {
    pub fn new(axis: Axis, position: AlignPosition) -> Self {
        Self { axis, position }
    }

    pub fn left() -> Self {
        Self::new(Axis::X, AlignPosition::Start)
    }

    pub fn right() -> Self {
        Self::new(Axis::X, AlignPosition::End)
    }

    pub fn top() -> Self {
        Self::new(Axis::Y, AlignPosition::Start)
    }

    pub fn bottom() -> Self {
        Self::new(Axis::Y, AlignPosition::End)
    }

    pub fn horizontal_center() -> Self {
        Self::new(Axis::X, AlignPosition::Center)
    }

    pub fn vertical_center() -> Self {
        Self::new(Axis::Y, AlignPosition::Center)
    }
}

fn mid(bounds: &BoundingBox, axis: Axis) -> f64 {
    (bounds.min(axis) + bounds.max(axis)) / 2.0
}

fn translated(group: &[&Layer], axis: Axis, delta: f64) -> Vec<Layer> {
    if delta == 0.0 {
        return Vec::new();
    }
    group
        .iter()
        .map(|layer| {
            let mut moved = (*layer).clone();
            moved.mutate(|l| match axis {
                Axis::X => l.x += delta,
                Axis::Y => l.y += delta,
            });
            moved
        })
        .collect()
}

/// Align every maximal group in `selected` against the selection's bounds.
///
/// Returns the moved layers only; apply them with [`apply_updates`].
pub fn align(selected: &[&Layer], all: &[Layer], alignment: Alignment) -> Vec<Layer> {
    let Some(selection_bounds) = common_bounds(selected.iter().copied()) else {
        return Vec::new();
    };
    let axis = alignment.axis;

    let moved: Vec<Layer> = maximal_groups(selected, all)
        .iter()
        .flat_map(|group| {
            let Some(bounds) = common_bounds(group.iter().copied()) else {
                return Vec::new();
            };
            let delta = match alignment.position {
                AlignPosition::Start => selection_bounds.min(axis) - bounds.min(axis),
                AlignPosition::End => selection_bounds.max(axis) - bounds.max(axis),
                AlignPosition::Center => mid(&selection_bounds, axis) - mid(&bounds, axis),
            };
            translated(group, axis, delta)
        })
        .collect();

    debug!(?alignment, moved = moved.len(), "aligned selection");
    moved
}

/// Spread the maximal groups in `selected` evenly along `axis`.
///
/// Groups keep their sort order by midpoint. The outermost groups stay put
/// and the gaps between neighbours are made equal; when the groups overlap
/// too much for positive gaps, their midpoints are spaced evenly instead.
pub fn distribute(selected: &[&Layer], all: &[Layer], axis: Axis) -> Vec<Layer> {
    let Some(bounds) = common_bounds(selected.iter().copied()) else {
        return Vec::new();
    };
    let mut groups: Vec<(Vec<&Layer>, BoundingBox)> = maximal_groups(selected, all)
        .into_iter()
        .filter_map(|group| {
            let group_bounds = common_bounds(group.iter().copied())?;
            Some((group, group_bounds))
        })
        .collect();
    if groups.len() < 2 {
        return Vec::new();
    }
    groups.sort_by(|a, b| mid(&a.1, axis).total_cmp(&mid(&b.1, axis)));

    let span: f64 = groups.iter().map(|(_, b)| b.extent(axis)).sum();
    let step = (bounds.extent(axis) - span) / (groups.len() - 1) as f64;

    let mut moved = Vec::new();
    if step < 0.0 {
        let first = position_of_extreme(&groups, |b| b.min(axis), |a, b| a < b);
        let last = position_of_extreme(&groups, |b| b.max(axis), |a, b| a > b);
        let center_step = (mid(&groups[last].1, axis) - mid(&groups[first].1, axis))
            / (groups.len() - 1) as f64;
        let mut pos = mid(&groups[first].1, axis);
        for (i, (group, group_bounds)) in groups.iter().enumerate() {
            if i == first || i == last {
                continue;
            }
            pos += center_step;
            moved.extend(translated(group, axis, pos - mid(group_bounds, axis)));
        }
    } else {
        let mut pos = bounds.min(axis);
        for (group, group_bounds) in &groups {
            moved.extend(translated(group, axis, pos - group_bounds.min(axis)));
            pos += step + group_bounds.extent(axis);
        }
    }

    debug!(?axis, moved = moved.len(), "distributed selection");
    moved
}

/// Index of the first group whose edge is the most extreme
fn position_of_extreme(
    groups: &[(Vec<&Layer>, BoundingBox)],
    edge: impl Fn(&BoundingBox) -> f64,
    better: impl Fn(f64, f64) -> bool,
) -> usize {
    let mut best = 0;
    for (i, (_, bounds)) in groups.iter().enumerate().skip(1) {
        if better(edge(bounds), edge(&groups[best].1)) {
            best = i;
        }
    }
    best
}

/// Replace layers by id with their updated versions, keeping document order
pub fn apply_updates(layers: &[Layer], updates: Vec<Layer>) -> Vec<Layer> {
    let mut updates: HashMap<LayerId, Layer> = updates.into_iter().map(|l| (l.id.clone(), l)).collect();
    layers
        .iter()
        .map(|layer| updates.remove(&layer.id).unwrap_or_else(|| layer.clone()))
        .collect()
}
