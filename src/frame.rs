//! Frame containment: which layers a frame owns, and keeping them in place.
//!
//! Membership is a pure derived view (`frame_id` back-references) and is
//! never cached across mutations. Every operation that changes membership
//! also restores the ordering invariant: a frame's members occupy the
//! contiguous run directly below the frame layer.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::geometry::{
    bounds_contained_by, common_bounds, layer_bounds, layer_intersects_frame, overlaps_frame,
};
use crate::group::members_of_group;
use crate::model::{GroupId, Layer, LayerId, LayerIndex, LayerLookup};
use crate::selection::{select_groups_from_given_layers, SelectionState, SpatialQuery};

/// Layers whose `frame_id` is `frame_id`, in document order
pub fn members_of<'a>(frame_id: &LayerId, layers: &'a [Layer]) -> Vec<&'a Layer> {
    layers
        .iter()
        .filter(|l| l.frame_id.as_ref() == Some(frame_id))
        .collect()
}

/// The frame layer referenced by `layer.frame_id`, if it exists
pub fn owning_frame<'a, L: LayerLookup>(layer: &Layer, lookup: &'a L) -> Option<&'a Layer> {
    lookup.frame_of(layer)
}

/// Members of every frame, keyed by frame id
pub fn frame_children_map(layers: &[Layer]) -> HashMap<&LayerId, Vec<&Layer>> {
    let mut map: HashMap<&LayerId, Vec<&Layer>> = HashMap::new();
    for layer in layers {
        if let Some(frame_id) = &layer.frame_id {
            map.entry(frame_id).or_default().push(layer);
        }
    }
    map
}

/// Drop every layer that shares a group with a frame in `layers`
pub fn omit_groups_containing_frames<'a>(layers: &[&'a Layer]) -> Vec<&'a Layer> {
    let rejected: HashSet<&GroupId> = layers
        .iter()
        .filter(|l| l.is_frame())
        .flat_map(|l| l.group_ids.iter())
        .collect();
    layers
        .iter()
        .filter(|l| !l.group_ids.iter().any(|g| rejected.contains(g)))
        .copied()
        .collect()
}

/// The combined bounds of `layers` fit inside the frame
pub fn layers_in_frame_bounds(layers: &[&Layer], frame: &Layer) -> bool {
    match common_bounds(layers.iter().copied()) {
        Some(bounds) => layer_bounds(frame).contains_box(&bounds),
        None => false,
    }
}

/// The layer's bounds enclose the whole frame
pub fn is_layer_containing_frame(layer: &Layer, frame: &Layer) -> bool {
    bounds_contained_by(frame, layer)
}

/// Live non-frame layers that are inside, crossing or enclosing the frame
pub fn layers_overlapping_frame<'a>(layers: &'a [Layer], frame: &Layer) -> Vec<&'a Layer> {
    layers
        .iter()
        .filter(|l| !l.is_deleted && !l.is_frame() && overlaps_frame(l, frame))
        .collect()
}

/// Layers entirely inside the frame that are free to join it.
///
/// Frames never join other frames, and layers already owned by a different
/// frame stay where they are.
pub fn layers_fully_inside<'a, Q: SpatialQuery>(
    frame: &Layer,
    layers: &'a [Layer],
    query: &Q,
) -> Vec<&'a Layer> {
    let within = query.layers_within(layers, &layer_bounds(frame), false);
    omit_groups_containing_frames(&within)
        .into_iter()
        .filter(|l| {
            (!l.is_frame() && l.frame_id.is_none()) || l.frame_id.as_ref() == Some(&frame.id)
        })
        .collect()
}

/// Recompute a frame's members after its bounds changed.
///
/// Single layers that stop overlapping the frame leave it; grouped layers stay
/// as long as a group-mate still overlaps, so a drag never splits a group
/// across the frame edge. A group that newly fits entirely inside the frame is
/// admitted as a whole. Bound text is never returned; it follows its
/// container.
pub fn recompute_members_during_resize<'a, Q: SpatialQuery>(
    frame: &Layer,
    layers: &'a [Layer],
    state: &SelectionState,
    query: &Q,
) -> Vec<&'a Layer> {
    let prev_members: Vec<&Layer> = members_of(&frame.id, layers)
        .into_iter()
        .filter(|l| !l.is_deleted)
        .collect();
    let mut next_members: HashSet<&LayerId> = prev_members.iter().map(|l| &l.id).collect();

    let mut completely_inside = layers_fully_inside(frame, layers, query);
    for member in &prev_members {
        if is_layer_containing_frame(member, frame)
            && !completely_inside.iter().any(|l| l.id == member.id)
        {
            completely_inside.push(member);
        }
    }
    let completely_ids: HashSet<&LayerId> = completely_inside.iter().map(|l| &l.id).collect();

    let partially_inside: Vec<&Layer> = prev_members
        .iter()
        .filter(|l| !completely_ids.contains(&l.id))
        .copied()
        .collect();

    let mut groups_to_keep: HashSet<&GroupId> = completely_inside
        .iter()
        .flat_map(|l| l.group_ids.iter())
        .collect();

    for layer in &partially_inside {
        if !layer_intersects_frame(layer, frame) {
            if layer.group_ids.is_empty() {
                next_members.remove(&layer.id);
            }
        } else {
            groups_to_keep.extend(layer.group_ids.iter());
        }
    }

    for layer in &partially_inside {
        if !layer.group_ids.is_empty() && !layer.group_ids.iter().any(|g| groups_to_keep.contains(g)) {
            next_members.remove(&layer.id);
        }
    }

    let (single, grouped): (Vec<&Layer>, Vec<&Layer>) = completely_inside
        .iter()
        .copied()
        .partition(|l| l.group_ids.is_empty());
    next_members.extend(single.iter().map(|l| &l.id));

    let live: Vec<Layer> = layers.iter().filter(|l| !l.is_deleted).cloned().collect();
    let mut new_groups: Vec<GroupId> = select_groups_from_given_layers(&grouped, state)
        .into_iter()
        .collect();
    new_groups.sort();
    let mut admitted: HashSet<LayerId> = HashSet::new();
    for group_id in &new_groups {
        let group_members = members_of_group(&live, group_id);
        if layers_in_frame_bounds(&group_members, frame) {
            admitted.extend(group_members.iter().map(|l| l.id.clone()));
        }
    }

    layers
        .iter()
        .filter(|l| next_members.contains(&l.id) || admitted.contains(&l.id))
        .filter(|l| !l.is_bound_to_container())
        .collect()
}

/// Move every member of `frame_id` to sit directly below the frame
fn restore_frame_adjacency(layers: Vec<Layer>, frame_id: &LayerId) -> Vec<Layer> {
    let Some(frame_pos) = layers.iter().position(|l| l.is_frame() && &l.id == frame_id) else {
        return layers;
    };
    let (mut members, rest): (Vec<(usize, Layer)>, Vec<(usize, Layer)>) = layers
        .into_iter()
        .enumerate()
        .partition(|(_, l)| l.frame_id.as_ref() == Some(frame_id));
    members.sort_by_key(|(i, _)| *i);

    let mut result = Vec::with_capacity(members.len() + rest.len());
    let mut members = Some(members);
    for (i, layer) in rest {
        if i == frame_pos {
            if let Some(members) = members.take() {
                result.extend(members.into_iter().map(|(_, l)| l));
            }
        }
        result.push(layer);
    }
    result
}

/// Add layers to a frame.
///
/// Frames, layers owned by another frame, and layers grouped with a frame
/// are skipped. Text bound to an added container joins with it. The new
/// members are moved to sit directly below the frame.
pub fn add_layers_to_frame(
    layers: &[Layer],
    to_add: &HashSet<LayerId>,
    frame_id: &LayerId,
) -> Vec<Layer> {
    let candidates: Vec<&Layer> = layers.iter().filter(|l| to_add.contains(&l.id)).collect();
    let mut joining: HashSet<LayerId> = HashSet::new();
    for layer in omit_groups_containing_frames(&candidates) {
        if layer.is_frame() || layer.frame_id.as_ref().is_some_and(|f| f != frame_id) {
            continue;
        }
        if layer.frame_id.as_ref() != Some(frame_id) {
            joining.insert(layer.id.clone());
        }
        if let Some(text_id) = layer.bound_text_id() {
            joining.insert(text_id.clone());
        }
    }

    let next: Vec<Layer> = layers
        .iter()
        .map(|layer| {
            if joining.contains(&layer.id) && layer.frame_id.as_ref() != Some(frame_id) {
                let mut joined = layer.clone();
                joined.mutate(|l| l.frame_id = Some(frame_id.clone()));
                joined
            } else {
                layer.clone()
            }
        })
        .collect();

    debug!(frame = %frame_id, added = joining.len(), "added layers to frame");
    restore_frame_adjacency(next, frame_id)
}

/// Detach layers (and their bound text) from whatever frame owns them.
///
/// Detached layers are placed directly below their former frame's remaining
/// members so that the remaining members stay contiguous.
pub fn remove_layers_from_frame(layers: &[Layer], to_remove: &HashSet<LayerId>) -> Vec<Layer> {
    let frames: HashSet<&LayerId> = layers.iter().filter(|l| l.is_frame()).map(|l| &l.id).collect();
    let index = LayerIndex::new(layers);

    let mut removing: HashSet<&LayerId> = HashSet::new();
    for layer in layers.iter().filter(|l| to_remove.contains(&l.id) && l.frame_id.is_some()) {
        removing.insert(&layer.id);
        let bound_text = layer.bound_text_id().and_then(|text_id| index.layer(text_id));
        if let Some(text) = bound_text.filter(|t| t.frame_id.is_some()) {
            removing.insert(&text.id);
        }
    }

    // detached layers grouped by the frame they are leaving
    let mut detached: HashMap<&LayerId, Vec<Layer>> = HashMap::new();
    let mut stay_in_place: HashSet<&LayerId> = HashSet::new();
    for layer in layers.iter().filter(|l| removing.contains(&l.id)) {
        let Some(frame_id) = &layer.frame_id else {
            continue;
        };
        let mut freed = layer.clone();
        freed.mutate(|l| l.frame_id = None);
        if frames.contains(frame_id) {
            detached.entry(frame_id).or_default().push(freed);
        } else {
            stay_in_place.insert(&layer.id);
        }
    }

    let mut result = Vec::with_capacity(layers.len());
    for layer in layers {
        if removing.contains(&layer.id) {
            if stay_in_place.contains(&layer.id) {
                let mut freed = layer.clone();
                freed.mutate(|l| l.frame_id = None);
                result.push(freed);
            }
            continue;
        }
        let run_of = if layer.is_frame() {
            Some(&layer.id)
        } else {
            layer.frame_id.as_ref()
        };
        if let Some(freed) = run_of.and_then(|f| detached.remove(f)) {
            result.extend(freed);
        }
        result.push(layer.clone());
    }

    debug!(removed = removing.len(), "removed layers from frames");
    result
}

/// Detach every member of a frame
pub fn remove_all_from_frame(layers: &[Layer], frame_id: &LayerId) -> Vec<Layer> {
    let members: HashSet<LayerId> = members_of(frame_id, layers)
        .into_iter()
        .map(|l| l.id.clone())
        .collect();
    remove_layers_from_frame(layers, &members)
}

/// Replace a frame's membership with exactly `members`
pub fn replace_all_in_frame(
    layers: &[Layer],
    members: &HashSet<LayerId>,
    frame_id: &LayerId,
) -> Vec<Layer> {
    let current: HashSet<LayerId> = members_of(frame_id, layers)
        .into_iter()
        .map(|l| l.id.clone())
        .collect();
    let leaving: HashSet<LayerId> = current.difference(members).cloned().collect();
    let next = remove_layers_from_frame(layers, &leaving);
    add_layers_to_frame(&next, members, frame_id)
}

/// Detach moved layers that ended up outside their frame.
///
/// A grouped layer stays while a group-mate in the same frame still overlaps
/// the frame.
pub fn update_frame_membership(layers: &[Layer], moved: &HashSet<LayerId>) -> Vec<Layer> {
    let index = LayerIndex::new(layers);
    let leaving: HashSet<LayerId> = layers
        .iter()
        .filter(|l| moved.contains(&l.id) && !l.is_frame() && !l.is_bound_to_container())
        .filter(|l| match index.frame_of(l) {
            Some(frame) => !still_in_frame(l, frame, layers),
            None => false,
        })
        .map(|l| l.id.clone())
        .collect();
    if leaving.is_empty() {
        return layers.to_vec();
    }
    debug!(leaving = leaving.len(), "layers moved out of their frames");
    remove_layers_from_frame(layers, &leaving)
}

fn still_in_frame(layer: &Layer, frame: &Layer, layers: &[Layer]) -> bool {
    if overlaps_frame(layer, frame) {
        return true;
    }
    layer.outermost_group().is_some_and(|group_id| {
        members_of(&frame.id, layers)
            .into_iter()
            .any(|m| m.in_group(group_id) && overlaps_frame(m, frame))
    })
}
