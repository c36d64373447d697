//! Group index and the group/ungroup operations.
//!
//! A layer's `group_ids` chain lists its groups innermost first. Members of a
//! group are expected to be contiguous in document order; every operation in
//! this crate preserves that, and [`members_of_group`] relies on it without
//! checking (see [`crate::model::validate_order`] for an explicit check).

use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::sync::Arc;

use tracing::debug;

use crate::frame::{recompute_members_during_resize, replace_all_in_frame, remove_layers_from_frame};
use crate::model::{GroupId, IdGenerator, Layer, LayerId};
use crate::selection::{
    make_next_selected_ids, resolve_groups_for_selection, resolve_selected_layers, select_group,
    LayerIdSet, SelectionOptions, SelectionState, SpatialQuery,
};
use crate::Edit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum GroupKey<'a> {
    Group(&'a GroupId),
    Single(&'a LayerId),
}

/// Partition `selected` into its coarsest groups.
///
/// Layers sharing an outermost group land in one bucket; ungrouped layers get
/// a bucket of their own. A container's bound text joins the container's
/// bucket, looked up in `all` when it is not part of `selected`.
pub fn maximal_groups<'a>(selected: &[&'a Layer], all: &'a [Layer]) -> Vec<Vec<&'a Layer>> {
    let by_id: HashMap<&LayerId, &'a Layer> = all.iter().map(|l| (&l.id, l)).collect();
    let selected_ids: HashSet<&LayerId> = selected.iter().map(|l| &l.id).collect();

    let mut keys: Vec<GroupKey<'a>> = Vec::new();
    let mut buckets: HashMap<GroupKey<'a>, Vec<&'a Layer>> = HashMap::new();
    let mut placed: HashSet<&LayerId> = HashSet::new();

    for &layer in selected {
        // collected through its container instead
        if layer.container_id().is_some_and(|c| selected_ids.contains(c)) {
            continue;
        }
        if !placed.insert(&layer.id) {
            continue;
        }
        let key = match layer.outermost_group() {
            Some(group_id) => GroupKey::Group(group_id),
            None => GroupKey::Single(&layer.id),
        };
        let bucket = buckets.entry(key).or_insert_with(|| {
            keys.push(key);
            Vec::new()
        });
        bucket.push(layer);

        let text = layer
            .bound_text_id()
            .and_then(|id| by_id.get(id).copied())
            .filter(|t| !t.is_deleted);
        if let Some(text) = text {
            if placed.insert(&text.id) {
                bucket.push(text);
            }
        }
    }

    keys.into_iter().filter_map(|k| buckets.remove(&k)).collect()
}

/// Layers carrying `group_id`, in document order
pub fn members_of_group<'a>(layers: &'a [Layer], group_id: &GroupId) -> Vec<&'a Layer> {
    layers.iter().filter(|l| l.in_group(group_id)).collect()
}

/// Index range spanned by a group's members
pub fn group_range(layers: &[Layer], group_id: &GroupId) -> Option<Range<usize>> {
    let first = layers.iter().position(|l| l.in_group(group_id))?;
    let last = layers.iter().rposition(|l| l.in_group(group_id))?;
    Some(first..last + 1)
}

/// True when some group id is carried by every layer in the set
pub fn all_in_same_group(layers: &[&Layer]) -> bool {
    if layers.is_empty() {
        return false;
    }
    let mut counts: HashMap<&GroupId, usize> = HashMap::new();
    for group_id in layers.iter().flat_map(|l| l.group_ids.iter()) {
        *counts.entry(group_id).or_default() += 1;
    }
    counts.values().any(|&count| count == layers.len())
}

/// Outermost group of the layer that lies inside the edited group
pub fn outermost_group_id<'a>(layer: &'a Layer, editing: Option<&GroupId>) -> Option<&'a GroupId> {
    let mut chain: &[GroupId] = &layer.group_ids;
    if let Some(editing) = editing {
        if let Some(pos) = chain.iter().position(|g| g == editing) {
            chain = &chain[..pos];
        }
    }
    chain.last()
}

/// Insert `new_group` just inside the edited group, or as the outermost group
pub fn add_to_group(group_ids: &[GroupId], new_group: GroupId, editing: Option<&GroupId>) -> Vec<GroupId> {
    let mut next = group_ids.to_vec();
    let at = editing
        .and_then(|e| next.iter().position(|g| g == e))
        .unwrap_or(next.len());
    next.insert(at, new_group);
    next
}

pub fn remove_from_selected_groups(group_ids: &[GroupId], selected: &HashSet<GroupId>) -> Vec<GroupId> {
    group_ids
        .iter()
        .filter(|g| !selected.contains(*g))
        .cloned()
        .collect()
}

/// Remap the groups inside the edited group; the edited group and its
/// ancestors are shared with the copy
pub fn new_group_ids_for_duplication(
    group_ids: &[GroupId],
    editing: Option<&GroupId>,
    mut mapper: impl FnMut(&GroupId) -> GroupId,
) -> Vec<GroupId> {
    let end = editing
        .and_then(|e| group_ids.iter().position(|g| g == e))
        .unwrap_or(group_ids.len());
    group_ids
        .iter()
        .enumerate()
        .map(|(i, g)| if i < end { mapper(g) } else { g.clone() })
        .collect()
}

/// Put the selected layers into a fresh group.
///
/// Returns `None` when there is nothing to do: fewer than two layers are
/// selected, or the selection already is exactly one selected group.
pub fn group_selection(
    layers: &[Layer],
    state: &SelectionState,
    ids: &mut dyn IdGenerator,
) -> Option<Edit> {
    let selected: Vec<&Layer> =
        resolve_selected_layers(layers, state, SelectionOptions::default().with_bound_text());
    if selected.len() < 2 {
        return None;
    }

    if let [only] = state.selected_groups().as_slice() {
        let in_group: HashSet<&LayerId> = members_of_group(layers, only).iter().map(|l| &l.id).collect();
        if selected.iter().all(|l| in_group.contains(&l.id)) {
            return None;
        }
    }

    let selected_ids: HashSet<LayerId> = selected.iter().map(|l| l.id.clone()).collect();
    let frames: HashSet<Option<&LayerId>> = selected.iter().map(|l| l.frame_id.as_ref()).collect();
    let mut next = if frames.len() > 1 {
        remove_layers_from_frame(layers, &selected_ids)
    } else {
        layers.to_vec()
    };

    let group_id = ids.next_group_id();
    for layer in next.iter_mut().filter(|l| selected_ids.contains(&l.id)) {
        let chain = add_to_group(&layer.group_ids, group_id.clone(), state.editing_group_id.as_ref());
        layer.mutate(|l| l.group_ids = chain);
    }

    // members move up to the top-most member, keeping their relative order
    if let Some(range) = group_range(&next, &group_id) {
        let tail = next.split_off(range.end);
        let (members, mut rest): (Vec<Layer>, Vec<Layer>) =
            next.into_iter().partition(|l| l.in_group(&group_id));
        rest.extend(members);
        rest.extend(tail);
        next = rest;
    }

    let live: Vec<Layer> = next.iter().filter(|l| !l.is_deleted).cloned().collect();
    let cleared = SelectionState {
        selected_group_ids: HashSet::new(),
        ..state.clone()
    };
    let selection = select_group(&group_id, &cleared, &live);

    debug!(group = %group_id, members = selected_ids.len(), "grouped selection");
    Some(Edit {
        layers: next,
        selection,
    })
}

/// Dissolve every selected group.
///
/// Group ids are removed by set difference, so outer groups survive. Selected
/// frames re-fit their membership afterwards, since layers freed from a group
/// may no longer belong inside. Returns `None` when no group is selected.
pub fn ungroup_selection<Q: SpatialQuery>(
    layers: &[Layer],
    state: &SelectionState,
    query: &Q,
) -> Option<Edit> {
    if state.selected_group_ids.is_empty() {
        return None;
    }

    let mut next: Vec<Layer> = layers
        .iter()
        .map(|layer| {
            let chain = remove_from_selected_groups(&layer.group_ids, &state.selected_group_ids);
            if chain.len() == layer.group_ids.len() {
                return layer.clone();
            }
            let mut ungrouped = layer.clone();
            ungrouped.mutate(|l| l.group_ids = chain);
            ungrouped
        })
        .collect();

    let live: Vec<Layer> = next.iter().filter(|l| !l.is_deleted).cloned().collect();
    let cleared = SelectionState {
        selected_group_ids: HashSet::new(),
        ..state.clone()
    };
    let mut selection = resolve_groups_for_selection(&cleared, &live, state);

    let frames: Vec<Layer> = resolve_selected_layers(layers, state, SelectionOptions::default())
        .into_iter()
        .filter(|l| l.is_frame())
        .cloned()
        .collect();
    for frame in &frames {
        let members: HashSet<LayerId> = recompute_members_during_resize(frame, &next, state, query)
            .into_iter()
            .map(|l| l.id.clone())
            .collect();
        next = replace_all_in_frame(&next, &members, &frame.id);
    }

    let bound_text: HashSet<&LayerId> = next
        .iter()
        .filter(|l| l.is_bound_to_container())
        .map(|l| &l.id)
        .collect();
    if selection.selected_layer_ids.iter().any(|id| bound_text.contains(id)) {
        let kept: LayerIdSet = selection
            .selected_layer_ids
            .iter()
            .filter(|id| !bound_text.contains(id))
            .cloned()
            .collect();
        selection.selected_layer_ids = make_next_selected_ids(Arc::new(kept), state);
    }

    debug!(groups = state.selected_group_ids.len(), "ungrouped selection");
    Some(Edit {
        layers: next,
        selection,
    })
}
