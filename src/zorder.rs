//! Z-order engine: bring forward, send backward, bring to front, send to back.
//!
//! "Left" is toward the back of the stack (index 0), "right" toward the front.
//! The document is split into scopes before anything moves: one root scope
//! plus one scope per live frame holding that frame's members. Each scope is
//! reordered on its own and the scopes are reassembled with every frame's
//! members directly below the frame, so frame adjacency survives any move.
//!
//! Every operation returns [`Cow::Borrowed`] when nothing moved, which callers
//! treat as "nothing to record".

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use crate::model::{GroupId, Layer, LayerId, LayerIndex, LayerLookup};
use crate::selection::{resolve_selected_layers, SelectionOptions, SelectionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    ByOne,
    ToEnd,
}

/// Move the selection one step toward the back
pub fn move_one_left<'a>(layers: &'a [Layer], state: &SelectionState) -> Cow<'a, [Layer]> {
    shift(layers, state, Direction::Left, Mode::ByOne)
}

/// Move the selection one step toward the front
pub fn move_one_right<'a>(layers: &'a [Layer], state: &SelectionState) -> Cow<'a, [Layer]> {
    shift(layers, state, Direction::Right, Mode::ByOne)
}

/// Send the selection to the back of its scope
pub fn move_all_left<'a>(layers: &'a [Layer], state: &SelectionState) -> Cow<'a, [Layer]> {
    shift(layers, state, Direction::Left, Mode::ToEnd)
}

/// Bring the selection to the front of its scope
pub fn move_all_right<'a>(layers: &'a [Layer], state: &SelectionState) -> Cow<'a, [Layer]> {
    shift(layers, state, Direction::Right, Mode::ToEnd)
}

/// Everything a scope-level shift needs besides the scope itself
struct ShiftContext<'s, 'a> {
    state: &'s SelectionState,
    selected: &'s HashSet<&'a LayerId>,
    index: &'s LayerIndex<'a>,
    direction: Direction,
    /// Set when shifting the members of this frame
    frame: Option<&'a LayerId>,
}

fn shift<'a>(
    layers: &'a [Layer],
    state: &SelectionState,
    direction: Direction,
    mode: Mode,
) -> Cow<'a, [Layer]> {
    if state.is_empty() {
        return Cow::Borrowed(layers);
    }

    let index = LayerIndex::new(layers);
    let opts = SelectionOptions::default().with_bound_text().with_layers_in_frames();
    let selected: HashSet<&LayerId> = resolve_selected_layers(layers, state, opts)
        .into_iter()
        .map(|l| &l.id)
        .collect();

    let (mut root, mut frame_scopes) = partition_scopes(layers, &index);
    let mut moved: HashSet<&LayerId> = HashSet::new();

    let ctx = ShiftContext {
        state,
        selected: &selected,
        index: &index,
        direction,
        frame: None,
    };
    moved.extend(shift_scope(mode, &mut root, &ctx));

    for (frame_id, scope) in frame_scopes.iter_mut() {
        // a selected frame moves as a unit in the root scope
        if selected.contains(frame_id) {
            continue;
        }
        let ctx = ShiftContext {
            frame: Some(*frame_id),
            ..ctx
        };
        moved.extend(shift_scope(mode, scope, &ctx));
    }

    if moved.is_empty() {
        return Cow::Borrowed(layers);
    }
    debug!(?direction, moved = moved.len(), "reordered layers");

    let mut next = Vec::with_capacity(layers.len());
    for layer in root {
        if layer.is_frame() {
            if let Some(members) = frame_scopes.remove(&layer.id) {
                next.extend(members.into_iter().map(|m| restamp(m, &moved)));
            }
        }
        next.push(restamp(layer, &moved));
    }
    Cow::Owned(next)
}

/// Reorder one scope in place, returning the layers that moved
fn shift_scope<'a>(mode: Mode, scope: &mut [&'a Layer], ctx: &ShiftContext<'_, 'a>) -> Vec<&'a LayerId> {
    match mode {
        Mode::ByOne => shift_by_one(scope, ctx),
        Mode::ToEnd => shift_to_end(scope, ctx),
    }
}

fn restamp(layer: &Layer, moved: &HashSet<&LayerId>) -> Layer {
    if moved.contains(&layer.id) {
        layer.touched()
    } else {
        layer.clone()
    }
}

/// Split into the root scope and one scope per live frame.
///
/// Layers pointing at a missing or deleted frame are promoted to the root.
/// Frames never nest: a frame that names another frame stays in the root,
/// so every frame scope is reassembled next to a frame found in the root.
fn partition_scopes<'a>(
    layers: &'a [Layer],
    index: &LayerIndex<'a>,
) -> (Vec<&'a Layer>, HashMap<&'a LayerId, Vec<&'a Layer>>) {
    let mut root = Vec::new();
    let mut frames: HashMap<&'a LayerId, Vec<&'a Layer>> = HashMap::new();
    for layer in layers {
        let frame_id = layer
            .frame_id
            .as_ref()
            .filter(|_| !layer.is_frame())
            .filter(|_| index.frame_of(layer).is_some_and(|f| !f.is_deleted));
        match frame_id {
            Some(frame_id) => frames.entry(frame_id).or_default().push(layer),
            None => root.push(layer),
        }
    }
    (root, frames)
}

/// Positions of the selected layers in the scope.
///
/// Deleted layers directly above a selected layer travel with it, but only
/// once another selected layer follows them.
fn indices_to_move(scope: &[&Layer], selected: &HashSet<&LayerId>) -> Vec<usize> {
    let mut indices = Vec::new();
    let mut pending_deleted = Vec::new();
    let mut admit_deleted_at = None;

    for (i, layer) in scope.iter().enumerate() {
        if selected.contains(&layer.id) {
            indices.append(&mut pending_deleted);
            indices.push(i);
            admit_deleted_at = Some(i + 1);
        } else if layer.is_deleted && admit_deleted_at == Some(i) {
            pending_deleted.push(i);
            admit_deleted_at = Some(i + 1);
        } else {
            pending_deleted.clear();
        }
    }
    indices
}

/// Maximal runs of consecutive indices, as inclusive `(first, last)` pairs
fn contiguous_runs(indices: &[usize]) -> Vec<(usize, usize)> {
    let mut runs: Vec<(usize, usize)> = Vec::new();
    for &i in indices {
        match runs.last_mut() {
            Some((_, last)) if *last + 1 == i => *last = i,
            _ => runs.push((i, i)),
        }
    }
    runs
}

fn shift_by_one<'a>(scope: &mut [&'a Layer], ctx: &ShiftContext<'_, 'a>) -> Vec<&'a LayerId> {
    let indices = indices_to_move(scope, ctx.selected);
    let mut runs = contiguous_runs(&indices);
    if ctx.direction == Direction::Right {
        runs.reverse();
    }

    let mut moved = Vec::new();
    for (leading, trailing) in runs {
        let boundary = match ctx.direction {
            Direction::Left => leading,
            Direction::Right => trailing,
        };
        let Some(target) = target_index(scope, boundary, ctx) else {
            continue;
        };
        let len = trailing - leading + 1;
        match ctx.direction {
            Direction::Left if target < leading => scope[target..=trailing].rotate_right(len),
            Direction::Right if target > trailing => scope[leading..=target].rotate_left(len),
            _ => continue,
        }
        trace!(leading, trailing, target, "shifted run");

        let run = match ctx.direction {
            Direction::Left => target..target + len,
            Direction::Right => target + 1 - len..target + 1,
        };
        moved.extend(scope[run].iter().map(|l| &l.id));
    }
    moved
}

/// Index the run at `boundary` should move to, `None` when it cannot move.
fn target_index(scope: &[&Layer], boundary: usize, ctx: &ShiftContext<'_, '_>) -> Option<usize> {
    let source = scope[boundary];
    let editing = ctx.state.editing_group_id.as_ref();
    let legal = |layer: &Layer| {
        !layer.is_deleted && (ctx.frame.is_some() || editing.map_or(true, |g| layer.in_group(g)))
    };

    let candidate = match ctx.direction {
        Direction::Left => (0..boundary).rev().find(|&i| legal(scope[i]))?,
        Direction::Right => (boundary + 1..scope.len()).find(|&i| legal(scope[i]))?,
    };
    let next = scope[candidate];

    if let Some(editing) = editing {
        if source.group_ids == next.group_ids {
            return binding_target(scope, candidate, ctx);
        }
        if !next.in_group(editing) {
            return None;
        }
    }

    if next.group_ids.is_empty() {
        return binding_target(scope, candidate, ctx);
    }

    let sibling_group: Option<&GroupId> = match editing {
        Some(editing) => next
            .group_ids
            .iter()
            .position(|g| g == editing)
            .and_then(|pos| pos.checked_sub(1))
            .map(|pos| &next.group_ids[pos]),
        None => next.outermost_group(),
    };
    let Some(sibling_group) = sibling_group else {
        return Some(candidate);
    };

    let edge = match ctx.direction {
        Direction::Left => scope.iter().position(|l| l.in_group(sibling_group)),
        Direction::Right => scope.iter().rposition(|l| l.in_group(sibling_group)),
    };
    Some(edge.unwrap_or(candidate))
}

/// Adjust a free candidate so a container and its bound text are never split
fn binding_target(scope: &[&Layer], candidate: usize, ctx: &ShiftContext<'_, '_>) -> Option<usize> {
    let next = scope[candidate];
    let partner = match (ctx.direction, next.container_id(), next.bound_text_id()) {
        (Direction::Left, Some(container), _) => container,
        (Direction::Right, None, Some(text)) => text,
        _ => return Some(candidate),
    };
    if !ctx.index.contains(partner) {
        return Some(candidate);
    }
    // a partner living in another scope blocks the move
    scope.iter().position(|l| &l.id == partner)
}

fn shift_to_end<'a>(scope: &mut [&'a Layer], ctx: &ShiftContext<'_, 'a>) -> Vec<&'a LayerId> {
    let mut indices = indices_to_move(scope, ctx.selected);
    if indices.is_empty() {
        return Vec::new();
    }

    let bounds = match &ctx.state.editing_group_id {
        Some(group_id) => {
            let first = scope.iter().position(|l| l.in_group(group_id));
            let last = scope.iter().rposition(|l| l.in_group(group_id));
            match first.zip(last) {
                Some(bounds) => bounds,
                None => return Vec::new(),
            }
        }
        None => (0, scope.len() - 1),
    };
    indices.retain(|&i| i >= bounds.0 && i <= bounds.1);
    let (Some(&first_moving), Some(&last_moving)) = (indices.first(), indices.last()) else {
        return Vec::new();
    };

    let (start, end) = match ctx.direction {
        Direction::Left => (bounds.0, last_moving),
        Direction::Right => (first_moving, bounds.1),
    };

    let moving: HashSet<usize> = indices.iter().copied().collect();
    let (targets, displaced): (Vec<(usize, &'a Layer)>, Vec<(usize, &'a Layer)>) = scope[start..=end]
        .iter()
        .copied()
        .enumerate()
        .partition(|(offset, _)| moving.contains(&(start + offset)));
    let targets: Vec<&'a Layer> = targets.into_iter().map(|(_, l)| l).collect();
    let displaced = displaced.into_iter().map(|(_, l)| l);

    let reordered: Vec<&'a Layer> = match ctx.direction {
        Direction::Left => targets.iter().copied().chain(displaced).collect(),
        Direction::Right => displaced.chain(targets.iter().copied()).collect(),
    };
    let unchanged = reordered
        .iter()
        .zip(&scope[start..=end])
        .all(|(a, b)| a.id == b.id);
    if unchanged {
        return Vec::new();
    }

    trace!(start, end, moving = targets.len(), "shifted to end");
    scope[start..=end].copy_from_slice(&reordered);
    targets.into_iter().map(|l| &l.id).collect()
}
