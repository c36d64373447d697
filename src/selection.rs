//! Selection resolution: which layers and groups a selection really covers.
//!
//! `SelectionState::selected_layer_ids` is shared behind an `Arc`. Resolvers
//! hand back the previous `Arc` whenever the resolved id set is unchanged, so
//! consumers can skip re-diffing with a cheap `Arc::ptr_eq`.

use std::collections::HashSet;
use std::sync::Arc;

use crate::geometry::{layer_bounds, overlaps_frame, BoundingBox};
use crate::group::outermost_group_id;
use crate::model::{GroupId, Layer, LayerId, LayerIndex, LayerKind, LayerLookup};

pub type LayerIdSet = HashSet<LayerId>;

/// Selection and group-editing state of the editor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    pub selected_layer_ids: Arc<LayerIdSet>,
    /// Groups whose every live member is selected
    pub selected_group_ids: HashSet<GroupId>,
    /// Group currently entered for direct child selection
    pub editing_group_id: Option<GroupId>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selection of the given layer ids, no groups resolved yet
    pub fn with_layers<I, L>(ids: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<LayerId>,
    {
        Self {
            selected_layer_ids: Arc::new(ids.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn with_editing_group(mut self, group_id: impl Into<GroupId>) -> Self {
        self.editing_group_id = Some(group_id.into());
        self
    }

    pub fn with_selected_group(mut self, group_id: impl Into<GroupId>) -> Self {
        self.selected_group_ids.insert(group_id.into());
        self
    }

    pub fn is_selected(&self, id: &LayerId) -> bool {
        self.selected_layer_ids.contains(id)
    }

    pub fn is_group_selected(&self, group_id: &GroupId) -> bool {
        self.selected_group_ids.contains(group_id)
    }

    pub fn is_empty(&self) -> bool {
        self.selected_layer_ids.is_empty()
    }

    /// Selected group ids in a stable order
    pub fn selected_groups(&self) -> Vec<&GroupId> {
        let mut groups: Vec<&GroupId> = self.selected_group_ids.iter().collect();
        groups.sort();
        groups
    }
}

/// Extra layers pulled into a resolved selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionOptions {
    /// Include text bound to a selected container
    pub include_bound_text: bool,
    /// Include the members of selected frames, directly before each frame
    pub include_layers_in_frames: bool,
}

impl SelectionOptions {
    pub fn with_bound_text(mut self) -> Self {
        self.include_bound_text = true;
        self
    }

    pub fn with_layers_in_frames(mut self) -> Self {
        self.include_layers_in_frames = true;
        self
    }
}

/// Return the previous id set when `next` holds exactly the same ids
pub fn make_next_selected_ids(next: Arc<LayerIdSet>, prev: &SelectionState) -> Arc<LayerIdSet> {
    if Arc::ptr_eq(&next, &prev.selected_layer_ids) || *next == *prev.selected_layer_ids {
        Arc::clone(&prev.selected_layer_ids)
    } else {
        next
    }
}

/// Mark a group selected and select all of its live members.
///
/// A group with fewer than two live members cannot be selected: it is
/// dropped from the selected groups and, if it was being edited, editing
/// stops.
pub fn select_group(group_id: &GroupId, state: &SelectionState, layers: &[Layer]) -> SelectionState {
    let members: Vec<&LayerId> = layers
        .iter()
        .filter(|l| !l.is_deleted && l.in_group(group_id))
        .map(|l| &l.id)
        .collect();

    let mut next = state.clone();
    if members.len() < 2 {
        next.selected_group_ids.remove(group_id);
        if next.editing_group_id.as_ref() == Some(group_id) {
            next.editing_group_id = None;
        }
        return next;
    }

    next.selected_group_ids.insert(group_id.clone());
    if !members.iter().all(|id| state.selected_layer_ids.contains(*id)) {
        let mut ids = (*state.selected_layer_ids).clone();
        ids.extend(members.into_iter().cloned());
        next.selected_layer_ids = Arc::new(ids);
    }
    next
}

/// Recompute the selected groups from the selected layers.
///
/// Each selected layer selects the outermost group in its chain that lies
/// inside the group currently being edited. The resulting id set reuses
/// `prev`'s allocation when unchanged.
pub fn resolve_groups_for_selection(
    state: &SelectionState,
    layers: &[Layer],
    prev: &SelectionState,
) -> SelectionState {
    let mut next = SelectionState {
        selected_group_ids: HashSet::new(),
        ..state.clone()
    };

    let selected: Vec<&Layer> = resolve_selected_layers(layers, state, SelectionOptions::default())
        .into_iter()
        .filter(|l| !l.is_deleted)
        .collect();

    if selected.is_empty() {
        next.editing_group_id = None;
    }

    for layer in selected {
        if let Some(group_id) = outermost_group_id(layer, state.editing_group_id.as_ref()) {
            next = select_group(group_id, &next, layers);
        }
    }

    next.selected_layer_ids = make_next_selected_ids(next.selected_layer_ids, prev);
    next
}

/// Groups that a set of layers would select on its own, ignoring the rest of
/// the document
pub fn select_groups_from_given_layers(layers: &[&Layer], state: &SelectionState) -> HashSet<GroupId> {
    let owned: Vec<Layer> = layers.iter().map(|l| (*l).clone()).collect();
    let mut next = SelectionState {
        selected_group_ids: HashSet::new(),
        ..state.clone()
    };
    for layer in layers {
        if let Some(group_id) = outermost_group_id(layer, state.editing_group_id.as_ref()) {
            next = select_group(group_id, &next, &owned);
        }
    }
    next.selected_group_ids
}

/// Resolve the selected layers in document order
pub fn resolve_selected_layers<'a>(
    layers: &'a [Layer],
    state: &SelectionState,
    opts: SelectionOptions,
) -> Vec<&'a Layer> {
    let selected: Vec<&Layer> = layers
        .iter()
        .filter(|layer| {
            state.is_selected(&layer.id)
                || (opts.include_bound_text
                    && layer.container_id().is_some_and(|c| state.is_selected(c)))
        })
        .collect();

    if !opts.include_layers_in_frames {
        return selected;
    }

    // members that are selected alongside their frame come out once
    let mut seen: HashSet<&LayerId> = HashSet::new();
    let mut with_members = Vec::with_capacity(selected.len());
    for layer in selected {
        if layer.is_frame() {
            let members = layers.iter().filter(|l| l.frame_id.as_ref() == Some(&layer.id));
            with_members.extend(members.filter(|l| seen.insert(&l.id)));
        }
        if seen.insert(&layer.id) {
            with_members.push(layer);
        }
    }
    with_members
}

/// Drop layers whose frame is also part of the selection
pub fn exclude_layers_in_frames_from_selection<'a>(selection: &[&'a Layer]) -> Vec<&'a Layer> {
    let frames: HashSet<&LayerId> = selection
        .iter()
        .filter(|l| l.is_frame())
        .map(|l| &l.id)
        .collect();
    selection
        .iter()
        .filter(|l| !l.frame_id.as_ref().is_some_and(|f| frames.contains(f)))
        .copied()
        .collect()
}

/// Selected groups ids in stable order
pub fn selected_group_ids(state: &SelectionState) -> Vec<GroupId> {
    state.selected_groups().into_iter().cloned().collect()
}

/// First selected group in the layer's chain, skipping the edited group
pub fn selected_group_for_layer<'a>(state: &SelectionState, layer: &'a Layer) -> Option<&'a GroupId> {
    layer
        .group_ids
        .iter()
        .filter(|g| state.editing_group_id.as_ref() != Some(*g))
        .find(|g| state.is_group_selected(g))
}

pub fn is_selected_via_group(state: &SelectionState, layer: &Layer) -> bool {
    selected_group_for_layer(state, layer).is_some()
}

/// Enter the first selected group of `layer` and select only that layer
pub fn edit_group_for_layer(state: &SelectionState, layer: &Layer) -> SelectionState {
    let editing = layer
        .group_ids
        .iter()
        .find(|g| state.is_group_selected(g))
        .cloned();
    SelectionState {
        selected_layer_ids: Arc::new(LayerIdSet::from([layer.id.clone()])),
        selected_group_ids: HashSet::new(),
        editing_group_id: editing,
    }
}

/// Spatial query over layer bounds, as used by marquee selection
pub trait SpatialQuery {
    /// Layers whose (frame-clipped) bounds fall within `area`
    fn layers_within<'a>(
        &self,
        layers: &'a [Layer],
        area: &BoundingBox,
        exclude_layers_in_frames: bool,
    ) -> Vec<&'a Layer>;
}

/// Default spatial query: plain bounds containment.
///
/// Locked layers, marquee layers, deleted layers and bound text are never
/// returned. A frame member's bounds are clipped to its frame before
/// comparing, and a member that no longer overlaps its frame is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundsQuery;

impl SpatialQuery for BoundsQuery {
    fn layers_within<'a>(
        &self,
        layers: &'a [Layer],
        area: &BoundingBox,
        exclude_layers_in_frames: bool,
    ) -> Vec<&'a Layer> {
        let index = LayerIndex::new(layers);

        let within: Vec<&Layer> = layers
            .iter()
            .filter(|layer| {
                if layer.is_deleted
                    || layer.locked
                    || matches!(layer.kind, LayerKind::Selection)
                    || layer.is_bound_to_container()
                {
                    return false;
                }
                let mut bounds = layer_bounds(layer);
                if let Some(frame) = index.frame_of(layer) {
                    bounds = bounds.clip_to(&layer_bounds(frame));
                }
                area.contains_box(&bounds)
            })
            .collect();

        let within = if exclude_layers_in_frames {
            exclude_layers_in_frames_from_selection(&within)
        } else {
            within
        };

        within
            .into_iter()
            .filter(|layer| match index.frame_of(layer) {
                Some(frame) => overlaps_frame(layer, frame),
                None => true,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(id: &str) -> Layer {
        Layer::rectangle(id, 0.0, 0.0, 10.0, 10.0)
    }

    fn ids(layers: &[&Layer]) -> Vec<String> {
        layers.iter().map(|l| l.id.to_string()).collect()
    }

    #[test]
    fn test_select_group_unions_members() {
        let layers = vec![rect("a").with_groups(["g"]), rect("b").with_groups(["g"]), rect("c")];
        let state = SelectionState::with_layers(["a"]);
        let next = select_group(&"g".into(), &state, &layers);
        assert!(next.is_group_selected(&"g".into()));
        assert!(next.is_selected(&"b".into()));
        assert!(!next.is_selected(&"c".into()));
    }

    #[test]
    fn test_select_degenerate_group_toggles_off() {
        let layers = vec![rect("a").with_groups(["g"]), rect("b").with_groups(["g"]).deleted()];
        let state = SelectionState::with_layers(["a"])
            .with_selected_group("g")
            .with_editing_group("g");
        let next = select_group(&"g".into(), &state, &layers);
        assert!(!next.is_group_selected(&"g".into()));
        assert_eq!(next.editing_group_id, None);
        assert!(Arc::ptr_eq(&next.selected_layer_ids, &state.selected_layer_ids));
    }

    #[test]
    fn test_resolve_stops_at_editing_group() {
        let layers = vec![
            rect("a").with_groups(["inner", "outer"]),
            rect("b").with_groups(["inner", "outer"]),
            rect("c").with_groups(["outer"]),
        ];
        let state = SelectionState::with_layers(["a"]).with_editing_group("outer");
        let next = resolve_groups_for_selection(&state, &layers, &state);
        assert_eq!(selected_group_ids(&next), vec![GroupId::from("inner")]);
        assert!(next.is_selected(&"b".into()));
        assert!(!next.is_selected(&"c".into()));
        assert_eq!(next.editing_group_id, Some("outer".into()));
    }

    #[test]
    fn test_resolve_with_empty_selection_stops_editing() {
        let layers = vec![rect("a").with_groups(["g"]), rect("b").with_groups(["g"])];
        let state = SelectionState::new().with_editing_group("g");
        let next = resolve_groups_for_selection(&state, &layers, &state);
        assert_eq!(next.editing_group_id, None);
    }

    #[test]
    fn test_bound_text_and_frame_members_are_included() {
        let layers = vec![
            rect("box").with_bound(crate::model::BoundLayer::text("label")),
            Layer::bound_text("label", "box"),
            rect("m").in_frame("f"),
            Layer::frame("f", 0.0, 0.0, 100.0, 100.0),
        ];
        let state = SelectionState::with_layers(["box", "f"]);

        let plain = resolve_selected_layers(&layers, &state, SelectionOptions::default());
        assert_eq!(ids(&plain), vec!["box", "f"]);

        let opts = SelectionOptions::default().with_bound_text().with_layers_in_frames();
        let full = resolve_selected_layers(&layers, &state, opts);
        assert_eq!(ids(&full), vec!["box", "label", "m", "f"]);
    }

    #[test]
    fn test_member_selected_with_its_frame_is_listed_once() {
        let layers = vec![
            rect("m1").in_frame("f"),
            rect("m2").in_frame("f"),
            Layer::frame("f", 0.0, 0.0, 100.0, 100.0),
        ];
        let state = SelectionState::with_layers(["m1", "f"]);
        let opts = SelectionOptions::default().with_layers_in_frames();
        let full = resolve_selected_layers(&layers, &state, opts);
        assert_eq!(ids(&full), vec!["m1", "m2", "f"]);
    }

    #[test]
    fn test_exclude_members_of_selected_frames() {
        let frame = Layer::frame("f", 0.0, 0.0, 100.0, 100.0);
        let member = rect("m").in_frame("f");
        let other = rect("o");
        let result = exclude_layers_in_frames_from_selection(&[&frame, &member, &other]);
        assert_eq!(ids(&result), vec!["f", "o"]);
    }

    #[test]
    fn test_selected_group_for_layer_skips_editing_group() {
        let layer = rect("a").with_groups(["inner", "outer"]);
        let state = SelectionState::new()
            .with_selected_group("outer")
            .with_editing_group("outer");
        assert_eq!(selected_group_for_layer(&state, &layer), None);

        assert!(!is_selected_via_group(&state, &layer));

        let state = SelectionState::new().with_selected_group("outer");
        assert_eq!(selected_group_for_layer(&state, &layer), Some(&"outer".into()));
        assert!(is_selected_via_group(&state, &layer));
    }

    #[test]
    fn test_edit_group_for_layer() {
        let layer = rect("a").with_groups(["g"]);
        let state = SelectionState::with_layers(["a", "b"]).with_selected_group("g");
        let next = edit_group_for_layer(&state, &layer);
        assert_eq!(next.editing_group_id, Some("g".into()));
        assert_eq!(next.selected_layer_ids.len(), 1);
        assert!(next.selected_group_ids.is_empty());
    }

    #[test]
    fn test_bounds_query_filters() {
        let layers = vec![
            rect("plain"),
            rect("locked").locked(),
            Layer::new("marquee", LayerKind::Selection).with_bounds(0.0, 0.0, 5.0, 5.0),
            Layer::bound_text("label", "plain").with_bounds(1.0, 1.0, 2.0, 2.0),
            Layer::rectangle("far", 500.0, 500.0, 5.0, 5.0),
        ];
        let area = BoundingBox::new(-1.0, -1.0, 50.0, 50.0);
        let found = BoundsQuery.layers_within(&layers, &area, true);
        assert_eq!(ids(&found), vec!["plain"]);
    }

    #[test]
    fn test_bounds_query_clips_members_to_frame() {
        let layers = vec![
            // sticks out of the frame, but only the clipped part counts
            Layer::rectangle("m", 50.0, 50.0, 100.0, 10.0).in_frame("f"),
            Layer::frame("f", 0.0, 0.0, 100.0, 100.0),
        ];
        let area = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        let found = BoundsQuery.layers_within(&layers, &area, false);
        assert_eq!(ids(&found), vec!["m", "f"]);

        let found = BoundsQuery.layers_within(&layers, &area, true);
        assert_eq!(ids(&found), vec!["f"]);
    }
}
