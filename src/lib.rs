//! Layer Stack - ordering, grouping and frame containment for 2D canvases
//!
//! A document is an ordered list of layers: index 0 paints first, the last
//! index paints on top. This library rewrites that list for the structural
//! edits of a canvas editor (z-order moves, duplication, grouping, alignment)
//! while keeping groups contiguous and frame members directly below their
//! frame.
//!
//! Every operation is a pure function of the current layers and selection.
//! Illegal or empty edits are silent no-ops, reported through
//! [`ActionOutcome::commit`].
//!
//! # Example
//!
//! ```rust
//! use layer_stack::{apply, Action, EngineConfig, Layer, SelectionState, SequentialIds};
//!
//! let layers = vec![
//!     Layer::rectangle("a", 0.0, 0.0, 10.0, 10.0),
//!     Layer::rectangle("b", 20.0, 0.0, 10.0, 10.0),
//! ];
//! let selection = SelectionState::with_layers(["a"]);
//!
//! let outcome = apply(
//!     &layers,
//!     &selection,
//!     Action::BringToFront,
//!     &EngineConfig::default(),
//!     &mut SequentialIds::default(),
//! );
//! assert!(outcome.commit);
//! assert_eq!(outcome.layers[1].id.as_str(), "a");
//! ```

pub mod align;
pub mod config;
pub mod duplicate;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod group;
pub mod model;
pub mod scene;
pub mod selection;
pub mod zorder;

use std::borrow::Cow;
use std::collections::HashSet;

use tracing::{debug, warn};

use frame::update_frame_membership;
use selection::resolve_selected_layers;

pub use align::{align, apply_updates, distribute, AlignPosition, Alignment};
pub use config::EngineConfig;
pub use duplicate::duplicate_selection;
pub use error::{ConfigError, SceneError};
pub use geometry::{Axis, BoundingBox, Point};
pub use group::{group_selection, ungroup_selection};
pub use model::{
    validate_order, BindingKind, BoundLayer, GroupId, IdGenerator, Layer, LayerId, LayerKind,
    OrderViolation, RandomIds, SequentialIds,
};
pub use scene::{format_summary, Scene};
pub use selection::{BoundsQuery, SelectionOptions, SelectionState, SpatialQuery};
pub use zorder::{move_all_left, move_all_right, move_one_left, move_one_right};

/// Result of a structural edit that changed something
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    pub layers: Vec<Layer>,
    pub selection: SelectionState,
}

/// A user-level editing action
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// One step toward the front
    BringForward,
    /// One step toward the back
    SendBackward,
    BringToFront,
    SendToBack,
    Duplicate,
    Group,
    Ungroup,
    Align(Alignment),
    Distribute(Axis),
}

/// Layers and selection after an action
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub layers: Vec<Layer>,
    pub selection: SelectionState,
    /// False when nothing changed and no history entry should be recorded
    pub commit: bool,
}

impl ActionOutcome {
    fn unchanged(layers: &[Layer], selection: &SelectionState) -> Self {
        Self {
            layers: layers.to_vec(),
            selection: selection.clone(),
            commit: false,
        }
    }

    fn from_edit(edit: Option<Edit>, layers: &[Layer], selection: &SelectionState) -> Self {
        match edit {
            Some(edit) => Self {
                layers: edit.layers,
                selection: edit.selection,
                commit: true,
            },
            None => Self::unchanged(layers, selection),
        }
    }

    fn from_order(order: Cow<'_, [Layer]>, selection: &SelectionState) -> Self {
        match order {
            Cow::Borrowed(layers) => Self::unchanged(layers, selection),
            Cow::Owned(layers) => Self {
                layers,
                selection: selection.clone(),
                commit: true,
            },
        }
    }
}

/// Apply one action to the document
pub fn apply(
    layers: &[Layer],
    selection: &SelectionState,
    action: Action,
    config: &EngineConfig,
    ids: &mut dyn IdGenerator,
) -> ActionOutcome {
    let outcome = match action {
        Action::BringForward => ActionOutcome::from_order(move_one_right(layers, selection), selection),
        Action::SendBackward => ActionOutcome::from_order(move_one_left(layers, selection), selection),
        Action::BringToFront => ActionOutcome::from_order(move_all_right(layers, selection), selection),
        Action::SendToBack => ActionOutcome::from_order(move_all_left(layers, selection), selection),
        Action::Duplicate => {
            ActionOutcome::from_edit(duplicate_selection(layers, selection, config, ids), layers, selection)
        }
        Action::Group => ActionOutcome::from_edit(group_selection(layers, selection, ids), layers, selection),
        Action::Ungroup => {
            ActionOutcome::from_edit(ungroup_selection(layers, selection, &BoundsQuery), layers, selection)
        }
        Action::Align(alignment) => {
            rearrange(layers, selection, |selected| align(selected, layers, alignment))
        }
        Action::Distribute(axis) => {
            rearrange(layers, selection, |selected| distribute(selected, layers, axis))
        }
    };

    if outcome.commit {
        debug!(?action, layers = outcome.layers.len(), "applied action");
        if config.check_invariants {
            if let Err(violations) = validate_order(&outcome.layers) {
                for violation in violations {
                    warn!(?action, "{violation}");
                }
            }
        }
    }
    outcome
}

/// Shared path of align and distribute: move, then refit frame membership
fn rearrange<'a>(
    layers: &'a [Layer],
    selection: &SelectionState,
    arrange: impl FnOnce(&[&'a Layer]) -> Vec<Layer>,
) -> ActionOutcome {
    let selected: Vec<&Layer> = resolve_selected_layers(layers, selection, SelectionOptions::default())
        .into_iter()
        .filter(|l| !l.is_deleted)
        .collect();
    if selected.len() < 2 || selected.iter().any(|l| l.is_frame()) {
        return ActionOutcome::unchanged(layers, selection);
    }

    let moved = arrange(&selected);
    if moved.is_empty() {
        return ActionOutcome::unchanged(layers, selection);
    }
    let moved_ids: HashSet<LayerId> = moved.iter().map(|l| l.id.clone()).collect();
    let next = apply_updates(layers, moved);

    ActionOutcome {
        layers: update_frame_membership(&next, &moved_ids),
        selection: selection.clone(),
        commit: true,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn order(layers: &[Layer]) -> Vec<&str> {
        layers.iter().map(|l| l.id.as_str()).collect()
    }

    fn scene() -> Vec<Layer> {
        vec![
            Layer::rectangle("a", 0.0, 0.0, 10.0, 10.0),
            Layer::rectangle("b", 20.0, 5.0, 10.0, 10.0),
            Layer::rectangle("c", 40.0, 0.0, 10.0, 10.0),
        ]
    }

    fn run(layers: &[Layer], selection: &SelectionState, action: Action) -> ActionOutcome {
        apply(
            layers,
            selection,
            action,
            &EngineConfig::default(),
            &mut SequentialIds::new("new"),
        )
    }

    #[test]
    fn test_zorder_actions() {
        let layers = scene();
        let selection = SelectionState::with_layers(["a"]);

        let forward = run(&layers, &selection, Action::BringForward);
        assert!(forward.commit);
        assert_eq!(order(&forward.layers), vec!["b", "a", "c"]);

        let front = run(&layers, &selection, Action::BringToFront);
        assert_eq!(order(&front.layers), vec!["b", "c", "a"]);

        let back = run(&layers, &selection, Action::SendToBack);
        assert!(!back.commit);
        assert_eq!(back.layers, layers);
    }

    #[test]
    fn test_group_then_ungroup() {
        let layers = scene();
        let selection = SelectionState::with_layers(["a", "c"]);

        let grouped = run(&layers, &selection, Action::Group);
        assert!(grouped.commit);
        assert_eq!(order(&grouped.layers), vec!["b", "a", "c"]);
        assert!(grouped.selection.is_group_selected(&"new-1".into()));

        let ungrouped = run(&grouped.layers, &grouped.selection, Action::Ungroup);
        assert!(ungrouped.commit);
        assert!(ungrouped.layers.iter().all(|l| l.group_ids.is_empty()));
        assert!(ungrouped.selection.selected_group_ids.is_empty());
    }

    #[test]
    fn test_duplicate_action() {
        let layers = scene();
        let outcome = run(&layers, &SelectionState::with_layers(["b"]), Action::Duplicate);
        assert!(outcome.commit);
        assert_eq!(order(&outcome.layers), vec!["a", "b", "new-1", "c"]);
        assert!(outcome.selection.is_selected(&"new-1".into()));
    }

    #[test]
    fn test_align_needs_two_layers() {
        let layers = scene();
        let single = run(
            &layers,
            &SelectionState::with_layers(["a"]),
            Action::Align(Alignment::top()),
        );
        assert!(!single.commit);

        let outcome = run(
            &layers,
            &SelectionState::with_layers(["a", "b"]),
            Action::Align(Alignment::top()),
        );
        assert!(outcome.commit);
        assert_eq!(outcome.layers[1].y, 0.0);
        assert_eq!(outcome.layers[1].version, 2);
        assert_eq!(outcome.layers[2].version, 1);
    }

    #[test]
    fn test_align_refuses_frames() {
        let mut layers = scene();
        layers.push(Layer::frame("f", 0.0, 0.0, 100.0, 100.0));
        let outcome = run(
            &layers,
            &SelectionState::with_layers(["a", "f"]),
            Action::Align(Alignment::left()),
        );
        assert!(!outcome.commit);
    }

    #[test]
    fn test_align_detaches_layers_leaving_their_frame() {
        let layers = vec![
            Layer::rectangle("m", 10.0, 10.0, 10.0, 10.0).in_frame("f"),
            Layer::frame("f", 0.0, 0.0, 50.0, 50.0),
            Layer::rectangle("far", 200.0, 10.0, 10.0, 10.0),
        ];
        let outcome = run(
            &layers,
            &SelectionState::with_layers(["m", "far"]),
            Action::Align(Alignment::right()),
        );
        assert!(outcome.commit);
        let m = outcome
            .layers
            .iter()
            .find(|l| l.id.as_str() == "m")
            .expect("Should keep m");
        assert_eq!(m.x, 200.0);
        assert_eq!(m.frame_id, None);
    }

    #[test]
    fn test_distribute_action() {
        let layers = vec![
            Layer::rectangle("a", 0.0, 0.0, 10.0, 10.0),
            Layer::rectangle("b", 15.0, 0.0, 10.0, 10.0),
            Layer::rectangle("c", 90.0, 0.0, 10.0, 10.0),
        ];
        let outcome = run(
            &layers,
            &SelectionState::with_layers(["a", "b", "c"]),
            Action::Distribute(Axis::X),
        );
        assert!(outcome.commit);
        assert_eq!(outcome.layers[1].x, 45.0);
    }
}
