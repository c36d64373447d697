//! Property tests: reordering and duplication never break group contiguity
//! or frame adjacency

use proptest::prelude::*;
use proptest::sample::Index;

use layer_stack::selection::resolve_groups_for_selection;
use layer_stack::{
    duplicate_selection, move_all_left, move_all_right, move_one_left, move_one_right,
    validate_order, BoundLayer, EngineConfig, GroupId, Layer, LayerId, SelectionState, SequentialIds,
};

/// One building block of a generated document
#[derive(Debug, Clone, Copy)]
enum Slot {
    Free,
    Deleted,
    /// A group of 2 or 3 layers; with 3 the first two form an inner group
    Group(usize),
    /// A box with bound text right above it
    Captioned,
    /// A frame with that many members, grouped together when there are two
    /// or more
    Frame(usize),
}

fn slot() -> impl Strategy<Value = Slot> {
    prop_oneof![
        Just(Slot::Free),
        Just(Slot::Deleted),
        (2usize..4).prop_map(Slot::Group),
        Just(Slot::Captioned),
        (0usize..4).prop_map(Slot::Frame),
    ]
}

fn rect(id: String) -> Layer {
    Layer::rectangle(LayerId::new(id), 0.0, 0.0, 10.0, 10.0)
}

/// Layers in document order plus every group id they use
fn build_layers(slots: &[Slot]) -> (Vec<Layer>, Vec<GroupId>) {
    let mut layers = Vec::new();
    let mut groups = Vec::new();
    for (i, slot) in slots.iter().enumerate() {
        match *slot {
            Slot::Free => layers.push(rect(format!("r{i}"))),
            Slot::Deleted => layers.push(rect(format!("d{i}")).deleted()),
            Slot::Group(size) => {
                let outer = GroupId::new(format!("g{i}"));
                let inner = GroupId::new(format!("g{i}in"));
                for j in 0..size {
                    let chain = if size == 3 && j < 2 {
                        vec![inner.clone(), outer.clone()]
                    } else {
                        vec![outer.clone()]
                    };
                    layers.push(rect(format!("g{i}m{j}")).with_groups(chain));
                }
                if size == 3 {
                    groups.push(inner);
                }
                groups.push(outer);
            }
            Slot::Captioned => {
                let text = LayerId::new(format!("t{i}"));
                let container = LayerId::new(format!("b{i}"));
                layers.push(rect(format!("b{i}")).with_bound(BoundLayer::text(text.clone())));
                layers.push(Layer::bound_text(text, container));
            }
            Slot::Frame(members) => {
                let frame_id = LayerId::new(format!("f{i}"));
                let group = GroupId::new(format!("fg{i}"));
                for j in 0..members {
                    let mut member = rect(format!("f{i}m{j}")).in_frame(frame_id.clone());
                    if members >= 2 {
                        member = member.with_groups([group.clone()]);
                    }
                    layers.push(member);
                }
                if members >= 2 {
                    groups.push(group);
                }
                layers.push(Layer::frame(frame_id, 0.0, 0.0, 100.0, 100.0));
            }
        }
    }
    (layers, groups)
}

/// A selection the editor could produce: picked layers stay inside the
/// edited group, and groups are resolved the way a click would resolve them
fn select(layers: &[Layer], mask: &[bool], editing: Option<GroupId>) -> SelectionState {
    let picked = layers
        .iter()
        .zip(mask.iter().cycle())
        .filter(|(layer, selected)| **selected && editing.as_ref().map_or(true, |g| layer.in_group(g)))
        .map(|(layer, _)| layer.id.clone());
    let mut state = SelectionState::with_layers(picked);
    if let Some(group) = editing {
        state = state.with_editing_group(group);
    }
    resolve_groups_for_selection(&state, layers, &state)
}

fn pick_group(groups: &[GroupId], editing: Option<Index>) -> Option<GroupId> {
    editing
        .filter(|_| !groups.is_empty())
        .map(|index| index.get(groups).clone())
}

fn sorted_ids(layers: &[Layer]) -> Vec<String> {
    let mut ids: Vec<String> = layers.iter().map(|l| l.id.to_string()).collect();
    ids.sort();
    ids
}

proptest! {
    #[test]
    fn moves_keep_groups_and_frames_intact(
        slots in prop::collection::vec(slot(), 1..8),
        mask in prop::collection::vec(any::<bool>(), 1..16),
        editing in prop::option::of(any::<Index>()),
        op in 0usize..4,
    ) {
        let (layers, groups) = build_layers(&slots);
        prop_assert_eq!(validate_order(&layers), Ok(()));
        let state = select(&layers, &mask, pick_group(&groups, editing));

        let next = match op {
            0 => move_one_left(&layers, &state),
            1 => move_one_right(&layers, &state),
            2 => move_all_left(&layers, &state),
            _ => move_all_right(&layers, &state),
        };

        prop_assert_eq!(validate_order(&next), Ok(()));
        prop_assert_eq!(sorted_ids(&next), sorted_ids(&layers));
    }

    #[test]
    fn move_all_converges(
        slots in prop::collection::vec(slot(), 1..8),
        mask in prop::collection::vec(any::<bool>(), 1..16),
        editing in prop::option::of(any::<Index>()),
        to_front in any::<bool>(),
    ) {
        let (layers, groups) = build_layers(&slots);
        let state = select(&layers, &mask, pick_group(&groups, editing));
        let once = if to_front {
            move_all_right(&layers, &state).into_owned()
        } else {
            move_all_left(&layers, &state).into_owned()
        };
        let twice = if to_front {
            move_all_right(&once, &state)
        } else {
            move_all_left(&once, &state)
        };
        prop_assert_eq!(&twice[..], &once[..]);
    }

    #[test]
    fn duplication_keeps_groups_and_frames_intact(
        slots in prop::collection::vec(slot(), 1..8),
        mask in prop::collection::vec(any::<bool>(), 1..16),
        editing in prop::option::of(any::<Index>()),
    ) {
        let (layers, groups) = build_layers(&slots);
        let state = select(&layers, &mask, pick_group(&groups, editing));
        let mut ids = SequentialIds::new("copy");

        if let Some(edit) = duplicate_selection(&layers, &state, &EngineConfig::default(), &mut ids) {
            prop_assert_eq!(validate_order(&edit.layers), Ok(()));
            for layer in &layers {
                let copies = edit.layers.iter().filter(|l| l.id == layer.id).count();
                prop_assert_eq!(copies, 1);
            }
        }
    }
}
