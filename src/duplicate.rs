//! Duplication of the selection, keeping groups, captions and frames whole.
//!
//! Clones are emitted directly above their originals. A layer that belongs to
//! a group, carries bound text, or is a frame is duplicated together with the
//! rest of its unit, so a partial selection never splits a group.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::config::EngineConfig;
use crate::frame::members_of;
use crate::group::{members_of_group, new_group_ids_for_duplication, outermost_group_id};
use crate::model::{GroupId, IdGenerator, Layer, LayerId, LayerKind};
use crate::selection::{
    exclude_layers_in_frames_from_selection, resolve_groups_for_selection, resolve_selected_layers,
    selected_group_for_layer, LayerIdSet, SelectionOptions, SelectionState,
};
use crate::Edit;

/// Clone factory shared by every unit in one duplication
struct Cloner<'c> {
    ids: &'c mut dyn IdGenerator,
    editing: Option<GroupId>,
    offset: f64,
    group_map: HashMap<GroupId, GroupId>,
    id_map: HashMap<LayerId, LayerId>,
    clones: Vec<LayerId>,
}

impl Cloner<'_> {
    fn duplicate(&mut self, layer: &Layer) -> Layer {
        let mut copy = layer.clone();
        copy.id = self.ids.next_layer_id();
        copy.x += self.offset;
        copy.y += self.offset;
        copy.version = 1;

        let ids = &mut *self.ids;
        let group_map = &mut self.group_map;
        copy.group_ids = new_group_ids_for_duplication(&layer.group_ids, self.editing.as_ref(), |g| {
            group_map
                .entry(g.clone())
                .or_insert_with(|| ids.next_group_id())
                .clone()
        });

        self.id_map.insert(layer.id.clone(), copy.id.clone());
        self.clones.push(copy.id.clone());
        copy
    }

    /// Originals not emitted yet, followed by clones of layers not cloned yet
    fn duplicate_unit<'a>(&mut self, unit: &[&'a Layer], emitted: &mut HashSet<&'a LayerId>) -> Vec<Layer> {
        let mut out = Vec::with_capacity(unit.len() * 2);
        for &layer in unit {
            if emitted.insert(&layer.id) {
                out.push(layer.clone());
            }
        }
        for &layer in unit {
            if layer.is_deleted || self.id_map.contains_key(&layer.id) {
                continue;
            }
            let copy = self.duplicate(layer);
            out.push(copy);
        }
        out
    }
}

/// Duplicate the selection.
///
/// Returns `None` when nothing is selected. The new selection holds the
/// clones, minus bound text and minus layers whose frame was cloned too.
pub fn duplicate_selection(
    layers: &[Layer],
    state: &SelectionState,
    config: &EngineConfig,
    ids: &mut dyn IdGenerator,
) -> Option<Edit> {
    let opts = SelectionOptions::default().with_bound_text().with_layers_in_frames();
    let to_duplicate: HashSet<&LayerId> = resolve_selected_layers(layers, state, opts)
        .into_iter()
        .map(|l| &l.id)
        .collect();
    if to_duplicate.is_empty() {
        return None;
    }

    let by_id: HashMap<&LayerId, &Layer> = layers.iter().map(|l| (&l.id, l)).collect();
    let mut cloner = Cloner {
        ids,
        editing: state.editing_group_id.clone(),
        offset: config.duplicate_offset(),
        group_map: HashMap::new(),
        id_map: HashMap::new(),
        clones: Vec::new(),
    };

    let mut emitted: HashSet<&LayerId> = HashSet::new();
    let mut next: Vec<Layer> = Vec::with_capacity(layers.len() + to_duplicate.len());

    for layer in layers {
        if emitted.contains(&layer.id) {
            continue;
        }
        if !to_duplicate.contains(&layer.id) {
            emitted.insert(&layer.id);
            next.push(layer.clone());
            continue;
        }
        // emitted with its container
        if layer.container_id().is_some_and(|c| to_duplicate.contains(c)) {
            continue;
        }

        let frame = layer.frame_id.as_ref().filter(|f| to_duplicate.contains(f));
        let group = selected_group_for_layer(state, layer)
            .or_else(|| outermost_group_id(layer, state.editing_group_id.as_ref()))
            // a group only carries a framed member if the frame is in the group too
            .filter(|g| frame.map_or(true, |f| by_id.get(f).is_some_and(|f| f.in_group(g))));

        let unit: Vec<&Layer> = if let Some(group_id) = group {
            let mut unit = Vec::new();
            for member in members_of_group(layers, group_id) {
                if member.is_frame() {
                    unit.extend(members_of(&member.id, layers));
                }
                unit.push(member);
            }
            unit
        } else if frame.is_some() {
            // comes along with its frame
            continue;
        } else if layer.is_frame() {
            let mut unit = members_of(&layer.id, layers);
            unit.push(layer);
            unit
        } else {
            vec![layer]
        };

        let unit = with_bound_text(unit, &by_id);
        next.extend(cloner.duplicate_unit(&unit, &mut emitted));
    }

    let Cloner { id_map, clones, .. } = cloner;
    let clone_ids: HashSet<&LayerId> = clones.iter().collect();
    for layer in next.iter_mut().filter(|l| clone_ids.contains(&l.id)) {
        rebind_clone(layer, &id_map);
    }

    let selected: LayerIdSet = {
        let cloned: Vec<&Layer> = next.iter().filter(|l| clone_ids.contains(&l.id)).collect();
        exclude_layers_in_frames_from_selection(&cloned)
            .into_iter()
            .filter(|l| !l.is_bound_to_container() && !l.is_deleted)
            .map(|l| l.id.clone())
            .collect()
    };

    let live: Vec<Layer> = next.iter().filter(|l| !l.is_deleted).cloned().collect();
    let candidate = SelectionState {
        selected_layer_ids: Arc::new(selected),
        selected_group_ids: HashSet::new(),
        editing_group_id: state.editing_group_id.clone(),
    };
    let selection = resolve_groups_for_selection(&candidate, &live, state);

    debug!(clones = clones.len(), "duplicated selection");
    Some(Edit {
        layers: next,
        selection,
    })
}

/// The unit plus any bound text of its containers that it does not list yet
fn with_bound_text<'a>(mut unit: Vec<&'a Layer>, by_id: &HashMap<&LayerId, &'a Layer>) -> Vec<&'a Layer> {
    let listed: HashSet<&LayerId> = unit.iter().map(|l| &l.id).collect();
    let missing: Vec<&'a Layer> = unit
        .iter()
        .filter_map(|l| l.bound_text_id())
        .filter(|id| !listed.contains(id))
        .filter_map(|id| by_id.get(id).copied())
        .collect();
    unit.extend(missing);
    unit
}

/// Point a clone's references at other clones wherever the target was
/// duplicated in the same pass.
///
/// Reverse bindings only survive when the bound layer was cloned as well,
/// since an original never points back at the clone.
fn rebind_clone(layer: &mut Layer, id_map: &HashMap<LayerId, LayerId>) {
    let remap = |id: &LayerId| id_map.get(id).cloned().unwrap_or_else(|| id.clone());

    layer.bound_layers.retain_mut(|bound| match id_map.get(&bound.id) {
        Some(copy) => {
            bound.id = copy.clone();
            true
        }
        None => false,
    });
    match &mut layer.kind {
        // a caption whose container stayed behind is left unbound
        LayerKind::Text { container_id } => {
            *container_id = container_id.as_ref().and_then(|c| id_map.get(c).cloned());
        }
        LayerKind::Arrow {
            start_binding,
            end_binding,
            ..
        } => {
            *start_binding = start_binding.as_ref().map(remap);
            *end_binding = end_binding.as_ref().map(remap);
        }
        _ => {}
    }
    layer.frame_id = layer.frame_id.as_ref().map(remap);
}
