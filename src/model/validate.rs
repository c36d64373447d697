//! Structural invariant checks over a layer list.
//!
//! Group contiguity is a precondition of every ordering operation and is not
//! defended against at runtime. This validator exists so callers (and the
//! action facade, when `check_invariants` is enabled) can detect a corrupted
//! document instead of silently producing a wrong order.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use super::index::{LayerIndex, LayerLookup};
use super::layer::{GroupId, Layer, LayerId};

/// A broken structural invariant
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderViolation {
    #[error("layer id '{id}' appears more than once")]
    DuplicateId { id: LayerId },

    /// A live non-member sits between two live members of a group
    #[error("group '{group_id}' is not contiguous: '{intruder}' sits between its members")]
    GroupNotContiguous { group_id: GroupId, intruder: LayerId },

    /// A frame member is not part of the run directly below its frame
    #[error("layer '{member}' is not adjacent to its frame '{frame_id}'")]
    FrameMemberDetached { frame_id: LayerId, member: LayerId },

    #[error("layer '{layer}' references missing frame '{frame_id}'")]
    DanglingFrameReference { layer: LayerId, frame_id: LayerId },

    /// Frames cannot be members of another frame
    #[error("frame '{frame}' is nested in '{parent}'")]
    NestedFrame { frame: LayerId, parent: LayerId },
}

/// Check every structural invariant, returning all violations found
pub fn validate_order(layers: &[Layer]) -> Result<(), Vec<OrderViolation>> {
    let mut violations = Vec::new();
    check_unique_ids(layers, &mut violations);
    check_group_contiguity(layers, &mut violations);
    check_frame_adjacency(layers, &mut violations);

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

fn check_unique_ids(layers: &[Layer], violations: &mut Vec<OrderViolation>) {
    let mut seen = HashSet::new();
    for layer in layers {
        if !seen.insert(&layer.id) {
            violations.push(OrderViolation::DuplicateId {
                id: layer.id.clone(),
            });
        }
    }
}

fn check_group_contiguity(layers: &[Layer], violations: &mut Vec<OrderViolation>) {
    let live: Vec<&Layer> = layers.iter().filter(|l| !l.is_deleted).collect();

    let mut spans: HashMap<&GroupId, (usize, usize)> = HashMap::new();
    for (i, layer) in live.iter().enumerate() {
        for group_id in &layer.group_ids {
            spans
                .entry(group_id)
                .and_modify(|span| span.1 = i)
                .or_insert((i, i));
        }
    }

    let mut groups: Vec<_> = spans.into_iter().collect();
    groups.sort_by(|a, b| a.0.cmp(b.0));
    for (group_id, (first, last)) in groups {
        if let Some(intruder) = live[first..=last].iter().find(|l| !l.in_group(group_id)) {
            violations.push(OrderViolation::GroupNotContiguous {
                group_id: group_id.clone(),
                intruder: intruder.id.clone(),
            });
        }
    }
}

fn check_frame_adjacency(layers: &[Layer], violations: &mut Vec<OrderViolation>) {
    let index = LayerIndex::new(layers);
    let member_of = |layer: &Layer, frame_id: &LayerId| {
        !layer.is_frame() && layer.frame_id.as_ref() == Some(frame_id)
    };

    for (frame_pos, frame) in layers.iter().enumerate().filter(|(_, l)| l.is_frame()) {
        // walk down from the frame while we see its members
        let mut run_start = frame_pos;
        while run_start > 0 && member_of(&layers[run_start - 1], &frame.id) {
            run_start -= 1;
        }
        for (i, layer) in layers.iter().enumerate() {
            if member_of(layer, &frame.id) && !(run_start..frame_pos).contains(&i) {
                violations.push(OrderViolation::FrameMemberDetached {
                    frame_id: frame.id.clone(),
                    member: layer.id.clone(),
                });
            }
        }
    }

    for layer in layers {
        let Some(frame_id) = &layer.frame_id else {
            continue;
        };
        if layer.is_frame() {
            violations.push(OrderViolation::NestedFrame {
                frame: layer.id.clone(),
                parent: frame_id.clone(),
            });
        } else if index.frame_of(layer).is_none() {
            violations.push(OrderViolation::DanglingFrameReference {
                layer: layer.id.clone(),
                frame_id: frame_id.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(id: &str) -> Layer {
        Layer::rectangle(id, 0.0, 0.0, 10.0, 10.0)
    }

    #[test]
    fn test_valid_document() {
        let layers = vec![
            rect("a").with_groups(["g"]),
            rect("b").with_groups(["g"]),
            rect("m").in_frame("f"),
            Layer::frame("f", 0.0, 0.0, 100.0, 100.0),
            rect("c"),
        ];
        assert_eq!(validate_order(&layers), Ok(()));
    }

    #[test]
    fn test_deleted_layers_do_not_break_groups() {
        let layers = vec![
            rect("a").with_groups(["g"]),
            rect("x").deleted(),
            rect("b").with_groups(["g"]),
        ];
        assert_eq!(validate_order(&layers), Ok(()));
    }

    #[test]
    fn test_group_gap_is_reported() {
        let layers = vec![
            rect("a").with_groups(["g"]),
            rect("x"),
            rect("b").with_groups(["g"]),
        ];
        let errors = validate_order(&layers).unwrap_err();
        assert_eq!(
            errors,
            vec![OrderViolation::GroupNotContiguous {
                group_id: "g".into(),
                intruder: "x".into(),
            }]
        );
    }

    #[test]
    fn test_detached_member_and_dangling_frame() {
        let layers = vec![
            rect("m1").in_frame("f"),
            rect("x"),
            rect("m2").in_frame("f"),
            Layer::frame("f", 0.0, 0.0, 100.0, 100.0),
            rect("orphan").in_frame("gone"),
        ];
        let errors = validate_order(&layers).unwrap_err();
        assert!(errors.contains(&OrderViolation::FrameMemberDetached {
            frame_id: "f".into(),
            member: "m1".into(),
        }));
        assert!(errors.contains(&OrderViolation::DanglingFrameReference {
            layer: "orphan".into(),
            frame_id: "gone".into(),
        }));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_duplicate_ids() {
        let layers = vec![rect("a"), rect("a")];
        let errors = validate_order(&layers).unwrap_err();
        assert!(matches!(errors[0], OrderViolation::DuplicateId { .. }));
        assert!(errors[0].to_string().contains("'a'"));
    }

    #[test]
    fn test_nested_frame_is_reported() {
        let layers = vec![
            rect("m").in_frame("inner"),
            Layer::frame("inner", 0.0, 0.0, 50.0, 50.0).in_frame("outer"),
            Layer::frame("outer", 0.0, 0.0, 100.0, 100.0),
        ];
        let errors = validate_order(&layers).unwrap_err();
        assert_eq!(
            errors,
            vec![OrderViolation::NestedFrame {
                frame: "inner".into(),
                parent: "outer".into(),
            }]
        );
    }
}
