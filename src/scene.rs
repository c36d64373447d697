//! Scene files: a layer list plus selection, stored as TOML.
//!
//! ```toml
//! [selection]
//! layers = ["a"]
//!
//! [[layers]]
//! id = "a"
//! type = "rectangle"
//! x = 0.0
//! y = 0.0
//! width = 10.0
//! height = 10.0
//! groups = ["g1"]
//! ```
//!
//! Layers are listed back to front. Reverse bindings (a container's bound
//! text, a shape's arrows) are derived from the text `container` and arrow
//! `start`/`end` keys and never written by hand.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::Path;

use serde::Deserialize;

use crate::error::SceneError;
use crate::geometry::Point;
use crate::model::{BoundLayer, GroupId, Layer, LayerId, LayerKind};
use crate::selection::{resolve_groups_for_selection, SelectionState};

/// A loaded scene
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub layers: Vec<Layer>,
    pub selection: SelectionState,
}

/// TOML structure for deserializing scenes
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlScene {
    #[serde(default)]
    selection: TomlSelection,
    #[serde(default)]
    layers: Vec<TomlLayer>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlSelection {
    #[serde(default)]
    layers: Vec<String>,
    editing_group: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlLayer {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default)]
    width: f64,
    #[serde(default)]
    height: f64,
    /// Degrees, clockwise
    #[serde(default)]
    angle: f64,
    #[serde(default)]
    groups: Vec<String>,
    frame: Option<String>,
    container: Option<String>,
    #[serde(default)]
    points: Vec<[f64; 2]>,
    start: Option<String>,
    end: Option<String>,
    name: Option<String>,
    #[serde(default)]
    deleted: bool,
    #[serde(default)]
    locked: bool,
}

impl TomlLayer {
    fn into_layer(self) -> Result<Layer, SceneError> {
        let points = || -> Vec<Point> { self.points.iter().map(|[x, y]| Point::new(*x, *y)).collect() };
        let kind = match self.kind.as_str() {
            "rectangle" => LayerKind::Rectangle,
            "diamond" => LayerKind::Diamond,
            "ellipse" => LayerKind::Ellipse,
            "image" => LayerKind::Image,
            "text" => LayerKind::Text {
                container_id: self.container.as_deref().map(LayerId::from),
            },
            "line" => LayerKind::Line { points: points() },
            "arrow" => LayerKind::Arrow {
                points: points(),
                start_binding: self.start.as_deref().map(LayerId::from),
                end_binding: self.end.as_deref().map(LayerId::from),
            },
            "freedraw" => LayerKind::Freedraw { points: points() },
            "frame" => LayerKind::Frame {
                name: self.name.clone(),
            },
            "selection" => LayerKind::Selection,
            other => return Err(SceneError::unknown_type(&self.id, other)),
        };

        let mut layer = Layer::new(self.id.as_str(), kind)
            .with_bounds(self.x, self.y, self.width, self.height)
            .with_angle(self.angle.to_radians())
            .with_groups(self.groups.iter().map(|g| GroupId::new(g.as_str())));
        layer.frame_id = self.frame.as_deref().map(LayerId::from);
        layer.is_deleted = self.deleted;
        layer.locked = self.locked;
        Ok(layer)
    }
}

/// Fill in each layer's reverse bindings from the forward references
fn derive_bindings(layers: &mut [Layer]) {
    let mut bindings: Vec<(LayerId, BoundLayer)> = Vec::new();
    for layer in layers.iter() {
        match &layer.kind {
            LayerKind::Text {
                container_id: Some(container),
            } => bindings.push((container.clone(), BoundLayer::text(layer.id.clone()))),
            LayerKind::Arrow {
                start_binding,
                end_binding,
                ..
            } => {
                for target in [start_binding, end_binding].into_iter().flatten() {
                    bindings.push((target.clone(), BoundLayer::arrow(layer.id.clone())));
                }
            }
            _ => {}
        }
    }
    for (target, bound) in bindings {
        if let Some(layer) = layers.iter_mut().find(|l| l.id == target) {
            if !layer.bound_layers.contains(&bound) {
                layer.bound_layers.push(bound);
            }
        }
    }
}

impl Scene {
    /// Load a scene from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, SceneError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load a scene from a TOML string
    pub fn from_str(content: &str) -> Result<Self, SceneError> {
        let parsed: TomlScene = toml::from_str(content)?;

        let mut seen = HashSet::new();
        let mut layers = Vec::with_capacity(parsed.layers.len());
        for layer in parsed.layers {
            if !seen.insert(layer.id.clone()) {
                return Err(SceneError::duplicate(layer.id));
            }
            layers.push(layer.into_layer()?);
        }
        derive_bindings(&mut layers);

        let mut scene = Scene {
            layers,
            selection: SelectionState::new(),
        };
        scene.selection = scene.select(
            parsed.selection.layers.as_slice(),
            parsed.selection.editing_group.as_deref(),
        )?;
        Ok(scene)
    }

    /// Selection of `ids` as a click would produce it: selecting one member
    /// of a group selects the whole group, unless that group is being edited
    pub fn select<S: AsRef<str>>(
        &self,
        ids: &[S],
        editing_group: Option<&str>,
    ) -> Result<SelectionState, SceneError> {
        for id in ids {
            if !self.layers.iter().any(|l| l.id.as_str() == id.as_ref()) {
                return Err(SceneError::unknown_selection(id.as_ref()));
            }
        }
        let mut state = SelectionState::with_layers(ids.iter().map(|id| id.as_ref()));
        state.editing_group_id = editing_group.map(GroupId::from);

        let live: Vec<Layer> = self.layers.iter().filter(|l| !l.is_deleted).cloned().collect();
        Ok(resolve_groups_for_selection(&state, &live, &state))
    }
}

/// Human-readable listing of a layer order and selection
pub fn format_summary(layers: &[Layer], selection: &SelectionState) -> String {
    let mut out = String::from("layers (back to front):\n");
    for layer in layers {
        let _ = write!(out, "  {} {}", layer.id, layer.kind.type_name());
        if !layer.group_ids.is_empty() {
            let chain: Vec<&str> = layer.group_ids.iter().map(|g| g.as_str()).collect();
            let _ = write!(out, " groups={}", chain.join(">"));
        }
        if let Some(frame_id) = &layer.frame_id {
            let _ = write!(out, " frame={frame_id}");
        }
        if layer.is_deleted {
            out.push_str(" deleted");
        }
        out.push('\n');
    }

    let mut selected: Vec<&str> = selection.selected_layer_ids.iter().map(|id| id.as_str()).collect();
    selected.sort_unstable();
    let groups: Vec<&str> = selection.selected_groups().into_iter().map(|g| g.as_str()).collect();
    let _ = writeln!(out, "selected layers: {}", or_dash(&selected));
    let _ = writeln!(out, "selected groups: {}", or_dash(&groups));
    let _ = write!(
        out,
        "editing group: {}",
        selection.editing_group_id.as_ref().map_or("-", |g| g.as_str())
    );
    out
}

fn or_dash(items: &[&str]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}
