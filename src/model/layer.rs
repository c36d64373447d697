//! Layer records: the atomic elements of a canvas document

use std::fmt;

use crate::geometry::Point;

/// Stable, unique layer identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LayerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Group identifier; a group is the implicit set of layers carrying it
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub String);

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GroupId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a reverse binding points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// A text layer whose `container_id` is the owner
    Text,
    /// An arrow whose start or end is attached to the owner
    Arrow,
}

/// Reverse binding stored on the bound-to layer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoundLayer {
    pub id: LayerId,
    pub kind: BindingKind,
}

impl BoundLayer {
    pub fn text(id: impl Into<LayerId>) -> Self {
        Self {
            id: id.into(),
            kind: BindingKind::Text,
        }
    }

    pub fn arrow(id: impl Into<LayerId>) -> Self {
        Self {
            id: id.into(),
            kind: BindingKind::Arrow,
        }
    }
}

/// Kind-specific payload of a layer
#[derive(Debug, Clone, PartialEq)]
pub enum LayerKind {
    Rectangle,
    Diamond,
    Ellipse,
    Image,
    /// Text, optionally bound to a container shape
    Text { container_id: Option<LayerId> },
    /// Polyline; points are relative to the layer's `(x, y)`
    Line { points: Vec<Point> },
    Arrow {
        points: Vec<Point>,
        start_binding: Option<LayerId>,
        end_binding: Option<LayerId>,
    },
    Freedraw { points: Vec<Point> },
    /// Spatial container that clips and owns its members
    Frame { name: Option<String> },
    /// Transient marquee rectangle, never a real document layer
    Selection,
}

impl LayerKind {
    /// Lowercase type name as used in scene files
    pub fn type_name(&self) -> &'static str {
        match self {
            LayerKind::Rectangle => "rectangle",
            LayerKind::Diamond => "diamond",
            LayerKind::Ellipse => "ellipse",
            LayerKind::Image => "image",
            LayerKind::Text { .. } => "text",
            LayerKind::Line { .. } => "line",
            LayerKind::Arrow { .. } => "arrow",
            LayerKind::Freedraw { .. } => "freedraw",
            LayerKind::Frame { .. } => "frame",
            LayerKind::Selection => "selection",
        }
    }
}

/// A single document element.
///
/// Position in the document's layer list is its z-order; there is no separate
/// z-index field.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub id: LayerId,
    pub kind: LayerKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Rotation in radians, clockwise positive
    pub angle: f64,
    /// Group chain, innermost first and outermost last
    pub group_ids: Vec<GroupId>,
    /// Owning frame, `None` for root layers
    pub frame_id: Option<LayerId>,
    pub bound_layers: Vec<BoundLayer>,
    pub is_deleted: bool,
    pub locked: bool,
    /// Update stamp, bumped whenever the layer changes (including its position)
    pub version: u32,
}

impl Layer {
    pub fn new(id: impl Into<LayerId>, kind: LayerKind) -> Self {
        Self {
            id: id.into(),
            kind,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            angle: 0.0,
            group_ids: vec![],
            frame_id: None,
            bound_layers: vec![],
            is_deleted: false,
            locked: false,
            version: 1,
        }
    }

    pub fn rectangle(id: impl Into<LayerId>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(id, LayerKind::Rectangle).with_bounds(x, y, width, height)
    }

    pub fn frame(id: impl Into<LayerId>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(id, LayerKind::Frame { name: None }).with_bounds(x, y, width, height)
    }

    /// Text bound to `container`; the container's reverse binding is not set
    pub fn bound_text(id: impl Into<LayerId>, container: impl Into<LayerId>) -> Self {
        Self::new(
            id,
            LayerKind::Text {
                container_id: Some(container.into()),
            },
        )
    }

    pub fn with_bounds(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.x = x;
        self.y = y;
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = angle;
        self
    }

    /// Set the full group chain (innermost first)
    pub fn with_groups<I, G>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<GroupId>,
    {
        self.group_ids = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn in_frame(mut self, frame: impl Into<LayerId>) -> Self {
        self.frame_id = Some(frame.into());
        self
    }

    pub fn with_bound(mut self, bound: BoundLayer) -> Self {
        self.bound_layers.push(bound);
        self
    }

    pub fn deleted(mut self) -> Self {
        self.is_deleted = true;
        self
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    pub fn is_frame(&self) -> bool {
        matches!(self.kind, LayerKind::Frame { .. })
    }

    /// Container of a bound text layer
    pub fn container_id(&self) -> Option<&LayerId> {
        match &self.kind {
            LayerKind::Text { container_id } => container_id.as_ref(),
            _ => None,
        }
    }

    /// True for text bound to a container
    pub fn is_bound_to_container(&self) -> bool {
        self.container_id().is_some()
    }

    /// Id of the text layer bound to this shape, if any
    pub fn bound_text_id(&self) -> Option<&LayerId> {
        self.bound_layers
            .iter()
            .find(|b| b.kind == BindingKind::Text)
            .map(|b| &b.id)
    }

    /// Relative points of linear and freedraw layers
    pub fn points(&self) -> Option<&[Point]> {
        match &self.kind {
            LayerKind::Line { points }
            | LayerKind::Arrow { points, .. }
            | LayerKind::Freedraw { points } => Some(points),
            _ => None,
        }
    }

    pub fn outermost_group(&self) -> Option<&GroupId> {
        self.group_ids.last()
    }

    pub fn in_group(&self, group_id: &GroupId) -> bool {
        self.group_ids.contains(group_id)
    }

    /// Copy of this layer with the update stamp bumped
    pub fn touched(&self) -> Layer {
        let mut next = self.clone();
        next.version += 1;
        next
    }

    /// Apply a partial update and bump the update stamp
    pub fn mutate(&mut self, update: impl FnOnce(&mut Layer)) {
        update(self);
        self.version += 1;
    }
}
