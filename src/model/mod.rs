//! Document model: layers, ids and lookups
//!
//! The document is an ordered list of layers. Index 0 paints first (bottom),
//! the last index paints last (top). Every structural index in this crate is
//! derived from that single order.

pub mod ids;
pub mod index;
pub mod layer;
pub mod validate;

pub use ids::{IdGenerator, RandomIds, SequentialIds};
pub use index::{LayerIndex, LayerLookup};
pub use layer::{BindingKind, BoundLayer, GroupId, Layer, LayerId, LayerKind};
pub use validate::{validate_order, OrderViolation};
