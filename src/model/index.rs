//! Id lookups over an immutable layer snapshot

use std::collections::HashMap;

use super::layer::{Layer, LayerId};

/// Resolves a layer id to the layer within some document snapshot
pub trait LayerLookup {
    fn layer(&self, id: &LayerId) -> Option<&Layer>;

    /// The frame a layer belongs to, if it exists and is a frame
    fn frame_of(&self, layer: &Layer) -> Option<&Layer> {
        layer
            .frame_id
            .as_ref()
            .and_then(|id| self.layer(id))
            .filter(|f| f.is_frame())
    }
}

impl LayerLookup for HashMap<LayerId, Layer> {
    fn layer(&self, id: &LayerId) -> Option<&Layer> {
        self.get(id)
    }
}

/// Position index over an ordered layer slice
#[derive(Debug, Clone)]
pub struct LayerIndex<'a> {
    layers: &'a [Layer],
    positions: HashMap<&'a LayerId, usize>,
}

impl<'a> LayerIndex<'a> {
    pub fn new(layers: &'a [Layer]) -> Self {
        let positions = layers
            .iter()
            .enumerate()
            .map(|(i, layer)| (&layer.id, i))
            .collect();
        Self { layers, positions }
    }

    /// Position of the layer in document order
    pub fn position(&self, id: &LayerId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn contains(&self, id: &LayerId) -> bool {
        self.positions.contains_key(id)
    }
}

impl LayerLookup for LayerIndex<'_> {
    fn layer(&self, id: &LayerId) -> Option<&Layer> {
        self.position(id).map(|i| &self.layers[i])
    }
}
