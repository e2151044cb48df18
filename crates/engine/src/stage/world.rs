use std::sync::Arc;

use crate::program::Look;
use crate::resources::DecodedImage;

use super::graph::{SceneGraph, SpriteId, BACKGROUND_LAYER};

#[derive(Debug, Clone)]
struct RenderNode {
    layer: f64,
    current_look: Option<Look>,
    displayed_image: Option<Arc<DecodedImage>>,
}

#[derive(Debug, Clone)]
struct StageSprite {
    id: SpriteId,
    name: String,
    background: bool,
    node: Option<RenderNode>,
}

/// In-memory scene graph.
///
/// Normal sprites with a render node always hold the layers `0..N`; a sprite
/// entering the stage is placed on top and a sprite leaving it closes the gap.
#[derive(Debug, Default)]
pub struct StageWorld {
    sprites: Vec<StageSprite>,
}

impl StageWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a sprite and makes it live. Returns `false` if the id is
    /// already taken.
    pub fn add_sprite(&mut self, id: SpriteId, name: impl Into<String>, background: bool) -> bool {
        if self.find(id).is_some() {
            return false;
        }
        self.sprites.push(StageSprite {
            id,
            name: name.into(),
            background,
            node: None,
        });
        self.attach_render_node(id)
    }

    pub fn remove_sprite(&mut self, id: SpriteId) -> bool {
        if !self.detach_render_node(id) && self.find(id).is_none() {
            return false;
        }
        self.sprites.retain(|sprite| sprite.id != id);
        true
    }

    /// Gives an existing sprite a render node on the top layer.
    pub fn attach_render_node(&mut self, id: SpriteId) -> bool {
        let top = self.normal_object_count() as f64;
        let Some(sprite) = self.find_mut(id) else {
            return false;
        };
        if sprite.node.is_some() {
            return false;
        }
        let layer = if sprite.background {
            BACKGROUND_LAYER
        } else {
            top
        };
        sprite.node = Some(RenderNode {
            layer,
            current_look: None,
            displayed_image: None,
        });
        true
    }

    /// Drops a sprite's render node and shifts every normal sprite above it
    /// down by one.
    pub fn detach_render_node(&mut self, id: SpriteId) -> bool {
        let Some(sprite) = self.find_mut(id) else {
            return false;
        };
        let background = sprite.background;
        let Some(node) = sprite.node.take() else {
            return false;
        };
        if !background {
            for other in &mut self.sprites {
                if other.background {
                    continue;
                }
                if let Some(other_node) = other.node.as_mut() {
                    if other_node.layer > node.layer {
                        other_node.layer -= 1.0;
                    }
                }
            }
        }
        true
    }

    pub fn sprite_name(&self, id: SpriteId) -> Option<&str> {
        self.find(id).map(|sprite| sprite.name.as_str())
    }

    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }

    /// Live sprites ordered back to front.
    pub fn draw_order(&self) -> Vec<(SpriteId, f64)> {
        let mut order = self
            .sprites
            .iter()
            .filter_map(|sprite| sprite.node.as_ref().map(|node| (sprite.id, node.layer)))
            .collect::<Vec<_>>();
        order.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        order
    }

    fn find(&self, id: SpriteId) -> Option<&StageSprite> {
        self.sprites.iter().find(|sprite| sprite.id == id)
    }

    fn find_mut(&mut self, id: SpriteId) -> Option<&mut StageSprite> {
        self.sprites.iter_mut().find(|sprite| sprite.id == id)
    }

    fn node(&self, id: SpriteId) -> Option<&RenderNode> {
        self.find(id).and_then(|sprite| sprite.node.as_ref())
    }

    fn node_mut(&mut self, id: SpriteId) -> Option<&mut RenderNode> {
        self.find_mut(id).and_then(|sprite| sprite.node.as_mut())
    }
}

impl SceneGraph for StageWorld {
    fn sprite_ids(&self) -> Vec<SpriteId> {
        self.sprites.iter().map(|sprite| sprite.id).collect()
    }

    fn normal_object_count(&self) -> usize {
        self.sprites
            .iter()
            .filter(|sprite| !sprite.background && sprite.node.is_some())
            .count()
    }

    fn is_background(&self, sprite: SpriteId) -> bool {
        self.find(sprite).is_some_and(|sprite| sprite.background)
    }

    fn layer(&self, sprite: SpriteId) -> Option<f64> {
        self.node(sprite).map(|node| node.layer)
    }

    fn set_layer(&mut self, sprite: SpriteId, layer: f64) -> bool {
        match self.node_mut(sprite) {
            Some(node) => {
                node.layer = layer;
                true
            }
            None => false,
        }
    }

    fn current_look(&self, sprite: SpriteId) -> Option<Look> {
        self.node(sprite).and_then(|node| node.current_look.clone())
    }

    fn set_current_look(&mut self, sprite: SpriteId, look: Look) -> bool {
        match self.node_mut(sprite) {
            Some(node) => {
                node.current_look = Some(look);
                true
            }
            None => false,
        }
    }

    fn displayed_image(&self, sprite: SpriteId) -> Option<Arc<DecodedImage>> {
        self.node(sprite)
            .and_then(|node| node.displayed_image.as_ref().map(Arc::clone))
    }

    fn apply_look_image(&mut self, sprite: SpriteId, image: Arc<DecodedImage>) -> bool {
        match self.node_mut(sprite) {
            Some(node) => {
                node.displayed_image = Some(image);
                true
            }
            None => false,
        }
    }
}
