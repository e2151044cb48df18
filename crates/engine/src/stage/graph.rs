use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::program::Look;
use crate::resources::DecodedImage;

/// Layer assigned to background sprites; normal sprites occupy `0..N`.
pub const BACKGROUND_LAYER: f64 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpriteId(pub u32);

/// Read and write surface over a live scene.
///
/// Layer and look accessors return `None`/`false` for sprites without a live
/// render node, which is how an instruction notices that its sprite has left
/// the scene.
pub trait SceneGraph {
    fn sprite_ids(&self) -> Vec<SpriteId>;
    fn normal_object_count(&self) -> usize;
    fn is_background(&self, sprite: SpriteId) -> bool;
    fn has_render_node(&self, sprite: SpriteId) -> bool {
        self.layer(sprite).is_some()
    }
    fn layer(&self, sprite: SpriteId) -> Option<f64>;
    fn set_layer(&mut self, sprite: SpriteId, layer: f64) -> bool;
    fn current_look(&self, sprite: SpriteId) -> Option<Look>;
    fn set_current_look(&mut self, sprite: SpriteId, look: Look) -> bool;
    fn displayed_image(&self, sprite: SpriteId) -> Option<Arc<DecodedImage>>;
    /// Hands a resolved image to the render node, which re-applies its
    /// visual effects on top of it.
    fn apply_look_image(&mut self, sprite: SpriteId, image: Arc<DecodedImage>) -> bool;
}
