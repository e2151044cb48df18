mod graph;
mod handle;
mod ordering;
mod world;

pub use graph::{SceneGraph, SpriteId, BACKGROUND_LAYER};
pub use handle::{SceneDirectory, SceneHandle};
pub use ordering::{bring_to_front, layers_are_contiguous, move_layer_by, LayerChange};
pub use world::StageWorld;
