use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::look_keys::{validate_look_file_name, LookKeyError};
use crate::program::{Brick, Look, ObjectDef, Program, ScriptId};
use crate::resources::ImageCache;
use crate::stage::{SceneDirectory, SceneHandle, SpriteId};

/// Structural defects in the program graph. A program that produces any of
/// these must not be started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("brick '{brick}' is not attached to a script")]
    MissingScript { brick: String },
    #[error("script {script:?} does not exist")]
    UnknownScript { script: ScriptId },
    #[error("script {script:?} has no owning object")]
    MissingObject { script: ScriptId },
    #[error("script {script:?} refers to unknown object {object:?}")]
    UnknownObject { script: ScriptId, object: SpriteId },
    #[error("object '{object}' is not placed in a scene")]
    MissingScene { object: String },
    #[error("object '{object}' refers to unknown scene '{scene}'")]
    UnknownScene { object: String, scene: String },
    #[error("object '{object}' has no render node in scene '{scene}'")]
    MissingRenderNode { object: String, scene: String },
    #[error("object '{object}' has no look named '{look}'")]
    UnknownLook { object: String, look: String },
    #[error("look '{look}' of object '{object}' has an invalid file name: {source}")]
    InvalidLookFile {
        object: String,
        look: String,
        #[source]
        source: LookKeyError,
    },
    #[error("brick '{kind}' of object '{object}' does not carry the fields its factory reads")]
    MismatchedBrick { kind: String, object: String },
    #[error("script {script:?} has unbalanced repeat bricks")]
    UnbalancedRepeat { script: ScriptId },
}

/// Everything a factory may consult while binding a brick.
pub struct BindContext<'a> {
    pub program: &'a Program,
    pub scenes: &'a SceneDirectory,
    pub images: Arc<ImageCache>,
    pub image_dir: &'a Path,
}

impl BindContext<'_> {
    pub(crate) fn look_path(&self, object: &ObjectDef, look: &Look) -> Result<PathBuf, BindError> {
        validate_look_file_name(&look.file_name).map_err(|source| BindError::InvalidLookFile {
            object: object.name.clone(),
            look: look.name.clone(),
            source,
        })?;
        Ok(self.image_dir.join(&look.file_name))
    }
}

/// Resolved sprite and scene an instruction is bound to.
#[derive(Debug, Clone)]
pub struct BoundSprite {
    pub sprite: SpriteId,
    pub object_name: String,
    pub scene: SceneHandle,
}

/// A brick together with its resolved owner, handed to instruction
/// factories.
#[derive(Debug, Clone)]
pub struct BrickBinding<'a> {
    pub brick: &'a Brick,
    pub owner: BoundSprite,
    pub object: &'a ObjectDef,
}

// Built-in factories read their parameters from the typed brick variant; a
// custom brick reusing a built-in kind name has none of them.
pub(crate) fn mismatched_brick(binding: &BrickBinding<'_>) -> BindError {
    BindError::MismatchedBrick {
        kind: binding.brick.kind.name().to_string(),
        object: binding.object.name.clone(),
    }
}

pub fn resolve_owner<'a>(
    ctx: &BindContext<'a>,
    brick: &Brick,
) -> Result<(BoundSprite, &'a ObjectDef), BindError> {
    let script = brick.script.ok_or_else(|| BindError::MissingScript {
        brick: brick.kind.name().to_string(),
    })?;
    resolve_script_owner(ctx, script)
}

pub fn resolve_script_owner<'a>(
    ctx: &BindContext<'a>,
    script_id: ScriptId,
) -> Result<(BoundSprite, &'a ObjectDef), BindError> {
    let program = ctx.program;
    let script = program
        .script(script_id)
        .ok_or(BindError::UnknownScript { script: script_id })?;
    let sprite = script
        .object
        .ok_or(BindError::MissingObject { script: script_id })?;
    let object = program
        .object(sprite)
        .ok_or(BindError::UnknownObject {
            script: script_id,
            object: sprite,
        })?;
    let scene_name = object
        .scene
        .as_deref()
        .ok_or_else(|| BindError::MissingScene {
            object: object.name.clone(),
        })?;
    let scene = ctx
        .scenes
        .get(scene_name)
        .ok_or_else(|| BindError::UnknownScene {
            object: object.name.clone(),
            scene: scene_name.to_string(),
        })?;
    if !scene.with_graph(|graph| graph.has_render_node(sprite)) {
        return Err(BindError::MissingRenderNode {
            object: object.name.clone(),
            scene: scene_name.to_string(),
        });
    }

    Ok((
        BoundSprite {
            sprite,
            object_name: object.name.clone(),
            scene: scene.clone(),
        },
        object,
    ))
}
