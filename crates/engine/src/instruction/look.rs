use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::program::{BrickKind, Look};
use crate::resources::{DecodedImage, ImageCache};
use crate::stage::{SceneHandle, SpriteId};

use super::binding::{mismatched_brick, BindContext, BindError, BoundSprite, BrickBinding};
use super::Instruction;

pub struct SetLookInstruction {
    owner: BoundSprite,
    look: Option<(Look, PathBuf)>,
    images: Arc<ImageCache>,
}

impl SetLookInstruction {
    pub fn new(owner: BoundSprite, look: Option<(Look, PathBuf)>, images: Arc<ImageCache>) -> Self {
        Self {
            owner,
            look,
            images,
        }
    }
}

impl Instruction for SetLookInstruction {
    fn name(&self) -> &str {
        "set_look"
    }

    fn invoke(&self) {
        let Some((look, path)) = &self.look else {
            debug!(
                object = %self.owner.object_name,
                reason = "no_look_assigned",
                "instruction_skipped"
            );
            return;
        };
        present_look(
            &self.owner.scene,
            self.owner.sprite,
            &self.images,
            look,
            path,
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleDirection {
    Next,
    Previous,
}

/// Steps through the object's looks, wrapping at either end.
pub struct CycleLookInstruction {
    owner: BoundSprite,
    direction: CycleDirection,
    looks: Vec<(Look, PathBuf)>,
    images: Arc<ImageCache>,
}

impl CycleLookInstruction {
    pub fn new(
        owner: BoundSprite,
        direction: CycleDirection,
        looks: Vec<(Look, PathBuf)>,
        images: Arc<ImageCache>,
    ) -> Self {
        Self {
            owner,
            direction,
            looks,
            images,
        }
    }

    fn target_index(&self, current: &Look) -> usize {
        let len = self.looks.len();
        match self.looks.iter().position(|(look, _)| look == current) {
            Some(idx) => match self.direction {
                CycleDirection::Next => (idx + 1) % len,
                CycleDirection::Previous => (idx + len - 1) % len,
            },
            None => 0,
        }
    }
}

impl Instruction for CycleLookInstruction {
    fn name(&self) -> &str {
        match self.direction {
            CycleDirection::Next => "next_look",
            CycleDirection::Previous => "previous_look",
        }
    }

    fn invoke(&self) {
        let current = self
            .owner
            .scene
            .with_graph(|graph| graph.current_look(self.owner.sprite));
        let Some(current) = current else {
            debug!(
                instruction = self.name(),
                object = %self.owner.object_name,
                reason = "no_current_look",
                "instruction_skipped"
            );
            return;
        };
        if self.looks.is_empty() {
            return;
        }
        let (look, path) = &self.looks[self.target_index(&current)];
        present_look(
            &self.owner.scene,
            self.owner.sprite,
            &self.images,
            look,
            path,
        );
    }
}

/// Shows `look` on `sprite`: cache lookup, population on a miss, then a
/// direct read as the last resort. When no image can be produced the
/// sprite keeps whatever it displayed before. Returns whether the look was
/// applied.
pub fn present_look(
    scene: &SceneHandle,
    sprite: SpriteId,
    images: &ImageCache,
    look: &Look,
    path: &Path,
) -> bool {
    let Some(image) = resolve_image(images, path) else {
        debug!(
            look = %look.name,
            path = %path.display(),
            reason = "image_unavailable",
            "instruction_skipped"
        );
        return false;
    };
    scene.with_graph(|graph| {
        if !graph.set_current_look(sprite, look.clone()) {
            return false;
        }
        graph.apply_look_image(sprite, image)
    })
}

fn resolve_image(images: &ImageCache, path: &Path) -> Option<Arc<DecodedImage>> {
    if let Some(image) = images.cached_image(path) {
        return Some(image);
    }
    images.load_image_from_disk(path);
    if let Some(image) = images.cached_image(path) {
        return Some(image);
    }
    images.read_image_from_disk(path).ok()
}

pub(crate) fn bind_set_look(
    binding: BrickBinding<'_>,
    ctx: &BindContext<'_>,
) -> Result<Box<dyn Instruction>, BindError> {
    let object = binding.object;
    let look = match &binding.brick.kind {
        BrickKind::SetLook {
            look: Some(look_name),
        } => {
            let look = object
                .look_named(look_name)
                .ok_or_else(|| BindError::UnknownLook {
                    object: object.name.clone(),
                    look: look_name.clone(),
                })?;
            Some((look.clone(), ctx.look_path(object, look)?))
        }
        BrickKind::SetLook { look: None } => None,
        _ => return Err(mismatched_brick(&binding)),
    };
    Ok(Box::new(SetLookInstruction::new(
        binding.owner,
        look,
        Arc::clone(&ctx.images),
    )))
}

pub(crate) fn bind_next_look(
    binding: BrickBinding<'_>,
    ctx: &BindContext<'_>,
) -> Result<Box<dyn Instruction>, BindError> {
    bind_cycle_look(binding, ctx, CycleDirection::Next)
}

pub(crate) fn bind_previous_look(
    binding: BrickBinding<'_>,
    ctx: &BindContext<'_>,
) -> Result<Box<dyn Instruction>, BindError> {
    bind_cycle_look(binding, ctx, CycleDirection::Previous)
}

fn bind_cycle_look(
    binding: BrickBinding<'_>,
    ctx: &BindContext<'_>,
    direction: CycleDirection,
) -> Result<Box<dyn Instruction>, BindError> {
    let object = binding.object;
    let looks = object
        .looks
        .iter()
        .map(|look| Ok((look.clone(), ctx.look_path(object, look)?)))
        .collect::<Result<Vec<_>, BindError>>()?;
    Ok(Box::new(CycleLookInstruction::new(
        binding.owner,
        direction,
        looks,
        Arc::clone(&ctx.images),
    )))
}
