mod binding;
mod layer;
mod look;
mod translator;

use std::fmt;

use crate::program::ScriptId;
use crate::stage::{SceneHandle, SpriteId};

pub use binding::{
    resolve_owner, resolve_script_owner, BindContext, BindError, BoundSprite, BrickBinding,
};
pub use layer::{ComeToFrontInstruction, GoBackLayersInstruction};
pub use look::{present_look, CycleDirection, CycleLookInstruction, SetLookInstruction};
pub use translator::{InstructionFactory, Translator};

/// A brick bound to its sprite and scene, ready to be invoked any number of
/// times. Invocation never fails: unmet runtime preconditions make it a
/// no-op for that call.
pub trait Instruction: Send + Sync {
    fn name(&self) -> &str;
    fn invoke(&self);
}

/// One position in a script's timeline.
pub enum Step {
    Action(Box<dyn Instruction>),
    Wait { seconds: f32 },
    RepeatStart { times: Option<u32>, end: usize },
    RepeatEnd { start: usize },
    /// Brick kind with no registered factory; skipped when reached.
    Invalid { kind: String },
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Action(instruction) => f.debug_tuple("Action").field(&instruction.name()).finish(),
            Self::Wait { seconds } => f.debug_struct("Wait").field("seconds", seconds).finish(),
            Self::RepeatStart { times, end } => f
                .debug_struct("RepeatStart")
                .field("times", times)
                .field("end", end)
                .finish(),
            Self::RepeatEnd { start } => f.debug_struct("RepeatEnd").field("start", start).finish(),
            Self::Invalid { kind } => f.debug_struct("Invalid").field("kind", kind).finish(),
        }
    }
}

#[derive(Debug)]
pub struct TranslatedScript {
    pub script: ScriptId,
    pub sprite: SpriteId,
    pub scene: SceneHandle,
    pub steps: Vec<Step>,
}
