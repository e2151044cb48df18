mod bricks;
mod model;

pub use bricks::{Brick, BrickKind};
pub use model::{Look, ObjectDef, Program, Script, ScriptId, SetProgramDescription};
