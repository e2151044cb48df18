use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod instruction;
mod locks;
mod look_keys;
pub mod program;
pub mod resources;
pub mod runtime;
pub mod stage;

pub use instruction::{
    present_look, resolve_owner, resolve_script_owner, BindContext, BindError, BoundSprite,
    BrickBinding, ComeToFrontInstruction, CycleDirection, CycleLookInstruction,
    GoBackLayersInstruction, Instruction, InstructionFactory, SetLookInstruction, Step,
    TranslatedScript, Translator,
};
pub use look_keys::LookKeyError;
pub use program::{
    Brick, BrickKind, Look, ObjectDef, Program, Script, ScriptId, SetProgramDescription,
};
pub use resources::{DecodedImage, DiskImageSource, ImageCache, ImageLoadError, ImageSource};
pub use runtime::{build_scenes, CooperativeScheduler, RunConfig, Scheduler, TickReport};
pub use stage::{
    bring_to_front, layers_are_contiguous, move_layer_by, LayerChange, SceneDirectory, SceneGraph,
    SceneHandle, SpriteId, StageWorld, BACKGROUND_LAYER,
};

pub const PROJECT_ROOT_ENV_VAR: &str = "BRICK_PROJECT_ROOT";
pub const PROGRAM_FILE_NAME: &str = "program.json";
pub const IMAGE_DIR_NAME: &str = "images";

#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub program_file: PathBuf,
    pub image_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
    #[error(
        "{path} is not a valid project root\n\
A valid root must contain {program_file}."
    )]
    InvalidProjectRoot {
        path: PathBuf,
        program_file: &'static str,
    },
    #[error(
        "Could not find a project by walking upward from {start_dir}\n\
Pass --project <dir> or set {env_var}, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/project\""
    )]
    ProjectNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

/// Resolves the project directory: an explicit path wins, then
/// `BRICK_PROJECT_ROOT`, then the nearest ancestor of the current directory
/// holding a `program.json`.
pub fn resolve_project_paths(explicit: Option<PathBuf>) -> Result<ProjectPaths, StartupError> {
    let root = resolve_root(explicit)?;
    Ok(project_paths_at(root))
}

fn project_paths_at(root: PathBuf) -> ProjectPaths {
    ProjectPaths {
        program_file: root.join(PROGRAM_FILE_NAME),
        image_dir: root.join(IMAGE_DIR_NAME),
        root,
    }
}

fn resolve_root(explicit: Option<PathBuf>) -> Result<PathBuf, StartupError> {
    if let Some(raw) = explicit {
        return checked_root(&raw);
    }

    match env::var(PROJECT_ROOT_ENV_VAR) {
        Ok(value) => checked_root(Path::new(&value)),
        Err(env::VarError::NotPresent) => {
            let cwd = env::current_dir().map_err(StartupError::CurrentDir)?;
            cwd.ancestors()
                .find(|candidate| is_project_root(candidate))
                .map(normalize_path)
                .ok_or_else(|| StartupError::ProjectNotFound {
                    start_dir: normalize_path(&cwd),
                    env_var: PROJECT_ROOT_ENV_VAR,
                })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: PROJECT_ROOT_ENV_VAR,
            source,
        }),
    }
}

fn checked_root(raw: &Path) -> Result<PathBuf, StartupError> {
    let normalized = normalize_path(raw);
    if is_project_root(&normalized) {
        Ok(normalized)
    } else {
        Err(StartupError::InvalidProjectRoot {
            path: normalized,
            program_file: PROGRAM_FILE_NAME,
        })
    }
}

fn is_project_root(path: &Path) -> bool {
    path.join(PROGRAM_FILE_NAME).is_file()
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
