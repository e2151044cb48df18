use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use brick_engine::{BrickKind, ObjectDef, Program, SetProgramDescription};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum ProgramFileError {
    #[error("read program '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse program '{path}' at {json_path}: {source}")]
    Parse {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProgramFile {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    objects: Vec<ObjectFile>,
}

#[derive(Debug, Deserialize)]
struct ObjectFile {
    #[serde(flatten)]
    object: ObjectDef,
    /// Each script is a list of bricks owned by this object.
    #[serde(default)]
    scripts: Vec<Vec<BrickKind>>,
}

pub(crate) fn load_program(path: &Path) -> Result<Program, ProgramFileError> {
    let raw = fs::read_to_string(path).map_err(|source| ProgramFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_program(&raw, path)
}

fn parse_program(raw: &str, path: &Path) -> Result<Program, ProgramFileError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let file = serde_path_to_error::deserialize::<_, ProgramFile>(&mut deserializer).map_err(
        |error| {
            let json_path = error.path().to_string();
            ProgramFileError::Parse {
                path: path.to_path_buf(),
                json_path,
                source: error.into_inner(),
            }
        },
    )?;
    Ok(file.into_program())
}

impl ProgramFile {
    fn into_program(self) -> Program {
        let mut program = Program::new(self.name);
        program.set_description(self.description);
        for ObjectFile { object, scripts } in self.objects {
            let id = program.add_object(object);
            for bricks in scripts {
                program.add_script(Some(id), bricks);
            }
        }
        program
    }
}
