use serde::{Deserialize, Serialize};

use crate::stage::SpriteId;

use super::bricks::{Brick, BrickKind};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Look {
    pub name: String,
    pub file_name: String,
}

impl Look {
    pub fn new(name: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_name: file_name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScriptId(pub u32);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDef {
    pub name: String,
    #[serde(default)]
    pub background: bool,
    #[serde(default)]
    pub scene: Option<String>,
    #[serde(default)]
    pub looks: Vec<Look>,
}

impl ObjectDef {
    pub fn look_named(&self, name: &str) -> Option<&Look> {
        self.looks.iter().find(|look| look.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub id: ScriptId,
    pub object: Option<SpriteId>,
    pub bricks: Vec<Brick>,
}

/// Callback the description editor uses once the user confirms an edit.
pub trait SetProgramDescription {
    fn set_description(&mut self, description: Option<String>);
}

/// Authored program: objects (indexed by `SpriteId`) and their scripts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    name: String,
    description: Option<String>,
    objects: Vec<ObjectDef>,
    scripts: Vec<Script>,
}

impl Program {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn add_object(&mut self, object: ObjectDef) -> SpriteId {
        let id = SpriteId(self.objects.len() as u32);
        self.objects.push(object);
        id
    }

    /// Adds a script owned by `object`; every brick is linked back to it.
    pub fn add_script(&mut self, object: Option<SpriteId>, bricks: Vec<BrickKind>) -> ScriptId {
        let id = ScriptId(self.scripts.len() as u32);
        let bricks = bricks
            .into_iter()
            .map(|kind| Brick {
                script: Some(id),
                kind,
            })
            .collect();
        self.scripts.push(Script {
            id,
            object,
            bricks,
        });
        id
    }

    pub fn object(&self, id: SpriteId) -> Option<&ObjectDef> {
        self.objects.get(id.0 as usize)
    }

    pub fn objects(&self) -> impl Iterator<Item = (SpriteId, &ObjectDef)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(idx, object)| (SpriteId(idx as u32), object))
    }

    pub fn script(&self, id: ScriptId) -> Option<&Script> {
        self.scripts.get(id.0 as usize)
    }

    pub fn scripts(&self) -> &[Script] {
        &self.scripts
    }

    #[cfg(test)]
    pub(crate) fn script_mut(&mut self, id: ScriptId) -> Option<&mut Script> {
        self.scripts.get_mut(id.0 as usize)
    }
}

impl SetProgramDescription for Program {
    fn set_description(&mut self, description: Option<String>) {
        self.description = description
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
    }
}
