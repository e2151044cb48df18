use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::model::ScriptId;

/// Authored brick payloads. The engine never mutates these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BrickKind {
    ComeToFront,
    GoBackLayers {
        steps: i64,
    },
    SetLook {
        #[serde(default)]
        look: Option<String>,
    },
    NextLook,
    PreviousLook,
    Wait {
        seconds: f32,
    },
    Repeat {
        times: u32,
    },
    Forever,
    EndRepeat,
    /// Bricks served by factories registered outside this crate.
    Custom {
        kind: String,
        #[serde(default)]
        params: BTreeMap<String, String>,
    },
}

impl BrickKind {
    /// Registry key used by the translator.
    pub fn name(&self) -> &str {
        match self {
            Self::ComeToFront => "come_to_front",
            Self::GoBackLayers { .. } => "go_back_layers",
            Self::SetLook { .. } => "set_look",
            Self::NextLook => "next_look",
            Self::PreviousLook => "previous_look",
            Self::Wait { .. } => "wait",
            Self::Repeat { .. } => "repeat",
            Self::Forever => "forever",
            Self::EndRepeat => "end_repeat",
            Self::Custom { kind, .. } => kind.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Brick {
    pub script: Option<ScriptId>,
    pub kind: BrickKind,
}

impl Brick {
    pub fn detached(kind: BrickKind) -> Self {
        Self { script: None, kind }
    }
}
