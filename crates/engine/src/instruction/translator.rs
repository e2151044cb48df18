use std::collections::HashMap;

use tracing::{info, warn};

use crate::program::{Brick, BrickKind, Script};

use super::binding::{resolve_owner, resolve_script_owner, BindContext, BindError, BrickBinding};
use super::layer::{bind_come_to_front, bind_go_back_layers};
use super::look::{bind_next_look, bind_previous_look, bind_set_look};
use super::{Instruction, Step, TranslatedScript};

/// Builds the instruction for one brick kind.
pub trait InstructionFactory: Send + Sync {
    fn bind(
        &self,
        binding: BrickBinding<'_>,
        ctx: &BindContext<'_>,
    ) -> Result<Box<dyn Instruction>, BindError>;
}

impl<F> InstructionFactory for F
where
    F: Fn(BrickBinding<'_>, &BindContext<'_>) -> Result<Box<dyn Instruction>, BindError>
        + Send
        + Sync,
{
    fn bind(
        &self,
        binding: BrickBinding<'_>,
        ctx: &BindContext<'_>,
    ) -> Result<Box<dyn Instruction>, BindError> {
        self(binding, ctx)
    }
}

/// Maps brick kinds to instruction factories.
///
/// Control bricks (wait and repeat) become scheduler steps directly; every
/// other kind is looked up by name, and kinds without a factory become
/// `Step::Invalid`.
pub struct Translator {
    factories: HashMap<String, Box<dyn InstructionFactory>>,
}

impl Default for Translator {
    fn default() -> Self {
        Self::with_builtin_bricks()
    }
}

impl Translator {
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn with_builtin_bricks() -> Self {
        let mut translator = Self::empty();
        translator.register("come_to_front", bind_come_to_front);
        translator.register("go_back_layers", bind_go_back_layers);
        translator.register("set_look", bind_set_look);
        translator.register("next_look", bind_next_look);
        translator.register("previous_look", bind_previous_look);
        translator
    }

    /// Registers `factory` for `kind`, returning the factory it replaced.
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        factory: impl InstructionFactory + 'static,
    ) -> Option<Box<dyn InstructionFactory>> {
        self.factories.insert(kind.into(), Box::new(factory))
    }

    pub fn supports(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    pub(crate) fn translate_brick(&self, brick: &Brick, ctx: &BindContext<'_>) -> Result<Step, BindError> {
        let (owner, object) = resolve_owner(ctx, brick)?;
        let step = match &brick.kind {
            BrickKind::Wait { seconds } => Step::Wait {
                seconds: seconds.max(0.0),
            },
            BrickKind::Repeat { times } => Step::RepeatStart {
                times: Some(*times),
                end: usize::MAX,
            },
            BrickKind::Forever => Step::RepeatStart {
                times: None,
                end: usize::MAX,
            },
            BrickKind::EndRepeat => Step::RepeatEnd { start: usize::MAX },
            kind => match self.factories.get(kind.name()) {
                Some(factory) => Step::Action(factory.bind(
                    BrickBinding {
                        brick,
                        owner,
                        object,
                    },
                    ctx,
                )?),
                None => {
                    warn!(
                        kind = kind.name(),
                        object = %object.name,
                        "bind_unsupported_brick"
                    );
                    Step::Invalid {
                        kind: kind.name().to_string(),
                    }
                }
            },
        };
        Ok(step)
    }

    pub fn translate_script(
        &self,
        script: &Script,
        ctx: &BindContext<'_>,
    ) -> Result<TranslatedScript, BindError> {
        let (owner, _) = resolve_script_owner(ctx, script.id)?;
        let mut steps = script
            .bricks
            .iter()
            .map(|brick| self.translate_brick(brick, ctx))
            .collect::<Result<Vec<_>, _>>()?;
        if !pair_repeat_steps(&mut steps) {
            return Err(BindError::UnbalancedRepeat { script: script.id });
        }

        Ok(TranslatedScript {
            script: script.id,
            sprite: owner.sprite,
            scene: owner.scene,
            steps,
        })
    }

    /// Translates every script of the program. The first structural defect
    /// aborts the whole translation.
    pub fn translate_program(
        &self,
        ctx: &BindContext<'_>,
    ) -> Result<Vec<TranslatedScript>, BindError> {
        let scripts = ctx
            .program
            .scripts()
            .iter()
            .map(|script| self.translate_script(script, ctx))
            .collect::<Result<Vec<_>, _>>()?;
        info!(
            program = ctx.program.name(),
            script_count = scripts.len(),
            step_count = scripts.iter().map(|script| script.steps.len()).sum::<usize>(),
            "program_translated"
        );
        Ok(scripts)
    }
}

// Points every repeat start at its end and back. Returns false when the
// blocks do not nest.
fn pair_repeat_steps(steps: &mut [Step]) -> bool {
    let mut open = Vec::new();
    for idx in 0..steps.len() {
        match steps[idx] {
            Step::RepeatStart { .. } => open.push(idx),
            Step::RepeatEnd { .. } => {
                let Some(start) = open.pop() else {
                    return false;
                };
                if let Step::RepeatStart { end, .. } = &mut steps[start] {
                    *end = idx;
                }
                steps[idx] = Step::RepeatEnd { start };
            }
            _ => {}
        }
    }
    open.is_empty()
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::program::{Look, ObjectDef, Program};
    use crate::resources::ImageCache;
    use crate::stage::{SceneDirectory, SceneHandle, SpriteId, StageWorld};

    struct Fixture {
        program: Program,
        scenes: SceneDirectory,
        cat: SpriteId,
    }

    fn fixture() -> Fixture {
        let mut program = Program::new("demo");
        let cat = program.add_object(ObjectDef {
            name: "Cat".to_string(),
            background: false,
            scene: Some("Scene 1".to_string()),
            looks: vec![Look::new("Idle", "idle.png"), Look::new("Walk", "walk.png")],
        });
        let mut stage = StageWorld::new();
        stage.add_sprite(cat, "Cat", false);
        let mut scenes = SceneDirectory::new();
        scenes.insert(SceneHandle::new("Scene 1", stage));
        Fixture {
            program,
            scenes,
            cat,
        }
    }

    fn context(fixture: &Fixture) -> BindContext<'_> {
        BindContext {
            program: &fixture.program,
            scenes: &fixture.scenes,
            images: Arc::new(ImageCache::new()),
            image_dir: Path::new("/project/images"),
        }
    }

    fn step_names(script: &TranslatedScript) -> Vec<String> {
        script
            .steps
            .iter()
            .map(|step| match step {
                Step::Action(instruction) => instruction.name().to_string(),
                other => format!("{other:?}"),
            })
            .collect()
    }

    #[test]
    fn builtin_bricks_translate_to_actions() {
        let mut fixture = fixture();
        let script = fixture.program.add_script(
            Some(fixture.cat),
            vec![
                BrickKind::ComeToFront,
                BrickKind::GoBackLayers { steps: 1 },
                BrickKind::SetLook {
                    look: Some("Walk".to_string()),
                },
                BrickKind::NextLook,
                BrickKind::PreviousLook,
            ],
        );
        let ctx = context(&fixture);
        let translated = Translator::with_builtin_bricks()
            .translate_script(fixture.program.script(script).expect("script"), &ctx)
            .expect("translated");

        assert_eq!(translated.sprite, fixture.cat);
        assert_eq!(
            step_names(&translated),
            vec![
                "come_to_front",
                "go_back_layers",
                "set_look",
                "next_look",
                "previous_look"
            ]
        );
    }

    #[test]
    fn repeat_blocks_are_paired() {
        let mut fixture = fixture();
        let script = fixture.program.add_script(
            Some(fixture.cat),
            vec![
                BrickKind::Repeat { times: 2 },
                BrickKind::Forever,
                BrickKind::Wait { seconds: -1.0 },
                BrickKind::EndRepeat,
                BrickKind::EndRepeat,
            ],
        );
        let ctx = context(&fixture);
        let translated = Translator::default()
            .translate_script(fixture.program.script(script).expect("script"), &ctx)
            .expect("translated");

        assert!(matches!(
            translated.steps[0],
            Step::RepeatStart {
                times: Some(2),
                end: 4
            }
        ));
        assert!(matches!(
            translated.steps[1],
            Step::RepeatStart { times: None, end: 3 }
        ));
        assert!(matches!(translated.steps[2], Step::Wait { seconds } if seconds == 0.0));
        assert!(matches!(translated.steps[3], Step::RepeatEnd { start: 1 }));
        assert!(matches!(translated.steps[4], Step::RepeatEnd { start: 0 }));
    }

    #[test]
    fn unbalanced_repeat_is_rejected() {
        let mut fixture = fixture();
        let dangling_end = fixture
            .program
            .add_script(Some(fixture.cat), vec![BrickKind::EndRepeat]);
        let unclosed = fixture
            .program
            .add_script(Some(fixture.cat), vec![BrickKind::Forever]);
        let ctx = context(&fixture);
        let translator = Translator::default();

        for script in [dangling_end, unclosed] {
            let error = translator
                .translate_script(fixture.program.script(script).expect("script"), &ctx)
                .expect_err("unbalanced");
            assert_eq!(error, BindError::UnbalancedRepeat { script });
        }
    }

    #[test]
    fn unknown_kinds_become_invalid_steps() {
        let mut fixture = fixture();
        let script = fixture.program.add_script(
            Some(fixture.cat),
            vec![BrickKind::Custom {
                kind: "play_sound".to_string(),
                params: Default::default(),
            }],
        );
        let ctx = context(&fixture);
        let translated = Translator::default()
            .translate_script(fixture.program.script(script).expect("script"), &ctx)
            .expect("translated");

        assert!(matches!(&translated.steps[0], Step::Invalid { kind } if kind == "play_sound"));
    }

    #[test]
    fn custom_bricks_named_like_builtins_are_rejected() {
        let mut fixture = fixture();
        let go_back = fixture.program.add_script(
            Some(fixture.cat),
            vec![BrickKind::Custom {
                kind: "go_back_layers".to_string(),
                params: [("steps".to_string(), "0".to_string())]
                    .into_iter()
                    .collect(),
            }],
        );
        let set_look = fixture.program.add_script(
            Some(fixture.cat),
            vec![BrickKind::Custom {
                kind: "set_look".to_string(),
                params: [("look".to_string(), "Walk".to_string())]
                    .into_iter()
                    .collect(),
            }],
        );
        let ctx = context(&fixture);
        let translator = Translator::default();

        for (script, kind) in [(go_back, "go_back_layers"), (set_look, "set_look")] {
            let error = translator
                .translate_script(fixture.program.script(script).expect("script"), &ctx)
                .expect_err("mismatched");
            assert_eq!(
                error,
                BindError::MismatchedBrick {
                    kind: kind.to_string(),
                    object: "Cat".to_string()
                }
            );
        }
    }

    #[test]
    fn custom_factories_can_be_registered() {
        struct Counter(Arc<AtomicUsize>);

        impl Instruction for Counter {
            fn name(&self) -> &str {
                "count"
            }

            fn invoke(&self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        struct CounterFactory(Arc<AtomicUsize>);

        impl InstructionFactory for CounterFactory {
            fn bind(
                &self,
                _binding: BrickBinding<'_>,
                _ctx: &BindContext<'_>,
            ) -> Result<Box<dyn Instruction>, BindError> {
                Ok(Box::new(Counter(Arc::clone(&self.0))))
            }
        }

        let counter = Arc::new(AtomicUsize::new(0));
        let mut translator = Translator::default();
        translator.register("count", CounterFactory(Arc::clone(&counter)));
        assert!(translator.supports("count"));

        let mut fixture = fixture();
        let script = fixture.program.add_script(
            Some(fixture.cat),
            vec![BrickKind::Custom {
                kind: "count".to_string(),
                params: Default::default(),
            }],
        );
        let ctx = context(&fixture);
        let translated = translator
            .translate_script(fixture.program.script(script).expect("script"), &ctx)
            .expect("translated");
        let Step::Action(instruction) = &translated.steps[0] else {
            panic!("expected action");
        };
        instruction.invoke();
        instruction.invoke();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unknown_look_is_a_bind_error() {
        let mut fixture = fixture();
        fixture.program.add_script(
            Some(fixture.cat),
            vec![BrickKind::SetLook {
                look: Some("Fly".to_string()),
            }],
        );
        let ctx = context(&fixture);
        let error = Translator::default()
            .translate_program(&ctx)
            .expect_err("unknown look");
        assert_eq!(
            error,
            BindError::UnknownLook {
                object: "Cat".to_string(),
                look: "Fly".to_string()
            }
        );
    }

    #[test]
    fn broken_chain_refuses_whole_program() {
        let mut fixture = fixture();
        fixture
            .program
            .add_script(Some(fixture.cat), vec![BrickKind::ComeToFront]);
        let orphan = fixture
            .program
            .add_script(Some(fixture.cat), vec![BrickKind::ComeToFront]);
        fixture
            .program
            .script_mut(orphan)
            .expect("script")
            .bricks[0]
            .script = None;
        let ctx = context(&fixture);

        assert!(matches!(
            Translator::default().translate_program(&ctx),
            Err(BindError::MissingScript { .. })
        ));
    }

    #[test]
    fn bound_context_survives_later_program_edits() {
        let mut fixture = fixture();
        let script = fixture
            .program
            .add_script(Some(fixture.cat), vec![BrickKind::ComeToFront]);
        let translated = {
            let ctx = context(&fixture);
            Translator::default()
                .translate_script(fixture.program.script(script).expect("script"), &ctx)
                .expect("translated")
        };

        fixture.program.script_mut(script).expect("script").object = None;
        assert_eq!(translated.sprite, fixture.cat);
        let Step::Action(instruction) = &translated.steps[0] else {
            panic!("expected action");
        };
        instruction.invoke();
        assert_eq!(
            translated.scene.with_graph(|graph| graph.layer(fixture.cat)),
            Some(0.0)
        );
    }
}
