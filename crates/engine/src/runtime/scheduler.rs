use tracing::{debug, info};

use crate::instruction::{Step, TranslatedScript};
use crate::program::ScriptId;

use super::config::RunConfig;

/// Accepts translated scripts and decides when their steps run.
pub trait Scheduler {
    fn schedule(&mut self, script: TranslatedScript);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub instructions_run: usize,
    pub running_scripts: usize,
}

#[derive(Debug, Clone, Copy)]
struct LoopFrame {
    start: usize,
    remaining: Option<u32>,
}

#[derive(Debug)]
struct ScriptCursor {
    script: TranslatedScript,
    pc: usize,
    wait_remaining: f32,
    loops: Vec<LoopFrame>,
}

impl ScriptCursor {
    fn is_finished(&self) -> bool {
        self.pc >= self.script.steps.len()
    }

    // Runs steps until the script waits, yields at the end of a loop
    // iteration, or ends. Returns the number of actions invoked.
    fn advance(&mut self, dt_seconds: f32) -> usize {
        if self.wait_remaining > 0.0 {
            self.wait_remaining -= dt_seconds;
            if self.wait_remaining > 0.0 {
                return 0;
            }
            self.wait_remaining = 0.0;
        }

        let mut invoked = 0;
        while let Some(step) = self.script.steps.get(self.pc) {
            match step {
                Step::Action(instruction) => {
                    instruction.invoke();
                    invoked += 1;
                    self.pc += 1;
                }
                Step::Wait { seconds } => {
                    self.pc += 1;
                    if *seconds > 0.0 {
                        self.wait_remaining = *seconds;
                        break;
                    }
                }
                Step::RepeatStart { times, end } => {
                    let (times, end) = (*times, *end);
                    if !repeat_is_paired(&self.script.steps, self.pc, end) {
                        self.skip_unpaired_marker();
                    } else if times == Some(0) {
                        self.pc = end + 1;
                    } else {
                        self.loops.push(LoopFrame {
                            start: self.pc,
                            remaining: times,
                        });
                        self.pc += 1;
                    }
                }
                Step::RepeatEnd { start } => {
                    let start = *start;
                    if !repeat_is_paired(&self.script.steps, start, self.pc) {
                        self.skip_unpaired_marker();
                        continue;
                    }
                    let Some(frame) = self.loops.last_mut() else {
                        self.pc += 1;
                        continue;
                    };
                    match frame.remaining {
                        Some(remaining) if remaining <= 1 => {
                            self.loops.pop();
                            self.pc += 1;
                            break;
                        }
                        Some(remaining) => {
                            frame.remaining = Some(remaining - 1);
                            self.pc = start + 1;
                            break;
                        }
                        None => {
                            self.pc = start + 1;
                            break;
                        }
                    }
                }
                Step::Invalid { .. } => self.pc += 1,
            }
        }
        invoked
    }

    fn skip_unpaired_marker(&mut self) {
        debug!(
            script = self.script.script.0,
            pc = self.pc,
            reason = "unpaired_repeat_marker",
            "step_skipped"
        );
        self.pc += 1;
    }
}

// Repeat markers only jump when they point at each other; markers that never
// went through script translation are skipped like invalid steps.
fn repeat_is_paired(steps: &[Step], start: usize, end: usize) -> bool {
    start < end
        && matches!(steps.get(start), Some(Step::RepeatStart { end: paired, .. }) if *paired == end)
        && matches!(steps.get(end), Some(Step::RepeatEnd { start: paired }) if *paired == start)
}

/// Fixed-tick, round-robin scheduler. Each tick every running script gets one
/// turn, in scheduling order; a script's turn lasts until it waits, finishes a
/// loop iteration, or ends.
#[derive(Debug)]
pub struct CooperativeScheduler {
    cursors: Vec<ScriptCursor>,
    dt_seconds: f32,
    tick: u64,
}

impl CooperativeScheduler {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            cursors: Vec::new(),
            dt_seconds: config.fixed_dt().as_secs_f32(),
            tick: 0,
        }
    }

    pub fn tick(&mut self) -> TickReport {
        self.tick = self.tick.saturating_add(1);
        let mut instructions_run = 0;
        for cursor in &mut self.cursors {
            instructions_run += cursor.advance(self.dt_seconds);
        }

        let before = self.cursors.len();
        self.cursors.retain(|cursor| !cursor.is_finished());
        if self.cursors.len() != before {
            debug!(
                tick = self.tick,
                finished = before - self.cursors.len(),
                "scripts_finished"
            );
        }

        TickReport {
            tick: self.tick,
            instructions_run,
            running_scripts: self.cursors.len(),
        }
    }

    /// Ticks until the configured limit, or until idle when
    /// `stop_when_idle` is set.
    pub fn run(&mut self, config: &RunConfig) -> TickReport {
        let mut last = TickReport {
            tick: self.tick,
            running_scripts: self.cursors.len(),
            ..TickReport::default()
        };
        loop {
            if config.stop_when_idle && self.is_idle() {
                break;
            }
            if config.max_ticks.is_some_and(|max| self.tick >= max) {
                break;
            }
            last = self.tick();
        }
        info!(
            tick = last.tick,
            running_scripts = last.running_scripts,
            "scheduler_stopped"
        );
        last
    }

    pub fn is_idle(&self) -> bool {
        self.cursors.is_empty()
    }

    pub fn running_scripts(&self) -> usize {
        self.cursors.len()
    }

    /// Stops a script; steps it has not reached are never invoked.
    pub fn stop_script(&mut self, script: ScriptId) -> bool {
        let before = self.cursors.len();
        self.cursors.retain(|cursor| cursor.script.script != script);
        self.cursors.len() != before
    }
}

impl Scheduler for CooperativeScheduler {
    fn schedule(&mut self, script: TranslatedScript) {
        debug!(
            script = script.script.0,
            sprite = script.sprite.0,
            scene = script.scene.name(),
            step_count = script.steps.len(),
            "script_scheduled"
        );
        self.cursors.push(ScriptCursor {
            script,
            pc: 0,
            wait_remaining: 0.0,
            loops: Vec::new(),
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::instruction::Instruction;
    use crate::stage::{SceneHandle, SpriteId, StageWorld};

    struct Record {
        label: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Instruction for Record {
        fn name(&self) -> &str {
            self.label
        }

        fn invoke(&self) {
            self.log.lock().expect("log").push(self.label);
        }
    }

    fn scene() -> SceneHandle {
        let mut stage = StageWorld::new();
        stage.add_sprite(SpriteId(0), "Cat", false);
        SceneHandle::new("Scene 1", stage)
    }

    fn action(label: &'static str, log: &Arc<Mutex<Vec<&'static str>>>) -> Step {
        Step::Action(Box::new(Record {
            label,
            log: Arc::clone(log),
        }))
    }

    fn script(id: u32, steps: Vec<Step>) -> TranslatedScript {
        TranslatedScript {
            script: ScriptId(id),
            sprite: SpriteId(0),
            scene: scene(),
            steps,
        }
    }

    fn config(target_tps: u32) -> RunConfig {
        RunConfig {
            target_tps,
            max_ticks: Some(100),
            stop_when_idle: true,
        }
    }

    #[test]
    fn scripts_run_in_authored_order_and_finish() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut scheduler = CooperativeScheduler::new(&config(60));
        scheduler.schedule(script(0, vec![action("a1", &log), action("a2", &log)]));
        scheduler.schedule(script(1, vec![action("b1", &log)]));

        let report = scheduler.tick();
        assert_eq!(report.instructions_run, 3);
        assert_eq!(report.running_scripts, 0);
        assert_eq!(*log.lock().expect("log"), vec!["a1", "a2", "b1"]);
    }

    #[test]
    fn wait_suspends_only_its_own_script() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut scheduler = CooperativeScheduler::new(&config(10));
        scheduler.schedule(script(
            0,
            vec![
                action("before", &log),
                Step::Wait { seconds: 0.25 },
                action("after", &log),
            ],
        ));
        scheduler.schedule(script(1, vec![action("other", &log)]));

        scheduler.tick();
        assert_eq!(*log.lock().expect("log"), vec!["before", "other"]);
        scheduler.tick();
        scheduler.tick();
        assert_eq!(log.lock().expect("log").len(), 2);
        scheduler.tick();
        assert_eq!(*log.lock().expect("log"), vec!["before", "other", "after"]);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn repeat_yields_once_per_iteration() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut scheduler = CooperativeScheduler::new(&config(60));
        scheduler.schedule(script(
            0,
            vec![
                Step::RepeatStart {
                    times: Some(3),
                    end: 2,
                },
                action("body", &log),
                Step::RepeatEnd { start: 0 },
                action("done", &log),
            ],
        ));

        let reports = (0..3).map(|_| scheduler.tick()).collect::<Vec<_>>();
        assert_eq!(
            reports
                .iter()
                .map(|report| report.instructions_run)
                .collect::<Vec<_>>(),
            vec![1, 1, 1]
        );
        assert_eq!(*log.lock().expect("log"), vec!["body", "body", "body"]);
        scheduler.tick();
        assert_eq!(log.lock().expect("log").last(), Some(&"done"));
        assert!(scheduler.is_idle());
    }

    #[test]
    fn zero_repeat_skips_the_body() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut scheduler = CooperativeScheduler::new(&config(60));
        scheduler.schedule(script(
            0,
            vec![
                Step::RepeatStart {
                    times: Some(0),
                    end: 2,
                },
                action("body", &log),
                Step::RepeatEnd { start: 0 },
                action("done", &log),
            ],
        ));
        scheduler.tick();
        assert_eq!(*log.lock().expect("log"), vec!["done"]);
    }

    #[test]
    fn forever_runs_until_the_tick_limit() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut scheduler = CooperativeScheduler::new(&config(60));
        scheduler.schedule(script(
            0,
            vec![
                Step::RepeatStart {
                    times: None,
                    end: 2,
                },
                action("spin", &log),
                Step::RepeatEnd { start: 0 },
            ],
        ));

        let report = scheduler.run(&RunConfig {
            max_ticks: Some(25),
            ..config(60)
        });
        assert_eq!(report.tick, 25);
        assert_eq!(report.running_scripts, 1);
        assert_eq!(log.lock().expect("log").len(), 25);
    }

    #[test]
    fn stopped_scripts_invoke_nothing_further() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut scheduler = CooperativeScheduler::new(&config(10));
        scheduler.schedule(script(
            7,
            vec![
                action("first", &log),
                Step::Wait { seconds: 1.0 },
                action("never", &log),
            ],
        ));
        scheduler.tick();
        assert!(scheduler.stop_script(ScriptId(7)));
        assert!(!scheduler.stop_script(ScriptId(7)));
        scheduler.run(&config(10));
        assert_eq!(*log.lock().expect("log"), vec!["first"]);
    }

    #[test]
    fn invalid_steps_are_skipped() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut scheduler = CooperativeScheduler::new(&config(60));
        scheduler.schedule(script(
            0,
            vec![
                Step::Invalid {
                    kind: "play_sound".to_string(),
                },
                action("after", &log),
            ],
        ));
        scheduler.tick();
        assert_eq!(*log.lock().expect("log"), vec!["after"]);
    }

    #[test]
    fn untranslated_repeat_markers_are_skipped() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut scheduler = CooperativeScheduler::new(&config(60));
        scheduler.schedule(script(
            0,
            vec![
                Step::RepeatStart {
                    times: Some(0),
                    end: usize::MAX,
                },
                action("body", &log),
                Step::RepeatEnd { start: usize::MAX },
                Step::RepeatEnd { start: 1 },
                action("done", &log),
            ],
        ));

        let report = scheduler.tick();
        assert_eq!(*log.lock().expect("log"), vec!["body", "done"]);
        assert_eq!(report.running_scripts, 0);
    }
}
