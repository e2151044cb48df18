use tracing::debug;

use crate::program::BrickKind;
use crate::stage::{bring_to_front, move_layer_by, LayerChange};

use super::binding::{mismatched_brick, BindContext, BindError, BoundSprite, BrickBinding};
use super::Instruction;

#[derive(Debug)]
pub struct ComeToFrontInstruction {
    owner: BoundSprite,
    normal_count_at_bind: usize,
}

impl ComeToFrontInstruction {
    pub fn new(owner: BoundSprite) -> Self {
        let normal_count_at_bind = owner.scene.with_graph(|graph| graph.normal_object_count());
        Self {
            owner,
            normal_count_at_bind,
        }
    }
}

impl Instruction for ComeToFrontInstruction {
    fn name(&self) -> &str {
        "come_to_front"
    }

    fn invoke(&self) {
        let (change, live_count) = self.owner.scene.with_graph(|graph| {
            let change = bring_to_front(graph, self.owner.sprite);
            (change, graph.normal_object_count())
        });
        if live_count != self.normal_count_at_bind {
            debug!(
                object = %self.owner.object_name,
                bound_count = self.normal_count_at_bind,
                live_count,
                "come_to_front_object_count_changed"
            );
        }
        log_layer_change(self.name(), &self.owner, change);
    }
}

#[derive(Debug)]
pub struct GoBackLayersInstruction {
    owner: BoundSprite,
    steps: i64,
}

impl GoBackLayersInstruction {
    pub fn new(owner: BoundSprite, steps: i64) -> Self {
        Self { owner, steps }
    }
}

impl Instruction for GoBackLayersInstruction {
    fn name(&self) -> &str {
        "go_back_layers"
    }

    fn invoke(&self) {
        if self.steps == 0 {
            return;
        }
        let change = self
            .owner
            .scene
            .with_graph(|graph| move_layer_by(graph, self.owner.sprite, self.steps));
        log_layer_change(self.name(), &self.owner, change);
    }
}

pub(crate) fn bind_come_to_front(
    binding: BrickBinding<'_>,
    _ctx: &BindContext<'_>,
) -> Result<Box<dyn Instruction>, BindError> {
    Ok(Box::new(ComeToFrontInstruction::new(binding.owner)))
}

pub(crate) fn bind_go_back_layers(
    binding: BrickBinding<'_>,
    _ctx: &BindContext<'_>,
) -> Result<Box<dyn Instruction>, BindError> {
    let BrickKind::GoBackLayers { steps } = binding.brick.kind else {
        return Err(mismatched_brick(&binding));
    };
    Ok(Box::new(GoBackLayersInstruction::new(binding.owner, steps)))
}

fn log_layer_change(instruction: &str, owner: &BoundSprite, change: LayerChange) {
    match change {
        LayerChange::Moved { from, to } => debug!(
            instruction,
            object = %owner.object_name,
            from,
            to,
            "layer_changed"
        ),
        LayerChange::Unchanged => {}
        LayerChange::NotLive | LayerChange::Background => debug!(
            instruction,
            object = %owner.object_name,
            reason = ?change,
            "instruction_skipped"
        ),
    }
}
