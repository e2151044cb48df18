use super::graph::{SceneGraph, SpriteId};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayerChange {
    Moved { from: f64, to: f64 },
    Unchanged,
    NotLive,
    Background,
}

/// Moves `sprite` to the top layer and shifts every normal sprite that sat
/// between its old layer and the top down by one.
///
/// The normal object count is read from the graph on every call; it can
/// change between translation and execution when sprites enter or leave.
pub fn bring_to_front<G>(graph: &mut G, sprite: SpriteId) -> LayerChange
where
    G: SceneGraph + ?Sized,
{
    let Some(old) = graph.layer(sprite) else {
        return LayerChange::NotLive;
    };
    if graph.is_background(sprite) {
        return LayerChange::Background;
    }
    let front = front_layer(graph);
    rotate_to(graph, sprite, old, front)
}

/// Moves `sprite` back by `steps` layers (forward when negative), clamped
/// to the occupied range.
pub fn move_layer_by<G>(graph: &mut G, sprite: SpriteId, steps: i64) -> LayerChange
where
    G: SceneGraph + ?Sized,
{
    let Some(old) = graph.layer(sprite) else {
        return LayerChange::NotLive;
    };
    if graph.is_background(sprite) {
        return LayerChange::Background;
    }
    let target = (old - steps as f64).clamp(0.0, front_layer(graph));
    rotate_to(graph, sprite, old, target)
}

/// True when the live normal sprites hold exactly the layers `0..N`.
pub fn layers_are_contiguous<G>(graph: &G) -> bool
where
    G: SceneGraph + ?Sized,
{
    let mut layers = graph
        .sprite_ids()
        .into_iter()
        .filter(|id| !graph.is_background(*id))
        .filter_map(|id| graph.layer(id))
        .collect::<Vec<_>>();
    layers.sort_by(f64::total_cmp);
    layers
        .iter()
        .enumerate()
        .all(|(idx, layer)| *layer == idx as f64)
}

fn front_layer<G>(graph: &G) -> f64
where
    G: SceneGraph + ?Sized,
{
    graph.normal_object_count().saturating_sub(1) as f64
}

// Rotates the sub-range between `old` and `target`; the multiset of normal
// layers is the same before and after.
fn rotate_to<G>(graph: &mut G, sprite: SpriteId, old: f64, target: f64) -> LayerChange
where
    G: SceneGraph + ?Sized,
{
    if old == target {
        return LayerChange::Unchanged;
    }
    graph.set_layer(sprite, target);

    for other in graph.sprite_ids() {
        if other == sprite || graph.is_background(other) {
            continue;
        }
        let Some(layer) = graph.layer(other) else {
            continue;
        };
        if target > old && layer > old && layer <= target {
            graph.set_layer(other, layer - 1.0);
        } else if target < old && layer >= target && layer < old {
            graph.set_layer(other, layer + 1.0);
        }
    }

    LayerChange::Moved {
        from: old,
        to: target,
    }
}
