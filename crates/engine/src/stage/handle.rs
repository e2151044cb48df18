use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::locks::lock_or_recover;

use super::graph::SceneGraph;

/// Shared, mutex-guarded access to one scene.
///
/// Every instruction runs its whole read-modify-write against the graph
/// inside a single `with_graph` call, so a layer rotation is never observed
/// half-applied by another script, even when scripts run on real threads.
#[derive(Clone)]
pub struct SceneHandle {
    name: Arc<str>,
    graph: Arc<Mutex<dyn SceneGraph + Send>>,
}

impl SceneHandle {
    pub fn new(name: &str, graph: impl SceneGraph + Send + 'static) -> Self {
        Self {
            name: Arc::from(name),
            graph: Arc::new(Mutex::new(graph)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_graph<R>(&self, f: impl FnOnce(&mut (dyn SceneGraph + Send)) -> R) -> R {
        let mut guard = lock_or_recover(&*self.graph, "scene_graph");
        f(&mut *guard)
    }

    pub fn same_scene(&self, other: &SceneHandle) -> bool {
        Arc::ptr_eq(&self.graph, &other.graph)
    }
}

impl fmt::Debug for SceneHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Live scenes by name.
#[derive(Debug, Clone, Default)]
pub struct SceneDirectory {
    scenes: HashMap<String, SceneHandle>,
}

impl SceneDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, handle: SceneHandle) -> Option<SceneHandle> {
        self.scenes.insert(handle.name().to_string(), handle)
    }

    pub fn get(&self, name: &str) -> Option<&SceneHandle> {
        self.scenes.get(name)
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneHandle> {
        self.scenes.values()
    }
}
