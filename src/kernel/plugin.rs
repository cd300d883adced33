//! Plugin contract and the capability map plugins use to reach each other.

use std::any::{Any, TypeId};

use rustc_hash::FxHashMap;

use super::registry::RegistryError;
use super::{Action, AppState, DispatchHandle, Effect};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDescriptor {
    pub id: String,
    pub dependencies: Vec<String>,
}

impl PluginDescriptor {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependencies(id: &str, dependencies: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
        }
    }
}

/// Type-keyed map of shared handles. A plugin publishes its capability
/// surface during `init`; plugins constructed later (dependents, by load
/// order) fetch it by type.
#[derive(Default)]
pub struct Capabilities {
    entries: FxHashMap<TypeId, Box<dyn Any>>,
}

impl Capabilities {
    pub fn publish<C: Any>(&mut self, capability: C) -> Result<(), RegistryError> {
        let type_id = TypeId::of::<C>();
        if self.entries.contains_key(&type_id) {
            return Err(RegistryError::CapabilityAlreadyPublished(
                std::any::type_name::<C>(),
            ));
        }
        self.entries.insert(type_id, Box::new(capability));
        Ok(())
    }

    pub fn get<C: Any + Clone>(&self) -> Option<C> {
        self.get_ref::<C>().cloned()
    }

    pub fn get_ref<C: Any>(&self) -> Option<&C> {
        self.entries
            .get(&TypeId::of::<C>())
            .and_then(|entry| entry.downcast_ref::<C>())
    }

    pub fn contains<C: Any>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<C>())
    }
}

pub struct PluginContext<'a> {
    pub dispatch: DispatchHandle,
    pub capabilities: &'a mut Capabilities,
    pub state: &'a AppState,
}

pub trait Plugin: Any {
    fn descriptor(&self) -> PluginDescriptor;

    /// Runs once, in dependency order, with dispatch access and the
    /// capabilities of every plugin constructed before this one.
    fn init(&mut self, _ctx: &mut PluginContext<'_>) -> Result<(), RegistryError> {
        Ok(())
    }

    /// Reducer: applies an action to the shared state, returning whether the
    /// state changed and any side effects to run.
    fn reduce(&mut self, _state: &mut AppState, _action: &Action) -> (bool, Vec<Effect>) {
        (false, Vec::new())
    }

    fn on_store_updated(&mut self, _prev: &AppState, _next: &AppState) {}

    /// Runs in reverse dependency order at registry teardown.
    fn destroy(&mut self) {}
}
