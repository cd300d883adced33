//! Plugin registry: load-order resolution, lifecycle, and action dispatch
//! through every plugin's reducer.

use std::sync::mpsc::TryRecvError;

use crate::core::{DependencyResolver, ResolveError};

use super::interaction::InteractionError;
use super::plugin::{Capabilities, Plugin, PluginContext};
use super::{action_bus, Action, ActionReceiver, AppState, DispatchHandle, DispatchResult, Store};

#[derive(Debug)]
pub enum RegistryError {
    DuplicatePlugin(String),
    Resolve(ResolveError),
    CapabilityAlreadyPublished(&'static str),
    MissingCapability(&'static str),
    Interaction(InteractionError),
    AlreadyInitialized,
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::DuplicatePlugin(id) => {
                write!(f, "plugin '{}' registered twice", id)
            }
            RegistryError::Resolve(e) => write!(f, "load order: {}", e),
            RegistryError::CapabilityAlreadyPublished(name) => {
                write!(f, "capability '{}' published twice", name)
            }
            RegistryError::MissingCapability(name) => {
                write!(f, "capability '{}' not published by any dependency", name)
            }
            RegistryError::Interaction(e) => write!(f, "interaction setup: {}", e),
            RegistryError::AlreadyInitialized => write!(f, "registry already initialized"),
        }
    }
}

impl std::error::Error for RegistryError {}

impl From<ResolveError> for RegistryError {
    fn from(e: ResolveError) -> Self {
        RegistryError::Resolve(e)
    }
}

impl From<InteractionError> for RegistryError {
    fn from(e: InteractionError) -> Self {
        RegistryError::Interaction(e)
    }
}

pub struct PluginRegistry {
    store: Store,
    plugins: Vec<Box<dyn Plugin>>,
    ids: Vec<String>,
    load_order: Vec<usize>,
    capabilities: Capabilities,
    dispatch_handle: DispatchHandle,
    actions: ActionReceiver,
    initialized: bool,
    destroyed: bool,
}

impl PluginRegistry {
    pub fn new(initial: AppState) -> Self {
        let (dispatch_handle, actions) = action_bus();
        Self {
            store: Store::new(initial),
            plugins: Vec::new(),
            ids: Vec::new(),
            load_order: Vec::new(),
            capabilities: Capabilities::default(),
            dispatch_handle,
            actions,
            initialized: false,
            destroyed: false,
        }
    }

    pub fn register(&mut self, plugin: Box<dyn Plugin>) -> Result<(), RegistryError> {
        if self.initialized {
            return Err(RegistryError::AlreadyInitialized);
        }
        let id = plugin.descriptor().id;
        if self.ids.iter().any(|existing| *existing == id) {
            return Err(RegistryError::DuplicatePlugin(id));
        }
        self.ids.push(id);
        self.plugins.push(plugin);
        Ok(())
    }

    /// Resolves the dependency graph and initializes every plugin in load
    /// order. Any configuration error aborts the whole startup.
    pub fn initialize(&mut self) -> Result<(), RegistryError> {
        if self.initialized {
            return Err(RegistryError::AlreadyInitialized);
        }
        let mut resolver = DependencyResolver::new();
        for plugin in &self.plugins {
            let descriptor = plugin.descriptor();
            resolver.add_node(descriptor.id, descriptor.dependencies);
        }
        let order = resolver.resolve_load_order()?;
        self.load_order = order
            .iter()
            .filter_map(|id| self.ids.iter().position(|known| known == id))
            .collect();
        self.initialized = true;

        for index in self.load_order.clone() {
            let mut ctx = PluginContext {
                dispatch: self.dispatch_handle.clone(),
                capabilities: &mut self.capabilities,
                state: self.store.state(),
            };
            self.plugins[index].init(&mut ctx)?;
        }
        tracing::info!(order = ?order, "plugins initialized");
        Ok(())
    }

    /// Routes the action through each plugin's reducer in load order, then
    /// notifies every plugin of the `(prev, next)` state pair if anything
    /// changed.
    pub fn dispatch(&mut self, action: Action) -> DispatchResult {
        if self.destroyed {
            return DispatchResult::unchanged();
        }
        let prev = self.store.state().clone();
        let mut result = DispatchResult::unchanged();
        for index in self.load_order.clone() {
            let (changed, effects) = self.plugins[index].reduce(self.store.state_mut(), &action);
            result.state_changed |= changed;
            result.effects.extend(effects);
        }
        if result.state_changed {
            let next = self.store.state().clone();
            for index in self.load_order.clone() {
                self.plugins[index].on_store_updated(&prev, &next);
            }
        }
        result
    }

    /// Drains every action queued on the bus since the last pump.
    pub fn pump(&mut self) -> DispatchResult {
        let mut merged = DispatchResult::unchanged();
        loop {
            match self.actions.try_recv() {
                Ok(action) => {
                    let result = self.dispatch(action);
                    merged.merge(result);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        merged
    }

    pub fn dispatch_handle(&self) -> DispatchHandle {
        self.dispatch_handle.clone()
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn state(&self) -> &AppState {
        self.store.state()
    }

    /// Plugin ids in resolved load order; empty before `initialize`.
    pub fn load_order(&self) -> Vec<&str> {
        self.load_order
            .iter()
            .map(|index| self.ids[*index].as_str())
            .collect()
    }

    /// Destroys plugins in reverse load order. Idempotent; also runs on
    /// drop. Dispatch becomes a no-op afterwards.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        for index in self.load_order.clone().into_iter().rev() {
            self.plugins[index].destroy();
        }
        tracing::info!("plugin registry destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl Drop for PluginRegistry {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/registry.rs"]
mod tests;
