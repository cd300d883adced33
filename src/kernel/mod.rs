//! Headless viewer runtime (state/action/effect + plugin registry).

pub mod action;
pub mod bus;
pub mod effect;
pub mod interaction;
pub mod plugin;
pub mod registry;
pub mod state;
pub mod store;

pub use action::Action;
pub use bus::{action_bus, ActionReceiver, DispatchHandle};
pub use effect::Effect;
pub use interaction::{
    InteractionError, InteractionHandler, InteractionManager, InteractionMode, MergedHandlers,
    ModeScope, Registration,
};
pub use plugin::{Capabilities, Plugin, PluginContext, PluginDescriptor};
pub use registry::{PluginRegistry, RegistryError};
pub use state::{
    Annotation, AppState, DocumentState, ExclusionRules, InteractionState, LoadStatus,
    SelectionSpan, SelectionState, ViewportState,
};
pub use store::{DispatchResult, Store};
