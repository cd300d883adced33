//! Store-facing wrapper around the interaction manager: publishes the
//! manager handle, mirrors its state into the store, and applies
//! interaction actions dispatched by other code.

use std::rc::Rc;

use crate::kernel::interaction::InteractionError;
use crate::kernel::{
    Action, AppState, Effect, InteractionManager, Plugin, PluginContext, PluginDescriptor,
    RegistryError,
};

pub const PLUGIN_ID: &str = "interaction";

pub struct InteractionPlugin {
    manager: Rc<InteractionManager>,
}

impl InteractionPlugin {
    pub fn new() -> Self {
        Self {
            manager: InteractionManager::new(),
        }
    }

    pub fn manager(&self) -> Rc<InteractionManager> {
        Rc::clone(&self.manager)
    }
}

impl Default for InteractionPlugin {
    fn default() -> Self {
        Self::new()
    }
}

fn log_if_err(result: Result<(), InteractionError>, what: &str) {
    if let Err(error) = result {
        tracing::warn!(%error, what, "interaction action rejected");
    }
}

impl Plugin for InteractionPlugin {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new(PLUGIN_ID)
    }

    fn init(&mut self, ctx: &mut PluginContext<'_>) -> Result<(), RegistryError> {
        ctx.capabilities.publish(Rc::clone(&self.manager))?;
        // Re-emit every manager state change as a store action; capability
        // callers (tools calling `activate` directly) stay in sync with the
        // reducer-visible projection through this channel.
        let dispatch = ctx.dispatch.clone();
        self.manager.on_state_change().subscribe(move |state| {
            let _ = dispatch.dispatch(Action::InteractionChanged(state.clone()));
        });
        Ok(())
    }

    fn reduce(&mut self, state: &mut AppState, action: &Action) -> (bool, Vec<Effect>) {
        let manager = &self.manager;
        match action {
            Action::ActivateMode { mode } => {
                log_if_err(manager.activate(mode.as_str()), "activate")
            }
            Action::ActivateDefaultMode => {
                log_if_err(manager.activate_default(), "activate-default")
            }
            Action::SetDefaultMode { mode } => {
                log_if_err(manager.set_default_mode(mode.as_str()), "set-default")
            }
            Action::SetCursor {
                token,
                cursor,
                priority,
            } => manager.set_cursor(token.as_str(), cursor.as_str(), *priority),
            Action::RemoveCursor { token } => manager.remove_cursor(token.as_str()),
            Action::Pause => manager.pause(),
            Action::Resume => manager.resume(),
            Action::AddExclusionClass(class) => manager.add_exclusion_class(class.as_str()),
            Action::RemoveExclusionClass(class) => {
                manager.remove_exclusion_class(class.as_str())
            }
            Action::AddExclusionAttribute(attribute) => {
                manager.add_exclusion_attribute(attribute.as_str())
            }
            Action::RemoveExclusionAttribute(attribute) => {
                manager.remove_exclusion_attribute(attribute.as_str())
            }
            Action::InteractionChanged(_) => {}
            _ => return (false, Vec::new()),
        }
        let snapshot = manager.snapshot();
        if state.interaction != snapshot {
            state.interaction = snapshot;
            (true, Vec::new())
        } else {
            (false, Vec::new())
        }
    }

    fn destroy(&mut self) {
        // Late DOM events must find the manager paused, not half torn down.
        self.manager.mark_destroyed();
    }
}
