//! Pan tool: a global, non-exclusive mode; dragging scrolls the viewport
//! and claims a grabbing cursor for the duration of the drag.

use std::rc::{Rc, Weak};

use crate::core::{PointerEvent, Position};
use crate::kernel::interaction::{shared_handler, ModeScope, Registration};
use crate::kernel::{
    Action, AppState, DispatchHandle, Effect, InteractionHandler, InteractionManager,
    InteractionMode, Plugin, PluginContext, PluginDescriptor, RegistryError,
};

pub const PLUGIN_ID: &str = "pan";
pub const MODE: &str = "pan";

const DRAG_CURSOR_TOKEN: &str = "pan-drag";
const DRAG_CURSOR_PRIORITY: i32 = 10;

struct PanHandler {
    manager: Weak<InteractionManager>,
    dispatch: DispatchHandle,
    last: Option<Position>,
}

impl InteractionHandler for PanHandler {
    fn on_pointer_down(&mut self, _event: &PointerEvent, position: Position) {
        self.last = Some(position);
        if let Some(manager) = self.manager.upgrade() {
            manager.set_cursor(DRAG_CURSOR_TOKEN, "grabbing", DRAG_CURSOR_PRIORITY);
        }
    }

    fn on_pointer_move(&mut self, _event: &PointerEvent, position: Position) {
        if let Some(last) = self.last {
            let _ = self.dispatch.dispatch(Action::ScrollBy {
                dx: last.x - position.x,
                dy: last.y - position.y,
            });
            self.last = Some(position);
        }
    }

    fn on_pointer_up(&mut self, _event: &PointerEvent, _position: Position) {
        self.last = None;
        if let Some(manager) = self.manager.upgrade() {
            manager.remove_cursor(DRAG_CURSOR_TOKEN);
        }
    }

    fn on_handler_active_end(&mut self, _mode: &str) {
        self.last = None;
    }
}

pub struct PanPlugin {
    registration: Option<Registration>,
}

impl PanPlugin {
    pub fn new() -> Self {
        Self { registration: None }
    }
}

impl Default for PanPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for PanPlugin {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::with_dependencies(PLUGIN_ID, &[super::interaction::PLUGIN_ID])
    }

    fn init(&mut self, ctx: &mut PluginContext<'_>) -> Result<(), RegistryError> {
        let manager = ctx
            .capabilities
            .get::<Rc<InteractionManager>>()
            .ok_or(RegistryError::MissingCapability("interaction manager"))?;
        manager.register_mode(InteractionMode::new(MODE, ModeScope::Global).with_cursor("grab"))?;
        let handler = shared_handler(PanHandler {
            manager: Rc::downgrade(&manager),
            dispatch: ctx.dispatch.clone(),
            last: None,
        });
        self.registration = Some(manager.register_handlers(&[MODE], handler, None)?);
        Ok(())
    }

    fn reduce(&mut self, state: &mut AppState, action: &Action) -> (bool, Vec<Effect>) {
        match action {
            Action::ScrollBy { dx, dy } => {
                let x = (state.viewport.scroll_x + dx).max(0.0);
                let y = (state.viewport.scroll_y + dy).max(0.0);
                let changed = x != state.viewport.scroll_x || y != state.viewport.scroll_y;
                state.viewport.scroll_x = x;
                state.viewport.scroll_y = y;
                (changed, Vec::new())
            }
            _ => (false, Vec::new()),
        }
    }
}
