//! Marquee zoom: an exclusive global mode plus an always-active preview
//! handler that tracks the pointer no matter which tool is in control.

use std::rc::{Rc, Weak};

use crate::core::{PointerEvent, Position, RectF};
use crate::kernel::interaction::{shared_handler, ModeScope, Registration};
use crate::kernel::{
    Action, AppState, DispatchHandle, Effect, InteractionHandler, InteractionManager,
    InteractionMode, Plugin, PluginContext, PluginDescriptor, RegistryError,
};

pub const PLUGIN_ID: &str = "zoom";
pub const MODE: &str = "marquee-zoom";

pub const MIN_ZOOM: f32 = 0.25;
pub const MAX_ZOOM: f32 = 8.0;

/// Cross-tool overlay: keeps the hover position current for the marquee
/// preview regardless of the active mode.
struct HoverHandler {
    dispatch: DispatchHandle,
}

impl InteractionHandler for HoverHandler {
    fn on_pointer_move(&mut self, _event: &PointerEvent, position: Position) {
        let _ = self.dispatch.dispatch(Action::PointerHover {
            x: position.x,
            y: position.y,
        });
    }
}

struct MarqueeHandler {
    manager: Weak<InteractionManager>,
    dispatch: DispatchHandle,
    anchor: Option<Position>,
}

impl InteractionHandler for MarqueeHandler {
    fn on_pointer_down(&mut self, _event: &PointerEvent, position: Position) {
        self.anchor = Some(position);
    }

    fn on_pointer_up(&mut self, _event: &PointerEvent, position: Position) {
        let Some(anchor) = self.anchor.take() else {
            return;
        };
        let rect = RectF::from_corners(anchor, position);
        if !rect.is_empty() {
            let _ = self.dispatch.dispatch(Action::ZoomToRect { rect });
        }
        if let Some(manager) = self.manager.upgrade() {
            if let Err(error) = manager.activate_default() {
                tracing::warn!(%error, "marquee zoom could not restore the default mode");
            }
        }
    }

    fn on_handler_active_end(&mut self, _mode: &str) {
        self.anchor = None;
    }
}

pub struct ZoomPlugin {
    registrations: Vec<Registration>,
}

impl ZoomPlugin {
    pub fn new() -> Self {
        Self {
            registrations: Vec::new(),
        }
    }
}

impl Default for ZoomPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for ZoomPlugin {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::with_dependencies(PLUGIN_ID, &[super::interaction::PLUGIN_ID])
    }

    fn init(&mut self, ctx: &mut PluginContext<'_>) -> Result<(), RegistryError> {
        let manager = ctx
            .capabilities
            .get::<Rc<InteractionManager>>()
            .ok_or(RegistryError::MissingCapability("interaction manager"))?;
        manager.register_mode(
            InteractionMode::new(MODE, ModeScope::Global)
                .exclusive()
                .with_cursor("zoom-in"),
        )?;
        let marquee = shared_handler(MarqueeHandler {
            manager: Rc::downgrade(&manager),
            dispatch: ctx.dispatch.clone(),
            anchor: None,
        });
        self.registrations
            .push(manager.register_handlers(&[MODE], marquee, None)?);
        let preview = shared_handler(HoverHandler {
            dispatch: ctx.dispatch.clone(),
        });
        self.registrations.push(manager.register_always(preview, None));
        Ok(())
    }

    fn reduce(&mut self, state: &mut AppState, action: &Action) -> (bool, Vec<Effect>) {
        match action {
            Action::SetZoom { zoom } => {
                let clamped = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
                let changed = clamped != state.viewport.zoom;
                state.viewport.zoom = clamped;
                (changed, Vec::new())
            }
            Action::ZoomToRect { rect } => {
                if rect.is_empty() {
                    return (false, Vec::new());
                }
                let page_height = state
                    .document
                    .info
                    .as_ref()
                    .map(|info| info.lines_per_page as f32)
                    .unwrap_or(rect.height);
                let zoom = (state.viewport.zoom * page_height / rect.height)
                    .clamp(MIN_ZOOM, MAX_ZOOM);
                let changed = zoom != state.viewport.zoom;
                state.viewport.zoom = zoom;
                (changed, Vec::new())
            }
            Action::PointerHover { x, y } => {
                let hover = Some((*x, *y));
                let changed = state.viewport.hover != hover;
                state.viewport.hover = hover;
                (changed, Vec::new())
            }
            _ => (false, Vec::new()),
        }
    }

    fn destroy(&mut self) {
        for registration in self.registrations.drain(..) {
            registration.unregister();
        }
    }
}
