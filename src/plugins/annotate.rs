//! Annotation tool: an exclusive page-scoped mode. A drag sketches a
//! rectangle; release commits it and hands control back to the default
//! mode.

use std::rc::{Rc, Weak};

use crate::core::{PointerEvent, Position, RectF};
use crate::kernel::interaction::{shared_handler, ModeScope, Registration};
use crate::kernel::{
    Action, Annotation, AppState, DispatchHandle, Effect, InteractionHandler, InteractionManager,
    InteractionMode, Plugin, PluginContext, PluginDescriptor, RegistryError,
};

pub const PLUGIN_ID: &str = "annotate";
pub const MODE: &str = "annotate";

struct AnnotateHandler {
    page_index: usize,
    manager: Weak<InteractionManager>,
    dispatch: DispatchHandle,
    anchor: Option<Position>,
}

impl InteractionHandler for AnnotateHandler {
    fn on_pointer_down(&mut self, _event: &PointerEvent, position: Position) {
        self.anchor = Some(position);
    }

    fn on_pointer_up(&mut self, _event: &PointerEvent, position: Position) {
        let Some(anchor) = self.anchor.take() else {
            return;
        };
        let rect = RectF::from_corners(anchor, position);
        if !rect.is_empty() {
            let _ = self.dispatch.dispatch(Action::AddAnnotation {
                page_index: self.page_index,
                rect,
            });
        }
        // Transient tool: done drawing, fall back to the default mode.
        if let Some(manager) = self.manager.upgrade() {
            if let Err(error) = manager.activate_default() {
                tracing::warn!(%error, "annotate could not restore the default mode");
            }
        }
    }

    fn on_handler_active_end(&mut self, _mode: &str) {
        self.anchor = None;
    }
}

pub struct AnnotatePlugin {
    manager: Option<Rc<InteractionManager>>,
    dispatch: Option<DispatchHandle>,
    registrations: Vec<Registration>,
}

impl AnnotatePlugin {
    pub fn new() -> Self {
        Self {
            manager: None,
            dispatch: None,
            registrations: Vec::new(),
        }
    }

    fn register_page_handlers(&mut self, page_count: usize) {
        for registration in self.registrations.drain(..) {
            registration.unregister();
        }
        let (Some(manager), Some(dispatch)) = (&self.manager, &self.dispatch) else {
            return;
        };
        for page_index in 0..page_count {
            let handler = shared_handler(AnnotateHandler {
                page_index,
                manager: Rc::downgrade(manager),
                dispatch: dispatch.clone(),
                anchor: None,
            });
            match manager.register_handlers(&[MODE], handler, Some(page_index)) {
                Ok(registration) => self.registrations.push(registration),
                Err(error) => {
                    tracing::warn!(%error, page_index, "annotate handler registration failed")
                }
            }
        }
    }
}

impl Default for AnnotatePlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for AnnotatePlugin {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::with_dependencies(
            PLUGIN_ID,
            &[super::interaction::PLUGIN_ID, super::loader::PLUGIN_ID],
        )
    }

    fn init(&mut self, ctx: &mut PluginContext<'_>) -> Result<(), RegistryError> {
        let manager = ctx
            .capabilities
            .get::<Rc<InteractionManager>>()
            .ok_or(RegistryError::MissingCapability("interaction manager"))?;
        manager.register_mode(
            InteractionMode::new(MODE, ModeScope::Page)
                .exclusive()
                .with_cursor("crosshair"),
        )?;
        self.manager = Some(manager);
        self.dispatch = Some(ctx.dispatch.clone());
        Ok(())
    }

    fn reduce(&mut self, state: &mut AppState, action: &Action) -> (bool, Vec<Effect>) {
        match action {
            Action::DocumentLoaded(info) => {
                self.register_page_handlers(info.page_count);
                (false, Vec::new())
            }
            Action::AddAnnotation { page_index, rect } => {
                state.annotations.push(Annotation {
                    page_index: *page_index,
                    rect: *rect,
                });
                (true, Vec::new())
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
