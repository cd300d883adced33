//! Select tool: a page-scoped mode tracking a line range per drag, with
//! text extraction through the engine on release.

use std::rc::Rc;

use crate::core::{PointerEvent, Position};
use crate::kernel::interaction::{shared_handler, ModeScope, Registration};
use crate::kernel::{
    Action, AppState, DispatchHandle, Effect, InteractionHandler, InteractionManager,
    InteractionMode, Plugin, PluginContext, PluginDescriptor, RegistryError, SelectionSpan,
};

pub const PLUGIN_ID: &str = "select";
pub const MODE: &str = "select";

struct SelectHandler {
    page_index: usize,
    dispatch: DispatchHandle,
    anchor: Option<usize>,
}

impl SelectHandler {
    fn line_at(position: Position) -> usize {
        position.y.max(0.0) as usize
    }
}

impl InteractionHandler for SelectHandler {
    fn on_pointer_down(&mut self, _event: &PointerEvent, position: Position) {
        let line = Self::line_at(position);
        self.anchor = Some(line);
        let _ = self.dispatch.dispatch(Action::SetSelection(SelectionSpan {
            page_index: self.page_index,
            start_line: line,
            end_line: line,
        }));
    }

    fn on_pointer_move(&mut self, _event: &PointerEvent, position: Position) {
        if let Some(anchor) = self.anchor {
            let _ = self.dispatch.dispatch(Action::SetSelection(SelectionSpan {
                page_index: self.page_index,
                start_line: anchor,
                end_line: Self::line_at(position),
            }));
        }
    }

    fn on_pointer_up(&mut self, _event: &PointerEvent, _position: Position) {
        if self.anchor.take().is_some() {
            let _ = self.dispatch.dispatch(Action::ExtractSelection);
        }
    }

    fn on_handler_active_end(&mut self, _mode: &str) {
        self.anchor = None;
    }
}

pub struct SelectPlugin {
    manager: Option<Rc<InteractionManager>>,
    dispatch: Option<DispatchHandle>,
    registrations: Vec<Registration>,
}

impl SelectPlugin {
    pub fn new() -> Self {
        Self {
            manager: None,
            dispatch: None,
            registrations: Vec::new(),
        }
    }

    /// One handler per page; registrations are replaced wholesale whenever a
    /// document (re)load changes the page count.
    fn register_page_handlers(&mut self, page_count: usize) {
        for registration in self.registrations.drain(..) {
            registration.unregister();
        }
        let (Some(manager), Some(dispatch)) = (&self.manager, &self.dispatch) else {
            return;
        };
        for page_index in 0..page_count {
            let handler = shared_handler(SelectHandler {
                page_index,
                dispatch: dispatch.clone(),
                anchor: None,
            });
            match manager.register_handlers(&[MODE], handler, Some(page_index)) {
                Ok(registration) => self.registrations.push(registration),
                Err(error) => tracing::warn!(%error, page_index, "select handler registration failed"),
            }
        }
    }
}

impl Default for SelectPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for SelectPlugin {
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
        manager.register_mode(InteractionMode::new(MODE, ModeScope::Page).with_cursor("text"))?;
        self.manager = Some(manager);
        self.dispatch = Some(ctx.dispatch.clone());
        Ok(())
    }

    fn reduce(&mut self, state: &mut AppState, action: &Action) -> (bool, Vec<Effect>) {
        match action {
            Action::DocumentLoaded(info) => {
                self.register_page_handlers(info.page_count);
                let changed = state.selection != Default::default();
                state.selection = Default::default();
                (changed, Vec::new())
            }
            Action::SetSelection(span) => {
                state.selection.span = Some(*span);
                state.selection.text = None;
                (true, Vec::new())
            }
            Action::ClearSelection => {
                let changed = state.selection.span.is_some() || state.selection.text.is_some();
                state.selection = Default::default();
                (changed, Vec::new())
            }
            Action::ExtractSelection => match state.selection.span {
                Some(span) => {
                    let (start_line, end_line) = span.ordered();
                    (
                        false,
                        vec![Effect::ExtractText {
                            page_index: span.page_index,
                            start_line,
                            end_line,
                        }],
                    )
                }
                None => (false, Vec::new()),
            },
            Action::SelectionExtracted { text } => {
                state.selection.text = Some(text.clone());
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
