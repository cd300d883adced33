//! Handler arena, scope buckets, and registration lifetimes.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;
use slotmap::new_key_type;

use crate::core::{PointerEvent, Position};

use super::InteractionManager;

new_key_type! {
    pub struct HandlerKey;
}

/// Pointer callbacks a tool hangs on the routing layer. All methods default
/// to no-ops so tools implement only what they use; none of them can fail.
#[allow(unused_variables)]
pub trait InteractionHandler: 'static {
    fn on_pointer_down(&mut self, event: &PointerEvent, position: Position) {}
    fn on_pointer_move(&mut self, event: &PointerEvent, position: Position) {}
    fn on_pointer_up(&mut self, event: &PointerEvent, position: Position) {}
    fn on_scroll(&mut self, event: &PointerEvent, dx: f32, dy: f32) {}
    /// Fired when the mode this handler is gated by (or any mode, for
    /// always-active handlers) becomes active.
    fn on_handler_active_start(&mut self, mode: &str) {}
    /// Fired before the active mode changes away.
    fn on_handler_active_end(&mut self, mode: &str) {}
}

pub type SharedHandler = Rc<RefCell<dyn InteractionHandler>>;

pub fn shared_handler<H: InteractionHandler>(handler: H) -> SharedHandler {
    Rc::new(RefCell::new(handler))
}

/// Handler keys split by the geometric scope they were registered against.
#[derive(Default)]
pub(super) struct Buckets {
    pub global: Vec<HandlerKey>,
    pub pages: FxHashMap<usize, Vec<HandlerKey>>,
}

impl Buckets {
    pub fn insert(&mut self, page_index: Option<usize>, key: HandlerKey) {
        match page_index {
            None => self.global.push(key),
            Some(index) => self.pages.entry(index).or_default().push(key),
        }
    }

    pub fn remove(&mut self, key: HandlerKey) {
        self.global.retain(|k| *k != key);
        self.pages.retain(|_, keys| {
            keys.retain(|k| *k != key);
            !keys.is_empty()
        });
    }

    pub fn page_keys(&self, page_index: usize) -> &[HandlerKey] {
        self.pages
            .get(&page_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Global keys first, then every per-page set.
    pub fn all_keys(&self) -> Vec<HandlerKey> {
        let mut keys = self.global.clone();
        for page_keys in self.pages.values() {
            keys.extend_from_slice(page_keys);
        }
        keys
    }
}

/// The effective handler set for one provider scope. Empty means "nothing to
/// do", never an error. Invocation happens outside any manager borrow, so
/// handlers are free to call back into the manager (claim cursors, switch
/// modes).
pub struct MergedHandlers {
    handlers: Vec<SharedHandler>,
}

impl MergedHandlers {
    pub(super) fn new(handlers: Vec<SharedHandler>) -> Self {
        Self { handlers }
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn pointer_down(&self, event: &PointerEvent, position: Position) {
        for handler in &self.handlers {
            handler.borrow_mut().on_pointer_down(event, position);
        }
    }

    pub fn pointer_move(&self, event: &PointerEvent, position: Position) {
        for handler in &self.handlers {
            handler.borrow_mut().on_pointer_move(event, position);
        }
    }

    pub fn pointer_up(&self, event: &PointerEvent, position: Position) {
        for handler in &self.handlers {
            handler.borrow_mut().on_pointer_up(event, position);
        }
    }

    pub fn scroll(&self, event: &PointerEvent, dx: f32, dy: f32) {
        for handler in &self.handlers {
            handler.borrow_mut().on_scroll(event, dx, dy);
        }
    }
}

/// Undo token returned by handler registration. `unregister` is idempotent
/// and holds the manager weakly, so calling it after teardown is a no-op.
pub struct Registration {
    manager: Weak<InteractionManager>,
    key: Cell<Option<HandlerKey>>,
}

impl Registration {
    pub(super) fn new(manager: Weak<InteractionManager>, key: HandlerKey) -> Self {
        Self {
            manager,
            key: Cell::new(Some(key)),
        }
    }

    pub fn unregister(&self) {
        if let Some(key) = self.key.take() {
            if let Some(manager) = self.manager.upgrade() {
                manager.remove_handler(key);
            }
        }
    }

    pub fn is_registered(&self) -> bool {
        self.key.get().is_some()
    }
}
