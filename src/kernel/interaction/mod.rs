//! Mode/handler/cursor state machine arbitrating pointer input.
//!
//! One manager instance exists per viewer session, owned behind `Rc` so the
//! capability surface can be handed to every tool plugin. All machine state
//! sits in one `RefCell`; the borrow is always released before user code
//! (handlers, event subscribers) runs, so tools may claim cursors or switch
//! modes from inside their callbacks. The only call rejected mid-transition
//! is a nested `activate` - the transition sequence assumes one transition
//! at a time.

mod cursor;
mod handlers;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use compact_str::CompactString;
use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::core::{Behavior, Emitter, Scope};

use super::state::{ExclusionRules, InteractionState};

pub use cursor::CursorClaim;
pub use handlers::{
    shared_handler, HandlerKey, InteractionHandler, MergedHandlers, Registration, SharedHandler,
};

use cursor::CursorClaims;
use handlers::Buckets;

/// Built-in mode active at construction; the "nothing special is
/// happening" pointer state.
pub const DEFAULT_MODE: &str = "pointer";

pub type Result<T> = std::result::Result<T, InteractionError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionError {
    UnknownMode(CompactString),
    DuplicateMode(CompactString),
    ReentrantTransition,
}

impl std::fmt::Display for InteractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InteractionError::UnknownMode(id) => write!(f, "mode '{}' was never registered", id),
            InteractionError::DuplicateMode(id) => {
                write!(f, "mode '{}' registered twice", id)
            }
            InteractionError::ReentrantTransition => {
                write!(f, "activate called from inside a mode transition")
            }
        }
    }
}

impl std::error::Error for InteractionError {}

/// Whether a mode's handlers bind to the whole viewer or to single pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeScope {
    Global,
    Page,
}

impl ModeScope {
    fn matches(self, scope: Scope) -> bool {
        matches!(
            (self, scope),
            (ModeScope::Global, Scope::Global) | (ModeScope::Page, Scope::Page { .. })
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionMode {
    pub id: CompactString,
    pub scope: ModeScope,
    pub exclusive: bool,
    /// Baseline cursor shown while this mode is active and no claim is live.
    pub cursor: Option<CompactString>,
    pub wants_raw_touch: bool,
}

impl InteractionMode {
    pub fn new(id: &str, scope: ModeScope) -> Self {
        Self {
            id: CompactString::from(id),
            scope,
            exclusive: false,
            cursor: None,
            wants_raw_touch: false,
        }
    }

    pub fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }

    pub fn with_cursor(mut self, cursor: &str) -> Self {
        self.cursor = Some(CompactString::from(cursor));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModeChange {
    pub previous: CompactString,
    pub active: CompactString,
    pub state: InteractionState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorChange {
    pub cursor: CompactString,
}

/// Fired whenever the registered handler set changes; integration layers
/// re-query their providers on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerChange;

struct ManagerState {
    modes: FxHashMap<CompactString, InteractionMode>,
    arena: SlotMap<HandlerKey, SharedHandler>,
    mode_buckets: FxHashMap<CompactString, Buckets>,
    always: Buckets,
    claims: CursorClaims,
    active_mode: CompactString,
    default_mode: CompactString,
    emitted_cursor: CompactString,
    paused: bool,
    destroyed: bool,
    in_transition: bool,
    exclusion: ExclusionRules,
}

impl ManagerState {
    fn snapshot(&self) -> InteractionState {
        InteractionState {
            active_mode: self.active_mode.clone(),
            default_mode: self.default_mode.clone(),
            cursor: self.emitted_cursor.clone(),
            paused: self.paused || self.destroyed,
            exclusion_rules: self.exclusion.clone(),
        }
    }

    /// Recomputes the effective cursor; returns a change notification only
    /// when the value actually differs from the last emitted one.
    fn refresh_cursor(&mut self) -> Option<CursorChange> {
        let computed = match self.claims.best() {
            Some(claim) => claim.cursor.clone(),
            None => self
                .modes
                .get(&self.active_mode)
                .and_then(|mode| mode.cursor.clone())
                .unwrap_or_else(|| CompactString::from("auto")),
        };
        if computed == self.emitted_cursor {
            return None;
        }
        self.emitted_cursor = computed.clone();
        Some(CursorChange { cursor: computed })
    }

    /// Handlers notified on an activation edge for `mode`: every
    /// always-active handler, then the mode's own buckets - but only the
    /// buckets matching the mode's declared scope.
    fn notify_targets(&self, mode_id: &str) -> Vec<SharedHandler> {
        let mut keys = self.always.all_keys();
        if let (Some(mode), Some(buckets)) =
            (self.modes.get(mode_id), self.mode_buckets.get(mode_id))
        {
            match mode.scope {
                ModeScope::Global => keys.extend_from_slice(&buckets.global),
                ModeScope::Page => {
                    for page_keys in buckets.pages.values() {
                        keys.extend_from_slice(page_keys);
                    }
                }
            }
        }
        keys.iter()
            .filter_map(|key| self.arena.get(*key).cloned())
            .collect()
    }
}

/// Activation passes skip a handler whose cell is already borrowed: that
/// handler is the one whose pointer callback initiated this transition, and
/// it cannot be re-entered.
fn notify_end(targets: &[SharedHandler], mode: &str) {
    for handler in targets {
        match handler.try_borrow_mut() {
            Ok(mut handler) => handler.on_handler_active_end(mode),
            Err(_) => tracing::debug!(mode, "handler busy, active-end skipped"),
        }
    }
}

fn notify_start(targets: &[SharedHandler], mode: &str) {
    for handler in targets {
        match handler.try_borrow_mut() {
            Ok(mut handler) => handler.on_handler_active_start(mode),
            Err(_) => tracing::debug!(mode, "handler busy, active-start skipped"),
        }
    }
}

pub struct InteractionManager {
    /// Handle to self for registrations; set once by [`new`](Self::new).
    weak_self: Weak<InteractionManager>,
    state: RefCell<ManagerState>,
    mode_events: Emitter<ModeChange>,
    cursor_events: Emitter<CursorChange>,
    handler_events: Emitter<HandlerChange>,
    state_events: Behavior<InteractionState>,
}

impl InteractionManager {
    pub fn new() -> Rc<Self> {
        let mut modes = FxHashMap::default();
        modes.insert(
            CompactString::from(DEFAULT_MODE),
            InteractionMode::new(DEFAULT_MODE, ModeScope::Global),
        );
        let state = ManagerState {
            modes,
            arena: SlotMap::with_key(),
            mode_buckets: FxHashMap::default(),
            always: Buckets::default(),
            claims: CursorClaims::default(),
            active_mode: CompactString::from(DEFAULT_MODE),
            default_mode: CompactString::from(DEFAULT_MODE),
            emitted_cursor: CompactString::from("auto"),
            paused: false,
            destroyed: false,
            in_transition: false,
            exclusion: ExclusionRules::default(),
        };
        let initial = state.snapshot();
        Rc::new_cyclic(|weak_self| Self {
            weak_self: weak_self.clone(),
            state: RefCell::new(state),
            mode_events: Emitter::new(),
            cursor_events: Emitter::new(),
            handler_events: Emitter::new(),
            state_events: Behavior::new(initial),
        })
    }

    // --- modes ---------------------------------------------------------

    /// Registers a mode. The mode set is append-only; re-registering an id
    /// is a configuration error.
    pub fn register_mode(&self, mode: InteractionMode) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.modes.contains_key(&mode.id) {
            return Err(InteractionError::DuplicateMode(mode.id));
        }
        state.modes.insert(mode.id.clone(), mode);
        Ok(())
    }

    pub fn mode(&self, id: &str) -> Option<InteractionMode> {
        self.state.borrow().modes.get(id).cloned()
    }

    pub fn active_mode(&self) -> CompactString {
        self.state.borrow().active_mode.clone()
    }

    pub fn default_mode(&self) -> CompactString {
        self.state.borrow().default_mode.clone()
    }

    pub fn active_mode_is_exclusive(&self) -> bool {
        let state = self.state.borrow();
        state
            .modes
            .get(&state.active_mode)
            .map(|mode| mode.exclusive)
            .unwrap_or(false)
    }

    /// Switches the active mode, running the full transition sequence:
    /// claims cleared, active-end pass, store-visible switch, cursor
    /// re-derivation, active-start pass, mode-change notification.
    pub fn activate(&self, mode_id: &str) -> Result<()> {
        let (previous, end_targets) = {
            let mut state = self.state.borrow_mut();
            if state.in_transition {
                return Err(InteractionError::ReentrantTransition);
            }
            if !state.modes.contains_key(mode_id) {
                return Err(InteractionError::UnknownMode(CompactString::from(mode_id)));
            }
            if state.active_mode.as_str() == mode_id {
                return Ok(());
            }
            state.in_transition = true;
            // Cursor ownership belongs to the tool in control; a dangling
            // claim from the outgoing mode must not outrank the new tool.
            state.claims.clear();
            let previous = state.active_mode.clone();
            let end_targets = state.notify_targets(&previous);
            (previous, end_targets)
        };

        notify_end(&end_targets, previous.as_str());

        let (cursor_change, start_targets) = {
            let mut state = self.state.borrow_mut();
            state.active_mode = CompactString::from(mode_id);
            let cursor_change = state.refresh_cursor();
            let start_targets = state.notify_targets(mode_id);
            (cursor_change, start_targets)
        };

        if let Some(change) = &cursor_change {
            self.cursor_events.emit(change);
        }
        notify_start(&start_targets, mode_id);

        let snapshot = self.snapshot();
        self.mode_events.emit(&ModeChange {
            previous,
            active: CompactString::from(mode_id),
            state: snapshot.clone(),
        });
        self.state_events.publish(snapshot);

        self.state.borrow_mut().in_transition = false;
        tracing::debug!(mode = mode_id, "interaction mode activated");
        Ok(())
    }

    pub fn activate_default(&self) -> Result<()> {
        let default = self.default_mode();
        self.activate(default.as_str())
    }

    pub fn set_default_mode(&self, mode_id: &str) -> Result<()> {
        {
            let mut state = self.state.borrow_mut();
            if !state.modes.contains_key(mode_id) {
                return Err(InteractionError::UnknownMode(CompactString::from(mode_id)));
            }
            if state.default_mode.as_str() == mode_id {
                return Ok(());
            }
            state.default_mode = CompactString::from(mode_id);
        }
        self.state_events.publish(self.snapshot());
        Ok(())
    }

    // --- handlers ------------------------------------------------------

    /// Registers a handler set under one or more modes, into the mode's
    /// global bucket or one page bucket. Returns an idempotent undo token.
    pub fn register_handlers(
        &self,
        mode_ids: &[&str],
        handler: SharedHandler,
        page_index: Option<usize>,
    ) -> Result<Registration> {
        let key = {
            let mut state = self.state.borrow_mut();
            for id in mode_ids {
                if !state.modes.contains_key(*id) {
                    return Err(InteractionError::UnknownMode(CompactString::from(*id)));
                }
            }
            let key = state.arena.insert(handler);
            for id in mode_ids {
                state
                    .mode_buckets
                    .entry(CompactString::from(*id))
                    .or_default()
                    .insert(page_index, key);
            }
            key
        };
        self.handler_events.emit(&HandlerChange);
        Ok(Registration::new(self.weak_self.clone(), key))
    }

    /// Registers a handler set that runs regardless of the active mode,
    /// for cross-tool overlays.
    pub fn register_always(&self, handler: SharedHandler, page_index: Option<usize>) -> Registration {
        let key = {
            let mut state = self.state.borrow_mut();
            let key = state.arena.insert(handler);
            state.always.insert(page_index, key);
            key
        };
        self.handler_events.emit(&HandlerChange);
        Registration::new(self.weak_self.clone(), key)
    }

    pub(super) fn remove_handler(&self, key: HandlerKey) {
        let removed = {
            let mut state = self.state.borrow_mut();
            let removed = state.arena.remove(key).is_some();
            if removed {
                state.always.remove(key);
                for buckets in state.mode_buckets.values_mut() {
                    buckets.remove(key);
                }
            }
            removed
        };
        if removed {
            self.handler_events.emit(&HandlerChange);
        }
    }

    /// The merged handler set a provider for `scope` should invoke:
    /// always-active handlers for that exact scope, plus the active mode's
    /// bucketed handlers - the latter only when the mode's own declared
    /// scope equals the requested scope.
    pub fn handlers_for_scope(&self, scope: Scope) -> MergedHandlers {
        let state = self.state.borrow();
        let mut keys: Vec<HandlerKey> = Vec::new();
        match scope {
            Scope::Global => keys.extend_from_slice(&state.always.global),
            Scope::Page { page_index } => keys.extend_from_slice(state.always.page_keys(page_index)),
        }
        let scope_matches = state
            .modes
            .get(&state.active_mode)
            .map(|mode| mode.scope.matches(scope))
            .unwrap_or(false);
        if scope_matches {
            if let Some(buckets) = state.mode_buckets.get(&state.active_mode) {
                match scope {
                    Scope::Global => keys.extend_from_slice(&buckets.global),
                    Scope::Page { page_index } => {
                        keys.extend_from_slice(buckets.page_keys(page_index))
                    }
                }
            }
        }
        let handlers = keys
            .iter()
            .filter_map(|key| state.arena.get(*key).cloned())
            .collect();
        MergedHandlers::new(handlers)
    }

    // --- cursor --------------------------------------------------------

    pub fn set_cursor(&self, token: &str, cursor: &str, priority: i32) {
        let change = {
            let mut state = self.state.borrow_mut();
            state.claims.set(token, cursor, priority);
            state.refresh_cursor()
        };
        self.emit_cursor(change);
    }

    pub fn remove_cursor(&self, token: &str) {
        let change = {
            let mut state = self.state.borrow_mut();
            if !state.claims.remove(token) {
                return;
            }
            state.refresh_cursor()
        };
        self.emit_cursor(change);
    }

    fn emit_cursor(&self, change: Option<CursorChange>) {
        if let Some(change) = change {
            self.cursor_events.emit(&change);
            self.state_events.publish(self.snapshot());
        }
    }

    pub fn effective_cursor(&self) -> CompactString {
        self.state.borrow().emitted_cursor.clone()
    }

    // --- pause / lifecycle ---------------------------------------------

    pub fn pause(&self) {
        self.set_paused(true);
    }

    pub fn resume(&self) {
        self.set_paused(false);
    }

    fn set_paused(&self, paused: bool) {
        {
            let mut state = self.state.borrow_mut();
            if state.paused == paused {
                return;
            }
            state.paused = paused;
        }
        self.state_events.publish(self.snapshot());
    }

    /// True while paused - and unconditionally after the owning registry is
    /// gone, so late events are dropped instead of reaching torn-down
    /// handler state.
    pub fn is_paused(&self) -> bool {
        let state = self.state.borrow();
        state.destroyed || state.paused
    }

    pub(crate) fn mark_destroyed(&self) {
        self.state.borrow_mut().destroyed = true;
        self.state_events.publish(self.snapshot());
    }

    // --- exclusion rules -----------------------------------------------

    pub fn add_exclusion_class(&self, class: &str) {
        let changed = self.state.borrow_mut().exclusion.add_class(class);
        self.publish_if(changed);
    }

    pub fn remove_exclusion_class(&self, class: &str) {
        let changed = self.state.borrow_mut().exclusion.remove_class(class);
        self.publish_if(changed);
    }

    pub fn add_exclusion_attribute(&self, attribute: &str) {
        let changed = self
            .state
            .borrow_mut()
            .exclusion
            .add_data_attribute(attribute);
        self.publish_if(changed);
    }

    pub fn remove_exclusion_attribute(&self, attribute: &str) {
        let changed = self
            .state
            .borrow_mut()
            .exclusion
            .remove_data_attribute(attribute);
        self.publish_if(changed);
    }

    pub fn exclusion_rules(&self) -> ExclusionRules {
        self.state.borrow().exclusion.clone()
    }

    fn publish_if(&self, changed: bool) {
        if changed {
            self.state_events.publish(self.snapshot());
        }
    }

    // --- observation ---------------------------------------------------

    pub fn snapshot(&self) -> InteractionState {
        self.state.borrow().snapshot()
    }

    pub fn on_mode_change(&self) -> &Emitter<ModeChange> {
        &self.mode_events
    }

    pub fn on_cursor_change(&self) -> &Emitter<CursorChange> {
        &self.cursor_events
    }

    pub fn on_handler_change(&self) -> &Emitter<HandlerChange> {
        &self.handler_events
    }

    /// Behavior stream: new subscribers immediately receive the current
    /// state, then every subsequent change.
    pub fn on_state_change(&self) -> &Behavior<InteractionState> {
        &self.state_events
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/interaction.rs"]
mod tests;
