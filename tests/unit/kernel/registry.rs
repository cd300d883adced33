use super::*;
use std::cell::RefCell;
use std::rc::Rc;

use crate::kernel::{Effect, PluginDescriptor};

struct ProbePlugin {
    id: &'static str,
    deps: &'static [&'static str],
    log: Rc<RefCell<Vec<String>>>,
}

impl ProbePlugin {
    fn boxed(
        id: &'static str,
        deps: &'static [&'static str],
        log: &Rc<RefCell<Vec<String>>>,
    ) -> Box<dyn Plugin> {
        Box::new(Self {
            id,
            deps,
            log: Rc::clone(log),
        })
    }
}

impl Plugin for ProbePlugin {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::with_dependencies(self.id, self.deps)
    }

    fn init(&mut self, _ctx: &mut PluginContext<'_>) -> Result<(), RegistryError> {
        self.log.borrow_mut().push(format!("init:{}", self.id));
        Ok(())
    }

    fn reduce(&mut self, state: &mut AppState, action: &Action) -> (bool, Vec<Effect>) {
        match action {
            Action::PointerHover { x, y } => {
                state.viewport.hover = Some((*x, *y));
                self.log.borrow_mut().push(format!("reduce:{}", self.id));
                (true, Vec::new())
            }
            Action::ReloadDocument => (
                false,
                vec![Effect::ExtractText {
                    page_index: 0,
                    start_line: 0,
                    end_line: 0,
                }],
            ),
            _ => (false, Vec::new()),
        }
    }

    fn on_store_updated(&mut self, _prev: &AppState, _next: &AppState) {
        self.log.borrow_mut().push(format!("updated:{}", self.id));
    }

    fn destroy(&mut self) {
        self.log.borrow_mut().push(format!("destroy:{}", self.id));
    }
}

fn log() -> Rc<RefCell<Vec<String>>> {
    Rc::new(RefCell::new(Vec::new()))
}

#[test]
fn initialization_follows_dependency_order() {
    let events = log();
    let mut registry = PluginRegistry::new(AppState::new());
    registry
        .register(ProbePlugin::boxed("viewer", &["loader"], &events))
        .unwrap();
    registry.register(ProbePlugin::boxed("loader", &[], &events)).unwrap();
    registry.initialize().unwrap();

    assert_eq!(*events.borrow(), vec!["init:loader", "init:viewer"]);
    assert_eq!(registry.load_order(), vec!["loader", "viewer"]);
}

#[test]
fn circular_dependencies_abort_initialization() {
    let events = log();
    let mut registry = PluginRegistry::new(AppState::new());
    registry.register(ProbePlugin::boxed("a", &["b"], &events)).unwrap();
    registry.register(ProbePlugin::boxed("b", &["a"], &events)).unwrap();

    assert!(matches!(
        registry.initialize(),
        Err(RegistryError::Resolve(ResolveError::CircularDependency { .. }))
    ));
    assert!(events.borrow().is_empty());
}

#[test]
fn unknown_dependency_aborts_initialization() {
    let events = log();
    let mut registry = PluginRegistry::new(AppState::new());
    registry.register(ProbePlugin::boxed("a", &["ghost"], &events)).unwrap();

    assert!(matches!(
        registry.initialize(),
        Err(RegistryError::Resolve(ResolveError::UnknownDependency { .. }))
    ));
}

#[test]
fn duplicate_plugin_ids_are_rejected_at_registration() {
    let events = log();
    let mut registry = PluginRegistry::new(AppState::new());
    registry.register(ProbePlugin::boxed("a", &[], &events)).unwrap();
    assert!(matches!(
        registry.register(ProbePlugin::boxed("a", &[], &events)),
        Err(RegistryError::DuplicatePlugin(_))
    ));
}

#[test]
fn registration_after_initialize_is_rejected() {
    let events = log();
    let mut registry = PluginRegistry::new(AppState::new());
    registry.register(ProbePlugin::boxed("a", &[], &events)).unwrap();
    registry.initialize().unwrap();
    assert!(matches!(
        registry.register(ProbePlugin::boxed("b", &[], &events)),
        Err(RegistryError::AlreadyInitialized)
    ));
}

#[test]
fn dispatch_reaches_every_reducer_in_load_order() {
    let events = log();
    let mut registry = PluginRegistry::new(AppState::new());
    registry
        .register(ProbePlugin::boxed("second", &["first"], &events))
        .unwrap();
    registry.register(ProbePlugin::boxed("first", &[], &events)).unwrap();
    registry.initialize().unwrap();
    events.borrow_mut().clear();

    let result = registry.dispatch(Action::PointerHover { x: 3.0, y: 4.0 });

    assert!(result.state_changed);
    assert_eq!(registry.state().viewport.hover, Some((3.0, 4.0)));
    assert_eq!(
        *events.borrow(),
        vec![
            "reduce:first",
            "reduce:second",
            "updated:first",
            "updated:second"
        ]
    );
}

#[test]
fn unchanged_dispatch_skips_store_update_notifications() {
    let events = log();
    let mut registry = PluginRegistry::new(AppState::new());
    registry.register(ProbePlugin::boxed("a", &[], &events)).unwrap();
    registry.initialize().unwrap();
    events.borrow_mut().clear();

    let result = registry.dispatch(Action::Pause);
    assert!(!result.state_changed);
    assert!(events.borrow().is_empty());
}

#[test]
fn reducer_effects_surface_in_the_dispatch_result() {
    let events = log();
    let mut registry = PluginRegistry::new(AppState::new());
    registry.register(ProbePlugin::boxed("a", &[], &events)).unwrap();
    registry.initialize().unwrap();

    let result = registry.dispatch(Action::ReloadDocument);
    assert_eq!(result.effects.len(), 1);
    assert!(matches!(result.effects[0], Effect::ExtractText { .. }));
}

#[test]
fn pump_drains_actions_queued_on_the_bus() {
    let events = log();
    let mut registry = PluginRegistry::new(AppState::new());
    registry.register(ProbePlugin::boxed("a", &[], &events)).unwrap();
    registry.initialize().unwrap();

    let handle = registry.dispatch_handle();
    handle.dispatch(Action::PointerHover { x: 1.0, y: 1.0 }).unwrap();
    handle.dispatch(Action::PointerHover { x: 2.0, y: 2.0 }).unwrap();

    let result = registry.pump();
    assert!(result.state_changed);
    assert_eq!(registry.state().viewport.hover, Some((2.0, 2.0)));
}

#[test]
fn destroy_runs_in_reverse_load_order_and_silences_dispatch() {
    let events = log();
    let mut registry = PluginRegistry::new(AppState::new());
    registry
        .register(ProbePlugin::boxed("second", &["first"], &events))
        .unwrap();
    registry.register(ProbePlugin::boxed("first", &[], &events)).unwrap();
    registry.initialize().unwrap();
    events.borrow_mut().clear();

    registry.destroy();
    registry.destroy();
    assert_eq!(*events.borrow(), vec!["destroy:second", "destroy:first"]);

    let result = registry.dispatch(Action::PointerHover { x: 1.0, y: 1.0 });
    assert!(!result.state_changed);
    assert_eq!(registry.state().viewport.hover, None);
}

struct PublishingPlugin;

#[derive(Clone, PartialEq, Debug)]
struct SharedNumber(u32);

impl Plugin for PublishingPlugin {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new("publisher")
    }

    fn init(&mut self, ctx: &mut PluginContext<'_>) -> Result<(), RegistryError> {
        ctx.capabilities.publish(SharedNumber(42))
    }
}

struct ConsumingPlugin {
    seen: Rc<RefCell<Option<SharedNumber>>>,
}

impl Plugin for ConsumingPlugin {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::with_dependencies("consumer", &["publisher"])
    }

    fn init(&mut self, ctx: &mut PluginContext<'_>) -> Result<(), RegistryError> {
        *self.seen.borrow_mut() = ctx.capabilities.get::<SharedNumber>();
        Ok(())
    }
}

#[test]
fn capabilities_flow_from_dependencies_to_dependents() {
    let seen = Rc::new(RefCell::new(None));
    let mut registry = PluginRegistry::new(AppState::new());
    registry
        .register(Box::new(ConsumingPlugin {
            seen: Rc::clone(&seen),
        }))
        .unwrap();
    registry.register(Box::new(PublishingPlugin)).unwrap();
    registry.initialize().unwrap();

    assert_eq!(*seen.borrow(), Some(SharedNumber(42)));
}
