//! Document loading: executes load/reload effects through the engine,
//! forwards task terminals as actions, and watches the open file so edits
//! on disk trigger a debounced reload.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};

use crate::core::EventControl;
use crate::engine::{DocumentEngine, DocumentInfo, EngineError, EngineTask};
use crate::kernel::{
    Action, AppState, DispatchHandle, Effect, LoadStatus, Plugin, PluginContext, PluginDescriptor,
    RegistryError,
};

pub const PLUGIN_ID: &str = "loader";

const RELOAD_DEBOUNCE: Duration = Duration::from_millis(250);

/// Loader capability: the host loop hands loader effects here; worker
/// completions come back through the action bus.
#[derive(Clone)]
pub struct DocumentTasks {
    inner: Rc<RefCell<TasksInner>>,
}

struct TasksInner {
    engine: Arc<dyn DocumentEngine>,
    dispatch: DispatchHandle,
    watcher: Option<RecommendedWatcher>,
    watch_events: Option<Receiver<PathBuf>>,
    reload: EventControl<PathBuf>,
    pending_open: Option<EngineTask<DocumentInfo>>,
}

impl TasksInner {
    fn watch(&mut self, path: &Path) {
        let (tx, rx) = channel();
        let result = notify::recommended_watcher(move |event: notify::Result<notify::Event>| {
            match event {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    for path in event.paths {
                        let _ = tx.send(path);
                    }
                }
                Ok(_) => {}
                Err(error) => tracing::warn!(%error, "document watcher error"),
            }
        });
        let mut watcher = match result {
            Ok(watcher) => watcher,
            Err(error) => {
                tracing::warn!(%error, "document watcher unavailable");
                return;
            }
        };
        if let Err(error) = watcher.watch(path, RecursiveMode::NonRecursive) {
            tracing::warn!(%error, path = %path.display(), "cannot watch document");
            return;
        }
        self.watcher = Some(watcher);
        self.watch_events = Some(rx);
    }
}

impl DocumentTasks {
    fn new(engine: Arc<dyn DocumentEngine>, dispatch: DispatchHandle) -> Self {
        let reload_dispatch = dispatch.clone();
        let reload = EventControl::debounce(RELOAD_DEBOUNCE, move |_path: PathBuf| {
            let _ = reload_dispatch.dispatch(Action::ReloadDocument);
        });
        Self {
            inner: Rc::new(RefCell::new(TasksInner {
                engine,
                dispatch,
                watcher: None,
                watch_events: None,
                reload,
                pending_open: None,
            })),
        }
    }

    /// Starts an engine open, aborting any open still in flight; the task
    /// terminal comes back as `DocumentLoaded`/`DocumentLoadFailed`.
    pub fn load(&self, path: &Path) {
        let mut inner = self.inner.borrow_mut();
        if let Some(previous) = inner.pending_open.take() {
            previous.abort(EngineError::cancelled());
        }
        let task = inner.engine.open(path);
        let on_loaded = inner.dispatch.clone();
        let on_failed = inner.dispatch.clone();
        task.wait(
            move |info| {
                let _ = on_loaded.dispatch(Action::DocumentLoaded(info.clone()));
            },
            move |failure| {
                let _ = on_failed.dispatch(Action::DocumentLoadFailed(failure.reason().clone()));
            },
        );
        inner.pending_open = Some(task);
        inner.watch(path);
    }

    pub fn extract(&self, page_index: usize, start_line: usize, end_line: usize) {
        let inner = self.inner.borrow();
        let task = inner.engine.extract_text(page_index, start_line, end_line);
        let dispatch = inner.dispatch.clone();
        task.wait(
            move |text| {
                let _ = dispatch.dispatch(Action::SelectionExtracted { text: text.clone() });
            },
            move |failure| {
                tracing::warn!(error = %failure.reason(), "text extraction failed");
            },
        );
    }

    pub fn run_effect(&self, effect: &Effect) {
        match effect {
            Effect::LoadDocument(path) | Effect::ReloadDocument(path) => self.load(path),
            Effect::ExtractText {
                page_index,
                start_line,
                end_line,
            } => self.extract(*page_index, *start_line, *end_line),
        }
    }

    /// Drains watcher events into the reload debouncer and fires it when
    /// the silence window elapses.
    pub fn tick(&self, now: Instant) {
        let mut inner = self.inner.borrow_mut();
        let changed: Vec<PathBuf> = match &inner.watch_events {
            Some(rx) => rx.try_iter().collect(),
            None => Vec::new(),
        };
        for path in changed {
            inner.reload.handle(path, now);
        }
        inner.reload.tick(now);
    }

    fn teardown(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.reload.destroy();
        inner.watcher = None;
        inner.watch_events = None;
        if let Some(pending) = inner.pending_open.take() {
            pending.abort(EngineError::cancelled());
        }
    }
}

pub struct LoaderPlugin {
    engine: Arc<dyn DocumentEngine>,
    tasks: Option<DocumentTasks>,
}

impl LoaderPlugin {
    pub fn new(engine: Arc<dyn DocumentEngine>) -> Self {
        Self {
            engine,
            tasks: None,
        }
    }
}

impl Plugin for LoaderPlugin {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new(PLUGIN_ID)
    }

    fn init(&mut self, ctx: &mut PluginContext<'_>) -> Result<(), RegistryError> {
        let tasks = DocumentTasks::new(Arc::clone(&self.engine), ctx.dispatch.clone());
        ctx.capabilities.publish(tasks.clone())?;
        self.tasks = Some(tasks);
        Ok(())
    }

    fn reduce(&mut self, state: &mut AppState, action: &Action) -> (bool, Vec<Effect>) {
        match action {
            Action::Tick { now } => {
                if let Some(tasks) = &self.tasks {
                    tasks.tick(*now);
                }
                (false, Vec::new())
            }
            Action::OpenDocument(path) => {
                state.document.path = Some(path.clone());
                state.document.status = LoadStatus::Loading;
                state.document.error = None;
                (true, vec![Effect::LoadDocument(path.clone())])
            }
            Action::ReloadDocument => match &state.document.path {
                Some(path) => {
                    let path = path.clone();
                    state.document.status = LoadStatus::Loading;
                    (true, vec![Effect::ReloadDocument(path)])
                }
                None => (false, Vec::new()),
            },
            Action::DocumentLoaded(info) => {
                tracing::info!(pages = info.page_count, "document loaded");
                state.document.status = LoadStatus::Ready;
                state.document.info = Some(info.clone());
                state.document.error = None;
                (true, Vec::new())
            }
            Action::DocumentLoadFailed(error) => {
                tracing::warn!(%error, "document load failed");
                state.document.status = LoadStatus::Failed;
                state.document.error = Some(error.clone());
                (true, Vec::new())
            }
            _ => (false, Vec::new()),
        }
    }

    fn destroy(&mut self) {
        if let Some(tasks) = &self.tasks {
            tasks.teardown();
        }
    }
}
