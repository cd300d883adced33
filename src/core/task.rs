//! Single-assignment observable futures for engine operations.
//!
//! A [`Task`] starts `Pending` and makes exactly one transition, to
//! `Resolved`, `Rejected` or `Aborted`; the first transition wins and later
//! attempts are no-ops. Completion callbacks fire once, in registration
//! order, outside the state lock. Progress is a fan-out channel that only
//! carries values while the task is pending.
//!
//! Workers complete tasks from their own threads; everything here is `Send`
//! and the handle is cheaply cloneable.

use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll, Waker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Resolved,
    Rejected,
    Aborted,
}

/// Terminal error of a task, tagged with how it terminated: `Rejected`
/// signals failure, `Aborted` voluntary cancellation. Both carry the same
/// reason shape so errors forward through [`Task::fail`] unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFailure<E> {
    Rejected(E),
    Aborted(E),
}

impl<E> TaskFailure<E> {
    pub fn reason(&self) -> &E {
        match self {
            TaskFailure::Rejected(reason) | TaskFailure::Aborted(reason) => reason,
        }
    }

    pub fn into_reason(self) -> E {
        match self {
            TaskFailure::Rejected(reason) | TaskFailure::Aborted(reason) => reason,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, TaskFailure::Aborted(_))
    }
}

/// Per-input outcome reported by [`Task::all_settled`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskSettledResult<T, E> {
    Resolved(T),
    Rejected(E),
    Aborted(E),
}

impl<T, E> TaskSettledResult<T, E> {
    pub fn status(&self) -> TaskStatus {
        match self {
            TaskSettledResult::Resolved(_) => TaskStatus::Resolved,
            TaskSettledResult::Rejected(_) => TaskStatus::Rejected,
            TaskSettledResult::Aborted(_) => TaskStatus::Aborted,
        }
    }
}

enum State<T, E> {
    Pending,
    Resolved(T),
    Failed(TaskFailure<E>),
}

type ResolvedCallback<T> = Box<dyn FnOnce(&T) + Send>;
type RejectedCallback<E> = Box<dyn FnOnce(&TaskFailure<E>) + Send>;
type ProgressCallback<P> = Box<dyn FnMut(&P) + Send>;

struct Shared<T, E, P> {
    state: State<T, E>,
    on_resolved: Vec<ResolvedCallback<T>>,
    on_rejected: Vec<RejectedCallback<E>>,
    on_progress: Vec<ProgressCallback<P>>,
    wakers: Vec<Waker>,
}

pub struct Task<T, E, P = ()> {
    shared: Arc<Mutex<Shared<T, E, P>>>,
}

impl<T, E, P> Clone for Task<T, E, P> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

fn relock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<T, E, P> Task<T, E, P>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
    P: Send + 'static,
{
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                state: State::Pending,
                on_resolved: Vec::new(),
                on_rejected: Vec::new(),
                on_progress: Vec::new(),
                wakers: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared<T, E, P>> {
        relock(&self.shared)
    }

    pub fn status(&self) -> TaskStatus {
        match &self.lock().state {
            State::Pending => TaskStatus::Pending,
            State::Resolved(_) => TaskStatus::Resolved,
            State::Failed(TaskFailure::Rejected(_)) => TaskStatus::Rejected,
            State::Failed(TaskFailure::Aborted(_)) => TaskStatus::Aborted,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.lock().state, State::Pending)
    }

    pub fn result(&self) -> Option<T> {
        match &self.lock().state {
            State::Resolved(value) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<TaskFailure<E>> {
        match &self.lock().state {
            State::Failed(failure) => Some(failure.clone()),
            _ => None,
        }
    }

    /// Transitions to `Resolved`. No-op if already terminal.
    pub fn resolve(&self, value: T) {
        let (callbacks, wakers) = {
            let mut shared = self.lock();
            if !matches!(shared.state, State::Pending) {
                return;
            }
            shared.state = State::Resolved(value.clone());
            shared.on_rejected.clear();
            shared.on_progress.clear();
            (
                mem::take(&mut shared.on_resolved),
                mem::take(&mut shared.wakers),
            )
        };
        for callback in callbacks {
            callback(&value);
        }
        for waker in wakers {
            waker.wake();
        }
    }

    /// Transitions to `Rejected`. No-op if already terminal.
    pub fn reject(&self, reason: E) {
        self.fail(TaskFailure::Rejected(reason));
    }

    /// Cooperative cancellation: transitions to `Aborted`. No-op if already
    /// terminal.
    pub fn abort(&self, reason: E) {
        self.fail(TaskFailure::Aborted(reason));
    }

    /// Forwards a terminal error from another task, preserving the
    /// rejected/aborted tag. No-op if already terminal.
    pub fn fail(&self, failure: TaskFailure<E>) {
        let (callbacks, wakers) = {
            let mut shared = self.lock();
            if !matches!(shared.state, State::Pending) {
                return;
            }
            shared.state = State::Failed(failure.clone());
            shared.on_resolved.clear();
            shared.on_progress.clear();
            (
                mem::take(&mut shared.on_rejected),
                mem::take(&mut shared.wakers),
            )
        };
        for callback in callbacks {
            callback(&failure);
        }
        for waker in wakers {
            waker.wake();
        }
    }

    /// Registers completion callbacks. They fire exactly once: immediately if
    /// the task is already terminal, otherwise at the terminal transition.
    /// `on_rejected` receives both rejections and aborts, tagged.
    pub fn wait(
        &self,
        on_resolved: impl FnOnce(&T) + Send + 'static,
        on_rejected: impl FnOnce(&TaskFailure<E>) + Send + 'static,
    ) {
        let mut on_resolved = Some(on_resolved);
        let mut on_rejected = Some(on_rejected);
        let immediate = {
            let mut guard = self.lock();
            let shared = &mut *guard;
            match &shared.state {
                State::Pending => {
                    if let Some(callback) = on_resolved.take() {
                        shared.on_resolved.push(Box::new(callback));
                    }
                    if let Some(callback) = on_rejected.take() {
                        shared.on_rejected.push(Box::new(callback));
                    }
                    None
                }
                State::Resolved(value) => Some(Ok(value.clone())),
                State::Failed(failure) => Some(Err(failure.clone())),
            }
        };
        match immediate {
            Some(Ok(value)) => {
                if let Some(callback) = on_resolved.take() {
                    callback(&value);
                }
            }
            Some(Err(failure)) => {
                if let Some(callback) = on_rejected.take() {
                    callback(&failure);
                }
            }
            None => {}
        }
    }

    /// Registers a progress observer. Dropped silently if the task is
    /// already terminal; progress is a property of still-working tasks.
    pub fn on_progress(&self, callback: impl FnMut(&P) + Send + 'static) {
        let mut shared = self.lock();
        if matches!(shared.state, State::Pending) {
            shared.on_progress.push(Box::new(callback));
        }
    }

    /// Fans a progress value out to every registered observer. Progress
    /// emitted after termination is dropped.
    pub fn progress(&self, value: P) {
        let mut callbacks = {
            let mut shared = self.lock();
            if !matches!(shared.state, State::Pending) {
                return;
            }
            mem::take(&mut shared.on_progress)
        };
        for callback in callbacks.iter_mut() {
            callback(&value);
        }
        let mut shared = self.lock();
        if matches!(shared.state, State::Pending) {
            // Observers registered while emitting were appended to the
            // (empty) shared list; keep them after the originals.
            let added = mem::take(&mut shared.on_progress);
            callbacks.extend(added);
            shared.on_progress = callbacks;
        }
    }

    /// Adapts the task into `async`/`.await` without changing terminal
    /// semantics.
    pub fn future(&self) -> TaskFuture<T, E, P> {
        TaskFuture { task: self.clone() }
    }

    /// Resolves with every result once all inputs resolve; fails with the
    /// first non-resolved terminal, without waiting for the rest.
    pub fn all(tasks: Vec<Task<T, E, P>>) -> Task<Vec<T>, E> {
        let aggregate: Task<Vec<T>, E> = Task::new();
        let total = tasks.len();
        if total == 0 {
            aggregate.resolve(Vec::new());
            return aggregate;
        }
        let slots = new_slots::<T>(total);
        for (index, task) in tasks.iter().enumerate() {
            let slots = Arc::clone(&slots);
            let done = aggregate.clone();
            let failed = aggregate.clone();
            task.wait(
                move |value| {
                    if let Some(values) = store_slot(&slots, index, value.clone(), total) {
                        done.resolve(values);
                    }
                },
                move |failure| failed.fail(failure.clone()),
            );
        }
        aggregate
    }

    /// Always resolves, with one tagged outcome per input task.
    pub fn all_settled(tasks: Vec<Task<T, E, P>>) -> Task<Vec<TaskSettledResult<T, E>>, E> {
        let aggregate: Task<Vec<TaskSettledResult<T, E>>, E> = Task::new();
        let total = tasks.len();
        if total == 0 {
            aggregate.resolve(Vec::new());
            return aggregate;
        }
        let slots = new_slots::<TaskSettledResult<T, E>>(total);
        for (index, task) in tasks.iter().enumerate() {
            let resolved_slots = Arc::clone(&slots);
            let failed_slots = Arc::clone(&slots);
            let done = aggregate.clone();
            let done_on_failure = aggregate.clone();
            task.wait(
                move |value| {
                    let entry = TaskSettledResult::Resolved(value.clone());
                    if let Some(entries) = store_slot(&resolved_slots, index, entry, total) {
                        done.resolve(entries);
                    }
                },
                move |failure| {
                    let entry = match failure {
                        TaskFailure::Rejected(reason) => {
                            TaskSettledResult::Rejected(reason.clone())
                        }
                        TaskFailure::Aborted(reason) => TaskSettledResult::Aborted(reason.clone()),
                    };
                    if let Some(entries) = store_slot(&failed_slots, index, entry, total) {
                        done_on_failure.resolve(entries);
                    }
                },
            );
        }
        aggregate
    }

    /// Settles with whichever input settles first, forwarding its outcome
    /// verbatim. An empty input never settles.
    pub fn race(tasks: Vec<Task<T, E, P>>) -> Task<T, E> {
        let aggregate: Task<T, E> = Task::new();
        for task in &tasks {
            let win = aggregate.clone();
            let lose = aggregate.clone();
            task.wait(
                move |value| win.resolve(value.clone()),
                move |failure| lose.fail(failure.clone()),
            );
        }
        aggregate
    }

    /// Like [`Task::all`], but reports `(terminated_count, total)` each time
    /// any input reaches a terminal state, before the aggregate settles.
    pub fn with_progress<F>(tasks: Vec<Task<T, E, P>>, on_progress: F) -> Task<Vec<T>, E>
    where
        F: FnMut(usize, usize) + Send + 'static,
    {
        let aggregate: Task<Vec<T>, E> = Task::new();
        let total = tasks.len();
        if total == 0 {
            aggregate.resolve(Vec::new());
            return aggregate;
        }
        let slots = new_slots::<T>(total);
        let terminated = Arc::new(Mutex::new(0usize));
        let report = Arc::new(Mutex::new(on_progress));
        for (index, task) in tasks.iter().enumerate() {
            let slots = Arc::clone(&slots);
            let done = aggregate.clone();
            let failed = aggregate.clone();
            let resolved_count = Arc::clone(&terminated);
            let failed_count = Arc::clone(&terminated);
            let resolved_report = Arc::clone(&report);
            let failed_report = Arc::clone(&report);
            task.wait(
                move |value| {
                    let count = {
                        let mut count = relock(&resolved_count);
                        *count += 1;
                        *count
                    };
                    {
                        let mut report = relock(&resolved_report);
                        (*report)(count, total);
                    }
                    if let Some(values) = store_slot(&slots, index, value.clone(), total) {
                        done.resolve(values);
                    }
                },
                move |failure| {
                    let count = {
                        let mut count = relock(&failed_count);
                        *count += 1;
                        *count
                    };
                    {
                        let mut report = relock(&failed_report);
                        (*report)(count, total);
                    }
                    failed.fail(failure.clone());
                },
            );
        }
        aggregate
    }
}

impl<T, E, P> Default for Task<T, E, P>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
    P: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

type Slots<V> = Arc<Mutex<(Vec<Option<V>>, usize)>>;

fn new_slots<V>(total: usize) -> Slots<V> {
    Arc::new(Mutex::new(((0..total).map(|_| None).collect(), 0)))
}

/// Stores one per-index value; returns the full ordered vec once every slot
/// is filled.
fn store_slot<V>(slots: &Slots<V>, index: usize, value: V, total: usize) -> Option<Vec<V>> {
    let mut guard = relock(slots);
    if guard.0[index].is_none() {
        guard.1 += 1;
    }
    guard.0[index] = Some(value);
    if guard.1 == total {
        Some(guard.0.iter_mut().filter_map(Option::take).collect())
    } else {
        None
    }
}

pub struct TaskFuture<T, E, P = ()> {
    task: Task<T, E, P>,
}

impl<T, E, P> Future for TaskFuture<T, E, P>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
    P: Send + 'static,
{
    type Output = Result<T, TaskFailure<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut guard = self.task.lock();
        let shared = &mut *guard;
        match &shared.state {
            State::Pending => {
                if !shared.wakers.iter().any(|waker| waker.will_wake(cx.waker())) {
                    shared.wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
            State::Resolved(value) => Poll::Ready(Ok(value.clone())),
            State::Failed(failure) => Poll::Ready(Err(failure.clone())),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/core/task.rs"]
mod tests;
