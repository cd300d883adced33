//! Framework primitives with no kernel dependencies.

pub mod emitter;
pub mod event;
pub mod event_control;
pub mod resolver;
pub mod task;

pub use emitter::{Behavior, Emitter, SubscriptionKey};
pub use event::{Modifiers, PointerButton, PointerEvent, Position, RectF, Scope};
pub use event_control::{EventControl, ThrottleEdge};
pub use resolver::{DependencyResolver, ResolveError};
pub use task::{Task, TaskFailure, TaskFuture, TaskSettledResult, TaskStatus};
