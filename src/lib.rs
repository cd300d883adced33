//! folio - terminal document viewer/annotator built on a plugin runtime.
//!
//! Module structure:
//! - core: framework primitives (DependencyResolver, Task, EventControl, Emitter, pointer events)
//! - kernel: headless runtime (Store, Action/Effect, PluginRegistry, InteractionManager)
//! - engine: document engine boundary (ports + file-backed adapter)
//! - plugins: tool plugins wired through the runtime (loader, pan, select, annotate, zoom)
//! - tui: terminal integration (feature `tui`)

pub mod config;
pub mod core;
pub mod engine;
pub mod kernel;
pub mod logging;
pub mod plugins;
#[cfg(feature = "tui")]
pub mod tui;
