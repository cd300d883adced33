//! Document engine boundary.
//!
//! Every engine operation returns a [`Task`](crate::core::Task) carrying a
//! structured [`EngineError`]; the kernel never interprets error codes, only
//! propagates them.

pub mod file;
pub mod ports;

pub use file::FileEngine;
pub use ports::{
    DocumentEngine, DocumentInfo, EngineError, EngineErrorCode, EngineTask, PageText, SearchHit,
    SearchProgress,
};
