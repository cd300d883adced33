//! Engine-facing contracts shared by the kernel and adapters.

use std::path::Path;

use crate::core::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorCode {
    NotFound,
    WrongFormat,
    PasswordRequired,
    PageError,
    Cancelled,
    Io,
}

impl EngineErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            EngineErrorCode::NotFound => "not-found",
            EngineErrorCode::WrongFormat => "wrong-format",
            EngineErrorCode::PasswordRequired => "password-required",
            EngineErrorCode::PageError => "page-error",
            EngineErrorCode::Cancelled => "cancelled",
            EngineErrorCode::Io => "io",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    pub code: EngineErrorCode,
    pub message: String,
}

impl EngineError {
    pub fn new(code: EngineErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(EngineErrorCode::NotFound, message)
    }

    pub fn wrong_format(message: impl Into<String>) -> Self {
        Self::new(EngineErrorCode::WrongFormat, message)
    }

    pub fn page_error(message: impl Into<String>) -> Self {
        Self::new(EngineErrorCode::PageError, message)
    }

    pub fn cancelled() -> Self {
        Self::new(EngineErrorCode::Cancelled, "operation cancelled")
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(EngineErrorCode::Io, message)
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for EngineError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub page_count: usize,
    pub lines_per_page: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page_index: usize,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchHit {
    pub page_index: usize,
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchProgress {
    pub pages_scanned: usize,
    pub total_pages: usize,
}

pub type EngineTask<T, P = ()> = Task<T, EngineError, P>;

/// Asynchronous document operations. Implementations complete the returned
/// tasks from worker context; callers cancel by aborting the task, which
/// workers honor cooperatively between units of work.
pub trait DocumentEngine: Send + Sync {
    fn open(&self, path: &Path) -> EngineTask<DocumentInfo>;
    fn page_text(&self, page_index: usize) -> EngineTask<PageText>;
    fn extract_text(
        &self,
        page_index: usize,
        start_line: usize,
        end_line: usize,
    ) -> EngineTask<String>;
    fn search(&self, query: &str) -> EngineTask<Vec<SearchHit>, SearchProgress>;
}
