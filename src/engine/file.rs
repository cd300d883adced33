//! Plain-text engine adapter: pages a UTF-8 file at a fixed line count.
//!
//! Operations run on a private tokio runtime and settle the returned tasks
//! from worker context. Long scans check the task between pages so an abort
//! lands without finishing the sweep.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::ports::{
    DocumentEngine, DocumentInfo, EngineError, EngineTask, PageText, SearchHit, SearchProgress,
};

pub const DEFAULT_LINES_PER_PAGE: usize = 40;

struct LoadedDocument {
    path: PathBuf,
    pages: Vec<Vec<String>>,
}

pub struct FileEngine {
    runtime: tokio::runtime::Runtime,
    lines_per_page: usize,
    doc: Arc<Mutex<Option<LoadedDocument>>>,
}

fn relock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn paginate(text: &str, lines_per_page: usize) -> Vec<Vec<String>> {
    let lines: Vec<String> = text.lines().map(str::to_string).collect();
    if lines.is_empty() {
        return vec![Vec::new()];
    }
    lines
        .chunks(lines_per_page.max(1))
        .map(<[String]>::to_vec)
        .collect()
}

fn title_of(path: &Path) -> Option<String> {
    path.file_stem().map(|stem| stem.to_string_lossy().to_string())
}

fn map_read_error(path: &Path, error: io::Error) -> EngineError {
    match error.kind() {
        io::ErrorKind::NotFound => {
            EngineError::not_found(format!("{}: no such file", path.display()))
        }
        io::ErrorKind::InvalidData => {
            EngineError::wrong_format(format!("{}: not valid UTF-8 text", path.display()))
        }
        _ => EngineError::io(format!("{}: {}", path.display(), error)),
    }
}

impl FileEngine {
    pub fn new(lines_per_page: usize) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .or_else(|e| {
                tracing::error!(
                    error = %e,
                    "failed to create multi-thread tokio runtime, falling back to current-thread"
                );
                tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
            })?;
        Ok(Self {
            runtime,
            lines_per_page,
            doc: Arc::new(Mutex::new(None)),
        })
    }
}

impl DocumentEngine for FileEngine {
    fn open(&self, path: &Path) -> EngineTask<DocumentInfo> {
        let task: EngineTask<DocumentInfo> = EngineTask::new();
        let work = task.clone();
        let doc_slot = Arc::clone(&self.doc);
        let path = path.to_path_buf();
        let lines_per_page = self.lines_per_page;
        self.runtime.spawn(async move {
            match tokio::fs::read_to_string(&path).await {
                Ok(text) => {
                    let pages = paginate(&text, lines_per_page);
                    let info = DocumentInfo {
                        title: title_of(&path),
                        page_count: pages.len(),
                        lines_per_page,
                    };
                    *relock(&doc_slot) = Some(LoadedDocument { path, pages });
                    work.resolve(info);
                }
                Err(error) => work.reject(map_read_error(&path, error)),
            }
        });
        task
    }

    fn page_text(&self, page_index: usize) -> EngineTask<PageText> {
        let task: EngineTask<PageText> = EngineTask::new();
        let work = task.clone();
        let doc_slot = Arc::clone(&self.doc);
        self.runtime.spawn(async move {
            let guard = relock(&doc_slot);
            match guard.as_ref() {
                None => work.reject(EngineError::not_found("no document open")),
                Some(doc) => match doc.pages.get(page_index) {
                    None => work.reject(EngineError::page_error(format!(
                        "page {} out of range (document has {})",
                        page_index,
                        doc.pages.len()
                    ))),
                    Some(lines) => {
                        let page = PageText {
                            page_index,
                            lines: lines.clone(),
                        };
                        drop(guard);
                        work.resolve(page);
                    }
                },
            }
        });
        task
    }

    fn extract_text(
        &self,
        page_index: usize,
        start_line: usize,
        end_line: usize,
    ) -> EngineTask<String> {
        let task: EngineTask<String> = EngineTask::new();
        let work = task.clone();
        let doc_slot = Arc::clone(&self.doc);
        self.runtime.spawn(async move {
            let guard = relock(&doc_slot);
            match guard.as_ref() {
                None => work.reject(EngineError::not_found("no document open")),
                Some(doc) => match doc.pages.get(page_index) {
                    None => work.reject(EngineError::page_error(format!(
                        "page {} out of range (document has {})",
                        page_index,
                        doc.pages.len()
                    ))),
                    Some(lines) => {
                        let last = end_line.min(lines.len().saturating_sub(1));
                        let text = if lines.is_empty() || start_line > last {
                            String::new()
                        } else {
                            lines[start_line..=last].join("\n")
                        };
                        drop(guard);
                        work.resolve(text);
                    }
                },
            }
        });
        task
    }

    fn search(&self, query: &str) -> EngineTask<Vec<SearchHit>, SearchProgress> {
        let task: EngineTask<Vec<SearchHit>, SearchProgress> = EngineTask::new();
        let work = task.clone();
        let doc_slot = Arc::clone(&self.doc);
        let query = query.to_string();
        self.runtime.spawn(async move {
            let pages = {
                let guard = relock(&doc_slot);
                match guard.as_ref() {
                    None => {
                        drop(guard);
                        work.reject(EngineError::not_found("no document open"));
                        return;
                    }
                    Some(doc) => {
                        tracing::debug!(path = %doc.path.display(), query = %query, "search started");
                        doc.pages.clone()
                    }
                }
            };
            if query.is_empty() {
                work.resolve(Vec::new());
                return;
            }
            let total_pages = pages.len();
            let mut hits = Vec::new();
            for (page_index, lines) in pages.iter().enumerate() {
                if !work.is_pending() {
                    // Caller aborted; stop sweeping.
                    return;
                }
                for (line, text) in lines.iter().enumerate() {
                    for (start, matched) in text.match_indices(query.as_str()) {
                        hits.push(SearchHit {
                            page_index,
                            line,
                            start,
                            end: start + matched.len(),
                        });
                    }
                }
                work.progress(SearchProgress {
                    pages_scanned: page_index + 1,
                    total_pages,
                });
                tokio::task::yield_now().await;
            }
            work.resolve(hits);
        });
        task
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/file.rs"]
mod tests;
