use std::path::PathBuf;
use std::time::Instant;

use compact_str::CompactString;

use crate::core::RectF;
use crate::engine::{DocumentInfo, EngineError};

use super::state::{InteractionState, SelectionSpan};

#[derive(Debug, Clone)]
pub enum Action {
    /// Host-loop heartbeat; carries the clock so debounced work stays
    /// deterministic under test.
    Tick { now: Instant },

    OpenDocument(PathBuf),
    ReloadDocument,
    DocumentLoaded(DocumentInfo),
    DocumentLoadFailed(EngineError),

    ActivateMode { mode: CompactString },
    ActivateDefaultMode,
    SetDefaultMode { mode: CompactString },
    SetCursor {
        token: CompactString,
        cursor: CompactString,
        priority: i32,
    },
    RemoveCursor { token: CompactString },
    Pause,
    Resume,
    AddExclusionClass(CompactString),
    RemoveExclusionClass(CompactString),
    AddExclusionAttribute(CompactString),
    RemoveExclusionAttribute(CompactString),
    /// Projection sync emitted by the interaction manager's state stream.
    InteractionChanged(InteractionState),

    ScrollBy { dx: f32, dy: f32 },
    SetZoom { zoom: f32 },
    ZoomToRect { rect: RectF },
    PointerHover { x: f32, y: f32 },

    SetSelection(SelectionSpan),
    ClearSelection,
    ExtractSelection,
    SelectionExtracted { text: String },

    AddAnnotation { page_index: usize, rect: RectF },
}
