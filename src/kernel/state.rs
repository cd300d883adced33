//! Reducer-visible application state.

use std::path::PathBuf;

use compact_str::CompactString;

use crate::core::RectF;
use crate::engine::{DocumentInfo, EngineError};

/// DOM-side opt-out lists consumed by the integration layer to decide which
/// subtrees skip pointer routing. Both lists are deduplicated sets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExclusionRules {
    pub classes: Vec<CompactString>,
    pub data_attributes: Vec<CompactString>,
}

impl ExclusionRules {
    pub fn add_class(&mut self, class: &str) -> bool {
        add_unique(&mut self.classes, class)
    }

    pub fn remove_class(&mut self, class: &str) -> bool {
        remove_entry(&mut self.classes, class)
    }

    pub fn add_data_attribute(&mut self, attribute: &str) -> bool {
        add_unique(&mut self.data_attributes, attribute)
    }

    pub fn remove_data_attribute(&mut self, attribute: &str) -> bool {
        remove_entry(&mut self.data_attributes, attribute)
    }

    pub fn excludes_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

fn add_unique(list: &mut Vec<CompactString>, entry: &str) -> bool {
    if list.iter().any(|e| e == entry) {
        return false;
    }
    list.push(CompactString::from(entry));
    true
}

fn remove_entry(list: &mut Vec<CompactString>, entry: &str) -> bool {
    let before = list.len();
    list.retain(|e| e != entry);
    list.len() != before
}

/// Store projection of the interaction manager's machine state.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionState {
    pub active_mode: CompactString,
    pub default_mode: CompactString,
    pub cursor: CompactString,
    pub paused: bool,
    pub exclusion_rules: ExclusionRules,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self {
            active_mode: CompactString::from(super::interaction::DEFAULT_MODE),
            default_mode: CompactString::from(super::interaction::DEFAULT_MODE),
            cursor: CompactString::from("auto"),
            paused: false,
            exclusion_rules: ExclusionRules::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentState {
    pub path: Option<PathBuf>,
    pub status: LoadStatus,
    pub info: Option<DocumentInfo>,
    pub error: Option<EngineError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewportState {
    pub scroll_x: f32,
    pub scroll_y: f32,
    pub zoom: f32,
    /// Last pointer position seen by the always-active hover tracker.
    pub hover: Option<(f32, f32)>,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            scroll_x: 0.0,
            scroll_y: 0.0,
            zoom: 1.0,
            hover: None,
        }
    }
}

/// A line range on one page, tracked while the select tool drags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionSpan {
    pub page_index: usize,
    pub start_line: usize,
    pub end_line: usize,
}

impl SelectionSpan {
    /// Line bounds in ascending order regardless of drag direction.
    pub fn ordered(&self) -> (usize, usize) {
        if self.start_line <= self.end_line {
            (self.start_line, self.end_line)
        } else {
            (self.end_line, self.start_line)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionState {
    pub span: Option<SelectionSpan>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub page_index: usize,
    pub rect: RectF,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub interaction: InteractionState,
    pub document: DocumentState,
    pub viewport: ViewportState,
    pub selection: SelectionState,
    pub annotations: Vec<Annotation>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}
