//! Placeholder page layout and status rendering. Layout doubles as the
//! hit-testing source: the event loop keeps the last computed frames and
//! maps pointer coordinates back through them.

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::core::Position;
use crate::kernel::{AppState, LoadStatus};

/// Region tag for the status line; routing drops pointer events here when an
/// exclusion rule names it.
pub const STATUS_CLASS: &str = "folio-status";

const MAX_PAGE_WIDTH: i32 = 84;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageFrame {
    pub page_index: usize,
    /// Clipped on-screen rectangle.
    pub area: Rect,
    /// Unclipped interior origin (inside the border), for coordinate
    /// mapping when the frame is partially scrolled out.
    pub origin_x: i32,
    pub origin_y: i32,
}

pub fn layout_pages(state: &AppState, area: Rect) -> Vec<PageFrame> {
    let Some(info) = &state.document.info else {
        return Vec::new();
    };
    if area.width < 4 || area.height == 0 {
        return Vec::new();
    }
    let zoom = state.viewport.zoom.max(0.01);
    let page_height = ((info.lines_per_page as f32 * zoom).round() as i32).max(1) + 2;
    let page_width = i32::from(area.width.saturating_sub(2)).min(MAX_PAGE_WIDTH);
    let left = i32::from(area.x) + 1 - state.viewport.scroll_x.round() as i32;
    let top_edge = i32::from(area.y);
    let bottom_edge = top_edge + i32::from(area.height);

    let mut frames = Vec::new();
    let mut y = top_edge - state.viewport.scroll_y.round() as i32;
    for page_index in 0..info.page_count {
        let top = y;
        y += page_height + 1;
        if top + page_height <= top_edge || top >= bottom_edge {
            continue;
        }
        let clip_top = top.max(top_edge);
        let clip_bottom = (top + page_height).min(bottom_edge);
        let clip_left = left.max(i32::from(area.x));
        let clip_right = (left + page_width).min(i32::from(area.x) + i32::from(area.width));
        if clip_right - clip_left < 3 || clip_bottom - clip_top < 1 {
            continue;
        }
        frames.push(PageFrame {
            page_index,
            area: Rect {
                x: clip_left as u16,
                y: clip_top as u16,
                width: (clip_right - clip_left) as u16,
                height: (clip_bottom - clip_top) as u16,
            },
            origin_x: left + 1,
            origin_y: top + 1,
        });
    }
    frames
}

/// Maps a terminal cell to the page under it, returning page-local
/// coordinates in document units (columns, lines).
pub fn page_at(frames: &[PageFrame], x: u16, y: u16, zoom: f32) -> Option<(usize, Position)> {
    let zoom = zoom.max(0.01);
    for frame in frames {
        let inside_x = x >= frame.area.x && x < frame.area.x + frame.area.width;
        let inside_y = y >= frame.area.y && y < frame.area.y + frame.area.height;
        if inside_x && inside_y {
            let column = (i32::from(x) - frame.origin_x).max(0) as f32;
            let row = (i32::from(y) - frame.origin_y).max(0) as f32;
            return Some((frame.page_index, Position::new(column, row / zoom)));
        }
    }
    None
}

pub fn status_line(state: &AppState) -> String {
    let document = match (&state.document.status, &state.document.info) {
        (LoadStatus::Idle, _) => "no document".to_string(),
        (LoadStatus::Loading, _) => "loading…".to_string(),
        (LoadStatus::Ready, Some(info)) => match &info.title {
            Some(title) => format!("{} · {} pages", title, info.page_count),
            None => format!("{} pages", info.page_count),
        },
        (LoadStatus::Ready, None) => "ready".to_string(),
        (LoadStatus::Failed, _) => match &state.document.error {
            Some(error) => format!("load failed: {}", error),
            None => "load failed".to_string(),
        },
    };
    let paused = if state.interaction.paused { " · PAUSED" } else { "" };
    let selection = match &state.selection.text {
        Some(text) if !text.is_empty() => {
            let snippet: String = text.chars().take(24).collect();
            format!(" · \"{}\"", snippet.replace('\n', " "))
        }
        _ => String::new(),
    };
    format!(
        " {} · mode:{} cursor:{} zoom:{:.2}{}{}",
        document,
        state.interaction.active_mode,
        state.interaction.cursor,
        state.viewport.zoom,
        paused,
        selection,
    )
}

pub fn render(frame: &mut Frame<'_>, state: &AppState, frames: &[PageFrame]) {
    let area = frame.area();
    if area.height == 0 {
        return;
    }
    let status_area = Rect {
        x: area.x,
        y: area.y + area.height - 1,
        width: area.width,
        height: 1,
    };

    for page in frames {
        let annotations = state
            .annotations
            .iter()
            .filter(|a| a.page_index == page.page_index)
            .count();
        let title = if annotations > 0 {
            format!(" page {} · {} notes ", page.page_index + 1, annotations)
        } else {
            format!(" page {} ", page.page_index + 1)
        };
        let block = Block::default().borders(Borders::ALL).title(title);
        frame.render_widget(block, page.area);

        render_page_marks(frame, state, page);
    }

    let status = Paragraph::new(Line::from(status_line(state)))
        .style(Style::default().fg(Color::Black).bg(Color::Gray));
    frame.render_widget(status, status_area);
}

/// Shades committed annotations and the live selection inside a page frame.
fn render_page_marks(frame: &mut Frame<'_>, state: &AppState, page: &PageFrame) {
    let zoom = state.viewport.zoom.max(0.01);
    for annotation in state
        .annotations
        .iter()
        .filter(|a| a.page_index == page.page_index)
    {
        let rect = region_in_page(
            page,
            annotation.rect.y * zoom,
            annotation.rect.height * zoom,
            annotation.rect.x,
            annotation.rect.width,
        );
        if let Some(rect) = rect {
            frame.render_widget(
                Block::default().style(Style::default().bg(Color::Yellow)),
                rect,
            );
        }
    }
    if let Some(span) = &state.selection.span {
        if span.page_index == page.page_index {
            let (start, end) = span.ordered();
            let rect = region_in_page(
                page,
                start as f32 * zoom,
                ((end - start) as f32 + 1.0) * zoom,
                0.0,
                f32::from(page.area.width),
            );
            if let Some(rect) = rect {
                frame.render_widget(
                    Block::default().style(Style::default().bg(Color::Blue)),
                    rect,
                );
            }
        }
    }
}

/// Converts a page-local region into a screen rect clipped to the frame.
fn region_in_page(
    page: &PageFrame,
    top: f32,
    height: f32,
    left: f32,
    width: f32,
) -> Option<Rect> {
    let y0 = page.origin_y + top.round() as i32;
    let y1 = y0 + (height.round() as i32).max(1);
    let x0 = page.origin_x + left.round() as i32;
    let x1 = x0 + (width.round() as i32).max(1);

    let clip_y0 = y0.max(i32::from(page.area.y));
    let clip_y1 = y1.min(i32::from(page.area.y) + i32::from(page.area.height) - 1);
    let clip_x0 = x0.max(i32::from(page.area.x) + 1);
    let clip_x1 = x1.min(i32::from(page.area.x) + i32::from(page.area.width) - 1);
    if clip_y1 <= clip_y0 || clip_x1 <= clip_x0 {
        return None;
    }
    Some(Rect {
        x: clip_x0 as u16,
        y: clip_y0 as u16,
        width: (clip_x1 - clip_x0) as u16,
        height: (clip_y1 - clip_y0) as u16,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/tui/view.rs"]
mod tests;
