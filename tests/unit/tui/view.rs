use super::*;
use crate::engine::DocumentInfo;

fn ready_state(pages: usize, lines_per_page: usize) -> AppState {
    let mut state = AppState::new();
    state.document.status = LoadStatus::Ready;
    state.document.info = Some(DocumentInfo {
        title: Some("sample".to_string()),
        page_count: pages,
        lines_per_page,
    });
    state
}

fn viewport(width: u16, height: u16) -> Rect {
    Rect {
        x: 0,
        y: 0,
        width,
        height,
    }
}

#[test]
fn layout_stacks_pages_vertically() {
    let state = ready_state(3, 10);
    let frames = layout_pages(&state, viewport(80, 40));

    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0].page_index, 0);
    assert_eq!(frames[0].area.y, 0);
    assert_eq!(frames[0].area.height, 12);
    // One-cell gutter between pages.
    assert_eq!(frames[1].area.y, 13);
    assert_eq!(frames[2].area.y, 26);
}

#[test]
fn layout_skips_pages_scrolled_out_of_view() {
    let mut state = ready_state(3, 10);
    state.viewport.scroll_y = 13.0;
    let frames = layout_pages(&state, viewport(80, 40));

    assert_eq!(frames.first().map(|f| f.page_index), Some(1));
    assert_eq!(frames[0].area.y, 0);
}

#[test]
fn layout_clips_a_partially_visible_page() {
    let mut state = ready_state(2, 10);
    state.viewport.scroll_y = 5.0;
    let frames = layout_pages(&state, viewport(80, 40));

    let first = frames[0];
    assert_eq!(first.page_index, 0);
    assert_eq!(first.area.y, 0);
    assert_eq!(first.area.height, 7);
    // Interior origin still points at the unclipped page top.
    assert_eq!(first.origin_y, -4);
}

#[test]
fn layout_without_a_document_is_empty() {
    let state = AppState::new();
    assert!(layout_pages(&state, viewport(80, 40)).is_empty());
}

#[test]
fn page_at_maps_to_page_local_lines() {
    let state = ready_state(3, 10);
    let frames = layout_pages(&state, viewport(80, 40));

    // Inside page 1 (area starts at y=13, interior at y=14).
    let (page, position) = page_at(&frames, 5, 17, 1.0).expect("hit");
    assert_eq!(page, 1);
    assert_eq!(position.y, 3.0);
    // Border at x=1, interior at x=2.
    assert_eq!(position.x, 3.0);

    // The inter-page gutter hits nothing.
    assert!(page_at(&frames, 5, 12, 1.0).is_none());
}

#[test]
fn page_at_scales_lines_by_zoom() {
    let mut state = ready_state(1, 10);
    state.viewport.zoom = 2.0;
    let frames = layout_pages(&state, viewport(80, 40));

    let (page, position) = page_at(&frames, 3, 9, 2.0).expect("hit");
    assert_eq!(page, 0);
    // Cell row 8 inside the page maps back to document line 4.
    assert_eq!(position.y, 4.0);
}

#[test]
fn status_line_reflects_mode_and_document() {
    let mut state = ready_state(3, 10);
    state.interaction.active_mode = "pan".into();
    state.interaction.cursor = "grab".into();
    let status = status_line(&state);

    assert!(status.contains("sample · 3 pages"));
    assert!(status.contains("mode:pan"));
    assert!(status.contains("cursor:grab"));
    assert!(!status.contains("PAUSED"));

    state.interaction.paused = true;
    assert!(status_line(&state).contains("PAUSED"));
}
