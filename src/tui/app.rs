//! Event loop: pumps the action bus, executes effects, translates crossterm
//! input into normalized pointer events and routes them through the
//! interaction manager's scope providers.

use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;

use crate::core::{Modifiers, PointerButton, PointerEvent, Position, Scope};
use crate::kernel::{Action, DispatchResult, InteractionManager, PluginRegistry};
use crate::plugins::{annotate, pan, selection, zoom, DocumentTasks};

use super::terminal_guard::TerminalGuard;
use super::view::{self, PageFrame, STATUS_CLASS};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

struct App {
    registry: PluginRegistry,
    tasks: DocumentTasks,
    manager: Rc<InteractionManager>,
    frames: Vec<PageFrame>,
    captured_page: Option<usize>,
    status_row: Option<u16>,
    needs_redraw: bool,
    should_quit: bool,
}

pub fn run(registry: PluginRegistry, path: Option<PathBuf>) -> io::Result<()> {
    let manager = registry
        .capabilities()
        .get::<Rc<InteractionManager>>()
        .ok_or_else(|| io::Error::other("interaction plugin not registered"))?;
    let tasks = registry
        .capabilities()
        .get::<DocumentTasks>()
        .ok_or_else(|| io::Error::other("loader plugin not registered"))?;

    let guard = TerminalGuard::new()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let mut app = App {
        registry,
        tasks,
        manager,
        frames: Vec::new(),
        captured_page: None,
        status_row: None,
        needs_redraw: true,
        should_quit: false,
    };

    // The status line is chrome, not document surface.
    app.manager.add_exclusion_class(STATUS_CLASS);

    if let Some(path) = path {
        app.dispatch(Action::OpenDocument(path));
    }

    while !app.should_quit {
        app.dispatch(Action::Tick {
            now: Instant::now(),
        });
        let pumped = app.registry.pump();
        app.apply(pumped);

        if app.needs_redraw {
            app.draw(&mut terminal)?;
        }

        if event::poll(POLL_INTERVAL)? {
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    app.on_key(key.code, key.modifiers)
                }
                Event::Mouse(mouse) => app.on_mouse(mouse),
                Event::Resize(_, _) => app.needs_redraw = true,
                _ => {}
            }
        }
    }

    drop(guard);
    Ok(())
}

impl App {
    fn apply(&mut self, result: DispatchResult) {
        if result.state_changed {
            self.needs_redraw = true;
        }
        for effect in &result.effects {
            self.tasks.run_effect(effect);
        }
    }

    fn dispatch(&mut self, action: Action) {
        let result = self.registry.dispatch(action);
        self.apply(result);
    }

    fn draw(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
        let state = self.registry.state().clone();
        let mut frames = Vec::new();
        let mut status_row = None;
        terminal.draw(|frame| {
            let area = frame.area();
            let main = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(1),
            };
            frames = view::layout_pages(&state, main);
            status_row = Some(area.y + area.height.saturating_sub(1));
            view::render(frame, &state, &frames);
        })?;
        self.frames = frames;
        self.status_row = status_row;
        self.needs_redraw = false;
        Ok(())
    }

    fn on_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true
            }
            KeyCode::Esc => self.dispatch(Action::ActivateDefaultMode),
            KeyCode::Char('p') => self.dispatch(Action::ActivateMode {
                mode: pan::MODE.into(),
            }),
            KeyCode::Char('s') => self.dispatch(Action::ActivateMode {
                mode: selection::MODE.into(),
            }),
            KeyCode::Char('a') => self.dispatch(Action::ActivateMode {
                mode: annotate::MODE.into(),
            }),
            KeyCode::Char('z') => self.dispatch(Action::ActivateMode {
                mode: zoom::MODE.into(),
            }),
            KeyCode::Char(' ') => {
                let action = if self.registry.state().interaction.paused {
                    Action::Resume
                } else {
                    Action::Pause
                };
                self.dispatch(action);
            }
            KeyCode::Char('r') => self.dispatch(Action::ReloadDocument),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let zoom = self.registry.state().viewport.zoom + 0.25;
                self.dispatch(Action::SetZoom { zoom });
            }
            KeyCode::Char('-') => {
                let zoom = self.registry.state().viewport.zoom - 0.25;
                self.dispatch(Action::SetZoom { zoom });
            }
            KeyCode::Up => self.dispatch(Action::ScrollBy { dx: 0.0, dy: -3.0 }),
            KeyCode::Down => self.dispatch(Action::ScrollBy { dx: 0.0, dy: 3.0 }),
            KeyCode::PageUp => self.dispatch(Action::ScrollBy { dx: 0.0, dy: -12.0 }),
            KeyCode::PageDown => self.dispatch(Action::ScrollBy { dx: 0.0, dy: 12.0 }),
            _ => {}
        }
    }

    fn on_mouse(&mut self, mouse: MouseEvent) {
        // Late-event safety: nothing is routed while the manager reports
        // itself paused (including after teardown).
        if self.manager.is_paused() {
            return;
        }
        if self.excluded_region(mouse.row) {
            return;
        }
        let modifiers = Modifiers {
            shift: mouse.modifiers.contains(KeyModifiers::SHIFT),
            ctrl: mouse.modifiers.contains(KeyModifiers::CONTROL),
            alt: mouse.modifiers.contains(KeyModifiers::ALT),
        };
        let x = f32::from(mouse.column);
        let y = f32::from(mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let event = PointerEvent::new(x, y)
                    .with_button(PointerButton::Primary)
                    .with_modifiers(modifiers);
                self.route_down(&event, mouse.column, mouse.row);
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let event = PointerEvent::new(x, y)
                    .with_button(PointerButton::Primary)
                    .with_modifiers(modifiers);
                self.route_move(&event, mouse.column, mouse.row);
            }
            MouseEventKind::Moved => {
                let event = PointerEvent::new(x, y).with_modifiers(modifiers);
                self.route_move(&event, mouse.column, mouse.row);
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let event = PointerEvent::new(x, y)
                    .with_button(PointerButton::Primary)
                    .with_modifiers(modifiers);
                self.route_up(&event, mouse.column, mouse.row);
                self.captured_page = None;
            }
            MouseEventKind::ScrollUp => self.route_scroll(x, y, modifiers, -3.0),
            MouseEventKind::ScrollDown => self.route_scroll(x, y, modifiers, 3.0),
            _ => {}
        }
        // Tool handlers dispatch over the bus; drain so the UI stays current.
        let pumped = self.registry.pump();
        self.apply(pumped);
    }

    fn excluded_region(&self, row: u16) -> bool {
        let Some(status_row) = self.status_row else {
            return false;
        };
        row == status_row
            && self
                .registry
                .state()
                .interaction
                .exclusion_rules
                .excludes_class(STATUS_CLASS)
    }

    fn page_hit(&self, column: u16, row: u16) -> Option<(usize, Position)> {
        let zoom = self.registry.state().viewport.zoom;
        view::page_at(&self.frames, column, row, zoom)
    }

    /// Page-local position for a captured gesture, even when the pointer
    /// has left the page frame.
    fn position_on_page(&self, page_index: usize, column: u16, row: u16) -> Position {
        let zoom = self.registry.state().viewport.zoom.max(0.01);
        self.frames
            .iter()
            .find(|frame| frame.page_index == page_index)
            .map(|frame| {
                let x = (i32::from(column) - frame.origin_x).max(0) as f32;
                let y = (i32::from(row) - frame.origin_y).max(0) as f32;
                Position::new(x, y / zoom)
            })
            .unwrap_or_default()
    }

    fn route_down(&mut self, event: &PointerEvent, column: u16, row: u16) {
        let hit = self.page_hit(column, row);
        self.captured_page = hit.map(|(page, _)| page);
        self.manager
            .handlers_for_scope(Scope::Global)
            .pointer_down(event, Position::new(event.x, event.y));
        if let Some((page, position)) = hit {
            self.manager
                .handlers_for_scope(Scope::page(page))
                .pointer_down(event, position);
        }
    }

    fn route_move(&mut self, event: &PointerEvent, column: u16, row: u16) {
        self.manager
            .handlers_for_scope(Scope::Global)
            .pointer_move(event, Position::new(event.x, event.y));
        // While a gesture holds a page captured, sibling pages never see the
        // pointer; an exclusive mode relies on this.
        let target = match self.captured_page {
            Some(page) => Some((page, self.position_on_page(page, column, row))),
            None => self.page_hit(column, row),
        };
        if let Some((page, position)) = target {
            self.manager
                .handlers_for_scope(Scope::page(page))
                .pointer_move(event, position);
        }
    }

    fn route_up(&mut self, event: &PointerEvent, column: u16, row: u16) {
        self.manager
            .handlers_for_scope(Scope::Global)
            .pointer_up(event, Position::new(event.x, event.y));
        let target = match self.captured_page {
            Some(page) => Some((page, self.position_on_page(page, column, row))),
            None => self.page_hit(column, row),
        };
        if let Some((page, position)) = target {
            self.manager
                .handlers_for_scope(Scope::page(page))
                .pointer_up(event, position);
        }
    }

    fn route_scroll(&mut self, x: f32, y: f32, modifiers: Modifiers, dy: f32) {
        let event = PointerEvent::new(x, y).with_modifiers(modifiers);
        self.manager
            .handlers_for_scope(Scope::Global)
            .scroll(&event, 0.0, dy);
        // The wheel always moves the viewport, whatever tool is active.
        self.dispatch(Action::ScrollBy { dx: 0.0, dy });
    }
}
