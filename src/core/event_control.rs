//! Debounce/throttle wrapper taming high-frequency event streams.
//!
//! Time is injected: callers pass `Instant`s into [`handle`](EventControl::handle)
//! and pump [`tick`](EventControl::tick) from the host loop. No timer thread,
//! no global clock, deterministic under test.

use std::time::{Duration, Instant};

/// Which edges of a throttle window invoke the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleEdge {
    /// First call in a window fires immediately; the latest call in the
    /// window also fires at the window end.
    LeadingTrailing,
    /// Only the window-end fire; the leading immediate fire is suppressed.
    Trailing,
}

#[derive(Clone, Copy)]
enum Mode {
    Debounce,
    Throttle { edge: ThrottleEdge },
}

pub struct EventControl<T> {
    handler: Box<dyn FnMut(T)>,
    mode: Mode,
    wait: Duration,
    pending: Option<T>,
    deadline: Option<Instant>,
    destroyed: bool,
}

impl<T> EventControl<T> {
    /// Debounce: each call reschedules the handler to run after `wait` of
    /// silence; only the last call's data in a burst is delivered.
    pub fn debounce(wait: Duration, handler: impl FnMut(T) + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            mode: Mode::Debounce,
            wait,
            pending: None,
            deadline: None,
            destroyed: false,
        }
    }

    /// Throttle: at most one delivery per `wait` window, with edge behavior
    /// per [`ThrottleEdge`]. A trailing fire opens a fresh window so bursts
    /// stay rate-limited.
    pub fn throttle(wait: Duration, edge: ThrottleEdge, handler: impl FnMut(T) + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            mode: Mode::Throttle { edge },
            wait,
            pending: None,
            deadline: None,
            destroyed: false,
        }
    }

    pub fn handle(&mut self, data: T, now: Instant) {
        if self.destroyed {
            return;
        }
        match self.mode {
            Mode::Debounce => {
                self.pending = Some(data);
                self.deadline = Some(now + self.wait);
            }
            Mode::Throttle { edge } => {
                if self.deadline.is_some() {
                    self.pending = Some(data);
                } else {
                    self.deadline = Some(now + self.wait);
                    match edge {
                        ThrottleEdge::LeadingTrailing => (self.handler)(data),
                        ThrottleEdge::Trailing => self.pending = Some(data),
                    }
                }
            }
        }
    }

    /// Fires the handler if a scheduled delivery is due. Host loops call
    /// this once per iteration.
    pub fn tick(&mut self, now: Instant) {
        if self.destroyed {
            return;
        }
        let Some(deadline) = self.deadline else {
            return;
        };
        if now < deadline {
            return;
        }
        match self.mode {
            Mode::Debounce => {
                self.deadline = None;
                if let Some(data) = self.pending.take() {
                    (self.handler)(data);
                }
            }
            Mode::Throttle { .. } => {
                if let Some(data) = self.pending.take() {
                    (self.handler)(data);
                    self.deadline = Some(now + self.wait);
                } else {
                    self.deadline = None;
                }
            }
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Cancels any outstanding delivery. Owners call this on teardown so a
    /// handler cannot fire after its owner is gone; there is no implicit
    /// cancellation tied to drop order.
    pub fn destroy(&mut self) {
        self.pending = None;
        self.deadline = None;
        self.destroyed = true;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/core/event_control.rs"]
mod tests;
