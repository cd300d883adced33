//! Action bus: lets plugins, services and worker callbacks dispatch into the
//! store without holding a registry borrow. The host loop drains it between
//! events, so dispatch is never re-entrant.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use super::Action;

#[derive(Clone)]
pub struct DispatchHandle {
    tx: Sender<Action>,
}

pub struct ActionReceiver {
    rx: Receiver<Action>,
}

pub fn action_bus() -> (DispatchHandle, ActionReceiver) {
    let (tx, rx) = mpsc::channel();
    (DispatchHandle { tx }, ActionReceiver { rx })
}

impl DispatchHandle {
    pub fn dispatch(&self, action: Action) -> Result<(), mpsc::SendError<Action>> {
        self.tx.send(action)
    }
}

impl ActionReceiver {
    pub fn try_recv(&mut self) -> Result<Action, TryRecvError> {
        self.rx.try_recv()
    }
}
