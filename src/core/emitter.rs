//! Observable state hooks: plain observer lists plus a behavior variant
//! that replays the latest value to new subscribers.
//!
//! Subscribers are stored in a slotmap so unsubscribe tokens stay stable.
//! Emission clones the callback list out of the map before invoking, so a
//! callback may subscribe, unsubscribe or re-emit without deadlocking the
//! emitter; a callback removed mid-pass can still see the current value.

use std::cell::RefCell;
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    pub struct SubscriptionKey;
}

type Callback<T> = Rc<RefCell<dyn FnMut(&T)>>;

pub struct Emitter<T> {
    subscribers: RefCell<SlotMap<SubscriptionKey, Callback<T>>>,
}

impl<T> Emitter<T> {
    pub fn new() -> Self {
        Self {
            subscribers: RefCell::new(SlotMap::with_key()),
        }
    }

    pub fn subscribe(&self, callback: impl FnMut(&T) + 'static) -> SubscriptionKey {
        self.subscribers
            .borrow_mut()
            .insert(Rc::new(RefCell::new(callback)))
    }

    /// Returns false if the key was already removed.
    pub fn unsubscribe(&self, key: SubscriptionKey) -> bool {
        self.subscribers.borrow_mut().remove(key).is_some()
    }

    pub fn emit(&self, value: &T) {
        let callbacks: Vec<Callback<T>> = self.subscribers.borrow().values().cloned().collect();
        for callback in callbacks {
            (callback.borrow_mut())(value);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.borrow().is_empty()
    }
}

impl<T> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// An [`Emitter`] that remembers its latest value and delivers it to every
/// new subscriber synchronously at subscription time.
pub struct Behavior<T: Clone> {
    emitter: Emitter<T>,
    current: RefCell<T>,
}

impl<T: Clone> Behavior<T> {
    pub fn new(initial: T) -> Self {
        Self {
            emitter: Emitter::new(),
            current: RefCell::new(initial),
        }
    }

    pub fn get(&self) -> T {
        self.current.borrow().clone()
    }

    pub fn subscribe(&self, mut callback: impl FnMut(&T) + 'static) -> SubscriptionKey {
        let replay = self.current.borrow().clone();
        callback(&replay);
        self.emitter.subscribe(callback)
    }

    pub fn unsubscribe(&self, key: SubscriptionKey) -> bool {
        self.emitter.unsubscribe(key)
    }

    pub fn publish(&self, value: T) {
        *self.current.borrow_mut() = value.clone();
        self.emitter.emit(&value);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/core/emitter.rs"]
mod tests;
