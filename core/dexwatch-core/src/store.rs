//! In-memory state store, one per process.
//!
//! Listeners observe a strictly ordered sequence of post-apply states, one
//! per applied action, never a partially-applied intermediate. The store is
//! not thread-safe; callers wrap it (or the dispatcher that owns it) in a
//! `Mutex` when shared across threads.

use dexwatch_protocol::{Action, RootState};

use crate::reducer::reduce;

type Listener = Box<dyn FnMut(&RootState) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(usize);

pub struct Store {
    state: RootState,
    listeners: Vec<(usize, Listener)>,
    next_listener_id: usize,
}

impl Store {
    pub fn new(initial: RootState) -> Self {
        Store {
            state: initial,
            listeners: Vec::new(),
            next_listener_id: 0,
        }
    }

    /// Read-only view of the current state. Callers must not assume the
    /// reference stays valid across an `apply`.
    pub fn state(&self) -> &RootState {
        &self.state
    }

    /// Runs the action through the reducer tree, swaps the state, then
    /// notifies every listener with the settled result.
    pub fn apply(&mut self, action: &Action) {
        let next = reduce(&self.state, action);
        self.state = next;
        let state = &self.state;
        for (_, listener) in self.listeners.iter_mut() {
            listener(state);
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&RootState) + Send + 'static) -> SubscriptionId {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        SubscriptionId(id)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.listeners.retain(|(listener_id, _)| *listener_id != id.0);
    }
}
