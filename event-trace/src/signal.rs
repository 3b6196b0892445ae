//! Overall-state subscribers
//!
//! Callbacks are invoked synchronously, in registration order, on the thread
//! that caused the transition.

use crate::types::TraceState;

/// Handle returned by [`StateSubscribers::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(TraceState) + Send>;

/// An ordered registry of overall-state callbacks
#[derive(Default)]
pub struct StateSubscribers {
    next_id: u64,
    callbacks: Vec<(SubscriptionId, Callback)>,
}

impl StateSubscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback; it receives every new overall state
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(TraceState) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, Box::new(callback)));
        log::trace!("Registered state subscriber {:?}", id);
        id
    }

    /// Remove a callback. Returns false if the handle was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(existing, _)| *existing != id);
        before != self.callbacks.len()
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    pub(crate) fn notify(&mut self, state: TraceState) {
        for (_, callback) in self.callbacks.iter_mut() {
            callback(state);
        }
    }
}

impl std::fmt::Debug for StateSubscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateSubscribers")
            .field("count", &self.callbacks.len())
            .finish()
    }
}
