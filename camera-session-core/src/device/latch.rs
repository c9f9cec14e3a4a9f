use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

/// How a [`Latch`] was resolved.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Outcome<T> {
    Completed(T),
    Cancelled,
    /// The completer was dropped without a value.
    Abandoned,
}

/// One-shot rendezvous between a hardware callback and the worker thread.
///
/// The first resolution wins; later ones are ignored.
pub(crate) struct Latch<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

enum Slot<T> {
    Empty,
    Resolved(Outcome<T>),
    /// Handed to the waiter; further resolutions are still ignored.
    Taken,
}

impl<T> Latch<T> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            slot: Mutex::new(Slot::Empty),
            ready: Condvar::new(),
        })
    }

    /// Handle for the producing side. Dropping it unresolved abandons the latch.
    pub(crate) fn completer(self: &Arc<Self>) -> Completer<T> {
        Completer {
            latch: Arc::clone(self),
        }
    }

    pub(crate) fn cancel(&self) {
        self.resolve(Outcome::Cancelled);
    }

    #[cfg(test)]
    pub(crate) fn is_resolved(&self) -> bool {
        !matches!(*self.slot.lock(), Slot::Empty)
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        matches!(*self.slot.lock(), Slot::Resolved(Outcome::Cancelled))
    }

    /// Block until resolved. There is no timeout. Only one caller may wait.
    pub(crate) fn wait(&self) -> Outcome<T> {
        let mut slot = self.slot.lock();
        while matches!(*slot, Slot::Empty) {
            self.ready.wait(&mut slot);
        }
        match std::mem::replace(&mut *slot, Slot::Taken) {
            Slot::Resolved(outcome) => outcome,
            Slot::Empty | Slot::Taken => Outcome::Abandoned,
        }
    }

    fn resolve(&self, outcome: Outcome<T>) {
        let mut slot = self.slot.lock();
        if matches!(*slot, Slot::Empty) {
            *slot = Slot::Resolved(outcome);
            self.ready.notify_all();
        }
    }
}

pub(crate) struct Completer<T> {
    latch: Arc<Latch<T>>,
}

impl<T> Completer<T> {
    pub(crate) fn complete(self, value: T) {
        self.latch.resolve(Outcome::Completed(value));
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        self.latch.resolve(Outcome::Abandoned);
    }
}
