use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts pending operations of one kind. The count drops when the guard does,
/// so an operation that fails or is cancelled still leaves the busy state.
pub(crate) struct InFlight<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> InFlight<'a> {
    pub(crate) fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

pub(crate) fn is_busy(counter: &AtomicUsize) -> bool {
    counter.load(Ordering::SeqCst) > 0
}
