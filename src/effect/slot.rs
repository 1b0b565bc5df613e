//! Write-once result cell.
//!
//! Each operation owns one `ResultSlot`. Its job writes it exactly once;
//! dependents read it after the dependency edge guarantees the write
//! happened. A read that finds the slot empty yields
//! [`OperationError::ResultUnavailable`] rather than undefined behavior.

use std::sync::OnceLock;

use crate::OperationError;
use crate::control::Try;

pub(crate) struct ResultSlot<A> {
    cell: OnceLock<Try<A>>,
}

impl<A> ResultSlot<A> {
    pub(crate) const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Stores the outcome. Returns `false` if the slot was already filled,
    /// leaving the first outcome in place.
    pub(crate) fn fill(&self, outcome: Try<A>) -> bool {
        self.cell.set(outcome).is_ok()
    }

    pub(crate) fn peek(&self) -> Option<&Try<A>> {
        self.cell.get()
    }

    /// Borrowing read; empty slots read as `ResultUnavailable`.
    pub(crate) fn read_ref(&self) -> Try<&A> {
        self.peek().map_or(
            Try::Failed(OperationError::ResultUnavailable),
            Try::as_ref,
        )
    }
}

impl<A: Clone> ResultSlot<A> {
    /// Cloning read; empty slots read as `ResultUnavailable`.
    pub(crate) fn read(&self) -> Try<A> {
        self.peek()
            .cloned()
            .unwrap_or(Try::Failed(OperationError::ResultUnavailable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn empty_slot_reads_as_unavailable() {
        let slot = ResultSlot::<i32>::new();
        assert!(matches!(
            slot.read().error(),
            Some(OperationError::ResultUnavailable)
        ));
        assert!(slot.read_ref().is_failed());
    }

    #[rstest]
    fn first_fill_wins() {
        let slot = ResultSlot::new();
        assert!(slot.fill(Try::succeeded(1)));
        assert!(!slot.fill(Try::succeeded(2)));
        assert_eq!(slot.read(), Try::succeeded(1));
    }
}
