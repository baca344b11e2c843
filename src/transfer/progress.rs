//! Progress reporting and transfer outcomes.
//!
//! A progress callback has the shape `FnMut(total, completed) -> bool` and
//! does double duty: it receives the current progress and its return value
//! is the cancellation signal (`true` stops the transfer before the next
//! unit of work). It is consulted on every call, not at an interval.

use crate::error::TransferError;
use serde::Serialize;

/// Terminal state of a transfer.
#[derive(Debug)]
pub enum TransferOutcome {
    Completed,
    /// The caller asked to stop; work already done is left in place.
    Cancelled,
    Failed(TransferError),
}

impl TransferOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TransferOutcome::Completed)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, TransferOutcome::Cancelled)
    }

    pub fn error(&self) -> Option<&TransferError> {
        match self {
            TransferOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Result<TransferOutcome, TransferError>> for TransferOutcome {
    fn from(result: Result<TransferOutcome, TransferError>) -> Self {
        result.unwrap_or_else(TransferOutcome::Failed)
    }
}

/// Advisory progress of one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TransferProgress {
    pub total: u64,
    pub completed: u64,
}

/// Callback that never cancels.
pub fn never_cancel(_total: u64, _completed: u64) -> bool {
    false
}

/// Wraps a progress callback for one transfer.
///
/// `total` is fixed at construction and `completed` only moves forward.
pub struct ProgressTracker<F> {
    progress: TransferProgress,
    callback: F,
}

impl<F> ProgressTracker<F>
where
    F: FnMut(u64, u64) -> bool,
{
    pub fn new(total: u64, callback: F) -> Self {
        Self {
            progress: TransferProgress {
                total,
                completed: 0,
            },
            callback,
        }
    }

    /// Report the current progress; returns `true` when the caller wants the
    /// transfer to stop.
    pub fn should_cancel(&mut self) -> bool {
        (self.callback)(self.progress.total, self.progress.completed)
    }

    /// Record one finished unit of work.
    pub fn advance(&mut self) {
        self.progress.completed = (self.progress.completed + 1).min(self.progress.total);
    }

    pub fn progress(&self) -> TransferProgress {
        self.progress
    }
}
