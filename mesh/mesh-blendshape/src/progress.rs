//! Progress reporting and cancellation.

use std::ops::ControlFlow;

/// Target vertices processed so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    /// Vertices whose correspondence is known.
    pub completed: usize,
    /// Total target vertices.
    pub total: usize,
}

impl TransferProgress {
    /// Completed fraction in `[0, 1]`. An empty run counts as complete.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    /// Whether every vertex has been processed.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.completed >= self.total
    }
}

/// Receives progress between chunks of the correspondence search.
///
/// Returning [`ControlFlow::Break`] cancels the run; the transfer then
/// fails with [`TransferError::Cancelled`](crate::TransferError::Cancelled)
/// and produces no output.
///
/// Closures implement this trait:
///
/// ```
/// use mesh_blendshape::{TransferObserver, TransferProgress};
/// use std::ops::ControlFlow;
///
/// let mut seen = Vec::new();
/// let mut observer = |p: TransferProgress| {
///     seen.push(p.completed);
///     ControlFlow::Continue(())
/// };
/// let _ = observer.on_progress(TransferProgress { completed: 256, total: 1000 });
/// assert_eq!(seen, vec![256]);
/// ```
pub trait TransferObserver {
    /// Called with the current progress.
    fn on_progress(&mut self, progress: TransferProgress) -> ControlFlow<()>;
}

impl<F> TransferObserver for F
where
    F: FnMut(TransferProgress) -> ControlFlow<()>,
{
    fn on_progress(&mut self, progress: TransferProgress) -> ControlFlow<()> {
        self(progress)
    }
}

/// Observer that ignores progress and never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl TransferObserver for NoProgress {
    fn on_progress(&mut self, _progress: TransferProgress) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}
