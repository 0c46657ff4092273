//! Per-pass delivery report.

use crate::error::DeliveryFailure;

/// Outcome of one notification pass.
///
/// `observers == delivered + expired + skipped_removed + failures.len()` for
/// a pass that ran to completion.
#[derive(Debug, Default)]
pub struct Delivery {
    /// Size of the snapshot the pass iterated.
    pub observers: usize,
    /// Callbacks that returned successfully.
    pub delivered: usize,
    /// Snapshot entries whose observer had been dropped.
    pub expired: usize,
    /// Snapshot entries skipped because they were removed mid-pass
    /// (only under [`RemovalPolicy::SkipRemoved`](crate::RemovalPolicy::SkipRemoved)).
    pub skipped_removed: usize,
    /// Failures collected under [`ErrorPolicy::Continue`](crate::ErrorPolicy::Continue).
    pub failures: Vec<DeliveryFailure>,
}

impl Delivery {
    pub(crate) fn for_snapshot(observers: usize) -> Self {
        Self {
            observers,
            ..Self::default()
        }
    }

    /// Whether every callback that ran succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of callbacks that ran, successfully or not.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.delivered + self.failures.len()
    }
}
