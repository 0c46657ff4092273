//! Registry and notification errors.

use std::fmt;

use herald_invocation::InvocationError;

use crate::delivery::Delivery;

/// Errors from registry membership operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A weak observer handle no longer points at a live observer.
    ExpiredObserver,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExpiredObserver => f.write_str("observer handle has expired"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// A callback failure recorded during a notification pass.
#[derive(Debug)]
pub struct DeliveryFailure {
    /// Position of the observer in the pass snapshot.
    pub index: usize,
    /// The invocation error.
    pub error: InvocationError,
}

impl fmt::Display for DeliveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer #{}: {}", self.index, self.error)
    }
}

/// Errors from [`ObserverRegistry::notify`](crate::ObserverRegistry::notify).
#[derive(Debug)]
pub enum NotifyError {
    /// A callback failed under [`ErrorPolicy::FailFast`](crate::ErrorPolicy::FailFast).
    /// Observers after `index` in the snapshot were not reached.
    Callback {
        /// Position of the failing observer in the pass snapshot.
        index: usize,
        /// Observers that received the notification before the failure.
        delivered: usize,
        /// The invocation error.
        source: InvocationError,
    },
    /// One or more callbacks failed under
    /// [`ErrorPolicy::Continue`](crate::ErrorPolicy::Continue). The delivery
    /// report lists every failure.
    Partial(Delivery),
}

impl NotifyError {
    /// Selector of the invocation being dispatched.
    #[must_use]
    pub fn selector(&self) -> Option<&'static str> {
        match self {
            Self::Callback { source, .. } => Some(source.selector()),
            Self::Partial(delivery) => delivery.failures.first().map(|f| f.error.selector()),
        }
    }

    /// Number of observers that received the notification.
    #[must_use]
    pub fn delivered(&self) -> usize {
        match self {
            Self::Callback { delivered, .. } => *delivered,
            Self::Partial(delivery) => delivery.delivered,
        }
    }
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callback {
                index,
                delivered,
                source,
            } => write!(
                f,
                "observer #{index} failed after {delivered} deliveries: {source}"
            ),
            Self::Partial(delivery) => {
                write!(
                    f,
                    "{} of {} callbacks failed",
                    delivery.failures.len(),
                    delivery.failures.len() + delivery.delivered
                )?;
                if let Some(first) = delivery.failures.first() {
                    write!(f, " (first: {first})")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for NotifyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Callback { source, .. } => Some(source),
            Self::Partial(delivery) => delivery
                .failures
                .first()
                .map(|f| &f.error as &(dyn std::error::Error + 'static)),
        }
    }
}
