//! Errors raised when an invocation is replayed.

use std::fmt;

/// Error type returned by fallible callbacks.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors from [`Invocation::invoke`](crate::Invocation::invoke).
#[derive(Debug)]
pub enum InvocationError {
    /// `invoke` was called before a target was set.
    NoTarget {
        /// Selector of the invocation.
        selector: &'static str,
    },
    /// The target was set but has since been dropped by its owner.
    TargetDropped {
        /// Selector of the invocation.
        selector: &'static str,
    },
    /// The callback ran and reported a failure.
    Failed {
        /// Selector of the invocation.
        selector: &'static str,
        /// Error returned by the callback.
        source: CallbackError,
    },
}

impl InvocationError {
    /// Selector of the invocation that failed.
    #[must_use]
    pub fn selector(&self) -> &'static str {
        match self {
            Self::NoTarget { selector }
            | Self::TargetDropped { selector }
            | Self::Failed { selector, .. } => *selector,
        }
    }
}

impl fmt::Display for InvocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTarget { selector } => write!(f, "invocation '{selector}' has no target"),
            Self::TargetDropped { selector } => {
                write!(f, "target of invocation '{selector}' was dropped")
            }
            Self::Failed { selector, source } => {
                write!(f, "invocation '{selector}' failed: {source}")
            }
        }
    }
}

impl std::error::Error for InvocationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Failed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
