//! Retargetable deferred call.
//!
//! # Invariants
//!
//! 1. The callable and selector are fixed at construction; only the target
//!    changes over the life of an invocation.
//! 2. The target is held weakly, so an invocation never extends the lifetime
//!    of its receiver.
//! 3. Each call to [`Invocation::invoke`] runs the callable at most once.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | No target | `invoke` before `set_target` | `InvocationError::NoTarget` |
//! | Dead target | Receiver dropped after `set_target` | `InvocationError::TargetDropped` |
//! | Callback error | Fallible callable returned `Err` | `InvocationError::Failed` |
//! | Callback panic | Callable panicked | Unwinds to the caller |

use std::fmt;
use std::sync::{Arc, Weak};

use crate::error::{CallbackError, InvocationError};

type Callable<O> = Arc<dyn Fn(&O) -> Result<(), CallbackError> + Send + Sync>;

/// A deferred call with bound arguments, replayable against any receiver of
/// type `O`.
///
/// Cloning is cheap: clones share the callable and copy the (weak) target.
pub struct Invocation<O: ?Sized> {
    selector: &'static str,
    callable: Callable<O>,
    target: Option<Weak<O>>,
}

// Manual Clone: `O` itself need not be `Clone`.
impl<O: ?Sized> Clone for Invocation<O> {
    fn clone(&self) -> Self {
        Self {
            selector: self.selector,
            callable: Arc::clone(&self.callable),
            target: self.target.clone(),
        }
    }
}

impl<O: ?Sized> fmt::Debug for Invocation<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("selector", &self.selector)
            .field("has_target", &self.has_target())
            .finish_non_exhaustive()
    }
}

impl<O: ?Sized> Invocation<O> {
    /// Create an unbound invocation from an infallible callable.
    ///
    /// Arguments are bound by capturing them in the closure. A target must be
    /// set with [`set_target`](Self::set_target) before [`invoke`](Self::invoke).
    #[must_use]
    pub fn new<F>(selector: &'static str, f: F) -> Self
    where
        F: Fn(&O) + Send + Sync + 'static,
    {
        Self {
            selector,
            callable: Arc::new(move |receiver: &O| -> Result<(), CallbackError> {
                f(receiver);
                Ok(())
            }),
            target: None,
        }
    }

    /// Create an unbound invocation from a fallible callable.
    ///
    /// Errors returned by `f` surface as [`InvocationError::Failed`].
    #[must_use]
    pub fn try_new<F, E>(selector: &'static str, f: F) -> Self
    where
        F: Fn(&O) -> Result<(), E> + Send + Sync + 'static,
        E: Into<CallbackError>,
    {
        Self {
            selector,
            callable: Arc::new(move |receiver: &O| -> Result<(), CallbackError> {
                f(receiver).map_err(Into::into)
            }),
            target: None,
        }
    }

    /// Create an invocation already bound to `target`.
    #[must_use]
    pub fn with_target<F>(target: &Arc<O>, selector: &'static str, f: F) -> Self
    where
        F: Fn(&O) + Send + Sync + 'static,
    {
        let mut invocation = Self::new(selector, f);
        invocation.set_target(target);
        invocation
    }

    /// Selector name given at construction.
    #[must_use]
    pub fn selector(&self) -> &'static str {
        self.selector
    }

    /// Set or replace the receiver for the next [`invoke`](Self::invoke).
    pub fn set_target(&mut self, target: &Arc<O>) {
        self.target = Some(Arc::downgrade(target));
    }

    /// Forget the current receiver.
    pub fn clear_target(&mut self) {
        self.target = None;
    }

    /// Whether a receiver is set and still alive.
    #[must_use]
    pub fn has_target(&self) -> bool {
        self.target
            .as_ref()
            .is_some_and(|target| target.strong_count() > 0)
    }

    /// Run the callable against the current target.
    pub fn invoke(&self) -> Result<(), InvocationError> {
        let Some(target) = self.target.as_ref() else {
            tracing::trace!(selector = self.selector, "invoke without target");
            return Err(InvocationError::NoTarget {
                selector: self.selector,
            });
        };
        let Some(receiver) = target.upgrade() else {
            tracing::trace!(selector = self.selector, "invoke on dropped target");
            return Err(InvocationError::TargetDropped {
                selector: self.selector,
            });
        };
        self.invoke_on(&receiver)
    }

    /// Run the callable against `receiver`, ignoring the stored target.
    pub fn invoke_on(&self, receiver: &O) -> Result<(), InvocationError> {
        (self.callable)(receiver).map_err(|source| InvocationError::Failed {
            selector: self.selector,
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
