#![forbid(unsafe_code)]

//! Deferred calls that can be retargeted per receiver.
//!
//! # Role in Herald
//! `herald-invocation` builds the message that the observer registry replays
//! against every registered observer. An [`Invocation`] bundles a selector
//! name (used for logging and error reports), a callable with its arguments
//! already captured, and an optional target.
//!
//! # Construction
//!
//! | Constructor | Target | Callable |
//! |-------------|--------|----------|
//! | [`Invocation::new`] | unset | infallible `Fn(&O)` |
//! | [`Invocation::try_new`] | unset | fallible `Fn(&O) -> Result<(), E>` |
//! | [`Invocation::with_target`] | bound | infallible `Fn(&O)` |
//!
//! `O` may be a concrete type or a trait object (`dyn Listener`). Both are
//! resolved at compile time; there is no runtime method lookup.
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use herald_invocation::Invocation;
//!
//! trait Listener: Send + Sync {
//!     fn resized(&self, width: u32, height: u32);
//! }
//!
//! struct Area(AtomicU32);
//!
//! impl Listener for Area {
//!     fn resized(&self, width: u32, height: u32) {
//!         self.0.store(width * height, Ordering::SeqCst);
//!     }
//! }
//!
//! let area = Arc::new(Area(AtomicU32::new(0)));
//! let target: Arc<dyn Listener> = area.clone();
//!
//! let (w, h) = (80, 24);
//! let mut call = Invocation::<dyn Listener>::new("resized", move |l| l.resized(w, h));
//! call.set_target(&target);
//! call.invoke().unwrap();
//!
//! assert_eq!(area.0.load(Ordering::SeqCst), 80 * 24);
//! ```

mod error;
mod invocation;

pub use error::{CallbackError, InvocationError};
pub use invocation::Invocation;
