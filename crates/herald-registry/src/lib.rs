#![forbid(unsafe_code)]

//! Observer registry: thread-safe membership and snapshot notification.
//!
//! # Role in Herald
//! `herald-registry` owns the set of observers interested in an event source
//! and fans an [`Invocation`] out to all of them. It depends only on
//! `herald-invocation` for the deferred call it replays.
//!
//! # Primary responsibilities
//! - **ObserverRegistry**: add/remove/contains/notify over weak observer
//!   handles, safe to call from any thread and from inside callbacks.
//! - **Snapshot**: the immutable membership copy each notification pass
//!   iterates.
//! - **RegistryConfig**: error and removal policies for a pass.
//! - **Delivery / NotifyError**: what a pass reached and what failed.
//!
//! # Invariants
//!
//! 1. An observer is registered at most once; re-adding is a no-op.
//! 2. A pass delivers in registration order to the membership present when
//!    it started.
//! 3. Callbacks never run under the registry lock.
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use herald_registry::{Invocation, ObserverRegistry};
//!
//! trait Saved: Send + Sync {
//!     fn saved(&self, path: &str);
//! }
//!
//! #[derive(Default)]
//! struct Counter(AtomicUsize);
//!
//! impl Saved for Counter {
//!     fn saved(&self, _path: &str) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let registry = ObserverRegistry::<dyn Saved>::new();
//! let counter = Arc::new(Counter::default());
//! let observer: Arc<dyn Saved> = counter.clone();
//! registry.add(&observer);
//!
//! let path = String::from("notes.txt");
//! let report = registry
//!     .notify(&Invocation::<dyn Saved>::new("saved", move |o| o.saved(&path)))
//!     .unwrap();
//!
//! assert_eq!(report.delivered, 1);
//! assert_eq!(counter.0.load(Ordering::SeqCst), 1);
//! ```

pub mod config;
pub mod delivery;
pub mod error;
pub mod registry;
pub mod snapshot;

pub use config::{ErrorPolicy, RegistryConfig, RemovalPolicy};
pub use delivery::Delivery;
pub use error::{DeliveryFailure, NotifyError, RegistryError};
pub use herald_invocation::{CallbackError, Invocation, InvocationError};
pub use registry::ObserverRegistry;
pub use snapshot::Snapshot;
