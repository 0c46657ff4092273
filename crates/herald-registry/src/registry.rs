//! Thread-safe observer set with snapshot notification.
//!
//! # Design
//!
//! [`ObserverRegistry<O>`] keeps weak handles to observers behind a single
//! `Mutex`. `notify` holds the lock only long enough to copy membership into
//! a [`Snapshot`], releases it, and then replays the invocation against each
//! snapshot entry in registration order. Callbacks therefore run without the
//! lock and may call back into the registry.
//!
//! # Performance
//!
//! | Operation    | Complexity |
//! |--------------|------------|
//! | `add()`      | O(1) amortized |
//! | `contains()` | O(1) |
//! | `remove()`   | O(N) (order-preserving) |
//! | `notify()`   | O(N) copy + O(N) callbacks |
//!
//! # Failure Modes
//!
//! - **Callback error**: handled per [`ErrorPolicy`]. Under the default
//!   fail-fast policy the pass stops and observers later in the snapshot are
//!   not reached. Nothing is rolled back.
//! - **Callback panic**: unwinds through `notify` to its caller. The lock is
//!   not held at that point, so the registry stays usable.
//! - **Dropped observer**: its weak handle fails to upgrade; the entry is
//!   skipped and pruned on the next snapshot when `prune_on_notify` is set.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use herald_invocation::Invocation;
use tracing::{debug, debug_span, trace, warn};

use crate::config::{ErrorPolicy, RegistryConfig, RemovalPolicy};
use crate::delivery::Delivery;
use crate::error::{DeliveryFailure, NotifyError, RegistryError};
use crate::snapshot::{Entry, Snapshot};

/// Identity key of an observer: the address of its shared allocation.
///
/// Registered entries hold a `Weak`, which keeps the allocation (not the
/// value) alive, so a key cannot be reused while its entry is present.
pub(crate) fn identity_of<O: ?Sized>(observer: &Arc<O>) -> usize {
    Arc::as_ptr(observer).cast::<()>() as usize
}

pub(crate) fn identity_of_weak<O: ?Sized>(handle: &Weak<O>) -> usize {
    Weak::as_ptr(handle).cast::<()>() as usize
}

/// Live membership guarded by the registry lock.
struct ObserverSet<O: ?Sized> {
    /// Registration order.
    entries: Vec<Entry<O>>,
    /// Identity key -> registration id.
    ids: HashMap<usize, u64>,
    next_id: u64,
}

impl<O: ?Sized> ObserverSet<O> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            ids: HashMap::new(),
            next_id: 0,
        }
    }

    fn insert(&mut self, observer: &Arc<O>) -> bool {
        let key = identity_of(observer);
        if self.ids.contains_key(&key) {
            return false;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.ids.insert(key, id);
        self.entries.push(Entry {
            id,
            handle: Arc::downgrade(observer),
        });
        true
    }

    fn remove(&mut self, key: usize) -> bool {
        match self.ids.remove(&key) {
            Some(id) => {
                self.entries.retain(|entry| entry.id != id);
                true
            }
            None => false,
        }
    }

    fn contains(&self, key: usize) -> bool {
        self.ids.contains_key(&key)
    }

    /// Whether `entry` is still registered under the same registration.
    fn is_current(&self, entry: &Entry<O>) -> bool {
        self.ids.get(&identity_of_weak(&entry.handle)) == Some(&entry.id)
    }

    fn prune_expired(&mut self) -> usize {
        let before = self.entries.len();
        let ids = &mut self.ids;
        self.entries.retain(|entry| {
            if entry.handle.strong_count() > 0 {
                true
            } else {
                ids.remove(&identity_of_weak(&entry.handle));
                false
            }
        });
        before - self.entries.len()
    }

    fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        self.ids.clear();
        removed
    }
}

/// A thread-safe registry of observers of type `O`.
///
/// `O` is usually a trait object (`ObserverRegistry<dyn Listener>`).
/// Observers are identified by the address of their `Arc` allocation and
/// held weakly: the registry never keeps an observer alive.
///
/// # Invariants
///
/// 1. Each registered observer appears exactly once.
/// 2. `notify` delivers in registration order.
/// 3. Membership changes made during a pass (by callbacks or other threads)
///    take effect from the next pass, except that
///    [`RemovalPolicy::SkipRemoved`] also applies removals to the pass in
///    progress.
/// 4. No callback runs while the registry lock is held.
pub struct ObserverRegistry<O: ?Sized> {
    set: Mutex<ObserverSet<O>>,
    config: RegistryConfig,
}

impl<O: ?Sized> fmt::Debug for ObserverRegistry<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("len", &self.len())
            .field("config", &self.config)
            .finish()
    }
}

impl<O: ?Sized> Default for ObserverRegistry<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: ?Sized> ObserverRegistry<O> {
    /// Create an empty registry with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with the given configuration.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            set: Mutex::new(ObserverSet::new()),
            config,
        }
    }

    /// The configuration this registry was built with.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // No user code runs under this lock, so a poisoned guard still holds a
    // consistent set.
    fn lock(&self) -> MutexGuard<'_, ObserverSet<O>> {
        self.set.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `observer`. Returns `false` if it was already registered.
    pub fn add(&self, observer: &Arc<O>) -> bool {
        let inserted = self.lock().insert(observer);
        trace!(
            observer = identity_of(observer),
            inserted, "observer add"
        );
        inserted
    }

    /// Register an observer from a weak handle.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ExpiredObserver`] if `handle` no longer
    /// points at a live observer.
    pub fn add_weak(&self, handle: &Weak<O>) -> Result<bool, RegistryError> {
        let observer = handle.upgrade().ok_or(RegistryError::ExpiredObserver)?;
        Ok(self.add(&observer))
    }

    /// Deregister `observer`. Returns `false` if it was not registered.
    pub fn remove(&self, observer: &Arc<O>) -> bool {
        self.remove_key(identity_of(observer))
    }

    /// Deregister by weak handle. Works after the observer has been dropped.
    pub fn remove_weak(&self, handle: &Weak<O>) -> bool {
        self.remove_key(identity_of_weak(handle))
    }

    fn remove_key(&self, key: usize) -> bool {
        let removed = self.lock().remove(key);
        trace!(observer = key, removed, "observer remove");
        removed
    }

    /// Whether `observer` is registered.
    ///
    /// Under concurrent mutation the answer reflects some instant during the
    /// call.
    #[must_use]
    pub fn contains(&self, observer: &Arc<O>) -> bool {
        self.lock().contains(identity_of(observer))
    }

    /// Number of registered entries, including observers dropped without
    /// being removed that have not been pruned yet.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether no observers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Deregister every observer. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let removed = self.lock().clear();
        debug!(removed, "observer registry cleared");
        removed
    }

    /// Drop entries whose observer no longer exists. Returns how many were
    /// removed.
    pub fn prune(&self) -> usize {
        let pruned = self.lock().prune_expired();
        if pruned > 0 {
            warn!(pruned, "pruned observers dropped without deregistering");
        }
        pruned
    }

    /// Copy current membership.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot<O> {
        Snapshot {
            entries: self.lock().entries.clone(),
        }
    }

    fn dispatch_snapshot(&self) -> Snapshot<O> {
        let mut set = self.lock();
        if self.config.prune_on_notify {
            let pruned = set.prune_expired();
            if pruned > 0 {
                warn!(pruned, "pruned observers dropped without deregistering");
            }
        }
        Snapshot {
            entries: set.entries.clone(),
        }
    }

    /// Replay `invocation` against every observer registered when the call
    /// begins, in registration order.
    ///
    /// Each observer in turn becomes the invocation's target and the
    /// invocation is invoked once. The registry lock is released before the
    /// first callback, so callbacks may add, remove, or query observers (and
    /// even notify again) without deadlocking.
    ///
    /// # Errors
    ///
    /// - [`NotifyError::Callback`] under [`ErrorPolicy::FailFast`]: the first
    ///   failing callback ends the pass. Earlier deliveries stand.
    /// - [`NotifyError::Partial`] under [`ErrorPolicy::Continue`]: every
    ///   observer was visited and at least one callback failed.
    pub fn notify(&self, invocation: &Invocation<O>) -> Result<Delivery, NotifyError> {
        let snapshot = self.dispatch_snapshot();
        let span = debug_span!(
            "herald.notify",
            selector = invocation.selector(),
            observers = snapshot.len()
        );
        let _guard = span.enter();

        let mut delivery = Delivery::for_snapshot(snapshot.len());
        let mut call = invocation.clone();

        for (index, entry) in snapshot.entries.iter().enumerate() {
            let Some(observer) = entry.handle.upgrade() else {
                trace!(index, "skipping dropped observer");
                delivery.expired += 1;
                continue;
            };
            if self.config.removal_policy == RemovalPolicy::SkipRemoved
                && !self.lock().is_current(entry)
            {
                trace!(index, "skipping observer removed mid-pass");
                delivery.skipped_removed += 1;
                continue;
            }

            call.set_target(&observer);
            match call.invoke() {
                Ok(()) => delivery.delivered += 1,
                Err(error) => {
                    warn!(index, %error, "observer callback failed");
                    match self.config.error_policy {
                        ErrorPolicy::FailFast => {
                            return Err(NotifyError::Callback {
                                index,
                                delivered: delivery.delivered,
                                source: error,
                            });
                        }
                        ErrorPolicy::Continue => {
                            delivery.failures.push(DeliveryFailure { index, error });
                        }
                    }
                }
            }
        }

        debug!(
            delivered = delivery.delivered,
            expired = delivery.expired,
            skipped_removed = delivery.skipped_removed,
            failed = delivery.failures.len(),
            "notification pass complete"
        );

        if delivery.is_clean() {
            Ok(delivery)
        } else {
            Err(NotifyError::Partial(delivery))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
