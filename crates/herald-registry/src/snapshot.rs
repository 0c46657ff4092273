//! Point-in-time copy of registry membership.

use std::fmt;
use std::sync::{Arc, Weak};

/// A registered observer: weak handle plus the id assigned at registration.
pub(crate) struct Entry<O: ?Sized> {
    pub(crate) id: u64,
    pub(crate) handle: Weak<O>,
}

impl<O: ?Sized> Clone for Entry<O> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            handle: Weak::clone(&self.handle),
        }
    }
}

/// Immutable copy of the observer set, in registration order.
///
/// A snapshot does not keep observers alive. Later changes to the registry
/// are not reflected.
pub struct Snapshot<O: ?Sized> {
    pub(crate) entries: Vec<Entry<O>>,
}

impl<O: ?Sized> Snapshot<O> {
    /// Number of entries captured, including observers dropped since.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot captured no observers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Observers from the snapshot that are still alive, in order.
    pub fn observers(&self) -> impl Iterator<Item = Arc<O>> + '_ {
        self.entries.iter().filter_map(|entry| entry.handle.upgrade())
    }

    /// Whether `observer` was a member when the snapshot was taken.
    #[must_use]
    pub fn contains(&self, observer: &Arc<O>) -> bool {
        let key = crate::registry::identity_of(observer);
        self.entries
            .iter()
            .any(|entry| crate::registry::identity_of_weak(&entry.handle) == key)
    }
}

impl<O: ?Sized> Clone for Snapshot<O> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<O: ?Sized> fmt::Debug for Snapshot<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("len", &self.entries.len())
            .field(
                "ids",
                &self.entries.iter().map(|e| e.id).collect::<Vec<_>>(),
            )
            .finish()
    }
}
