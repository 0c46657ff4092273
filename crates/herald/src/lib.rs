#![forbid(unsafe_code)]

//! Herald: observer registration and fan-out notification.
//!
//! This crate re-exports the public API of the workspace:
//!
//! - [`invocation`]: deferred calls retargeted per observer.
//! - [`registry`]: the thread-safe observer registry.
//!
//! Most users only need the [`prelude`].

pub use herald_invocation as invocation;
pub use herald_registry as registry;

pub use herald_invocation::{CallbackError, Invocation, InvocationError};
pub use herald_registry::{
    Delivery, DeliveryFailure, ErrorPolicy, NotifyError, ObserverRegistry, RegistryConfig,
    RegistryError, RemovalPolicy, Snapshot,
};

/// Common imports.
pub mod prelude {
    pub use crate::{
        ErrorPolicy, Invocation, NotifyError, ObserverRegistry, RegistryConfig, RemovalPolicy,
    };
}
