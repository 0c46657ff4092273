//! Dispatch policies for [`ObserverRegistry`](crate::ObserverRegistry).
//!
//! Defaults reproduce plain snapshot semantics: every observer present when
//! `notify` starts is visited, and the first callback error ends the pass.

use std::fmt;

/// Environment variable selecting the [`ErrorPolicy`].
pub const ERROR_POLICY_ENV: &str = "HERALD_ERROR_POLICY";
/// Environment variable selecting the [`RemovalPolicy`].
pub const REMOVAL_POLICY_ENV: &str = "HERALD_REMOVAL_POLICY";

/// What `notify` does when a callback reports an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Stop the pass at the first failure and return it. Observers later in
    /// the snapshot are not reached.
    #[default]
    FailFast,
    /// Visit every observer and report all failures once the pass ends.
    Continue,
}

impl ErrorPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fail-fast" | "fail_fast" | "failfast" => Some(Self::FailFast),
            "continue" => Some(Self::Continue),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FailFast => f.write_str("fail-fast"),
            Self::Continue => f.write_str("continue"),
        }
    }
}

/// How `notify` treats observers removed while a pass is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemovalPolicy {
    /// Deliver to every observer in the snapshot, even one removed after the
    /// snapshot was taken.
    #[default]
    Snapshot,
    /// Re-check registration right before each delivery and skip observers
    /// that were removed mid-pass.
    SkipRemoved,
}

impl RemovalPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "snapshot" => Some(Self::Snapshot),
            "skip-removed" | "skip_removed" | "skipremoved" => Some(Self::SkipRemoved),
            _ => None,
        }
    }
}

impl fmt::Display for RemovalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Snapshot => f.write_str("snapshot"),
            Self::SkipRemoved => f.write_str("skip-removed"),
        }
    }
}

/// Configuration for an observer registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Callback failure handling.
    pub error_policy: ErrorPolicy,
    /// Mid-pass removal handling.
    pub removal_policy: RemovalPolicy,
    /// Drop expired observer handles from the live set when a snapshot is
    /// taken.
    pub prune_on_notify: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            error_policy: ErrorPolicy::FailFast,
            removal_policy: RemovalPolicy::Snapshot,
            prune_on_notify: true,
        }
    }
}

impl RegistryConfig {
    /// Create a configuration with explicit policies.
    #[must_use]
    pub fn new(error_policy: ErrorPolicy, removal_policy: RemovalPolicy) -> Self {
        Self {
            error_policy,
            removal_policy,
            ..Self::default()
        }
    }

    /// Set the error policy.
    #[must_use]
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Set the removal policy.
    #[must_use]
    pub fn with_removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.removal_policy = policy;
        self
    }

    /// Enable or disable pruning of expired handles during `notify`.
    #[must_use]
    pub fn with_prune_on_notify(mut self, prune: bool) -> Self {
        self.prune_on_notify = prune;
        self
    }

    /// Build a configuration from the process environment.
    ///
    /// Reads [`ERROR_POLICY_ENV`] and [`REMOVAL_POLICY_ENV`]. Missing or
    /// unrecognized values keep the default.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Build a configuration using a custom environment lookup.
    #[must_use]
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = get_env(ERROR_POLICY_ENV) {
            match ErrorPolicy::parse(&raw) {
                Some(policy) => config.error_policy = policy,
                None => tracing::warn!(
                    value = %raw,
                    "unrecognized {ERROR_POLICY_ENV}, using {}",
                    config.error_policy
                ),
            }
        }
        if let Some(raw) = get_env(REMOVAL_POLICY_ENV) {
            match RemovalPolicy::parse(&raw) {
                Some(policy) => config.removal_policy = policy,
                None => tracing::warn!(
                    value = %raw,
                    "unrecognized {REMOVAL_POLICY_ENV}, using {}",
                    config.removal_policy
                ),
            }
        }
        config
    }
}
