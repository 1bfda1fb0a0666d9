//! Configuration options for parameters and link negotiation.
//!
//! The defaults reproduce the behaviour expected by module owners: numeric set
//! membership is tolerance-based and locking a linked parameter is refused.

/// Absolute tolerance used when comparing numeric values. Default: 1e-7
pub const DEFAULT_TOLERANCE: f64 = 1e-7;

/// What `lock()`/`unlock()` do on a parameter that is part of a link group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockPolicy {
    /// Return [`ParameterError::LinkedStatus`](crate::parameters::ParameterError::LinkedStatus)
    #[default]
    Reject,

    /// Leave the status untouched and return `Ok(())`
    Ignore,
}

/// Configuration options for a [`Parameter`](crate::parameters::Parameter).
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterConfig {
    /// Tolerance used while intersecting constraints during negotiation. Default: 1e-7
    pub tolerance: f64,

    /// Behaviour of lock/unlock while linked. Default: Reject
    pub lock_policy: LockPolicy,
}

impl Default for ParameterConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            lock_policy: LockPolicy::default(),
        }
    }
}

impl ParameterConfig {
    /// Set the negotiation tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the lock policy.
    pub fn with_lock_policy(mut self, lock_policy: LockPolicy) -> Self {
        self.lock_policy = lock_policy;
        self
    }
}
