//! Operation governor: a hard ceiling on mutating remote calls
//!
//! Every mutating remote call (folder creation, file upload, and each of the
//! two legs of a relocation) is tallied through an [`OperationGovernor`]
//! before it is sent. Once the post-increment count exceeds the ceiling the
//! run stops. Listing calls are never tallied.
//!
//! The governor travels to the adapter inside an [`OpContext`], together with
//! the run-wide cancellation token, so tests can inject their own instance
//! and read back the executed count.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Default ceiling on mutating operations per run
pub const DEFAULT_MAX_OPS: u64 = 20;

/// Process exit code used when the ceiling is exceeded under
/// [`CeilingPolicy::ExitProcess`]
pub const EXIT_CEILING_EXCEEDED: i32 = 3;

/// What happens when the ceiling is exceeded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeilingPolicy {
    /// Log and terminate the process immediately, without unwinding
    ExitProcess,
    /// Return [`GovernorError::CeilingExceeded`] to the caller
    ReturnError,
}

/// Errors raised by the governor
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GovernorError {
    /// More mutating operations were attempted than the ceiling allows
    #[error("operation ceiling reached ({executed} > {ceiling}) while attempting {operation}")]
    CeilingExceeded {
        /// Post-increment count
        executed: u64,
        /// Configured ceiling
        ceiling: u64,
        /// Name of the operation that tripped the ceiling
        operation: String,
    },
}

/// Process-wide counter of mutating remote operations
#[derive(Debug)]
pub struct OperationGovernor {
    ceiling: u64,
    executed: AtomicU64,
    policy: CeilingPolicy,
}

impl OperationGovernor {
    /// Creates a governor with the given ceiling and policy
    pub fn new(ceiling: u64, policy: CeilingPolicy) -> Self {
        Self {
            ceiling,
            executed: AtomicU64::new(0),
            policy,
        }
    }

    /// Configured ceiling
    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }

    /// Number of mutating operations tallied so far
    pub fn executed(&self) -> u64 {
        self.executed.load(Ordering::SeqCst)
    }

    /// Active policy
    pub fn policy(&self) -> CeilingPolicy {
        self.policy
    }

    /// Counts one mutating operation, then checks the ceiling.
    ///
    /// Under [`CeilingPolicy::ExitProcess`] this does not return when the
    /// ceiling is exceeded.
    ///
    /// # Errors
    /// Returns [`GovernorError::CeilingExceeded`] under
    /// [`CeilingPolicy::ReturnError`] once the count exceeds the ceiling.
    pub fn tally(&self, operation: &str) -> Result<u64, GovernorError> {
        let executed = self.executed.fetch_add(1, Ordering::SeqCst) + 1;

        if executed > self.ceiling {
            let err = GovernorError::CeilingExceeded {
                executed,
                ceiling: self.ceiling,
                operation: operation.to_string(),
            };
            match self.policy {
                CeilingPolicy::ExitProcess => {
                    error!(executed, ceiling = self.ceiling, operation, "Operation ceiling reached, exiting");
                    eprintln!("Oops, {err}; exiting");
                    std::process::exit(EXIT_CEILING_EXCEEDED);
                }
                CeilingPolicy::ReturnError => return Err(err),
            }
        }

        debug!(operation, executed, ceiling = self.ceiling, "Mutating operation tallied");
        Ok(executed)
    }
}

/// Context handed to every mutating remote call
///
/// Cheap to clone: both fields are shared handles.
#[derive(Debug, Clone)]
pub struct OpContext {
    governor: Arc<OperationGovernor>,
    cancel: CancellationToken,
}

impl OpContext {
    /// Creates a context from a shared governor and a cancellation token
    pub fn new(governor: Arc<OperationGovernor>, cancel: CancellationToken) -> Self {
        Self { governor, cancel }
    }

    /// The shared governor
    pub fn governor(&self) -> &OperationGovernor {
        &self.governor
    }

    /// The run-wide cancellation token
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Whether the run has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Shorthand for [`OperationGovernor::tally`]
    pub fn tally(&self, operation: &str) -> Result<u64, GovernorError> {
        self.governor.tally(operation)
    }
}
