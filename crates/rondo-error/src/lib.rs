//! Error types for the rondo barrier library and its benchmark harness.
//!
//! A single enum covers the three failure classes the workspace can hit:
//! configuration errors (rejected at construction, fatal to the trial),
//! OS errors (thread pinning), and I/O errors (report files). The barrier
//! wait path itself has no recoverable failure mode and never appears here.

use thiserror::Error;

/// Primary error type for rondo operations.
#[derive(Error, Debug)]
pub enum RondoError {
    // === Configuration errors ===
    /// A barrier was requested with zero participants.
    #[error("barrier fanout must be at least 1")]
    ZeroFanout,

    /// The static tree layout tables only cover small participant counts.
    #[error("no static tree layout for {requested} participants (supported 1..={max})")]
    UnsupportedFanout { requested: usize, max: usize },

    /// The benchmark CLI was given an algorithm tag it does not know.
    #[error("unknown barrier algorithm: '{tag}'")]
    UnknownAlgorithm { tag: String },

    /// A workload parameter of zero makes the busy-loop range empty.
    #[error("workload parameter must be at least 1")]
    ZeroWorkload,

    /// The CLI was invoked with the wrong argument shape.
    #[error("usage: barrier-bench <centralized|tree_local|tree_global> <output-path>")]
    Usage,

    // === OS errors ===
    /// Pinning a worker thread to a core failed.
    #[error("failed to pin thread to core {core}: errno {errno}")]
    Affinity { core: usize, errno: i32 },

    /// A benchmark worker thread panicked mid-trial.
    #[error("benchmark worker thread panicked")]
    WorkerPanicked,

    // === Statistics errors ===
    /// A confidence interval was requested before enough samples arrived.
    #[error("confidence interval needs at least {needed} samples, have {have}")]
    NotEnoughSamples { needed: usize, have: usize },

    // === I/O errors ===
    /// Report file could not be created or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RondoError {
    /// Whether this error was caught at configuration time, before any
    /// thread was spawned.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ZeroFanout
                | Self::UnsupportedFanout { .. }
                | Self::UnknownAlgorithm { .. }
                | Self::ZeroWorkload
                | Self::Usage
        )
    }

    /// Process exit code for the benchmark CLI: 2 for configuration
    /// mistakes, 1 for runtime (OS / I/O) failures.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        if self.is_configuration() { 2 } else { 1 }
    }
}

/// Result type alias using [`RondoError`].
pub type Result<T> = std::result::Result<T, RondoError>;
