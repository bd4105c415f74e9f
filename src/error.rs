//! # Kernel Errors
//!
//! Failure values for the kernel's checked operations. Everything the
//! kernel cannot handle this way (hardware faults, unknown supervisor
//! requests) is routed through the fault handlers or the gateway's
//! diagnostic path instead and never surfaces as an `Error`.

use core::fmt;

/// Result type for kernel operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Checked failures of the kernel API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The thread pool already holds `MAX_THREADS` descriptors.
    /// No state was committed.
    PoolExhausted,
    /// A thread was requested with a zero-byte stack.
    ZeroStackSize,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::PoolExhausted => write!(f, "thread pool is full"),
            Error::ZeroStackSize => write!(f, "requested stack size is zero"),
        }
    }
}
