//! Error taxonomy
//!
//! Every failure the runtime can surface to a driver. All of them are
//! terminal; the runtime attempts no local recovery. A collection that frees
//! nothing is not an error, and allocation reports `OutOfMemory` only if the
//! heap is still too small after collecting.

use thiserror::Error;

/// Errors surfaced to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Push onto a full root stack.
    #[error("root stack overflow")]
    StackOverflow,

    /// Pop from an empty root stack.
    #[error("root stack underflow")]
    StackUnderflow,

    /// No room for one cell even after a collection.
    #[error("out of memory")]
    OutOfMemory,

    /// The system allocator refused a heap request.
    #[error("heap allocation failed")]
    AllocationFailed,
}
