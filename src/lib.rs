//! SlideGC - a toy runtime built around a sliding mark-compact collector
//!
//! The runtime manages a contiguous heap of fixed-size cells holding boxed
//! integers and pairs, rooted by a bounded value stack. When allocation
//! exhausts the heap, a stop-the-world collection slides every live cell
//! toward the heap base, patches all references, and, under the reallocating
//! policy, resizes the heap region around the survivors.
//!
//! # Features
//! - Bump allocation over a dense array of identical cells
//! - Four-phase compaction: mark, plan addresses, resize, update and slide
//! - Heap references are base-relative offsets, so a moving heap region
//!   never invalidates them
//! - Fixed and reallocating growth policies behind one implementation
//!
//! # Example
//! ```
//! use slidegc::Runtime;
//!
//! # fn main() -> Result<(), slidegc::RuntimeError> {
//! let mut rt = Runtime::new()?;
//! rt.push_int(1)?;
//! rt.push_int(2)?;
//! rt.push_pair()?;
//! rt.gc()?;
//! assert_eq!(rt.live_count(), 3);
//! # Ok(())
//! # }
//! ```

// Core modules
pub mod error;
pub mod object;
pub mod runtime;
pub mod stack;

// Garbage collector
pub mod gc;

// Re-export main types
pub use error::RuntimeError;
pub use gc::{GrowthPolicy, HEAP_HEADROOM, HEAP_MIN, HEAP_SIZE};
pub use object::{ObjRef, Payload, CELL_SIZE};
pub use runtime::Runtime;
pub use stack::STACK_MAX;
