//! Garbage collection
//!
//! The runtime uses a stop-the-world sliding mark-compact collector: live
//! cells keep their address order and move toward the heap base, dead cells
//! are abandoned in place, and the reclaimed space reopens as one contiguous
//! region at the top of the heap.
//!
//! Benefits of sliding compaction:
//! - No free lists and no fragmentation; allocation stays a frontier bump
//! - Survivor order is preserved, keeping related cells adjacent
//! - Cycles are handled by the mark phase without extra machinery
//!
//! Under the reallocating growth policy the collector also resizes the heap
//! around the survivors each cycle, so the region itself may move mid-cycle.

mod collector;
mod heap;

pub use collector::GrowthPolicy;
pub use heap::{HEAP_HEADROOM, HEAP_MIN, HEAP_SIZE};

pub(crate) use collector::collect;
pub(crate) use heap::Heap;
