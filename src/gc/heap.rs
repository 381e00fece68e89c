//! Contiguous cell heap
//!
//! Memory layout:
//! ```text
//! +--------------------+  <- base (offset 0)
//! |  allocated cells   |
//! |        ...         |
//! +--------------------+  <- frontier (next allocation)
//! |     free space     |
//! +--------------------+  <- end (capacity)
//! ```
//!
//! Cells are allocated by bumping the frontier; between collections the
//! frontier only advances. The region below the frontier is a dense array of
//! identical cells with no gaps, and space is reclaimed only by the collector
//! sliding live cells down and resetting the frontier.
//!
//! The backing store is a vector of words so that every cell offset stays
//! word-aligned; requested capacities round up to whole words.

use std::mem::size_of;

use crate::error::RuntimeError;
use crate::object::{Object, ObjRef, Payload, CELL_SIZE};

/// Smallest capacity the reallocating policy will shrink the heap to.
/// Always large enough for at least one cell.
pub const HEAP_MIN: usize = if CELL_SIZE > 16 { CELL_SIZE } else { 16 };

/// Growth factor applied to surviving bytes when the heap is resized.
pub const HEAP_HEADROOM: f64 = 1.5;

/// Capacity of the fixed-heap policy.
pub const HEAP_SIZE: usize = 1024 * 1024;

/// Word granularity of the backing store.
const WORD: usize = size_of::<u64>();

/// The contiguous object heap.
///
/// Owns the region and the frontier. Exhaustion policy belongs to the
/// caller; `allocate_cell` is a bare bump with a room precondition.
pub(crate) struct Heap {
    /// Backing store, sized in words to keep cell offsets aligned.
    words: Vec<u64>,
    /// Byte offset of the next allocation site.
    frontier: usize,
}

impl Heap {
    /// Create a heap with at least `capacity` bytes of room.
    pub(crate) fn new(capacity: usize) -> Result<Self, RuntimeError> {
        let len = capacity.div_ceil(WORD);
        let mut words = Vec::new();
        words
            .try_reserve_exact(len)
            .map_err(|_| RuntimeError::AllocationFailed)?;
        words.resize(len, 0);
        Ok(Heap { words, frontier: 0 })
    }

    /// Total capacity in bytes.
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.words.len() * WORD
    }

    /// Bytes of allocated cells: frontier minus base.
    #[inline]
    pub(crate) fn live_bytes(&self) -> usize {
        self.frontier
    }

    /// Whether one more cell fits without collecting.
    #[inline]
    pub(crate) fn has_room(&self) -> bool {
        self.capacity() - self.frontier >= CELL_SIZE
    }

    #[inline]
    fn base(&self) -> *const u8 {
        self.words.as_ptr() as *const u8
    }

    #[inline]
    fn base_mut(&mut self) -> *mut u8 {
        self.words.as_mut_ptr() as *mut u8
    }

    /// Allocate one cell at the frontier.
    ///
    /// The caller must have checked `has_room`; the bump itself never
    /// collects or fails.
    pub(crate) fn allocate_cell(&mut self, payload: Payload) -> ObjRef {
        debug_assert!(self.has_room());
        let r = ObjRef(self.frontier);
        // SAFETY: the frontier is word-aligned and in bounds per has_room.
        unsafe {
            (self.base_mut().add(r.offset()) as *mut Object).write(Object::new(payload));
        }
        self.frontier += CELL_SIZE;
        r
    }

    /// Borrow the cell at `r`.
    #[inline]
    pub(crate) fn cell(&self, r: ObjRef) -> &Object {
        debug_assert!(r.offset() % CELL_SIZE == 0);
        debug_assert!(r.offset() + CELL_SIZE <= self.frontier);
        // SAFETY: the offset names an initialized, aligned cell below the
        // frontier, and the borrow of self pins the backing store.
        unsafe { &*(self.base().add(r.offset()) as *const Object) }
    }

    /// Mutably borrow the cell at `r`.
    #[inline]
    pub(crate) fn cell_mut(&mut self, r: ObjRef) -> &mut Object {
        debug_assert!(r.offset() % CELL_SIZE == 0);
        debug_assert!(r.offset() + CELL_SIZE <= self.frontier);
        // SAFETY: as in `cell`, with exclusivity from &mut self.
        unsafe { &mut *(self.base_mut().add(r.offset()) as *mut Object) }
    }

    /// Offsets of all allocated cells, in address order.
    pub(crate) fn cell_offsets(&self) -> impl Iterator<Item = ObjRef> {
        (0..self.frontier / CELL_SIZE).map(|i| ObjRef(i * CELL_SIZE))
    }

    /// Replace the backing store with one of `new_capacity` bytes,
    /// preserving the byte prefix. The region may move; cell offsets are
    /// unaffected either way.
    pub(crate) fn reallocate(&mut self, new_capacity: usize) -> Result<(), RuntimeError> {
        // Shrinking below the frontier would truncate cells that still hold
        // data, so callers shrink only after compaction.
        debug_assert!(new_capacity >= self.frontier);
        let new_len = new_capacity.div_ceil(WORD);
        let old_len = self.words.len();
        if new_len > old_len {
            self.words
                .try_reserve_exact(new_len - old_len)
                .map_err(|_| RuntimeError::AllocationFailed)?;
            self.words.resize(new_len, 0);
        } else if new_len < old_len {
            self.words.truncate(new_len);
            self.words.shrink_to_fit();
        }
        Ok(())
    }

    /// Reset the frontier to the post-compaction high-water mark.
    pub(crate) fn set_frontier(&mut self, live_bytes: usize) {
        debug_assert!(live_bytes % CELL_SIZE == 0);
        debug_assert!(live_bytes <= self.capacity());
        self.frontier = live_bytes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_size_is_word_multiple() {
        assert!(CELL_SIZE > 0);
        assert_eq!(CELL_SIZE % WORD, 0);
    }

    #[test]
    fn test_heap_creation() {
        let heap = Heap::new(HEAP_MIN).unwrap();
        assert!(heap.capacity() >= HEAP_MIN);
        assert_eq!(heap.capacity() % WORD, 0);
        assert_eq!(heap.live_bytes(), 0);
    }

    #[test]
    fn test_bump_allocation_is_dense() {
        let mut heap = Heap::new(4 * CELL_SIZE).unwrap();

        let a = heap.allocate_cell(Payload::Int(1));
        let b = heap.allocate_cell(Payload::Int(2));
        let c = heap.allocate_cell(Payload::Int(3));

        assert_eq!(a, ObjRef(0));
        assert_eq!(b, ObjRef(CELL_SIZE));
        assert_eq!(c, ObjRef(2 * CELL_SIZE));
        assert_eq!(heap.live_bytes(), 3 * CELL_SIZE);
    }

    #[test]
    fn test_exact_fill() {
        let mut heap = Heap::new(2 * CELL_SIZE).unwrap();

        assert!(heap.has_room());
        heap.allocate_cell(Payload::Int(1));
        assert!(heap.has_room());
        heap.allocate_cell(Payload::Int(2));
        assert!(!heap.has_room());
    }

    #[test]
    fn test_payload_roundtrip() {
        let mut heap = Heap::new(2 * CELL_SIZE).unwrap();

        let a = heap.allocate_cell(Payload::Int(-5));
        let b = heap.allocate_cell(Payload::Pair { head: a, tail: a });

        assert_eq!(heap.cell(a).payload(), Payload::Int(-5));
        assert_eq!(heap.cell(b).payload(), Payload::Pair { head: a, tail: a });
    }

    #[test]
    fn test_reallocate_preserves_prefix() {
        let mut heap = Heap::new(2 * CELL_SIZE).unwrap();
        let a = heap.allocate_cell(Payload::Int(11));
        let b = heap.allocate_cell(Payload::Int(22));

        heap.reallocate(8 * CELL_SIZE).unwrap();
        assert!(heap.capacity() >= 8 * CELL_SIZE);
        assert_eq!(heap.cell(a).payload(), Payload::Int(11));
        assert_eq!(heap.cell(b).payload(), Payload::Int(22));

        heap.reallocate(2 * CELL_SIZE).unwrap();
        assert_eq!(heap.cell(a).payload(), Payload::Int(11));
        assert_eq!(heap.cell(b).payload(), Payload::Int(22));
    }
}
