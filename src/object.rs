//! Heap cell encoding
//!
//! Every object on the heap occupies exactly one fixed-size cell. A cell
//! carries a forwarding slot, used only by the collector, and a payload that
//! is either a boxed integer or a pair of references to other cells.
//!
//! References are byte offsets from the heap base rather than raw addresses.
//! Offsets survive a heap reallocation unchanged, so the collector never has
//! to rebase references when the region moves in memory; only the sliding
//! compaction itself changes which offset a cell lives at.

use std::mem::size_of;

/// A reference to a heap cell: the cell's byte offset from the heap base.
///
/// Opaque outside the crate. Dereferencing goes through the owning runtime,
/// which converts the offset to an address inside the current heap region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef(pub(crate) usize);

impl ObjRef {
    /// Byte offset from the heap base.
    #[inline]
    pub(crate) fn offset(self) -> usize {
        self.0
    }
}

/// Forwarding slot value for a cell that has not been reached in the current
/// collection cycle. Offset zero names a real cell, so the sentinel lives at
/// the opposite end of the range.
const FORWARD_ABSENT: usize = usize::MAX;

/// The type-specific data of a cell.
///
/// This is a closed sum; the discriminant doubles as the cell's type tag and
/// the collector switches on it when tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// A boxed machine integer.
    Int(i64),
    /// Two references to other cells.
    Pair { head: ObjRef, tail: ObjRef },
}

/// A single heap cell.
///
/// Outside a collection cycle the forwarding slot is always absent. During a
/// cycle it first records that the cell was reached, then carries the offset
/// the cell will occupy after compaction, and is cleared again when the cell
/// lands there.
#[repr(C)]
#[derive(Clone, Copy)]
pub(crate) struct Object {
    forward: usize,
    payload: Payload,
}

/// Size of one heap cell in bytes. Every cell, live or dead, has this size.
pub const CELL_SIZE: usize = size_of::<Object>();

impl Object {
    /// A fresh cell with the forwarding slot absent.
    #[inline]
    pub(crate) fn new(payload: Payload) -> Self {
        Object {
            forward: FORWARD_ABSENT,
            payload,
        }
    }

    #[inline]
    pub(crate) fn payload(&self) -> Payload {
        self.payload
    }

    #[inline]
    pub(crate) fn set_payload(&mut self, payload: Payload) {
        self.payload = payload;
    }

    /// Whether the cell has been reached in the current cycle.
    #[inline]
    pub(crate) fn is_marked(&self) -> bool {
        self.forward != FORWARD_ABSENT
    }

    /// Record reachability. Any non-absent value would do; the cell's own
    /// offset is the conventional choice.
    #[inline]
    pub(crate) fn mark(&mut self, own: ObjRef) {
        self.forward = own.0;
    }

    /// The offset this cell will occupy after compaction. Meaningful only
    /// once address planning has overwritten the mark.
    #[inline]
    pub(crate) fn forward_target(&self) -> ObjRef {
        debug_assert!(self.is_marked());
        ObjRef(self.forward)
    }

    #[inline]
    pub(crate) fn set_forward(&mut self, target: ObjRef) {
        self.forward = target.0;
    }

    #[inline]
    pub(crate) fn clear_forward(&mut self) {
        self.forward = FORWARD_ABSENT;
    }
}
