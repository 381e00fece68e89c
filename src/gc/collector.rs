//! Sliding mark-compact collection
//!
//! A collection runs four phases in order:
//!
//! 1. **Mark**: walk the object graph from the root stack, recording
//!    reachability in each cell's forwarding slot.
//! 2. **Plan**: scan the heap in address order and assign each live cell the
//!    offset it will occupy after compaction. Dead cells are skipped without
//!    advancing the destination cursor.
//! 3. **Resize** (reallocating policy only): grow the heap when the planned
//!    capacity exceeds the current one. Shrinking waits until after the
//!    slide, because a smaller region could not hold live cells that have
//!    not moved down yet.
//! 4. **Update and slide**: rewrite every pair field and every root to the
//!    planned offsets, then copy each live cell down to its target and clear
//!    its forwarding slot.
//!
//! Destinations never exceed sources, so the slide is a single ascending
//! walk. References are base-relative offsets, which keeps them valid across
//! the phase-3 reallocation even when the region moves in memory.

use tracing::debug;

use crate::error::RuntimeError;
use crate::gc::heap::{Heap, HEAP_HEADROOM, HEAP_MIN};
use crate::object::{ObjRef, Payload, CELL_SIZE};
use crate::stack::RootStack;

/// How the heap is sized around a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthPolicy {
    /// The heap keeps its initial capacity for the lifetime of the runtime.
    Fixed,
    /// The heap is reallocated each cycle to the surviving bytes times
    /// [`HEAP_HEADROOM`] plus the requested headroom, never below
    /// [`HEAP_MIN`].
    Reallocating,
}

/// Run one full stop-the-world collection cycle.
///
/// `additional` is the number of bytes the triggering allocation needs on
/// top of the surviving data.
pub(crate) fn collect(
    heap: &mut Heap,
    roots: &mut RootStack,
    policy: GrowthPolicy,
    additional: usize,
) -> Result<(), RuntimeError> {
    mark_from_roots(heap, roots);
    let live_bytes = plan_addresses(heap);

    let target = match policy {
        GrowthPolicy::Fixed => None,
        GrowthPolicy::Reallocating => Some(sized_capacity(live_bytes, additional)),
    };

    if let Some(target) = target {
        if target > heap.capacity() {
            heap.reallocate(target)?;
        }
    }

    update_references(heap, roots);
    slide(heap, live_bytes);

    // Deferred shrink: every survivor now sits below live_bytes, so the tail
    // of the region holds no data worth keeping.
    if let Some(target) = target {
        if target < heap.capacity() {
            heap.reallocate(target)?;
        }
    }

    debug!(
        live_bytes = heap.live_bytes(),
        heap_bytes = heap.capacity(),
        "collection complete"
    );
    Ok(())
}

/// Post-collection capacity for the reallocating policy.
fn sized_capacity(live_bytes: usize, additional: usize) -> usize {
    let grown = (live_bytes as f64 * HEAP_HEADROOM).round() as usize + additional;
    grown.max(HEAP_MIN)
}

/// Phase 1: mark every cell reachable from the roots.
///
/// Uses an explicit work list rather than recursion so deep or cyclic graphs
/// cannot exhaust the call stack. A marked cell is skipped on revisit, which
/// bounds the work to one visit per cell and terminates cycles.
fn mark_from_roots(heap: &mut Heap, roots: &RootStack) {
    let mut pending: Vec<ObjRef> = roots.iter().collect();
    while let Some(r) = pending.pop() {
        let cell = heap.cell_mut(r);
        if cell.is_marked() {
            continue;
        }
        cell.mark(r);
        if let Payload::Pair { head, tail } = cell.payload() {
            pending.push(head);
            pending.push(tail);
        }
    }
}

/// Phase 2: assign forwarding offsets.
///
/// One pass over the heap with a destination cursor that advances only past
/// live cells. Afterwards a live cell's forwarding slot holds the offset it
/// will occupy once slid. Returns the total surviving bytes.
fn plan_addresses(heap: &mut Heap) -> usize {
    let mut to = 0;
    for from in heap.cell_offsets() {
        if heap.cell(from).is_marked() {
            heap.cell_mut(from).set_forward(ObjRef(to));
            to += CELL_SIZE;
        }
    }
    to
}

/// Phase 4a: rewrite pair fields and roots to the planned offsets.
///
/// Must finish before the slide: it reads forwarding slots through the
/// cells' pre-compaction offsets, and the slide both moves the cells and
/// clears the slots.
fn update_references(heap: &mut Heap, roots: &mut RootStack) {
    for from in heap.cell_offsets() {
        if !heap.cell(from).is_marked() {
            continue;
        }
        if let Payload::Pair { head, tail } = heap.cell(from).payload() {
            let head = heap.cell(head).forward_target();
            let tail = heap.cell(tail).forward_target();
            heap.cell_mut(from).set_payload(Payload::Pair { head, tail });
        }
    }
    for slot in roots.iter_mut() {
        *slot = heap.cell(*slot).forward_target();
    }
}

/// Phase 4b: move live cells to their planned offsets and clear the marks.
///
/// Destinations are always at or below sources, so an ascending walk never
/// overwrites a cell that has not moved yet. Dead cells are walked past and
/// their storage abandoned.
fn slide(heap: &mut Heap, live_bytes: usize) {
    for from in heap.cell_offsets() {
        if !heap.cell(from).is_marked() {
            continue;
        }
        let to = heap.cell(from).forward_target();
        debug_assert!(to.offset() <= from.offset());
        let mut cell = *heap.cell(from);
        cell.clear_forward();
        *heap.cell_mut(to) = cell;
    }
    heap.set_frontier(live_bytes);
}
