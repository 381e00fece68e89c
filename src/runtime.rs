//! Runtime instance
//!
//! The `Runtime` owns the heap and the root stack and is the only entry
//! point for mutator and driver code. Allocation that finds the heap full
//! collects once and retries; everything else is a thin layer over the two
//! components. Tearing the instance down releases the heap region with it.
//!
//! One collector, one mutator: nothing here is thread-safe and nothing
//! suspends. Every operation runs to completion before the next begins.

use std::collections::HashSet;
use std::fmt::Write as _;

use crate::error::RuntimeError;
use crate::gc::{collect, GrowthPolicy, Heap, HEAP_MIN, HEAP_SIZE};
use crate::object::{ObjRef, Payload, CELL_SIZE};
use crate::stack::RootStack;

/// A self-contained instance: one heap, one root stack, one growth policy.
pub struct Runtime {
    heap: Heap,
    stack: RootStack,
    policy: GrowthPolicy,
}

impl Runtime {
    /// Create a runtime with the reallocating policy and a minimal heap.
    pub fn new() -> Result<Self, RuntimeError> {
        Self::with_policy(GrowthPolicy::Reallocating)
    }

    /// Create a runtime with a fixed heap of [`HEAP_SIZE`] bytes.
    pub fn fixed() -> Result<Self, RuntimeError> {
        Self::with_policy(GrowthPolicy::Fixed)
    }

    /// Create a runtime with the given growth policy and its default
    /// starting capacity.
    pub fn with_policy(policy: GrowthPolicy) -> Result<Self, RuntimeError> {
        let capacity = match policy {
            GrowthPolicy::Fixed => HEAP_SIZE,
            GrowthPolicy::Reallocating => HEAP_MIN,
        };
        Ok(Runtime {
            heap: Heap::new(capacity)?,
            stack: RootStack::new(),
            policy,
        })
    }

    /// Create a fixed-policy runtime with a custom heap capacity.
    pub fn with_fixed_capacity(capacity: usize) -> Result<Self, RuntimeError> {
        Ok(Runtime {
            heap: Heap::new(capacity)?,
            stack: RootStack::new(),
            policy: GrowthPolicy::Fixed,
        })
    }

    /// Ensure room for one cell, collecting once if the heap is full.
    fn reserve_cell(&mut self) -> Result<(), RuntimeError> {
        if self.heap.has_room() {
            return Ok(());
        }
        collect(&mut self.heap, &mut self.stack, self.policy, CELL_SIZE)?;
        if self.heap.has_room() {
            Ok(())
        } else {
            Err(RuntimeError::OutOfMemory)
        }
    }

    /// Allocate an integer cell and push it onto the root stack.
    pub fn push_int(&mut self, value: i64) -> Result<ObjRef, RuntimeError> {
        self.reserve_cell()?;
        let r = self.heap.allocate_cell(Payload::Int(value));
        self.stack.push(r)?;
        Ok(r)
    }

    /// Allocate a pair from the top two stack entries, tail popped first and
    /// then head, and push the pair in their place.
    ///
    /// Room is reserved before the children are popped, so a collection
    /// triggered here still sees both of them rooted.
    pub fn push_pair(&mut self) -> Result<ObjRef, RuntimeError> {
        self.reserve_cell()?;
        let tail = self.stack.pop()?;
        let head = self.stack.pop()?;
        let r = self.heap.allocate_cell(Payload::Pair { head, tail });
        self.stack.push(r)?;
        Ok(r)
    }

    /// Remove and return the top of the root stack.
    pub fn pop(&mut self) -> Result<ObjRef, RuntimeError> {
        self.stack.pop()
    }

    /// Force a collection.
    pub fn gc(&mut self) -> Result<(), RuntimeError> {
        self.gc_with_headroom(0)
    }

    /// Force a collection, asking the heap to keep `additional` free bytes
    /// for upcoming allocation.
    pub fn gc_with_headroom(&mut self, additional: usize) -> Result<(), RuntimeError> {
        collect(&mut self.heap, &mut self.stack, self.policy, additional)
    }

    /// Number of cells on the heap. Immediately after a collection this is
    /// the survivor count; between collections it also counts garbage not
    /// yet reclaimed.
    pub fn live_count(&self) -> usize {
        self.heap.live_bytes() / CELL_SIZE
    }

    /// Current heap capacity in bytes.
    pub fn heap_capacity(&self) -> usize {
        self.heap.capacity()
    }

    /// Decode the cell at `r`.
    pub fn payload(&self, r: ObjRef) -> Payload {
        self.heap.cell(r).payload()
    }

    /// The integer stored at `r`, if it is an integer cell.
    pub fn int_value(&self, r: ObjRef) -> Option<i64> {
        match self.payload(r) {
            Payload::Int(v) => Some(v),
            Payload::Pair { .. } => None,
        }
    }

    /// The head of the pair at `r`, if it is a pair cell.
    pub fn head(&self, r: ObjRef) -> Option<ObjRef> {
        match self.payload(r) {
            Payload::Pair { head, .. } => Some(head),
            Payload::Int(_) => None,
        }
    }

    /// The tail of the pair at `r`, if it is a pair cell.
    pub fn tail(&self, r: ObjRef) -> Option<ObjRef> {
        match self.payload(r) {
            Payload::Pair { tail, .. } => Some(tail),
            Payload::Int(_) => None,
        }
    }

    /// Replace the head of the pair at `r`. Returns None for integer cells.
    pub fn set_head(&mut self, r: ObjRef, value: ObjRef) -> Option<()> {
        match self.payload(r) {
            Payload::Pair { tail, .. } => {
                self.heap
                    .cell_mut(r)
                    .set_payload(Payload::Pair { head: value, tail });
                Some(())
            }
            Payload::Int(_) => None,
        }
    }

    /// Replace the tail of the pair at `r`. Returns None for integer cells.
    pub fn set_tail(&mut self, r: ObjRef, value: ObjRef) -> Option<()> {
        match self.payload(r) {
            Payload::Pair { head, .. } => {
                self.heap
                    .cell_mut(r)
                    .set_payload(Payload::Pair { head, tail: value });
                Some(())
            }
            Payload::Int(_) => None,
        }
    }

    /// Top of the root stack without removing it.
    pub fn peek(&self) -> Option<ObjRef> {
        self.stack.peek()
    }

    /// Current root stack depth.
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// The roots, bottom to top.
    pub fn roots(&self) -> impl Iterator<Item = ObjRef> + '_ {
        self.stack.iter()
    }

    /// Render the graph reachable from `r`: integers as digits, pairs as
    /// `(head, tail)`. A back-edge into a pair already on the current path
    /// renders as `...` instead of recursing forever.
    pub fn render(&self, r: ObjRef) -> String {
        let mut out = String::new();
        let mut on_path = HashSet::new();
        self.render_into(r, &mut on_path, &mut out);
        out
    }

    fn render_into(&self, r: ObjRef, on_path: &mut HashSet<ObjRef>, out: &mut String) {
        match self.payload(r) {
            Payload::Int(v) => {
                let _ = write!(out, "{}", v);
            }
            Payload::Pair { head, tail } => {
                if !on_path.insert(r) {
                    out.push_str("...");
                    return;
                }
                out.push('(');
                self.render_into(head, on_path, out);
                out.push_str(", ");
                self.render_into(tail, on_path, out);
                out.push(')');
                on_path.remove(&r);
            }
        }
    }
}
