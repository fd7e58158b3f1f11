//! Doubly linked list over an index arena
//!
//! Entries are addressed by slot index instead of pointers. A slot that has
//! been vacated goes on the free list and is reused by the next insertion;
//! its generation is bumped so handles to the old entry no longer resolve.

use std::fmt;
use std::iter::FusedIterator;
use std::ops::{Index, IndexMut};
use std::sync::atomic::{AtomicU32, Ordering};

use tracing::trace;

use crate::error::{Error, Result};

static NEXT_LIST_ID: AtomicU32 = AtomicU32::new(1);

/// Stable, non-owning reference to an entry of a [`RecencyList`]
///
/// Handles are only meaningful for the list that issued them and only while
/// the entry they name is still linked.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    list: u32,
    slot: usize,
    generation: u32,
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}:{}@{})", self.list, self.slot, self.generation)
    }
}

/// Linked entry
struct Node<T> {
    value: T,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Arena slot; `node` is `None` while the slot sits on the free list
struct Slot<T> {
    generation: u32,
    node: Option<Node<T>>,
}

/// Ordered list tracking recency from head (least recent) to tail (most recent)
pub struct RecencyList<T> {
    id: u32,
    slots: Vec<Slot<T>>,
    free_list: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> RecencyList<T> {
    /// Create an empty list
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty list with room for `capacity` entries before the
    /// arena reallocates
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            id: NEXT_LIST_ID.fetch_add(1, Ordering::Relaxed),
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Create a list holding a single entry
    pub fn from_value(value: T) -> Self {
        let mut list = Self::with_capacity(1);
        list.add_to_head(value);
        list
    }

    /// Number of linked entries
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the list has no entries
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Handle of the head (least recently used) entry
    pub fn head(&self) -> Option<Handle> {
        self.head.map(|idx| self.handle(idx))
    }

    /// Handle of the tail (most recently used) entry
    pub fn tail(&self) -> Option<Handle> {
        self.tail.map(|idx| self.handle(idx))
    }

    /// Insert `value` as the new head
    pub fn add_to_head(&mut self, value: T) -> Handle {
        let idx = self.alloc(value);
        self.link_head(idx);
        self.len += 1;
        self.handle(idx)
    }

    /// Insert `value` as the new tail
    pub fn add_to_tail(&mut self, value: T) -> Handle {
        let idx = self.alloc(value);
        self.link_tail(idx);
        self.len += 1;
        self.handle(idx)
    }

    /// Remove the head entry and return its value
    ///
    /// Returns `None` if the list is empty.
    pub fn remove_from_head(&mut self) -> Option<T> {
        let idx = self.head?;
        Some(self.remove_at(idx))
    }

    /// Remove the tail entry and return its value
    ///
    /// Returns `None` if the list is empty.
    pub fn remove_from_tail(&mut self) -> Option<T> {
        let idx = self.tail?;
        Some(self.remove_at(idx))
    }

    /// Relink an entry as the head without reallocating it
    ///
    /// # Panics
    /// If `handle` is stale or was issued by another list.
    pub fn move_to_front(&mut self, handle: Handle) {
        let idx = self.expect_slot(handle, "move_to_front");
        self.move_to_front_at(idx);
    }

    /// Relink an entry as the tail without reallocating it
    ///
    /// # Panics
    /// If `handle` is stale or was issued by another list.
    pub fn move_to_end(&mut self, handle: Handle) {
        let idx = self.expect_slot(handle, "move_to_end");
        self.move_to_end_at(idx);
    }

    /// Remove an entry from any position and return its value
    ///
    /// # Panics
    /// If `handle` is stale or was issued by another list.
    pub fn delete(&mut self, handle: Handle) -> T {
        let idx = self.expect_slot(handle, "delete");
        self.remove_at(idx)
    }

    /// Like [`move_to_front`](Self::move_to_front), reporting a bad handle as an error
    pub fn try_move_to_front(&mut self, handle: Handle) -> Result<()> {
        let idx = self.resolve(handle).ok_or(Error::InvalidHandle(handle))?;
        self.move_to_front_at(idx);
        Ok(())
    }

    /// Like [`move_to_end`](Self::move_to_end), reporting a bad handle as an error
    pub fn try_move_to_end(&mut self, handle: Handle) -> Result<()> {
        let idx = self.resolve(handle).ok_or(Error::InvalidHandle(handle))?;
        self.move_to_end_at(idx);
        Ok(())
    }

    /// Like [`delete`](Self::delete), reporting a bad handle as an error
    pub fn try_delete(&mut self, handle: Handle) -> Result<T> {
        let idx = self.resolve(handle).ok_or(Error::InvalidHandle(handle))?;
        Ok(self.remove_at(idx))
    }

    /// Insert `value` directly after the entry named by `handle`
    ///
    /// # Panics
    /// If `handle` is stale or was issued by another list.
    pub fn insert_after(&mut self, handle: Handle, value: T) -> Handle {
        let anchor = self.expect_slot(handle, "insert_after");
        let idx = self.alloc(value);
        let next = self.node(anchor).next;

        {
            let node = self.node_mut(idx);
            node.prev = Some(anchor);
            node.next = next;
        }
        self.node_mut(anchor).next = Some(idx);
        match next {
            Some(next_idx) => self.node_mut(next_idx).prev = Some(idx),
            None => self.tail = Some(idx),
        }

        self.len += 1;
        self.handle(idx)
    }

    /// Insert `value` directly before the entry named by `handle`
    ///
    /// # Panics
    /// If `handle` is stale or was issued by another list.
    pub fn insert_before(&mut self, handle: Handle, value: T) -> Handle {
        let anchor = self.expect_slot(handle, "insert_before");
        let idx = self.alloc(value);
        let prev = self.node(anchor).prev;

        {
            let node = self.node_mut(idx);
            node.prev = prev;
            node.next = Some(anchor);
        }
        self.node_mut(anchor).prev = Some(idx);
        match prev {
            Some(prev_idx) => self.node_mut(prev_idx).next = Some(idx),
            None => self.head = Some(idx),
        }

        self.len += 1;
        self.handle(idx)
    }

    /// Handle of the entry before `handle` (towards the head)
    ///
    /// # Panics
    /// If `handle` is stale or was issued by another list.
    pub fn prev(&self, handle: Handle) -> Option<Handle> {
        let idx = self.expect_slot(handle, "prev");
        self.node(idx).prev.map(|prev| self.handle(prev))
    }

    /// Handle of the entry after `handle` (towards the tail)
    ///
    /// # Panics
    /// If `handle` is stale or was issued by another list.
    pub fn next(&self, handle: Handle) -> Option<Handle> {
        let idx = self.expect_slot(handle, "next");
        self.node(idx).next.map(|next| self.handle(next))
    }

    /// Check whether `handle` names a linked entry of this list
    pub fn contains(&self, handle: Handle) -> bool {
        self.resolve(handle).is_some()
    }

    /// Value of the entry named by `handle`, or `None` for a bad handle
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.resolve(handle).map(|idx| &self.node(idx).value)
    }

    /// Mutable value of the entry named by `handle`, or `None` for a bad handle
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let idx = self.resolve(handle)?;
        Some(&mut self.node_mut(idx).value)
    }

    /// Iterate values from head to tail
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            front: self.head,
            back: self.tail,
            remaining: self.len,
        }
    }

    /// Remove every entry; all outstanding handles become stale
    pub fn clear(&mut self) {
        trace!(len = self.len, "clearing recency list");
        while self.remove_from_head().is_some() {}
    }

    /// Walk the list in both directions and verify the link invariants
    pub fn check_invariants(&self) -> Result<()> {
        if (self.len == 0) != (self.head.is_none() && self.tail.is_none()) {
            return Err(corrupted(format!(
                "len {} disagrees with head {:?} / tail {:?}",
                self.len, self.head, self.tail
            )));
        }
        if self.head.is_none() != self.tail.is_none() {
            return Err(corrupted("only one end of the list is set"));
        }

        // Forward: head -> tail, every successor points back at us
        let mut steps = 0;
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            let node = self
                .slots
                .get(idx)
                .and_then(|slot| slot.node.as_ref())
                .ok_or_else(|| corrupted(format!("slot {} is linked but vacant", idx)))?;
            if node.prev != prev {
                return Err(corrupted(format!(
                    "slot {} has prev {:?}, expected {:?}",
                    idx, node.prev, prev
                )));
            }
            steps += 1;
            if steps > self.len {
                return Err(corrupted("forward walk exceeds len"));
            }
            prev = Some(idx);
            cursor = node.next;
        }
        if steps != self.len {
            return Err(corrupted(format!(
                "forward walk took {} steps, len is {}",
                steps, self.len
            )));
        }
        if prev != self.tail {
            return Err(corrupted("forward walk did not end at tail"));
        }

        // Backward: tail -> head
        let mut steps = 0;
        let mut last = None;
        let mut cursor = self.tail;
        while let Some(idx) = cursor {
            steps += 1;
            if steps > self.len {
                return Err(corrupted("backward walk exceeds len"));
            }
            last = Some(idx);
            cursor = self
                .slots
                .get(idx)
                .and_then(|slot| slot.node.as_ref())
                .ok_or_else(|| corrupted(format!("slot {} is linked but vacant", idx)))?
                .prev;
        }
        if steps != self.len || last != self.head {
            return Err(corrupted("backward walk did not reach head in len steps"));
        }

        let occupied = self.slots.iter().filter(|slot| slot.node.is_some()).count();
        if occupied != self.len {
            return Err(corrupted(format!(
                "{} occupied slots for {} linked entries",
                occupied, self.len
            )));
        }

        Ok(())
    }

    fn handle(&self, idx: usize) -> Handle {
        Handle {
            list: self.id,
            slot: idx,
            generation: self.slots[idx].generation,
        }
    }

    fn resolve(&self, handle: Handle) -> Option<usize> {
        if handle.list != self.id {
            return None;
        }
        let slot = self.slots.get(handle.slot)?;
        if slot.generation == handle.generation && slot.node.is_some() {
            Some(handle.slot)
        } else {
            None
        }
    }

    fn expect_slot(&self, handle: Handle, op: &str) -> usize {
        match self.resolve(handle) {
            Some(idx) => idx,
            None => panic!("{}: {:?} does not name an entry of this list", op, handle),
        }
    }

    fn node(&self, idx: usize) -> &Node<T> {
        match &self.slots[idx].node {
            Some(node) => node,
            None => unreachable!("slot {} is vacant", idx),
        }
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node<T> {
        match &mut self.slots[idx].node {
            Some(node) => node,
            None => unreachable!("slot {} is vacant", idx),
        }
    }

    fn alloc(&mut self, value: T) -> usize {
        let node = Node {
            value,
            prev: None,
            next: None,
        };
        if let Some(idx) = self.free_list.pop() {
            self.slots[idx].node = Some(node);
            idx
        } else {
            let idx = self.slots.len();
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            idx
        }
    }

    fn retire(&mut self, idx: usize) -> T {
        let slot = &mut self.slots[idx];
        slot.generation = slot.generation.wrapping_add(1);
        let node = match slot.node.take() {
            Some(node) => node,
            None => unreachable!("slot {} retired twice", idx),
        };
        self.free_list.push(idx);
        node.value
    }

    fn remove_at(&mut self, idx: usize) -> T {
        self.unlink(idx);
        self.len -= 1;
        self.retire(idx)
    }

    fn move_to_front_at(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return; // Already at front
        }
        self.unlink(idx);
        self.link_head(idx);
    }

    fn move_to_end_at(&mut self, idx: usize) {
        if self.tail == Some(idx) {
            return; // Already at end
        }
        self.unlink(idx);
        self.link_tail(idx);
    }

    fn link_head(&mut self, idx: usize) {
        let old_head = self.head;
        {
            let node = self.node_mut(idx);
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(head_idx) => self.node_mut(head_idx).prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    fn link_tail(&mut self, idx: usize) {
        let old_tail = self.tail;
        {
            let node = self.node_mut(idx);
            node.prev = old_tail;
            node.next = None;
        }
        match old_tail {
            Some(tail_idx) => self.node_mut(tail_idx).next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = {
            let node = self.node_mut(idx);
            (node.prev.take(), node.next.take())
        };

        match prev {
            Some(prev_idx) => self.node_mut(prev_idx).next = next,
            None => self.head = next,
        }

        match next {
            Some(next_idx) => self.node_mut(next_idx).prev = prev,
            None => self.tail = prev,
        }
    }
}

impl<T: Ord> RecencyList<T> {
    /// Largest value, scanning head to tail; the earliest wins on ties
    ///
    /// Returns `None` if the list is empty.
    pub fn get_max(&self) -> Option<&T> {
        self.iter()
            .reduce(|max, value| if value > max { value } else { max })
    }
}

fn corrupted(msg: impl Into<String>) -> Error {
    Error::Corrupted(msg.into())
}

impl<T> Default for RecencyList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for RecencyList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> Index<Handle> for RecencyList<T> {
    type Output = T;

    fn index(&self, handle: Handle) -> &T {
        let idx = self.expect_slot(handle, "index");
        &self.node(idx).value
    }
}

impl<T> IndexMut<Handle> for RecencyList<T> {
    fn index_mut(&mut self, handle: Handle) -> &mut T {
        let idx = self.expect_slot(handle, "index_mut");
        &mut self.node_mut(idx).value
    }
}

impl<'a, T> IntoIterator for &'a RecencyList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

/// Head-to-tail iterator over the values of a [`RecencyList`]
pub struct Iter<'a, T> {
    list: &'a RecencyList<T>,
    front: Option<usize>,
    back: Option<usize>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.front?;
        let node = self.list.node(idx);
        self.front = node.next;
        self.remaining -= 1;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.back?;
        let node = self.list.node(idx);
        self.back = node.prev;
        self.remaining -= 1;
        Some(&node.value)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}
