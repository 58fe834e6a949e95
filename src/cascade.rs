//! In-flight sift-down bookkeeping and the lockstep cascade engine.
//!
//! A plain drain finishes one sift-down before starting the next, so every level of
//! every descent waits on a cache miss. A cascade keeps several descents open and
//! advances each by one level per extraction, which gives the memory system
//! independent loads to overlap.
//!
//! - [`PipelineQueue`]: fixed-capacity FIFO of in-flight operations, an intrusive
//!   singly linked list over an array with a free list beside it.
//! - [`CascadeEngine`]: lockstep cascade for any [`Addressing`] scheme. Operations
//!   carry their value in the array (swap-based), so an older operation is always at
//!   least as deep as a newer one and servicing oldest first keeps every comparison
//!   valid.

use cuneiform::cuneiform;

use crate::addressing::Addressing;
use crate::algo::HeapEngine;
use crate::core::Comparator;
use crate::sift::{self, Straight, leader};

/// Slots in a [`PipelineQueue`]. One in-flight operation per tree level is enough for
/// any slice a `usize` can index.
pub const QUEUE_CAPACITY: usize = 64;

/// End-of-list marker.
const NIL: usize = usize::MAX;

// Cache-aligned link block, kept apart from the entries it orders.
#[cuneiform]
struct QueueLinks {
    next: [usize; QUEUE_CAPACITY],
    head: usize,
    last: usize,
    free: usize,
    len: usize,
}

/// Bounded FIFO of in-flight operations with O(1) removal from the middle.
///
/// Every slot is either on the free list or on the active list. The active list is in
/// insertion order, so [`PipelineQueue::service`] visits the oldest operation first.
pub struct PipelineQueue<E> {
    links: QueueLinks,
    entries: [E; QUEUE_CAPACITY],
}

impl<E: Copy> PipelineQueue<E> {
    /// Creates an empty queue. `filler` only initializes unused slots.
    pub fn new(filler: E) -> Self {
        let mut next = [NIL; QUEUE_CAPACITY];
        // Free list runs from the top slot down to slot 0.
        for (slot, link) in next.iter_mut().enumerate().skip(1) {
            *link = slot - 1;
        }

        Self {
            links: QueueLinks {
                next,
                head: NIL,
                last: NIL,
                free: QUEUE_CAPACITY - 1,
                len: 0,
            },
            entries: [filler; QUEUE_CAPACITY],
        }
    }

    pub fn len(&self) -> usize {
        self.links.len
    }

    pub fn is_empty(&self) -> bool {
        self.links.len == 0
    }

    /// Appends an entry and returns its slot.
    ///
    /// Running out of slots is a scheduling bug; it trips a debug assertion and then an
    /// index panic.
    pub fn push_back(&mut self, entry: E) -> usize {
        let links = &mut self.links;
        let slot = links.free;
        debug_assert_ne!(slot, NIL, "pipeline queue overflow");

        links.free = links.next[slot];
        links.next[slot] = NIL;
        if links.last == NIL {
            links.head = slot;
        } else {
            links.next[links.last] = slot;
        }
        links.last = slot;
        links.len += 1;

        self.entries[slot] = entry;
        debug_assert!(self.sanity_check());
        slot
    }

    /// Removes and returns the oldest entry.
    pub fn pop_front(&mut self) -> Option<E> {
        let head = self.front()?;
        let entry = self.entries[head];
        self.unlink(None, head);
        Some(entry)
    }

    /// Slot of the oldest entry.
    pub fn front(&self) -> Option<usize> {
        (self.links.head != NIL).then_some(self.links.head)
    }

    /// Slot inserted right after `slot`.
    pub fn next_of(&self, slot: usize) -> Option<usize> {
        let next = self.links.next[slot];
        (next != NIL).then_some(next)
    }

    pub fn get(&self, slot: usize) -> &E {
        &self.entries[slot]
    }

    pub fn get_mut(&mut self, slot: usize) -> &mut E {
        &mut self.entries[slot]
    }

    /// Active slots, oldest first.
    pub fn slots(&self) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.front(), |&slot| self.next_of(slot))
    }

    /// Visits active entries oldest first, dropping those for which `step` returns
    /// `true` (settled).
    #[inline]
    pub fn service<F>(&mut self, mut step: F)
    where
        F: FnMut(&mut E) -> bool,
    {
        let mut previous = None;
        let mut current = self.front();
        while let Some(slot) = current {
            let following = self.next_of(slot);
            if step(&mut self.entries[slot]) {
                self.unlink(previous, slot);
            } else {
                previous = Some(slot);
            }
            current = following;
        }
    }

    /// Moves `slot`, whose active-list predecessor is `previous`, to the free list.
    fn unlink(&mut self, previous: Option<usize>, slot: usize) {
        let links = &mut self.links;
        let following = links.next[slot];
        match previous {
            None => {
                debug_assert_eq!(links.head, slot);
                links.head = following;
            }
            Some(prev) => {
                debug_assert_eq!(links.next[prev], slot);
                links.next[prev] = following;
            }
        }
        if links.last == slot {
            links.last = previous.unwrap_or(NIL);
        }

        links.next[slot] = links.free;
        links.free = slot;
        links.len -= 1;
        debug_assert!(self.sanity_check());
    }

    /// Checks that the free and active lists partition the slots and that the active
    /// list ends at `last`.
    pub fn sanity_check(&self) -> bool {
        let links = &self.links;
        let mut seen = [false; QUEUE_CAPACITY];

        let mut active = 0;
        let mut tail = NIL;
        let mut slot = links.head;
        while slot != NIL {
            if slot >= QUEUE_CAPACITY || seen[slot] {
                return false;
            }
            seen[slot] = true;
            active += 1;
            tail = slot;
            slot = links.next[slot];
        }

        let mut slot = links.free;
        while slot != NIL {
            if slot >= QUEUE_CAPACITY || seen[slot] {
                return false;
            }
            seen[slot] = true;
            slot = links.next[slot];
        }

        tail == links.last && active == links.len && seen.iter().all(|&s| s)
    }
}

/// Lockstep cascading heap sort over any addressing scheme.
///
/// Heapify is a plain straight heapify. Each drain step swaps the maximum out, starts
/// a sift-down at the root and advances every open sift-down by one level, oldest
/// first. Once nothing is left to extract the queue is flushed.
///
/// # Examples
///
/// ```
/// use heapcascade::addressing::{Base, FlatAddressing};
/// use heapcascade::cascade::CascadeEngine;
/// use heapcascade::core::Natural;
/// use heapcascade::HeapEngine;
///
/// let engine = CascadeEngine::new(FlatAddressing::<3>::new(Base::Zero));
/// let mut data = vec![5, 3, 8, 1, 9, 2];
/// engine.sort(&mut data, &mut Natural);
/// assert_eq!(data, vec![1, 2, 3, 5, 8, 9]);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct CascadeEngine<A> {
    addressing: A,
}

impl<A: Addressing> CascadeEngine<A> {
    pub fn new(addressing: A) -> Self {
        Self { addressing }
    }

    pub fn addressing(&self) -> &A {
        &self.addressing
    }

    /// One level for every open sift-down within the live heap `0..end`.
    fn advance<T: Copy, C: Comparator<T>>(
        &self,
        queue: &mut PipelineQueue<A::Cursor>,
        v: &mut [T],
        end: usize,
        cmp: &mut C,
    ) {
        let addressing = &self.addressing;
        queue.service(|cursor| {
            let node = addressing.slot(cursor);
            if node >= end {
                // Its value was swapped to the root, which owns it now.
                return true;
            }
            match leader(v, addressing.children(cursor), addressing.degree(cursor), end, cmp) {
                Some((child, k)) if cmp.below(&v[node], &v[child]) => {
                    v.swap(node, child);
                    *cursor = addressing.descend(cursor, k);
                    false
                }
                _ => true,
            }
        });
    }
}

impl<A: Addressing> HeapEngine for CascadeEngine<A> {
    fn heapify<T: Copy, C: Comparator<T>>(&self, v: &mut [T], cmp: &mut C) {
        sift::heapify::<T, A, Straight, C>(v, &self.addressing, cmp);
    }

    fn drain<T: Copy, C: Comparator<T>>(&self, v: &mut [T], cmp: &mut C) {
        let count = v.len();
        if count < 2 {
            return;
        }

        let root = self.addressing.root();
        let mut queue = PipelineQueue::new(root);
        for end in (1..count).rev() {
            v.swap(0, end);
            queue.push_back(root);
            self.advance(&mut queue, v, end, cmp);
        }

        while !queue.is_empty() {
            self.advance(&mut queue, v, 1, cmp);
        }
    }
}
