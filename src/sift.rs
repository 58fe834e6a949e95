//! Sift-down strategies and the generic heapify/drain loops built on them.
//!
//! Both strategies work on any [`Addressing`] scheme:
//!
//! - [`Straight`]: at every level pick the leader among the live children and swap it
//!   up while the sifted value is below it.
//! - [`AheadSimple`]: move leaders up all the way to a leaf without looking at the
//!   sifted value, then walk the value back up from the leaf. Most values sifted from
//!   the root belong near the bottom, so the walk back is short and each level costs
//!   `degree - 1` comparisons instead of `degree`.
//!
//! Among equal children the rightmost one leads, in every strategy of this crate.

use crate::addressing::{Addressing, ChildSpan};
use crate::core::Comparator;

/// Restores the max-heap property below one slot.
pub trait SiftDown {
    /// Sifts the value at `start` down within the live heap `0..end`.
    ///
    /// Every subtree below `start` must already be a heap.
    fn sift_down<T: Copy, A: Addressing, C: Comparator<T>>(
        v: &mut [T],
        addressing: &A,
        start: A::Cursor,
        end: usize,
        cmp: &mut C,
    );
}

/// Swap-based sift-down.
#[derive(Clone, Copy, Debug, Default)]
pub struct Straight;

/// Descend-first, bubble-back sift-down.
#[derive(Clone, Copy, Debug, Default)]
pub struct AheadSimple;

/// Largest live child of a node and its child number, or `None` for a leaf.
///
/// Ties go to the rightmost child.
#[inline(always)]
pub(crate) fn leader<T, C: Comparator<T>>(
    v: &[T],
    span: ChildSpan,
    degree: usize,
    end: usize,
    cmp: &mut C,
) -> Option<(usize, usize)> {
    if span.first >= end {
        return None;
    }

    let mut leader = span.first;
    let mut leader_k = 0;
    for k in 1..degree {
        let child = span.nth(k);
        if child >= end {
            break;
        }
        if !cmp.below(&v[child], &v[leader]) {
            leader = child;
            leader_k = k;
        }
    }
    Some((leader, leader_k))
}

impl SiftDown for Straight {
    #[inline]
    fn sift_down<T: Copy, A: Addressing, C: Comparator<T>>(
        v: &mut [T],
        addressing: &A,
        start: A::Cursor,
        end: usize,
        cmp: &mut C,
    ) {
        let mut cursor = start;
        let mut node = addressing.slot(&cursor);
        debug_assert!(node < end && end <= v.len());

        while let Some((child, k)) =
            leader(v, addressing.children(&cursor), addressing.degree(&cursor), end, cmp)
        {
            if !cmp.below(&v[node], &v[child]) {
                break;
            }
            v.swap(node, child);
            cursor = addressing.descend(&cursor, k);
            node = child;
        }
    }
}

impl SiftDown for AheadSimple {
    #[inline]
    fn sift_down<T: Copy, A: Addressing, C: Comparator<T>>(
        v: &mut [T],
        addressing: &A,
        start: A::Cursor,
        end: usize,
        cmp: &mut C,
    ) {
        let top = addressing.slot(&start);
        debug_assert!(top < end && end <= v.len());

        let item = v[top];
        let mut cursor = start;
        let mut hole = top;

        while let Some((child, k)) =
            leader(v, addressing.children(&cursor), addressing.degree(&cursor), end, cmp)
        {
            v[hole] = v[child];
            hole = child;
            cursor = addressing.descend(&cursor, k);
        }

        while hole != top {
            let Some(parent) = addressing.parent_slot(hole) else {
                break;
            };
            if !cmp.below(&v[parent], &item) {
                break;
            }
            v[hole] = v[parent];
            hole = parent;
        }
        v[hole] = item;
    }
}

/// Builds a max-heap over the whole slice.
///
/// Walks slots from the last one that can have children back to the root, so every
/// subtree is a heap before its root is sifted. Clustered layouts are thereby visited
/// cluster by cluster from the back, each bottom level first.
pub fn heapify<T, A, S, C>(v: &mut [T], addressing: &A, cmp: &mut C)
where
    T: Copy,
    A: Addressing,
    S: SiftDown,
    C: Comparator<T>,
{
    let count = v.len();
    if count < 2 {
        return;
    }

    let mut cursor = addressing.locate(addressing.last_internal(count));
    loop {
        S::sift_down(v, addressing, cursor, count, cmp);
        match addressing.predecessor(&cursor) {
            Some(prev) => cursor = prev,
            None => break,
        }
    }
}

/// Turns a max-heap into an ascending sequence by repeated root extraction.
pub fn drain<T, A, S, C>(v: &mut [T], addressing: &A, cmp: &mut C)
where
    T: Copy,
    A: Addressing,
    S: SiftDown,
    C: Comparator<T>,
{
    for end in (1..v.len()).rev() {
        v.swap(0, end);
        S::sift_down(v, addressing, addressing.root(), end, cmp);
    }
}

/// Returns whether the slice satisfies the max-heap property under `addressing`.
///
/// # Examples
///
/// ```
/// use heapcascade::addressing::{Base, FlatAddressing};
/// use heapcascade::core::Natural;
/// use heapcascade::sift::is_heap;
///
/// let flat = FlatAddressing::<2>::new(Base::Zero);
/// assert!(is_heap(&[9, 5, 8, 1, 3], &flat, &mut Natural));
/// assert!(!is_heap(&[1, 5, 8], &flat, &mut Natural));
/// ```
pub fn is_heap<T, A: Addressing, C: Comparator<T>>(v: &[T], addressing: &A, cmp: &mut C) -> bool {
    (1..v.len()).all(|slot| match addressing.parent_slot(slot) {
        Some(parent) => !cmp.below(&v[parent], &v[slot]),
        None => false,
    })
}
