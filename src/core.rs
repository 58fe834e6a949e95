//! Core traits and types for heapcascade.
//!
//! This module defines:
//! - [`ComparisonType`]: The three outcomes a comparator can be asked about.
//! - [`Comparator`]: The ordering contract every engine sorts by.
//! - [`Natural`], [`Reversed`], [`ByOrdering`]: Ready-made comparators.
//! - [`Counting`]: A pass-through decorator that counts comparisons.

use std::cmp::Ordering;

/// Relation queried by [`Comparator::compare`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComparisonType {
    Below,
    Equal,
    Above,
}

/// A total order over `T`, queried one relation at a time.
///
/// Every engine builds a max-heap and only ever asks for [`ComparisonType::Below`]
/// (through [`Comparator::below`]). `Equal` and `Above` are part of the contract so
/// a comparator can be reused elsewhere, but the engines never rely on them.
///
/// Comparators take `&mut self` so stateful decorators such as [`Counting`] need
/// no interior mutability.
///
/// # Examples
///
/// Sorting records by a single field:
///
/// ```
/// use heapcascade::core::{Comparator, ComparisonType};
/// use heapcascade::heap_sort_with;
///
/// #[derive(Clone, Copy)]
/// struct Order {
///     id: u32,
///     price: u64,
/// }
///
/// struct ByPrice;
///
/// impl Comparator<Order> for ByPrice {
///     fn compare(&mut self, left: &Order, op: ComparisonType, right: &Order) -> bool {
///         match op {
///             ComparisonType::Below => left.price < right.price,
///             ComparisonType::Equal => left.price == right.price,
///             ComparisonType::Above => left.price > right.price,
///         }
///     }
/// }
///
/// let mut orders = vec![
///     Order { id: 1, price: 30 },
///     Order { id: 2, price: 10 },
///     Order { id: 3, price: 20 },
/// ];
/// heap_sort_with(&mut orders, &mut ByPrice);
///
/// let ids: Vec<u32> = orders.iter().map(|o| o.id).collect();
/// assert_eq!(ids, vec![2, 3, 1]);
/// ```
pub trait Comparator<T> {
    /// Returns whether `left <op> right` holds.
    fn compare(&mut self, left: &T, op: ComparisonType, right: &T) -> bool;

    /// Shorthand for `compare(left, Below, right)`.
    #[inline(always)]
    fn below(&mut self, left: &T, right: &T) -> bool {
        self.compare(left, ComparisonType::Below, right)
    }
}

impl<T, C: Comparator<T> + ?Sized> Comparator<T> for &mut C {
    #[inline(always)]
    fn compare(&mut self, left: &T, op: ComparisonType, right: &T) -> bool {
        (**self).compare(left, op, right)
    }
}

/// Ascending order according to [`Ord`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Natural;

impl<T: Ord> Comparator<T> for Natural {
    #[inline(always)]
    fn compare(&mut self, left: &T, op: ComparisonType, right: &T) -> bool {
        match op {
            ComparisonType::Below => left < right,
            ComparisonType::Equal => left == right,
            ComparisonType::Above => left > right,
        }
    }
}

/// Descending order according to [`Ord`].
///
/// Answers every query with the operands swapped, so `Below` becomes `Above`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Reversed;

impl<T: Ord> Comparator<T> for Reversed {
    #[inline(always)]
    fn compare(&mut self, left: &T, op: ComparisonType, right: &T) -> bool {
        Natural.compare(right, op, left)
    }
}

/// Adapts a `FnMut(&T, &T) -> Ordering` closure, the shape `slice::sort_by` takes.
///
/// # Examples
///
/// ```
/// use heapcascade::core::{ByOrdering, Comparator};
///
/// let mut by_abs = ByOrdering(|a: &i32, b: &i32| a.abs().cmp(&b.abs()));
/// assert!(by_abs.below(&-1, &-2));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct ByOrdering<F>(pub F);

impl<T, F: FnMut(&T, &T) -> Ordering> Comparator<T> for ByOrdering<F> {
    #[inline(always)]
    fn compare(&mut self, left: &T, op: ComparisonType, right: &T) -> bool {
        let ord = (self.0)(left, right);
        match op {
            ComparisonType::Below => ord == Ordering::Less,
            ComparisonType::Equal => ord == Ordering::Equal,
            ComparisonType::Above => ord == Ordering::Greater,
        }
    }
}

/// Decorator that counts every comparison forwarded to the inner comparator.
///
/// The counter lives in the decorator, so separate sorts never share it.
///
/// # Examples
///
/// ```
/// use heapcascade::core::{Counting, Natural};
/// use heapcascade::heap_sort_with;
///
/// let mut data = vec![4, 1, 3, 2];
/// let mut counter = Counting::new(Natural);
/// heap_sort_with(&mut data, &mut counter);
///
/// assert_eq!(data, vec![1, 2, 3, 4]);
/// assert!(counter.count() > 0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Counting<C> {
    inner: C,
    count: u64,
}

impl<C> Counting<C> {
    pub fn new(inner: C) -> Self {
        Self { inner, count: 0 }
    }

    /// Number of comparisons performed so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<T, C: Comparator<T>> Comparator<T> for Counting<C> {
    #[inline(always)]
    fn compare(&mut self, left: &T, op: ComparisonType, right: &T) -> bool {
        self.count += 1;
        self.inner.compare(left, op, right)
    }
}
