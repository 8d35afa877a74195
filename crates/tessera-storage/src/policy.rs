//! Erase policies for [`PagedVec`].
//!
//! The policy is chosen per call site as a type parameter, e.g.
//! `vec.erase::<Strict>(i)`, so the container type does not carry it and
//! dispatch is resolved statically.

use std::mem;

use crate::paged::PagedVec;

/// How insertion and erasure treat the elements after the position.
///
/// Implementations are called by [`PagedVec`] after bounds checking:
/// `pos <= len` for `insert`, `pos < len` for `erase`, and
/// `start < end <= len` for `erase_range`.
pub trait ErasePolicy {
    /// Place `value` at `pos`.
    fn insert<T>(vec: &mut PagedVec<T>, pos: usize, value: T);

    /// Remove and return the element at `pos`.
    fn erase<T>(vec: &mut PagedVec<T>, pos: usize) -> T;

    /// Drop the elements in `start..end`.
    fn erase_range<T>(vec: &mut PagedVec<T>, start: usize, end: usize);
}

/// Order-preserving policy. O(distance to end).
#[derive(Clone, Copy, Debug, Default)]
pub struct Strict;

/// Swap-based policy. O(1) per element, does not preserve order.
#[derive(Clone, Copy, Debug, Default)]
pub struct Optimal;

impl ErasePolicy for Strict {
    fn insert<T>(vec: &mut PagedVec<T>, pos: usize, value: T) {
        let mut carry = value;
        for index in pos..vec.len() {
            carry = vec.replace(index, carry);
        }
        vec.push(carry);
    }

    fn erase<T>(vec: &mut PagedVec<T>, pos: usize) -> T {
        let Some(mut carry) = vec.pop() else {
            unreachable!("erase called on an empty PagedVec");
        };
        for index in (pos..vec.len()).rev() {
            carry = vec.replace(index, carry);
        }
        carry
    }

    fn erase_range<T>(vec: &mut PagedVec<T>, start: usize, end: usize) {
        let count = end - start;
        let len = vec.len();
        for index in start..len - count {
            vec.swap(index, index + count);
        }
        vec.truncate(len - count);
    }
}

impl ErasePolicy for Optimal {
    fn insert<T>(vec: &mut PagedVec<T>, pos: usize, value: T) {
        vec.push(value);
        let last = vec.len() - 1;
        if pos != last {
            vec.swap(pos, last);
        }
    }

    fn erase<T>(vec: &mut PagedVec<T>, pos: usize) -> T {
        let last = vec.len() - 1;
        if pos != last {
            vec.swap(pos, last);
        }
        match vec.pop() {
            Some(value) => value,
            None => unreachable!("erase called on an empty PagedVec"),
        }
    }

    fn erase_range<T>(vec: &mut PagedVec<T>, start: usize, end: usize) {
        // Highest first: each gap is refilled from past `end` or popped.
        for pos in (start..end).rev() {
            mem::drop(Self::erase(vec, pos));
        }
    }
}
