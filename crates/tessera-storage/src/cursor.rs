//! Random-access positions into a [`PagedVec`](crate::PagedVec).
//!
//! A [`Cursor`] tracks `(page_index, elem_index)` directly so stepping
//! within a page is a single increment; page boundaries are recomputed
//! only when the element index runs off either end. Arithmetic between
//! cursors works on the flat index `page_index * page_size + elem_index`.

use std::ops::{Add, Sub};

/// A position in a paged container.
///
/// Cursors are plain values; they do not borrow the container and may
/// point past its end. Resolve one with
/// [`PagedVec::get_at`](crate::PagedVec::get_at).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cursor {
    page: usize,
    elem: usize,
    page_shift: u32,
}

impl Cursor {
    pub(crate) fn new(index: usize, page_shift: u32) -> Self {
        Self {
            page: index >> page_shift,
            elem: index & ((1 << page_shift) - 1),
            page_shift,
        }
    }

    /// Flat index of this position.
    #[inline]
    pub fn index(self) -> usize {
        (self.page << self.page_shift) | self.elem
    }

    /// Page holding this position.
    #[inline]
    pub fn page_index(self) -> usize {
        self.page
    }

    /// Offset within the page.
    #[inline]
    pub fn elem_index(self) -> usize {
        self.elem
    }

    /// Page size this cursor was built for.
    #[inline]
    pub fn page_size(self) -> usize {
        1 << self.page_shift
    }

    /// The next position.
    pub fn advance(self) -> Self {
        let mut next = self;
        next.elem += 1;
        if next.elem == self.page_size() {
            next.elem = 0;
            next.page += 1;
        }
        next
    }

    /// The previous position, or `None` at index 0.
    pub fn retreat(self) -> Option<Self> {
        let mut prev = self;
        if prev.elem > 0 {
            prev.elem -= 1;
        } else {
            prev.page = prev.page.checked_sub(1)?;
            prev.elem = self.page_size() - 1;
        }
        Some(prev)
    }

    /// Move by `delta` elements, or `None` if that leaves `0..=usize::MAX`.
    pub fn checked_offset(self, delta: isize) -> Option<Self> {
        let index = self.index().checked_add_signed(delta)?;
        Some(Self::new(index, self.page_shift))
    }

    /// Signed number of elements from `self` to `other`.
    pub fn distance_to(self, other: Self) -> isize {
        debug_assert_eq!(self.page_shift, other.page_shift);
        other.index().wrapping_sub(self.index()) as isize
    }
}

impl Add<usize> for Cursor {
    type Output = Cursor;

    fn add(self, n: usize) -> Cursor {
        Cursor::new(self.index() + n, self.page_shift)
    }
}

impl Sub<usize> for Cursor {
    type Output = Cursor;

    fn sub(self, n: usize) -> Cursor {
        Cursor::new(self.index() - n, self.page_shift)
    }
}

impl Sub for Cursor {
    type Output = isize;

    fn sub(self, rhs: Cursor) -> isize {
        rhs.distance_to(self)
    }
}
