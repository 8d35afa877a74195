//! Stable-address paged vector.
//!
//! A [`PagedVec`] behaves like a `Vec<T>` but stores its elements in
//! fixed-size pages. Each page is a `Vec<T>` allocated once with exactly
//! `page_size` capacity and never pushed past it, so the page buffer never
//! reallocates. Growing the container appends pages to the directory;
//! moving the directory moves page headers, not element storage.
//!
//! Element `i` lives in page `i >> page_shift` at offset `i & page_mask`.
//! Every page before the one holding the last element is full, and pages
//! after it are empty.

use std::fmt;
use std::mem;
use std::ops::{Index, IndexMut, Range};

use crate::config::StorageConfig;
use crate::cursor::Cursor;
use crate::error::StorageError;
use crate::iter::{IntoIter, Iter, IterMut};
use crate::policy::{ErasePolicy, Optimal, Strict};

/// A growable sequence stored in fixed-size pages.
///
/// References to existing elements stay valid across [`push`](Self::push)
/// and [`reserve`](Self::reserve). Pages are only released by
/// [`shrink_to_fit`](Self::shrink_to_fit) or on drop.
pub struct PagedVec<T> {
    /// Page directory. `pages[p].len()` is the number of constructed
    /// elements in page `p`.
    pages: Vec<Vec<T>>,
    /// Logical element count.
    len: usize,
    /// `log2(page_size)`.
    page_shift: u32,
}

impl<T> PagedVec<T> {
    /// Create an empty container with the default page size.
    pub fn new() -> Self {
        Self::from_valid(&StorageConfig::default())
    }

    /// Create an empty container with `page_size` elements per page.
    pub fn with_page_size(page_size: usize) -> Result<Self, StorageError> {
        Self::with_config(&StorageConfig::new(page_size))
    }

    /// Create an empty container from a config, reserving its
    /// `initial_pages`.
    pub fn with_config(config: &StorageConfig) -> Result<Self, StorageError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: &StorageConfig) -> Self {
        let mut vec = Self {
            pages: Vec::new(),
            len: 0,
            page_shift: config.page_shift(),
        };
        vec.reserve_pages(config.initial_pages);
        vec
    }

    /// Elements per page.
    #[inline]
    pub fn page_size(&self) -> usize {
        1 << self.page_shift
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the container holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of elements the allocated pages can hold.
    pub fn capacity(&self) -> usize {
        self.pages.len() << self.page_shift
    }

    /// Number of allocated pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    #[inline]
    fn split(&self, index: usize) -> (usize, usize) {
        (index >> self.page_shift, index & (self.page_size() - 1))
    }

    fn used_pages(&self) -> usize {
        self.len.div_ceil(self.page_size())
    }

    /// Ensure capacity for at least `n` elements, allocating missing pages.
    ///
    /// Never releases pages and never moves existing elements.
    pub fn reserve(&mut self, n: usize) {
        self.reserve_pages(n.div_ceil(self.page_size()));
    }

    fn reserve_pages(&mut self, pages: usize) {
        if pages <= self.pages.len() {
            return;
        }
        self.pages.reserve(pages - self.pages.len());
        while self.pages.len() < pages {
            self.push_page();
        }
    }

    fn push_page(&mut self) {
        log::trace!(
            "allocating page {} ({} slots)",
            self.pages.len(),
            self.page_size()
        );
        self.pages.push(Vec::with_capacity(self.page_size()));
    }

    /// Append an element, allocating a page if the last one is full.
    ///
    /// Returns a reference to the new element.
    pub fn push(&mut self, value: T) -> &mut T {
        let (page, offset) = self.split(self.len);
        if page == self.pages.len() {
            self.push_page();
        }
        let slots = &mut self.pages[page];
        debug_assert_eq!(slots.len(), offset);
        slots.push(value);
        self.len += 1;
        &mut slots[offset]
    }

    /// Remove and return the last element. Pages are kept.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        let (page, _) = self.split(self.len);
        self.pages[page].pop()
    }

    /// Shared reference to the element at `index`, if any.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        let (page, offset) = self.split(index);
        self.pages.get(page)?.get(offset)
    }

    /// Mutable reference to the element at `index`, if any.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        let (page, offset) = self.split(index);
        self.pages.get_mut(page)?.get_mut(offset)
    }

    /// Bounds-checked access.
    pub fn at(&self, index: usize) -> Result<&T, StorageError> {
        let len = self.len;
        self.get(index)
            .ok_or(StorageError::OutOfRange { index, len })
    }

    /// Bounds-checked mutable access.
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, StorageError> {
        let len = self.len;
        self.get_mut(index)
            .ok_or(StorageError::OutOfRange { index, len })
    }

    /// The first element.
    pub fn first(&self) -> Option<&T> {
        self.get(0)
    }

    /// The last element.
    pub fn last(&self) -> Option<&T> {
        self.len.checked_sub(1).and_then(|last| self.get(last))
    }

    /// Mutable reference to the last element.
    pub fn last_mut(&mut self) -> Option<&mut T> {
        let last = self.len.checked_sub(1)?;
        self.get_mut(last)
    }

    /// Drop every element past `len`. Pages are kept.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        let (first_page, offset) = self.split(len);
        let used = self.used_pages();
        self.pages[first_page].truncate(offset);
        for page in &mut self.pages[first_page + 1..used] {
            page.clear();
        }
        self.len = len;
    }

    /// Drop every element. Pages are kept.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Grow or shrink to `new_len`, filling new slots with `f()`.
    pub fn resize_with<F>(&mut self, new_len: usize, mut f: F)
    where
        F: FnMut() -> T,
    {
        if new_len <= self.len {
            self.truncate(new_len);
            return;
        }
        self.reserve(new_len);
        while self.len < new_len {
            self.push(f());
        }
    }

    /// Release pages past the last one holding an element.
    pub fn shrink_to_fit(&mut self) {
        let used = self.used_pages();
        if self.pages.len() > used {
            log::debug!(
                "releasing {} trailing pages ({} kept)",
                self.pages.len() - used,
                used
            );
            self.pages.truncate(used);
        }
        self.pages.shrink_to_fit();
    }

    /// Swap the elements at `a` and `b`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    pub fn swap(&mut self, a: usize, b: usize) {
        assert!(
            a < self.len && b < self.len,
            "swap indices ({a}, {b}) out of range for length {}",
            self.len
        );
        let (pa, oa) = self.split(a);
        let (pb, ob) = self.split(b);
        if pa == pb {
            self.pages[pa].swap(oa, ob);
            return;
        }
        let (low, high) = if pa < pb { (pa, pb) } else { (pb, pa) };
        let (head, tail) = self.pages.split_at_mut(high);
        let (low_off, high_off) = if pa < pb { (oa, ob) } else { (ob, oa) };
        mem::swap(&mut head[low][low_off], &mut tail[0][high_off]);
    }

    /// Replace the element at `index`, returning the old one.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn replace(&mut self, index: usize, value: T) -> T {
        mem::replace(&mut self[index], value)
    }

    /// Insert `value` at `pos` using erase policy `P`.
    ///
    /// [`Strict`] shifts the tail right; [`Optimal`] moves the displaced
    /// element to the end. Either way the new element ends up at `pos`.
    pub fn insert<P: ErasePolicy>(&mut self, pos: usize, value: T) -> Result<&mut T, StorageError> {
        if pos > self.len {
            return Err(StorageError::OutOfRange {
                index: pos,
                len: self.len,
            });
        }
        P::insert(self, pos, value);
        Ok(&mut self[pos])
    }

    /// Remove the element at `pos` using erase policy `P`.
    pub fn erase<P: ErasePolicy>(&mut self, pos: usize) -> Result<T, StorageError> {
        if pos >= self.len {
            return Err(StorageError::OutOfRange {
                index: pos,
                len: self.len,
            });
        }
        Ok(P::erase(self, pos))
    }

    /// Remove the elements in `range` using erase policy `P`.
    pub fn erase_range<P: ErasePolicy>(&mut self, range: Range<usize>) -> Result<(), StorageError> {
        if range.end > self.len {
            return Err(StorageError::OutOfRange {
                index: range.end,
                len: self.len,
            });
        }
        if range.start > range.end {
            return Err(StorageError::OutOfRange {
                index: range.start,
                len: range.end,
            });
        }
        if !range.is_empty() {
            P::erase_range(self, range.start, range.end);
        }
        Ok(())
    }

    /// Order-preserving removal.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is out of range.
    pub fn remove(&mut self, pos: usize) -> T {
        let len = self.len;
        match self.erase::<Strict>(pos) {
            Ok(value) => value,
            Err(_) => panic!("removal index (is {pos}) should be < len (is {len})"),
        }
    }

    /// O(1) removal that moves the last element into the gap.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is out of range.
    pub fn swap_remove(&mut self, pos: usize) -> T {
        let len = self.len;
        match self.erase::<Optimal>(pos) {
            Ok(value) => value,
            Err(_) => panic!("swap_remove index (is {pos}) should be < len (is {len})"),
        }
    }

    /// Iterate the elements in order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(&self.pages[..self.used_pages()], self.len)
    }

    /// Iterate the elements mutably in order.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        let used = self.used_pages();
        IterMut::new(&mut self.pages[..used], self.len)
    }

    /// The constructed elements of each page, one slice per used page.
    ///
    /// Lets hot loops run over contiguous slices instead of paying a
    /// page lookup per element.
    pub fn pages(&self) -> impl ExactSizeIterator<Item = &[T]> + '_ {
        self.pages[..self.used_pages()].iter().map(Vec::as_slice)
    }

    /// Mutable slices of each used page.
    pub fn pages_mut(&mut self) -> impl ExactSizeIterator<Item = &mut [T]> + '_ {
        let used = self.used_pages();
        self.pages[..used].iter_mut().map(Vec::as_mut_slice)
    }

    /// Cursor positioned at `index`. May point past the end.
    pub fn cursor(&self, index: usize) -> Cursor {
        Cursor::new(index, self.page_shift)
    }

    /// Cursor at the first element.
    pub fn begin(&self) -> Cursor {
        self.cursor(0)
    }

    /// Cursor one past the last element.
    pub fn end(&self) -> Cursor {
        self.cursor(self.len)
    }

    /// The element under `cursor`, if it is in range.
    pub fn get_at(&self, cursor: Cursor) -> Option<&T> {
        debug_assert_eq!(cursor.page_size(), self.page_size());
        self.pages.get(cursor.page_index())?.get(cursor.elem_index())
    }

    /// Mutable access to the element under `cursor`.
    pub fn get_at_mut(&mut self, cursor: Cursor) -> Option<&mut T> {
        debug_assert_eq!(cursor.page_size(), self.page_size());
        self.pages
            .get_mut(cursor.page_index())?
            .get_mut(cursor.elem_index())
    }
}

impl<T: Clone> PagedVec<T> {
    /// Grow or shrink to `new_len`, filling new slots with clones of
    /// `value`.
    pub fn resize(&mut self, new_len: usize, value: T) {
        self.resize_with(new_len, || value.clone());
    }
}

impl<T> Default for PagedVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for PagedVec<T> {
    fn clone(&self) -> Self {
        // `Vec::clone` only guarantees capacity >= len, which would let a
        // cloned page reallocate on push.
        let pages = self
            .pages
            .iter()
            .map(|page| {
                let mut copy = Vec::with_capacity(self.page_size());
                copy.extend(page.iter().cloned());
                copy
            })
            .collect();
        Self {
            pages,
            len: self.len,
            page_shift: self.page_shift,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PagedVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for PagedVec<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for PagedVec<T> {}

impl<T> Index<usize> for PagedVec<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(value) => value,
            None => panic!(
                "index out of bounds: the len is {} but the index is {index}",
                self.len
            ),
        }
    }
}

impl<T> IndexMut<usize> for PagedVec<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len;
        match self.get_mut(index) {
            Some(value) => value,
            None => panic!("index out of bounds: the len is {len} but the index is {index}"),
        }
    }
}

impl<T> Extend<T> for PagedVec<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        self.reserve(self.len.saturating_add(lower));
        for value in iter {
            self.push(value);
        }
    }
}

impl<T> FromIterator<T> for PagedVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut vec = Self::new();
        vec.extend(iter);
        vec
    }
}

impl<'a, T> IntoIterator for &'a PagedVec<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut PagedVec<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}

impl<T> IntoIterator for PagedVec<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(mut self) -> IntoIter<T> {
        let used = self.used_pages();
        self.pages.truncate(used);
        IntoIter::new(self.pages, self.len)
    }
}
