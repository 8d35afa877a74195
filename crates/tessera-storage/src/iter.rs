//! Iterators over [`PagedVec`](crate::PagedVec).
//!
//! All three iterators flatten the used pages. Each keeps a front and a
//! back page iterator so it can be driven from either end, and skips whole
//! pages in `nth` instead of stepping element by element.

use std::iter::FusedIterator;
use std::{slice, vec};

/// Shared iterator returned by [`PagedVec::iter`](crate::PagedVec::iter).
pub struct Iter<'a, T> {
    pages: slice::Iter<'a, Vec<T>>,
    front: slice::Iter<'a, T>,
    back: slice::Iter<'a, T>,
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(pages: &'a [Vec<T>], len: usize) -> Self {
        Self {
            pages: pages.iter(),
            front: Default::default(),
            back: Default::default(),
            remaining: len,
        }
    }
}

impl<'a, T> Clone for Iter<'a, T> {
    fn clone(&self) -> Self {
        Self {
            pages: self.pages.clone(),
            front: self.front.clone(),
            back: self.back.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        loop {
            if let Some(value) = self.front.next() {
                self.remaining -= 1;
                return Some(value);
            }
            match self.pages.next() {
                Some(page) => self.front = page.iter(),
                None => {
                    let value = self.back.next()?;
                    self.remaining -= 1;
                    return Some(value);
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }

    fn nth(&mut self, mut n: usize) -> Option<&'a T> {
        if n >= self.remaining {
            self.pages = Default::default();
            self.front = Default::default();
            self.back = Default::default();
            self.remaining = 0;
            return None;
        }
        while n >= self.front.len() {
            n -= self.front.len();
            self.remaining -= self.front.len();
            self.front = match self.pages.next() {
                Some(page) => page.iter(),
                None => std::mem::take(&mut self.back),
            };
        }
        self.remaining -= n + 1;
        self.front.nth(n)
    }

    fn count(self) -> usize {
        self.remaining
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        loop {
            if let Some(value) = self.back.next_back() {
                self.remaining -= 1;
                return Some(value);
            }
            match self.pages.next_back() {
                Some(page) => self.back = page.iter(),
                None => {
                    let value = self.front.next_back()?;
                    self.remaining -= 1;
                    return Some(value);
                }
            }
        }
    }

    fn nth_back(&mut self, mut n: usize) -> Option<&'a T> {
        if n >= self.remaining {
            self.pages = Default::default();
            self.front = Default::default();
            self.back = Default::default();
            self.remaining = 0;
            return None;
        }
        while n >= self.back.len() {
            n -= self.back.len();
            self.remaining -= self.back.len();
            self.back = match self.pages.next_back() {
                Some(page) => page.iter(),
                None => std::mem::take(&mut self.front),
            };
        }
        self.remaining -= n + 1;
        self.back.nth_back(n)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

/// Mutable iterator returned by
/// [`PagedVec::iter_mut`](crate::PagedVec::iter_mut).
pub struct IterMut<'a, T> {
    pages: slice::IterMut<'a, Vec<T>>,
    front: slice::IterMut<'a, T>,
    back: slice::IterMut<'a, T>,
    remaining: usize,
}

impl<'a, T> IterMut<'a, T> {
    pub(crate) fn new(pages: &'a mut [Vec<T>], len: usize) -> Self {
        Self {
            pages: pages.iter_mut(),
            front: Default::default(),
            back: Default::default(),
            remaining: len,
        }
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        loop {
            if let Some(value) = self.front.next() {
                self.remaining -= 1;
                return Some(value);
            }
            match self.pages.next() {
                Some(page) => self.front = page.iter_mut(),
                None => {
                    let value = self.back.next()?;
                    self.remaining -= 1;
                    return Some(value);
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }

    fn nth(&mut self, mut n: usize) -> Option<&'a mut T> {
        if n >= self.remaining {
            self.pages = Default::default();
            self.front = Default::default();
            self.back = Default::default();
            self.remaining = 0;
            return None;
        }
        while n >= self.front.len() {
            n -= self.front.len();
            self.remaining -= self.front.len();
            self.front = match self.pages.next() {
                Some(page) => page.iter_mut(),
                None => std::mem::take(&mut self.back),
            };
        }
        self.remaining -= n + 1;
        self.front.nth(n)
    }
}

impl<'a, T> DoubleEndedIterator for IterMut<'a, T> {
    fn next_back(&mut self) -> Option<&'a mut T> {
        loop {
            if let Some(value) = self.back.next_back() {
                self.remaining -= 1;
                return Some(value);
            }
            match self.pages.next_back() {
                Some(page) => self.back = page.iter_mut(),
                None => {
                    let value = self.front.next_back()?;
                    self.remaining -= 1;
                    return Some(value);
                }
            }
        }
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

impl<T> FusedIterator for IterMut<'_, T> {}

/// Owning iterator returned by `PagedVec::into_iter`.
pub struct IntoIter<T> {
    pages: vec::IntoIter<Vec<T>>,
    front: vec::IntoIter<T>,
    back: vec::IntoIter<T>,
    remaining: usize,
}

impl<T> IntoIter<T> {
    pub(crate) fn new(pages: Vec<Vec<T>>, len: usize) -> Self {
        Self {
            pages: pages.into_iter(),
            front: Default::default(),
            back: Default::default(),
            remaining: len,
        }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        loop {
            if let Some(value) = self.front.next() {
                self.remaining -= 1;
                return Some(value);
            }
            match self.pages.next() {
                Some(page) => self.front = page.into_iter(),
                None => {
                    let value = self.back.next()?;
                    self.remaining -= 1;
                    return Some(value);
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        loop {
            if let Some(value) = self.back.next_back() {
                self.remaining -= 1;
                return Some(value);
            }
            match self.pages.next_back() {
                Some(page) => self.back = page.into_iter(),
                None => {
                    let value = self.front.next_back()?;
                    self.remaining -= 1;
                    return Some(value);
                }
            }
        }
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}
