//! Page-grouped free list over an unbounded index space.
//!
//! [`SparseFreeList`] records which indices have been reclaimed. Indices
//! are grouped by page (same page size as the [`PagedVec`] they index
//! into) and each page keeps an intrusive singly linked chain of its free
//! slots. Pages that currently hold at least one free slot form a doubly
//! linked list ordered by most recent touch, so popping reuses the page
//! that was freed into last.
//!
//! ```text
//! head ─▶ page 7 ◀─▶ page 2 ◀─▶ page 0
//!          │          │          │
//!          ▼          ▼          ▼
//!         5 → 1 → ∎  0 → ∎      3 → 2 → 9 → ∎
//! ```
//!
//! A page's link array is allocated when its first slot is freed and
//! released when its last free slot is popped.
//!
//! [`PagedVec`]: crate::PagedVec

use std::fmt;
use std::iter::FusedIterator;

use crate::config::StorageConfig;
use crate::error::StorageError;

/// Slot is not in its page's chain.
const NULL: u32 = u32::MAX;
/// Slot is the last link of its page's chain; also the empty chain head.
const END: u32 = u32::MAX - 1;

#[derive(Clone, Debug)]
struct FreePage {
    /// `links[o]` is the next free offset after `o`, `END`, or `NULL`.
    /// `None` iff `count == 0`.
    links: Option<Box<[u32]>>,
    /// First free offset, or `END`.
    head: u32,
    /// Number of free slots in the chain.
    count: usize,
    prev: Option<usize>,
    next: Option<usize>,
}

impl FreePage {
    fn empty() -> Self {
        Self {
            links: None,
            head: END,
            count: 0,
            prev: None,
            next: None,
        }
    }
}

/// A set of free indices grouped by page for local reuse.
///
/// `push_back`, `pop_back`, `back` and `contains` are O(1) apart from the
/// first touch of a page beyond the current directory, which grows the
/// directory to cover it.
#[derive(Clone)]
pub struct SparseFreeList {
    pages: Vec<FreePage>,
    /// Most recently touched page with a free slot.
    head: Option<usize>,
    /// Total number of free indices.
    len: usize,
    page_shift: u32,
}

impl SparseFreeList {
    /// Create an empty free list with the default page size.
    pub fn new() -> Self {
        Self::from_valid(&StorageConfig::default())
    }

    /// Create an empty free list with `page_size` indices per page.
    pub fn with_page_size(page_size: usize) -> Result<Self, StorageError> {
        Self::with_config(&StorageConfig::new(page_size))
    }

    /// Create an empty free list from a config.
    ///
    /// `initial_pages` pre-sizes the page directory; link arrays are
    /// still allocated on demand.
    pub fn with_config(config: &StorageConfig) -> Result<Self, StorageError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: &StorageConfig) -> Self {
        let mut pages = Vec::with_capacity(config.initial_pages);
        pages.resize_with(config.initial_pages, FreePage::empty);
        Self {
            pages,
            head: None,
            len: 0,
            page_shift: config.page_shift(),
        }
    }

    /// Indices per page.
    #[inline]
    pub fn page_size(&self) -> usize {
        1 << self.page_shift
    }

    /// Number of free indices.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no index is free.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Number of entries in the page directory.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    #[inline]
    fn split(&self, index: usize) -> (usize, usize) {
        (index >> self.page_shift, index & (self.page_size() - 1))
    }

    /// Whether `index` is currently free.
    pub fn contains(&self, index: usize) -> bool {
        let (page, offset) = self.split(index);
        self.pages
            .get(page)
            .and_then(|p| p.links.as_deref())
            .is_some_and(|links| links[offset] != NULL)
    }

    /// Mark `index` as free.
    ///
    /// The owning page becomes the head of the page list. Returns `false`
    /// and leaves the list unchanged if `index` was already free.
    pub fn push_back(&mut self, index: usize) -> bool {
        let (page, offset) = self.split(index);
        self.ensure_page(page);
        let page_size = self.page_size();
        let entry = &mut self.pages[page];
        let links = entry.links.get_or_insert_with(|| new_links(page, page_size));
        if links[offset] != NULL {
            log::trace!("index {index} is already free");
            return false;
        }
        links[offset] = entry.head;
        entry.head = offset as u32;
        entry.count += 1;
        self.len += 1;
        self.touch(page);
        true
    }

    /// Mark every index in `begin..begin + n` as free.
    ///
    /// Each spanned page has its link array allocated and is moved to the
    /// list head at most once; within a page the new slots are chained in
    /// ascending order. Indices that were already free are skipped.
    /// Returns the number of newly freed indices.
    ///
    /// # Panics
    ///
    /// Panics if `begin + n` overflows `usize`.
    pub fn push_n(&mut self, begin: usize, n: usize) -> usize {
        let Some(end) = begin.checked_add(n) else {
            panic!("push_n range {begin}+{n} overflows usize");
        };
        let page_size = self.page_size();
        let mut freed = 0;
        let mut cursor = begin;
        while cursor < end {
            let (page, first) = self.split(cursor);
            let page_start = page << self.page_shift;
            let stop = (end - page_start).min(page_size);
            self.ensure_page(page);

            let entry = &mut self.pages[page];
            let links = entry.links.get_or_insert_with(|| new_links(page, page_size));
            let mut added = 0;
            for offset in (first..stop).rev() {
                if links[offset] == NULL {
                    links[offset] = entry.head;
                    entry.head = offset as u32;
                    added += 1;
                }
            }
            entry.count += added;
            if added > 0 {
                self.touch(page);
            }
            freed += added;
            cursor = page_start.saturating_add(page_size);
        }
        self.len += freed;
        freed
    }

    /// The index [`pop_back`](Self::pop_back) would return.
    pub fn back(&self) -> Result<usize, StorageError> {
        let page = self.head.ok_or(StorageError::EmptyFreeList)?;
        let offset = self.pages[page].head;
        debug_assert_ne!(offset, END, "linked page with an empty chain");
        Ok((page << self.page_shift) | offset as usize)
    }

    /// Remove and return a free index, preferring the most recently
    /// touched page.
    ///
    /// Takes the head of that page's chain. If the chain becomes empty
    /// the page is unlinked and its link array released.
    pub fn pop_back(&mut self) -> Result<usize, StorageError> {
        let page = self.head.ok_or(StorageError::EmptyFreeList)?;
        let entry = &mut self.pages[page];
        let offset = entry.head;
        let Some(links) = entry.links.as_deref_mut() else {
            unreachable!("linked page {page} has no link array");
        };
        entry.head = links[offset as usize];
        links[offset as usize] = NULL;
        entry.count -= 1;
        self.len -= 1;
        if entry.count == 0 {
            debug_assert_eq!(entry.head, END);
            entry.links = None;
            self.unlink(page);
        }
        Ok((page << self.page_shift) | offset as usize)
    }

    /// Drop every page and forget all free indices.
    pub fn clear(&mut self) {
        if !self.pages.is_empty() {
            log::debug!(
                "clearing free list ({} free across {} pages)",
                self.len,
                self.pages.len()
            );
        }
        self.pages.clear();
        self.head = None;
        self.len = 0;
    }

    /// Iterate every free index: pages in list order, each page's chain
    /// from its head. The order is not sorted.
    pub fn iter(&self) -> Iter<'_> {
        let slot = self.head.map_or(END, |page| self.pages[page].head);
        Iter {
            list: self,
            page: self.head,
            slot,
            remaining: self.len,
        }
    }

    /// Pages that currently hold free slots, most recently touched first.
    pub fn pages_with_free_slots(&self) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.head, move |&page| self.pages[page].next)
    }

    fn ensure_page(&mut self, page: usize) {
        if page >= self.pages.len() {
            self.pages.resize_with(page + 1, FreePage::empty);
        }
    }

    /// Move `page` to the head of the list, linking it if needed.
    fn touch(&mut self, page: usize) {
        if self.head == Some(page) {
            return;
        }
        let linked = self.pages[page].prev.is_some();
        if linked {
            self.unlink(page);
        }
        self.link_front(page);
    }

    fn link_front(&mut self, page: usize) {
        let old = self.head;
        let entry = &mut self.pages[page];
        entry.prev = None;
        entry.next = old;
        if let Some(old) = old {
            self.pages[old].prev = Some(page);
        }
        self.head = Some(page);
    }

    fn unlink(&mut self, page: usize) {
        let entry = &mut self.pages[page];
        let (prev, next) = (entry.prev.take(), entry.next.take());
        match prev {
            Some(prev) => self.pages[prev].next = next,
            None => self.head = next,
        }
        if let Some(next) = next {
            self.pages[next].prev = prev;
        }
    }
}

fn new_links(page: usize, page_size: usize) -> Box<[u32]> {
    log::trace!("allocating free-list page {page} ({page_size} slots)");
    vec![NULL; page_size].into_boxed_slice()
}

impl Default for SparseFreeList {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SparseFreeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseFreeList")
            .field("len", &self.len)
            .field("page_size", &self.page_size())
            .field("pages", &self.pages.len())
            .field("free", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}

impl<'a> IntoIterator for &'a SparseFreeList {
    type Item = usize;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

/// Iterator over the free indices of a [`SparseFreeList`].
///
/// Single pass and forward only; exhausted once the last linked page's
/// chain has been walked.
#[derive(Clone)]
pub struct Iter<'a> {
    list: &'a SparseFreeList,
    page: Option<usize>,
    /// Offset about to be yielded within `page`.
    slot: u32,
    remaining: usize,
}

impl Iterator for Iter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let page = self.page?;
        let entry = &self.list.pages[page];
        let links = entry.links.as_deref()?;
        let offset = self.slot;
        let next = links[offset as usize];
        if next == END {
            self.page = entry.next;
            self.slot = entry.next.map_or(END, |p| self.list.pages[p].head);
        } else {
            self.slot = next;
        }
        self.remaining -= 1;
        Some((page << self.list.page_shift) | offset as usize)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(page_size: usize) -> SparseFreeList {
        SparseFreeList::with_page_size(page_size).unwrap()
    }

    fn sorted(list: &SparseFreeList) -> Vec<usize> {
        let mut all: Vec<usize> = list.iter().collect();
        all.sort_unstable();
        all
    }

    #[test]
    fn starts_empty() {
        let mut l = list(4);
        assert!(l.is_empty());
        assert_eq!(l.len(), 0);
        assert!(!l.contains(0));
        assert_eq!(l.back(), Err(StorageError::EmptyFreeList));
        assert_eq!(l.pop_back(), Err(StorageError::EmptyFreeList));
    }

    #[test]
    fn push_then_pop_is_lifo_within_page() {
        let mut l = list(4);
        assert!(l.push_back(1));
        assert!(l.push_back(3));
        assert_eq!(l.back(), Ok(3));
        assert_eq!(l.pop_back(), Ok(3));
        assert_eq!(l.pop_back(), Ok(1));
        assert!(l.is_empty());
    }

    #[test]
    fn contains_tracks_membership() {
        let mut l = list(4);
        l.push_back(6);
        assert!(l.contains(6));
        assert!(!l.contains(5));
        assert!(!l.contains(1000));
        l.pop_back().unwrap();
        assert!(!l.contains(6));
    }

    #[test]
    fn double_push_is_a_no_op() {
        let mut l = list(4);
        assert!(l.push_back(2));
        assert!(l.push_back(1));
        assert!(!l.push_back(2));
        assert_eq!(l.len(), 2);
        assert_eq!(sorted(&l), [1, 2]);
    }

    #[test]
    fn most_recently_touched_page_pops_first() {
        let mut l = list(4);
        l.push_back(1); // page 0
        l.push_back(9); // page 2
        l.push_back(2); // page 0 again
        assert_eq!(l.pages_with_free_slots().collect::<Vec<_>>(), [0, 2]);
        assert_eq!(l.pop_back(), Ok(2));
        assert_eq!(l.pop_back(), Ok(1));
        assert_eq!(l.pop_back(), Ok(9));
    }

    #[test]
    fn emptied_page_is_unlinked_and_released() {
        let mut l = list(4);
        l.push_back(0);
        l.push_back(5);
        assert_eq!(l.pop_back(), Ok(5));
        assert_eq!(l.pages_with_free_slots().collect::<Vec<_>>(), [0]);
        assert!(l.pages[1].links.is_none());
        assert_eq!(l.page_count(), 2);
    }

    #[test]
    fn unlink_from_middle_of_list() {
        let mut l = list(4);
        l.push_back(0); // page 0
        l.push_back(4); // page 1
        l.push_back(8); // page 2
        // Touch page 1 so it moves to the head, then drain it.
        l.push_back(5);
        assert_eq!(l.pages_with_free_slots().collect::<Vec<_>>(), [1, 2, 0]);
        assert_eq!(l.pop_back(), Ok(5));
        assert_eq!(l.pop_back(), Ok(4));
        assert_eq!(l.pages_with_free_slots().collect::<Vec<_>>(), [2, 0]);
        assert_eq!(l.pop_back(), Ok(8));
        assert_eq!(l.pop_back(), Ok(0));
        assert!(l.is_empty());
    }

    #[test]
    fn push_n_spans_pages() {
        let mut l = list(4);
        assert_eq!(l.push_n(2, 5), 5);
        assert_eq!(sorted(&l), [2, 3, 4, 5, 6]);
        assert!(l.contains(3));
        assert!(l.contains(5));
        assert!(!l.contains(1));
        assert!(!l.contains(7));
        assert_eq!(l.pages_with_free_slots().collect::<Vec<_>>(), [1, 0]);
    }

    #[test]
    fn push_n_chains_ascending_within_page() {
        let mut l = list(8);
        l.push_n(1, 3);
        assert_eq!(l.iter().collect::<Vec<_>>(), [1, 2, 3]);
        assert_eq!(l.pop_back(), Ok(1));
    }

    #[test]
    fn push_n_skips_already_free() {
        let mut l = list(4);
        l.push_back(3);
        assert_eq!(l.push_n(0, 6), 5);
        assert_eq!(l.len(), 6);
        assert_eq!(sorted(&l), [0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn push_n_zero_is_a_no_op() {
        let mut l = list(4);
        assert_eq!(l.push_n(10, 0), 0);
        assert!(l.is_empty());
        assert_eq!(l.page_count(), 0);
    }

    #[test]
    fn push_n_whole_pages() {
        let mut l = list(4);
        assert_eq!(l.push_n(4, 8), 8);
        assert_eq!(l.pages_with_free_slots().count(), 2);
        for _ in 0..8 {
            l.pop_back().unwrap();
        }
        assert!(l.is_empty());
        assert!(l.pages.iter().all(|p| p.links.is_none()));
    }

    #[test]
    fn clear_forgets_everything() {
        let mut l = list(4);
        l.push_n(0, 10);
        l.clear();
        assert!(l.is_empty());
        assert_eq!(l.page_count(), 0);
        assert!(!l.contains(3));
        assert!(l.push_back(3));
    }

    #[test]
    fn iter_is_exact_size() {
        let mut l = list(4);
        l.push_n(3, 6);
        let it = l.iter();
        assert_eq!(it.len(), 6);
        assert_eq!(it.count(), 6);
    }

    #[test]
    fn initial_pages_presize_directory() {
        let config = StorageConfig::new(16).with_initial_pages(3);
        let l = SparseFreeList::with_config(&config).unwrap();
        assert_eq!(l.page_count(), 3);
        assert!(l.is_empty());
    }

    #[test]
    fn page_size_one() {
        let mut l = list(1);
        l.push_n(0, 3);
        assert_eq!(l.pages_with_free_slots().count(), 3);
        assert_eq!(l.pop_back(), Ok(2));
        assert_eq!(l.pop_back(), Ok(1));
        assert_eq!(l.pop_back(), Ok(0));
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::BTreeSet;

        #[derive(Clone, Debug)]
        enum Op {
            Push(usize),
            PushN(usize, usize),
            Pop,
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0usize..64).prop_map(Op::Push),
                (0usize..64, 0usize..12).prop_map(|(b, n)| Op::PushN(b, n)),
                Just(Op::Pop),
            ]
        }

        proptest! {
            #[test]
            fn matches_set_model(ops in proptest::collection::vec(op(), 1..200)) {
                let mut l = SparseFreeList::with_page_size(8).unwrap();
                let mut model = BTreeSet::new();
                for op in ops {
                    match op {
                        Op::Push(i) => {
                            prop_assert_eq!(l.push_back(i), model.insert(i));
                        }
                        Op::PushN(b, n) => {
                            let fresh = (b..b + n).filter(|i| model.insert(*i)).count();
                            prop_assert_eq!(l.push_n(b, n), fresh);
                        }
                        Op::Pop => match l.pop_back() {
                            Ok(i) => prop_assert!(model.remove(&i)),
                            Err(_) => prop_assert!(model.is_empty()),
                        },
                    }
                    prop_assert_eq!(l.len(), model.len());
                    prop_assert_eq!(l.is_empty(), model.is_empty());
                }
                let mut listed: Vec<usize> = l.iter().collect();
                listed.sort_unstable();
                prop_assert_eq!(listed, model.iter().copied().collect::<Vec<_>>());
                for i in 0..80 {
                    prop_assert_eq!(l.contains(i), model.contains(&i));
                }
            }

            #[test]
            fn iteration_yields_each_index_once(
                indices in proptest::collection::vec(0usize..256, 0..100),
            ) {
                let mut l = SparseFreeList::with_page_size(16).unwrap();
                for &i in &indices {
                    l.push_back(i);
                    l.push_back(i);
                }
                let listed: Vec<usize> = l.iter().collect();
                let unique: BTreeSet<usize> = listed.iter().copied().collect();
                prop_assert_eq!(listed.len(), unique.len());
                prop_assert_eq!(unique, indices.into_iter().collect::<BTreeSet<_>>());
            }

            #[test]
            fn back_predicts_pop(indices in proptest::collection::vec(0usize..128, 1..50)) {
                let mut l = SparseFreeList::with_page_size(4).unwrap();
                for &i in &indices {
                    l.push_back(i);
                }
                while let Ok(peek) = l.back() {
                    prop_assert_eq!(l.pop_back(), Ok(peek));
                }
                prop_assert!(l.pages_with_free_slots().next().is_none());
            }
        }
    }
}
