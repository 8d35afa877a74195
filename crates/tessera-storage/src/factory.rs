//! Generational handle allocation.
//!
//! [`HandleFactory`] composes a [`PagedVec`] holding the current handle of
//! every slot ever minted with a [`SparseFreeList`] of reclaimed slots.
//! Every index below `capacity()` is either live (its stored handle is the
//! only one `alive` accepts) or free (listed in the free list).
//!
//! Recycling bumps the stored version when the slot is handed out again,
//! not when it is freed, so a freed slot keeps its last version until
//! reuse and the next handle for it always differs from every earlier one
//! until the version field wraps.

use tessera_core::{DefaultHandle, GenerationalHandle};

use crate::config::StorageConfig;
use crate::error::StorageError;
use crate::free_list::SparseFreeList;
use crate::paged::PagedVec;

/// Receives a callback for every handle a [`HandleFactory`] creates or
/// destroys.
///
/// Both methods default to doing nothing. `()` is the no-op observer.
pub trait LifecycleObserver<H> {
    /// Called after `handle` has been handed out.
    fn on_create(&mut self, handle: H) {
        let _ = handle;
    }

    /// Called when `handle` is destroyed, including by
    /// [`HandleFactory::clear`].
    fn on_destroy(&mut self, handle: H) {
        let _ = handle;
    }
}

impl<H> LifecycleObserver<H> for () {}

/// Hands out generational handles and answers liveness queries.
///
/// Not internally synchronised; wrap it in a lock to share it.
pub struct HandleFactory<H = DefaultHandle, O = ()> {
    /// Current handle for every slot ever minted.
    slots: PagedVec<H>,
    /// Slots available for reuse.
    free: SparseFreeList,
    observer: O,
}

impl<H: GenerationalHandle> HandleFactory<H, ()> {
    /// Create an empty factory with the default page size.
    pub fn new() -> Self {
        Self {
            slots: PagedVec::new(),
            free: SparseFreeList::new(),
            observer: (),
        }
    }

    /// Create an empty factory from a config.
    pub fn with_config(config: &StorageConfig) -> Result<Self, StorageError> {
        Self::with_observer(config, ())
    }
}

impl<H: GenerationalHandle> Default for HandleFactory<H, ()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: GenerationalHandle, O: LifecycleObserver<H>> HandleFactory<H, O> {
    /// Create an empty factory that reports to `observer`.
    pub fn with_observer(config: &StorageConfig, observer: O) -> Result<Self, StorageError> {
        Ok(Self {
            slots: PagedVec::with_config(config)?,
            free: SparseFreeList::with_config(config)?,
            observer,
        })
    }

    /// Hand out a handle.
    ///
    /// Reuses a freed slot when one exists, bumping its version. Otherwise
    /// mints the next index at version 0, failing with
    /// [`StorageError::IndexSpaceExhausted`] once the value field is full.
    pub fn create(&mut self) -> Result<H, StorageError> {
        let handle = if self.free.is_empty() {
            let index = self.slots.len();
            if index > H::MAX_INDEX {
                return Err(StorageError::IndexSpaceExhausted { max: H::MAX_INDEX });
            }
            *self.slots.push(H::from_parts(index, 0))
        } else {
            let index = self.free.pop_back()?;
            let slot = &mut self.slots[index];
            *slot = slot.next_version();
            *slot
        };
        self.observer.on_create(handle);
        Ok(handle)
    }

    /// Return `handle`'s slot to the free list.
    ///
    /// Fails with [`StorageError::NotAlive`] for stale, already destroyed
    /// or never-issued handles, leaving the factory unchanged.
    pub fn destroy(&mut self, handle: H) -> Result<(), StorageError> {
        if !self.alive(handle) {
            log::warn!("rejected destroy of {handle}: not alive");
            return Err(StorageError::NotAlive {
                index: handle.index(),
                version: handle.version(),
            });
        }
        self.free.push_back(handle.index());
        self.observer.on_destroy(handle);
        Ok(())
    }

    /// Whether `handle` names a live slot at its current version.
    pub fn alive(&self, handle: H) -> bool {
        let index = handle.index();
        match self.slots.get(index) {
            Some(stored) => stored.version() == handle.version() && !self.free.contains(index),
            None => false,
        }
    }

    /// The live handle occupying `index`, if any.
    pub fn current(&self, index: usize) -> Option<H> {
        if self.free.contains(index) {
            return None;
        }
        self.slots.get(index).copied()
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Whether no handle is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots ever minted (live + free).
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of freed slots waiting for reuse.
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Pre-allocate pages for `n` slots.
    pub fn reserve(&mut self, n: usize) {
        self.slots.reserve(n);
    }

    /// Live handles in ascending index order.
    pub fn iter_alive(&self) -> impl Iterator<Item = H> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(move |(index, _)| !self.free.contains(*index))
            .map(|(_, &handle)| handle)
    }

    /// Destroy every live handle in ascending index order, then forget
    /// all slots and versions.
    ///
    /// After a clear, indices are minted from 0 at version 0 again.
    pub fn clear(&mut self) {
        log::debug!(
            "clearing factory: {} live of {} slots",
            self.len(),
            self.slots.len()
        );
        for (index, &handle) in self.slots.iter().enumerate() {
            if !self.free.contains(index) {
                self.observer.on_destroy(handle);
            }
        }
        self.slots.clear();
        self.free.clear();
    }

    /// The observer.
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Mutable access to the observer.
    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Consume the factory, returning the observer.
    pub fn into_observer(self) -> O {
        self.observer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::Handle;

    type H4 = Handle<u32, 4>;

    fn factory(page_size: usize) -> HandleFactory<H4> {
        HandleFactory::with_config(&StorageConfig::new(page_size)).unwrap()
    }

    #[derive(Default)]
    struct Log {
        created: Vec<H4>,
        destroyed: Vec<H4>,
    }

    impl LifecycleObserver<H4> for Log {
        fn on_create(&mut self, handle: H4) {
            self.created.push(handle);
        }

        fn on_destroy(&mut self, handle: H4) {
            self.destroyed.push(handle);
        }
    }

    #[test]
    fn fresh_handles_are_sequential_at_version_zero() {
        let mut f = factory(4);
        let handles: Vec<H4> = (0..4).map(|_| f.create().unwrap()).collect();
        for (i, h) in handles.iter().enumerate() {
            assert_eq!(h.index(), i);
            assert_eq!(h.version(), 0);
            assert!(f.alive(*h));
        }
        assert_eq!(f.len(), 4);
    }

    #[test]
    fn recycled_slot_gets_next_version() {
        let mut f = factory(4);
        let handles: Vec<H4> = (0..4).map(|_| f.create().unwrap()).collect();
        f.destroy(handles[1]).unwrap();
        let reused = f.create().unwrap();
        assert_eq!(reused.index(), 1);
        assert_eq!(reused.version(), 1);
        assert!(!f.alive(H4::new(1, 0)));
        assert!(f.alive(H4::new(1, 1)));
    }

    #[test]
    fn destroyed_handle_is_not_alive_before_reuse() {
        let mut f = factory(4);
        let h = f.create().unwrap();
        f.destroy(h).unwrap();
        assert!(!f.alive(h));
        assert_eq!(f.current(h.index()), None);
        assert_eq!(f.len(), 0);
        assert_eq!(f.capacity(), 1);
        assert_eq!(f.free_count(), 1);
    }

    #[test]
    fn double_destroy_is_rejected_without_corruption() {
        let mut f = factory(4);
        let a = f.create().unwrap();
        let b = f.create().unwrap();
        f.destroy(a).unwrap();
        assert_eq!(
            f.destroy(a),
            Err(StorageError::NotAlive {
                index: 0,
                version: 0
            })
        );
        assert_eq!(f.free_count(), 1);
        let c = f.create().unwrap();
        assert_eq!(c, H4::new(0, 1));
        let d = f.create().unwrap();
        assert_eq!(d.index(), 2);
        assert!(f.alive(b));
    }

    #[test]
    fn never_issued_and_tombstone_handles_are_not_alive() {
        let mut f = factory(4);
        f.create().unwrap();
        assert!(!f.alive(H4::new(7, 0)));
        assert!(!f.alive(H4::tombstone()));
        assert!(f.destroy(H4::tombstone()).is_err());
    }

    #[test]
    fn index_space_exhaustion() {
        type Tiny = Handle<u16, 12>;
        let mut f: HandleFactory<Tiny> = HandleFactory::with_config(&StorageConfig::new(4)).unwrap();
        for i in 0..=Tiny::MAX_INDEX {
            assert_eq!(f.create().unwrap().index(), i);
        }
        assert_eq!(
            f.create(),
            Err(StorageError::IndexSpaceExhausted {
                max: Tiny::MAX_INDEX
            })
        );
        let last = f.current(3).unwrap();
        f.destroy(last).unwrap();
        assert_eq!(f.create().unwrap(), last.increment_version());
    }

    #[test]
    fn version_wraps_after_field_overflow() {
        let mut f = factory(4);
        let mut h = f.create().unwrap();
        for _ in 0..=H4::MAX_VERSION {
            f.destroy(h).unwrap();
            h = f.create().unwrap();
        }
        assert_eq!(h, H4::new(0, 0));
    }

    #[test]
    fn unversioned_handles_still_track_liveness() {
        type Flat = Handle<u32, 0>;
        let mut f: HandleFactory<Flat> = HandleFactory::new();
        let h = f.create().unwrap();
        f.destroy(h).unwrap();
        assert!(!f.alive(h));
        let again = f.create().unwrap();
        assert_eq!(again, h);
        assert!(f.alive(h));
    }

    #[test]
    fn observer_sees_create_and_destroy() {
        let mut f = HandleFactory::with_observer(&StorageConfig::new(4), Log::default()).unwrap();
        let a = f.create().unwrap();
        let b = f.create().unwrap();
        f.destroy(a).unwrap();
        let _ = f.destroy(a);
        assert_eq!(f.observer().created, [a, b]);
        assert_eq!(f.observer().destroyed, [a]);
    }

    #[test]
    fn clear_reports_live_handles_in_ascending_order() {
        let mut f = HandleFactory::with_observer(&StorageConfig::new(4), Log::default()).unwrap();
        let handles: Vec<H4> = (0..6).map(|_| f.create().unwrap()).collect();
        f.destroy(handles[4]).unwrap();
        f.destroy(handles[1]).unwrap();
        f.observer_mut().destroyed.clear();

        f.clear();
        let expected: Vec<H4> = [0, 2, 3, 5].iter().map(|&i| handles[i]).collect();
        assert_eq!(f.observer().destroyed, expected);
        assert!(f.is_empty());
        assert_eq!(f.capacity(), 0);
        assert_eq!(f.free_count(), 0);
        assert_eq!(f.create().unwrap(), H4::new(0, 0));
    }

    #[test]
    fn iter_alive_is_ascending() {
        let mut f = factory(2);
        let handles: Vec<H4> = (0..5).map(|_| f.create().unwrap()).collect();
        f.destroy(handles[0]).unwrap();
        f.destroy(handles[3]).unwrap();
        let alive: Vec<usize> = f.iter_alive().map(|h| h.index()).collect();
        assert_eq!(alive, [1, 2, 4]);
    }

    #[test]
    fn freed_page_is_reused_before_growing() {
        let mut f = factory(4);
        let handles: Vec<H4> = (0..8).map(|_| f.create().unwrap()).collect();
        for h in &handles[..4] {
            f.destroy(*h).unwrap();
        }
        for _ in 0..4 {
            assert!(f.create().unwrap().index() < 4);
        }
        assert_eq!(f.capacity(), 8);
        assert_eq!(f.create().unwrap().index(), 8);
    }

    #[test]
    fn invalid_config_rejected() {
        let result = HandleFactory::<H4>::with_config(&StorageConfig::new(5));
        assert!(matches!(result, Err(StorageError::InvalidConfig { .. })));
    }

    #[test]
    fn into_observer_returns_log() {
        let mut f = HandleFactory::with_observer(&StorageConfig::default(), Log::default()).unwrap();
        f.create().unwrap();
        assert_eq!(f.into_observer().created.len(), 1);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn stale_handles_stay_dead(ops in proptest::collection::vec(any::<bool>(), 1..300)) {
                let mut f = factory(8);
                let mut live: Vec<H4> = Vec::new();
                let mut dead: Vec<H4> = Vec::new();
                for create in ops {
                    if create || live.is_empty() {
                        let h = f.create().unwrap();
                        dead.retain(|d| *d != h);
                        live.push(h);
                    } else {
                        let h = live.swap_remove(live.len() / 2);
                        f.destroy(h).unwrap();
                        dead.push(h);
                    }
                    prop_assert_eq!(f.len(), live.len());
                }
                for h in &live {
                    prop_assert!(f.alive(*h));
                }
                for h in &dead {
                    prop_assert!(!f.alive(*h));
                }
            }
        }
    }
}
