//! Test utilities and fixtures for Tessera development.
//!
//! Provides a [`RecordingObserver`] that captures factory lifecycle
//! callbacks in order, plus the seeded churn workloads in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use tessera_storage::LifecycleObserver;

/// One callback received by a [`RecordingObserver`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleEvent<H> {
    Created(H),
    Destroyed(H),
}

/// Observer that appends every callback to an event log.
///
/// Pass it to [`HandleFactory::with_observer`](tessera_storage::HandleFactory::with_observer)
/// and inspect [`events`](RecordingObserver::events) afterwards.
#[derive(Clone, Debug)]
pub struct RecordingObserver<H> {
    events: Vec<LifecycleEvent<H>>,
}

impl<H: Copy> RecordingObserver<H> {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Every event received, oldest first.
    pub fn events(&self) -> &[LifecycleEvent<H>] {
        &self.events
    }

    /// Handles passed to `on_create`, in order.
    pub fn created(&self) -> Vec<H> {
        self.events
            .iter()
            .filter_map(|e| match e {
                LifecycleEvent::Created(h) => Some(*h),
                LifecycleEvent::Destroyed(_) => None,
            })
            .collect()
    }

    /// Handles passed to `on_destroy`, in order.
    pub fn destroyed(&self) -> Vec<H> {
        self.events
            .iter()
            .filter_map(|e| match e {
                LifecycleEvent::Destroyed(h) => Some(*h),
                LifecycleEvent::Created(_) => None,
            })
            .collect()
    }

    /// Drop recorded events.
    pub fn reset(&mut self) {
        self.events.clear();
    }
}

impl<H: Copy> Default for RecordingObserver<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> LifecycleObserver<H> for RecordingObserver<H> {
    fn on_create(&mut self, handle: H) {
        self.events.push(LifecycleEvent::Created(handle));
    }

    fn on_destroy(&mut self, handle: H) {
        self.events.push(LifecycleEvent::Destroyed(handle));
    }
}
