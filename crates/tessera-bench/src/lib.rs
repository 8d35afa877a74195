//! Benchmark workloads for the Tessera storage layer.
//!
//! Provides pre-built containers for the criterion benches:
//!
//! - [`filled_factory`]: `n` live handles, no free slots
//! - [`fragmented_factory`]: `n` minted slots with every other one freed
//! - [`churned_factory`]: state after a seeded create/destroy workload
//! - [`scattered_free_list`]: free list holding seeded random indices

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use tessera_core::DefaultHandle;
use tessera_storage::{HandleFactory, SparseFreeList, StorageConfig, StorageError};
use tessera_test_utils::fixtures::{churn_ops, run_churn, scattered_indices};

/// Page size used by every workload unless stated otherwise.
pub const BENCH_PAGE_SIZE: usize = 1024;

fn config() -> StorageConfig {
    StorageConfig::new(BENCH_PAGE_SIZE)
}

/// A factory with `n` live handles at indices `0..n`.
pub fn filled_factory(n: usize) -> Result<(HandleFactory, Vec<DefaultHandle>), StorageError> {
    let mut factory: HandleFactory = HandleFactory::with_config(&config())?;
    factory.reserve(n);
    let handles = (0..n)
        .map(|_| factory.create())
        .collect::<Result<Vec<_>, _>>()?;
    Ok((factory, handles))
}

/// A factory with `n` minted slots where every even index has been freed.
///
/// Returns the surviving handles.
pub fn fragmented_factory(n: usize) -> Result<(HandleFactory, Vec<DefaultHandle>), StorageError> {
    let (mut factory, handles) = filled_factory(n)?;
    let mut survivors = Vec::with_capacity(n / 2);
    for h in handles {
        if h.index() % 2 == 0 {
            factory.destroy(h)?;
        } else {
            survivors.push(h);
        }
    }
    Ok((factory, survivors))
}

/// A factory after `ops` seeded churn steps biased 60% towards creation.
pub fn churned_factory(
    seed: u64,
    ops: usize,
) -> Result<(HandleFactory, Vec<DefaultHandle>), StorageError> {
    let mut factory: HandleFactory = HandleFactory::with_config(&config())?;
    let live = run_churn(&mut factory, &churn_ops(seed, ops, 60))?;
    Ok((factory, live))
}

/// A free list holding `count` distinct indices drawn from `0..bound`.
pub fn scattered_free_list(
    seed: u64,
    count: usize,
    bound: usize,
) -> Result<SparseFreeList, StorageError> {
    let mut list = SparseFreeList::with_config(&config())?;
    for index in scattered_indices(seed, count, bound) {
        list.push_back(index);
    }
    Ok(list)
}
