//! Deterministic workloads for storage tests and benchmarks.
//!
//! - [`churn_ops`]: seeded create/destroy sequence.
//! - [`run_churn`]: applies a sequence to a factory, tracking the live set.
//! - [`sequential`]: a `PagedVec<u32>` holding `0..n`.
//! - [`scattered_indices`]: seeded sample of distinct indices.

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tessera_core::GenerationalHandle;
use tessera_storage::{HandleFactory, LifecycleObserver, PagedVec, StorageError};

/// One step of a churn workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChurnOp {
    /// Create a handle.
    Create,
    /// Destroy the live handle at this position in the live list, modulo
    /// its length. Ignored while nothing is live.
    Destroy(usize),
}

/// Generate `count` churn ops from `seed`.
///
/// `create_percent` (0..=100) is the chance of each op being a create.
pub fn churn_ops(seed: u64, count: usize, create_percent: u32) -> Vec<ChurnOp> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            if rng.next_u32() % 100 < create_percent {
                ChurnOp::Create
            } else {
                ChurnOp::Destroy(rng.next_u32() as usize)
            }
        })
        .collect()
}

/// Apply `ops` to `factory`, returning the handles still live in creation
/// order (with swap-removal on destroy).
pub fn run_churn<H, O>(
    factory: &mut HandleFactory<H, O>,
    ops: &[ChurnOp],
) -> Result<Vec<H>, StorageError>
where
    H: GenerationalHandle,
    O: LifecycleObserver<H>,
{
    let mut live = Vec::new();
    for op in ops {
        match *op {
            ChurnOp::Create => live.push(factory.create()?),
            ChurnOp::Destroy(pick) => {
                if live.is_empty() {
                    continue;
                }
                let handle = live.swap_remove(pick % live.len());
                factory.destroy(handle)?;
            }
        }
    }
    Ok(live)
}

/// A `PagedVec` holding `0..n` with the given page size.
pub fn sequential(n: u32, page_size: usize) -> Result<PagedVec<u32>, StorageError> {
    let mut vec = PagedVec::with_page_size(page_size)?;
    vec.extend(0..n);
    Ok(vec)
}

/// `count` distinct indices below `bound`, in seeded random order.
///
/// Returns fewer than `count` when `bound < count`.
pub fn scattered_indices(seed: u64, count: usize, bound: usize) -> Vec<usize> {
    let mut all: Vec<usize> = (0..bound).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    // Partial Fisher-Yates.
    let take = count.min(bound);
    for i in 0..take {
        let j = i + (rng.next_u64() as usize) % (bound - i);
        all.swap(i, j);
    }
    all.truncate(take);
    all
}
