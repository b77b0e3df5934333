//! Parallel processing by rider.
//!
//! Each rider's state is independent, so the stream is partitioned by a
//! stable hash of the rider id. Every shard runs its own [`CappingEngine`]
//! over its taps in their original relative order, and results are merged
//! back by input position. No state is shared between workers.

use crate::engine::CappingEngine;
use crate::error::{CappingError, Result};
use crate::policy::CappingPolicy;
use crate::tap::{FareRecord, Tap};
use log::debug;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::thread;

type ShardOutput = std::result::Result<Vec<(usize, FareRecord)>, (usize, CappingError)>;

/// Maps a rider to a shard. Deterministic for a given build.
pub fn shard_for(rider_id: &str, shards: NonZeroUsize) -> usize {
    let mut hasher = DefaultHasher::new();
    rider_id.hash(&mut hasher);
    (hasher.finish() % shards.get() as u64) as usize
}

/// Applies `policy` to `taps` across `shards` worker threads.
///
/// Produces exactly the records the sequential engine would. If any shard
/// fails, the error belonging to the earliest input position is returned,
/// which is the error a sequential run would have stopped at.
pub fn process_sharded(
    taps: &[Tap],
    policy: &CappingPolicy,
    shards: NonZeroUsize,
) -> Result<Vec<FareRecord>> {
    policy.validate()?;

    let mut partitions: Vec<Vec<usize>> = vec![Vec::new(); shards.get()];
    for (idx, tap) in taps.iter().enumerate() {
        partitions[shard_for(&tap.rider_id, shards)].push(idx);
    }

    debug!(
        "Sharding {} taps across {} workers",
        taps.len(),
        shards.get()
    );

    let outputs: Vec<ShardOutput> = thread::scope(|scope| {
        let handles: Vec<_> = partitions
            .iter()
            .filter(|indices| !indices.is_empty())
            .map(|indices| scope.spawn(move || run_shard(taps, indices, policy)))
            .collect();

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(output) => output,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    let mut merged: Vec<Option<FareRecord>> = vec![None; taps.len()];
    let mut first_error: Option<(usize, CappingError)> = None;

    for output in outputs {
        match output {
            Ok(records) => {
                for (idx, record) in records {
                    merged[idx] = Some(record);
                }
            }
            Err((idx, err)) => {
                if first_error.as_ref().map_or(true, |(first, _)| idx < *first) {
                    first_error = Some((idx, err));
                }
            }
        }
    }

    if let Some((_, err)) = first_error {
        return Err(err);
    }

    // Every index belongs to exactly one successful shard at this point.
    Ok(merged.into_iter().flatten().collect())
}

fn run_shard(taps: &[Tap], indices: &[usize], policy: &CappingPolicy) -> ShardOutput {
    let mut engine = CappingEngine::new(policy.clone()).map_err(|e| (0, e))?;
    let mut records = Vec::with_capacity(indices.len());

    for &idx in indices {
        let record = engine
            .process_tap(taps[idx].clone())
            .map_err(|e| (idx, e))?;
        records.push((idx, record));
    }

    Ok(records)
}
