use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use crate::roi::engine::{compute_roi, RoiResult};
use crate::roi::inputs::{LocalMarketReference, RoiInput};
use crate::types::ComputationOutput;
use crate::RealtyResult;

/// Default number of results kept by [`RoiCache::default`].
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Caller-owned memoisation of `compute_roi` results.
///
/// Keyed by the canonical JSON of `(input, refs)`. Holds at most `capacity`
/// entries and evicts the oldest insertion first. Safe to share across
/// threads behind an `Arc`.
#[derive(Debug)]
pub struct RoiCache {
    capacity: usize,
    state: Mutex<CacheState>,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, ComputationOutput<RoiResult>>,
    order: VecDeque<String>,
}

impl Default for RoiCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl RoiCache {
    /// A capacity of 0 disables storage: every call recomputes.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Return the cached result for `(input, refs)` or compute and store it.
    ///
    /// Errors are never cached.
    pub fn get_or_compute(
        &self,
        input: &RoiInput,
        refs: &LocalMarketReference,
    ) -> RealtyResult<ComputationOutput<RoiResult>> {
        let key = fingerprint(input, refs)?;

        if let Some(hit) = self.lock().entries.get(&key) {
            tracing::debug!("roi cache hit");
            return Ok(hit.clone());
        }

        // Computed outside the lock so concurrent misses do not serialise.
        let output = compute_roi(input, refs)?;
        if self.capacity == 0 {
            return Ok(output);
        }

        let mut state = self.lock();
        if !state.entries.contains_key(&key) {
            while state.order.len() >= self.capacity {
                match state.order.pop_front() {
                    Some(oldest) => {
                        state.entries.remove(&oldest);
                    }
                    None => break,
                }
            }
            state.order.push_back(key.clone());
            state.entries.insert(key, output.clone());
        }
        Ok(output)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.order.clear();
    }

    // A panic while holding the lock cannot leave the map half-updated, so a
    // poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn fingerprint(input: &RoiInput, refs: &LocalMarketReference) -> RealtyResult<String> {
    Ok(serde_json::to_string(&(input, refs))?)
}
