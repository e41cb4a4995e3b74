//! Host allocation hooks.
//!
//! The heap asks its [`MemoryHooks`] before every allocation and reports
//! every release, so a host can account for, cap and schedule memory use.

use std::cell::Cell;

use crate::HeapStats;

/// Allocation policy supplied by the embedding host.
pub trait MemoryHooks {
    /// Admit an allocation of `bytes`. Returning `false` refuses it.
    fn allocate(&self, bytes: usize) -> bool;

    /// Record that `bytes` previously admitted were released.
    fn free(&self, bytes: usize);

    /// Whether the heap should be collected at the next safe point.
    fn should_collect(&self, stats: &HeapStats) -> bool;
}

/// Default collection trigger: 4MB allocated since the last collection.
pub const DEFAULT_COLLECT_THRESHOLD: usize = 4 * 1024 * 1024;

/// Accounting hooks with an optional hard limit.
///
/// # Examples
///
/// ```
/// use memory_manager::{DefaultMemoryHooks, MemoryHooks};
///
/// let hooks = DefaultMemoryHooks::with_limit(100);
/// assert!(hooks.allocate(60));
/// assert!(!hooks.allocate(60));
/// hooks.free(60);
/// assert!(hooks.allocate(60));
/// ```
#[derive(Debug)]
pub struct DefaultMemoryHooks {
    limit: Option<usize>,
    collect_threshold: usize,
    in_use: Cell<usize>,
}

impl DefaultMemoryHooks {
    /// Unlimited hooks with the default collection threshold.
    pub fn new() -> Self {
        Self {
            limit: None,
            collect_threshold: DEFAULT_COLLECT_THRESHOLD,
            in_use: Cell::new(0),
        }
    }

    /// Hooks refusing allocations once `limit` bytes are in use.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::new()
        }
    }

    /// Change the number of bytes allocated between collections.
    pub fn collect_threshold(mut self, bytes: usize) -> Self {
        self.collect_threshold = bytes;
        self
    }

    /// Bytes currently admitted and not yet freed.
    pub fn in_use(&self) -> usize {
        self.in_use.get()
    }
}

impl Default for DefaultMemoryHooks {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHooks for DefaultMemoryHooks {
    fn allocate(&self, bytes: usize) -> bool {
        let next = self.in_use.get().saturating_add(bytes);
        if let Some(limit) = self.limit {
            if next > limit {
                log::warn!(
                    "allocation of {} bytes refused ({} of {} in use)",
                    bytes,
                    self.in_use.get(),
                    limit
                );
                return false;
            }
        }
        self.in_use.set(next);
        true
    }

    fn free(&self, bytes: usize) {
        self.in_use.set(self.in_use.get().saturating_sub(bytes));
    }

    fn should_collect(&self, stats: &HeapStats) -> bool {
        stats.bytes_since_collect >= self.collect_threshold
    }
}
