//! Lightweight cache counters.

use std::sync::atomic::{AtomicU64, Ordering};

use mqr_core::manifest::CacheSummary;

#[derive(Debug, Default)]
pub struct CacheStats {
    executions: AtomicU64,
    served: AtomicU64,
    failures: AtomicU64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_execution(&self, failed: bool) {
        self.executions.fetch_add(1, Ordering::AcqRel);
        if failed {
            self.failures.fetch_add(1, Ordering::AcqRel);
        }
    }

    pub(crate) fn record_served(&self) {
        self.served.fetch_add(1, Ordering::AcqRel);
    }

    pub fn executions(&self) -> u64 {
        self.executions.load(Ordering::Acquire)
    }

    pub fn served(&self) -> u64 {
        self.served.load(Ordering::Acquire)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Acquire)
    }

    pub fn summary(&self) -> CacheSummary {
        CacheSummary {
            executions: self.executions(),
            served: self.served(),
            failures: self.failures(),
        }
    }
}
