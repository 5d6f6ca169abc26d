//! Coarse lock shared by predictor instances across worker threads.
//!
//! Guards external resources a predictor may touch (files, model caches).
//! The ledger and the simulator never take it.

use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct ResourceLock {
    inner: Arc<Mutex<()>>,
}

impl ResourceLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> MutexGuard<'_, ()> {
        self.inner.lock()
    }

    /// Run `f` while holding the lock.
    pub fn with<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.inner.lock();
        f()
    }

    /// Whether two handles guard the same resource.
    pub fn same_as(&self, other: &ResourceLock) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
