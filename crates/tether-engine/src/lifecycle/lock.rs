use std::sync::{Arc, OnceLock};

use parking_lot::{Condvar, Mutex};

/// Binary lock serializing native-context ownership between render loops.
///
/// Platforms may briefly run two lifecycles for the same view (an old instance
/// tearing down while a new one starts). Every render loop holds a lease on
/// the lock for as long as it may own a native context, so the second loop
/// blocks in its starting phase until the first one has released everything.
///
/// Cloning yields another handle to the same lock.
#[derive(Clone, Default)]
pub struct ContextLock {
    inner: Arc<LockInner>,
}

#[derive(Default)]
struct LockInner {
    /// Name of the current holder, `None` when free.
    holder: Mutex<Option<String>>,
    released: Condvar,
}

impl ContextLock {
    /// Creates an independent lock.
    ///
    /// Loops that must not overlap have to share the same instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle to the lock shared by the whole process.
    pub fn process() -> Self {
        static PROCESS: OnceLock<ContextLock> = OnceLock::new();
        PROCESS.get_or_init(ContextLock::new).clone()
    }

    /// Blocks until the lock is free, then takes it on behalf of `holder`.
    pub fn acquire(&self, holder: &str) -> ContextLease {
        let mut current = self.inner.holder.lock();
        if let Some(other) = current.as_deref() {
            log::debug!("{holder}: waiting for context lock held by {other}");
        }
        while current.is_some() {
            self.inner.released.wait(&mut current);
        }
        *current = Some(holder.to_string());
        log::trace!("{holder}: context lock acquired");

        ContextLease {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Takes the lock only if nobody holds it.
    pub fn try_acquire(&self, holder: &str) -> Option<ContextLease> {
        let mut current = self.inner.holder.lock();
        if current.is_some() {
            return None;
        }
        *current = Some(holder.to_string());

        Some(ContextLease {
            inner: Arc::clone(&self.inner),
        })
    }

    /// Name of the current holder, if any.
    pub fn holder(&self) -> Option<String> {
        self.inner.holder.lock().clone()
    }
}

/// Proof of ownership of a [`ContextLock`]; releases it on drop.
///
/// Dropping happens during unwinding too, so a panicking render thread never
/// leaves the lock held.
pub struct ContextLease {
    inner: Arc<LockInner>,
}

impl Drop for ContextLease {
    fn drop(&mut self) {
        let previous = self.inner.holder.lock().take();
        if let Some(holder) = previous {
            log::trace!("{holder}: context lock released");
        }
        self.inner.released.notify_one();
    }
}
