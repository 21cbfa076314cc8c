use std::sync::{Mutex, MutexGuard, PoisonError};

/// Serializes test cases that share the cluster.
///
/// Acquire the guard at the start of every e2e test and hold it until the
/// test returns. A test that panicked while holding the lock does not block
/// the ones after it.
pub fn lock() -> MutexGuard<'static, ()> {
    static LOCK: Mutex<()> = Mutex::new(());
    LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}
