use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

static LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_lock_poison_once(operation: &'static str) {
    if LOCK_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "lock poisoned; recovered inner value");
    }
}

// A panicking instruction must not take the scene or the image cache down
// with it, so every lock in the crate recovers the inner value.
pub(crate) fn lock_or_recover<'a, T: ?Sized>(
    mutex: &'a Mutex<T>,
    operation: &'static str,
) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn_lock_poison_once(operation);
            poisoned.into_inner()
        }
    }
}

pub(crate) fn read_or_recover<'a, T>(
    lock: &'a RwLock<T>,
    operation: &'static str,
) -> RwLockReadGuard<'a, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn_lock_poison_once(operation);
            poisoned.into_inner()
        }
    }
}

pub(crate) fn write_or_recover<'a, T>(
    lock: &'a RwLock<T>,
    operation: &'static str,
) -> RwLockWriteGuard<'a, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn_lock_poison_once(operation);
            poisoned.into_inner()
        }
    }
}
