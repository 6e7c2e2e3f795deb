//! Small shared utilities

use std::sync::{Mutex, MutexGuard};

/// Acquire a mutex, recovering from poisoning by taking the guard anyway.
/// Session state is only ever mutated through the reducer, so a panicking
/// holder cannot leave it half-written.
pub fn lock_mutex_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("mutex was poisoned, recovering: {}", poisoned);
            poisoned.into_inner()
        }
    }
}
