// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Lock helpers that recover from poisoning instead of panicking.
//!
//! A panic inside one of the session timers must not take the whole shell
//! down with it. When a lock turns out to be poisoned we log it and keep
//! using the data; session state is small and every transition leaves it
//! consistent.

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Acquire a mutex, recovering the guard if a previous holder panicked.
#[inline]
pub fn resilient_lock<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::error!(
                target: "session::locks",
                event = "LOCK_POISONED",
                "Mutex was poisoned; recovering session state"
            );
            poisoned.into_inner()
        }
    }
}

/// Acquire a read lock, recovering from poisoning if necessary.
#[inline]
pub fn resilient_read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::error!(
                target: "session::locks",
                event = "LOCK_POISONED_READ",
                "RwLock was poisoned during read; recovering"
            );
            poisoned.into_inner()
        }
    }
}

/// Acquire a write lock, recovering from poisoning if necessary.
#[inline]
pub fn resilient_write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::error!(
                target: "session::locks",
                event = "LOCK_POISONED_WRITE",
                "RwLock was poisoned during write; recovering"
            );
            poisoned.into_inner()
        }
    }
}
