// SPDX-FileCopyrightText: 2025 Contributors to the Capture Input project.
// SPDX-License-Identifier: Apache-2.0

//! Recycling pool for sample storage.
//!
//! Samples are acquired on the capture thread and dropped wherever the
//! consumer lets go of them. Dropping a [`Pooled`] hands its allocation back
//! to the pool it came from, so steady-state capture does not allocate.

use std::{
    fmt,
    ops::{Deref, DerefMut},
    sync::{Arc, Mutex, PoisonError, Weak},
};

/// Storage that can be cleared for reuse without giving up its allocation.
pub trait Recycle: Default {
    /// Forgets the current contents, keeping capacity.
    fn recycle(&mut self);
}

type FreeList<T> = Mutex<Vec<T>>;

/// A pool of reusable `T`.
pub struct SamplePool<T: Recycle> {
    free: Arc<FreeList<T>>,
}

impl<T: Recycle> SamplePool<T> {
    pub fn new() -> Self {
        Self {
            free: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Takes a value from the free list, or creates one if it is empty.
    pub fn acquire(&self) -> Pooled<T> {
        let value = self
            .free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_default();
        Pooled {
            value,
            home: Arc::downgrade(&self.free),
        }
    }

    /// Number of values waiting for reuse.
    pub fn available(&self) -> usize {
        self.free.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Releases every idle value. Outstanding values still come back here.
    pub fn reset(&self) {
        self.free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl<T: Recycle> Default for SamplePool<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A value on loan from a [`SamplePool`].
pub struct Pooled<T: Recycle> {
    value: T,
    home: Weak<FreeList<T>>,
}

impl<T: Recycle> Pooled<T> {
    /// Detaches the value from its pool.
    pub fn into_inner(mut self) -> T {
        self.home = Weak::new();
        std::mem::take(&mut self.value)
    }
}

impl<T: Recycle> Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: Recycle> DerefMut for Pooled<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: Recycle + fmt::Debug> fmt::Debug for Pooled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pooled").field(&self.value).finish()
    }
}

impl<T: Recycle> Drop for Pooled<T> {
    fn drop(&mut self) {
        if let Some(home) = self.home.upgrade() {
            let mut value = std::mem::take(&mut self.value);
            value.recycle();
            home.lock().unwrap_or_else(PoisonError::into_inner).push(value);
        }
    }
}
