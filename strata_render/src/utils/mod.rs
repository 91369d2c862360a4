//! Small shared utilities

pub mod slot_allocator;

pub use slot_allocator::{Slot, SlotAllocator};

use std::sync::{Mutex, MutexGuard};
use crate::error::{Error, Result};

/// Lock a shared object, turning a poisoned lock into `BackendError`
pub(crate) fn lock<'a, T: ?Sized>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>> {
    mutex
        .lock()
        .map_err(|_| Error::BackendError(format!("{} lock poisoned", what)))
}
