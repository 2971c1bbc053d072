// Lazy singleton whose constructor can fail.
//
// The caller that triggers a failed construction gets the error; the slot
// stays empty and the next caller runs its own attempt. Attempts are
// serialized by the lock, so at most one value is ever stored.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use crate::error::InitError;

pub struct TryLazy<T: 'static> {
    slot: Mutex<Option<&'static T>>,
}

impl<T: Sync + 'static> TryLazy<T> {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Returns the instance, running `init` only if none has been stored yet.
    pub fn try_get_instance<E, F>(&self, init: F) -> Result<&'static T, InitError<E>>
    where
        E: fmt::Display,
        F: FnOnce() -> Result<T, E>,
    {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(instance) = *slot {
            return Ok(instance);
        }

        match init() {
            Ok(value) => {
                let instance: &'static T = Box::leak(Box::new(value));
                *slot = Some(instance);
                tracing::debug!(type_name = std::any::type_name::<T>(), "singleton constructed");
                Ok(instance)
            }
            Err(err) => {
                tracing::warn!(
                    type_name = std::any::type_name::<T>(),
                    error = %err,
                    "singleton construction failed, leaving it unset"
                );
                Err(InitError::Construction(err))
            }
        }
    }

    /// The instance if a previous call stored one.
    pub fn get(&self) -> Option<&'static T> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Sync + 'static> Default for TryLazy<T> {
    fn default() -> Self {
        Self::new()
    }
}
