// Double-checked locking.
//
// 1. Load the handle without the lock; if set, return it.
// 2. Take the lock.
// 3. Load again: another thread may have finished construction while we
//    waited for the lock.
// 4. Construct, then publish the pointer with a Release store.
//
// The Release store pairs with the Acquire load in step 1, so a reader that
// sees a non-null pointer also sees the fully written value behind it. With
// plain (Relaxed) accesses a reader could observe the pointer before the
// writes that initialized the object.

use std::marker::PhantomData;
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use super::SerialNumbers;

pub struct DoubleChecked<T> {
    handle: AtomicPtr<T>,
    lock: Mutex<()>,
    init: fn() -> T,
    _owns: PhantomData<T>,
}

// The value may be built on one thread and read from all others.
unsafe impl<T: Send + Sync> Sync for DoubleChecked<T> {}

impl<T> DoubleChecked<T> {
    pub const fn new(init: fn() -> T) -> Self {
        Self {
            handle: AtomicPtr::new(ptr::null_mut()),
            lock: Mutex::new(()),
            init,
            _owns: PhantomData,
        }
    }

    pub fn get_instance(&self) -> &T {
        let current = self.handle.load(Ordering::Acquire);
        if !current.is_null() {
            // SAFETY: non-null pointers come from Box::into_raw below and are
            // only freed in Drop, which needs `&mut self`.
            return unsafe { &*current };
        }

        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let current = self.handle.load(Ordering::Acquire);
        if !current.is_null() {
            // SAFETY: as above.
            return unsafe { &*current };
        }

        let created = Box::into_raw(Box::new((self.init)()));
        self.handle.store(created, Ordering::Release);
        // SAFETY: `created` was just allocated and stays alive until Drop.
        unsafe { &*created }
    }

    pub fn is_initialized(&self) -> bool {
        !self.handle.load(Ordering::Acquire).is_null()
    }
}

impl<T> Drop for DoubleChecked<T> {
    fn drop(&mut self) {
        let current = *self.handle.get_mut();
        if !current.is_null() {
            // SAFETY: the pointer came from Box::into_raw and no borrow of the
            // value can outlive `&mut self`.
            drop(unsafe { Box::from_raw(current) });
        }
    }
}

/// First serial issued by the double-checked singleton.
pub const CHECKED_FIRST_SERIAL: u64 = 3_000;

static CONSTRUCTIONS: AtomicUsize = AtomicUsize::new(0);
static INSTANCE: DoubleChecked<CheckedSingleton> = DoubleChecked::new(CheckedSingleton::new);

#[derive(Debug)]
pub struct CheckedSingleton {
    serials: SerialNumbers,
}

impl CheckedSingleton {
    fn new() -> Self {
        let count = CONSTRUCTIONS.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(constructions = count, "constructing CheckedSingleton");
        Self {
            serials: SerialNumbers::starting_at(CHECKED_FIRST_SERIAL),
        }
    }

    pub fn get_instance() -> &'static CheckedSingleton {
        INSTANCE.get_instance()
    }

    pub fn next_serial(&self) -> u64 {
        self.serials.next_serial()
    }

    pub fn constructions() -> usize {
        CONSTRUCTIONS.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;
    use std::sync::{Arc, Barrier};

    #[test]
    fn test_concurrent_first_access_constructs_once() {
        static BUILT: AtomicUsize = AtomicUsize::new(0);

        fn slow_build() -> Vec<u64> {
            BUILT.fetch_add(1, Ordering::SeqCst);
            // Widen the window in which other threads pass the first check.
            std::thread::sleep(std::time::Duration::from_millis(20));
            (0..64).collect()
        }

        static CELL: DoubleChecked<Vec<u64>> = DoubleChecked::new(slow_build);

        let threads = 24;
        let barrier = Arc::new(Barrier::new(threads));
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    let value = CELL.get_instance();
                    assert_eq!(value.len(), 64);
                    value as *const Vec<u64> as usize
                })
            })
            .collect();

        let addresses: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(addresses.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(BUILT.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_local_cell_frees_value_on_drop() {
        static DROPPED: AtomicUsize = AtomicUsize::new(0);

        struct Tracked;

        impl Drop for Tracked {
            fn drop(&mut self) {
                DROPPED.fetch_add(1, Ordering::SeqCst);
            }
        }

        let cell = DoubleChecked::new(|| Tracked);
        assert!(!cell.is_initialized());
        let _ = cell.get_instance();
        assert!(cell.is_initialized());
        assert_eq!(DROPPED.load(Ordering::SeqCst), 0);

        drop(cell);
        assert_eq!(DROPPED.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_singleton_identity_under_parallel_access() {
        let addresses: Vec<usize> = (0..1_000)
            .into_par_iter()
            .map(|_| CheckedSingleton::get_instance() as *const CheckedSingleton as usize)
            .collect();

        let first = addresses[0];
        assert!(addresses.iter().all(|&addr| addr == first));
        assert_eq!(CheckedSingleton::constructions(), 1);
    }

    #[test]
    fn test_serials_unique_through_singleton() {
        let serials: Vec<u64> = (0..200)
            .into_par_iter()
            .map(|_| CheckedSingleton::get_instance().next_serial())
            .collect();

        let mut sorted = serials.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), serials.len());
        assert!(sorted[0] >= CHECKED_FIRST_SERIAL);
    }
}
