// Lazy initialization with a full lock.
//
// Every call takes the mutex, checks the slot and constructs on first use.
// Correct and simple, but all callers serialize on the lock even long after
// the instance exists.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use super::SerialNumbers;

/// Lazily constructed value guarded by a mutex on every access.
///
/// The value is leaked on construction and lives until process exit, which
/// is what lets `get_instance` return `&'static T`.
pub struct LockedLazy<T: 'static> {
    slot: Mutex<Option<&'static T>>,
    init: fn() -> T,
}

impl<T: Sync + 'static> LockedLazy<T> {
    pub const fn new(init: fn() -> T) -> Self {
        Self {
            slot: Mutex::new(None),
            init,
        }
    }

    pub fn get_instance(&self) -> &'static T {
        // A panicking constructor leaves the slot empty, so a poisoned lock
        // is still consistent.
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(instance) = *slot {
            return instance;
        }

        let instance: &'static T = Box::leak(Box::new((self.init)()));
        *slot = Some(instance);
        instance
    }

    pub fn is_initialized(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// First serial issued by the lazy singleton.
pub const LAZY_FIRST_SERIAL: u64 = 2_000;

static CONSTRUCTIONS: AtomicUsize = AtomicUsize::new(0);
static INSTANCE: LockedLazy<LazySingleton> = LockedLazy::new(LazySingleton::new);

#[derive(Debug)]
pub struct LazySingleton {
    serials: SerialNumbers,
}

impl LazySingleton {
    fn new() -> Self {
        let count = CONSTRUCTIONS.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(constructions = count, "constructing LazySingleton");
        Self {
            serials: SerialNumbers::starting_at(LAZY_FIRST_SERIAL),
        }
    }

    pub fn get_instance() -> &'static LazySingleton {
        INSTANCE.get_instance()
    }

    pub fn next_serial(&self) -> u64 {
        self.serials.next_serial()
    }

    /// How many times the constructor has run in this process.
    pub fn constructions() -> usize {
        CONSTRUCTIONS.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;

    static BUILT: AtomicUsize = AtomicUsize::new(0);

    fn build_counted() -> Vec<u32> {
        BUILT.fetch_add(1, Ordering::SeqCst);
        vec![1, 2, 3]
    }

    #[test]
    fn test_cell_is_lazy_and_built_once() {
        static CELL: LockedLazy<Vec<u32>> = LockedLazy::new(build_counted);

        assert!(!CELL.is_initialized());
        assert_eq!(BUILT.load(Ordering::SeqCst), 0);

        let first = CELL.get_instance();
        let second = CELL.get_instance();

        assert!(CELL.is_initialized());
        assert!(std::ptr::eq(first, second));
        assert_eq!(first, &vec![1, 2, 3]);
        assert_eq!(BUILT.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_constructor_allows_retry() {
        static ATTEMPTS: AtomicUsize = AtomicUsize::new(0);

        fn flaky() -> String {
            if ATTEMPTS.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("first attempt fails");
            }
            "ready".to_string()
        }

        static CELL: LockedLazy<String> = LockedLazy::new(flaky);

        let result = std::panic::catch_unwind(|| CELL.get_instance());
        assert!(result.is_err());
        assert!(!CELL.is_initialized());

        assert_eq!(CELL.get_instance(), "ready");
        assert_eq!(ATTEMPTS.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_concurrent_first_access_constructs_once() {
        static SLOW_BUILT: AtomicUsize = AtomicUsize::new(0);

        fn slow_build() -> Vec<u64> {
            SLOW_BUILT.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(20));
            vec![7; 16]
        }

        static CELL: LockedLazy<Vec<u64>> = LockedLazy::new(slow_build);

        let threads = 24;
        let barrier = Barrier::new(threads);
        let mut addresses = Vec::with_capacity(threads);

        crossbeam::thread::scope(|s| {
            let handles: Vec<_> = (0..threads)
                .map(|_| {
                    s.spawn(|_| {
                        barrier.wait();
                        CELL.get_instance() as *const Vec<u64> as usize
                    })
                })
                .collect();
            for handle in handles {
                addresses.push(handle.join().unwrap());
            }
        })
        .unwrap();

        assert_eq!(addresses.len(), threads);
        assert!(addresses.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(SLOW_BUILT.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_access_sees_one_singleton() {
        let threads = 32;
        let barrier = Barrier::new(threads);
        let mut addresses = Vec::new();

        crossbeam::thread::scope(|s| {
            let handles: Vec<_> = (0..threads)
                .map(|_| {
                    s.spawn(|_| {
                        barrier.wait();
                        LazySingleton::get_instance() as *const LazySingleton as usize
                    })
                })
                .collect();
            for handle in handles {
                addresses.push(handle.join().unwrap());
            }
        })
        .unwrap();

        assert!(addresses.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(LazySingleton::constructions(), 1);
    }

    #[test]
    fn test_serials_start_at_configured_value() {
        let serial = LazySingleton::get_instance().next_serial();
        assert!(serial >= LAZY_FIRST_SERIAL);
    }
}
