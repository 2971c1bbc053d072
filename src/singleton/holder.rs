// Holder pattern (initialization-on-demand holder).
//
// The instance lives in a lazily initialized static inside a private nested
// module. Nothing touches that static until `get_instance` dereferences it,
// and `lazy_static!` runs the initializer exactly once behind a
// `std::sync::Once`, so we get lazy and thread-safe construction without any
// locking code of our own.

use std::sync::atomic::{AtomicUsize, Ordering};

use super::SerialNumbers;

/// First serial issued by the holder singleton.
pub const HOLDER_FIRST_SERIAL: u64 = 4_000;

static CONSTRUCTIONS: AtomicUsize = AtomicUsize::new(0);

mod instance_holder {
    use lazy_static::lazy_static;

    lazy_static! {
        pub(super) static ref INSTANCE: super::HolderSingleton = super::HolderSingleton::new();
    }
}

#[derive(Debug)]
pub struct HolderSingleton {
    serials: SerialNumbers,
}

impl HolderSingleton {
    fn new() -> Self {
        let count = CONSTRUCTIONS.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(constructions = count, "constructing HolderSingleton");
        Self {
            serials: SerialNumbers::starting_at(HOLDER_FIRST_SERIAL),
        }
    }

    pub fn get_instance() -> &'static HolderSingleton {
        &instance_holder::INSTANCE
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
    use std::sync::Barrier;

    #[test]
    fn test_same_instance() {
        let s1 = HolderSingleton::get_instance();
        let s2 = HolderSingleton::get_instance();
        assert!(std::ptr::eq(s1, s2));
    }

    #[test]
    fn test_concurrent_first_access_constructs_once() {
        use lazy_static::lazy_static;

        static SLOW_BUILT: AtomicUsize = AtomicUsize::new(0);

        fn slow_build() -> Vec<u64> {
            SLOW_BUILT.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(20));
            vec![7; 16]
        }

        lazy_static! {
            static ref SLOW: Vec<u64> = slow_build();
        }

        let threads = 24;
        let barrier = Barrier::new(threads);
        let mut addresses = Vec::with_capacity(threads);

        crossbeam::thread::scope(|s| {
            let handles: Vec<_> = (0..threads)
                .map(|_| {
                    s.spawn(|_| {
                        barrier.wait();
                        &*SLOW as *const Vec<u64> as usize
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
        let mut addresses = Vec::with_capacity(threads);

        crossbeam::thread::scope(|s| {
            let handles: Vec<_> = (0..threads)
                .map(|_| {
                    s.spawn(|_| {
                        barrier.wait();
                        HolderSingleton::get_instance() as *const HolderSingleton as usize
                    })
                })
                .collect();
            for handle in handles {
                addresses.push(handle.join().unwrap());
            }
        })
        .unwrap();

        assert!(addresses.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(HolderSingleton::constructions(), 1);
    }

    #[test]
    fn test_serials_start_at_configured_value() {
        assert!(HolderSingleton::get_instance().next_serial() >= HOLDER_FIRST_SERIAL);
    }
}
