//! Singleton Pattern: one process-wide instance per type.
//!
//! Every provider hands out `&'static` references, so identity can be checked
//! with `std::ptr::eq`. The demo singletons all carry a [`SerialNumbers`]
//! generator: since the instance is unique, so are the serials it issues.
//!
//! | Module | Construction | Thread safety |
//! |---|---|---|
//! | [`eager`] | at load time | none needed |
//! | [`locked`] | first call | lock on every call |
//! | [`double_checked`] | first call | atomic fast path, lock only while empty |
//! | [`holder`] | first access | `lazy_static!` once-only initialization |
//! | [`fallible`] | first successful call | lock, failed attempts leave it empty |

use std::sync::atomic::{AtomicU64, Ordering};

pub mod double_checked;
pub mod eager;
pub mod fallible;
pub mod holder;
pub mod locked;

pub use double_checked::{CheckedSingleton, DoubleChecked};
pub use eager::EagerSingleton;
pub use fallible::TryLazy;
pub use holder::HolderSingleton;
pub use locked::{LazySingleton, LockedLazy};

/// Monotonic serial number source shared through a singleton.
#[derive(Debug)]
pub struct SerialNumbers {
    next: AtomicU64,
}

impl SerialNumbers {
    pub const fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Hands out the next serial. Never returns the same value twice.
    pub fn next_serial(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// The serial the next call to `next_serial` would return.
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}
