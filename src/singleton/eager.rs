// Eager initialization: the instance is part of the binary image.
//
// A `static` with a `const fn` initializer is evaluated at compile time, so
// the value already exists when the program is loaded. No first-call cost and
// no synchronization, but the instance exists even if nobody ever asks for it,
// and the constructor is limited to what `const fn` can do.

use super::SerialNumbers;

/// First serial issued by the eager singleton.
pub const EAGER_FIRST_SERIAL: u64 = 1_000;

static INSTANCE: EagerSingleton = EagerSingleton::new();

#[derive(Debug)]
pub struct EagerSingleton {
    serials: SerialNumbers,
}

impl EagerSingleton {
    const fn new() -> Self {
        Self {
            serials: SerialNumbers::starting_at(EAGER_FIRST_SERIAL),
        }
    }

    pub fn get_instance() -> &'static EagerSingleton {
        &INSTANCE
    }

    pub fn next_serial(&self) -> u64 {
        self.serials.next_serial()
    }
}
