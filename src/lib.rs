//! # Creational Patterns: Singleton and Prototype
//!
//! Runnable, tested versions of two object-creation patterns.
//!
//! ## Singleton
//! - Eager initialization (`const` static)
//! - Lazy initialization behind a full lock
//! - Double-checked locking with an atomic handle
//! - Holder pattern (`lazy_static!` inside a nested module)
//! - Fallible lazy initialization that can be retried
//!
//! ## Prototype
//! - Shallow clone: shared sub-objects keep their identity
//! - Deep clone: serialize to a byte buffer, then rebuild a new graph
//!
//! Run the demo with:
//! ```bash
//! cargo run --bin creational_demo
//! ```

pub mod config;
pub mod error;
pub mod prototype;
pub mod singleton;

pub use config::DemoConfig;
pub use error::{CloneError, ConfigError, InitError};
pub use prototype::{deep_clone, shallow_clone, DeepClone, ShallowClone, Snapshot};
