//! Prototype Pattern: create objects by duplicating an existing one.
//!
//! - [`ShallowClone`]: copy the top-level fields; `Arc` sub-objects stay shared.
//! - [`DeepClone`]: serialize the whole graph into a byte buffer and build a
//!   new, fully independent graph from it.

pub mod deep;
pub mod shallow;
pub mod weekly_log;

pub use deep::{DeepClone, NotSerializable, Snapshot};
pub use shallow::ShallowClone;
pub use weekly_log::{Attachment, NotifyingLog, WeeklyLog};

use crate::error::CloneError;

pub fn shallow_clone<T: ShallowClone>(source: &T) -> Result<T, CloneError> {
    source.shallow_clone().map_err(|err| {
        tracing::warn!(error = %err, "shallow clone failed");
        err
    })
}

pub fn deep_clone<T: DeepClone>(source: &T) -> Result<T, CloneError> {
    source.deep_clone().map_err(|err| {
        tracing::warn!(error = %err, "deep clone failed");
        err
    })
}
