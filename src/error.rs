use hdrhistogram::errors::{AdditionError, CreationError};

use crate::recorder::InstanceId;

/// Errors produced by [`Accumulator`](crate::Accumulator) and
/// [`Recorder`](crate::Recorder).
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The value cannot be represented by the accumulator's configured range.
    #[error("value {value} is outside the trackable range {low}..={high}")]
    OutOfRange { value: u64, low: u64, high: u64 },
    /// Precision or range settings were rejected by the histogram.
    #[error("cannot configure accumulator: {0:?}")]
    Creation(CreationError),
    /// Counts could not be merged into the target accumulator.
    #[error("cannot merge interval into target: {0:?}")]
    Merge(AdditionError),
    /// A recycled histogram was issued by a different recorder.
    #[error("recycled histogram belongs to recorder {found}, not recorder {expected}")]
    IdentityMismatch {
        expected: InstanceId,
        found: InstanceId,
    },
    /// A recycled histogram (or a clone of it) was already handed back.
    #[error("histogram from recorder {instance} was already recycled")]
    AlreadyRecycled { instance: InstanceId },
}
