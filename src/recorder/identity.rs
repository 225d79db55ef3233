use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::accumulator::Accumulator;

static RECORDER_INSTANCE_SEQUENCER: AtomicU64 = AtomicU64::new(1);

/// Identity of one [`Recorder`](super::Recorder), unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    pub(crate) fn next() -> Self {
        Self(RECORDER_INSTANCE_SEQUENCER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An interval snapshot issued by a [`Recorder`](super::Recorder).
///
/// Carries the identity of the recorder that allocated it so it can be handed
/// back through [`Recorder::interval_histogram`](super::Recorder::interval_histogram)
/// for reuse. Clones share the original's checkout flag, so only one of them
/// can ever be recycled.
#[derive(Debug, Clone)]
pub struct IntervalHistogram {
    accumulator: Accumulator,
    owner: InstanceId,
    checked_out: Arc<AtomicBool>,
}

impl IntervalHistogram {
    pub(crate) fn new(accumulator: Accumulator, owner: InstanceId) -> Self {
        Self {
            accumulator,
            owner,
            checked_out: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The recorder that allocated this histogram.
    pub fn owner(&self) -> InstanceId {
        self.owner
    }

    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    /// Detach the counts from the recorder. The result can no longer be
    /// recycled.
    pub fn into_accumulator(self) -> Accumulator {
        self.accumulator
    }

    pub(crate) fn accumulator_mut(&mut self) -> &mut Accumulator {
        &mut self.accumulator
    }

    /// Mark as handed to a caller. Earlier clones keep the old flag.
    pub(crate) fn check_out(&mut self) {
        self.checked_out = Arc::new(AtomicBool::new(true));
    }

    /// Mark as returned; false if this issue was already returned.
    pub(crate) fn check_in(&self) -> bool {
        self.checked_out.swap(false, Ordering::AcqRel)
    }
}

impl Deref for IntervalHistogram {
    type Target = Accumulator;

    fn deref(&self) -> &Accumulator {
        &self.accumulator
    }
}
