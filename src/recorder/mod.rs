//! Double-buffered interval recording.
//!
//! A [`Recorder`] owns two accumulator slots. Writers record into whichever
//! slot the atomic `active` index names; a reader closes the current interval
//! by resetting the other slot, publishing it as active and waiting (through
//! the writer/reader phaser) until no writer can still touch the old one. The
//! old slot then holds exactly the values recorded since the previous
//! boundary and is handed to the caller.
//!
//! Writers never wait on the reader. Each slot sits behind a mutex only so
//! that concurrent writers serialize with each other; the reader never locks
//! the active slot.
//!
//! Snapshots returned by [`Recorder::interval_histogram`] may be handed back on
//! the next call to be reused as the fresh active accumulator. A snapshot is
//! only accepted from the recorder that issued it, and only once.

mod identity;
mod phaser;

use std::mem;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::accumulator::Accumulator;
use crate::clock::{Clock, WallClock};
use crate::config::RecorderConfig;
use crate::error::Error;

pub use identity::{InstanceId, IntervalHistogram};
use phaser::{PhaseFlipGuard, WriterReaderPhaser};

#[derive(Debug)]
enum Slot {
    /// Never allocated.
    Vacant,
    /// Active, or idle and staged for the next boundary.
    Ready(IntervalHistogram),
    /// Handed to a caller and not returned.
    CheckedOut,
}

impl Slot {
    fn ready_mut(&mut self) -> &mut IntervalHistogram {
        match self {
            Slot::Ready(histogram) => histogram,
            Slot::Vacant | Slot::CheckedOut => unreachable!("slot holds no accumulator"),
        }
    }

    fn check_out(&mut self) -> IntervalHistogram {
        match mem::replace(self, Slot::CheckedOut) {
            Slot::Ready(mut histogram) => {
                histogram.check_out();
                histogram
            }
            Slot::Vacant | Slot::CheckedOut => unreachable!("closed slot holds no accumulator"),
        }
    }
}

/// Records values and hands out stable interval snapshots without stalling
/// recording.
#[derive(Debug)]
pub struct Recorder<C = WallClock> {
    id: InstanceId,
    config: RecorderConfig,
    clock: C,
    active: AtomicUsize,
    slots: [Mutex<Slot>; 2],
    phaser: WriterReaderPhaser,
}

impl Recorder<WallClock> {
    /// Auto-resizing recorder at `significant_figures` precision.
    pub fn new(significant_figures: u8) -> Result<Self, Error> {
        Self::with_config(RecorderConfig::with_precision(significant_figures))
    }

    pub fn with_config(config: RecorderConfig) -> Result<Self, Error> {
        Self::with_clock(config, WallClock)
    }
}

impl<C: Clock> Recorder<C> {
    /// Recorder stamping interval boundaries from `clock`.
    pub fn with_clock(config: RecorderConfig, clock: C) -> Result<Self, Error> {
        let id = InstanceId::next();
        let mut active = IntervalHistogram::new(config.accumulator()?, id);
        active.accumulator_mut().set_start_ms(clock.now_ms());

        debug!(
            instance = %id,
            significant_figures = config.significant_figures,
            highest_trackable_value = ?config.highest_trackable_value,
            "recorder created"
        );

        Ok(Self {
            id,
            config,
            clock,
            active: AtomicUsize::new(0),
            slots: [Mutex::new(Slot::Ready(active)), Mutex::new(Slot::Vacant)],
            phaser: WriterReaderPhaser::new(),
        })
    }

    pub fn instance_id(&self) -> InstanceId {
        self.id
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Record `value` in the current interval.
    pub fn record_value(&self, value: u64) -> Result<(), Error> {
        self.record_with(|acc| acc.record(value))
    }

    /// Record `count` occurrences of `value` in the current interval.
    pub fn record_value_n(&self, value: u64, count: u64) -> Result<(), Error> {
        self.record_with(|acc| acc.record_n(value, count))
    }

    /// Record `value` with coordinated omission correction for a measurement
    /// loop expected to sample every `expected_interval`.
    pub fn record_corrected_value(&self, value: u64, expected_interval: u64) -> Result<(), Error> {
        self.record_with(|acc| acc.record_correct(value, expected_interval))
    }

    fn record_with<F>(&self, record: F) -> Result<(), Error>
    where
        F: FnOnce(&mut Accumulator) -> Result<(), Error>,
    {
        let _section = self.phaser.writer_critical_section();
        let active = self.active.load(Ordering::SeqCst);
        let mut slot = self.slots[active].lock();
        record(slot.ready_mut().accumulator_mut())
    }

    /// Close the current interval and return everything recorded in it.
    ///
    /// `recycle` may be a snapshot previously returned by this recorder; it
    /// is reset and becomes the next active accumulator, saving an
    /// allocation. Snapshots from another recorder fail with
    /// [`Error::IdentityMismatch`], snapshots already recycled (including
    /// clones of them) with [`Error::AlreadyRecycled`]. Neither failure
    /// closes the interval.
    pub fn interval_histogram(
        &self,
        recycle: Option<IntervalHistogram>,
    ) -> Result<IntervalHistogram, Error> {
        let mut flip = self.phaser.reader_lock();
        if let Some(histogram) = &recycle {
            self.check_in(histogram)?;
        }

        let closed = self.sample_interval(&mut flip, recycle)?;
        let histogram = self.slots[closed].lock().check_out();
        Ok(histogram)
    }

    /// Close the current interval, merge its counts into `target` and copy
    /// its time window onto `target`.
    ///
    /// The closed accumulator stays with the recorder and is reused for later
    /// intervals.
    pub fn interval_histogram_into(&self, target: &mut Accumulator) -> Result<(), Error> {
        let mut flip = self.phaser.reader_lock();
        let closed = self.sample_interval(&mut flip, None)?;

        let mut slot = self.slots[closed].lock();
        let interval = slot.ready_mut().accumulator_mut();
        target.add(interval)?;
        target.set_start_ms(interval.start_ms());
        target.set_end_ms(interval.end_ms());
        interval.reset();
        Ok(())
    }

    /// Discard everything recorded so far and start a new interval.
    pub fn reset(&self) -> Result<(), Error> {
        let mut flip = self.phaser.reader_lock();
        let closed = self.sample_interval(&mut flip, None)?;
        self.slots[closed]
            .lock()
            .ready_mut()
            .accumulator_mut()
            .reset();
        Ok(())
    }

    fn check_in(&self, histogram: &IntervalHistogram) -> Result<(), Error> {
        if histogram.owner() != self.id {
            warn!(instance = %self.id, owner = %histogram.owner(), "rejected foreign histogram");
            return Err(Error::IdentityMismatch {
                expected: self.id,
                found: histogram.owner(),
            });
        }
        if !histogram.check_in() {
            warn!(instance = %self.id, "rejected histogram recycled twice");
            return Err(Error::AlreadyRecycled { instance: self.id });
        }
        Ok(())
    }

    /// Swap slots and return the index of the slot holding the closed
    /// interval.
    fn sample_interval(
        &self,
        flip: &mut PhaseFlipGuard<'_>,
        recycle: Option<IntervalHistogram>,
    ) -> Result<usize, Error> {
        let active = self.active.load(Ordering::SeqCst);
        let staged = active ^ 1;

        let now = {
            let mut slot = self.slots[staged].lock();
            let mut histogram = match (recycle, mem::replace(&mut *slot, Slot::Vacant)) {
                (Some(recycled), _) => recycled,
                (None, Slot::Ready(idle)) => idle,
                (None, Slot::Vacant | Slot::CheckedOut) => {
                    debug!(instance = %self.id, "allocating staged accumulator");
                    IntervalHistogram::new(self.config.accumulator()?, self.id)
                }
            };

            let accumulator = histogram.accumulator_mut();
            accumulator.reset();
            let now = self.clock.now_ms();
            accumulator.set_start_ms(now);
            *slot = Slot::Ready(histogram);
            now
        };

        self.active.store(staged, Ordering::SeqCst);
        flip.flip_phase();

        let mut slot = self.slots[active].lock();
        let closed = slot.ready_mut().accumulator_mut();
        closed.set_end_ms(now);
        debug!(
            instance = %self.id,
            start_ms = closed.start_ms(),
            end_ms = now,
            count = closed.count(),
            "closed interval"
        );
        Ok(active)
    }
}
