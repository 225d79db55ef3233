//! Writer/reader phaser guarding the recorder's slot swap.
//!
//! Writers bracket each update with
//! ```ignore
//! let _section = phaser.writer_critical_section();
//! ```
//! which costs one atomic add on entry and one on exit and never waits.
//! The reader takes
//! ```ignore
//! let flip = phaser.reader_lock();
//! ```
//! publishes its change to the shared data, then calls `flip.flip_phase()`,
//! which returns once every writer that entered before the flip has left.

use std::sync::atomic::{AtomicI64, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};

// Sign of `start_epoch` names the current phase: non-negative is even,
// negative (offset from i64::MIN) is odd.
#[derive(Debug)]
pub(crate) struct WriterReaderPhaser {
    start_epoch: AtomicI64,
    even_end_epoch: AtomicI64,
    odd_end_epoch: AtomicI64,
    reader_lock: Mutex<()>,
}

impl WriterReaderPhaser {
    pub(crate) fn new() -> Self {
        Self {
            start_epoch: AtomicI64::new(0),
            even_end_epoch: AtomicI64::new(0),
            odd_end_epoch: AtomicI64::new(i64::MIN),
            reader_lock: Mutex::new(()),
        }
    }

    /// Enter a writer critical section, left when the guard drops.
    pub(crate) fn writer_critical_section(&self) -> WriterCriticalSection<'_> {
        let critical_value = self.start_epoch.fetch_add(1, Ordering::SeqCst);
        let end_epoch = if critical_value < 0 {
            &self.odd_end_epoch
        } else {
            &self.even_end_epoch
        };
        WriterCriticalSection { end_epoch }
    }

    /// Serialize readers. Only the holder may flip phases.
    pub(crate) fn reader_lock(&self) -> PhaseFlipGuard<'_> {
        PhaseFlipGuard {
            phaser: self,
            _lock: self.reader_lock.lock(),
        }
    }
}

pub(crate) struct WriterCriticalSection<'a> {
    end_epoch: &'a AtomicI64,
}

impl Drop for WriterCriticalSection<'_> {
    fn drop(&mut self) {
        self.end_epoch.fetch_add(1, Ordering::SeqCst);
    }
}

pub(crate) struct PhaseFlipGuard<'a> {
    phaser: &'a WriterReaderPhaser,
    _lock: MutexGuard<'a, ()>,
}

impl PhaseFlipGuard<'_> {
    /// Start a new phase and wait until all writers of the previous phase
    /// have exited, sleeping `yield_time` between checks (or yielding the
    /// thread when it is zero).
    pub(crate) fn flip_phase_with_yield_time(&mut self, yield_time: Duration) {
        let phaser = self.phaser;
        let next_phase_is_even = phaser.start_epoch.load(Ordering::SeqCst) < 0;

        let initial_start_value = if next_phase_is_even { 0 } else { i64::MIN };
        let (next_end_epoch, previous_end_epoch) = if next_phase_is_even {
            (&phaser.even_end_epoch, &phaser.odd_end_epoch)
        } else {
            (&phaser.odd_end_epoch, &phaser.even_end_epoch)
        };
        next_end_epoch.store(initial_start_value, Ordering::SeqCst);

        let start_value_at_flip = phaser
            .start_epoch
            .swap(initial_start_value, Ordering::SeqCst);

        while previous_end_epoch.load(Ordering::SeqCst) != start_value_at_flip {
            if yield_time.is_zero() {
                thread::yield_now();
            } else {
                thread::sleep(yield_time);
            }
        }
    }

    pub(crate) fn flip_phase(&mut self) {
        self.flip_phase_with_yield_time(Duration::ZERO);
    }
}
