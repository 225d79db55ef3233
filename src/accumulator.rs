//! Counting structure the recorder double-buffers.
//!
//! [`Accumulator`] is an HdrHistogram plus the two things the histogram does
//! not keep on its own: the wall-clock window the counts belong to and an
//! exact running sum of every recorded value. Bucketing, range resizing and
//! quantiles are all left to `hdrhistogram`.

use hdrhistogram::Histogram;

use crate::error::Error;

/// Default number of significant decimal digits.
pub const DEFAULT_SIGFIG: u8 = 3;

/// Lowest value distinguishable from zero in the default configuration.
pub const LOWEST_DISCERNIBLE: u64 = 1;

/// Value counts for one recording window.
#[derive(Debug, Clone)]
pub struct Accumulator {
    histogram: Histogram<u64>,
    sum: u128,
    start_ms: u64,
    end_ms: u64,
}

impl Accumulator {
    /// Auto-resizing accumulator tracking `1..=u64::MAX` at `sigfig`
    /// significant digits.
    pub fn new(sigfig: u8) -> Result<Self, Error> {
        let histogram = Histogram::<u64>::new(sigfig).map_err(Error::Creation)?;
        Ok(Self::from_histogram(histogram))
    }

    /// Fixed-range accumulator; values above `high` are rejected.
    pub fn with_bounds(low: u64, high: u64, sigfig: u8) -> Result<Self, Error> {
        let histogram =
            Histogram::<u64>::new_with_bounds(low, high, sigfig).map_err(Error::Creation)?;
        Ok(Self::from_histogram(histogram))
    }

    /// Let the range grow past its initial high bound on demand.
    pub(crate) fn auto_resizing(mut self) -> Self {
        self.histogram.auto(true);
        self
    }

    fn from_histogram(histogram: Histogram<u64>) -> Self {
        Self {
            histogram,
            sum: 0,
            start_ms: 0,
            end_ms: 0,
        }
    }

    /// Record a single occurrence of `value`.
    pub fn record(&mut self, value: u64) -> Result<(), Error> {
        self.record_n(value, 1)
    }

    /// Record `count` occurrences of `value`.
    pub fn record_n(&mut self, value: u64, count: u64) -> Result<(), Error> {
        self.histogram
            .record_n(value, count)
            .map_err(|_| Error::OutOfRange {
                value,
                low: self.histogram.low(),
                high: self.histogram.high(),
            })?;
        self.sum += u128::from(value) * u128::from(count);
        Ok(())
    }

    /// Record `value`, back-filling the samples a stalled measurement loop
    /// would have taken every `expected_interval` (coordinated omission
    /// correction). An interval of zero records `value` alone.
    pub fn record_correct(&mut self, value: u64, expected_interval: u64) -> Result<(), Error> {
        self.record(value)?;
        if expected_interval == 0 || value <= expected_interval {
            return Ok(());
        }

        let mut missing = value - expected_interval;
        while missing >= expected_interval {
            self.record(missing)?;
            missing -= expected_interval;
        }
        Ok(())
    }

    /// Clear all counts and the time window. Range and precision are kept.
    pub fn reset(&mut self) {
        self.histogram.reset();
        self.sum = 0;
        self.start_ms = 0;
        self.end_ms = 0;
    }

    /// Merge the counts of `other` into `self`. The time window is untouched.
    pub fn add(&mut self, other: &Accumulator) -> Result<(), Error> {
        self.histogram
            .add(&other.histogram)
            .map_err(Error::Merge)?;
        self.sum += other.sum;
        Ok(())
    }

    /// Number of recorded values.
    pub fn count(&self) -> u64 {
        self.histogram.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Exact sum of recorded values.
    pub fn sum(&self) -> u128 {
        self.sum
    }

    /// Exact arithmetic mean, zero when empty.
    #[allow(clippy::cast_precision_loss)]
    pub fn mean(&self) -> f64 {
        match self.count() {
            0 => 0.0,
            n => self.sum as f64 / n as f64,
        }
    }

    pub fn min(&self) -> u64 {
        self.histogram.min()
    }

    pub fn max(&self) -> u64 {
        self.histogram.max()
    }

    /// Value at quantile `q` in `0.0..=1.0`, at the histogram's resolution.
    pub fn value_at_quantile(&self, q: f64) -> u64 {
        self.histogram.value_at_quantile(q)
    }

    pub fn start_ms(&self) -> u64 {
        self.start_ms
    }

    pub fn set_start_ms(&mut self, ms: u64) {
        self.start_ms = ms;
    }

    pub fn end_ms(&self) -> u64 {
        self.end_ms
    }

    pub fn set_end_ms(&mut self, ms: u64) {
        self.end_ms = ms;
    }

    /// The underlying histogram, for iteration and serialization.
    pub fn histogram(&self) -> &Histogram<u64> {
        &self.histogram
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_tracks_count_and_exact_sum() {
        let mut acc = Accumulator::new(DEFAULT_SIGFIG).unwrap();
        acc.record(10).unwrap();
        acc.record(20).unwrap();
        acc.record_n(30, 2).unwrap();

        assert_eq!(acc.count(), 4);
        assert_eq!(acc.sum(), 90);
        assert_eq!(acc.min(), 10);
        assert_eq!(acc.max(), 30);
        assert!((acc.mean() - 22.5).abs() < f64::EPSILON);
    }

    #[test]
    fn auto_resizing_accepts_huge_values() {
        let mut acc = Accumulator::new(DEFAULT_SIGFIG).unwrap();
        acc.record(u64::MAX / 2).unwrap();
        assert_eq!(acc.count(), 1);
    }

    #[test]
    fn bounded_rejects_values_above_high() {
        let mut acc = Accumulator::with_bounds(1, 1_000, 2).unwrap();
        acc.record(999).unwrap();

        let err = acc.record(1_000_000).unwrap_err();
        assert!(matches!(err, Error::OutOfRange { value: 1_000_000, .. }));
        assert_eq!(acc.count(), 1);
        assert_eq!(acc.sum(), 999);
    }

    #[test]
    fn precision_above_five_is_rejected() {
        assert!(matches!(Accumulator::new(6), Err(Error::Creation(_))));
    }

    #[test]
    fn reset_clears_counts_and_window_but_keeps_range() {
        let mut acc = Accumulator::with_bounds(1, 1_000, 2).unwrap();
        acc.record(5).unwrap();
        acc.set_start_ms(10);
        acc.set_end_ms(20);
        acc.reset();

        assert!(acc.is_empty());
        assert_eq!(acc.sum(), 0);
        assert_eq!((acc.start_ms(), acc.end_ms()), (0, 0));
        assert_eq!(acc.histogram().high(), 1_000);
    }

    #[test]
    fn add_merges_counts_and_sum() {
        let mut a = Accumulator::new(DEFAULT_SIGFIG).unwrap();
        let mut b = Accumulator::new(DEFAULT_SIGFIG).unwrap();
        a.record(1).unwrap();
        b.record(2).unwrap();
        b.record(3).unwrap();
        a.set_start_ms(7);

        a.add(&b).unwrap();

        assert_eq!(a.count(), 3);
        assert_eq!(a.sum(), 6);
        assert_eq!(a.start_ms(), 7);
    }

    #[test]
    fn add_into_narrower_range_fails() {
        let mut narrow = Accumulator::with_bounds(1, 100, 2).unwrap();
        let mut wide = Accumulator::new(2).unwrap();
        wide.record(1_000_000).unwrap();

        assert!(matches!(narrow.add(&wide), Err(Error::Merge(_))));
    }

    #[test]
    fn record_correct_back_fills_missing_samples() {
        let mut acc = Accumulator::new(DEFAULT_SIGFIG).unwrap();
        acc.record_correct(100, 30).unwrap();

        // 100, then 70, 40 (10 is below the interval)
        assert_eq!(acc.count(), 3);
        assert_eq!(acc.sum(), 210);
    }

    #[test]
    fn record_correct_with_zero_interval_is_plain_record() {
        let mut acc = Accumulator::new(DEFAULT_SIGFIG).unwrap();
        acc.record_correct(100, 0).unwrap();
        assert_eq!(acc.count(), 1);
    }
}
