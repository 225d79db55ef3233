//! Interval recording of latency-style measurements.
//!
//! Producers call [`Recorder::record_value`] as often as they like; a consumer
//! periodically calls [`Recorder::interval_histogram`] (or
//! [`Recorder::interval_histogram_into`]) to get everything recorded since the
//! previous call as one frozen [`Accumulator`]. Recording is never paused, and
//! every value lands in exactly one interval.
//!
//! ```
//! use interval_recorder::Recorder;
//!
//! let recorder = Recorder::new(3)?;
//! recorder.record_value(250)?;
//! recorder.record_value(410)?;
//!
//! let interval = recorder.interval_histogram(None)?;
//! assert_eq!(interval.count(), 2);
//!
//! // Hand the snapshot back to avoid an allocation next time.
//! let next = recorder.interval_histogram(Some(interval))?;
//! assert!(next.is_empty());
//! # Ok::<(), interval_recorder::Error>(())
//! ```

pub mod accumulator;
pub mod clock;
pub mod config;
pub mod error;
pub mod percentiles;
pub mod recorder;

pub use accumulator::Accumulator;
pub use clock::{Clock, WallClock};
pub use config::RecorderConfig;
pub use error::Error;
pub use percentiles::PercentileSet;
pub use recorder::{InstanceId, IntervalHistogram, Recorder};
