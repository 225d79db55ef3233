use chrono::{DateTime, Utc};
use interval_recorder::{Accumulator, Error, IntervalHistogram, PercentileSet, Recorder};
use serde::Serialize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;
use tracing::warn;

use crate::Observatory;

/// One line of reporter output.
#[derive(Debug, Clone, Serialize)]
pub struct IntervalReport {
    pub kind: &'static str,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub percentiles: PercentileSet,
}

/// Every interval of the run merged together.
pub struct Totals {
    pub reads: Accumulator,
    pub writes: Accumulator,
}

// ─── Interval loop ───────────────────────────────────────────────
/// Ticks every `every`, printing one JSON line per recorder and tick.
/// Returns after the first tick that finds the load stopped, so the last
/// partial interval is drained too.

pub async fn run(observatory: Arc<Observatory>, every: Duration) -> Result<Totals, Error> {
    let mut ticks = IntervalStream::new(tokio::time::interval(every));
    let mut reads = Feed::new("read")?;
    let mut writes = Feed::new("write")?;

    while ticks.next().await.is_some() {
        let finished = !observatory.running.load(Ordering::SeqCst);

        reads.sample(&observatory.reads)?;
        writes.sample(&observatory.writes)?;

        if finished {
            break;
        }
    }

    Ok(Totals {
        reads: reads.total,
        writes: writes.total,
    })
}

/// Per-recorder reporting state: the snapshot to recycle next tick and the
/// running total.
struct Feed {
    kind: &'static str,
    recycled: Option<IntervalHistogram>,
    total: Accumulator,
}

impl Feed {
    fn new(kind: &'static str) -> Result<Self, Error> {
        Ok(Self {
            kind,
            recycled: None,
            total: Accumulator::new(interval_recorder::accumulator::DEFAULT_SIGFIG)?,
        })
    }

    fn sample(&mut self, recorder: &Recorder) -> Result<(), Error> {
        let interval = recorder.interval_histogram(self.recycled.take())?;

        if self.total.start_ms() == 0 {
            self.total.set_start_ms(interval.start_ms());
        }
        self.total.add(&interval)?;
        self.total.set_end_ms(interval.end_ms());

        let report = IntervalReport::new(self.kind, &interval);
        match serde_json::to_string(&report) {
            Ok(line) => println!("{line}"),
            Err(err) => warn!(%err, kind = self.kind, "cannot encode interval report"),
        }

        self.recycled = Some(interval);
        Ok(())
    }
}

impl IntervalReport {
    fn new(kind: &'static str, interval: &Accumulator) -> Self {
        Self {
            kind,
            start: timestamp(interval.start_ms()),
            end: timestamp(interval.end_ms()),
            percentiles: PercentileSet::from_accumulator(interval),
        }
    }
}

fn timestamp(ms: u64) -> DateTime<Utc> {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or_default()
}
