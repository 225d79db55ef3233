use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::Observatory;

#[derive(Debug, Clone, Copy)]
pub struct LoadSettings {
    pub workers: u32,
    pub duration: Duration,
    pub read_pct: u8,
    pub expected_interval_us: Option<u64>,
}

// ─── Public entry point ──────────────────────────────────────────

/// Spawns `settings.workers` Tokio tasks that simulate operations until
/// the deadline, then clears the observatory's `running` flag.
pub async fn run(observatory: Arc<Observatory>, settings: LoadSettings) {
    let deadline = Instant::now() + settings.duration;

    let mut handles = Vec::with_capacity(settings.workers as usize);

    for worker_id in 0..settings.workers {
        let observatory = Arc::clone(&observatory);

        handles.push(tokio::spawn(async move {
            worker(worker_id, observatory, deadline, settings).await;
        }));
    }

    for h in handles {
        if let Err(err) = h.await {
            warn!(%err, "worker task failed");
        }
    }

    observatory.running.store(false, Ordering::SeqCst);
    info!("load finished");
}

// ─── Worker loop ─────────────────────────────────────────────────

async fn worker(id: u32, observatory: Arc<Observatory>, deadline: Instant, settings: LoadSettings) {
    // Each worker gets its own deterministic RNG seeded uniquely.
    let mut rng = StdRng::seed_from_u64(1000 + u64::from(id));
    let mut rejected = 0u64;

    while observatory.running.load(Ordering::Relaxed) && Instant::now() < deadline {
        let is_read = rng.gen_range(0u8..100) < settings.read_pct;
        let latency = simulated_latency(&mut rng, is_read);

        // ── Timed section ───────────────────────────────────────
        let t0 = Instant::now();
        tokio::time::sleep(latency).await;
        let elapsed_us = u64::try_from(t0.elapsed().as_micros()).unwrap_or(u64::MAX);
        // ────────────────────────────────────────────────────────

        let recorder = if is_read {
            &observatory.reads
        } else {
            &observatory.writes
        };
        let result = match settings.expected_interval_us {
            Some(interval) => recorder.record_corrected_value(elapsed_us, interval),
            None => recorder.record_value(elapsed_us),
        };
        if let Err(err) = result {
            rejected += 1;
            debug!(worker = id, %err, "sample rejected");
        }
    }

    if rejected > 0 {
        warn!(worker = id, rejected, "samples fell outside the recorder range");
    }
}

/// Reads cluster around 200 μs and writes around 500 μs; one operation in a
/// hundred takes a slow path an order of magnitude longer.
fn simulated_latency(rng: &mut StdRng, is_read: bool) -> Duration {
    let base = if is_read {
        rng.gen_range(100..300u64)
    } else {
        rng.gen_range(300..700u64)
    };
    let us = if rng.gen_bool(0.01) {
        base * rng.gen_range(10..50u64)
    } else {
        base
    };
    Duration::from_micros(us)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_latency_stays_in_band() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let us = simulated_latency(&mut rng, true).as_micros();
            assert!((100..300 * 50).contains(&us));
        }
    }
}
