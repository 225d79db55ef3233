use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use interval_recorder::{Accumulator, Error, PercentileSet, Recorder, RecorderConfig};

#[test]
fn scripted_clock_windows() {
    let ticks = Arc::new(AtomicU64::new(1_000));
    let clock = {
        let ticks = Arc::clone(&ticks);
        move || ticks.fetch_add(1_000, Ordering::SeqCst)
    };
    let recorder = Recorder::with_clock(RecorderConfig::with_precision(3), clock).unwrap();

    for v in [10, 20, 30] {
        recorder.record_value(v).unwrap();
    }
    let first = recorder.interval_histogram(None).unwrap();
    assert_eq!((first.count(), first.sum()), (3, 60));
    assert_eq!((first.start_ms(), first.end_ms()), (1_000, 2_000));

    recorder.record_value(5).unwrap();
    let second = recorder.interval_histogram(Some(first)).unwrap();
    assert_eq!((second.count(), second.sum()), (1, 5));
    assert_eq!((second.start_ms(), second.end_ms()), (2_000, 3_000));

    assert_eq!(ticks.load(Ordering::SeqCst), 4_000);
}

#[test]
fn snapshots_do_not_cross_recorders() {
    let a = Recorder::new(2).unwrap();
    let b = Recorder::new(2).unwrap();
    assert_ne!(a.instance_id(), b.instance_id());

    let from_a = a.interval_histogram(None).unwrap();
    assert_eq!(from_a.owner(), a.instance_id());
    assert!(matches!(
        b.interval_histogram(Some(from_a)),
        Err(Error::IdentityMismatch { .. })
    ));
}

#[test]
fn recorder_is_shareable_across_threads() {
    let recorder = Arc::new(Recorder::new(3).unwrap());
    let writers: Vec<_> = (0..3)
        .map(|_| {
            let recorder = Arc::clone(&recorder);
            thread::spawn(move || {
                for v in 1..=1_000 {
                    recorder.record_value(v).unwrap();
                }
            })
        })
        .collect();

    let mut total = Accumulator::new(3).unwrap();
    for _ in 0..10 {
        recorder.interval_histogram_into(&mut total).unwrap();
    }
    for writer in writers {
        writer.join().unwrap();
    }
    recorder.interval_histogram_into(&mut total).unwrap();

    assert_eq!(total.count(), 3_000);
    assert_eq!(total.sum(), 3 * 500_500);

    let summary = PercentileSet::from_accumulator(&total);
    assert_eq!((summary.min, summary.max), (1, 1_000));
}
