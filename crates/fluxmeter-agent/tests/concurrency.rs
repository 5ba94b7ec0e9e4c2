//! Concurrent writers and concurrent label derivation.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::{Arc, Barrier};
use std::thread;

use fluxmeter_agent::{Influx, MemoryWriter};
use fluxmeter_core::protocol::BatchConfig;

const THREADS: usize = 8;
const PER_THREAD: u32 = 2_000;

fn influx() -> Arc<Influx> {
    Arc::new(Influx::new([("svc", "test")], BatchConfig::default()).unwrap())
}

#[test]
fn concurrent_adds_are_not_lost() {
    let influx = influx();
    let counter = influx.new_counter("hits");
    let barrier = Arc::new(Barrier::new(THREADS));

    let workers: Vec<_> = (0..THREADS)
        .map(|_| {
            let counter = counter.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..PER_THREAD {
                    counter.add(1.0);
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    assert_eq!(counter.value(), (THREADS as f64) * f64::from(PER_THREAD));
}

#[test]
fn concurrent_with_resolves_to_one_instance() {
    let influx = influx();
    let base = influx.new_histogram("latency");
    let barrier = Arc::new(Barrier::new(THREADS));

    let workers: Vec<_> = (0..THREADS)
        .map(|t| {
            let base = base.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                // alternate argument order; the label set is the same
                let h = if t % 2 == 0 {
                    base.with(&["k", "v", "route", "/x"])
                } else {
                    base.with(&["route", "/x", "k", "v"])
                };
                for i in 0..PER_THREAD {
                    h.observe(f64::from(i));
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    let observer = base.with(&["k", "v"]).with(&["route", "/x"]);
    assert_eq!(observer.count(), (THREADS as u64) * u64::from(PER_THREAD));
    assert_eq!(influx.registry().len(), 1);

    let w = MemoryWriter::new();
    influx.write_to(&w).unwrap();
    assert!(w
        .lines()
        .iter()
        .all(|l| l.starts_with("latency,svc=test,k=v,route=/x ")));
}

#[test]
fn exports_can_race_with_writers() {
    let influx = influx();
    let gauge = influx.new_gauge("depth");
    gauge.set(0.0);

    let writer = {
        let gauge = gauge.clone();
        thread::spawn(move || {
            for _ in 0..PER_THREAD {
                gauge.add(1.0);
            }
        })
    };
    let exporter = {
        let influx = Arc::clone(&influx);
        thread::spawn(move || {
            let w = MemoryWriter::new();
            for _ in 0..50 {
                influx.write_to(&w).unwrap();
            }
            w.batches()
        })
    };

    writer.join().unwrap();
    assert_eq!(exporter.join().unwrap(), 50);
    assert_eq!(gauge.value(), f64::from(PER_THREAD));
}
