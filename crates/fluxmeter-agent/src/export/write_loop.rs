//! Periodic export driven by a tokio interval.
//!
//! Each tick snapshots the facade and hands the batch to the sink on the
//! blocking pool. Failures are logged and the loop keeps ticking; nothing is
//! buffered for retry. When the shutdown signal flips, one final flush runs.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tokio::time::{Duration, MissedTickBehavior};

use crate::export::BatchWriter;
use crate::influx::Influx;
use crate::metrics::{Counter, Histogram};

struct LoopMetrics {
    exports: Counter,
    duration: Histogram,
}

pub struct WriteLoop {
    influx: Arc<Influx>,
    writer: Arc<dyn BatchWriter>,
    every: Duration,
    metrics: Option<LoopMetrics>,
}

impl WriteLoop {
    pub fn new(influx: Arc<Influx>, writer: Arc<dyn BatchWriter>, every: Duration) -> Self {
        Self {
            influx,
            writer,
            every,
            metrics: None,
        }
    }

    /// Record `fluxmeter_exports{result=ok|error}` and
    /// `fluxmeter_export_seconds` on the exported facade itself.
    pub fn with_self_metrics(mut self) -> Self {
        self.metrics = Some(LoopMetrics {
            exports: self.influx.new_counter("fluxmeter_exports"),
            duration: self.influx.new_histogram("fluxmeter_export_seconds"),
        });
        self
    }

    /// Run until `shutdown` becomes `true` (or its sender is dropped).
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut tick = tokio::time::interval(self.every);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        tick.tick().await;

        tracing::info!(every_ms = self.every.as_millis() as u64, "write loop started");

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self.flush().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.flush().await;
        tracing::info!("write loop stopped");
    }

    /// Export once; returns whether the sink accepted the batch.
    pub async fn flush(&self) -> bool {
        let influx = Arc::clone(&self.influx);
        let writer = Arc::clone(&self.writer);
        let started = Instant::now();

        let res = tokio::task::spawn_blocking(move || influx.write_to(writer.as_ref())).await;
        let elapsed = started.elapsed();

        let ok = match res {
            Ok(Ok(points)) => {
                tracing::debug!(points, elapsed_ms = elapsed.as_millis() as u64, "metrics exported");
                true
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, class = e.class().as_str(), "metrics export failed");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "metrics export task failed");
                false
            }
        };

        if let Some(m) = &self.metrics {
            m.exports.with(&["result", if ok { "ok" } else { "error" }]).add(1.0);
            m.duration.observe(elapsed.as_secs_f64());
        }
        ok
    }
}
