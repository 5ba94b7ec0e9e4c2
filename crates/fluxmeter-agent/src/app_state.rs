//! Shared state of the agent binary: config, the facade, and draining flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use fluxmeter_core::error::Result;

use crate::config::{AgentConfig, SinkKind};
use crate::export::{BatchWriter, LineWriter};
use crate::influx::Influx;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    influx: Arc<Influx>,
}

struct AppStateInner {
    cfg: AgentConfig,
    draining: AtomicBool,
}

impl AppState {
    /// Build the facade from config. Fails on malformed base tags or batch settings.
    pub fn new(cfg: AgentConfig) -> Result<Self> {
        let influx = Influx::with_histogram_buckets(
            cfg.tags.iter(),
            cfg.batch.clone(),
            cfg.histogram.buckets,
        )?;

        tracing::info!(
            database = %cfg.batch.database,
            precision = cfg.batch.precision.as_str(),
            tags = %influx.tags(),
            "metrics facade ready"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                draining: AtomicBool::new(false),
            }),
            influx: Arc::new(influx),
        })
    }

    pub fn cfg(&self) -> &AgentConfig {
        &self.inner.cfg
    }

    pub fn influx(&self) -> Arc<Influx> {
        Arc::clone(&self.influx)
    }

    /// Open the configured export sink.
    pub fn build_writer(&self) -> Result<Arc<dyn BatchWriter>> {
        let export = &self.inner.cfg.export;
        match (export.sink, export.path.as_deref()) {
            (SinkKind::File, Some(path)) => Ok(Arc::new(LineWriter::append_to(path)?)),
            _ => Ok(Arc::new(LineWriter::stdout())),
        }
    }

    /// Mark draining state.
    pub fn set_draining(&self) {
        self.inner.draining.store(true, Ordering::Relaxed);
    }

    /// Return whether draining is active.
    pub fn is_draining(&self) -> bool {
        self.inner.draining.load(Ordering::Relaxed)
    }

    /// Current snapshot as line protocol.
    pub fn render_metrics(&self) -> String {
        self.influx.snapshot().to_line_protocol()
    }
}
