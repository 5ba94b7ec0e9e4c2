//! Batch sinks.
//!
//! A sink receives exactly one batch per export and reports success or
//! failure for the whole batch. Sinks may block; callers on an async runtime
//! run them on the blocking pool.

use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use fluxmeter_core::error::{MetricsError, Result};
use fluxmeter_core::protocol::BatchPoints;

/// Transport that accepts a batch of points.
pub trait BatchWriter: Send + Sync {
    fn write(&self, bp: &BatchPoints) -> Result<()>;
}

/// Writes line protocol to any `io::Write` (stdout, a file, a socket).
pub struct LineWriter<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> LineWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }
}

impl LineWriter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl LineWriter<std::fs::File> {
    /// Append to `path`, creating it if missing.
    pub fn append_to(path: &str) -> Result<Self> {
        let f = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(f))
    }
}

impl<W: Write + Send> BatchWriter for LineWriter<W> {
    fn write(&self, bp: &BatchPoints) -> Result<()> {
        let buf = bp.encode();
        let mut out = self
            .out
            .lock()
            .map_err(|_| MetricsError::Internal("line writer lock poisoned".into()))?;
        out.write_all(&buf)?;
        out.flush()?;
        Ok(())
    }
}

/// Keeps written line protocol in memory.
#[derive(Default)]
pub struct MemoryWriter {
    buf: Mutex<String>,
    batches: Mutex<usize>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn contents(&self) -> String {
        self.buf.lock().map(|b| b.clone()).unwrap_or_default()
    }

    /// Non-empty lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Number of batches received.
    pub fn batches(&self) -> usize {
        self.batches.lock().map(|n| *n).unwrap_or(0)
    }

    pub fn clear(&self) {
        if let Ok(mut b) = self.buf.lock() {
            b.clear();
        }
    }
}

impl BatchWriter for MemoryWriter {
    fn write(&self, bp: &BatchPoints) -> Result<()> {
        let text = bp.to_line_protocol();
        self.buf
            .lock()
            .map_err(|_| MetricsError::Internal("memory writer lock poisoned".into()))?
            .push_str(&text);
        *self
            .batches
            .lock()
            .map_err(|_| MetricsError::Internal("memory writer lock poisoned".into()))? += 1;
        Ok(())
    }
}
