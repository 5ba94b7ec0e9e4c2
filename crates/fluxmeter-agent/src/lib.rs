//! fluxmeter agent library entry.
//!
//! This crate wires the label-scoped registry, the `Influx` facade, export
//! sinks, and the periodic write loop into one instrumentation stack, plus the
//! config loader and ops endpoints used by the `fluxmeter-agent` binary. It is
//! consumed by the binary (`main.rs`), by embedding applications, and by
//! integration tests.

pub mod app_state;
pub mod config;
pub mod export;
pub mod influx;
pub mod metrics;
pub mod ops;
pub mod router;

pub use export::{BatchWriter, LineWriter, MemoryWriter, WriteLoop};
pub use influx::Influx;
pub use metrics::{Counter, Gauge, Histogram};
