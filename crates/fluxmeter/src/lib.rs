//! Top-level facade crate for fluxmeter.
//!
//! Re-exports the core primitives and the agent library so users can depend on a single crate.

pub mod core {
    pub use fluxmeter_core::*;
}

pub mod agent {
    pub use fluxmeter_agent::*;
}

pub use fluxmeter_agent::{Counter, Gauge, Histogram, Influx};
