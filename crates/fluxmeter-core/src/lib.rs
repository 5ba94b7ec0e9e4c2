//! fluxmeter core: transport-agnostic metric primitives, wire model, and errors.
//!
//! This crate defines the label sets, the streaming quantile histogram, and the
//! line-protocol point model shared by the agent and by anything that wants to
//! consume exported batches. It carries no runtime or transport dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Degenerate input (non-finite samples, odd label lists, poisoned locks) is
//! absorbed or surfaced as `MetricsError` so instrumented processes never crash
//! because of their metrics.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod histogram;
pub mod labels;
pub mod protocol;

/// Shared result type.
pub use error::{MetricsError, Result};
pub use histogram::{Bucket, QuantileHistogram, DEFAULT_BUCKETS};
pub use labels::LabelSet;
