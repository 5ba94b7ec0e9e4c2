//! Wire model for exported metrics (InfluxDB line protocol).
//!
//! - `batch`: batch-level settings (database, retention policy, precision,
//!   write consistency) and the point batch handed to sinks.
//! - `line`: the `Point` record and its line-protocol encoding.
//!
//! Encoding is infallible: non-finite field values are skipped instead of
//! producing lines a server would reject.

pub mod batch;
pub mod line;

pub use batch::{BatchConfig, BatchPoints, Consistency, Precision};
pub use line::{is_writable_tag, Point, RESERVED_TAG_KEYS};
