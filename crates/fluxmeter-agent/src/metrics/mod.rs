//! Label-scoped metric registry and the handles application code mutates.
//!
//! The registry owns every instance; handles hold shared references to the
//! registry-owned cells plus the key they were resolved from. Deriving a
//! handle with extra labels goes back through the registry's get-or-insert,
//! so equal label sets always land on the same instance.

pub mod handles;
pub mod registry;

pub use handles::{Counter, Gauge, Histogram};
pub use registry::{AtomicF64, MetricKey, Registry, Snapshot};
