//! Export side: sinks that accept point batches, and the periodic write loop.

pub mod sink;
pub mod write_loop;

pub use sink::{BatchWriter, LineWriter, MemoryWriter};
pub use write_loop::WriteLoop;
