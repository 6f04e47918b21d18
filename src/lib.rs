//! Deterministic train/validation/test splitting for tabular datasets.
//!
//! The `partition` module holds the pure splitting logic; `io`, `config`
//! and `runtime` wrap it into the `dsplit` command.

pub mod config;
pub mod dataset;
pub mod io;
pub mod partition;
pub mod runtime;

pub use config::SplitConfig;
pub use dataset::{Dataset, Row, Value};
pub use partition::{partition, Partition, Partitioner, SplitError, SplitOptions};
