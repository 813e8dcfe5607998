//! Label-driven partitioning of image datasets.
//!
//! Reads a `filename,label` table, fans files out into per-label folders,
//! splits every label folder into training/testing sets and samples smaller
//! subsets of the split tree.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;

pub use config::{CategoryMap, CopyPolicy, PartitionConfig, SourceLayout};
pub use error::{PartitionError, PartitionResult};
