mod partition_config;

pub use partition_config::{CategoryMap, CopyPolicy, PartitionConfig, SourceLayout};
