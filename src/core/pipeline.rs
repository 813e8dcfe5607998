use rand::Rng;
use serde::Serialize;
use tracing::info;

use super::operations::{
    create_subset, sort_images, split_dataset, DistributeReport, SplitReport, SubsetReport,
};
use crate::config::PartitionConfig;
use crate::error::PartitionResult;

/// Reports of a full sort → split → subset run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub distribute: DistributeReport,
    pub split: SplitReport,
    pub subset: SubsetReport,
}

/// Run every stage in order with one random source
pub fn run_pipeline<R: Rng + ?Sized>(
    config: &PartitionConfig,
    rng: &mut R,
) -> PartitionResult<PipelineReport> {
    let distribute = sort_images(config)?;
    let split = split_dataset(config, rng)?;
    let subset = create_subset(config, rng)?;

    info!(
        "Pipeline finished: {} placed, {} training, {} testing, {} sampled",
        distribute.placed(),
        split.total_training(),
        split.total_testing(),
        subset.total_sampled()
    );

    Ok(PipelineReport {
        distribute,
        split,
        subset,
    })
}
