//! Fractional down-sample of a split tree for quick iteration.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info, info_span, warn};

use super::file_ops::{copy_file, ensure_dir};
use crate::config::PartitionConfig;
use crate::core::dataset::{file_name_of, list_class_dirs, list_media_files, ExtensionFilter};
use crate::error::{PartitionError, PartitionResult};

/// Number of files to sample: `floor(available * fraction)`, but at least one
/// when anything is available
pub fn sample_count(available: usize, fraction: f64) -> usize {
    if available == 0 {
        return 0;
    }
    ((available as f64 * fraction).floor() as usize).clamp(1, available)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubsetEntry {
    pub subset: String,
    pub label: String,
    pub available: usize,
    pub sampled: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SubsetReport {
    pub entries: Vec<SubsetEntry>,
    pub failed: Vec<PathBuf>,
}

impl SubsetReport {
    pub fn total_sampled(&self) -> usize {
        self.entries.iter().map(|e| e.sampled).sum()
    }
}

/// Copy a sample of every `<subset>/<label>` directory of `config.sorted_root`
/// into the same relative location under `config.subset_root`.
///
/// Labels come from `config.subset_labels` when set, otherwise from the class
/// directories found under each subset.
pub fn create_subset<R: Rng + ?Sized>(
    config: &PartitionConfig,
    rng: &mut R,
) -> PartitionResult<SubsetReport> {
    let _span = info_span!("subset").entered();
    config.validate()?;

    if !config.sorted_root.is_dir() {
        return Err(PartitionError::InputRootMissing(config.sorted_root.clone()));
    }

    let filter = ExtensionFilter::new(&config.allowed_extensions);
    let mut report = SubsetReport::default();

    for subset in &config.subset_names {
        let subset_src = config.sorted_root.join(subset);
        let labels = match &config.subset_labels {
            Some(labels) => labels.clone(),
            None if subset_src.is_dir() => list_class_dirs(&subset_src)?,
            None => {
                warn!("Subset directory {:?} not found, skipping", subset_src);
                continue;
            }
        };

        for label in labels {
            let src_path = subset_src.join(&label);
            let dest_path = config.subset_root.join(subset).join(&label);

            let files = if src_path.is_dir() {
                list_media_files(&src_path, &filter)?
            } else {
                warn!("{:?} not found, sampling nothing", src_path);
                Vec::new()
            };
            ensure_dir(&dest_path)?;

            let count = sample_count(files.len(), config.subset_fraction);
            let mut sampled = 0;
            for image_path in files.choose_multiple(rng, count) {
                match copy_file(image_path, &dest_path.join(file_name_of(image_path))) {
                    Ok(()) => sampled += 1,
                    Err(e) => {
                        error!("{}", e);
                        report.failed.push(image_path.clone());
                    }
                }
            }

            info!("Copied {} images to {:?}", sampled, dest_path);
            report.entries.push(SubsetEntry {
                subset: subset.clone(),
                label,
                available: files.len(),
                sampled,
            });
        }
    }

    Ok(report)
}
