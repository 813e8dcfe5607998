//! Fans labelled files out into `output_root/<class>/<filename>`.

use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use tracing::{error, info, info_span, warn};

use super::file_ops::{ensure_dir, transfer_file};
use crate::config::{CategoryMap, CopyPolicy, PartitionConfig};
use crate::core::dataset::{is_plain_name, read_label_table, LabelIndex, SourceLocator};
use crate::core::run_log::RunLog;
use crate::error::PartitionResult;

/// What a label turns into at distribution time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassResolution {
    /// Place the file under this class directory
    Class(String),
    /// Label names several classes; the file is skipped
    MultiLabel,
    /// Label cannot be used as a directory name
    InvalidName,
}

/// Turn a raw label into a destination class.
///
/// With a category map every label collapses to one of two classes, so
/// multi-label exclusion never applies.
pub fn resolve_class(
    label: &str,
    separator: char,
    category_map: Option<&CategoryMap>,
) -> ClassResolution {
    let class = match category_map {
        Some(map) => {
            let mut parts = label.split(separator).map(str::trim);
            let only_negative = parts.next() == Some(map.negative_label.as_str())
                && parts.next().is_none();
            if only_negative {
                map.negative_class.clone()
            } else {
                map.positive_class.clone()
            }
        }
        None => {
            if label.contains(separator) {
                return ClassResolution::MultiLabel;
            }
            label.to_string()
        }
    };

    if is_plain_name(&class) {
        ClassResolution::Class(class)
    } else {
        ClassResolution::InvalidName
    }
}

/// Outcome of one file, as written to the run log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DistributeStatus {
    Copied,
    Moved,
    NotFound,
    Skipped,
    Failed,
}

impl DistributeStatus {
    pub fn as_str(&self) -> &str {
        match self {
            DistributeStatus::Copied => "Copied",
            DistributeStatus::Moved => "Moved",
            DistributeStatus::NotFound => "Not Found",
            DistributeStatus::Skipped => "Skipped",
            DistributeStatus::Failed => "Failed",
        }
    }

    fn placed(policy: CopyPolicy) -> Self {
        match policy {
            CopyPolicy::Copy => DistributeStatus::Copied,
            CopyPolicy::Move => DistributeStatus::Moved,
        }
    }
}

/// Summary of a distribute run
#[derive(Debug, Clone, Default, Serialize)]
pub struct DistributeReport {
    pub processed: usize,
    pub copied: usize,
    pub moved: usize,
    pub not_found: Vec<String>,
    pub multi_label_skipped: Vec<String>,
    pub invalid_label: Vec<String>,
    pub failed: Vec<String>,
    /// Files placed per class
    pub per_class: BTreeMap<String, usize>,
}

impl DistributeReport {
    /// Files that ended up in a class directory
    pub fn placed(&self) -> usize {
        self.copied + self.moved
    }
}

/// Place every indexed file into its class directory under `config.output_root`.
///
/// Per-file problems are logged and counted, never returned. Only a failure
/// to write the run log aborts the batch.
pub fn distribute_files<W: Write>(
    index: &LabelIndex,
    locator: &SourceLocator,
    config: &PartitionConfig,
    run_log: &mut RunLog<W>,
) -> PartitionResult<DistributeReport> {
    let mut report = DistributeReport::default();
    let separator = config.multi_label_separator;

    for record in index.iter() {
        report.processed += 1;
        let filename = record.filename.as_str();
        let label = record.label.as_str();

        let class = match resolve_class(label, separator, config.category_map.as_ref()) {
            ClassResolution::Class(class) => class,
            ClassResolution::MultiLabel => {
                warn!("Skipping {}: label contains '{}' (multi-label)", filename, separator);
                run_log.record(filename, label, None, DistributeStatus::Skipped.as_str())?;
                report.multi_label_skipped.push(filename.to_string());
                continue;
            }
            ClassResolution::InvalidName => {
                warn!("Skipping {}: label {:?} is not a valid directory name", filename, label);
                run_log.record(filename, label, None, DistributeStatus::Skipped.as_str())?;
                report.invalid_label.push(filename.to_string());
                continue;
            }
        };

        let Some(src_path) = locator.locate(filename) else {
            warn!("{} not found in source directory", filename);
            run_log.record(filename, label, None, DistributeStatus::NotFound.as_str())?;
            report.not_found.push(filename.to_string());
            continue;
        };

        let dest_folder = config.output_root.join(&class);
        let dest_path = dest_folder.join(filename);

        match transfer_file(&src_path, &dest_path, config.copy_policy) {
            Ok(()) => {
                let status = DistributeStatus::placed(config.copy_policy);
                info!("{} {} → {:?}", status.as_str(), filename, dest_folder);
                run_log.record(filename, label, Some(&class), status.as_str())?;
                match status {
                    DistributeStatus::Copied => report.copied += 1,
                    _ => report.moved += 1,
                }
                *report.per_class.entry(class).or_insert(0) += 1;
            }
            Err(e) => {
                error!("Failed to place {}: {}", filename, e);
                run_log.record(filename, label, None, DistributeStatus::Failed.as_str())?;
                report.failed.push(filename.to_string());
            }
        }
    }

    Ok(report)
}

/// Read the label table and distribute the files it names.
///
/// An unreadable table, a missing source root or an invalid configuration
/// fails the run before any file is touched.
pub fn sort_images(config: &PartitionConfig) -> PartitionResult<DistributeReport> {
    let _span = info_span!("distribute").entered();

    config.validate()?;
    let table = read_label_table(&config.label_table, config.label_table_has_header)?;
    let locator = SourceLocator::new(&config.source_root, config.source_layout.clone())?;

    ensure_dir(&config.output_root)?;
    let mut run_log = RunLog::create(&config.run_log)?;

    let report = distribute_files(&table.index, &locator, config, &mut run_log)?;
    run_log.flush()?;

    info!(
        "Done sorting: {} placed, {} not found, {} multi-label skipped, {} failed. Log written to {:?}",
        report.placed(),
        report.not_found.len(),
        report.multi_label_skipped.len(),
        report.failed.len(),
        config.run_log
    );

    Ok(report)
}
