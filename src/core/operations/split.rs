//! Per-class training/testing split of a label-organized tree.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, info_span};

use super::file_ops::{copy_file, ensure_dir};
use crate::config::PartitionConfig;
use crate::core::dataset::{file_name_of, list_class_dirs, list_media_files, ExtensionFilter};
use crate::error::{PartitionError, PartitionResult};

/// Index at which a class of `count` files is cut: `floor(count * ratio)`
pub fn split_index(count: usize, ratio: f64) -> usize {
    ((count as f64 * ratio).floor() as usize).min(count)
}

/// Shuffle `files` and cut them into (training, testing)
pub fn partition_files<R: Rng + ?Sized>(
    mut files: Vec<PathBuf>,
    ratio: f64,
    rng: &mut R,
) -> (Vec<PathBuf>, Vec<PathBuf>) {
    files.shuffle(rng);
    let cut = split_index(files.len(), ratio);
    let testing = files.split_off(cut);
    (files, testing)
}

/// Split counts for one class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassSplit {
    pub label: String,
    pub total: usize,
    pub training: usize,
    pub testing: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SplitReport {
    pub classes: Vec<ClassSplit>,
    /// Files that could not be copied
    pub failed: Vec<PathBuf>,
}

impl SplitReport {
    pub fn total_training(&self) -> usize {
        self.classes.iter().map(|c| c.training).sum()
    }

    pub fn total_testing(&self) -> usize {
        self.classes.iter().map(|c| c.testing).sum()
    }
}

fn copy_all(files: &[PathBuf], dest_dir: &Path, failed: &mut Vec<PathBuf>) -> usize {
    let mut copied = 0;
    for src in files {
        let dest = dest_dir.join(file_name_of(src));
        match copy_file(src, &dest) {
            Ok(()) => copied += 1,
            Err(e) => {
                error!("{}", e);
                failed.push(src.clone());
            }
        }
    }
    copied
}

/// Split every class directory of `config.output_root` into
/// `config.sorted_root/<training>/<label>` and `config.sorted_root/<testing>/<label>`.
///
/// Files are copied, so the class directories stay the source of truth. Each
/// class is split on its own at `config.split_ratio`.
pub fn split_dataset<R: Rng + ?Sized>(
    config: &PartitionConfig,
    rng: &mut R,
) -> PartitionResult<SplitReport> {
    let _span = info_span!("split").entered();
    config.validate()?;

    let input_root = &config.output_root;
    if !input_root.is_dir() {
        return Err(PartitionError::InputRootMissing(input_root.clone()));
    }

    let filter = ExtensionFilter::new(&config.allowed_extensions);
    let train_root = config.sorted_root.join(config.training_name());
    let test_root = config.sorted_root.join(config.testing_name());

    let mut report = SplitReport::default();

    for label in list_class_dirs(input_root)? {
        let files = list_media_files(&input_root.join(&label), &filter)?;
        let total = files.len();

        let train_dir = train_root.join(&label);
        let test_dir = test_root.join(&label);
        ensure_dir(&train_dir)?;
        ensure_dir(&test_dir)?;

        let (training, testing) = partition_files(files, config.split_ratio, rng);
        let training = copy_all(&training, &train_dir, &mut report.failed);
        let testing = copy_all(&testing, &test_dir, &mut report.failed);

        info!("{}: {} training, {} testing of {}", label, training, testing, total);
        report.classes.push(ClassSplit {
            label,
            total,
            training,
            testing,
        });
    }

    info!(
        "Data has been split into training and testing sets: {} / {}",
        report.total_training(),
        report.total_testing()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use std::fs;

    fn names(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("{i:03}.png"))).collect()
    }

    #[test]
    fn test_split_index_truncates() {
        for ratio in [0.85, 0.9] {
            for count in [0usize, 1, 5, 17] {
                let expected = (count as f64 * ratio).floor() as usize;
                assert_eq!(split_index(count, ratio), expected);
            }
        }
        assert_eq!(split_index(17, 0.85), 14);
        assert_eq!(split_index(17, 0.9), 15);
        assert_eq!(split_index(5, 0.9), 4);
        assert_eq!(split_index(1, 0.9), 0);
    }

    #[test]
    fn test_partition_is_complete_and_disjoint() {
        let mut rng = StdRng::seed_from_u64(7);
        let files = names(17);
        let (train, test) = partition_files(files.clone(), 0.85, &mut rng);

        assert_eq!(train.len(), 14);
        assert_eq!(test.len(), 3);
        let train_set: HashSet<_> = train.iter().collect();
        let test_set: HashSet<_> = test.iter().collect();
        assert!(train_set.is_disjoint(&test_set));
        let union: HashSet<_> = train_set.union(&test_set).cloned().collect();
        let expected: HashSet<_> = files.iter().collect();
        assert_eq!(union, expected);
    }

    #[test]
    fn test_partition_is_deterministic_under_seed() {
        let a = partition_files(names(10), 0.9, &mut StdRng::seed_from_u64(42));
        let b = partition_files(names(10), 0.9, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_split_dataset_copies_and_handles_empty_class() {
        let dir = tempfile::tempdir().unwrap();
        let config = PartitionConfig {
            output_root: dir.path().join("output"),
            sorted_root: dir.path().join("sorted"),
            split_ratio: 0.9,
            ..Default::default()
        };
        let cat = config.output_root.join("cat");
        fs::create_dir_all(&cat).unwrap();
        for i in 0..5 {
            fs::write(cat.join(format!("{i}.png")), b"x").unwrap();
        }
        fs::write(cat.join("notes.txt"), b"x").unwrap();
        fs::create_dir_all(config.output_root.join("empty")).unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        let report = split_dataset(&config, &mut rng).unwrap();

        assert_eq!(
            report.classes,
            vec![
                ClassSplit { label: "cat".into(), total: 5, training: 4, testing: 1 },
                ClassSplit { label: "empty".into(), total: 0, training: 0, testing: 0 },
            ]
        );
        // Source of truth untouched
        assert_eq!(fs::read_dir(&cat).unwrap().count(), 6);
        assert_eq!(fs::read_dir(config.sorted_root.join("training/cat")).unwrap().count(), 4);
        assert_eq!(fs::read_dir(config.sorted_root.join("testing/cat")).unwrap().count(), 1);
        assert!(config.sorted_root.join("training/empty").is_dir());
        assert!(!config.sorted_root.join("training/cat/notes.txt").exists());
        assert!(!config.sorted_root.join("testing/cat/notes.txt").exists());
    }

    #[test]
    fn test_split_dataset_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let config = PartitionConfig {
            output_root: dir.path().join("nope"),
            sorted_root: dir.path().join("sorted"),
            ..Default::default()
        };
        let err = split_dataset(&config, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert!(matches!(err, PartitionError::InputRootMissing(_)));
    }
}
