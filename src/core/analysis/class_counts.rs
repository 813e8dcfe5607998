use serde::Serialize;
use std::path::Path;
use tracing::{info, info_span};

use crate::core::dataset::{list_class_dirs, list_media_files, ExtensionFilter};
use crate::error::{PartitionError, PartitionResult};

/// Number of media files in one class directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassCount {
    pub label: String,
    pub count: usize,
}

/// Training/testing counts for one class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassSplitCount {
    pub label: String,
    pub training: usize,
    pub testing: usize,
}

impl ClassSplitCount {
    pub fn total(&self) -> usize {
        self.training + self.testing
    }
}

/// Distribution of a whole split tree
#[derive(Debug, Clone, Default, Serialize)]
pub struct SplitDistribution {
    pub classes: Vec<ClassSplitCount>,
    pub total_training: usize,
    pub total_testing: usize,
}

impl SplitDistribution {
    pub fn total(&self) -> usize {
        self.total_training + self.total_testing
    }

    /// Percentage of all files that landed in training
    pub fn training_percentage(&self) -> f32 {
        if self.total() == 0 {
            return 0.0;
        }
        (self.total_training as f32 / self.total() as f32) * 100.0
    }
}

fn count_dir(dir: &Path, filter: &ExtensionFilter) -> PartitionResult<usize> {
    if !dir.is_dir() {
        return Ok(0);
    }
    Ok(list_media_files(dir, filter)?.len())
}

/// Count media files per class under a label-organized tree.
///
/// Classes without any media file are left out. Sorted by count descending,
/// then by label.
pub fn count_label_tree(root: &Path, filter: &ExtensionFilter) -> PartitionResult<Vec<ClassCount>> {
    let _span = info_span!("stats").entered();
    if !root.is_dir() {
        return Err(PartitionError::InputRootMissing(root.to_path_buf()));
    }

    let mut counts = Vec::new();
    for label in list_class_dirs(root)? {
        let count = count_dir(&root.join(&label), filter)?;
        if count > 0 {
            counts.push(ClassCount { label, count });
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));

    info!("Counted {} classes under {:?}", counts.len(), root);
    Ok(counts)
}

/// Count training/testing files per class of a split tree.
///
/// Classes are those found under the training directory. A class missing
/// from the testing directory counts as zero there.
pub fn count_split_tree(
    sorted_root: &Path,
    training_name: &str,
    testing_name: &str,
    filter: &ExtensionFilter,
) -> PartitionResult<SplitDistribution> {
    let _span = info_span!("stats").entered();
    let train_dir = sorted_root.join(training_name);
    let test_dir = sorted_root.join(testing_name);

    for dir in [&train_dir, &test_dir] {
        if !dir.is_dir() {
            return Err(PartitionError::InputRootMissing(dir.clone()));
        }
    }

    let mut distribution = SplitDistribution::default();
    for label in list_class_dirs(&train_dir)? {
        let training = count_dir(&train_dir.join(&label), filter)?;
        let testing = count_dir(&test_dir.join(&label), filter)?;
        distribution.total_training += training;
        distribution.total_testing += testing;
        distribution.classes.push(ClassSplitCount {
            label,
            training,
            testing,
        });
    }

    info!(
        "Split tree {:?}: {} training, {} testing ({:.1}% training)",
        sorted_root,
        distribution.total_training,
        distribution.total_testing,
        distribution.training_percentage()
    );
    Ok(distribution)
}

/// Plain-text horizontal bars, one line per row, scaled so the largest value
/// spans `width` characters
pub fn render_bars(rows: &[(String, usize)], width: usize) -> String {
    let max = rows.iter().map(|(_, v)| *v).max().unwrap_or(0);
    let label_width = rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);

    let mut out = String::new();
    for (label, value) in rows {
        let bar_len = if max == 0 { 0 } else { value * width / max };
        out.push_str(&format!(
            "{:<label_width$} | {} {}\n",
            label,
            "#".repeat(bar_len),
            value,
            label_width = label_width
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn populate(dir: &Path, names: &[&str]) {
        fs::create_dir_all(dir).unwrap();
        for name in names {
            fs::write(dir.join(name), b"x").unwrap();
        }
    }

    fn images() -> ExtensionFilter {
        ExtensionFilter::new(["png", "jpg", "jpeg", "gif", "bmp"])
    }

    #[test]
    fn test_count_label_tree_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        populate(&dir.path().join("cat"), &["a.png", "b.PNG", "notes.txt"]);
        populate(&dir.path().join("dog"), &["a.jpg", "b.jpg", "c.bmp"]);
        populate(&dir.path().join("ant"), &["a.gif", "b.gif"]);
        populate(&dir.path().join("empty"), &["readme.md"]);

        let counts = count_label_tree(dir.path(), &images()).unwrap();
        let rows: Vec<(&str, usize)> = counts.iter().map(|c| (c.label.as_str(), c.count)).collect();
        assert_eq!(rows, vec![("dog", 3), ("ant", 2), ("cat", 2)]);
    }

    #[test]
    fn test_count_split_tree() {
        let dir = tempfile::tempdir().unwrap();
        populate(&dir.path().join("training/cat"), &["1.png", "2.png", "3.png"]);
        populate(&dir.path().join("testing/cat"), &["4.png"]);
        populate(&dir.path().join("training/dog"), &["1.png"]);
        fs::create_dir_all(dir.path().join("testing")).unwrap();

        let dist = count_split_tree(dir.path(), "training", "testing", &images()).unwrap();
        assert_eq!(dist.classes.len(), 2);
        assert_eq!(dist.classes[0].total(), 4);
        assert_eq!(dist.classes[1].testing, 0);
        assert_eq!(dist.total_training, 4);
        assert_eq!(dist.total_testing, 1);
        assert_eq!(dist.training_percentage(), 80.0);
    }

    #[test]
    fn test_count_split_tree_requires_both_roots() {
        let dir = tempfile::tempdir().unwrap();
        populate(&dir.path().join("training/cat"), &["1.png"]);
        let err = count_split_tree(dir.path(), "training", "testing", &images()).unwrap_err();
        assert!(matches!(err, PartitionError::InputRootMissing(_)));
    }

    #[test]
    fn test_render_bars_scales_to_width() {
        let rows = vec![("dog".to_string(), 10), ("cat".to_string(), 5)];
        let text = render_bars(&rows, 10);
        assert_eq!(text, "dog | ########## 10\ncat | ##### 5\n");
    }
}
