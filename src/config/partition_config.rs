use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::core::dataset::is_plain_name;
use crate::error::{PartitionError, PartitionResult};

/// Whether the distribute step copies files or moves them out of the source tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyPolicy {
    Copy,
    #[default]
    Move,
}

/// Where source files live relative to the source root
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceLayout {
    /// `<source_root>/<filename>`
    #[default]
    Flat,
    /// `<source_root>/<prefix><NNN>/<inner>/<filename>` for N in `1..=count`
    Sharded {
        prefix: String,
        count: u32,
        width: usize,
        inner: String,
    },
}

impl SourceLayout {
    /// The numbered `images_001/images` .. `images_012/images` layout
    pub fn numbered_shards() -> Self {
        SourceLayout::Sharded {
            prefix: "images_".to_string(),
            count: 12,
            width: 3,
            inner: "images".to_string(),
        }
    }
}

/// Collapses arbitrary labels into a negative/positive pair of classes.
///
/// A label whose separator-delimited parts are exactly `[negative_label]`
/// maps to `negative_class`; everything else maps to `positive_class`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMap {
    pub negative_label: String,
    pub negative_class: String,
    pub positive_class: String,
}

impl Default for CategoryMap {
    fn default() -> Self {
        Self {
            negative_label: "No Finding".to_string(),
            negative_class: "nofinding".to_string(),
            positive_class: "finding".to_string(),
        }
    }
}

/// Every knob of a partitioning run.
///
/// Built from defaults, then an optional JSON config file, then command
/// line overrides. Missing keys in the file fall back to the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    /// Label table with filename and label in the first two columns
    pub label_table: PathBuf,

    /// Whether the first row of the label table is a header
    pub label_table_has_header: bool,

    /// Directory holding the unsorted images
    pub source_root: PathBuf,

    /// How files are laid out under `source_root`
    pub source_layout: SourceLayout,

    /// Label-organized tree written by the distribute step
    pub output_root: PathBuf,

    /// Root of the training/testing split tree
    pub sorted_root: PathBuf,

    /// Root of the down-sampled copy of the split tree
    pub subset_root: PathBuf,

    /// Fraction of each class that goes to training (0.9 = 90%)
    pub split_ratio: f64,

    /// Fraction of each split folder copied into the subset
    pub subset_fraction: f64,

    /// Media file extensions, matched case-insensitively
    pub allowed_extensions: Vec<String>,

    /// Character separating the labels of a multi-label entry
    pub multi_label_separator: char,

    /// Copy or move files during the distribute step
    pub copy_policy: CopyPolicy,

    /// Optional collapse of labels into a negative/positive class pair
    pub category_map: Option<CategoryMap>,

    /// Split directory names, training first and testing second
    pub subset_names: Vec<String>,

    /// Fixed label folders to sample; every folder found when `None`
    pub subset_labels: Option<Vec<String>>,

    /// Per-file run log written by the distribute step
    pub run_log: PathBuf,

    /// Seed for shuffling and sampling; drawn at random when `None`
    pub seed: Option<u64>,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            label_table: PathBuf::from("labels.csv"),
            label_table_has_header: false,
            source_root: PathBuf::from("data"),
            source_layout: SourceLayout::Flat,
            output_root: PathBuf::from("output"),
            sorted_root: PathBuf::from("sorted"),
            subset_root: PathBuf::from("sorted_subset"),
            split_ratio: 0.9,
            subset_fraction: 0.1,
            allowed_extensions: ["png", "jpg", "jpeg", "gif", "bmp"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            multi_label_separator: '|',
            copy_policy: CopyPolicy::Move,
            category_map: None,
            subset_names: vec!["training".to_string(), "testing".to_string()],
            subset_labels: None,
            run_log: PathBuf::from("image_sort_log.txt"),
            seed: None,
        }
    }
}

impl PartitionConfig {
    /// Default location of the config file, e.g. `~/.config/sortsplit/config.json`
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "sortsplit").map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load a config file that the user asked for explicitly. Any failure is fatal.
    pub fn load_file(path: &Path) -> PartitionResult<Self> {
        info!("Loading config from: {:?}", path);
        let contents = fs::read_to_string(path).map_err(|e| PartitionError::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&contents).map_err(|e| PartitionError::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load the config file from the default location, or return defaults
    /// if it doesn't exist or is corrupted
    pub fn discover() -> Self {
        let Some(config_path) = Self::default_config_path() else {
            warn!("Could not determine config directory. Using defaults.");
            return Self::default();
        };

        match fs::read_to_string(&config_path) {
            Ok(contents) => match serde_json::from_str::<PartitionConfig>(&contents) {
                Ok(config) => {
                    info!("Loaded config from: {:?}", config_path);
                    config
                }
                Err(e) => {
                    warn!("Failed to parse config file {:?}: {}. Using defaults.", config_path, e);
                    Self::default()
                }
            },
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to read config file {:?}: {}. Using defaults.", config_path, e);
                }
                Self::default()
            }
        }
    }

    /// Reject values that would make a run meaningless
    pub fn validate(&self) -> PartitionResult<()> {
        if !(0.0..=1.0).contains(&self.split_ratio) {
            return Err(PartitionError::InvalidConfig(format!(
                "split ratio must be within [0, 1], got {}",
                self.split_ratio
            )));
        }
        if !(self.subset_fraction > 0.0 && self.subset_fraction <= 1.0) {
            return Err(PartitionError::InvalidConfig(format!(
                "subset fraction must be within (0, 1], got {}",
                self.subset_fraction
            )));
        }
        if self.allowed_extensions.iter().all(|ext| ext.trim_start_matches('.').is_empty()) {
            return Err(PartitionError::InvalidConfig(
                "at least one allowed extension is required".to_string(),
            ));
        }
        if self.multi_label_separator.is_whitespace() {
            return Err(PartitionError::InvalidConfig(
                "multi-label separator must not be whitespace".to_string(),
            ));
        }
        if self.subset_names.is_empty() {
            return Err(PartitionError::InvalidConfig(
                "at least one subset name is required".to_string(),
            ));
        }
        let subset_labels = self.subset_labels.iter().flatten();
        if let Some(name) = self
            .subset_names
            .iter()
            .chain(subset_labels)
            .find(|name| !is_plain_name(name))
        {
            return Err(PartitionError::InvalidConfig(format!(
                "subset and label names must be plain directory names, got {:?}",
                name
            )));
        }
        if let SourceLayout::Sharded { count, .. } = &self.source_layout {
            if *count == 0 {
                return Err(PartitionError::InvalidConfig(
                    "sharded source layout needs at least one shard".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Name of the training subset, the first entry of `subset_names`
    pub fn training_name(&self) -> &str {
        self.subset_names.first().map(String::as_str).unwrap_or("training")
    }

    /// Name of the testing subset, the second entry of `subset_names`
    pub fn testing_name(&self) -> &str {
        self.subset_names.get(1).map(String::as_str).unwrap_or("testing")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = PartitionConfig::default();
        assert_eq!(config.split_ratio, 0.9);
        assert_eq!(config.subset_fraction, 0.1);
        assert_eq!(config.multi_label_separator, '|');
        assert_eq!(config.copy_policy, CopyPolicy::Move);
        assert_eq!(config.source_layout, SourceLayout::Flat);
        assert_eq!(config.training_name(), "training");
        assert_eq!(config.testing_name(), "testing");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let json = r#"{ "split_ratio": 0.85, "copy_policy": "copy" }"#;
        let config: PartitionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.split_ratio, 0.85);
        assert_eq!(config.copy_policy, CopyPolicy::Copy);
        assert_eq!(config.allowed_extensions.len(), 5);
        assert_eq!(config.run_log, PathBuf::from("image_sort_log.txt"));
    }

    #[test]
    fn test_sharded_layout_from_json() {
        let json = r#"{
            "source_layout": { "kind": "sharded", "prefix": "images_", "count": 12, "width": 3, "inner": "images" }
        }"#;
        let config: PartitionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.source_layout, SourceLayout::numbered_shards());
    }

    #[test]
    fn test_validate_rejects_bad_ratio() {
        let config = PartitionConfig {
            split_ratio: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PartitionError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_zero_fraction() {
        let config = PartitionConfig {
            subset_fraction: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_whitespace_separator() {
        let config = PartitionConfig {
            multi_label_separator: ' ',
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_escaping_subset_label() {
        let config = PartitionConfig {
            subset_labels: Some(vec!["finding".into(), "../..".into()]),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PartitionError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_nested_subset_name() {
        let config = PartitionConfig {
            subset_names: vec!["training".into(), "a/testing".into()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_file_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let err = PartitionConfig::load_file(&path).unwrap_err();
        assert!(matches!(err, PartitionError::ConfigFile { .. }));
    }

    #[test]
    fn test_load_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = PartitionConfig {
            seed: Some(42),
            category_map: Some(CategoryMap::default()),
            ..Default::default()
        };
        fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = PartitionConfig::load_file(&path).unwrap();
        assert_eq!(loaded.seed, Some(42));
        assert_eq!(loaded.category_map, Some(CategoryMap::default()));
    }
}
