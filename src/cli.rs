use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{CategoryMap, CopyPolicy, PartitionConfig, SourceLayout};

#[derive(Parser, Debug)]
#[command(
    name = "sortsplit",
    version,
    about = "Sort labelled images into class folders, split them into training/testing sets and sample subsets"
)]
pub struct Cli {
    /// JSON config file. Without it the per-user config file is used when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Seed for shuffling and sampling (random when omitted; the chosen seed is logged).
    #[arg(long, global = true)]
    pub seed: Option<u64>,
    /// Also write a timestamped log file into this directory.
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,
    /// Debug-level logging (RUST_LOG takes precedence).
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
    /// Print the operation report as JSON on stdout.
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Distribute files named in a label table into per-label folders.
    Sort(SortArgs),
    /// Split each label folder into training and testing sets.
    Split(SplitArgs),
    /// Copy a random fraction of a split tree into a parallel tree.
    Subset(SubsetArgs),
    /// Count images per label in a label tree or a split tree.
    Stats(StatsArgs),
    /// Sort, split and subset in one go.
    Run(RunArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct SortArgs {
    /// Label table (filename,label).
    #[arg(long)]
    pub csv: Option<PathBuf>,
    /// Directory containing the images to sort.
    #[arg(long)]
    pub source: Option<PathBuf>,
    /// Base directory for labelled folders.
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Copy files instead of moving them.
    #[arg(long, conflicts_with = "move_files", default_value_t = false)]
    pub copy: bool,
    /// Move files out of the source directory.
    #[arg(long = "move", default_value_t = false)]
    pub move_files: bool,
    /// Search images_001/images .. images_012/images under the source directory.
    #[arg(long, default_value_t = false)]
    pub sharded: bool,
    /// The label table starts with a header row.
    #[arg(long, default_value_t = false)]
    pub header: bool,
    /// Where to write the per-file run log.
    #[arg(long)]
    pub run_log: Option<PathBuf>,
    /// Collapse labels into "nofinding" ("No Finding") and "finding" (anything else).
    #[arg(long, default_value_t = false)]
    pub binary_category: bool,
    /// Character separating labels of a multi-label entry.
    #[arg(long)]
    pub separator: Option<char>,
}

impl SortArgs {
    pub fn apply(&self, config: &mut PartitionConfig) {
        if let Some(csv) = &self.csv {
            config.label_table = csv.clone();
        }
        if let Some(source) = &self.source {
            config.source_root = source.clone();
        }
        if let Some(output) = &self.output {
            config.output_root = output.clone();
        }
        if self.copy {
            config.copy_policy = CopyPolicy::Copy;
        }
        if self.move_files {
            config.copy_policy = CopyPolicy::Move;
        }
        if self.sharded {
            config.source_layout = SourceLayout::numbered_shards();
        }
        if self.header {
            config.label_table_has_header = true;
        }
        if let Some(run_log) = &self.run_log {
            config.run_log = run_log.clone();
        }
        if self.binary_category {
            config.category_map = Some(CategoryMap::default());
        }
        if let Some(separator) = self.separator {
            config.multi_label_separator = separator;
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct SplitArgs {
    /// Directory of label folders to split.
    #[arg(long)]
    pub input: Option<PathBuf>,
    /// Root receiving training/ and testing/.
    #[arg(long)]
    pub sorted: Option<PathBuf>,
    /// Fraction of each label that goes to training.
    #[arg(long)]
    pub ratio: Option<f64>,
    /// Allowed image extensions, comma separated.
    #[arg(long, value_delimiter = ',')]
    pub extensions: Option<Vec<String>>,
}

impl SplitArgs {
    pub fn apply(&self, config: &mut PartitionConfig) {
        if let Some(input) = &self.input {
            config.output_root = input.clone();
        }
        if let Some(sorted) = &self.sorted {
            config.sorted_root = sorted.clone();
        }
        if let Some(ratio) = self.ratio {
            config.split_ratio = ratio;
        }
        if let Some(extensions) = &self.extensions {
            config.allowed_extensions = extensions.clone();
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct SubsetArgs {
    /// Split tree to sample from.
    #[arg(long)]
    pub sorted: Option<PathBuf>,
    /// Root of the subset tree.
    #[arg(long)]
    pub dest: Option<PathBuf>,
    /// Fraction of each folder to copy (at least one file).
    #[arg(long)]
    pub fraction: Option<f64>,
    /// Fixed label folders to sample, comma separated (default: every folder found).
    #[arg(long, value_delimiter = ',')]
    pub labels: Option<Vec<String>>,
}

impl SubsetArgs {
    pub fn apply(&self, config: &mut PartitionConfig) {
        if let Some(sorted) = &self.sorted {
            config.sorted_root = sorted.clone();
        }
        if let Some(dest) = &self.dest {
            config.subset_root = dest.clone();
        }
        if let Some(fraction) = self.fraction {
            config.subset_fraction = fraction;
        }
        if let Some(labels) = &self.labels {
            config.subset_labels = Some(labels.clone());
        }
    }
}

#[derive(Args, Debug, Clone)]
#[command(group(ArgGroup::new("target").required(true).args(["tree", "split_tree"])))]
pub struct StatsArgs {
    /// Label-organized tree (<root>/<label>/<file>).
    #[arg(long)]
    pub tree: Option<PathBuf>,
    /// Split tree (<root>/training/<label>, <root>/testing/<label>).
    #[arg(long)]
    pub split_tree: Option<PathBuf>,
    /// Width of the text bars.
    #[arg(long, default_value_t = 40)]
    pub width: usize,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub sort: SortArgs,
    /// Root receiving training/ and testing/.
    #[arg(long)]
    pub sorted: Option<PathBuf>,
    /// Root of the subset tree.
    #[arg(long)]
    pub subset_dir: Option<PathBuf>,
    /// Fraction of each label that goes to training.
    #[arg(long)]
    pub ratio: Option<f64>,
    /// Fraction of each split folder copied into the subset.
    #[arg(long)]
    pub fraction: Option<f64>,
}

impl RunArgs {
    pub fn apply(&self, config: &mut PartitionConfig) {
        self.sort.apply(config);
        if let Some(sorted) = &self.sorted {
            config.sorted_root = sorted.clone();
        }
        if let Some(subset_dir) = &self.subset_dir {
            config.subset_root = subset_dir.clone();
        }
        if let Some(ratio) = self.ratio {
            config.split_ratio = ratio;
        }
        if let Some(fraction) = self.fraction {
            config.subset_fraction = fraction;
        }
    }
}
