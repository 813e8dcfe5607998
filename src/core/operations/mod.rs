mod distribute;
mod file_ops;
mod split;
mod subset;

pub use distribute::{
    distribute_files, resolve_class, sort_images, ClassResolution, DistributeReport,
    DistributeStatus,
};
pub use file_ops::{copy_file, ensure_dir, move_file, transfer_file, FileOpError, FileOpResult};
pub use split::{partition_files, split_dataset, split_index, ClassSplit, SplitReport};
pub use subset::{create_subset, sample_count, SubsetEntry, SubsetReport};
