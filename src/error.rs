use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::operations::FileOpError;

/// Result type for partitioning operations
pub type PartitionResult<T> = Result<T, PartitionError>;

/// Fatal errors. Per-file problems never surface here; they are recorded in
/// the operation report and the run log instead.
#[derive(Debug, Error)]
pub enum PartitionError {
    #[error("label table {path:?} could not be read: {source}")]
    LabelTableUnreadable {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("source root {0:?} does not exist or is not a directory")]
    SourceRootMissing(PathBuf),
    #[error("input directory {0:?} does not exist or is not a directory")]
    InputRootMissing(PathBuf),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("config file {path:?} is invalid: {reason}")]
    ConfigFile { path: PathBuf, reason: String },
    #[error(transparent)]
    FileOp(#[from] FileOpError),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}
