use std::path::{Path, PathBuf};
use tracing::debug;

use super::media::is_plain_name;
use crate::config::SourceLayout;
use crate::error::{PartitionError, PartitionResult};

/// Finds source files under a source root according to its layout
#[derive(Debug, Clone)]
pub struct SourceLocator {
    root: PathBuf,
    layout: SourceLayout,
}

impl SourceLocator {
    /// Fails if the root is not an existing directory
    pub fn new(root: &Path, layout: SourceLayout) -> PartitionResult<Self> {
        if !root.is_dir() {
            return Err(PartitionError::SourceRootMissing(root.to_path_buf()));
        }
        Ok(Self {
            root: root.to_path_buf(),
            layout,
        })
    }

    /// Every path probed for `filename`, in probe order
    pub fn candidates(&self, filename: &str) -> Vec<PathBuf> {
        match &self.layout {
            SourceLayout::Flat => vec![self.root.join(filename)],
            SourceLayout::Sharded {
                prefix,
                count,
                width,
                inner,
            } => (1..=*count)
                .map(|n| {
                    self.root
                        .join(format!("{}{:0width$}", prefix, n, width = *width))
                        .join(inner)
                        .join(filename)
                })
                .collect(),
        }
    }

    /// First candidate that is an existing file
    pub fn locate(&self, filename: &str) -> Option<PathBuf> {
        // A filename with path components would resolve outside the source tree
        if !is_plain_name(filename) {
            debug!("Refusing to resolve non-plain filename {:?}", filename);
            return None;
        }
        self.candidates(filename).into_iter().find(|p| p.is_file())
    }
}
