use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Case-insensitive set of file extensions that count as media files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    extensions: Vec<String>,
}

impl ExtensionFilter {
    /// Extensions may be given with or without a leading dot
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        Self { extensions }
    }

    pub fn matches(&self, path: &Path) -> bool {
        match path.extension() {
            Some(ext) => {
                let ext = ext.to_string_lossy().to_lowercase();
                self.extensions.iter().any(|allowed| *allowed == ext)
            }
            None => false,
        }
    }
}

/// Media files directly inside `dir`, sorted by path.
///
/// Entries that are not regular files or whose extension is not allowed are
/// skipped. Sorting keeps downstream shuffles reproducible under a seed.
pub fn list_media_files(dir: &Path, filter: &ExtensionFilter) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && filter.matches(&path) {
            files.push(path);
        }
    }
    files.sort();
    debug!("Found {} media files in {:?}", files.len(), dir);
    Ok(files)
}

/// Names of the class directories directly inside `root`, sorted
pub fn list_class_dirs(root: &Path) -> io::Result<Vec<String>> {
    let mut classes = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if entry.path().is_dir() {
            classes.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    classes.sort();
    Ok(classes)
}

/// The file name of `path` as a string, or an empty string for paths without one
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Whether `name` can be used as a single directory or file name under a root
/// without escaping it
pub fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(std::path::Component::Normal(_)), None)
    )
}
