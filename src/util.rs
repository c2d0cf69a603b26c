use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extension of the structured-data files that take part in diffing.
pub const STRUCTURED_EXTENSION: &str = ".json";

#[derive(Debug, Clone)]
pub struct TreeFile {
    /// Path relative to the walked root, always with forward slashes.
    pub relative_path: String,
    pub full_path: PathBuf,
}

/// Walk a directory tree and collect every structured-data file with its
/// relative path. Entries that fail to list are logged and skipped so one
/// unreadable directory does not end the run.
pub fn walk_structured_files(root: &Path) -> Vec<TreeFile> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!("skipping unreadable entry under {}: {}", root.display(), err);
                continue;
            }
        };

        if !entry.file_type().is_file() || !is_structured(entry.file_name().to_string_lossy().as_ref()) {
            continue;
        }

        let full_path = entry.path().to_path_buf();
        match relative_slash_path(root, &full_path) {
            Some(relative_path) => files.push(TreeFile {
                relative_path,
                full_path,
            }),
            None => tracing::warn!("skipping non-UTF8 path: {}", full_path.display()),
        }
    }

    files
}

pub fn is_structured(file_name: &str) -> bool {
    file_name.ends_with(STRUCTURED_EXTENSION)
}

/// Path of `full` relative to `root`, using forward slashes for cross-platform
/// consistency in patch tags and archive entry names.
pub fn relative_slash_path(root: &Path, full: &Path) -> Option<String> {
    let relative = full.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
    Some(parts?.join("/"))
}

/// Resolve a forward-slash relative path under `root` using platform separators.
pub fn join_relative(root: &Path, relative_path: &str) -> PathBuf {
    relative_path
        .split('/')
        .fold(root.to_path_buf(), |path, part| path.join(part))
}
