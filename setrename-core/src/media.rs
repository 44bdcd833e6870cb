use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Media types that can be grouped into sets. PDFs preview their first page only.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "pdf"];

/// Check whether `path` has one of `extensions` (case-insensitive)
pub fn has_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|allowed| allowed.as_ref().trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
}

/// A regular file with a supported media extension
pub fn is_supported_file(path: &Path) -> bool {
    path.is_file() && has_extension(path, SUPPORTED_EXTENSIONS)
}

/// List the media files directly inside `folder`, sorted by path.
///
/// Subdirectories are not descended into.
pub fn list_media_files<S: AsRef<str>>(folder: &Path, extensions: &[S]) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        bail!("Not a directory: {}", folder.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(folder).min_depth(1).max_depth(1) {
        let entry =
            entry.with_context(|| format!("Failed to read directory: {}", folder.display()))?;
        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}
