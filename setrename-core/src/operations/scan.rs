use crate::media::list_media_files;
use crate::output::ScanResult;
use anyhow::Result;
use std::path::Path;

/// List a folder's media files with their correlation IDs
pub fn scan_operation<S: AsRef<str>>(folder: &Path, extensions: &[S]) -> Result<ScanResult> {
    let files = list_media_files(folder, extensions)?;
    Ok(ScanResult::new(folder.to_path_buf(), files))
}
