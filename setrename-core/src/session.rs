use crate::engine::{rename_files, ProcessError, ProcessReport, ProcessWarning, RenameOptions};
use crate::media::{list_media_files, SUPPORTED_EXTENSIONS};
use crate::set_manager::{AddSetError, SetKind, SetManager, SetSize, UndoneSet};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No primary folder selected")]
    NoPrimaryFolder,
    #[error("No sets to process")]
    NoSets,
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("That folder is already in use: {}", .0.display())]
    FolderInUse(PathBuf),
    #[error("File is not available for assignment: {}", .0.display())]
    NotAvailable(PathBuf),
    #[error(transparent)]
    Declined(#[from] AddSetError),
    #[error(transparent)]
    Load(anyhow::Error),
    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// One grouping session: the folders being worked on, the files not yet
/// assigned to a set, and the set bookkeeping itself.
#[derive(Debug, Clone)]
pub struct Session {
    manager: SetManager,
    primary_folder: Option<PathBuf>,
    synced_folders: Vec<PathBuf>,
    extensions: Vec<String>,
    // Primary folder listing in display order
    all_files: Vec<PathBuf>,
    available: Vec<PathBuf>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_extensions(SUPPORTED_EXTENSIONS.iter().map(ToString::to_string).collect())
    }

    /// Session that only offers files with the given extensions
    pub fn with_extensions(extensions: Vec<String>) -> Self {
        Self {
            manager: SetManager::new(),
            primary_folder: None,
            synced_folders: Vec::new(),
            extensions,
            all_files: Vec::new(),
            available: Vec::new(),
        }
    }

    pub fn primary_folder(&self) -> Option<&Path> {
        self.primary_folder.as_deref()
    }

    pub fn synced_folders(&self) -> &[PathBuf] {
        &self.synced_folders
    }

    /// Files of the primary folder not assigned to any set, in listing order
    pub fn available(&self) -> &[PathBuf] {
        &self.available
    }

    pub fn sets(&self) -> &BTreeMap<SetKind, Vec<PathBuf>> {
        self.manager.get_all_sets()
    }

    pub fn manager(&self) -> &SetManager {
        &self.manager
    }

    /// Select the primary folder and load its media files. Existing sets are discarded.
    pub fn set_primary_folder(&mut self, folder: impl Into<PathBuf>) -> Result<(), SessionError> {
        let folder = folder.into();
        if !folder.is_dir() {
            return Err(SessionError::NotADirectory(folder));
        }
        let identity = folder_identity(&folder);
        if self
            .synced_folders
            .iter()
            .any(|synced| folder_identity(synced) == identity)
        {
            return Err(SessionError::FolderInUse(folder));
        }

        let files = list_media_files(&folder, &self.extensions).map_err(SessionError::Load)?;
        info!(folder = %folder.display(), files = files.len(), "Loaded primary folder");

        self.manager.reset();
        self.primary_folder = Some(folder);
        self.available.clone_from(&files);
        self.all_files = files;
        Ok(())
    }

    pub fn add_synced_folder(&mut self, folder: impl Into<PathBuf>) -> Result<(), SessionError> {
        let folder = folder.into();
        if !folder.is_dir() {
            return Err(SessionError::NotADirectory(folder));
        }
        let identity = folder_identity(&folder);
        let in_use = self
            .primary_folder
            .iter()
            .chain(&self.synced_folders)
            .any(|used| folder_identity(used) == identity);
        if in_use {
            return Err(SessionError::FolderInUse(folder));
        }

        self.synced_folders.push(folder);
        Ok(())
    }

    /// Forget all folders, files and sets
    pub fn clear_folders(&mut self) {
        self.primary_folder = None;
        self.synced_folders.clear();
        self.all_files.clear();
        self.available.clear();
        self.manager.reset();
    }

    /// Group `paths` into a set. Every path must currently be available.
    pub fn assign(&mut self, size: SetSize, paths: Vec<PathBuf>) -> Result<SetKind, SessionError> {
        for (i, path) in paths.iter().enumerate() {
            if !self.available.contains(path) || paths[..i].contains(path) {
                return Err(SessionError::NotAvailable(path.clone()));
            }
        }

        let set = self.manager.add_set(size, paths.clone())?;
        self.available.retain(|p| !paths.contains(p));
        Ok(set)
    }

    /// Undo the last assignment and return its files to the available pool
    pub fn undo(&mut self) -> Option<UndoneSet> {
        let undone = self.manager.undo_last_set()?;
        self.available.extend(undone.paths.iter().cloned());
        self.restore_listing_order();
        Some(undone)
    }

    /// Discard all sets, making every file available again
    pub fn reset(&mut self) {
        self.manager.reset();
        self.available.clone_from(&self.all_files);
    }

    /// Rename the files of every set. On success the session starts over with a
    /// fresh listing of the primary folder; on failure the sets are kept.
    ///
    /// A listing that cannot be reloaded after a successful batch leaves the pool
    /// empty and is reported as a warning alongside the committed renames.
    pub fn process(&mut self, options: &RenameOptions) -> Result<ProcessReport, SessionError> {
        let primary = self
            .primary_folder
            .clone()
            .ok_or(SessionError::NoPrimaryFolder)?;
        if self.manager.is_empty() {
            return Err(SessionError::NoSets);
        }

        let mut report = rename_files(
            self.manager.get_all_sets(),
            &primary,
            &self.synced_folders,
            options,
        )?;

        self.manager.reset();
        if let Some(warning) = self.reload_pool(&primary) {
            report.warnings.push(warning);
        }
        Ok(report)
    }

    fn reload_pool(&mut self, primary: &Path) -> Option<ProcessWarning> {
        match list_media_files(primary, &self.extensions) {
            Ok(files) => {
                self.available.clone_from(&files);
                self.all_files = files;
                None
            },
            Err(err) => {
                let reason = format!("{err:#}");
                warn!(folder = %primary.display(), error = %reason, "Failed to reload primary folder");
                self.available.clear();
                self.all_files.clear();
                Some(ProcessWarning::ReloadFailed {
                    folder: primary.to_path_buf(),
                    reason,
                })
            },
        }
    }

    fn restore_listing_order(&mut self) {
        let position = |path: &PathBuf| {
            self.all_files
                .iter()
                .position(|p| p == path)
                .unwrap_or(usize::MAX)
        };
        let mut available = std::mem::take(&mut self.available);
        available.sort_by_key(|p| position(p));
        self.available = available;
    }
}

/// Resolved form of `folder` used to detect the same directory reached by
/// different spellings
fn folder_identity(folder: &Path) -> PathBuf {
    fs::canonicalize(folder).unwrap_or_else(|_| folder.to_path_buf())
}
