use crate::correlation::{CorrelationKey, KeyExtractor, ParenthesizedId};
use crate::set_manager::SetKind;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// How the files behind a set member are located
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Find the file carrying the member's correlation key in the primary
    /// folder and in every synced folder
    #[default]
    Identifier,
    /// Rename the member path itself; synced folders are not consulted
    Direct,
}

/// Options for processing a set of assignments
#[derive(Debug, Clone, Default)]
pub struct RenameOptions {
    /// Copy into this directory instead of renaming in place
    pub output_dir: Option<PathBuf>,
    pub match_mode: MatchMode,
}

/// New base name (without extension) computed for one set member
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameAssignment {
    pub set: SetKind,
    pub source: PathBuf,
    pub base_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<CorrelationKey>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NamePlan {
    pub assignments: Vec<NameAssignment>,
    pub warnings: Vec<ProcessWarning>,
}

/// Non-fatal diagnostics. The affected file or folder is skipped and the batch continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProcessWarning {
    MissingKey {
        path: PathBuf,
    },
    NoMatch {
        key: CorrelationKey,
        folder: PathBuf,
    },
    DuplicateKey {
        key: CorrelationKey,
        folder: PathBuf,
        kept: PathBuf,
    },
    SyncIgnored {
        folder: PathBuf,
    },
    ReloadFailed {
        folder: PathBuf,
        reason: String,
    },
}

impl fmt::Display for ProcessWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingKey { path } => write!(
                f,
                "Could not find a unique ID in '{}'. Skipping.",
                display_name(path)
            ),
            Self::NoMatch { key, folder } => write!(
                f,
                "No matching file for ID '{}' found in '{}'.",
                key,
                display_name(folder)
            ),
            Self::DuplicateKey { key, folder, kept } => write!(
                f,
                "Several files share ID '{}' in '{}'; using '{}'.",
                key,
                display_name(folder),
                display_name(kept)
            ),
            Self::SyncIgnored { folder } => write!(
                f,
                "Synced folder '{}' is ignored when renaming paths directly.",
                display_name(folder)
            ),
            Self::ReloadFailed { folder, reason } => write!(
                f,
                "Could not reload '{}' after processing: {}. Select the folder again.",
                display_name(folder),
                reason
            ),
        }
    }
}

/// One committed rename or copy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamedFile {
    pub set: SetKind,
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Outcome of a completed batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessReport {
    pub renamed: Vec<RenamedFile>,
    pub warnings: Vec<ProcessWarning>,
}

impl ProcessReport {
    pub fn processed(&self) -> usize {
        self.renamed.len()
    }

    /// The `(old, new)` pairs in the order they were committed
    pub fn pairs(&self) -> Vec<(PathBuf, PathBuf)> {
        self.renamed
            .iter()
            .map(|r| (r.from.clone(), r.to.clone()))
            .collect()
    }
}

/// Filesystem failure that stopped a batch
#[derive(Debug, Error)]
pub enum ProcessFailure {
    #[error("Failed to read folder {}", .folder.display())]
    Scan {
        folder: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to {verb} {} to {}", .from.display(), .to.display())]
    Transfer {
        verb: &'static str,
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A batch that stopped early. Operations in `completed` stay applied.
#[derive(Debug, Error)]
#[error("Processing stopped after {} file(s)", .completed.len())]
pub struct ProcessError {
    #[source]
    pub failure: ProcessFailure,
    pub completed: Vec<RenamedFile>,
    pub warnings: Vec<ProcessWarning>,
}

impl ProcessError {
    /// Whether some files were already renamed or copied before the failure
    pub fn is_partial(&self) -> bool {
        !self.completed.is_empty()
    }
}

/// Compute the new base names for every member of `sets`.
///
/// Sets are visited in name order. Every `set1` member draws from a single
/// running counter; members of numbered sets are numbered by position. In
/// [`MatchMode::Identifier`] a member without a correlation key is skipped
/// and does not consume a `set1` number.
pub fn plan_names(sets: &BTreeMap<SetKind, Vec<PathBuf>>, mode: MatchMode) -> NamePlan {
    plan_names_with(sets, mode, &ParenthesizedId)
}

pub fn plan_names_with<E: KeyExtractor + ?Sized>(
    sets: &BTreeMap<SetKind, Vec<PathBuf>>,
    mode: MatchMode,
    extractor: &E,
) -> NamePlan {
    let mut plan = NamePlan::default();
    let mut set1_counter = 0usize;

    for (set, members) in sets {
        for (i, source) in members.iter().enumerate() {
            let key = extractor.extract_from_path(source);
            if mode == MatchMode::Identifier && key.is_none() {
                plan.warnings.push(ProcessWarning::MissingKey {
                    path: source.clone(),
                });
                continue;
            }

            let base_name = if set.is_cumulative() {
                set1_counter += 1;
                format!("{} ({})", set, set1_counter)
            } else {
                format!("{} ({})", set, i + 1)
            };

            plan.assignments.push(NameAssignment {
                set: *set,
                source: source.clone(),
                base_name,
                key,
            });
        }
    }

    plan
}

/// Rename (or copy) the files behind every set member.
///
/// In [`MatchMode::Identifier`] each member's correlation key is looked up in
/// `primary_folder` and then in each of `synced_folders`; every match is renamed
/// inside its own folder, keeping its own extension. Missing keys and unmatched
/// folders are reported as warnings. The first filesystem failure stops the
/// batch; renames committed before it are not rolled back.
pub fn rename_files(
    sets: &BTreeMap<SetKind, Vec<PathBuf>>,
    primary_folder: &Path,
    synced_folders: &[PathBuf],
    options: &RenameOptions,
) -> Result<ProcessReport, ProcessError> {
    rename_files_with(sets, primary_folder, synced_folders, options, &ParenthesizedId)
}

pub fn rename_files_with<E: KeyExtractor + ?Sized>(
    sets: &BTreeMap<SetKind, Vec<PathBuf>>,
    primary_folder: &Path,
    synced_folders: &[PathBuf],
    options: &RenameOptions,
    extractor: &E,
) -> Result<ProcessReport, ProcessError> {
    let plan = plan_names_with(sets, options.match_mode, extractor);
    let mut batch = Batch {
        report: ProcessReport::default(),
        copy: options.output_dir.is_some(),
    };
    for warning in plan.warnings {
        batch.warn(warning);
    }

    match options.match_mode {
        MatchMode::Identifier => {
            let targets = target_folders(primary_folder, synced_folders, options);
            let mut indexes = Vec::with_capacity(targets.len());
            for (folder, _) in &targets {
                let index = match FolderIndex::scan(folder, extractor) {
                    Ok(index) => index,
                    Err(source) => {
                        return Err(batch.fail(ProcessFailure::Scan {
                            folder: folder.clone(),
                            source,
                        }))
                    },
                };
                for warning in index.duplicates.clone() {
                    batch.warn(warning);
                }
                indexes.push(index);
            }

            for assignment in &plan.assignments {
                // Members without a key were filtered out while planning
                let Some(key) = &assignment.key else {
                    continue;
                };

                for ((folder, dest_dir), index) in targets.iter().zip(indexes.iter_mut()) {
                    match index.take(key) {
                        Some(source) => batch.transfer(assignment, &source, dest_dir)?,
                        None => batch.warn(ProcessWarning::NoMatch {
                            key: key.clone(),
                            folder: folder.clone(),
                        }),
                    }
                }
            }
        },
        MatchMode::Direct => {
            for folder in synced_folders {
                batch.warn(ProcessWarning::SyncIgnored {
                    folder: folder.clone(),
                });
            }

            for assignment in &plan.assignments {
                let dest_dir = match &options.output_dir {
                    Some(dir) => dir.clone(),
                    None => assignment
                        .source
                        .parent()
                        .map_or_else(|| primary_folder.to_path_buf(), Path::to_path_buf),
                };
                batch.transfer(assignment, &assignment.source, &dest_dir)?;
            }
        },
    }

    info!(
        processed = batch.report.renamed.len(),
        warnings = batch.report.warnings.len(),
        "Batch complete"
    );
    Ok(batch.report)
}

/// Pair each source folder with the directory its results are written to
fn target_folders(
    primary_folder: &Path,
    synced_folders: &[PathBuf],
    options: &RenameOptions,
) -> Vec<(PathBuf, PathBuf)> {
    let mut targets = Vec::with_capacity(synced_folders.len() + 1);

    let primary_dest = options
        .output_dir
        .clone()
        .unwrap_or_else(|| primary_folder.to_path_buf());
    targets.push((primary_folder.to_path_buf(), primary_dest));

    for folder in synced_folders {
        let dest = match &options.output_dir {
            Some(dir) => match folder.file_name() {
                Some(name) => dir.join(name),
                None => dir.clone(),
            },
            None => folder.clone(),
        };
        targets.push((folder.clone(), dest));
    }

    targets
}

struct Batch {
    report: ProcessReport,
    copy: bool,
}

impl Batch {
    fn warn(&mut self, warning: ProcessWarning) {
        warn!("{}", warning);
        self.report.warnings.push(warning);
    }

    fn fail(&mut self, failure: ProcessFailure) -> ProcessError {
        ProcessError {
            failure,
            completed: std::mem::take(&mut self.report.renamed),
            warnings: std::mem::take(&mut self.report.warnings),
        }
    }

    fn transfer(
        &mut self,
        assignment: &NameAssignment,
        source: &Path,
        dest_dir: &Path,
    ) -> Result<(), ProcessError> {
        let target = dest_dir.join(format!("{}{}", assignment.base_name, suffix(source)));
        let verb = if self.copy { "copy" } else { "rename" };

        let result = if self.copy {
            copy_file(source, &target)
        } else {
            rename_file(source, &target)
        };
        if let Err(source_err) = result {
            return Err(self.fail(ProcessFailure::Transfer {
                verb,
                from: source.to_path_buf(),
                to: target,
                source: source_err,
            }));
        }

        debug!(from = %source.display(), to = %target.display(), verb, "Transferred file");
        self.report.renamed.push(RenamedFile {
            set: assignment.set,
            from: source.to_path_buf(),
            to: target,
        });
        Ok(())
    }
}

/// Snapshot of one folder's files keyed by correlation key
struct FolderIndex {
    entries: HashMap<CorrelationKey, PathBuf>,
    duplicates: Vec<ProcessWarning>,
}

impl FolderIndex {
    fn scan<E: KeyExtractor + ?Sized>(folder: &Path, extractor: &E) -> io::Result<Self> {
        let mut files = Vec::new();
        for entry in fs::read_dir(folder)? {
            let path = entry?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();

        let mut entries: HashMap<CorrelationKey, PathBuf> = HashMap::new();
        let mut duplicates = Vec::new();
        for path in files {
            let Some(key) = extractor.extract_from_path(&path) else {
                continue;
            };
            match entries.entry(key) {
                Entry::Occupied(kept) => duplicates.push(ProcessWarning::DuplicateKey {
                    key: kept.key().clone(),
                    folder: folder.to_path_buf(),
                    kept: kept.get().clone(),
                }),
                Entry::Vacant(slot) => {
                    slot.insert(path);
                },
            }
        }

        Ok(Self {
            entries,
            duplicates,
        })
    }

    /// Remove and return the file for `key`; a file is matched at most once per batch
    fn take(&mut self, key: &CorrelationKey) -> Option<PathBuf> {
        self.entries.remove(key)
    }
}

fn rename_file(from: &Path, to: &Path) -> io::Result<()> {
    if from == to {
        return Ok(());
    }

    let case_only_rename =
        from.to_string_lossy().to_lowercase() == to.to_string_lossy().to_lowercase();

    if case_only_rename {
        // On a case-sensitive filesystem the target may be a different file
        if is_listed(to)? {
            return Err(already_exists());
        }
        // Two-step rename so case-insensitive filesystems see a change
        let temp_name = from.with_extension(format!("{}.setrename.tmp", std::process::id()));
        return rename_via(from, &temp_name, to);
    }

    ensure_vacant(to)?;
    fs::rename(from, to)
}

/// Rename `from` to `to` through `temp`. If the second step fails the file is
/// moved back so `from` still names it.
fn rename_via(from: &Path, temp: &Path, to: &Path) -> io::Result<()> {
    fs::rename(from, temp)?;
    if let Err(err) = fs::rename(temp, to) {
        if let Err(restore_err) = fs::rename(temp, from) {
            warn!(
                temp = %temp.display(),
                error = %restore_err,
                "Could not restore file after failed rename"
            );
        }
        return Err(err);
    }
    Ok(())
}

fn copy_file(from: &Path, to: &Path) -> io::Result<()> {
    if from == to {
        return Ok(());
    }
    ensure_vacant(to)?;
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(from, to).map(|_| ())
}

fn ensure_vacant(path: &Path) -> io::Result<()> {
    if path.exists() {
        return Err(already_exists());
    }
    Ok(())
}

fn already_exists() -> io::Error {
    io::Error::new(io::ErrorKind::AlreadyExists, "destination already exists")
}

/// Whether the parent directory has an entry spelled exactly like `path`'s file name
fn is_listed(path: &Path) -> io::Result<bool> {
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return Ok(false);
    };
    for entry in fs::read_dir(parent)? {
        if entry?.file_name() == name {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Extension including the leading dot, or empty
fn suffix(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}
