use crate::correlation::extract_key;
use crate::engine::{ProcessWarning, RenamedFile};
use crate::set_manager::SetKind;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use nu_ansi_term::Color;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Summary,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(Self::Summary),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Result of listing a folder's media files
#[derive(Debug, Serialize, Deserialize)]
pub struct ScanResult {
    pub folder: PathBuf,
    pub files: Vec<ScannedFile>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub id: Option<String>,
}

/// Current sets and the size of the available pool
#[derive(Debug, Serialize)]
pub struct SetsResult {
    pub sets: BTreeMap<SetKind, Vec<PathBuf>>,
    pub available: usize,
}

/// Result of assigning files to a set
#[derive(Debug, Serialize)]
pub struct AssignResult {
    pub set: SetKind,
    pub files: Vec<PathBuf>,
}

/// Result of undoing the last assignment
#[derive(Debug, Serialize)]
pub struct UndoResult {
    pub set: Option<SetKind>,
    pub restored: Vec<PathBuf>,
}

/// Result of processing all sets, complete or not
#[derive(Debug, Serialize)]
pub struct ProcessResult {
    pub success: bool,
    pub copied: bool,
    pub renamed: Vec<RenamedFile>,
    pub warnings: Vec<ProcessWarning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub use_color: bool,
}

/// Result of a version command
#[derive(Debug, Serialize, Deserialize)]
pub struct VersionResult {
    pub name: String,
    pub version: String,
}

/// Trait for formatting output in different formats
pub trait OutputFormatter {
    fn format(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => self.format_json(),
            OutputFormat::Summary => self.format_summary(),
        }
    }

    fn format_json(&self) -> String;
    fn format_summary(&self) -> String;
}

impl ScanResult {
    pub fn new(folder: PathBuf, files: Vec<PathBuf>) -> Self {
        let files = files
            .into_iter()
            .map(|path| {
                let id = extract_key(&path).map(|key| key.as_str().to_string());
                ScannedFile { path, id }
            })
            .collect();
        Self { folder, files }
    }
}

impl OutputFormatter for ScanResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": true,
            "operation": "scan",
            "folder": self.folder,
            "files": self.files,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        let mut output = String::new();
        writeln!(
            output,
            "{} media files in {}",
            self.files.len(),
            self.folder.display()
        )
        .unwrap();

        for (i, file) in self.files.iter().enumerate() {
            let id = file.id.as_deref().map_or_else(
                || "no ID".to_string(),
                |id| format!("ID {}", id),
            );
            writeln!(output, "{:>4}. {} [{}]", i + 1, file_name(&file.path), id).unwrap();
        }

        output
    }
}

impl OutputFormatter for SetsResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": true,
            "operation": "sets",
            "sets": self.sets,
            "available": self.available,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        if self.sets.is_empty() {
            return format!("No sets assigned ({} files available)\n", self.available);
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Set", "Files"]);

        for (set, members) in &self.sets {
            let names: Vec<String> = members.iter().map(|p| file_name(p)).collect();
            table.add_row(vec![Cell::new(set), Cell::new(names.join("\n"))]);
        }

        format!("{}\n{} files available\n", table, self.available)
    }
}

impl OutputFormatter for AssignResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": true,
            "operation": "add",
            "set": self.set,
            "files": self.files,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        format!("Added {} file(s) to {}\n", self.files.len(), self.set)
    }
}

impl OutputFormatter for UndoResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": self.set.is_some(),
            "operation": "undo",
            "set": self.set,
            "restored": self.restored,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        match self.set {
            Some(set) => format!(
                "Undid {}; {} file(s) returned to the pool\n",
                set,
                self.restored.len()
            ),
            None => "Nothing to undo\n".to_string(),
        }
    }
}

impl ProcessResult {
    /// Summary line for a status display
    pub fn headline(&self) -> String {
        match &self.error {
            None => format!("Successfully processed {} files.", self.renamed.len()),
            Some(error) if self.renamed.is_empty() => {
                format!("An error occurred during processing: {}", error)
            },
            Some(error) => format!(
                "An error occurred during processing after {} file(s): {}",
                self.renamed.len(),
                error
            ),
        }
    }
}

impl OutputFormatter for ProcessResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": self.success,
            "operation": if self.copied { "copy" } else { "rename" },
            "summary": {
                "processed": self.renamed.len(),
                "warnings": self.warnings.len(),
            },
            "renamed": self.renamed,
            "warnings": self.warnings,
            "error": self.error,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        let mut output = String::new();
        let arrow = if self.copied { "=>" } else { "->" };

        for renamed in &self.renamed {
            writeln!(
                output,
                "✓ {} {} {}",
                renamed.from.display(),
                arrow,
                renamed.to.display()
            )
            .unwrap();
        }

        for warning in &self.warnings {
            let line = format!("Warning: {}", warning);
            if self.use_color {
                writeln!(output, "{}", Color::Yellow.paint(line)).unwrap();
            } else {
                writeln!(output, "{}", line).unwrap();
            }
        }

        let headline = self.headline();
        if self.use_color && self.error.is_some() {
            writeln!(output, "{}", Color::Red.bold().paint(headline)).unwrap();
        } else {
            writeln!(output, "{}", headline).unwrap();
        }

        output
    }
}

impl OutputFormatter for VersionResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&self).unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        format!("{} {}", self.name, self.version)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::set_manager::SetSize;

    fn sample_process_result() -> ProcessResult {
        ProcessResult {
            success: true,
            copied: false,
            renamed: vec![RenamedFile {
                set: SetKind::Numbered {
                    size: SetSize::Two,
                    index: 1,
                },
                from: PathBuf::from("photo (42).jpg"),
                to: PathBuf::from("set2-no1 (1).jpg"),
            }],
            warnings: vec![ProcessWarning::MissingKey {
                path: PathBuf::from("loose.jpg"),
            }],
            error: None,
            use_color: false,
        }
    }

    #[test]
    fn test_process_summary() {
        let summary = sample_process_result().format(OutputFormat::Summary);
        assert!(summary.contains("✓ photo (42).jpg -> set2-no1 (1).jpg"));
        assert!(summary.contains("Warning: Could not find a unique ID in 'loose.jpg'. Skipping."));
        assert!(summary.ends_with("Successfully processed 1 files.\n"));
    }

    #[test]
    fn test_process_json() {
        let json = sample_process_result().format(OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["operation"], "rename");
        assert_eq!(value["summary"]["processed"], 1);
        assert_eq!(value["renamed"][0]["set"], "set2-no1");
        assert_eq!(value["warnings"][0]["kind"], "missing_key");
        assert!(value["error"].is_null());
    }

    #[test]
    fn test_process_headline_distinguishes_partial_failure() {
        let mut result = sample_process_result();
        result.success = false;
        result.error = Some("disk full".to_string());
        assert_eq!(
            result.headline(),
            "An error occurred during processing after 1 file(s): disk full"
        );

        result.renamed.clear();
        assert_eq!(
            result.headline(),
            "An error occurred during processing: disk full"
        );
    }

    #[test]
    fn test_scan_summary_lists_ids() {
        let result = ScanResult::new(
            PathBuf::from("/photos"),
            vec![
                PathBuf::from("/photos/a (1).jpg"),
                PathBuf::from("/photos/b.png"),
            ],
        );
        let summary = result.format_summary();
        assert!(summary.starts_with("2 media files in /photos\n"));
        assert!(summary.contains("   1. a (1).jpg [ID 1]"));
        assert!(summary.contains("   2. b.png [no ID]"));
    }

    #[test]
    fn test_sets_summary() {
        let empty = SetsResult {
            sets: BTreeMap::new(),
            available: 4,
        };
        assert_eq!(empty.format_summary(), "No sets assigned (4 files available)\n");

        let mut sets = BTreeMap::new();
        sets.insert(SetKind::Cumulative, vec![PathBuf::from("/p/a (1).jpg")]);
        let result = SetsResult { sets, available: 3 };
        let summary = result.format_summary();
        assert!(summary.contains("set1"));
        assert!(summary.contains("a (1).jpg"));
        assert!(summary.ends_with("3 files available\n"));

        let json: serde_json::Value = serde_json::from_str(&result.format_json()).unwrap();
        assert_eq!(json["sets"]["set1"][0], "/p/a (1).jpg");
    }

    #[test]
    fn test_undo_summary() {
        let nothing = UndoResult {
            set: None,
            restored: vec![],
        };
        assert_eq!(nothing.format_summary(), "Nothing to undo\n");
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("table".parse::<OutputFormat>().is_err());
    }
}
