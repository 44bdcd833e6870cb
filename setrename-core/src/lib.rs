#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod correlation;
pub mod engine;
pub mod media;
pub mod operations;
pub mod output;
pub mod session;
pub mod set_manager;

pub use config::Config;
pub use correlation::{extract_key, CorrelationKey, KeyExtractor, ParenthesizedId};
pub use engine::{
    plan_names, plan_names_with, rename_files, rename_files_with, MatchMode, NameAssignment,
    NamePlan, ProcessError, ProcessFailure, ProcessReport, ProcessWarning, RenameOptions,
    RenamedFile,
};
pub use media::{is_supported_file, list_media_files, SUPPORTED_EXTENSIONS};
pub use operations::{process_operation, scan_operation};
pub use output::{
    AssignResult, OutputFormat, OutputFormatter, ProcessResult, ScanResult, SetsResult,
    UndoResult, VersionResult,
};
pub use session::{Session, SessionError};
pub use set_manager::{AddSetError, SetKind, SetManager, SetSize, UndoneSet};
