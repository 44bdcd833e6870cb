//! High-level operations that correspond to CLI commands
//!
//! These modules contain the core business logic for each setrename operation,
//! separated from CLI concerns like argument parsing and output formatting.

pub mod process;
pub mod scan;

pub use process::process_operation;
pub use scan::scan_operation;
