use anyhow::{Context, Result};
use setrename_core::{scan_operation, OutputFormat, OutputFormatter};
use std::path::Path;

pub fn handle_scan(folder: &Path, extensions: &[String], output: OutputFormat) -> Result<()> {
    let result = scan_operation(folder, extensions)
        .with_context(|| format!("Failed to scan {}", folder.display()))?;
    print!("{}", result.format(output));
    Ok(())
}
