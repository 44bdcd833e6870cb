use clap::builder::FalseyValueParser;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::types::{MatchModeArg, OutputFormat};

/// Group media files into sets and batch-rename them across synced folders
#[derive(Parser, Debug)]
#[command(name = "setrename")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output (any non-empty NO_COLOR other than 0/false/no/off)
    #[arg(long, global = true, env = "NO_COLOR", value_parser = FalseyValueParser::new())]
    pub no_color: bool,

    /// Run as if started in <path> instead of the current working directory
    #[arg(short = 'C', global = true, value_name = "PATH")]
    pub directory: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the media files of a folder with their IDs
    Scan {
        /// Folder to list
        folder: PathBuf,

        /// Extensions to include (comma-separated, default from config)
        #[arg(long, value_delimiter = ',')]
        extensions: Vec<String>,

        /// Output format for machine consumption
        #[arg(long, value_enum)]
        output: Option<OutputFormat>,
    },

    /// Assign files to sets and process them, reading commands from stdin or a script
    ///
    /// Commands: add <size> <item>..., undo, sets, pool, reset, process, help, quit.
    /// An item is a 1-based index into the current pool or a file name
    /// (use double quotes for names with spaces).
    #[command(verbatim_doc_comment)]
    Session {
        /// Folder whose files are grouped into sets
        #[arg(long, value_name = "DIR")]
        primary: PathBuf,

        /// Folder kept in sync with the primary folder (repeatable)
        #[arg(long = "sync", value_name = "DIR")]
        synced: Vec<PathBuf>,

        /// Copy renamed files into this directory instead of renaming in place
        #[arg(long, value_name = "DIR")]
        copy_to: Option<PathBuf>,

        /// How set members are matched to files
        #[arg(long, value_enum)]
        match_mode: Option<MatchModeArg>,

        /// Read commands from this file instead of stdin
        #[arg(long, value_name = "FILE")]
        script: Option<PathBuf>,

        /// Output format for machine consumption
        #[arg(long, value_enum)]
        output: Option<OutputFormat>,
    },

    /// Show version information
    Version {
        /// Output format for machine consumption
        #[arg(long, value_enum, default_value = "summary")]
        output: OutputFormat,
    },
}
