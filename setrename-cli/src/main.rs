use anyhow::{Context, Result};
use clap::Parser;
use setrename_core::{Config, OutputFormatter, RenameOptions, VersionResult};
use std::io::{self, IsTerminal};
use std::process;
use std::str::FromStr;

mod cli;
mod logging;
mod scan;
mod session;

use cli::{Cli, Commands, OutputFormat};

fn main() {
    let cli = Cli::parse();

    // Handle -C directory flag
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir)
            .with_context(|| format!("Failed to change to directory: {}", dir.display()))
            .unwrap_or_else(|e| {
                eprintln!("Error: {e:#}");
                process::exit(2);
            });
    }

    // Load config to get defaults
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: ignoring config: {e:#}");
        Config::default()
    });

    let use_color = !cli.no_color
        && config
            .defaults
            .use_color
            .unwrap_or_else(|| io::stdout().is_terminal());
    logging::init_logger(use_color && io::stderr().is_terminal());

    let default_output = setrename_core::OutputFormat::from_str(&config.defaults.output_format)
        .unwrap_or(setrename_core::OutputFormat::Summary);
    let resolve_output =
        |output: Option<OutputFormat>| output.map_or(default_output, std::convert::Into::into);

    let result = match cli.command {
        Commands::Scan {
            folder,
            extensions,
            output,
        } => {
            let extensions = if extensions.is_empty() {
                config.media.extensions.clone()
            } else {
                extensions
            };
            scan::handle_scan(&folder, &extensions, resolve_output(output))
        },

        Commands::Session {
            primary,
            synced,
            copy_to,
            match_mode,
            script,
            output,
        } => {
            // Synced folders on the command line replace the configured ones
            let synced = if synced.is_empty() {
                config.synced_folders.clone()
            } else {
                synced
            };
            let options = RenameOptions {
                output_dir: copy_to,
                match_mode: match_mode.map_or(config.defaults.match_mode, Into::into),
            };

            session::handle_session(session::SessionArgs {
                primary,
                synced,
                extensions: config.media.extensions.clone(),
                options,
                script,
                output: resolve_output(output),
                use_color,
            })
        },

        Commands::Version { output } => handle_version(output),
    };

    match result {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        },
    }
}

fn handle_version(output: OutputFormat) -> Result<()> {
    let version_result = VersionResult {
        name: "setrename".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let formatted = match output {
        OutputFormat::Json => version_result.format_json(),
        OutputFormat::Summary => version_result.format_summary(),
    };

    println!("{}", formatted);
    Ok(())
}
