use anyhow::{anyhow, bail, Context, Result};
use setrename_core::{
    process_operation, AssignResult, OutputFormat, OutputFormatter, RenameOptions, Session,
    SetSize, SetsResult, UndoResult,
};
use std::fmt::Write as FmtWrite;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

const HELP: &str = "\
Commands:
  add <size> <item>...  Group items into a set of size 1, 2 or 3
  undo                  Undo the last add
  sets                  Show the current sets
  pool                  Show the files not yet assigned
  reset                 Discard all sets
  process               Rename (or copy) the files of every set
  help                  Show this help
  quit                  Stop reading commands
Items are 1-based pool indices or file names (double quotes allowed).
";

#[derive(Debug, Clone, PartialEq, Eq)]
enum ScriptCommand {
    Add { size: String, items: Vec<String> },
    Undo,
    Sets,
    Pool,
    Reset,
    Process,
    Help,
    Quit,
}

enum Flow {
    Continue,
    Quit,
}

pub struct SessionArgs {
    pub primary: PathBuf,
    pub synced: Vec<PathBuf>,
    pub extensions: Vec<String>,
    pub options: RenameOptions,
    pub script: Option<PathBuf>,
    pub output: OutputFormat,
    pub use_color: bool,
}

pub fn handle_session(args: SessionArgs) -> Result<()> {
    let mut session = Session::with_extensions(args.extensions);
    session
        .set_primary_folder(&args.primary)
        .with_context(|| format!("Failed to open primary folder {}", args.primary.display()))?;
    for folder in args.synced {
        session
            .add_synced_folder(&folder)
            .with_context(|| format!("Failed to add synced folder {}", folder.display()))?;
    }

    let stdout = io::stdout();
    let mut runner = SessionRunner::new(
        session,
        args.options,
        args.output,
        args.use_color,
        stdout.lock(),
    );

    match args.script {
        Some(path) => {
            let file = File::open(&path)
                .with_context(|| format!("Failed to open script {}", path.display()))?;
            runner.run(BufReader::new(file))?;
        },
        None => runner.run(io::stdin().lock())?,
    }

    runner.finish()
}

/// Executes session commands line by line against one [`Session`]
pub struct SessionRunner<W: Write> {
    session: Session,
    options: RenameOptions,
    output: OutputFormat,
    use_color: bool,
    out: W,
    failed_batches: usize,
}

impl<W: Write> SessionRunner<W> {
    pub fn new(
        session: Session,
        options: RenameOptions,
        output: OutputFormat,
        use_color: bool,
        out: W,
    ) -> Self {
        Self {
            session,
            options,
            output,
            use_color,
            out,
            failed_batches: 0,
        }
    }

    pub fn run<R: BufRead>(&mut self, input: R) -> Result<()> {
        for (i, line) in input.lines().enumerate() {
            let line = line.context("Failed to read command")?;
            let result = parse_command(&line).and_then(|command| match command {
                Some(command) => self.execute(command),
                None => Ok(Flow::Continue),
            });

            match result {
                Ok(Flow::Continue) => {},
                Ok(Flow::Quit) => break,
                Err(e) => eprintln!("Error (line {}): {e:#}", i + 1),
            }
        }
        Ok(())
    }

    /// Report sets left unprocessed and fail if any batch failed
    pub fn finish(self) -> Result<()> {
        let pending = self.session.sets().len();
        if pending > 0 {
            eprintln!("Warning: {} set(s) were not processed", pending);
        }

        if self.failed_batches > 0 {
            bail!("{} batch(es) failed during processing", self.failed_batches);
        }
        Ok(())
    }

    fn execute(&mut self, command: ScriptCommand) -> Result<Flow> {
        match command {
            ScriptCommand::Add { size, items } => {
                let size: u8 = size
                    .parse()
                    .map_err(|_| anyhow!("Invalid set size: {}", size))?;
                let size = SetSize::try_from(size)?;
                let paths = self.resolve_items(&items)?;
                let set = self.session.assign(size, paths.clone())?;
                let result = AssignResult { set, files: paths };
                self.emit(&result)?;
            },
            ScriptCommand::Undo => {
                let result = match self.session.undo() {
                    Some(undone) => UndoResult {
                        set: Some(undone.set),
                        restored: undone.paths,
                    },
                    None => UndoResult {
                        set: None,
                        restored: Vec::new(),
                    },
                };
                self.emit(&result)?;
            },
            ScriptCommand::Sets => {
                let result = SetsResult {
                    sets: self.session.sets().clone(),
                    available: self.session.available().len(),
                };
                self.emit(&result)?;
            },
            ScriptCommand::Pool => {
                let text = self.format_pool();
                self.out.write_all(text.as_bytes())?;
            },
            ScriptCommand::Reset => {
                self.session.reset();
                writeln!(self.out, "Cleared all sets")?;
            },
            ScriptCommand::Process => {
                let result = process_operation(&mut self.session, &self.options, self.use_color)?;
                if !result.success {
                    self.failed_batches += 1;
                }
                self.emit(&result)?;
            },
            ScriptCommand::Help => self.out.write_all(HELP.as_bytes())?,
            ScriptCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn emit<T: OutputFormatter>(&mut self, result: &T) -> Result<()> {
        let text = result.format(self.output);
        match self.output {
            OutputFormat::Json => writeln!(self.out, "{}", text)?,
            OutputFormat::Summary => write!(self.out, "{}", text)?,
        }
        Ok(())
    }

    fn format_pool(&self) -> String {
        let available = self.session.available();
        if self.output == OutputFormat::Json {
            return format!(
                "{}\n",
                serde_json::json!({
                    "success": true,
                    "operation": "pool",
                    "available": available,
                })
            );
        }

        let mut output = String::new();
        writeln!(output, "{} file(s) available", available.len()).unwrap();
        for (i, path) in available.iter().enumerate() {
            writeln!(output, "{:>4}. {}", i + 1, display_name(path)).unwrap();
        }
        output
    }

    /// Turn pool indices and file names into paths, all against the current pool
    fn resolve_items(&self, items: &[String]) -> Result<Vec<PathBuf>> {
        let available = self.session.available();
        let primary = self
            .session
            .primary_folder()
            .ok_or_else(|| anyhow!("No primary folder selected"))?;

        items
            .iter()
            .map(|item| {
                if !item.is_empty() && item.chars().all(|c| c.is_ascii_digit()) {
                    let index: usize = item.parse().context("Invalid index")?;
                    return index
                        .checked_sub(1)
                        .and_then(|i| available.get(i))
                        .cloned()
                        .ok_or_else(|| anyhow!("No file at pool index {}", index));
                }

                let path = Path::new(item);
                Ok(if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    primary.join(path)
                })
            })
            .collect()
    }
}

fn parse_command(line: &str) -> Result<Option<ScriptCommand>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut tokens = tokenize(line)?.into_iter();
    let Some(name) = tokens.next() else {
        return Ok(None);
    };
    let rest: Vec<String> = tokens.collect();

    let command = match name.to_lowercase().as_str() {
        "add" => {
            let mut rest = rest.into_iter();
            let size = rest
                .next()
                .ok_or_else(|| anyhow!("Usage: add <size> <item>..."))?;
            ScriptCommand::Add {
                size,
                items: rest.collect(),
            }
        },
        "undo" => ScriptCommand::Undo,
        "sets" => ScriptCommand::Sets,
        "pool" => ScriptCommand::Pool,
        "reset" => ScriptCommand::Reset,
        "process" => ScriptCommand::Process,
        "help" => ScriptCommand::Help,
        "quit" | "exit" => ScriptCommand::Quit,
        other => bail!("Unknown command: {} (try 'help')", other),
    };

    Ok(Some(command))
}

/// Split on whitespace; double quotes group words and are dropped
fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                in_token = true;
            },
            c if c.is_whitespace() && !in_quotes => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            },
            c => {
                current.push(c);
                in_token = true;
            },
        }
    }

    if in_quotes {
        bail!("Unterminated quote");
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}
