use std::collections::BTreeMap;
use std::env;
use std::ffi::OsString;
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Command, ExitCode};

use clap::{ArgAction, CommandFactory, Parser};
use dotenv_codec::{EnvLoader, EnvMap, Error, SingleQuoteMode, SubstitutionMode, TargetEnv};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILE: &str = ".env";

const AFTER_HELP: &str = "\
Examples:
  dotenv cargo run
  dotenv -f .env.local,.env.production npm start
  dotenv -o -f .env.override python app.py

Files are loaded in order; later files take precedence for duplicate keys.

Exit codes:
  0    command executed successfully
  1    error loading .env files or executing command
  127  command not found";

/// Load environment variables from .env files and execute a command.
#[derive(Debug, Parser)]
#[command(
    name = "dotenv",
    version,
    disable_version_flag = true,
    after_help = AFTER_HELP
)]
struct Cli {
    /// Comma separated paths to .env files (default: .env).
    #[arg(short = 'f', long = "file", value_name = "PATHS", value_delimiter = ',')]
    files: Vec<String>,

    /// Override existing environment variables.
    #[arg(short = 'o', long = "override", visible_alias = "overload")]
    override_existing: bool,

    /// Keep `$VAR` placeholders in values as written.
    #[arg(long)]
    no_expand: bool,

    /// Treat single-quoted values as fully literal.
    #[arg(long)]
    literal_single_quotes: bool,

    /// Print loader diagnostics to stderr.
    #[arg(long)]
    verbose: bool,

    /// Show version.
    #[arg(short = 'v', long, action = ArgAction::Version)]
    version: Option<bool>,

    /// Command to run, followed by its arguments.
    #[arg(value_name = "COMMAND", trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<OsString>,
}

impl Cli {
    fn env_files(&self) -> Vec<PathBuf> {
        let files: Vec<PathBuf> = self
            .files
            .iter()
            .map(|file| file.trim())
            .filter(|file| !file.is_empty())
            .map(PathBuf::from)
            .collect();

        if files.is_empty() {
            vec![PathBuf::from(DEFAULT_FILE)]
        } else {
            files
        }
    }

    fn substitution_mode(&self) -> SubstitutionMode {
        if self.no_expand {
            SubstitutionMode::Disabled
        } else {
            SubstitutionMode::Expand
        }
    }

    fn single_quote_mode(&self) -> SingleQuoteMode {
        if self.literal_single_quotes {
            SingleQuoteMode::Literal
        } else {
            SingleQuoteMode::Expand
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    ExitCode::from(run(&cli))
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> u8 {
    let Some((program, args)) = cli.command.split_first() else {
        // Usage goes to stdout and is not an error, matching `--help`.
        if Cli::command().print_help().is_ok() {
            println!();
        }
        return 0;
    };

    let entries = match load_entries(cli) {
        Ok(entries) => entries,
        Err(err) => {
            eprintln!("Error loading .env files: {err}");
            return 1;
        }
    };

    let Ok(program_path) = which::which(program) else {
        eprintln!("Command not found: {}", program.to_string_lossy());
        return 127;
    };

    let mut command = Command::new(&program_path);
    command.args(args);
    #[cfg(unix)]
    command.arg0(program);

    for (key, value) in entries {
        if !cli.override_existing
            && env::var_os(&key).is_some_and(|existing| !existing.is_empty())
        {
            debug!(key = %key, "keeping existing environment value");
            continue;
        }
        command.env(key, value);
    }

    execute_command(command, program)
}

fn load_entries(cli: &Cli) -> Result<EnvMap, Error> {
    EnvLoader::new()
        .paths(cli.env_files())
        .substitution_mode(cli.substitution_mode())
        .single_quote_mode(cli.single_quote_mode())
        .target(TargetEnv::from_memory(snapshot_process_env()))
        .read()
}

fn snapshot_process_env() -> BTreeMap<String, String> {
    env::vars_os()
        .map(|(key, value)| {
            (
                key.to_string_lossy().into_owned(),
                value.to_string_lossy().into_owned(),
            )
        })
        .collect()
}

#[cfg(unix)]
fn execute_command(mut command: Command, program: &OsString) -> u8 {
    let err = command.exec();
    eprintln!(
        "Failed to execute command `{}`: {err}",
        program.to_string_lossy()
    );
    1
}

#[cfg(not(unix))]
fn execute_command(mut command: Command, program: &OsString) -> u8 {
    match command.status() {
        Ok(status) => status
            .code()
            .and_then(|code| u8::try_from(code).ok())
            .unwrap_or(1),
        Err(err) => {
            eprintln!(
                "Failed to execute command `{}`: {err}",
                program.to_string_lossy()
            );
            1
        }
    }
}
