//! flowdoc: turn JSDoc `@param`/`@returns` types into inline Flow annotations.
//!
//! - `flowdoc src/a.js` prints the converted source of one file
//! - `flowdoc src --write` rewrites every matching file in place
//! - `flowdoc src --check` exits non-zero when any file would change

use anyhow::{Context, Result};
use clap::Parser;
use flowdoc::{ConvertConfig, ConvertOutput, Converter, FileStatus, ReportPrinter};
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit code when `--check` finds files that would change
const EXIT_CHANGES: u8 = 1;
/// Exit code when some file could not be read or parsed
const EXIT_FAILURES: u8 = 2;

#[derive(Parser)]
#[command(
    name = "flowdoc",
    version,
    about = "Convert JSDoc parameter and return types into inline Flow annotations"
)]
struct Cli {
    /// Files or directories to convert
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Rewrite files in place
    #[arg(short = 'w', long)]
    write: bool,

    /// Report files that would change and exit non-zero if any would
    #[arg(long, conflicts_with = "write")]
    check: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Configuration file (defaults to the nearest flowdoc.toml)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Do not annotate return types
    #[arg(long)]
    no_returns: bool,

    /// File extensions picked up in directories. Can be given multiple times.
    #[arg(long = "ext", value_name = "EXT")]
    extensions: Vec<String>,
}

fn main() -> Result<ExitCode> {
    // FLOWDOC_LOG controls log output, default "warn"
    let filter = EnvFilter::try_from_env("FLOWDOC_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let single_file = cli.paths.len() == 1 && cli.paths[0].is_file();
    let output = Converter::new()
        .paths(cli.paths.iter().cloned())
        .config(config)
        .write(cli.write)
        .run()
        .context("conversion failed")?;

    if cli.json {
        let json = output.to_json().context("failed to serialize summary")?;
        println!("{json}");
    } else if single_file && !cli.write && !cli.check {
        print_source(&output)?;
    } else {
        ReportPrinter::new(&output, io::stdout().is_terminal()).print_to_stdout();
    }

    Ok(exit_code(&cli, &output))
}

/// Load `--config`, or the nearest `flowdoc.toml`, and apply flag overrides
fn load_config(cli: &Cli) -> Result<ConvertConfig> {
    let path = match &cli.config {
        Some(path) => Some(path.clone()),
        None => {
            let cwd = std::env::current_dir().context("failed to read current directory")?;
            ConvertConfig::discover(cwd)
        }
    };

    let mut config = match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading configuration");
            ConvertConfig::load(&path)
                .with_context(|| format!("failed to load {}", path.display()))?
        }
        None => ConvertConfig::default(),
    };

    if cli.no_returns {
        config = config.with_returns(false);
    }
    if cli.check {
        config = config.with_check(true);
    }
    if !cli.extensions.is_empty() {
        let extensions = cli
            .extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_string())
            .collect();
        config = config.with_extensions(extensions);
    }
    Ok(config)
}

/// Print the converted text of the only file
fn print_source(output: &ConvertOutput) -> Result<()> {
    let Some(file) = output.files.first() else {
        return Ok(());
    };
    if file.status == FileStatus::Failed {
        let reason = file.error.as_deref().unwrap_or("unknown error");
        eprintln!("error: {}: {}", file.path.display(), reason);
        return Ok(());
    }

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(file.output.as_deref().unwrap_or_default().as_bytes())
        .context("failed to write to stdout")?;
    Ok(())
}

fn exit_code(cli: &Cli, output: &ConvertOutput) -> ExitCode {
    if output.has_failures() {
        ExitCode::from(EXIT_FAILURES)
    } else if cli.check && output.has_changes() {
        ExitCode::from(EXIT_CHANGES)
    } else {
        ExitCode::SUCCESS
    }
}
