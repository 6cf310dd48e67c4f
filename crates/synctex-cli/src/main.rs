//! Command line front end for the synctex library.
//!
//! Usage:
//!   synctex code `<output>` `<name>` `<line>` `<column>`   - forward search
//!   synctex pdf `<output>` `<page>` `<x>` `<y>`            - backward search
//!   synctex update `<output>` [--magnification m] [--x-offset x] [--y-offset y]
//!   synctex dump `<output>`

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use synctex::{QueryError, Scanner, ScannerConfig, Updater};

#[derive(Parser)]
#[command(name = "synctex", about = "Query SyncTeX files", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a JSON scanner config
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Directory searched when the synctex file is not next to the output
    #[arg(long, global = true)]
    build_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Output positions produced by a line of an input file
    Code {
        /// The typeset document, e.g. main.pdf
        output: PathBuf,
        /// Input file name as recorded by the engine
        name: String,
        line: i32,
        #[arg(allow_negative_numbers = true)]
        column: i32,
    },

    /// Input lines that produced a point of a page
    Pdf {
        output: PathBuf,
        page: i32,
        /// Horizontal position in big points from the left of the page
        #[arg(allow_negative_numbers = true)]
        x: f32,
        /// Vertical position in big points from the top of the page
        #[arg(allow_negative_numbers = true)]
        y: f32,
    },

    /// Append post scriptum overrides to the synctex file
    Update {
        output: PathBuf,
        #[arg(long)]
        magnification: Option<String>,
        /// A dimension such as 1in or 12pt
        #[arg(long)]
        x_offset: Option<String>,
        #[arg(long)]
        y_offset: Option<String>,
    },

    /// Print the header and the parsed tree
    Dump { output: PathBuf },
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            let _ = err.print();
            return code;
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("synctex: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = ScannerConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.build_dir {
        config.build_directory = Some(dir);
    }
    let mut out = io::stdout().lock();

    match cli.command {
        Commands::Code {
            output,
            name,
            line,
            column,
        } => {
            let mut scanner = open(&output, &config)?;
            if report(scanner.forward_query(&name, line, column)) {
                for node in scanner.results() {
                    writeln!(
                        out,
                        "NODE\t{}\t{:.6}\t{:.6}\t{:.6}\t{:.6}",
                        node.page(),
                        node.box_visible_h(),
                        node.box_visible_v(),
                        node.box_visible_width(),
                        node.box_visible_height()
                    )?;
                }
            }
        }
        Commands::Pdf { output, page, x, y } => {
            let mut scanner = open(&output, &config)?;
            if report(scanner.backward_query(page, x, y)) {
                for node in scanner.results() {
                    let name = scanner.get_name(node.tag()).unwrap_or_default();
                    writeln!(out, "NODE\t{name}\t{}\t{}", node.line(), node.column())?;
                }
            }
        }
        Commands::Update {
            output,
            magnification,
            x_offset,
            y_offset,
        } => {
            let mut updater = Updater::new_with_output_file(&output, config.build_directory.as_deref())?;
            let path = updater.path().display().to_string();
            if let Some(value) = magnification {
                updater.append_magnification(&value)?;
            }
            if let Some(value) = x_offset {
                updater.append_x_offset(&value)?;
            }
            if let Some(value) = y_offset {
                updater.append_y_offset(&value)?;
            }
            updater.finish().with_context(|| format!("failed to update {path}"))?;
        }
        Commands::Dump { output } => {
            let scanner = open(&output, &config)?;
            write!(out, "{scanner}")?;
        }
    }
    out.flush()?;
    Ok(())
}

fn open(output: &Path, config: &ScannerConfig) -> Result<Scanner> {
    Scanner::with_config(output, config, true)
        .with_context(|| format!("cannot read synctex data for {}", output.display()))
}

/// A query that finds nothing prints nothing.
fn report(result: Result<usize, QueryError>) -> bool {
    match result {
        Ok(count) => count > 0,
        Err(err) => {
            log::warn!("{err}");
            false
        }
    }
}
