//! Python Comment Analysis Tool
//!
//! Counts `#` comments and docstring blocks in Python source files, prints a
//! per-file report with comment line and character ratios, and can strip the
//! comments from the files in place.

mod error;
mod logger;
mod report;
mod rewrite;
mod scanner;
mod walker;

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use colored::*;

use crate::error::{NotesError, Result};
use crate::report::FileReport;
use crate::walker::WalkOptions;

#[derive(Parser, Debug)]
#[command(
    name = "pynotes",
    author,
    version,
    about = "Count or remove comments in Python source files",
    long_about = "Count or remove notes from a .py file or a directory of .py files. \
                  Both '#' comments and bare triple-quoted docstring blocks are treated as notes.",
    color = clap::ColorChoice::Always
)]
struct Args {
    /// Files or directories to process
    #[arg(value_name = "PATH", required = true)]
    paths: Vec<PathBuf>,

    /// Report comment statistics (the default)
    #[arg(short = 'c', long = "count_notes", conflicts_with = "remove_notes")]
    count_notes: bool,

    /// Remove comments, overwriting the files in place
    #[arg(short = 'r', long = "remove_notes")]
    remove_notes: bool,

    /// Print the count report as JSON
    #[arg(long, conflicts_with = "remove_notes")]
    json: bool,

    /// Directory names to skip while walking
    #[arg(short, long, action = ArgAction::Append)]
    ignore: Vec<String>,

    #[arg(short, long)]
    verbose: bool,

    #[arg(short = 'd', long, default_value = "100")]
    max_depth: usize,

    #[arg(short = 'n', long)]
    non_recursive: bool,

    /// Only process files whose path relative to the walked directory matches this glob
    #[arg(short = 'f', long)]
    filespec: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Count,
    Remove,
}

impl Args {
    fn mode(&self) -> Mode {
        match (self.count_notes, self.remove_notes) {
            (false, true) => Mode::Remove,
            _ => Mode::Count,
        }
    }

    fn walk_options(&self) -> Result<WalkOptions> {
        Ok(WalkOptions {
            ignore: self.ignore.clone(),
            non_recursive: self.non_recursive,
            max_depth: self.max_depth,
            filespec: WalkOptions::parse_filespec(self.filespec.as_deref())?,
        })
    }
}

#[derive(Debug, Default)]
struct RunSummary {
    files_scanned: u64,
    files_rewritten: u64,
    comment_lines_removed: u64,
    error_count: usize,
}

impl RunSummary {
    fn record_error(&mut self, err: &NotesError) {
        err.emit();
        if !err.is_warning() {
            self.error_count += 1;
        }
    }
}

fn main() -> ExitCode {
    match run_with_args(std::env::args_os()) {
        Ok(summary) if summary.error_count == 0 => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(err) => {
            err.emit();
            ExitCode::FAILURE
        }
    }
}

fn run_with_args<I, T>(args: I) -> Result<RunSummary>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args = Args::parse_from(args);
    logger::init_cli_logger(args.verbose);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_cli(&args, &mut out)
}

fn run_cli(args: &Args, out: &mut dyn Write) -> Result<RunSummary> {
    let options = args.walk_options()?;
    let mode = args.mode();
    let mut summary = RunSummary::default();
    let mut json_reports = Vec::new();
    let mut printed_reports = 0usize;

    for path in &args.paths {
        let targets = match walker::resolve_targets(path, &options) {
            Ok(targets) => targets,
            Err(err) => {
                summary.record_error(&err);
                continue;
            }
        };
        for err in &targets.errors {
            summary.record_error(err);
        }

        for file in &targets.files {
            summary.files_scanned += 1;
            match mode {
                Mode::Count => match walker::read_source(file) {
                    Ok(source) => {
                        let report = FileReport::new(file, scanner::scan(&source));
                        if args.json {
                            json_reports.push(report);
                        } else {
                            out.write_all(report::format_file_report(&report).as_bytes())?;
                            printed_reports += 1;
                        }
                    }
                    Err(err) => summary.record_error(&err),
                },
                Mode::Remove => {
                    tracing::debug!("removing notes from {}", file.display());
                    match rewrite::remove_notes_in_file(file) {
                        Ok(outcome) => {
                            if outcome.rewritten {
                                summary.files_rewritten += 1;
                                summary.comment_lines_removed += outcome.comment_lines as u64;
                            }
                        }
                        Err(err) => summary.record_error(&err),
                    }
                }
            }
        }
    }

    match mode {
        Mode::Count if args.json => {
            writeln!(out, "{}", report::render_json(&json_reports)?)?;
        }
        Mode::Count => {
            if printed_reports > 0 {
                out.write_all(report::closing_rule().as_bytes())?;
            }
        }
        Mode::Remove => write_removal_summary(out, &summary)?,
    }
    out.flush()?;

    Ok(summary)
}

fn write_removal_summary(out: &mut dyn Write, summary: &RunSummary) -> io::Result<()> {
    writeln!(out, "{}", "Removal Summary:".blue().bold())?;
    writeln!(
        out,
        "Files scanned: {}",
        summary.files_scanned.to_string().bright_yellow()
    )?;
    writeln!(
        out,
        "Files rewritten: {}",
        summary.files_rewritten.to_string().bright_yellow()
    )?;
    writeln!(
        out,
        "Comment lines removed: {}",
        summary.comment_lines_removed.to_string().bright_yellow()
    )?;
    if summary.error_count > 0 {
        writeln!(
            out,
            "{}: {}",
            "Errors".red().bold(),
            summary.error_count.to_string().bright_yellow()
        )?;
    }
    Ok(())
}
