//! CLI argument parsing for pagetrail.
//!
//! This module defines the command-line interface structure using `clap`.
//! It is also compiled by the build script to render the man page, so it
//! must only depend on `clap` and the `pagetrail` library.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

use pagetrail::audit::{EventKind, ExportFormat, NewAuditEvent};
use pagetrail::config::{AuditConfig, CompressionLevel, Config, OverwriteMode};
use pagetrail::error::{PageTrailError, Result};
use pagetrail::utils::collect_paths_for_patterns;

/// Merge PDF files and keep an audit trail of document review.
#[derive(Parser, Debug)]
#[command(name = "pagetrail")]
#[command(version)]
#[command(about = "Merge PDF files and keep an audit trail of document review", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Directory holding the audit log
    ///
    /// Defaults to ./.pagetrail when neither this flag nor the
    /// environment variable is set.
    #[arg(long, global = true, env = "PAGETRAIL_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Verbose output - show per-input details and info-level logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Concatenate PDF files into one document, in the order given
    Merge(MergeArgs),

    /// Inspect or manage the audit log
    #[command(subcommand)]
    Audit(AuditCommand),
}

/// Arguments of `pagetrail merge`.
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Input PDF files to merge (in order)
    ///
    /// Glob patterns are expanded in place, matches sorted by name.
    ///
    /// Examples:
    ///   pagetrail merge intro.pdf chapter*.pdf -o book
    #[arg(required = true, value_name = "FILE")]
    pub inputs: Vec<String>,

    /// Output file name; ".pdf" is appended when missing
    #[arg(short, long, value_name = "NAME")]
    pub output: PathBuf,

    /// Overwrite an existing output file without asking
    #[arg(short, long)]
    pub force: bool,

    /// Never overwrite an existing output file
    #[arg(long, conflicts_with = "force")]
    pub no_clobber: bool,

    /// Compression level for the output PDF
    ///
    /// - none: write streams as they were read
    /// - standard: compress uncompressed streams (default)
    /// - maximum: drop unreachable objects, then compress
    #[arg(short, long, value_name = "LEVEL", default_value = "standard")]
    #[arg(value_parser = ["none", "standard", "maximum"])]
    pub compression: String,

    /// Number of inputs loaded concurrently (default: CPU cores)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,
}

/// `pagetrail audit` subcommands.
#[derive(Subcommand, Debug)]
pub enum AuditCommand {
    /// List recorded events, newest first
    List {
        /// Show at most N events
        #[arg(short = 'n', long, value_name = "N")]
        limit: Option<usize>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Delete every recorded event
    Clear,

    /// Write the log to a file ("-" for stdout)
    Export {
        /// Destination file
        #[arg(value_name = "FILE")]
        output: PathBuf,

        /// Output format
        #[arg(long, value_name = "FORMAT", default_value = "json")]
        #[arg(value_parser = ["json", "jsonl", "csv"])]
        format: String,
    },

    /// Append an event by hand
    Record(RecordArgs),
}

/// Arguments of `pagetrail audit record`.
#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Event kind, e.g. page-navigation or annotation-added
    #[arg(value_name = "KIND")]
    pub kind: String,

    /// Page the event refers to
    #[arg(long, value_name = "PAGE", conflicts_with_all = ["from", "to"])]
    pub page: Option<u32>,

    /// Page an item moved from
    #[arg(long, value_name = "PAGE", requires = "to")]
    pub from: Option<u32>,

    /// Page an item moved to
    #[arg(long, value_name = "PAGE", requires = "from")]
    pub to: Option<u32>,

    /// Document the event happened in
    #[arg(long, value_name = "NAME")]
    pub document: Option<String>,

    /// Free-form description
    #[arg(short, long, value_name = "TEXT")]
    pub detail: Option<String>,
}

impl Cli {
    /// Audit log location from `--data-dir`, the environment or the default.
    pub fn audit_config(&self) -> AuditConfig {
        AuditConfig::resolve(self.data_dir.clone())
    }

    /// Convert merge arguments into a validated Config.
    ///
    /// # Errors
    ///
    /// Returns an error if a glob pattern is invalid or the resulting
    /// configuration fails validation.
    pub fn merge_config(&self, args: &MergeArgs) -> Result<Config> {
        let compression = CompressionLevel::from_str(&args.compression)?;

        let overwrite_mode = if args.force {
            OverwriteMode::Force
        } else if args.no_clobber {
            OverwriteMode::NoClobber
        } else {
            OverwriteMode::Prompt
        };

        let config = Config {
            inputs: collect_paths_for_patterns(&args.inputs)?,
            output: args.output.clone(),
            verbose: self.verbose,
            quiet: self.quiet,
            overwrite_mode,
            compression,
            jobs: args.jobs,
        };

        config.validate()?;
        Ok(config)
    }
}

impl RecordArgs {
    /// Build the event to append.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown kind or a zero page number.
    pub fn to_event(&self) -> Result<NewAuditEvent> {
        let kind = EventKind::from_str(&self.kind)?;
        let mut event = NewAuditEvent::new(kind);

        let pages = [self.page, self.from, self.to];
        if pages.contains(&Some(0)) {
            return Err(PageTrailError::invalid_config("Page numbers start at 1"));
        }

        if let Some(page) = self.page {
            event = event.page(page);
        } else if let (Some(from), Some(to)) = (self.from, self.to) {
            event = event.range(from, to);
        }
        if let Some(document) = &self.document {
            event = event.document(document.clone());
        }
        if let Some(detail) = &self.detail {
            event = event.detail(detail.clone());
        }
        Ok(event)
    }
}

/// Parse the `--format` value of `audit export`.
pub fn export_format(value: &str) -> Result<ExportFormat> {
    ExportFormat::from_str(value)
}
