//! pagetrail - Merge PDF files and keep an audit trail of document review.

mod cli;

use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::process;

use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::cli::{AuditCommand, Cli, Command, MergeArgs, RecordArgs, export_format};
use pagetrail::audit::{EventKind, ExportFormat, NewAuditEvent, export_events};
use pagetrail::config::{Config, OverwriteMode};
use pagetrail::error::PageTrailError;
use pagetrail::io::PdfWriter;
use pagetrail::merge::{MergeOutput, MergeRequest, Merger};
use pagetrail::output::{OutputFormatter, audit_table_lines, display_merge_summary};
use pagetrail::session::Session;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err}");
        process::exit(err.exit_code());
    }
}

/// Install the log subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "pagetrail=info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Main application logic.
async fn run(cli: Cli) -> Result<(), PageTrailError> {
    match &cli.command {
        Command::Merge(args) => run_merge(&cli, args).await,
        Command::Audit(command) => run_audit(&cli, command),
    }
}

async fn run_merge(cli: &Cli, args: &MergeArgs) -> Result<(), PageTrailError> {
    let config = cli.merge_config(args)?;
    let formatter = OutputFormatter::from_config(&config);
    let output_path = config.output_path();

    let writer = PdfWriter::new();
    writer.can_write(&output_path).await?;
    if writer.exists(&output_path).await {
        handle_output_overwrite(&config, &formatter)?;
    }

    // The merge still runs when the audit log is unreachable.
    let session = match Session::open(&cli.audit_config()) {
        Ok(session) => session,
        Err(err) => {
            warn!(error = %err, "audit log unavailable, continuing without it");
            formatter.warning(&format!("Audit log unavailable: {err}"));
            Session::in_memory()
        }
    };

    merge_then_dispose(&session, &config, &formatter, &writer).await
}

/// Run the merge in `session`, then dispose it whatever the outcome.
async fn merge_then_dispose(
    session: &Session,
    config: &Config,
    formatter: &OutputFormatter,
    writer: &PdfWriter,
) -> Result<(), PageTrailError> {
    let result = merge_in_session(session, config, formatter, writer).await;
    session.dispose();
    result
}

/// Merge, write and record the output.
async fn merge_in_session(
    session: &Session,
    config: &Config,
    formatter: &OutputFormatter,
    writer: &PdfWriter,
) -> Result<(), PageTrailError> {
    let output_path = config.output_path();
    let file_name = output_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let request = MergeRequest::from_paths(&config.inputs, &file_name)?;

    formatter.info(&format!("Merging {} file(s)...", config.inputs.len()));
    for (index, input) in config.inputs.iter().enumerate() {
        formatter.debug(&format!("#{} {}", index + 1, input.display()));
    }

    let output = Merger::from_config(config)
        .merge(session, &request)
        .await
        .inspect_err(|err| {
            if let Some(index) = err.failing_index()
                && let Some(input) = config.inputs.get(index - 1)
            {
                formatter.error(&format!("Input #{index} is {}", input.display()));
            }
        })?;

    let write_stats = writer.save(&output.bytes, &output_path).await?;
    display_merge_summary(formatter, &output, &write_stats.output_path);

    record_merge(session, formatter, config, &output);
    Ok(())
}

/// Log a finished merge. Failures are reported but never fail the merge.
fn record_merge(
    session: &Session,
    formatter: &OutputFormatter,
    config: &Config,
    output: &MergeOutput,
) {
    let names: Vec<String> = config
        .inputs
        .iter()
        .map(|path| {
            path.file_name()
                .unwrap_or(path.as_os_str())
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    let event = NewAuditEvent::new(EventKind::DocumentMerged)
        .document(output.file_name.as_str())
        .detail(format!(
        "{} -> {} ({} pages)",
        names.join(", "),
        output.file_name,
        output.total_pages
    ));

    let appended = session
        .audit_store()
        .and_then(|store| store.append(event));
    if let Err(err) = appended {
        warn!(error = %err, "could not record merge");
        formatter.warning(&format!("Merge not recorded in audit log: {err}"));
    }
}

fn run_audit(cli: &Cli, command: &AuditCommand) -> Result<(), PageTrailError> {
    let formatter = OutputFormatter::new(cli.quiet, cli.verbose);
    let session = Session::open(&cli.audit_config())?;

    let result = match command {
        AuditCommand::List { limit, json } => list_events(&session, *limit, *json),
        AuditCommand::Clear => session.clear_audit_events().map(|()| {
            formatter.success("Audit log cleared");
        }),
        AuditCommand::Export { output, format } => {
            export_to(&session, &formatter, output, export_format(format)?)
        }
        AuditCommand::Record(args) => record_event(&session, &formatter, args),
    };

    session.dispose();
    result
}

fn list_events(session: &Session, limit: Option<usize>, json: bool) -> Result<(), PageTrailError> {
    let mut events = session.audit_events()?;
    if let Some(limit) = limit {
        events.truncate(limit);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        export_events(&events, ExportFormat::Json, &mut out)?;
    } else {
        for line in audit_table_lines(&events) {
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}

fn export_to(
    session: &Session,
    formatter: &OutputFormatter,
    output: &Path,
    format: ExportFormat,
) -> Result<(), PageTrailError> {
    let events = session.audit_events()?;

    if output == Path::new("-") {
        export_events(&events, format, io::stdout().lock())?;
        return Ok(());
    }

    let file = File::create(output).map_err(|source| PageTrailError::FailedToWrite {
        path: output.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    let count = export_events(&events, format, &mut writer)?;
    writer.flush()?;

    formatter.success(&format!("Exported {count} event(s) to {}", output.display()));
    Ok(())
}

fn record_event(
    session: &Session,
    formatter: &OutputFormatter,
    args: &RecordArgs,
) -> Result<(), PageTrailError> {
    let event = session.audit_store()?.append(args.to_event()?)?;
    formatter.success(&format!(
        "Recorded #{} {} (page {})",
        event.sequence(),
        event.kind().label(),
        event.page()
    ));
    Ok(())
}

/// Handle output file overwrite scenarios.
fn handle_output_overwrite(
    config: &Config,
    formatter: &OutputFormatter,
) -> Result<(), PageTrailError> {
    let output = config.output_path();
    if !output.exists() {
        return Ok(());
    }

    match config.overwrite_mode {
        OverwriteMode::Force => Ok(()),
        OverwriteMode::NoClobber => Err(PageTrailError::output_exists(output)),
        OverwriteMode::Prompt => {
            // No one to ask in quiet mode
            if formatter.is_quiet() {
                return Err(PageTrailError::output_exists(output));
            }

            formatter.warning(&format!("Output file already exists: {}", output.display()));
            print!("Overwrite? [y/N]: ");
            io::stdout().flush().ok();

            let mut response = String::new();
            io::stdin()
                .read_line(&mut response)
                .map_err(|err| PageTrailError::other(format!("Failed to read input: {err}")))?;

            match response.trim().to_lowercase().as_str() {
                "y" | "yes" => Ok(()),
                _ => Err(PageTrailError::Cancelled),
            }
        }
    }
}
