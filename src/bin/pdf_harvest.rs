use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use pdf_harvester::app::{Harvester, ProgressSink};
use pdf_harvester::config::{ConfigLoader, ResolvedConfig};
use pdf_harvester::error::HarvestError;
use pdf_harvester::output::{JsonOutput, LogProgress};
use pdf_harvester::tabular::TableFormat;
use pdf_harvester::transport::{HttpTransport, Transport, TransportResponse};

#[derive(Parser)]
#[command(name = "pdf-harvest")]
#[command(about = "Download one PDF per spreadsheet row and keep a download-status table in sync")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[arg(long, global = true)]
    format: Option<TableFormat>,

    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Download missing PDFs and rewrite the metadata table")]
    Run(RunArgs),
    #[command(about = "Check the metadata table against the destination directory")]
    Verify(VerifyArgs),
}

#[derive(Args)]
struct RunArgs {
    #[arg(long)]
    input: Option<String>,

    #[arg(long)]
    output: Option<String>,

    #[arg(long)]
    destination: Option<String>,

    #[arg(long)]
    workers: Option<usize>,

    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[derive(Args)]
struct VerifyArgs {
    #[arg(long)]
    output: Option<String>,

    #[arg(long)]
    destination: Option<String>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<HarvestError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &HarvestError) -> u8 {
    match error {
        HarvestError::InvalidArgument(_)
        | HarvestError::InvalidWorkerCount(_)
        | HarvestError::MissingColumn { .. }
        | HarvestError::DuplicateKey { .. }
        | HarvestError::TableRead { .. }
        | HarvestError::ConfigRead(_)
        | HarvestError::ConfigParse(_) => 2,
        HarvestError::Http(_) | HarvestError::HttpStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ConfigLoader::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Run(args) => run_download(args, &config, cli.format, cli.quiet),
        Commands::Verify(args) => run_verify(args, &config, cli.format),
    }
}

fn run_download(
    args: RunArgs,
    config: &ResolvedConfig,
    format: Option<TableFormat>,
    quiet: bool,
) -> miette::Result<()> {
    let input = args.input.or_else(|| config.input.clone()).unwrap_or_default();
    let output = args
        .output
        .or_else(|| config.output.clone())
        .unwrap_or_default();
    let destination = args
        .destination
        .or_else(|| config.destination.clone())
        .unwrap_or_default();
    let workers = args.workers.unwrap_or(config.workers);
    let timeout = Duration::from_secs(args.timeout_secs.unwrap_or(config.timeout_secs));

    let format = format
        .or(config.format)
        .unwrap_or_else(|| TableFormat::from_path(&input));
    let transport = HttpTransport::with_timeout(timeout)?;
    let harvester = Harvester::new(workers, transport, format.store(), config.columns.clone())?;

    let sink: &dyn ProgressSink = if quiet { &JsonOutput } else { &LogProgress };
    let summary = harvester.start_download(&input, &output, &destination, sink)?;
    JsonOutput::print_run(&summary).into_diagnostic()?;
    Ok(())
}

fn run_verify(
    args: VerifyArgs,
    config: &ResolvedConfig,
    format: Option<TableFormat>,
) -> miette::Result<()> {
    let output = args
        .output
        .or_else(|| config.output.clone())
        .unwrap_or_default();
    let destination = args
        .destination
        .or_else(|| config.destination.clone())
        .unwrap_or_default();
    let format = format
        .or(config.format)
        .unwrap_or_else(|| TableFormat::from_path(&output));

    let harvester = Harvester::new(1, NopTransport, format.store(), config.columns.clone())?;
    let report = harvester.verify(&output, &destination)?;
    JsonOutput::print_audit(&report).into_diagnostic()?;
    if !report.is_consistent() {
        return Err(miette::Report::msg(format!(
            "metadata and destination disagree: {} missing, {} unrecorded",
            report.claimed_missing.len(),
            report.unclaimed_present.len()
        )));
    }
    Ok(())
}

struct NopTransport;

impl Transport for NopTransport {
    fn fetch(&self, _url: &str) -> Result<TransportResponse, HarvestError> {
        Err(HarvestError::Http("transport not configured".to_string()))
    }
}
