use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use querysheet_engine::io::{UmyaWorkbook, WorkbookWriter};
use querysheet_engine::spec::ReportManifest;
use querysheet_engine::{DriverRegistry, ReportRunner};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "querysheet", version, about = "Render SQL query results into spreadsheets")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse and validate a report manifest.
    Lint(LintArgs),
    /// Run every query of a report and save the workbook.
    Run(RunArgs),
    /// List the drivers compiled into this build.
    Drivers,
}

#[derive(Parser, Debug)]
struct LintArgs {
    manifest: PathBuf,

    /// Print issues as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct RunArgs {
    manifest: PathBuf,

    /// Where to write the rendered workbook.
    #[arg(short, long)]
    output: PathBuf,

    /// Existing workbook to render into; its other cells are kept.
    #[arg(long)]
    template: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::Lint(args) => lint(args),
        Command::Run(args) => run(args),
        Command::Drivers => {
            for name in DriverRegistry::with_defaults().names() {
                println!("{name}");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_manifest(path: &Path) -> Result<ReportManifest> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    ReportManifest::from_yaml_reader(file)
        .with_context(|| format!("failed to parse {}", path.display()))
}

fn lint(args: LintArgs) -> Result<ExitCode> {
    let manifest = load_manifest(&args.manifest)?;
    let issues = match manifest.validate() {
        Ok(()) => Vec::new(),
        Err(err) => err.into_issues(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&issues)?);
    } else if issues.is_empty() {
        println!(
            "{}: ok ({} queries)",
            args.manifest.display(),
            manifest.queries.len()
        );
    } else {
        for issue in &issues {
            println!("{issue}");
        }
    }

    Ok(if issues.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run(args: RunArgs) -> Result<ExitCode> {
    let manifest = load_manifest(&args.manifest)?;
    let mut workbook = match &args.template {
        Some(path) => UmyaWorkbook::open_path(path)
            .with_context(|| format!("failed to open template {}", path.display()))?,
        None => UmyaWorkbook::new(),
    };

    let registry = DriverRegistry::with_defaults();
    let mut runner = ReportRunner::new(&registry).with_progress(|p| {
        tracing::info!(percent = p.percent, "{}", p.message);
    });
    let summary = runner
        .run(&manifest, &mut workbook)
        .with_context(|| format!("report {} is invalid", args.manifest.display()))?;

    workbook
        .save_to_path(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    for outcome in &summary.outcomes {
        match &outcome.result {
            Ok(rendered) => println!(
                "{}: {} rows x {} columns -> {}!{}",
                outcome.query,
                rendered.rows,
                rendered.column_count(),
                outcome.sheet,
                rendered.range
            ),
            Err(err) => println!("{}: FAILED: {err}", outcome.query),
        }
    }

    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
