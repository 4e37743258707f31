use std::fs;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sg_audit::report::{
    generate_cleanup_script, JsonReporter, MarkdownReporter, Reporter, TerminalReporter,
};
use sg_audit::{
    AuditConfig, AuditEngine, AuditError, Cli, Inventory, OutputFormat, Result, RunStatus,
};

/// Exit code for "nothing to analyze", distinct from both success and
/// findings.
const EXIT_EMPTY_INVENTORY: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => AuditConfig::load(path)?,
        None => AuditConfig::discover(std::path::Path::new("."))?,
    };

    let inventory = if cli.inventory.is_dir() {
        Inventory::from_dir(&cli.inventory)?
    } else {
        Inventory::from_file(&cli.inventory)?
    };

    let engine = AuditEngine::new(config);
    let report = engine.run(inventory);

    let rendered = match cli.format {
        OutputFormat::Terminal => TerminalReporter::new(cli.verbose).report(&report),
        OutputFormat::Json => JsonReporter::new().report(&report),
        OutputFormat::Markdown => MarkdownReporter::new().report(&report),
    };

    match &cli.output {
        Some(path) => {
            fs::write(path, &rendered).map_err(|source| AuditError::Write {
                path: path.clone(),
                source,
            })?;
            info!(path = %path.display(), "report written");
        }
        None => print!("{rendered}"),
    }

    if let Some(path) = &cli.remediation_script {
        let script = generate_cleanup_script(&report);
        fs::write(path, script).map_err(|source| AuditError::Write {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), "cleanup script written");
    }

    if report.status == RunStatus::EmptyInventory {
        return Ok(ExitCode::from(EXIT_EMPTY_INVENTORY));
    }
    let failed = if cli.strict {
        report.summary.total() > 0
    } else {
        !report.passed()
    };
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
