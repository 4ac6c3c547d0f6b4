//! Command-line entrypoint: run the standard probe suite against a memory service.
//!
//! Exit codes: `0` when no check failed, `1` when at least one did, `2` on setup errors.
use anyhow::{Context, Result};
use clap::Parser;
use memprobe::{
    client::HttpMemoryClient,
    config::{self, Config},
    logging,
    report::{self, RunReport},
    suite,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "memprobe",
    version,
    about = "Smoke-test an MCP memory service and its local integration"
)]
struct Cli {
    /// Base URL of the memory service (overrides MCP_MEMORY_URL).
    #[arg(long)]
    url: Option<String>,
    /// Per-probe timeout in seconds (overrides MEMPROBE_TIMEOUT_SECS).
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,
    /// Workflow document that should reference the memory service.
    #[arg(long)]
    workflow_file: Option<PathBuf>,
    /// Directory of `*.md` command definitions to list.
    #[arg(long)]
    commands_dir: Option<PathBuf>,
    /// Emit the report as JSON instead of text.
    #[arg(long)]
    json: bool,
    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_tracing(&cli.log_level);

    match run(cli).await {
        Ok(report) => ExitCode::from(report.overall().exit_code()),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<RunReport> {
    let config = apply_overrides(
        config::init_config()
            .context("failed to load configuration")?
            .clone(),
        &cli,
    );
    let harness = suite::standard_harness(&config);
    tracing::info!(
        service_url = %config.service_url,
        probes = harness.len(),
        "Starting probe run"
    );

    let report = harness
        .run(|| async { HttpMemoryClient::from_config(&config) })
        .await;

    if cli.json {
        println!("{}", report::render_json(&report));
    } else {
        print!("{}", report::render_text(&report));
    }
    Ok(report)
}

fn apply_overrides(mut config: Config, cli: &Cli) -> Config {
    if let Some(url) = &cli.url {
        config.service_url = url.clone();
    }
    if let Some(secs) = cli.timeout {
        config.probe_timeout = Duration::from_secs(secs);
    }
    if let Some(path) = &cli.workflow_file {
        config.workflow_file = Some(path.clone());
    }
    if let Some(dir) = &cli.commands_dir {
        config.commands_dir = Some(dir.clone());
    }
    config
}
