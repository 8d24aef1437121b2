//! WinHello - cross-window handshake harness
//!
//! CLI entry point for checking readiness gates against simulated contexts.

use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::info;

use winhello::cli::{Cli, Command, OutputFormat};
use winhello::config::Config;
use winhello::coordinator::HandshakeCoordinator;
use winhello::launcher::{SimLauncher, WindowSpec};
use winhello::rig::WindowRig;
use winhello::signal::Hello;

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate()?;

    match cli.command {
        Command::Check {
            windows,
            timeout_ms,
            delay_ms,
            silence,
            format,
        } => cmd_check(&config, windows, timeout_ms, delay_ms, silence, format).await,
        Command::Config => cmd_config(&config),
    }
}

/// One row of the readiness report
#[derive(Debug, serde::Serialize)]
struct CheckRow {
    name: String,
    domain: String,
}

/// Readiness report for the whole gate
#[derive(Debug, serde::Serialize)]
struct CheckReport {
    windows: Vec<CheckRow>,
    #[serde(rename = "elapsed-ms")]
    elapsed_ms: u64,
}

async fn cmd_check(
    config: &Config,
    windows: Option<usize>,
    timeout_ms: Option<u64>,
    delay_ms: Option<u64>,
    silence: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let specs: Vec<WindowSpec> = match windows {
        Some(n) => (1..=n).map(|i| WindowSpec::frame(format!("frame-{i}"))).collect(),
        None => config.rig.windows.clone(),
    };

    let handshake = winhello::config::HandshakeConfig {
        hello_timeout_ms: timeout_ms.unwrap_or(config.handshake.hello_timeout_ms),
        ..config.handshake.clone()
    };
    let delay = Duration::from_millis(delay_ms.unwrap_or(config.rig.sim_delay_ms));

    let coordinator = HandshakeCoordinator::with_config(handshake);
    let mut launcher = SimLauncher::new(coordinator.clone(), delay, config.rig.sim_domain.clone());
    if let Some(name) = silence {
        launcher = launcher.with_silent(name);
    }

    let rig = WindowRig::new(Arc::new(launcher), specs);

    info!(windows = rig.expected().len(), "launching contexts");
    rig.launch_all().await?;

    let started = Instant::now();
    let ready: Vec<(String, Hello)> = match rig.await_all_ready(&coordinator).await {
        Ok(ready) => ready,
        Err(e) => {
            eprintln!("{} readiness gate failed: {}", "✗".red(), e);
            return Err(e).context("Readiness gate failed");
        }
    };
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let report = CheckReport {
        windows: ready
            .into_iter()
            .map(|(name, hello)| CheckRow {
                name,
                domain: hello.domain,
            })
            .collect(),
        elapsed_ms,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => {
            for row in &report.windows {
                println!("{} {}  {}", "✓".green(), row.name.cyan(), row.domain);
            }
            println!(
                "{} {} windows ready in {}ms",
                "✓".green(),
                report.windows.len(),
                report.elapsed_ms
            );
        }
    }

    Ok(())
}

fn cmd_config(config: &Config) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("Failed to render configuration")?;
    print!("{}", yaml);
    Ok(())
}
