//! Tidemark binary
//!
//! Provisions a simulated cluster from a stress configuration and runs
//! convergence scenarios against it.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use serde::{Deserialize, Serialize};
use tidemark_sim::{SimCluster, SimConfig};
use tidemark_verifier::{
    CancellationToken, ConvergenceVerifier, Scenario, ScenarioReport, StressConfig,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "tidemark", version, about)]
struct Args {
    /// Stress configuration file (JSON). Defaults apply when omitted.
    config: Option<PathBuf>,

    /// Scenario to run. Repeat to run several; all run by default.
    #[arg(long = "scenario", short = 's')]
    scenarios: Vec<Scenario>,

    /// List available scenarios and exit.
    #[arg(long)]
    list: bool,

    /// Print reports as JSON.
    #[arg(long)]
    json: bool,
}

/// Everything a run needs: the stress settings plus the simulated network.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RunConfig {
    #[serde(flatten)]
    stress: StressConfig,
    simulation: SimConfig,
}

impl RunConfig {
    fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => RunConfig::default(),
        };
        config.stress.apply_env()?;
        config.stress.validate()?;
        config.simulation.validate()?;
        Ok(config)
    }
}

async fn run_scenario(
    scenario: Scenario,
    config: &RunConfig,
    cancel: &CancellationToken,
) -> anyhow::Result<ScenarioReport> {
    let cluster = SimCluster::new(config.stress.topology(), config.simulation.clone())?;
    let verifier = ConvergenceVerifier::new(config.stress.verifier_config())?
        .with_cancellation(cancel.child_token());

    let gossip_cancel = cancel.child_token();
    let gossip = cluster.spawn_gossip(gossip_cancel.clone());

    let report = scenario.run(&verifier, &cluster.handles(), &cluster).await;

    gossip_cancel.cancel();
    gossip.await.context("gossip task panicked")?;
    Ok(report)
}

fn print_report(report: &ScenarioReport) {
    let status = if report.passed() { "PASS" } else { "FAIL" };
    println!("{} {}", status, report.scenario);
    for check in &report.checks {
        let mark = if check.passed { "ok" } else { "not ok" };
        match &check.detail {
            Some(detail) => println!("  {} - {} ({})", mark, check.name, detail),
            None => println!("  {} - {}", mark, check.name),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tidemark=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    if args.list {
        for scenario in Scenario::ALL {
            println!("{:<22} {}", scenario.name(), scenario.description());
        }
        return Ok(ExitCode::SUCCESS);
    }

    let config = RunConfig::load(args.config.as_deref())?;
    let topology = config.stress.topology();
    tracing::info!(
        nodes = topology.nodes,
        conductors = topology.conductors,
        instances = topology.instances,
        retries = config.stress.retries,
        "loaded configuration"
    );

    let scenarios = if args.scenarios.is_empty() {
        Scenario::ALL.to_vec()
    } else {
        args.scenarios
    };

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling");
            ctrl_c.cancel();
        }
    });

    let mut reports = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        let report = run_scenario(scenario, &config, &cancel).await?;
        if !args.json {
            print_report(&report);
        }
        reports.push(report);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    let failed = reports.iter().filter(|r| !r.passed()).count();
    if failed > 0 {
        tracing::error!(failed, total = reports.len(), "scenarios failed");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
