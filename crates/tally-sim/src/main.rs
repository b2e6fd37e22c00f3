//! tally-sim: drives the distribution and vesting components through a
//! scenario described in a TOML file.
//!
//! Usage:
//!   tally-sim [config.toml]
//!
//! Without an argument the config path comes from `TALLY_CONFIG`, then
//! `./tally.toml`. The JSON report is written to stdout; logs go to stderr.

mod config;
mod sim;

use std::path::PathBuf;

use tracing::info;

use crate::config::SimConfig;
use crate::sim::Simulation;

fn main() -> anyhow::Result<()> {
    let path = std::env::args().nth(1).map(PathBuf::from);
    let config = SimConfig::load(path.as_deref())?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("tally={}", config.logging.level).parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(steps = config.steps.len(), "tally simulation starting");

    let simulation = Simulation::new(&config)?;
    let report = simulation.run(&config.steps);

    let failed = report.outcomes.iter().filter(|o| !o.ok).count();
    info!(
        failed,
        total_credited = %report.total_credited,
        released_total = report.vesting.released_total,
        "tally simulation finished"
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
