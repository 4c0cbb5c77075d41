//! Batch runner for the order center simulator
//!
//! ```text
//! smo-sim [config.json] [horizon]
//! ```
//!
//! Runs one simulation up to `horizon` (default 100) and prints the final
//! statistics as JSON. Set `RUST_LOG=debug` to trace every event.

use smo_simulator_core_rs::{Simulator, SimulatorConfig};
use std::error::Error;
use std::process::ExitCode;

const DEFAULT_HORIZON: f64 = 100.0;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let config = match args.first() {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read config {}: {}", path, e))?;
            serde_json::from_str::<SimulatorConfig>(&text)
                .map_err(|e| format!("invalid config {}: {}", path, e))?
        }
        None => SimulatorConfig::default(),
    };

    let horizon = match args.get(1) {
        Some(raw) => raw
            .parse::<f64>()
            .map_err(|e| format!("invalid horizon {:?}: {}", raw, e))?,
        None => DEFAULT_HORIZON,
    };

    let mut simulator = Simulator::new(config)?;
    simulator.initialize(horizon)?;
    simulator.run_until(horizon)?;

    let summary = simulator.statistics_summary();
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
