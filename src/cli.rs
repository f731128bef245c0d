//! Command-line arguments for the simulator binary.

use std::path::PathBuf;

use clap::Parser;

use crate::config::ScenarioConfig;

/// Mars settlement power grid simulator.
///
/// Runs a settlement through its grid balancing cascade and prints one line
/// per tick followed by a KPI report.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Load the scenario from a TOML file.
    #[clap(long, conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Use a built-in preset (baseline, fuel_backup, brownout).
    #[clap(long)]
    pub preset: Option<String>,

    /// Override the scenario's random seed.
    #[clap(long)]
    pub seed: Option<u64>,

    /// Override the number of ticks to run.
    #[clap(long)]
    pub ticks: Option<usize>,

    /// Export tick reports to a CSV file.
    #[clap(long = "telemetry-out")]
    pub telemetry_out: Option<PathBuf>,

    /// Print only the KPI report.
    #[clap(long, short)]
    pub quiet: bool,

    /// Start the REST API server after the run.
    #[cfg(feature = "api")]
    #[clap(long)]
    pub serve: bool,

    /// API server port.
    #[cfg(feature = "api")]
    #[clap(long, default_value = "3000")]
    pub port: u16,
}

impl Args {
    /// Resolves the scenario: `--scenario`, then `--preset`, then the baseline,
    /// with `--seed` and `--ticks` applied on top.
    ///
    /// # Errors
    ///
    /// Returns the `ConfigError` from loading the file or preset.
    pub fn load_scenario(&self) -> Result<ScenarioConfig, crate::config::ConfigError> {
        let mut scenario = if let Some(path) = &self.scenario {
            ScenarioConfig::from_toml_file(path)?
        } else if let Some(name) = &self.preset {
            ScenarioConfig::from_preset(name)?
        } else {
            ScenarioConfig::baseline()
        };
        if let Some(seed) = self.seed {
            scenario.simulation.seed = seed;
        }
        if let Some(ticks) = self.ticks {
            scenario.simulation.ticks = ticks;
        }
        Ok(scenario)
    }
}
