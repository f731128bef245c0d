//! Per-building generation aggregator.

use tracing::{trace, warn};

use super::types::{SitingInputs, SourceContext};
use super::PowerSource;
use crate::building::PowerMode;

/// The set of power sources installed in one building.
///
/// Output is summed once per tick into a cached value that the grid reads
/// during measurement.
#[derive(Debug, Clone, Default)]
pub struct PowerGeneration {
    sources: Vec<PowerSource>,
    generated_power: f64,
    fuel_burned: f64,
}

impl PowerGeneration {
    pub fn new(sources: Vec<PowerSource>) -> Self {
        Self {
            sources,
            generated_power: 0.0,
            fuel_burned: 0.0,
        }
    }

    pub fn sources(&self) -> &[PowerSource] {
        &self.sources
    }

    pub fn sources_mut(&mut self) -> &mut [PowerSource] {
        &mut self.sources
    }

    /// Output cached by the last [`Self::time_passing`] call (kW).
    pub fn generated_power(&self) -> f64 {
        self.generated_power
    }

    /// Fuel burned during the last tick (kg).
    pub fn fuel_burned(&self) -> f64 {
        self.fuel_burned
    }

    /// Refreshes the cached output for one tick.
    ///
    /// Fuel generators follow the owning building's power mode: on while it
    /// draws any power and off when it is shut down. Non-finite source
    /// outputs are dropped from the sum.
    ///
    /// # Returns
    ///
    /// The new generated power (kW).
    pub fn time_passing(&mut self, mode: PowerMode, ctx: &mut SourceContext<'_>) -> f64 {
        let mut total = 0.0;
        let mut burned = 0.0;
        for source in &mut self.sources {
            if let PowerSource::Fuel(generator) = source {
                if mode == PowerMode::None {
                    generator.toggle_off();
                } else {
                    generator.toggle_on();
                }
            }
            let power = source.current_power(ctx);
            if !power.is_finite() {
                warn!(source = %source.source_type(), "dropping non-finite source output");
                continue;
            }
            trace!(source = %source.source_type(), power, "source output");
            total += power;
            if let PowerSource::Fuel(generator) = source {
                burned += generator.last_consumed();
            }
        }
        self.generated_power = total;
        self.fuel_burned = burned;
        total
    }

    /// Sum of the sources' siting estimates (kW).
    pub fn average_power(&self, siting: &SitingInputs) -> f64 {
        self.sources
            .iter()
            .map(|s| s.average_power(siting))
            .filter(|p| p.is_finite())
            .sum()
    }

    pub fn maintenance_time(&self) -> f64 {
        self.sources.iter().map(PowerSource::maintenance_time).sum()
    }
}

/// Siting value of a generation building.
///
/// Scales the building's supply by settlement demand relative to the supply
/// already present. For a building that already exists its own supply is
/// removed from `existing_supply` first.
///
/// # Arguments
///
/// * `building_supply` - Average power of the building being valued (kW)
/// * `demand` - Settlement power demand (kW)
/// * `existing_supply` - Settlement average supply (kW)
/// * `new_building` - Whether the building is a proposal rather than installed
pub fn function_value(
    building_supply: f64,
    demand: f64,
    existing_supply: f64,
    new_building: bool,
) -> f64 {
    let mut supply = existing_supply;
    if !new_building {
        supply = (supply - building_supply).max(0.0);
    }
    let value = building_supply * demand / (supply + 1.0);
    if value.is_finite() { value } else { 0.0 }
}
