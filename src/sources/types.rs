//! Shared types for power sources: identity, construction specs, and tick context.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::environment::Environment;
use crate::grid::clock::HOURS_PER_MILLISOL;
use crate::inventory::{ResourceId, ResourceStore};

/// Every power source type the grid knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerSourceType {
    Fission,
    Thermionic,
    Solar,
    SolarThermal,
    Wind,
    Areothermal,
    Fuel,
}

impl PowerSourceType {
    /// All types, in configuration-name order.
    pub const ALL: [PowerSourceType; 7] = [
        Self::Fission,
        Self::Thermionic,
        Self::Solar,
        Self::SolarThermal,
        Self::Wind,
        Self::Areothermal,
        Self::Fuel,
    ];

    /// Configuration name of the type.
    pub fn name(self) -> &'static str {
        match self {
            Self::Fission => "fission",
            Self::Thermionic => "thermionic",
            Self::Solar => "solar",
            Self::SolarThermal => "solar_thermal",
            Self::Wind => "wind",
            Self::Areothermal => "areothermal",
            Self::Fuel => "fuel",
        }
    }
}

impl fmt::Display for PowerSourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a configuration names a power source type that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown power source type \"{0}\"")]
pub struct UnknownSourceType(pub String);

impl FromStr for PowerSourceType {
    type Err = UnknownSourceType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| UnknownSourceType(s.to_string()))
    }
}

/// Static per-building-type description of one power source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceSpec {
    /// Source type name, e.g. `"fission"` or `"solar"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Rated output (kW).
    pub max_power_kw: f64,
    /// Electrical conversion efficiency for reactors (0..1].
    pub conversion_efficiency: f64,
    /// Initial load percent; reactors default to 100, fuel generators to 0.
    pub load_percent: Option<f64>,
    /// Fuel burned by a fuel generator.
    pub fuel: ResourceId,
    /// Reserve tank size as a multiple of one sol of full-load burn.
    pub tank_ratio: f64,
}

impl Default for SourceSpec {
    fn default() -> Self {
        Self {
            kind: "solar".to_string(),
            max_power_kw: 10.0,
            conversion_efficiency: 1.0,
            load_percent: None,
            fuel: ResourceId::Methane,
            tank_ratio: 1.0,
        }
    }
}

/// Settlement-level inputs for tick-independent siting estimates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SitingInputs {
    /// Economic value of one kilogram of fuel, in kW-equivalent per kg/h.
    pub fuel_value_per_kg: f64,
    /// Long-run mean irradiance relative to reference, in `[0, 1]`.
    pub mean_irradiance_ratio: f64,
    /// Long-run mean wind speed relative to reference, in `[0, 1]`.
    pub mean_wind_ratio: f64,
    /// Areothermal potential at the site, in `[0, 1]`.
    pub areothermal_potential: f64,
}

impl Default for SitingInputs {
    fn default() -> Self {
        Self {
            fuel_value_per_kg: 1.0,
            mean_irradiance_ratio: 0.35,
            mean_wind_ratio: 0.3,
            areothermal_potential: 0.5,
        }
    }
}

/// Per-tick context handed to each power source.
pub struct SourceContext<'a> {
    /// Tick length in millisols.
    pub elapsed: f64,
    /// Environment sample for the tick.
    pub environment: &'a Environment,
    /// Settlement bulk resources, drawn by fuel generators.
    pub store: &'a mut dyn ResourceStore,
}

impl SourceContext<'_> {
    /// Tick length in hours.
    pub fn hours(&self) -> f64 {
        self.elapsed * HOURS_PER_MILLISOL
    }
}

/// Capability of sources whose output the grid can throttle.
///
/// Load is a percentage of rated output. Implementors define the step size
/// and the lowest load they accept; the provided methods move one step.
pub trait AdjustableLoad {
    /// Current load percent.
    fn load_capacity(&self) -> f64;

    /// Sets the load percent; implementors clamp to their own bounds.
    fn set_load_capacity(&mut self, percent: f64);

    /// Size of one load step, in percent.
    fn load_step(&self) -> f64;

    /// Lowest accepted load percent.
    fn min_load(&self) -> f64;

    /// Raises load by one step.
    ///
    /// # Returns
    ///
    /// `true` if the load changed.
    fn increase_load_capacity(&mut self) -> bool {
        let current = self.load_capacity();
        let next = (current + self.load_step()).min(100.0);
        if next > current {
            self.set_load_capacity(next);
            true
        } else {
            false
        }
    }

    /// Lowers load by one step.
    ///
    /// # Returns
    ///
    /// `true` if the load changed.
    fn decrease_load_capacity(&mut self) -> bool {
        let current = self.load_capacity();
        let next = (current - self.load_step()).max(self.min_load());
        if next < current {
            self.set_load_capacity(next);
            true
        } else {
            false
        }
    }
}
