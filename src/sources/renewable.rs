use serde::Serialize;

use super::types::SitingInputs;
use crate::environment::Environment;

/// Weather-dependent generation technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenewableKind {
    Solar,
    SolarThermal,
    Wind,
    Areothermal,
}

impl RenewableKind {
    fn maintenance_factor(self) -> f64 {
        match self {
            Self::Solar => 1.0,
            Self::SolarThermal => 1.5,
            Self::Wind => 2.0,
            Self::Areothermal => 1.0,
        }
    }
}

/// A renewable source with no state beyond its rating.
///
/// Output is rated power scaled linearly by the environmental input
/// relative to its reference level.
#[derive(Debug, Clone, Serialize)]
pub struct Renewable {
    pub kind: RenewableKind,
    /// Rated output at reference conditions (kW).
    pub max_power: f64,
}

impl Renewable {
    /// # Panics
    ///
    /// Panics if `max_power` is negative.
    pub fn new(kind: RenewableKind, max_power: f64) -> Self {
        assert!(max_power >= 0.0);
        Self { kind, max_power }
    }

    pub fn current_power(&self, env: &Environment) -> f64 {
        let ratio = match self.kind {
            RenewableKind::Solar | RenewableKind::SolarThermal => env.irradiance_ratio(),
            RenewableKind::Wind => env.wind_ratio(),
            RenewableKind::Areothermal => env.areothermal_heat.clamp(0.0, 1.0),
        };
        self.max_power * ratio
    }

    /// Siting estimate from the long-run mean conditions at the site.
    pub fn average_power(&self, siting: &SitingInputs) -> f64 {
        let ratio = match self.kind {
            RenewableKind::Solar | RenewableKind::SolarThermal => siting.mean_irradiance_ratio,
            RenewableKind::Wind => siting.mean_wind_ratio,
            RenewableKind::Areothermal => siting.areothermal_potential,
        };
        self.max_power * ratio.clamp(0.0, 1.0)
    }

    pub fn maintenance_time(&self) -> f64 {
        self.max_power * self.kind.maintenance_factor()
    }
}
