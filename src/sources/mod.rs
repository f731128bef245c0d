//! Power sources and the per-building generation aggregator.

pub mod fuel;
pub mod generation;
pub mod reactor;
pub mod renewable;
pub mod types;

pub use fuel::FuelGenerator;
pub use generation::{PowerGeneration, function_value};
pub use reactor::{Reactor, ReactorKind};
pub use renewable::{Renewable, RenewableKind};
pub use types::{
    AdjustableLoad, PowerSourceType, SitingInputs, SourceContext, SourceSpec, UnknownSourceType,
};

/// One installed unit of generation.
#[derive(Debug, Clone)]
pub enum PowerSource {
    Reactor(Reactor),
    Renewable(Renewable),
    Fuel(FuelGenerator),
}

impl PowerSource {
    /// Builds a source from its static spec.
    ///
    /// # Errors
    ///
    /// Returns `UnknownSourceType` if `spec.kind` names no known type.
    pub fn from_spec(spec: &SourceSpec) -> Result<Self, UnknownSourceType> {
        let kind: PowerSourceType = spec.kind.parse()?;
        let load = spec.load_percent;
        let source = match kind {
            PowerSourceType::Fission => Self::Reactor(Reactor::new(
                ReactorKind::Fission,
                spec.max_power_kw,
                spec.conversion_efficiency,
                load.unwrap_or(100.0),
            )),
            PowerSourceType::Thermionic => Self::Reactor(Reactor::new(
                ReactorKind::Thermionic,
                spec.max_power_kw,
                spec.conversion_efficiency,
                load.unwrap_or(100.0),
            )),
            PowerSourceType::Solar => {
                Self::Renewable(Renewable::new(RenewableKind::Solar, spec.max_power_kw))
            }
            PowerSourceType::SolarThermal => {
                Self::Renewable(Renewable::new(RenewableKind::SolarThermal, spec.max_power_kw))
            }
            PowerSourceType::Wind => {
                Self::Renewable(Renewable::new(RenewableKind::Wind, spec.max_power_kw))
            }
            PowerSourceType::Areothermal => {
                Self::Renewable(Renewable::new(RenewableKind::Areothermal, spec.max_power_kw))
            }
            PowerSourceType::Fuel => Self::Fuel(FuelGenerator::new(
                spec.max_power_kw,
                spec.fuel,
                spec.tank_ratio,
                load.unwrap_or(0.0),
            )),
        };
        Ok(source)
    }

    pub fn source_type(&self) -> PowerSourceType {
        match self {
            Self::Reactor(r) => match r.kind {
                ReactorKind::Fission => PowerSourceType::Fission,
                ReactorKind::Thermionic => PowerSourceType::Thermionic,
            },
            Self::Renewable(r) => match r.kind {
                RenewableKind::Solar => PowerSourceType::Solar,
                RenewableKind::SolarThermal => PowerSourceType::SolarThermal,
                RenewableKind::Wind => PowerSourceType::Wind,
                RenewableKind::Areothermal => PowerSourceType::Areothermal,
            },
            Self::Fuel(_) => PowerSourceType::Fuel,
        }
    }

    /// Rated output (kW).
    pub fn max_power(&self) -> f64 {
        match self {
            Self::Reactor(r) => r.max_power,
            Self::Renewable(r) => r.max_power,
            Self::Fuel(f) => f.max_power,
        }
    }

    /// Instantaneous output for the tick described by `ctx` (kW).
    pub fn current_power(&mut self, ctx: &mut SourceContext<'_>) -> f64 {
        match self {
            Self::Reactor(r) => r.current_power(),
            Self::Renewable(r) => r.current_power(ctx.environment),
            Self::Fuel(f) => f.current_power(ctx),
        }
    }

    /// Tick-independent output estimate used for siting (kW).
    pub fn average_power(&self, siting: &SitingInputs) -> f64 {
        match self {
            Self::Reactor(r) => r.average_power(),
            Self::Renewable(r) => r.average_power(siting),
            Self::Fuel(f) => f.average_power(siting),
        }
    }

    /// Output the source would give at `percent` load, without committing (kW).
    ///
    /// Renewables have no load setting and report rated output scaled by `percent`.
    pub fn request_power(&self, percent: f64) -> f64 {
        match self {
            Self::Reactor(r) => r.request_power(percent),
            Self::Renewable(r) => r.max_power * percent.clamp(0.0, 100.0) / 100.0,
            Self::Fuel(f) => f.request_power(percent),
        }
    }

    pub fn maintenance_time(&self) -> f64 {
        match self {
            Self::Reactor(r) => r.maintenance_time(),
            Self::Renewable(r) => r.maintenance_time(),
            Self::Fuel(f) => f.maintenance_time(),
        }
    }
}
