//! Scenario construction: turns a [`ScenarioConfig`] into a runnable engine.

use thiserror::Error;
use tracing::info;

use crate::building::{Building, BuildingId};
use crate::config::{BuildingTypeConfig, ConfigError, ScenarioConfig, StorageConfig};
use crate::environment::{MarsEnvironment, MarsEnvironmentParams};
use crate::grid::PowerGrid;
use crate::grid::clock::Clock;
use crate::grid::engine::Engine;
use crate::inventory::{Inventory, ResourceId};
use crate::settlement::Settlement;
use crate::sources::{PowerGeneration, PowerSource, UnknownSourceType};
use crate::storage::{Apportionment, EnergyStore};

/// Seed offset for the environment RNG so weather is not correlated with grid draws.
const ENVIRONMENT_SEED_OFFSET: u64 = 101;

/// Failure to turn a scenario into an engine.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The configuration failed validation.
    #[error("invalid scenario ({} errors): {}", .0.len(), join(.0))]
    Invalid(Vec<ConfigError>),
    /// A building type lists a source type that does not exist.
    #[error("building type \"{building_type}\": {source}")]
    UnknownSourceType {
        building_type: String,
        #[source]
        source: UnknownSourceType,
    },
    /// A building references a type missing from the catalogue.
    #[error("building \"{building}\": unknown building type \"{kind}\"")]
    UnknownBuildingType { building: String, kind: String },
}

fn join(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Builds the settlement described by `cfg`, validating it first.
///
/// # Errors
///
/// Returns [`BuildError::Invalid`] if validation fails, or a more specific
/// variant if construction hits an unknown type anyway.
pub fn build_settlement(cfg: &ScenarioConfig) -> Result<Settlement, BuildError> {
    let errors = cfg.validate();
    if !errors.is_empty() {
        return Err(BuildError::Invalid(errors));
    }

    let apportionment = cfg
        .grid
        .apportionment
        .parse::<Apportionment>()
        .unwrap_or_default();
    let grid = PowerGrid::new(
        cfg.grid.degradation_rate_per_sol,
        apportionment,
        cfg.simulation.seed,
    );
    let inventory = Inventory::new()
        .with(ResourceId::Methane, cfg.inventory.methane_kg)
        .with(ResourceId::Methanol, cfg.inventory.methanol_kg)
        .with(ResourceId::Oxygen, cfg.inventory.oxygen_kg);

    let mut settlement = Settlement::new(cfg.name.clone(), grid, inventory).with_siting(cfg.siting);

    for (i, b) in cfg.buildings.iter().enumerate() {
        let name = b.name.clone().unwrap_or_else(|| b.kind.clone());
        let bt = cfg
            .building_types
            .get(&b.kind)
            .ok_or_else(|| BuildError::UnknownBuildingType {
                building: name.clone(),
                kind: b.kind.clone(),
            })?;
        let id = BuildingId(u32::try_from(i + 1).unwrap_or(u32::MAX));
        let building = build_building(id, &name, &b.kind, bt)?.with_power_mode(b.power_mode);
        settlement.add_building(building);
    }

    info!(
        settlement = %settlement.name,
        buildings = settlement.buildings().len(),
        "settlement built"
    );
    Ok(settlement)
}

/// Builds one building from its type description.
///
/// # Errors
///
/// Returns [`BuildError::UnknownSourceType`] if a source type is not recognized.
pub fn build_building(
    id: BuildingId,
    name: &str,
    type_name: &str,
    bt: &BuildingTypeConfig,
) -> Result<Building, BuildError> {
    let mut building = Building::new(id, name, bt.full_power_kw, bt.low_power_kw, bt.life_support)
        .with_category(bt.category);

    if !bt.sources.is_empty() {
        let sources = bt
            .sources
            .iter()
            .map(PowerSource::from_spec)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| BuildError::UnknownSourceType {
                building_type: type_name.to_string(),
                source,
            })?;
        building = building.with_generation(PowerGeneration::new(sources));
    }
    if let Some(st) = &bt.storage {
        building = building.with_storage(build_store(st));
    }
    Ok(building)
}

fn build_store(st: &StorageConfig) -> EnergyStore {
    let capacity = st.capacity_kwh();
    EnergyStore::new(
        capacity,
        capacity * st.initial_soc,
        st.terminal_voltage,
        st.internal_resistance,
        st.max_c_rating,
    )
}

/// Builds the full engine: clock, settlement and a seeded Mars environment.
///
/// # Errors
///
/// See [`build_settlement`].
pub fn build_engine(cfg: &ScenarioConfig) -> Result<Engine<MarsEnvironment>, BuildError> {
    let settlement = build_settlement(cfg)?;
    let s = &cfg.simulation;
    let clock = Clock::new(s.ticks, s.millisols_per_tick, s.start_sol, s.start_millisol);
    let e = &cfg.environment;
    let environment = MarsEnvironment::new(
        MarsEnvironmentParams {
            reference_irradiance: e.reference_irradiance,
            dust_alpha: e.dust_alpha,
            dust_noise_std: e.dust_noise_std,
            mean_wind_speed: e.mean_wind_speed,
            reference_wind_speed: e.reference_wind_speed,
            wind_alpha: e.wind_alpha,
            wind_noise_std: e.wind_noise_std,
            areothermal_heat: e.areothermal_heat,
        },
        s.seed.wrapping_add(ENVIRONMENT_SEED_OFFSET),
    );
    Ok(Engine::new(clock, settlement, environment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::building::PowerMode;
    use crate::config::BuildingConfig;
    use crate::sources::SourceSpec;

    #[test]
    fn baseline_builds_every_building() {
        let cfg = ScenarioConfig::baseline();
        let settlement = build_settlement(&cfg).expect("baseline builds");
        assert_eq!(settlement.buildings().len(), cfg.buildings.len());
        let bank = settlement
            .buildings()
            .iter()
            .find(|b| b.name == "Battery Bank")
            .expect("bank present");
        let store = bank.storage.as_ref().expect("bank has storage");
        assert_eq!(store.capacity(), 40.0);
        assert_eq!(store.stored_energy(), 20.0);
    }

    #[test]
    fn initial_power_mode_is_applied() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.buildings[2].power_mode = PowerMode::Low;
        let settlement = build_settlement(&cfg).expect("builds");
        assert_eq!(settlement.buildings()[2].power_mode(), PowerMode::Low);
    }

    #[test]
    fn unnamed_buildings_take_the_type_name() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.buildings.push(BuildingConfig {
            name: None,
            kind: "workshop".to_string(),
            power_mode: PowerMode::Full,
        });
        let settlement = build_settlement(&cfg).expect("builds");
        assert_eq!(
            settlement.buildings().last().map(|b| b.name.as_str()),
            Some("workshop")
        );
    }

    #[test]
    fn invalid_config_is_refused() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.ticks = 0;
        let err = build_engine(&cfg).err().expect("must fail");
        assert!(matches!(err, BuildError::Invalid(ref errs) if errs.len() == 1));
        assert!(err.to_string().contains("simulation.ticks"));
    }

    #[test]
    fn nan_demand_is_refused_not_built() {
        let mut cfg = ScenarioConfig::baseline();
        if let Some(bt) = cfg.building_types.get_mut("greenhouse") {
            bt.full_power_kw = f64::NAN;
        }
        let err = build_engine(&cfg).err().expect("must fail");
        assert!(matches!(err, BuildError::Invalid(_)));
        assert!(err.to_string().contains("building_types.greenhouse.full_power_kw"));
    }

    #[test]
    fn unknown_source_type_is_refused() {
        let bt = BuildingTypeConfig {
            sources: vec![SourceSpec {
                kind: "zero_point".to_string(),
                ..SourceSpec::default()
            }],
            ..BuildingTypeConfig::default()
        };
        let err = build_building(BuildingId(1), "x", "exotic", &bt)
            .err()
            .expect("must fail");
        assert!(matches!(err, BuildError::UnknownSourceType { .. }));
        assert!(err.to_string().contains("zero_point"));
    }

    #[test]
    fn engine_runs_configured_ticks() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.ticks = 12;
        let mut engine = build_engine(&cfg).expect("builds");
        let results = engine.run();
        assert_eq!(results.len(), 12);
        assert!(results[0].suppressed);
        assert!(results.iter().skip(1).all(|r| !r.suppressed));
    }
}
