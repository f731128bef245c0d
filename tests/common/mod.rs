//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use settlement_grid::building::{Building, BuildingCategory, BuildingId};
use settlement_grid::environment::{Environment, FixedEnvironment};
use settlement_grid::grid::PowerGrid;
use settlement_grid::grid::clock::Clock;
use settlement_grid::grid::controller::DEFAULT_DEGRADATION_RATE_PER_SOL;
use settlement_grid::grid::engine::Engine;
use settlement_grid::inventory::{Inventory, ResourceId};
use settlement_grid::settlement::Settlement;
use settlement_grid::sources::{FuelGenerator, PowerGeneration, PowerSource, Renewable, RenewableKind};
use settlement_grid::storage::{Apportionment, EnergyStore};

/// Tick length used by every fixture (millisols).
pub const MILLISOLS_PER_TICK: f64 = 10.0;

/// Grid with the default degradation rate and proportional apportionment.
pub fn default_grid() -> PowerGrid {
    PowerGrid::new(DEFAULT_DEGRADATION_RATE_PER_SOL, Apportionment::Proportional, 42)
}

/// Settlement holding `buildings` and `inventory`.
pub fn settlement(buildings: Vec<Building>, inventory: Inventory) -> Settlement {
    let mut s = Settlement::new("Test Base", default_grid(), inventory);
    for b in buildings {
        s.add_building(b);
    }
    s
}

/// Engine running `settlement` under a constant environment.
pub fn fixed_engine(
    settlement: Settlement,
    environment: Environment,
    ticks: usize,
) -> Engine<FixedEnvironment> {
    let clock = Clock::new(ticks, MILLISOLS_PER_TICK, 1, 0.0);
    Engine::new(clock, settlement, FixedEnvironment(environment))
}

/// Life-support building with no generation.
pub fn habitat(id: u32, full_kw: f64, low_kw: f64) -> Building {
    Building::new(BuildingId(id), format!("habitat {id}"), full_kw, low_kw, true)
        .with_category(BuildingCategory::Habitat)
}

/// Building without life support and no generation.
pub fn workshop(id: u32, full_kw: f64, low_kw: f64) -> Building {
    Building::new(BuildingId(id), format!("workshop {id}"), full_kw, low_kw, false)
        .with_category(BuildingCategory::Workshop)
}

/// Zero-demand building carrying one solar source.
pub fn solar_farm(id: u32, kw: f64) -> Building {
    Building::new(BuildingId(id), format!("solar farm {id}"), 0.0, 0.0, false)
        .with_category(BuildingCategory::Power)
        .with_generation(PowerGeneration::new(vec![PowerSource::Renewable(
            Renewable::new(RenewableKind::Solar, kw),
        )]))
}

/// Zero-demand building carrying one battery bank.
pub fn battery_bank(id: u32, capacity_kwh: f64, stored_kwh: f64) -> Building {
    Building::new(BuildingId(id), format!("battery bank {id}"), 0.0, 0.0, false)
        .with_category(BuildingCategory::Storage)
        .with_storage(EnergyStore::new(capacity_kwh, stored_kwh, 600.0, 0.1, 2.0))
}

/// Low-demand building carrying one methane generator at `percent` load.
pub fn fuel_station(id: u32, kw: f64, percent: f64) -> Building {
    Building::new(BuildingId(id), format!("fuel station {id}"), 0.2, 0.1, false)
        .with_category(BuildingCategory::Power)
        .with_generation(PowerGeneration::new(vec![PowerSource::Fuel(
            FuelGenerator::new(kw, ResourceId::Methane, 1.0, percent),
        )]))
}

/// The first fuel generator installed in `building`, if any.
pub fn fuel_generator(building: &Building) -> Option<&FuelGenerator> {
    building
        .generation
        .as_ref()?
        .sources()
        .iter()
        .find_map(|s| match s {
            PowerSource::Fuel(g) => Some(g),
            _ => None,
        })
}
