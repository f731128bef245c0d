//! Settlement aggregate: buildings, bulk resources and the power grid.

use tracing::{debug, trace};

use crate::building::{Building, BuildingId};
use crate::environment::Environment;
use crate::grid::clock::ClockPulse;
use crate::grid::{PowerGrid, TickReport};
use crate::inventory::Inventory;
use crate::sources::generation::function_value;
use crate::sources::{SitingInputs, SourceContext};

/// One settlement with its own grid instance.
///
/// Owns the live set of buildings. The grid never creates or destroys
/// buildings; construction goes through [`Settlement::add_building`].
#[derive(Debug, Clone)]
pub struct Settlement {
    pub name: String,
    buildings: Vec<Building>,
    pub inventory: Inventory,
    grid: PowerGrid,
    pub siting: SitingInputs,
}

impl Settlement {
    pub fn new(name: impl Into<String>, grid: PowerGrid, inventory: Inventory) -> Self {
        Self {
            name: name.into(),
            buildings: Vec::new(),
            inventory,
            grid,
            siting: SitingInputs::default(),
        }
    }

    pub fn with_siting(mut self, siting: SitingInputs) -> Self {
        self.siting = siting;
        self
    }

    /// The next unused building id.
    pub fn next_building_id(&self) -> BuildingId {
        let max = self.buildings.iter().map(|b| b.id.0).max().unwrap_or(0);
        BuildingId(max + 1)
    }

    /// Adds a building; its storage capacity joins the grid on the next tick.
    pub fn add_building(&mut self, building: Building) {
        debug!(settlement = %self.name, building = %building.id, name = %building.name, "building added");
        self.buildings.push(building);
    }

    /// Removes and returns a building, if present.
    pub fn remove_building(&mut self, id: BuildingId) -> Option<Building> {
        let idx = self.buildings.iter().position(|b| b.id == id)?;
        debug!(settlement = %self.name, building = %id, "building removed");
        Some(self.buildings.remove(idx))
    }

    pub fn building(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.iter().find(|b| b.id == id)
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn grid(&self) -> &PowerGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut PowerGrid {
        &mut self.grid
    }

    /// Advances the settlement by one pulse.
    ///
    /// Every Generation Aggregator is refreshed against `environment`
    /// (fuel generators draw on the settlement inventory), then the grid
    /// balances the tick.
    pub fn time_passing(&mut self, pulse: &ClockPulse, environment: &Environment) -> TickReport {
        for building in &mut self.buildings {
            let mode = building.power_mode();
            if let Some(generation) = building.generation.as_mut() {
                let mut ctx = SourceContext {
                    elapsed: pulse.elapsed,
                    environment,
                    store: &mut self.inventory,
                };
                let kw = generation.time_passing(mode, &mut ctx);
                trace!(building = %building.id, kw, "generation refreshed");
            }
        }
        self.grid
            .time_passing(pulse, &mut self.buildings, &self.inventory)
    }

    /// Sum of the average power estimates of every installed source (kW).
    pub fn total_average_power(&self) -> f64 {
        self.buildings
            .iter()
            .filter_map(|b| b.generation.as_ref())
            .map(|g| g.average_power(&self.siting))
            .sum()
    }

    /// Siting value of adding `supply` kW of average generation.
    pub fn function_value(&self, supply: f64, new_building: bool) -> f64 {
        function_value(
            supply,
            self.grid.required_power(),
            self.total_average_power(),
            new_building,
        )
    }

    /// Siting value of an existing building's generation, if it has any.
    pub fn building_function_value(&self, id: BuildingId) -> Option<f64> {
        let generation = self.building(id)?.generation.as_ref()?;
        Some(self.function_value(generation.average_power(&self.siting), false))
    }
}
