//! Settlement-level grid controller.

use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::debug;

use super::adjust;
use super::balance::{degrade, needed_power, power_value, storage_delivery, storage_request};
use super::clock::ClockPulse;
use super::event::{EventQueue, GridEvent};
use super::types::{CascadeStep, TickReport, stored_energy_display};
use crate::building::{Building, PowerMode};
use crate::inventory::ResourceStore;
use crate::sources::PowerGeneration;
use crate::sources::fuel::FUEL_LOW_LOAD_PERCENT;
use crate::storage::{Apportionment, EnergyStore, apportion};

/// Efficiency lost per sol of operation.
pub const DEFAULT_DEGRADATION_RATE_PER_SOL: f64 = 0.0004;

/// Storage flows committed during one tick (kWh).
#[derive(Debug, Default, Clone, Copy)]
struct Flows {
    charged: f64,
    drawn: f64,
}

/// Balances supply and demand across one settlement.
///
/// Once per tick the grid measures generation and demand, then runs either
/// the surplus or the deficit cascade. Each cascade step sees the effect of
/// the step before it and the cascade stops as soon as the balance is met.
/// Life support is the last load cut and the first restored.
#[derive(Debug, Clone)]
pub struct PowerGrid {
    just_loaded: bool,
    sufficient_power: bool,
    degradation_rate_per_sol: f64,
    system_efficiency: f64,
    generated_power: f64,
    required_power: f64,
    stored_energy: f64,
    stored_energy_capacity: f64,
    power_value: f64,
    power_mode: PowerMode,
    apportionment: Apportionment,
    rng: StdRng,
    events: EventQueue,
}

impl PowerGrid {
    /// Creates a grid that will skip the cascade on its first tick.
    ///
    /// # Arguments
    ///
    /// * `degradation_rate_per_sol` - Fractional efficiency loss per sol (must be >= 0)
    /// * `apportionment` - How storage flows are shared between stores
    /// * `seed` - Seed for the reactor nudge and randomized apportionment
    ///
    /// # Panics
    ///
    /// Panics if `degradation_rate_per_sol` is negative.
    pub fn new(degradation_rate_per_sol: f64, apportionment: Apportionment, seed: u64) -> Self {
        assert!(degradation_rate_per_sol >= 0.0);
        Self {
            just_loaded: true,
            sufficient_power: true,
            degradation_rate_per_sol,
            system_efficiency: 1.0,
            generated_power: 0.0,
            required_power: 0.0,
            stored_energy: 0.0,
            stored_energy_capacity: 0.0,
            power_value: 0.0,
            power_mode: PowerMode::Full,
            apportionment,
            rng: StdRng::seed_from_u64(seed),
            events: EventQueue::new(),
        }
    }

    pub fn sufficient_power(&self) -> bool {
        self.sufficient_power
    }

    pub fn system_efficiency(&self) -> f64 {
        self.system_efficiency
    }

    pub fn generated_power(&self) -> f64 {
        self.generated_power
    }

    pub fn required_power(&self) -> f64 {
        self.required_power
    }

    pub fn stored_energy(&self) -> f64 {
        self.stored_energy
    }

    pub fn stored_energy_capacity(&self) -> f64 {
        self.stored_energy_capacity
    }

    /// Stored energy for display, e.g. `"5.00 kWh (50.0 %)"`.
    pub fn stored_energy_display(&self) -> String {
        stored_energy_display(self.stored_energy, self.stored_energy_capacity)
    }

    pub fn power_value(&self) -> f64 {
        self.power_value
    }

    pub fn power_mode(&self) -> PowerMode {
        self.power_mode
    }

    pub fn apportionment(&self) -> Apportionment {
        self.apportionment
    }

    /// Sets the grid-wide default power mode.
    pub fn set_power_mode(&mut self, mode: PowerMode) {
        if self.power_mode != mode {
            self.power_mode = mode;
            self.events.push(GridEvent::GridPowerMode { mode });
        }
    }

    /// Removes and returns all pending change notifications.
    pub fn drain_events(&mut self) -> Vec<GridEvent> {
        self.events.drain()
    }

    fn set_generated_power(&mut self, kw: f64) {
        if self.generated_power != kw {
            self.generated_power = kw;
            self.events.push(GridEvent::GeneratedPower { kw });
        }
    }

    fn set_required_power(&mut self, kw: f64) {
        if self.required_power != kw {
            self.required_power = kw;
            self.events.push(GridEvent::RequiredPower { kw });
        }
    }

    fn set_stored_energy(&mut self, kwh: f64) {
        if self.stored_energy != kwh {
            self.stored_energy = kwh;
            self.events.push(GridEvent::StoredEnergy { kwh });
        }
    }

    fn set_stored_energy_capacity(&mut self, kwh: f64) {
        if self.stored_energy_capacity != kwh {
            self.stored_energy_capacity = kwh;
            self.events.push(GridEvent::StoredEnergyCapacity { kwh });
        }
    }

    fn set_power_value(&mut self, value: f64) {
        if self.power_value != value {
            self.power_value = value;
            self.events.push(GridEvent::PowerValue { value });
        }
    }

    /// Runs one tick over the settlement's buildings.
    ///
    /// Generation caches must already be refreshed for this tick. Never
    /// fails: an unresolved deficit is reported through `sufficient`.
    ///
    /// # Arguments
    ///
    /// * `pulse` - Timing of the tick
    /// * `buildings` - Every building in the settlement
    /// * `store` - Settlement bulk resources, read when calling on fuel generators
    pub fn time_passing(
        &mut self,
        pulse: &ClockPulse,
        buildings: &mut [Building],
        store: &dyn ResourceStore,
    ) -> TickReport {
        let hours = pulse.hours();

        // 1. Measure
        let generated: f64 = buildings
            .iter()
            .map(Building::generated_power)
            .filter(|p| p.is_finite())
            .sum();
        let required: f64 = buildings.iter().map(Building::power_required).sum();
        let fuel_burned: f64 = buildings
            .iter()
            .filter_map(|b| b.generation.as_ref())
            .map(PowerGeneration::fuel_burned)
            .sum();
        self.set_generated_power(generated);
        self.set_required_power(required);
        self.system_efficiency = degrade(
            self.system_efficiency,
            self.degradation_rate_per_sol,
            pulse.elapsed,
        );

        // 2. Compare
        let needed = needed_power(required, generated);
        debug!(tick = pulse.tick, generated, required, needed, "grid measured");

        // 3. Branch
        let mut flows = Flows::default();
        let suppressed = self.just_loaded;
        let (remaining, resolved_at) = if suppressed {
            self.just_loaded = false;
            (needed, None)
        } else if needed > 0.0 {
            self.lack_of_power(needed, hours, buildings, store, &mut flows)
        } else if needed < 0.0 {
            let (excess, step) = self.excess_power(-needed, hours, buildings, &mut flows);
            (-excess, step)
        } else {
            (needed, None)
        };
        self.sufficient_power = needed < 0.0 || remaining < 0.0;
        if let Some(step) = resolved_at {
            debug!(tick = pulse.tick, %step, remaining, "cascade resolved");
        }

        // 4. Derived state
        let (stored, capacity) = buildings
            .iter()
            .filter_map(|b| b.storage.as_ref())
            .fold((0.0, 0.0), |(s, c), bank| {
                (s + bank.stored_energy(), c + bank.capacity())
            });
        self.set_stored_energy_capacity(capacity);
        self.set_stored_energy(stored);
        self.set_power_value(power_value(required, generated, stored));

        let count = |mode: PowerMode| buildings.iter().filter(|b| b.power_mode() == mode).count();
        TickReport {
            tick: pulse.tick,
            mission_sol: pulse.mission_sol,
            millisol: pulse.millisol,
            generated_kw: generated,
            required_kw: required,
            needed_kw: needed,
            sufficient: self.sufficient_power,
            suppressed,
            resolved_at,
            stored_kwh: stored,
            capacity_kwh: capacity,
            battery_charged_kwh: flows.charged,
            battery_drawn_kwh: flows.drawn,
            fuel_burned_kg: fuel_burned,
            power_value: self.power_value,
            system_efficiency: self.system_efficiency,
            buildings_full: count(PowerMode::Full),
            buildings_low: count(PowerMode::Low),
            buildings_none: count(PowerMode::None),
            life_support_reduced: buildings
                .iter()
                .filter(|b| b.life_support && b.power_mode() != PowerMode::Full)
                .count(),
            events: Vec::new(),
        }
    }

    /// Deficit cascade. Returns the need left over and the step that met it.
    fn lack_of_power(
        &mut self,
        mut needed: f64,
        hours: f64,
        buildings: &mut [Building],
        store: &dyn ResourceStore,
        flows: &mut Flows,
    ) -> (f64, Option<CascadeStep>) {
        needed = adjust::raise_reactors(buildings, needed, &mut self.events);
        if needed <= 0.0 {
            return (needed, Some(CascadeStep::RaiseReactors));
        }

        needed = self.draw_batteries(needed, hours, buildings, flows);
        if needed <= 0.0 {
            return (needed, Some(CascadeStep::DrawBatteries));
        }

        needed = adjust::raise_fuel_generators(
            buildings,
            FUEL_LOW_LOAD_PERCENT,
            needed,
            hours,
            store,
            &mut self.events,
        );
        if needed <= 0.0 {
            return (needed, Some(CascadeStep::FuelLowLoad));
        }

        needed = adjust::raise_reactors(buildings, needed, &mut self.events);
        if needed <= 0.0 {
            return (needed, Some(CascadeStep::RaiseReactorsAgain));
        }

        needed = adjust::shed_buildings(buildings, false, needed, &mut self.events);
        if needed <= 0.0 {
            return (needed, Some(CascadeStep::ShedOtherBuildings));
        }

        needed =
            adjust::raise_fuel_generators(buildings, 100.0, needed, hours, store, &mut self.events);
        if needed <= 0.0 {
            return (needed, Some(CascadeStep::FuelFullLoad));
        }

        needed = adjust::raise_reactors(buildings, needed, &mut self.events);
        if needed <= 0.0 {
            return (needed, Some(CascadeStep::RaiseReactorsFinal));
        }

        needed = adjust::shed_buildings(buildings, true, needed, &mut self.events);
        if needed <= 0.0 {
            return (needed, Some(CascadeStep::ShedLifeSupport));
        }

        (needed, None)
    }

    /// Surplus cascade. Returns the excess left over and the step that absorbed it.
    fn excess_power(
        &mut self,
        mut excess: f64,
        hours: f64,
        buildings: &mut [Building],
        flows: &mut Flows,
    ) -> (f64, Option<CascadeStep>) {
        excess = adjust::restore_buildings(buildings, true, excess, &mut self.events);
        if excess <= 0.0 {
            return (excess, Some(CascadeStep::RestoreLifeSupport));
        }

        excess = adjust::lower_fuel_generators(buildings, excess, &mut self.events);
        if excess <= 0.0 {
            return (excess, Some(CascadeStep::ThrottleFuelDown));
        }

        if adjust::life_support_at_full(buildings) {
            excess = adjust::restore_buildings(buildings, false, excess, &mut self.events);
            if excess <= 0.0 {
                return (excess, Some(CascadeStep::RestoreOtherBuildings));
            }
        }

        if self.rng.random_ratio(1, 10) {
            excess = adjust::lower_reactors(buildings, excess, Some(1), &mut self.events);
            if excess <= 0.0 {
                return (excess, Some(CascadeStep::NudgeReactorDown));
            }
        }

        excess = self.charge_batteries(excess, hours, buildings, flows);
        if excess <= 0.0 {
            return (excess, Some(CascadeStep::ChargeBatteries));
        }

        excess = adjust::lower_reactors(buildings, excess, None, &mut self.events);
        if excess <= 0.0 {
            return (excess, Some(CascadeStep::ThrottleReactorsDown));
        }

        (excess, None)
    }

    fn draw_batteries(
        &mut self,
        needed: f64,
        hours: f64,
        buildings: &mut [Building],
        flows: &mut Flows,
    ) -> f64 {
        let mut stores: Vec<&mut EnergyStore> =
            buildings.iter_mut().filter_map(|b| b.storage.as_mut()).collect();
        let request = storage_request(needed, hours);
        let drawn =
            apportion::discharge(&mut stores, request, hours, self.apportionment, &mut self.rng);
        if drawn > 0.0 {
            debug!(drawn, request, "drew from storage");
        }
        flows.drawn += drawn;
        needed - storage_delivery(drawn, hours)
    }

    fn charge_batteries(
        &mut self,
        excess: f64,
        hours: f64,
        buildings: &mut [Building],
        flows: &mut Flows,
    ) -> f64 {
        if hours <= 0.0 || self.system_efficiency <= 0.0 {
            return excess;
        }
        let mut stores: Vec<&mut EnergyStore> =
            buildings.iter_mut().filter_map(|b| b.storage.as_mut()).collect();
        let offered = excess * hours * self.system_efficiency;
        let stored =
            apportion::charge(&mut stores, offered, hours, self.apportionment, &mut self.rng);
        if stored > 0.0 {
            debug!(stored, offered, "charged storage");
        }
        flows.charged += stored;
        (offered - stored) / hours / self.system_efficiency
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::building::BuildingId;
    use crate::environment::Environment;
    use crate::grid::balance::ROLLING_FACTOR;
    use crate::grid::clock::Clock;
    use crate::inventory::Inventory;
    use crate::sources::{PowerSource, Renewable, RenewableKind, SourceContext};
    use approx::assert_relative_eq;

    fn solar(kw: f64) -> PowerGeneration {
        PowerGeneration::new(vec![PowerSource::Renewable(Renewable::new(
            RenewableKind::Solar,
            kw,
        ))])
    }

    fn battery(stored: f64) -> EnergyStore {
        EnergyStore::new(10.0, stored, 600.0, 0.1, 2.0)
    }

    /// Refreshes generation and runs one grid tick.
    fn tick(
        grid: &mut PowerGrid,
        buildings: &mut [Building],
        env: &Environment,
        t: usize,
    ) -> TickReport {
        let pulse = Clock::new(100, 10.0, 1, 0.0).pulse_at(t);
        let mut inv = Inventory::new();
        for b in buildings.iter_mut() {
            let mode = b.power_mode();
            if let Some(g) = b.generation.as_mut() {
                let mut ctx = SourceContext {
                    elapsed: pulse.elapsed,
                    environment: env,
                    store: &mut inv,
                };
                g.time_passing(mode, &mut ctx);
            }
        }
        grid.time_passing(&pulse, buildings, &inv)
    }

    fn grid() -> PowerGrid {
        PowerGrid::new(DEFAULT_DEGRADATION_RATE_PER_SOL, Apportionment::Proportional, 1)
    }

    #[test]
    fn first_tick_only_measures() {
        let mut g = grid();
        let mut bs = vec![
            Building::new(BuildingId(1), "hab", 10.0, 2.0, true),
            Building::new(BuildingId(2), "array", 0.0, 0.0, false).with_generation(solar(5.0)),
        ];
        let env = Environment::reference();
        let report = tick(&mut g, &mut bs, &env, 0);
        assert!(report.suppressed);
        assert!(!report.sufficient);
        assert_eq!(bs[0].power_mode(), PowerMode::Full);

        // 11 − 5 = 6 kW short; FULL → LOW frees 8.8 kW.
        let report = tick(&mut g, &mut bs, &env, 1);
        assert!(!report.suppressed);
        assert!(report.sufficient);
        assert_eq!(bs[0].power_mode(), PowerMode::Low);
    }

    #[test]
    fn surplus_charges_storage() {
        let mut g = grid();
        let mut bs = vec![
            Building::new(BuildingId(1), "array", 0.0, 0.0, false)
                .with_generation(solar(10.0))
                .with_storage(battery(2.0)),
            Building::new(BuildingId(2), "hab", 5.0, 1.0, true),
        ];
        let env = Environment::reference();
        tick(&mut g, &mut bs, &env, 0);
        let report = tick(&mut g, &mut bs, &env, 1);
        assert!(report.sufficient);
        assert!(report.battery_charged_kwh > 0.0);
        assert!(report.stored_kwh > 2.0);
        assert_eq!(report.resolved_at, Some(CascadeStep::ChargeBatteries));
    }

    #[test]
    fn other_buildings_shed_before_life_support() {
        let mut g = grid();
        let mut bs = vec![
            Building::new(BuildingId(1), "hab", 10.0, 2.0, true),
            Building::new(BuildingId(2), "lab", 10.0, 2.0, false),
            Building::new(BuildingId(3), "array", 0.0, 0.0, false).with_generation(solar(5.0)),
        ];
        let env = Environment::reference();
        tick(&mut g, &mut bs, &env, 0);
        let report = tick(&mut g, &mut bs, &env, 1);
        // 17 kW short; the lab frees 8.8 + 2.2 on its way to NONE, the hab then drops to LOW.
        assert_eq!(bs[2].power_mode(), PowerMode::Full);
        assert_eq!(bs[1].power_mode(), PowerMode::None);
        assert_eq!(bs[0].power_mode(), PowerMode::Low);
        assert_eq!(report.resolved_at, Some(CascadeStep::ShedLifeSupport));
    }

    #[test]
    fn zero_balance_changes_nothing() {
        let mut g = grid();
        let mut bs = vec![
            Building::new(BuildingId(1), "array", 0.0, 0.0, false)
                .with_generation(solar(10.0 * ROLLING_FACTOR))
                .with_storage(battery(4.0)),
            Building::new(BuildingId(2), "hab", 10.0, 1.0, true),
        ];
        let env = Environment::reference();
        tick(&mut g, &mut bs, &env, 0);
        let report = tick(&mut g, &mut bs, &env, 1);
        assert_eq!(report.needed_kw, 0.0);
        assert!(!report.sufficient);
        assert!(!g.sufficient_power());
        assert_eq!(report.resolved_at, None);
        assert_eq!(report.battery_charged_kwh, 0.0);
        assert_eq!(bs[1].power_mode(), PowerMode::Full);
        assert_eq!(bs[0].storage.as_ref().map(EnergyStore::stored_energy), Some(4.0));
    }

    #[test]
    fn events_fire_only_on_change() {
        let mut g = grid();
        let mut bs = vec![
            Building::new(BuildingId(1), "array", 0.0, 0.0, false).with_generation(solar(10.0)),
            Building::new(BuildingId(2), "hab", 5.0, 1.0, true),
        ];
        let env = Environment::reference();
        tick(&mut g, &mut bs, &env, 0);
        let first = g.drain_events();
        assert!(first.contains(&GridEvent::GeneratedPower { kw: 10.0 }));
        tick(&mut g, &mut bs, &env, 1);
        let second = g.drain_events();
        assert!(!second.iter().any(|e| matches!(e, GridEvent::GeneratedPower { .. })));
    }

    #[test]
    fn grid_power_mode_event_on_change_only() {
        let mut g = grid();
        g.set_power_mode(PowerMode::Full);
        assert!(g.drain_events().is_empty());
        g.set_power_mode(PowerMode::Low);
        assert_eq!(g.drain_events(), vec![GridEvent::GridPowerMode {
            mode: PowerMode::Low
        }]);
    }

    #[test]
    fn efficiency_decays_each_tick() {
        let mut g = grid();
        let mut bs = vec![Building::new(BuildingId(1), "hab", 1.0, 0.5, true)];
        tick(&mut g, &mut bs, &Environment::night(), 0);
        let e1 = g.system_efficiency();
        tick(&mut g, &mut bs, &Environment::night(), 1);
        assert!(g.system_efficiency() < e1);
        assert_relative_eq!(e1, 1.0 - 0.0004 * 10.0 / 1000.0);
    }
}
