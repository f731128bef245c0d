//! Combustible-fuel generator with an onboard reserve tank.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::types::{AdjustableLoad, SitingInputs, SourceContext};
use crate::inventory::{ResourceId, ResourceStore};

/// Oxidizer burned per kilogram of fuel.
pub const OXIDIZER_FUEL_RATIO: f64 = 4.0;
/// Load percent the grid uses when it first calls on a generator.
pub const FUEL_LOW_LOAD_PERCENT: f64 = 50.0;
/// Size of one throttle step when the grid backs a generator off.
pub const FUEL_LOAD_STEP: f64 = 25.0;
/// Millisols of work needed before a manual toggle takes effect.
pub const TOGGLE_WORK_THRESHOLD: f64 = 10.0;
/// Hours of full-load burn a tank with ratio 1 holds (one sol).
const TANK_HOURS: f64 = 24.66;

const THERMAL_EFFICIENCY: f64 = 0.9;
const ELECTRIC_EFFICIENCY: f64 = 0.4;

/// Specific energy of a fuel (kWh/kg).
pub fn specific_energy(fuel: ResourceId) -> f64 {
    match fuel {
        ResourceId::Methane => 15.42,
        ResourceId::Methanol => 5.53,
        ResourceId::Oxygen => 0.0,
    }
}

/// Generator burning fuel and oxidizer drawn through a reserve tank.
///
/// The tank is refilled from settlement stock only when it cannot cover a
/// tick's burn, and only if settlement stock can cover the whole shortfall.
#[derive(Debug, Clone, Serialize)]
pub struct FuelGenerator {
    pub max_power: f64,
    pub fuel: ResourceId,
    toggle: bool,
    percent_electricity: f64,
    reserve_fuel: f64,
    reserve_oxidizer: f64,
    tank_capacity: f64,
    thermal_efficiency: f64,
    electric_efficiency: f64,
    toggle_work: f64,
    last_consumed: f64,
}

impl FuelGenerator {
    /// Creates a generator with empty reserve tanks, toggled off.
    ///
    /// # Arguments
    ///
    /// * `max_power` - Rated electrical output (kW)
    /// * `fuel` - Fuel resource burned
    /// * `tank_ratio` - Tank size in sols of full-load burn
    /// * `percent` - Initial load percent
    ///
    /// # Panics
    ///
    /// Panics if `max_power` or `tank_ratio` is negative, or `fuel` has no energy content.
    pub fn new(max_power: f64, fuel: ResourceId, tank_ratio: f64, percent: f64) -> Self {
        assert!(max_power >= 0.0);
        assert!(tank_ratio >= 0.0);
        assert!(specific_energy(fuel) > 0.0, "{fuel} is not a fuel");
        let mut generator = Self {
            max_power,
            fuel,
            toggle: false,
            percent_electricity: percent.clamp(0.0, 100.0),
            reserve_fuel: 0.0,
            reserve_oxidizer: 0.0,
            tank_capacity: 0.0,
            thermal_efficiency: THERMAL_EFFICIENCY,
            electric_efficiency: ELECTRIC_EFFICIENCY,
            toggle_work: 0.0,
            last_consumed: 0.0,
        };
        generator.tank_capacity = generator.kg_per_hour(100.0) * TANK_HOURS * tank_ratio;
        generator
    }

    /// Fuel burn rate at the given load (kg/h).
    pub fn kg_per_hour(&self, percent: f64) -> f64 {
        let per_kg = specific_energy(self.fuel) * self.thermal_efficiency * self.electric_efficiency;
        self.max_power * percent.clamp(0.0, 100.0) / 100.0 / per_kg
    }

    pub fn is_on(&self) -> bool {
        self.toggle
    }

    /// Turns the generator on.
    ///
    /// # Returns
    ///
    /// `true` if the state changed.
    pub fn toggle_on(&mut self) -> bool {
        !std::mem::replace(&mut self.toggle, true)
    }

    /// Turns the generator off.
    ///
    /// # Returns
    ///
    /// `true` if the state changed.
    pub fn toggle_off(&mut self) -> bool {
        std::mem::replace(&mut self.toggle, false)
    }

    /// Accumulates manual toggle work and flips the generator once enough is done.
    ///
    /// # Returns
    ///
    /// `true` if the toggle flipped.
    pub fn add_toggle_work_time(&mut self, millisols: f64) -> bool {
        self.toggle_work += millisols.max(0.0);
        if self.toggle_work < TOGGLE_WORK_THRESHOLD {
            return false;
        }
        self.toggle_work = 0.0;
        self.toggle = !self.toggle;
        info!(on = self.toggle, "fuel generator toggled by hand");
        true
    }

    pub fn reserve_fuel(&self) -> f64 {
        self.reserve_fuel
    }

    pub fn reserve_oxidizer(&self) -> f64 {
        self.reserve_oxidizer
    }

    pub fn tank_capacity(&self) -> f64 {
        self.tank_capacity
    }

    /// Fuel burned on the last call to [`Self::current_power`] (kg).
    pub fn last_consumed(&self) -> f64 {
        self.last_consumed
    }

    /// Output at the given load percent, without touching the tanks.
    pub fn request_power(&self, percent: f64) -> f64 {
        self.max_power * percent.clamp(0.0, 100.0) / 100.0
    }

    /// Output the generator is currently committed to.
    pub fn committed_power(&self) -> f64 {
        if self.toggle {
            self.request_power(self.percent_electricity)
        } else {
            0.0
        }
    }

    /// Whether tanks plus settlement stock can feed one tick at `percent`.
    pub fn can_sustain(&self, percent: f64, hours: f64, store: &dyn ResourceStore) -> bool {
        let needed = self.kg_per_hour(percent) * hours;
        let fuel = self.reserve_fuel + store.amount_stored(self.fuel);
        let oxidizer = self.reserve_oxidizer + store.amount_stored(ResourceId::Oxygen);
        fuel >= needed && oxidizer >= needed * OXIDIZER_FUEL_RATIO
    }

    /// Burns fuel for one tick, refilling the reserve tank from `store` if needed.
    ///
    /// # Returns
    ///
    /// Kilograms of fuel burned; `0.0` when neither tank nor stock can cover the burn.
    pub fn compute_fuel_consumption(
        &mut self,
        store: &mut dyn ResourceStore,
        hours: f64,
        percent: f64,
    ) -> f64 {
        let needed = self.kg_per_hour(percent) * hours;
        if !needed.is_finite() || needed <= 0.0 {
            return 0.0;
        }
        let oxidizer_needed = needed * OXIDIZER_FUEL_RATIO;

        if self.reserve_fuel < needed || self.reserve_oxidizer < oxidizer_needed {
            let shortfall = (needed - self.reserve_fuel)
                .max((oxidizer_needed - self.reserve_oxidizer) / OXIDIZER_FUEL_RATIO)
                .max(0.0);
            let top_up = (self.tank_capacity - self.reserve_fuel)
                .max(shortfall)
                .min(store.amount_stored(self.fuel))
                .min(store.amount_stored(ResourceId::Oxygen) / OXIDIZER_FUEL_RATIO);

            if top_up < shortfall {
                warn!(
                    fuel = %self.fuel,
                    needed,
                    available = top_up,
                    "not enough stock to refill generator tank"
                );
                return 0.0;
            }

            let fuel_in = store.retrieve(self.fuel, top_up);
            let oxidizer_in = store.retrieve(ResourceId::Oxygen, top_up * OXIDIZER_FUEL_RATIO);
            self.reserve_fuel += fuel_in;
            self.reserve_oxidizer += oxidizer_in;
            debug!(fuel = %self.fuel, top_up, "refilled generator tank");
        }

        self.reserve_fuel = (self.reserve_fuel - needed).clamp(0.0, self.tank_capacity.max(0.0));
        self.reserve_oxidizer = (self.reserve_oxidizer - oxidizer_needed)
            .clamp(0.0, self.tank_capacity.max(0.0) * OXIDIZER_FUEL_RATIO);
        needed
    }

    /// Electrical output for this tick, burning fuel when on.
    pub fn current_power(&mut self, ctx: &mut SourceContext<'_>) -> f64 {
        self.last_consumed = 0.0;
        let hours = ctx.hours();
        if !self.toggle || self.percent_electricity <= 0.0 || hours <= 0.0 {
            return 0.0;
        }
        let consumed = self.compute_fuel_consumption(ctx.store, hours, self.percent_electricity);
        self.last_consumed = consumed;
        consumed * specific_energy(self.fuel) * self.thermal_efficiency * self.electric_efficiency
            / hours
    }

    /// Siting estimate: rated output net of the value of the fuel it burns.
    pub fn average_power(&self, siting: &SitingInputs) -> f64 {
        (self.max_power - siting.fuel_value_per_kg * self.kg_per_hour(100.0)).max(0.0)
    }

    pub fn maintenance_time(&self) -> f64 {
        self.max_power * 2.0
    }
}

impl AdjustableLoad for FuelGenerator {
    fn load_capacity(&self) -> f64 {
        self.percent_electricity
    }

    /// Sets the load; dropping to 0 turns the generator off and raising
    /// from 0 turns it on.
    fn set_load_capacity(&mut self, percent: f64) {
        self.percent_electricity = percent.clamp(0.0, 100.0);
        self.toggle = self.percent_electricity > 0.0;
    }

    fn load_step(&self) -> f64 {
        FUEL_LOAD_STEP
    }

    fn min_load(&self) -> f64 {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Environment;
    use crate::inventory::Inventory;
    use approx::assert_relative_eq;

    fn stocked(fuel_kg: f64) -> Inventory {
        Inventory::new()
            .with(ResourceId::Methane, fuel_kg)
            .with(ResourceId::Oxygen, fuel_kg * OXIDIZER_FUEL_RATIO)
    }

    #[test]
    fn new_generator_is_off_with_empty_tanks() {
        let g = FuelGenerator::new(10.0, ResourceId::Methane, 1.0, 0.0);
        assert!(!g.is_on());
        assert_eq!(g.reserve_fuel(), 0.0);
        assert_eq!(g.reserve_oxidizer(), 0.0);
        assert!(g.tank_capacity() > 0.0);
    }

    #[test]
    fn off_generator_produces_nothing() {
        let mut g = FuelGenerator::new(10.0, ResourceId::Methane, 1.0, 100.0);
        let mut inv = stocked(100.0);
        let env = Environment::night();
        let mut ctx = SourceContext {
            elapsed: 10.0,
            environment: &env,
            store: &mut inv,
        };
        assert_eq!(g.current_power(&mut ctx), 0.0);
        assert_eq!(inv.amount_stored(ResourceId::Methane), 100.0);
    }

    #[test]
    fn on_generator_delivers_requested_power() {
        let mut g = FuelGenerator::new(10.0, ResourceId::Methane, 1.0, 50.0);
        g.toggle_on();
        let mut inv = stocked(1000.0);
        let env = Environment::night();
        let mut ctx = SourceContext {
            elapsed: 10.0,
            environment: &env,
            store: &mut inv,
        };
        assert_relative_eq!(g.current_power(&mut ctx), 5.0, epsilon = 1e-9);
        assert!(g.last_consumed() > 0.0);
    }

    #[test]
    fn refill_tops_tank_to_capacity() {
        let mut g = FuelGenerator::new(10.0, ResourceId::Methane, 1.0, 100.0);
        let mut inv = stocked(1000.0);
        let burned = g.compute_fuel_consumption(&mut inv, 1.0, 100.0);
        assert_relative_eq!(burned, g.kg_per_hour(100.0));
        assert_relative_eq!(g.reserve_fuel(), g.tank_capacity() - burned, epsilon = 1e-9);
        assert_relative_eq!(
            inv.amount_stored(ResourceId::Methane),
            1000.0 - g.tank_capacity(),
            epsilon = 1e-9
        );
        assert_relative_eq!(
            g.reserve_oxidizer(),
            (g.tank_capacity() - burned) * OXIDIZER_FUEL_RATIO,
            epsilon = 1e-9
        );
    }

    #[test]
    fn reserve_is_used_before_stock() {
        let mut g = FuelGenerator::new(10.0, ResourceId::Methane, 1.0, 100.0);
        let mut inv = stocked(1000.0);
        g.compute_fuel_consumption(&mut inv, 1.0, 100.0);
        let stock_after_refill = inv.amount_stored(ResourceId::Methane);
        g.compute_fuel_consumption(&mut inv, 1.0, 100.0);
        assert_eq!(inv.amount_stored(ResourceId::Methane), stock_after_refill);
    }

    #[test]
    fn refused_when_stock_cannot_cover_shortfall() {
        let mut g = FuelGenerator::new(10.0, ResourceId::Methane, 1.0, 100.0);
        let mut inv = Inventory::new().with(ResourceId::Oxygen, 1000.0);
        let burned = g.compute_fuel_consumption(&mut inv, 1.0, 100.0);
        assert_eq!(burned, 0.0);
        assert_eq!(g.reserve_fuel(), 0.0);
        assert_eq!(inv.amount_stored(ResourceId::Oxygen), 1000.0);
    }

    #[test]
    fn partial_refill_when_stock_is_short_of_a_full_tank() {
        let mut g = FuelGenerator::new(10.0, ResourceId::Methane, 1.0, 100.0);
        let needed = g.kg_per_hour(100.0);
        let mut inv = stocked(needed * 2.0);
        let burned = g.compute_fuel_consumption(&mut inv, 1.0, 100.0);
        assert_relative_eq!(burned, needed);
        assert_relative_eq!(g.reserve_fuel(), needed, epsilon = 1e-9);
        assert!(inv.amount_stored(ResourceId::Methane) < 1e-9);
    }

    #[test]
    fn manual_toggle_needs_work_threshold() {
        let mut g = FuelGenerator::new(10.0, ResourceId::Methanol, 1.0, 0.0);
        assert!(!g.add_toggle_work_time(4.0));
        assert!(!g.add_toggle_work_time(4.0));
        assert!(g.add_toggle_work_time(4.0));
        assert!(g.is_on());
        assert!(!g.add_toggle_work_time(1.0));
        assert!(g.is_on());
    }

    #[test]
    fn setting_zero_load_turns_off() {
        let mut g = FuelGenerator::new(10.0, ResourceId::Methane, 1.0, 0.0);
        g.set_load_capacity(FUEL_LOW_LOAD_PERCENT);
        assert!(g.is_on());
        assert_relative_eq!(g.committed_power(), 5.0);
        g.set_load_capacity(0.0);
        assert!(!g.is_on());
        assert_eq!(g.committed_power(), 0.0);
    }

    #[test]
    fn average_power_nets_fuel_value() {
        let g = FuelGenerator::new(10.0, ResourceId::Methane, 1.0, 0.0);
        let cheap = SitingInputs {
            fuel_value_per_kg: 0.0,
            ..SitingInputs::default()
        };
        let dear = SitingInputs {
            fuel_value_per_kg: 1_000.0,
            ..SitingInputs::default()
        };
        assert_relative_eq!(g.average_power(&cheap), 10.0);
        assert_eq!(g.average_power(&dear), 0.0);
    }

    #[test]
    fn toggles_report_changes() {
        let mut g = FuelGenerator::new(10.0, ResourceId::Methane, 1.0, 0.0);
        assert!(g.toggle_on());
        assert!(!g.toggle_on());
        assert!(g.toggle_off());
        assert!(!g.toggle_off());
    }
}
