//! Battery bank with a lumped electrochemical charge/discharge model.

use serde::Serialize;

/// Fixed load resistance used to derive the output voltage (ohm).
pub const R_LOAD: f64 = 1000.0;

/// Charge acceptance tapers as `CHARGE_FUDGE × (1 − SoC)`.
const CHARGE_FUDGE: f64 = 5.0;
/// Discharge capability tapers as `DISCHARGE_FUDGE × SoC`.
const DISCHARGE_FUDGE: f64 = 3.0;

/// Battery storage installed in one building.
///
/// `0 ≤ stored_energy ≤ capacity` holds after every mutation.
#[derive(Debug, Clone, Serialize)]
pub struct EnergyStore {
    /// Energy currently held (kWh).
    stored_energy: f64,
    /// Total capacity (kWh).
    capacity: f64,
    /// Open-circuit terminal voltage (V).
    pub terminal_voltage: f64,
    /// Lumped internal resistance (ohm).
    pub internal_resistance: f64,
    /// Maximum charge/discharge current as a multiple of capacity per hour.
    pub max_c_rating: f64,
    /// Rated charge (Ah), derived from capacity and voltage.
    amp_hour_rating: f64,
}

impl EnergyStore {
    /// Creates a new energy store.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Capacity in kWh (must be >= 0)
    /// * `stored_energy` - Initial charge in kWh, clamped to `[0, capacity]`
    /// * `terminal_voltage` - Terminal voltage in volts (must be > 0)
    /// * `internal_resistance` - Internal resistance in ohm (must be >= 0)
    /// * `max_c_rating` - Maximum C-rating (must be > 0)
    ///
    /// # Panics
    ///
    /// Panics if any parameter is outside its range.
    pub fn new(
        capacity: f64,
        stored_energy: f64,
        terminal_voltage: f64,
        internal_resistance: f64,
        max_c_rating: f64,
    ) -> Self {
        assert!(capacity >= 0.0, "capacity must be >= 0");
        assert!(terminal_voltage > 0.0, "terminal_voltage must be > 0");
        assert!(internal_resistance >= 0.0, "internal_resistance must be >= 0");
        assert!(max_c_rating > 0.0, "max_c_rating must be > 0");
        Self {
            stored_energy: stored_energy.clamp(0.0, capacity),
            capacity,
            terminal_voltage,
            internal_resistance,
            max_c_rating,
            amp_hour_rating: capacity * 1000.0 / terminal_voltage,
        }
    }

    pub fn stored_energy(&self) -> f64 {
        self.stored_energy
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn amp_hour_rating(&self) -> f64 {
        self.amp_hour_rating
    }

    /// Remaining room for charge (kWh).
    pub fn headroom(&self) -> f64 {
        (self.capacity - self.stored_energy).max(0.0)
    }

    /// Stored energy over capacity, in `[0, 1]`.
    pub fn state_of_charge(&self) -> f64 {
        if self.capacity <= 0.0 {
            0.0
        } else {
            (self.stored_energy / self.capacity).clamp(0.0, 1.0)
        }
    }

    /// Terminal voltage seen across the fixed load resistance.
    pub fn output_voltage(&self) -> f64 {
        self.terminal_voltage * R_LOAD / (R_LOAD + self.internal_resistance)
    }

    /// Energy the store can accept this tick (kWh).
    ///
    /// Bounded by the offered `excess`, the headroom, and a C-rating limit that
    /// tapers to zero as the store approaches full.
    pub fn compute_storable_energy(&self, excess: f64, hours: f64) -> f64 {
        let headroom = self.headroom();
        if !(excess > 0.0 && headroom > 0.0 && hours > 0.0) {
            return 0.0;
        }
        let soc = self.state_of_charge();
        let fudge = CHARGE_FUDGE * (1.0 - soc);
        let amp_hours_now = self.max_c_rating * self.amp_hour_rating * (1.0 - soc);
        let possible = amp_hours_now / 1000.0 * self.output_voltage() * hours * fudge;
        excess.min(headroom).min(possible).max(0.0)
    }

    /// Energy the store can release this tick (kWh).
    ///
    /// Bounded by `needed`, the stored energy, and a C-rating limit that
    /// tapers as the store empties.
    pub fn compute_available_energy(&self, needed: f64, hours: f64) -> f64 {
        if !(needed > 0.0 && self.stored_energy > 0.0 && hours > 0.0) {
            return 0.0;
        }
        let fudge = DISCHARGE_FUDGE * self.state_of_charge();
        let possible =
            self.max_c_rating * self.amp_hour_rating / 1000.0 * self.output_voltage() * hours * fudge;
        needed.min(self.stored_energy).min(possible).max(0.0)
    }

    /// Replaces the stored energy, clamped to `[0, capacity]`.
    ///
    /// Non-finite values are ignored.
    pub fn recondition_battery(&mut self, stored_energy: f64) {
        if stored_energy.is_finite() {
            self.stored_energy = stored_energy.clamp(0.0, self.capacity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn store(stored: f64) -> EnergyStore {
        EnergyStore::new(10.0, stored, 600.0, 0.1, 2.0)
    }

    #[test]
    fn test_new_store() {
        let s = store(4.0);
        assert_eq!(s.capacity(), 10.0);
        assert_eq!(s.stored_energy(), 4.0);
        assert_relative_eq!(s.state_of_charge(), 0.4);
        assert_relative_eq!(s.amp_hour_rating(), 10_000.0 / 600.0);
    }

    #[test]
    fn initial_charge_is_clamped() {
        assert_eq!(store(50.0).stored_energy(), 10.0);
        assert_eq!(store(-1.0).stored_energy(), 0.0);
    }

    #[test]
    #[should_panic(expected = "terminal_voltage")]
    fn zero_voltage_panics() {
        let _ = EnergyStore::new(10.0, 0.0, 0.0, 0.1, 2.0);
    }

    #[test]
    fn storable_is_bounded_by_excess_and_headroom() {
        let s = store(9.5);
        assert!(s.compute_storable_energy(100.0, 10.0) <= 0.5 + 1e-12);
        let s = store(0.0);
        assert_relative_eq!(s.compute_storable_energy(0.1, 10.0), 0.1);
    }

    #[test]
    fn storable_tapers_near_full() {
        let low = store(1.0).compute_storable_energy(100.0, 0.1);
        let high = store(8.0).compute_storable_energy(100.0, 0.1);
        assert!(low > high);
    }

    #[test]
    fn full_store_accepts_nothing() {
        assert_eq!(store(10.0).compute_storable_energy(5.0, 1.0), 0.0);
    }

    #[test]
    fn non_positive_requests_give_zero() {
        let s = store(5.0);
        assert_eq!(s.compute_storable_energy(-1.0, 1.0), 0.0);
        assert_eq!(s.compute_storable_energy(f64::NAN, 1.0), 0.0);
        assert_eq!(s.compute_available_energy(0.0, 1.0), 0.0);
        assert_eq!(s.compute_available_energy(1.0, 0.0), 0.0);
    }

    #[test]
    fn available_is_bounded_by_stored_and_c_rating() {
        let s = store(2.0);
        let hours = 10.0 * crate::grid::clock::HOURS_PER_MILLISOL;
        // C-limit: 2 × 16.67 Ah / 1000 × ~600 V × hours × 3 × 0.2
        let c_limit = 2.0 * s.amp_hour_rating() / 1000.0 * s.output_voltage() * hours * 0.6;
        assert_relative_eq!(s.compute_available_energy(100.0, hours), 2.0_f64.min(c_limit));
        assert_relative_eq!(s.compute_available_energy(0.5, hours), 0.5);
    }

    #[test]
    fn empty_store_releases_nothing() {
        assert_eq!(store(0.0).compute_available_energy(5.0, 1.0), 0.0);
    }

    #[test]
    fn recondition_clamps() {
        let mut s = store(5.0);
        s.recondition_battery(12.0);
        assert_eq!(s.stored_energy(), 10.0);
        s.recondition_battery(-3.0);
        assert_eq!(s.stored_energy(), 0.0);
        s.recondition_battery(f64::NAN);
        assert_eq!(s.stored_energy(), 0.0);
    }
}
