//! Settlement power balance arithmetic.

/// Headroom multiplier applied to required power before comparing with supply.
pub const ROLLING_FACTOR: f64 = 1.1;

/// Average voltage retained across the settlement's cabling, in percent.
pub const PERC_AVG_VOLT_DROP: f64 = 98.0;

/// Power still needed after generation, with the rolling headroom applied.
///
/// Positive values are a deficit, negative values a surplus.
///
/// # Arguments
///
/// * `required_kw` - Total demand of all buildings in their current modes
/// * `generated_kw` - Total generation for the tick
pub fn needed_power(required_kw: f64, generated_kw: f64) -> f64 {
    required_kw * ROLLING_FACTOR - generated_kw
}

/// Economic value of power: demand relative to supply plus half the stored energy.
pub fn power_value(required_kw: f64, generated_kw: f64, stored_kwh: f64) -> f64 {
    let value = required_kw / (generated_kw + stored_kwh / 2.0 + 1.0);
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

/// System efficiency after `elapsed` millisols of degradation.
pub fn degrade(efficiency: f64, rate_per_sol: f64, elapsed: f64) -> f64 {
    (efficiency - efficiency * rate_per_sol * elapsed / 1000.0).clamp(0.0, 1.0)
}

/// Energy to request from storage to deliver `power_kw` for `hours` after cable loss (kWh).
pub fn storage_request(power_kw: f64, hours: f64) -> f64 {
    power_kw * hours / PERC_AVG_VOLT_DROP * 100.0
}

/// Power delivered to loads by `energy_kwh` drawn from storage over `hours` (kW).
pub fn storage_delivery(energy_kwh: f64, hours: f64) -> f64 {
    if hours <= 0.0 {
        return 0.0;
    }
    energy_kwh * PERC_AVG_VOLT_DROP / 100.0 / hours
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn deficit_is_positive() {
        assert_relative_eq!(needed_power(10.0, 5.0), 6.0);
    }

    #[test]
    fn surplus_is_negative() {
        assert_relative_eq!(needed_power(5.0, 10.0), -4.5);
    }

    #[test]
    fn exact_balance_is_zero() {
        assert_eq!(needed_power(10.0, 10.0 * ROLLING_FACTOR), 0.0);
    }

    #[test]
    fn power_value_falls_with_supply() {
        let scarce = power_value(10.0, 0.0, 0.0);
        let plenty = power_value(10.0, 20.0, 10.0);
        assert_relative_eq!(scarce, 10.0);
        assert_relative_eq!(plenty, 10.0 / 26.0);
    }

    #[test]
    fn power_value_guards_degenerate_input() {
        assert_eq!(power_value(10.0, -1.0, 0.0), 0.0);
        assert_eq!(power_value(f64::NAN, 1.0, 0.0), 0.0);
    }

    #[test]
    fn degradation_is_slow_and_monotone() {
        let e = degrade(1.0, 0.0004, 1000.0);
        assert_relative_eq!(e, 0.9996);
        assert!(degrade(e, 0.0004, 10.0) < e);
    }

    #[test]
    fn storage_round_trip_loses_cable_drop() {
        let hours = 0.5;
        let requested = storage_request(10.0, hours);
        assert!(requested > 5.0);
        assert_relative_eq!(storage_delivery(requested, hours), 10.0, epsilon = 1e-12);
    }
}
