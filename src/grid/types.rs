//! Per-tick grid records.

use std::fmt;

use serde::Serialize;

use super::event::GridEvent;

/// Cascade lever that brought the balance back across zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeStep {
    // Surplus branch
    RestoreLifeSupport,
    ThrottleFuelDown,
    RestoreOtherBuildings,
    NudgeReactorDown,
    ChargeBatteries,
    ThrottleReactorsDown,
    // Deficit branch
    RaiseReactors,
    DrawBatteries,
    FuelLowLoad,
    RaiseReactorsAgain,
    ShedOtherBuildings,
    FuelFullLoad,
    RaiseReactorsFinal,
    ShedLifeSupport,
}

impl fmt::Display for CascadeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::RestoreLifeSupport => "restore_life_support",
            Self::ThrottleFuelDown => "throttle_fuel_down",
            Self::RestoreOtherBuildings => "restore_other_buildings",
            Self::NudgeReactorDown => "nudge_reactor_down",
            Self::ChargeBatteries => "charge_batteries",
            Self::ThrottleReactorsDown => "throttle_reactors_down",
            Self::RaiseReactors => "raise_reactors",
            Self::DrawBatteries => "draw_batteries",
            Self::FuelLowLoad => "fuel_low_load",
            Self::RaiseReactorsAgain => "raise_reactors_again",
            Self::ShedOtherBuildings => "shed_other_buildings",
            Self::FuelFullLoad => "fuel_full_load",
            Self::RaiseReactorsFinal => "raise_reactors_final",
            Self::ShedLifeSupport => "shed_life_support",
        };
        f.write_str(s)
    }
}

/// Complete record of one grid tick.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    /// Tick index.
    pub tick: usize,
    /// Mission sol.
    pub mission_sol: u32,
    /// Millisol of day at the end of the tick.
    pub millisol: f64,
    /// Total generation measured this tick (kW).
    pub generated_kw: f64,
    /// Total demand measured this tick (kW).
    pub required_kw: f64,
    /// `required × ROLLING_FACTOR − generated` at measurement (kW).
    pub needed_kw: f64,
    /// Whether supply ended strictly ahead of margin-adjusted demand.
    pub sufficient: bool,
    /// Whether the cascade was skipped for startup.
    pub suppressed: bool,
    /// Lever that closed the gap, if any did.
    pub resolved_at: Option<CascadeStep>,
    /// Energy held across all stores after the tick (kWh).
    pub stored_kwh: f64,
    /// Capacity across all stores (kWh).
    pub capacity_kwh: f64,
    /// Energy put into storage this tick (kWh).
    pub battery_charged_kwh: f64,
    /// Energy drawn from storage this tick (kWh).
    pub battery_drawn_kwh: f64,
    /// Fuel burned by generators this tick (kg).
    pub fuel_burned_kg: f64,
    /// Economic power value after the tick.
    pub power_value: f64,
    /// Grid system efficiency after degradation.
    pub system_efficiency: f64,
    /// Buildings at full power after the tick.
    pub buildings_full: usize,
    /// Buildings at low power after the tick.
    pub buildings_low: usize,
    /// Buildings shut down after the tick.
    pub buildings_none: usize,
    /// Life-support buildings below full power after the tick.
    pub life_support_reduced: usize,
    /// Changes raised during the tick, oldest first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<GridEvent>,
}

impl fmt::Display for TickReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let resolved = self
            .resolved_at
            .map_or_else(|| "-".to_string(), |s| s.to_string());
        write!(
            f,
            "t={:03} sol={} msol={:>6.1} gen={:>7.2}kW req={:>7.2}kW need={:>7.2}kW \
             stored={:>7.2}kWh chg={:.2} drw={:.2} fuel={:.3}kg \
             F/L/N={}/{}/{} ok={}{} via={}",
            self.tick,
            self.mission_sol,
            self.millisol,
            self.generated_kw,
            self.required_kw,
            self.needed_kw,
            self.stored_kwh,
            self.battery_charged_kwh,
            self.battery_drawn_kwh,
            self.fuel_burned_kg,
            self.buildings_full,
            self.buildings_low,
            self.buildings_none,
            self.sufficient,
            if self.suppressed { " (startup)" } else { "" },
            resolved,
        )
    }
}

/// Formats stored energy as `"<kWh> (<pct> %)"`; empty when not finite.
pub fn stored_energy_display(stored_kwh: f64, capacity_kwh: f64) -> String {
    if !stored_kwh.is_finite() || !capacity_kwh.is_finite() {
        return String::new();
    }
    let pct = if capacity_kwh > 0.0 {
        100.0 * stored_kwh / capacity_kwh
    } else {
        0.0
    };
    format!("{stored_kwh:.2} kWh ({pct:.1} %)")
}
