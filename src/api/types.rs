//! API response and query types.
//!
//! Telemetry field names follow the CSV export columns.

use serde::{Deserialize, Serialize};

use crate::building::{Building, BuildingCategory, BuildingId, PowerMode};
use crate::grid::kpi::KpiReport;
use crate::grid::{CascadeStep, TickReport};
use crate::settlement::Settlement;

/// Static and end-of-run view of one building.
#[derive(Debug, Clone, Serialize)]
pub struct BuildingSummary {
    pub id: BuildingId,
    pub name: String,
    pub category: BuildingCategory,
    pub life_support: bool,
    pub power_mode: PowerMode,
    pub full_power_kw: f64,
    pub low_power_kw: f64,
    pub generated_kw: f64,
    /// Energy held, for buildings with a battery bank (kWh).
    pub stored_kwh: Option<f64>,
}

impl From<&Building> for BuildingSummary {
    fn from(b: &Building) -> Self {
        Self {
            id: b.id,
            name: b.name.clone(),
            category: b.category,
            life_support: b.life_support,
            power_mode: b.power_mode(),
            full_power_kw: b.full_power_required,
            low_power_kw: b.low_power_required,
            generated_kw: b.generated_power(),
            stored_kwh: b.storage.as_ref().map(|s| s.stored_energy()),
        }
    }
}

/// Settlement snapshot served by `/state`.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementSummary {
    pub name: String,
    pub grid_power_mode: PowerMode,
    pub system_efficiency: f64,
    /// Stored energy as shown to operators, e.g. `"5.00 kWh (50.0 %)"`.
    pub stored_energy: String,
    pub power_value: f64,
    /// Siting estimate of all installed generation (kW).
    pub average_supply_kw: f64,
    pub buildings: Vec<BuildingSummary>,
}

impl From<&Settlement> for SettlementSummary {
    fn from(s: &Settlement) -> Self {
        let grid = s.grid();
        Self {
            name: s.name.clone(),
            grid_power_mode: grid.power_mode(),
            system_efficiency: grid.system_efficiency(),
            stored_energy: grid.stored_energy_display(),
            power_value: grid.power_value(),
            average_supply_kw: s.total_average_power(),
            buildings: s.buildings().iter().map(BuildingSummary::from).collect(),
        }
    }
}

/// Combined state response: settlement, KPIs, and latest telemetry record.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub settlement: SettlementSummary,
    pub kpi: KpiReport,
    /// Most recent telemetry record, absent for an empty run.
    pub latest_tick: Option<TelemetryRecord>,
}

/// Single telemetry record.
///
/// Renames from `TickReport`:
/// - `battery_charged_kwh` → `charged_kwh`
/// - `battery_drawn_kwh` → `drawn_kwh`
/// - `system_efficiency` → `efficiency`
#[derive(Debug, Serialize)]
pub struct TelemetryRecord {
    pub tick: usize,
    pub mission_sol: u32,
    pub millisol: f64,
    pub generated_kw: f64,
    pub required_kw: f64,
    pub needed_kw: f64,
    pub sufficient: bool,
    pub suppressed: bool,
    pub resolved_at: Option<CascadeStep>,
    pub stored_kwh: f64,
    pub capacity_kwh: f64,
    pub charged_kwh: f64,
    pub drawn_kwh: f64,
    pub fuel_burned_kg: f64,
    pub power_value: f64,
    pub efficiency: f64,
    pub buildings_full: usize,
    pub buildings_low: usize,
    pub buildings_none: usize,
    pub life_support_reduced: usize,
}

impl From<&TickReport> for TelemetryRecord {
    fn from(r: &TickReport) -> Self {
        Self {
            tick: r.tick,
            mission_sol: r.mission_sol,
            millisol: r.millisol,
            generated_kw: r.generated_kw,
            required_kw: r.required_kw,
            needed_kw: r.needed_kw,
            sufficient: r.sufficient,
            suppressed: r.suppressed,
            resolved_at: r.resolved_at,
            stored_kwh: r.stored_kwh,
            capacity_kwh: r.capacity_kwh,
            charged_kwh: r.battery_charged_kwh,
            drawn_kwh: r.battery_drawn_kwh,
            fuel_burned_kg: r.fuel_burned_kg,
            power_value: r.power_value,
            efficiency: r.system_efficiency,
            buildings_full: r.buildings_full,
            buildings_low: r.buildings_low,
            buildings_none: r.buildings_none,
            life_support_reduced: r.life_support_reduced,
        }
    }
}

/// Optional range query parameters for the telemetry endpoint.
#[derive(Debug, Deserialize)]
pub struct TelemetryQuery {
    /// Start tick (inclusive).
    pub from: Option<usize>,
    /// End tick (inclusive).
    pub to: Option<usize>,
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::PowerGrid;
    use crate::inventory::Inventory;
    use crate::storage::{Apportionment, EnergyStore};

    #[test]
    fn telemetry_record_renames_storage_fields() {
        let report = TickReport {
            tick: 5,
            mission_sol: 2,
            millisol: 60.0,
            generated_kw: 8.0,
            required_kw: 9.0,
            needed_kw: 1.9,
            sufficient: false,
            suppressed: false,
            resolved_at: None,
            stored_kwh: 3.0,
            capacity_kwh: 10.0,
            battery_charged_kwh: 0.0,
            battery_drawn_kwh: 0.75,
            fuel_burned_kg: 0.0,
            power_value: 0.9,
            system_efficiency: 0.998,
            buildings_full: 1,
            buildings_low: 2,
            buildings_none: 0,
            life_support_reduced: 1,
            events: Vec::new(),
        };
        let record = TelemetryRecord::from(&report);
        assert_eq!(record.tick, 5);
        assert_eq!(record.drawn_kwh, 0.75);
        assert_eq!(record.charged_kwh, 0.0);
        assert_eq!(record.efficiency, 0.998);
        assert!(!record.sufficient);
    }

    #[test]
    fn settlement_summary_lists_buildings() {
        let grid = PowerGrid::new(0.0, Apportionment::Proportional, 1);
        let mut s = Settlement::new("Olympus", grid, Inventory::new());
        s.add_building(Building::new(BuildingId(1), "hab", 10.0, 2.0, true));
        s.add_building(
            Building::new(BuildingId(2), "bank", 0.2, 0.1, false)
                .with_storage(EnergyStore::new(10.0, 4.0, 600.0, 0.1, 2.0)),
        );
        let summary = SettlementSummary::from(&s);
        assert_eq!(summary.name, "Olympus");
        assert_eq!(summary.buildings.len(), 2);
        assert!(summary.buildings[0].life_support);
        assert_eq!(summary.buildings[1].stored_kwh, Some(4.0));
    }
}
