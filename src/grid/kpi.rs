//! Post-hoc KPI computation from tick reports.

use std::fmt;

use serde::Serialize;

use super::types::TickReport;

/// Aggregate indicators for a complete run.
///
/// Computed after the run from `Vec<TickReport>` so the reported numbers
/// always agree with the per-tick records.
#[derive(Debug, Clone, Serialize)]
pub struct KpiReport {
    /// Ticks in the run.
    pub ticks: usize,
    /// Percentage of ticks that ended with no unmet need.
    pub sufficiency_pct: f64,
    /// Ticks that ended with unmet need.
    pub deficit_ticks: usize,
    /// Ticks that ended with at least one life-support building below full power.
    pub life_support_reduced_ticks: usize,
    /// Energy put into storage over the run (kWh).
    pub energy_charged_kwh: f64,
    /// Energy drawn from storage over the run (kWh).
    pub energy_drawn_kwh: f64,
    /// Highest demand seen (kW).
    pub peak_required_kw: f64,
    /// Lowest stored energy seen (kWh).
    pub min_stored_kwh: f64,
    /// Fuel burned over the run (kg).
    pub fuel_burned_kg: f64,
    /// Mean power value across ticks.
    pub mean_power_value: f64,
    /// System efficiency at the end of the run.
    pub final_efficiency: f64,
}

impl KpiReport {
    /// Computes all KPIs from the complete tick record vector.
    pub fn from_results(results: &[TickReport]) -> Self {
        if results.is_empty() {
            return Self {
                ticks: 0,
                sufficiency_pct: 0.0,
                deficit_ticks: 0,
                life_support_reduced_ticks: 0,
                energy_charged_kwh: 0.0,
                energy_drawn_kwh: 0.0,
                peak_required_kw: 0.0,
                min_stored_kwh: 0.0,
                fuel_burned_kg: 0.0,
                mean_power_value: 0.0,
                final_efficiency: 1.0,
            };
        }

        let n = results.len() as f64;
        let mut deficit_ticks = 0_usize;
        let mut reduced = 0_usize;
        let mut charged = 0.0_f64;
        let mut drawn = 0.0_f64;
        let mut peak = 0.0_f64;
        let mut min_stored = f64::INFINITY;
        let mut fuel = 0.0_f64;
        let mut value_sum = 0.0_f64;

        for r in results {
            if !r.sufficient {
                deficit_ticks += 1;
            }
            if r.life_support_reduced > 0 {
                reduced += 1;
            }
            charged += r.battery_charged_kwh;
            drawn += r.battery_drawn_kwh;
            peak = peak.max(r.required_kw);
            min_stored = min_stored.min(r.stored_kwh);
            fuel += r.fuel_burned_kg;
            value_sum += r.power_value;
        }

        Self {
            ticks: results.len(),
            sufficiency_pct: 100.0 * (n - deficit_ticks as f64) / n,
            deficit_ticks,
            life_support_reduced_ticks: reduced,
            energy_charged_kwh: charged,
            energy_drawn_kwh: drawn,
            peak_required_kw: peak,
            min_stored_kwh: min_stored,
            fuel_burned_kg: fuel,
            mean_power_value: value_sum / n,
            final_efficiency: results.last().map_or(1.0, |r| r.system_efficiency),
        }
    }
}

impl fmt::Display for KpiReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- KPI Report ---")?;
        writeln!(f, "Ticks:                 {}", self.ticks)?;
        writeln!(f, "Sufficient power:      {:.1}%", self.sufficiency_pct)?;
        writeln!(f, "Deficit ticks:         {}", self.deficit_ticks)?;
        writeln!(f, "Life support reduced:  {}", self.life_support_reduced_ticks)?;
        writeln!(
            f,
            "Storage charged/drawn: {:.2} / {:.2} kWh",
            self.energy_charged_kwh, self.energy_drawn_kwh
        )?;
        writeln!(f, "Peak demand:           {:.2} kW", self.peak_required_kw)?;
        writeln!(f, "Minimum stored:        {:.2} kWh", self.min_stored_kwh)?;
        writeln!(f, "Fuel burned:           {:.3} kg", self.fuel_burned_kg)?;
        writeln!(f, "Mean power value:      {:.4}", self.mean_power_value)?;
        write!(f, "Final efficiency:      {:.6}", self.final_efficiency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_result(sufficient: bool, charged: f64, drawn: f64, stored: f64) -> TickReport {
        TickReport {
            tick: 0,
            mission_sol: 1,
            millisol: 0.0,
            generated_kw: 0.0,
            required_kw: 5.0,
            needed_kw: 0.0,
            sufficient,
            suppressed: false,
            resolved_at: None,
            stored_kwh: stored,
            capacity_kwh: 10.0,
            battery_charged_kwh: charged,
            battery_drawn_kwh: drawn,
            fuel_burned_kg: 0.1,
            power_value: 1.0,
            system_efficiency: 0.99,
            buildings_full: 1,
            buildings_low: 0,
            buildings_none: 0,
            life_support_reduced: usize::from(!sufficient),
            events: Vec::new(),
        }
    }

    #[test]
    fn sufficiency_counts_deficit_ticks() {
        let results = vec![
            make_result(true, 0.0, 0.0, 5.0),
            make_result(false, 0.0, 0.0, 5.0),
            make_result(true, 0.0, 0.0, 5.0),
            make_result(false, 0.0, 0.0, 5.0),
        ];
        let kpi = KpiReport::from_results(&results);
        assert_eq!(kpi.deficit_ticks, 2);
        assert_eq!(kpi.life_support_reduced_ticks, 2);
        assert_relative_eq!(kpi.sufficiency_pct, 50.0);
    }

    #[test]
    fn storage_flows_are_summed() {
        let results = vec![
            make_result(true, 1.0, 0.0, 6.0),
            make_result(true, 0.0, 0.5, 5.5),
            make_result(true, 0.25, 0.0, 5.75),
        ];
        let kpi = KpiReport::from_results(&results);
        assert_relative_eq!(kpi.energy_charged_kwh, 1.25);
        assert_relative_eq!(kpi.energy_drawn_kwh, 0.5);
        assert_relative_eq!(kpi.min_stored_kwh, 5.5);
        assert_relative_eq!(kpi.fuel_burned_kg, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn empty_results() {
        let kpi = KpiReport::from_results(&[]);
        assert_eq!(kpi.ticks, 0);
        assert_eq!(kpi.deficit_ticks, 0);
    }

    #[test]
    fn display_has_parseable_lines() {
        let kpi = KpiReport::from_results(&[make_result(true, 0.0, 0.0, 1.0)]);
        let text = kpi.to_string();
        assert!(text.contains("Sufficient power:      100.0%"));
        assert!(text.contains("Deficit ticks:         0"));
    }
}
