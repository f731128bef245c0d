//! CSV export for grid tick reports.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::grid::TickReport;

/// Column header for CSV telemetry export.
const HEADER: &str = "tick,mission_sol,millisol,generated_kw,required_kw,needed_kw,\
                       sufficient,suppressed,resolved_at,stored_kwh,capacity_kwh,\
                       charged_kwh,drawn_kwh,fuel_burned_kg,power_value,efficiency,\
                       buildings_full,buildings_low,buildings_none,life_support_reduced";

/// Exports tick reports to a CSV file at the given path.
///
/// Writes a header row followed by one data row per tick. Produces
/// deterministic output for identical inputs.
///
/// # Arguments
///
/// * `results` - Complete run reports
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(results: &[TickReport], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(results, buf)
}

/// Writes tick reports as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(results: &[TickReport], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in results {
        wtr.write_record(&[
            r.tick.to_string(),
            r.mission_sol.to_string(),
            format!("{:.1}", r.millisol),
            format!("{:.4}", r.generated_kw),
            format!("{:.4}", r.required_kw),
            format!("{:.4}", r.needed_kw),
            r.sufficient.to_string(),
            r.suppressed.to_string(),
            r.resolved_at.map(|s| s.to_string()).unwrap_or_default(),
            format!("{:.4}", r.stored_kwh),
            format!("{:.4}", r.capacity_kwh),
            format!("{:.4}", r.battery_charged_kwh),
            format!("{:.4}", r.battery_drawn_kwh),
            format!("{:.5}", r.fuel_burned_kg),
            format!("{:.5}", r.power_value),
            format!("{:.6}", r.system_efficiency),
            r.buildings_full.to_string(),
            r.buildings_low.to_string(),
            r.buildings_none.to_string(),
            r.life_support_reduced.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CascadeStep;

    fn make_report(t: usize) -> TickReport {
        TickReport {
            tick: t,
            mission_sol: 1,
            millisol: 10.0 * (t + 1) as f64,
            generated_kw: 12.0,
            required_kw: 10.0,
            needed_kw: -1.0,
            sufficient: true,
            suppressed: t == 0,
            resolved_at: (t > 0).then_some(CascadeStep::ChargeBatteries),
            stored_kwh: 5.0,
            capacity_kwh: 10.0,
            battery_charged_kwh: 0.2,
            battery_drawn_kwh: 0.0,
            fuel_burned_kg: 0.0,
            power_value: 0.5,
            system_efficiency: 0.9999,
            buildings_full: 3,
            buildings_low: 0,
            buildings_none: 0,
            life_support_reduced: 0,
            events: Vec::new(),
        }
    }

    fn render(results: &[TickReport]) -> String {
        let mut buf = Vec::new();
        write_csv(results, &mut buf).ok();
        String::from_utf8(buf).unwrap_or_default()
    }

    #[test]
    fn header_lists_every_column() {
        let output = render(&[make_report(0)]);
        let first_line = output.lines().next().unwrap_or("");
        assert!(first_line.starts_with("tick,mission_sol,millisol,generated_kw"));
        assert!(first_line.ends_with("buildings_none,life_support_reduced"));
        assert_eq!(first_line.split(',').count(), 20);
    }

    #[test]
    fn row_count_matches_tick_count() {
        let results: Vec<TickReport> = (0..24).map(make_report).collect();
        let output = render(&results);
        // 1 header + 24 data rows
        assert_eq!(output.lines().count(), 25);
    }

    #[test]
    fn deterministic_output() {
        let results: Vec<TickReport> = (0..5).map(make_report).collect();
        assert_eq!(render(&results), render(&results));
    }

    #[test]
    fn rows_parse_back() {
        let results: Vec<TickReport> = (0..3).map(make_report).collect();
        let mut buf = Vec::new();
        write_csv(&results, &mut buf).ok();

        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        let headers = rdr.headers().cloned().ok();
        assert_eq!(headers.as_ref().map(csv::StringRecord::len), Some(20));

        let records: Vec<csv::StringRecord> = rdr.records().filter_map(Result::ok).collect();
        assert_eq!(records.len(), 3);
        assert_eq!(&records[0][8], "");
        assert_eq!(&records[1][8], "charge_batteries");
        for rec in &records {
            assert!(rec[3].parse::<f64>().is_ok());
            assert!(rec[6].parse::<bool>().is_ok());
        }
    }
}
