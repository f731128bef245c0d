//! Run loop driving a settlement through a clock and an environment.

use tracing::{debug, info};

use super::clock::Clock;
use super::types::TickReport;
use crate::environment::EnvironmentSampler;
use crate::settlement::Settlement;

/// Owns a settlement, its clock, and its environment sampler.
///
/// Generic over `E: EnvironmentSampler` for static dispatch.
pub struct Engine<E: EnvironmentSampler> {
    clock: Clock,
    settlement: Settlement,
    environment: E,
}

impl<E: EnvironmentSampler> Engine<E> {
    pub fn new(clock: Clock, settlement: Settlement, environment: E) -> Self {
        Self {
            clock,
            settlement,
            environment,
        }
    }

    /// Executes one tick and returns its report.
    ///
    /// Samples the environment, refreshes generation, then runs the grid.
    /// Grid events raised during the tick are moved onto the report, so the
    /// grid's queue is empty between steps.
    pub fn step(&mut self, t: usize) -> TickReport {
        let pulse = self.clock.pulse_at(t);
        let environment = self.environment.sample(&pulse);
        let mut report = self.settlement.time_passing(&pulse, &environment);
        report.events = self.settlement.grid_mut().drain_events();
        if !report.events.is_empty() {
            debug!(tick = t, events = report.events.len(), "grid events");
        }
        report
    }

    /// Executes all ticks and returns the complete report vector.
    pub fn run(&mut self) -> Vec<TickReport> {
        let total = self.clock.total();
        info!(settlement = %self.settlement.name, ticks = total, "run started");
        let mut results = Vec::with_capacity(total);
        for t in 0..total {
            results.push(self.step(t));
        }
        info!(
            settlement = %self.settlement.name,
            sufficient = self.settlement.grid().sufficient_power(),
            "run finished"
        );
        results
    }

    pub fn settlement(&self) -> &Settlement {
        &self.settlement
    }

    pub fn settlement_mut(&mut self) -> &mut Settlement {
        &mut self.settlement
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::building::{Building, BuildingId, PowerMode};
    use crate::environment::{Environment, FixedEnvironment};
    use crate::grid::PowerGrid;
    use crate::grid::controller::DEFAULT_DEGRADATION_RATE_PER_SOL;
    use crate::grid::event::GridEvent;
    use crate::inventory::Inventory;
    use crate::storage::Apportionment;

    fn night_engine(ticks: usize) -> Engine<FixedEnvironment> {
        let grid = PowerGrid::new(DEFAULT_DEGRADATION_RATE_PER_SOL, Apportionment::Proportional, 3);
        let mut s = Settlement::new("Outpost", grid, Inventory::new());
        s.add_building(Building::new(BuildingId(1), "hab", 10.0, 2.0, true));
        s.add_building(Building::new(BuildingId(2), "lab", 6.0, 1.0, false));
        let clock = Clock::new(ticks, 10.0, 1, 0.0);
        Engine::new(clock, s, FixedEnvironment(Environment::night()))
    }

    #[test]
    fn step_moves_events_onto_report() {
        let mut engine = night_engine(3);
        let first = engine.step(0);
        assert!(
            first
                .events
                .iter()
                .any(|e| matches!(e, GridEvent::RequiredPower { .. }))
        );

        let second = engine.step(1);
        assert!(second.events.iter().any(|e| matches!(
            e,
            GridEvent::BuildingPowerMode {
                building: BuildingId(2),
                to: PowerMode::Low,
                ..
            }
        )));
        assert!(engine.settlement_mut().grid_mut().drain_events().is_empty());
    }

    #[test]
    fn long_runs_leave_no_backlog() {
        let mut engine = night_engine(500);
        let results = engine.run();
        assert_eq!(results.len(), 500);
        assert!(engine.settlement_mut().grid_mut().drain_events().is_empty());
    }
}
