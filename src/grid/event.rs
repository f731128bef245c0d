//! Outbound change notifications raised by the grid.

use std::collections::VecDeque;

use serde::Serialize;

use crate::building::{BuildingId, PowerMode};

/// A change in grid or building state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GridEvent {
    GridPowerMode { mode: PowerMode },
    GeneratedPower { kw: f64 },
    RequiredPower { kw: f64 },
    StoredEnergy { kwh: f64 },
    StoredEnergyCapacity { kwh: f64 },
    PowerValue { value: f64 },
    BuildingPowerMode {
        building: BuildingId,
        from: PowerMode,
        to: PowerMode,
    },
    FuelGeneratorToggle { building: BuildingId, on: bool },
    FuelGeneratorLoad { building: BuildingId, percent: f64 },
    ReactorLoad { building: BuildingId, percent: f64 },
}

/// FIFO of events waiting for a consumer.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: VecDeque<GridEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: GridEvent) {
        self.events.push_back(event);
    }

    /// Removes and returns every queued event, oldest first.
    pub fn drain(&mut self) -> Vec<GridEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_returns_in_order_and_empties() {
        let mut q = EventQueue::new();
        q.push(GridEvent::GeneratedPower { kw: 1.0 });
        q.push(GridEvent::RequiredPower { kw: 2.0 });
        assert_eq!(q.len(), 2);
        let events = q.drain();
        assert_eq!(
            events,
            vec![
                GridEvent::GeneratedPower { kw: 1.0 },
                GridEvent::RequiredPower { kw: 2.0 }
            ]
        );
        assert!(q.is_empty());
    }
}
