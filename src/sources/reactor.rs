use serde::Serialize;

use super::types::AdjustableLoad;

/// Reactor technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactorKind {
    Fission,
    Thermionic,
}

impl ReactorKind {
    fn maintenance_factor(self) -> f64 {
        match self {
            Self::Fission => 2.0,
            Self::Thermionic => 1.5,
        }
    }
}

/// Lowest load a reactor can be throttled to, in percent.
pub const REACTOR_MIN_LOAD: f64 = 10.0;
/// Size of one reactor throttle notch, in percent.
pub const REACTOR_LOAD_STEP: f64 = 5.0;

/// A throttleable nuclear source.
///
/// Output is `max_power × load/100 × conversion_efficiency` and does not
/// depend on the environment.
#[derive(Debug, Clone, Serialize)]
pub struct Reactor {
    pub kind: ReactorKind,
    /// Rated thermal-to-electric output (kW).
    pub max_power: f64,
    /// Conversion efficiency (0..1].
    pub conversion_efficiency: f64,
    /// Current load percent in `[REACTOR_MIN_LOAD, 100]`.
    load_capacity: f64,
}

impl Reactor {
    /// Creates a new reactor.
    ///
    /// # Panics
    ///
    /// Panics if `max_power` is negative or efficiency is outside `(0, 1]`.
    pub fn new(kind: ReactorKind, max_power: f64, conversion_efficiency: f64, load: f64) -> Self {
        assert!(max_power >= 0.0);
        assert!(conversion_efficiency > 0.0 && conversion_efficiency <= 1.0);
        Self {
            kind,
            max_power,
            conversion_efficiency,
            load_capacity: load.clamp(REACTOR_MIN_LOAD, 100.0),
        }
    }

    /// Output at the given load percent, without changing the reactor.
    pub fn request_power(&self, percent: f64) -> f64 {
        self.max_power * percent.clamp(0.0, 100.0) / 100.0 * self.conversion_efficiency
    }

    pub fn current_power(&self) -> f64 {
        self.request_power(self.load_capacity)
    }

    /// Siting estimate: rated output after conversion losses.
    pub fn average_power(&self) -> f64 {
        self.max_power * self.conversion_efficiency
    }

    pub fn maintenance_time(&self) -> f64 {
        self.max_power * self.kind.maintenance_factor()
    }
}

impl AdjustableLoad for Reactor {
    fn load_capacity(&self) -> f64 {
        self.load_capacity
    }

    fn set_load_capacity(&mut self, percent: f64) {
        self.load_capacity = percent.clamp(REACTOR_MIN_LOAD, 100.0);
    }

    fn load_step(&self) -> f64 {
        REACTOR_LOAD_STEP
    }

    fn min_load(&self) -> f64 {
        REACTOR_MIN_LOAD
    }
}
