//! Mission clock that converts tick counts into Martian time.

use serde::Serialize;

/// Number of Earth hours in one millisol.
///
/// One sol is 1000 millisols, roughly 24.66 hours.
pub const HOURS_PER_MILLISOL: f64 = 0.024_659_79;

/// Number of millisols in one sol.
pub const MILLISOLS_PER_SOL: f64 = 1000.0;

/// Timing information delivered to the grid once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClockPulse {
    /// Tick index, starting at 0.
    pub tick: usize,
    /// Millisols elapsed since the previous pulse.
    pub elapsed: f64,
    /// Mission sol the pulse falls in, starting at 1.
    pub mission_sol: u32,
    /// Millisol of day at the end of the pulse, in `[0, 1000)`.
    pub millisol: f64,
}

impl ClockPulse {
    /// Tick duration in hours.
    pub fn hours(&self) -> f64 {
        self.elapsed * HOURS_PER_MILLISOL
    }
}

/// A mission clock that advances a fixed number of millisols per tick.
///
/// # Examples
///
/// ```
/// use settlement_grid::grid::clock::Clock;
///
/// let mut clock = Clock::new(3, 100.0, 1, 0.0);
/// let mut ticks = Vec::new();
///
/// clock.run(|pulse| ticks.push(pulse.tick));
/// assert_eq!(ticks, vec![0, 1, 2]);
/// ```
#[derive(Debug, Clone)]
pub struct Clock {
    /// Current tick of the run
    current: usize,
    /// Total ticks to run
    total: usize,
    /// Millisols per tick
    millisols_per_tick: f64,
    /// Sol at tick 0
    start_sol: u32,
    /// Millisol of day at tick 0
    start_millisol: f64,
}

impl Clock {
    /// Creates a new clock.
    ///
    /// # Arguments
    ///
    /// * `total` - The total number of ticks the clock will run
    /// * `millisols_per_tick` - Tick length in millisols (must be > 0)
    /// * `start_sol` - Mission sol at the start of the run
    /// * `start_millisol` - Millisol of day at the start of the run, in `[0, 1000)`
    ///
    /// # Panics
    ///
    /// Panics if `millisols_per_tick` is not positive or `start_millisol` is out of range.
    pub fn new(total: usize, millisols_per_tick: f64, start_sol: u32, start_millisol: f64) -> Self {
        assert!(millisols_per_tick > 0.0, "millisols_per_tick must be > 0");
        assert!(
            (0.0..MILLISOLS_PER_SOL).contains(&start_millisol),
            "start_millisol must be in [0, 1000)"
        );
        Self {
            current: 0,
            total,
            millisols_per_tick,
            start_sol,
            start_millisol,
        }
    }

    /// Builds the pulse for a given tick without advancing the clock.
    pub fn pulse_at(&self, tick: usize) -> ClockPulse {
        let since_start = self.start_millisol + (tick + 1) as f64 * self.millisols_per_tick;
        let whole_sols = (since_start / MILLISOLS_PER_SOL).floor();
        ClockPulse {
            tick,
            elapsed: self.millisols_per_tick,
            mission_sol: self.start_sol + whole_sols as u32,
            millisol: since_start - whole_sols * MILLISOLS_PER_SOL,
        }
    }

    /// Advances the clock by one tick.
    ///
    /// # Returns
    ///
    /// * `Some(pulse)` - The pulse for the tick just completed
    /// * `None` - If the clock has reached its total ticks
    pub fn tick(&mut self) -> Option<ClockPulse> {
        if self.current < self.total {
            let pulse = self.pulse_at(self.current);
            self.current += 1;
            Some(pulse)
        } else {
            None
        }
    }

    /// Runs a function for each remaining tick.
    pub fn run(&mut self, mut f: impl FnMut(ClockPulse)) {
        while let Some(pulse) = self.tick() {
            f(pulse);
        }
    }

    /// Total number of ticks this clock produces.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Tick length in millisols.
    pub fn millisols_per_tick(&self) -> f64 {
        self.millisols_per_tick
    }
}
