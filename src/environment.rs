//! Environmental inputs for weather-dependent power sources.

use std::f64::consts::PI;

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Serialize;

use crate::grid::clock::ClockPulse;

/// Environmental sample taken once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Environment {
    /// Current surface irradiance (W/m²).
    pub irradiance: f64,
    /// Irradiance at which solar sources deliver rated power (W/m²).
    pub reference_irradiance: f64,
    /// Current wind speed (m/s).
    pub wind_speed: f64,
    /// Wind speed at which wind turbines deliver rated power (m/s).
    pub reference_wind_speed: f64,
    /// Fraction of rated areothermal heat available, in `[0, 1]`.
    pub areothermal_heat: f64,
}

impl Environment {
    /// Irradiance relative to the reference, clamped to `[0, 1]`.
    pub fn irradiance_ratio(&self) -> f64 {
        ratio(self.irradiance, self.reference_irradiance)
    }

    /// Wind speed relative to the reference, clamped to `[0, 1]`.
    pub fn wind_ratio(&self) -> f64 {
        ratio(self.wind_speed, self.reference_wind_speed)
    }

    /// A dark, still environment.
    pub fn night() -> Self {
        Self {
            irradiance: 0.0,
            reference_irradiance: 590.0,
            wind_speed: 0.0,
            reference_wind_speed: 15.0,
            areothermal_heat: 0.0,
        }
    }

    /// Every input at its reference level.
    pub fn reference() -> Self {
        Self {
            irradiance: 590.0,
            reference_irradiance: 590.0,
            wind_speed: 15.0,
            reference_wind_speed: 15.0,
            areothermal_heat: 1.0,
        }
    }
}

fn ratio(value: f64, reference: f64) -> f64 {
    if reference <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    (value / reference).clamp(0.0, 1.0)
}

/// Source of per-tick environment samples.
///
/// The grid treats a sample as a pure read; samplers may hold state
/// (weather persistence) between ticks.
pub trait EnvironmentSampler {
    /// Returns the environment for the given tick.
    fn sample(&mut self, pulse: &ClockPulse) -> Environment;
}

/// Constant environment, used for what-if runs and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedEnvironment(pub Environment);

impl EnvironmentSampler for FixedEnvironment {
    fn sample(&mut self, _pulse: &ClockPulse) -> Environment {
        self.0
    }
}

/// Millisol of day when the sun rises.
pub const SUNRISE_MILLISOL: f64 = 250.0;
/// Millisol of day when the sun sets.
pub const SUNSET_MILLISOL: f64 = 750.0;

/// Dust multiplier bounds (heavy storm to clear sky).
const DUST_MIN: f64 = 0.05;
const DUST_MAX: f64 = 1.0;
/// Wind multiplier bounds.
const WIND_MIN: f64 = 0.0;
const WIND_MAX: f64 = 2.5;

/// Parameters for [`MarsEnvironment`].
#[derive(Debug, Clone)]
pub struct MarsEnvironmentParams {
    pub reference_irradiance: f64,
    pub dust_alpha: f64,
    pub dust_noise_std: f64,
    pub mean_wind_speed: f64,
    pub reference_wind_speed: f64,
    pub wind_alpha: f64,
    pub wind_noise_std: f64,
    pub areothermal_heat: f64,
}

/// Stochastic surface environment for one settlement.
///
/// Daylight follows a half-cosine between [`SUNRISE_MILLISOL`] and
/// [`SUNSET_MILLISOL`]. Dust opacity and wind each evolve as an AR(1)
/// multiplier that reverts to 1:
///
/// ```text
/// m(t) = alpha * m(t-1) + (1 - alpha) * (1 + epsilon(t))
/// ```
#[derive(Debug, Clone)]
pub struct MarsEnvironment {
    params: MarsEnvironmentParams,
    dust: f64,
    wind: f64,
    rng: StdRng,
}

impl MarsEnvironment {
    /// Creates a new environment model.
    ///
    /// # Arguments
    ///
    /// * `params` - Reference levels and AR(1) coefficients
    /// * `seed` - Random seed for reproducible weather
    pub fn new(params: MarsEnvironmentParams, seed: u64) -> Self {
        let params = MarsEnvironmentParams {
            dust_alpha: params.dust_alpha.clamp(0.0, 1.0),
            wind_alpha: params.wind_alpha.clamp(0.0, 1.0),
            dust_noise_std: params.dust_noise_std.max(0.0),
            wind_noise_std: params.wind_noise_std.max(0.0),
            areothermal_heat: params.areothermal_heat.clamp(0.0, 1.0),
            ..params
        };
        Self {
            params,
            dust: 1.0,
            wind: 1.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn advance(rng: &mut StdRng, state: f64, alpha: f64, std: f64, lo: f64, hi: f64) -> f64 {
        let epsilon = gaussian_noise(rng, std);
        (alpha * state + (1.0 - alpha) * (1.0 + epsilon)).clamp(lo, hi)
    }
}

impl EnvironmentSampler for MarsEnvironment {
    fn sample(&mut self, pulse: &ClockPulse) -> Environment {
        let p = &self.params;
        self.dust = Self::advance(
            &mut self.rng,
            self.dust,
            p.dust_alpha,
            p.dust_noise_std,
            DUST_MIN,
            DUST_MAX,
        );
        self.wind = Self::advance(
            &mut self.rng,
            self.wind,
            p.wind_alpha,
            p.wind_noise_std,
            WIND_MIN,
            WIND_MAX,
        );
        Environment {
            irradiance: p.reference_irradiance * daylight_frac(pulse.millisol) * self.dust,
            reference_irradiance: p.reference_irradiance,
            wind_speed: p.mean_wind_speed * self.wind,
            reference_wind_speed: p.reference_wind_speed,
            areothermal_heat: p.areothermal_heat,
        }
    }
}

/// Fraction of peak daylight at the given millisol of day.
pub fn daylight_frac(millisol: f64) -> f64 {
    if !(SUNRISE_MILLISOL..SUNSET_MILLISOL).contains(&millisol) {
        return 0.0;
    }
    let x = (millisol - SUNRISE_MILLISOL) / (SUNSET_MILLISOL - SUNRISE_MILLISOL);
    (PI * x).sin().max(0.0)
}

/// Gaussian noise via the Box-Muller transform.
///
/// # Returns
///
/// Random value from a Gaussian distribution with mean 0 and the given standard deviation.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
    z0 * std_dev
}
