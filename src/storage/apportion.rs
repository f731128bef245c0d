//! Splitting one grid-level charge or discharge across several energy stores.

use std::fmt;
use std::str::FromStr;

use rand::{Rng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use super::battery::EnergyStore;

/// Headroom below which a store is not offered excess, as a fraction of capacity.
const CHARGE_SKIP_FRACTION: f64 = 0.01;

/// How a grid-level energy flow is shared between stores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Apportionment {
    /// Each store's share is weighted by its headroom (charging) or charge
    /// (discharging). Deterministic.
    #[default]
    Proportional,
    /// Each store is offered a random amount in `[share, 2 × share]`, where
    /// `share` is an even split. Staggers charge curves across banks.
    Randomized,
}

impl fmt::Display for Apportionment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proportional => f.write_str("proportional"),
            Self::Randomized => f.write_str("randomized"),
        }
    }
}

impl FromStr for Apportionment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "proportional" => Ok(Self::Proportional),
            "randomized" => Ok(Self::Randomized),
            other => Err(format!(
                "must be \"proportional\" or \"randomized\", got \"{other}\""
            )),
        }
    }
}

/// Offers `energy` kWh of excess to the stores and commits what they accept.
///
/// # Returns
///
/// Total energy stored (kWh), never more than `energy`.
pub fn charge(
    stores: &mut [&mut EnergyStore],
    energy: f64,
    hours: f64,
    mode: Apportionment,
    rng: &mut StdRng,
) -> f64 {
    if energy.is_nan() || energy <= 0.0 {
        return 0.0;
    }
    let eligible: Vec<usize> = stores
        .iter()
        .enumerate()
        .filter(|(_, s)| s.headroom() > s.capacity() * CHARGE_SKIP_FRACTION)
        .map(|(i, _)| i)
        .collect();
    if eligible.is_empty() {
        return 0.0;
    }

    let total_headroom: f64 = eligible.iter().map(|&i| stores[i].headroom()).sum();
    let even_share = energy / eligible.len() as f64;
    let mut remaining = energy;
    for &i in &eligible {
        let store = &mut *stores[i];
        let offer = match mode {
            Apportionment::Proportional => energy * store.headroom() / total_headroom,
            Apportionment::Randomized => rng.random_range(even_share..=2.0 * even_share),
        }
        .min(remaining);
        let accepted = store.compute_storable_energy(offer, hours);
        store.recondition_battery(store.stored_energy() + accepted);
        remaining -= accepted;
        if remaining <= 0.0 {
            break;
        }
    }
    energy - remaining.max(0.0)
}

/// Draws up to `energy` kWh from the stores and commits the withdrawal.
///
/// # Returns
///
/// Total energy retrieved (kWh), never more than `energy`.
pub fn discharge(
    stores: &mut [&mut EnergyStore],
    energy: f64,
    hours: f64,
    mode: Apportionment,
    rng: &mut StdRng,
) -> f64 {
    if energy.is_nan() || energy <= 0.0 {
        return 0.0;
    }
    let eligible: Vec<usize> = stores
        .iter()
        .enumerate()
        .filter(|(_, s)| s.stored_energy() > 0.0)
        .map(|(i, _)| i)
        .collect();
    if eligible.is_empty() {
        return 0.0;
    }

    let total_stored: f64 = eligible.iter().map(|&i| stores[i].stored_energy()).sum();
    let even_share = energy / eligible.len() as f64;
    let mut remaining = energy;
    for &i in &eligible {
        let store = &mut *stores[i];
        let request = match mode {
            Apportionment::Proportional => energy * store.stored_energy() / total_stored,
            Apportionment::Randomized => rng.random_range(even_share..=2.0 * even_share),
        }
        .min(remaining);
        let released = store.compute_available_energy(request, hours);
        store.recondition_battery(store.stored_energy() - released);
        remaining -= released;
        if remaining <= 0.0 {
            break;
        }
    }
    energy - remaining.max(0.0)
}
