//! Settlement-wide bulk resource stock.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Bulk resources drawn by the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceId {
    Methane,
    Methanol,
    Oxygen,
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Methane => "methane",
            Self::Methanol => "methanol",
            Self::Oxygen => "oxygen",
        };
        f.write_str(name)
    }
}

/// Interface to the settlement's bulk resource store.
///
/// Amounts are kilograms. `retrieve` never over-draws: callers check
/// `amount_stored` first and the store refuses a request it cannot cover.
pub trait ResourceStore {
    /// Returns the amount currently held for `resource`.
    fn amount_stored(&self, resource: ResourceId) -> f64;

    /// Removes `amount` of `resource`.
    ///
    /// # Returns
    ///
    /// The amount actually removed: `amount`, or `0.0` if the stock was short.
    fn retrieve(&mut self, resource: ResourceId, amount: f64) -> f64;

    /// Adds `amount` of `resource`.
    fn store(&mut self, resource: ResourceId, amount: f64);
}

/// In-memory resource store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Inventory {
    amounts: HashMap<ResourceId, f64>,
}

impl Inventory {
    /// Creates an empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper that seeds a resource amount.
    pub fn with(mut self, resource: ResourceId, amount: f64) -> Self {
        self.store(resource, amount);
        self
    }
}

impl ResourceStore for Inventory {
    fn amount_stored(&self, resource: ResourceId) -> f64 {
        self.amounts.get(&resource).copied().unwrap_or(0.0)
    }

    fn retrieve(&mut self, resource: ResourceId, amount: f64) -> f64 {
        if amount.is_nan() || amount <= 0.0 {
            return 0.0;
        }
        let held = self.amount_stored(resource);
        if held + f64::EPSILON < amount {
            return 0.0;
        }
        self.amounts.insert(resource, (held - amount).max(0.0));
        amount
    }

    fn store(&mut self, resource: ResourceId, amount: f64) {
        if amount > 0.0 {
            *self.amounts.entry(resource).or_insert(0.0) += amount;
        }
    }
}
