//! Buildings as seen by the grid: demand figures, power mode, and installed functions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sources::PowerGeneration;
use crate::storage::EnergyStore;

/// Identifier of a building within one settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BuildingId(pub u32);

impl fmt::Display for BuildingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{}", self.0)
    }
}

/// Power state of a building; determines its demand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerMode {
    #[default]
    Full,
    Low,
    None,
}

impl PowerMode {
    /// One step up: `None → Low → Full`.
    pub fn raised(self) -> Option<Self> {
        match self {
            Self::None => Some(Self::Low),
            Self::Low => Some(Self::Full),
            Self::Full => None,
        }
    }

    /// One step down: `Full → Low → None`.
    pub fn lowered(self) -> Option<Self> {
        match self {
            Self::Full => Some(Self::Low),
            Self::Low => Some(Self::None),
            Self::None => None,
        }
    }
}

impl fmt::Display for PowerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Full => "FULL",
            Self::Low => "LOW",
            Self::None => "NONE",
        };
        f.write_str(s)
    }
}

/// Broad role of a building.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingCategory {
    Habitat,
    Power,
    Storage,
    Workshop,
    Farming,
    #[default]
    Other,
}

/// A settlement building.
///
/// The grid reads demand, generation, and storage from it and is the only
/// writer of `power_mode`.
#[derive(Debug, Clone)]
pub struct Building {
    pub id: BuildingId,
    pub name: String,
    pub category: BuildingCategory,
    power_mode: PowerMode,
    /// Demand at full power (kW).
    pub full_power_required: f64,
    /// Demand at low power (kW).
    pub low_power_required: f64,
    /// Whether the building houses life support.
    pub life_support: bool,
    pub generation: Option<PowerGeneration>,
    pub storage: Option<EnergyStore>,
}

impl Building {
    /// Creates a building at full power with no generation or storage.
    ///
    /// # Panics
    ///
    /// Panics if either demand figure is negative or low power exceeds full power.
    pub fn new(
        id: BuildingId,
        name: impl Into<String>,
        full_power_required: f64,
        low_power_required: f64,
        life_support: bool,
    ) -> Self {
        assert!(full_power_required >= 0.0 && low_power_required >= 0.0);
        assert!(
            low_power_required <= full_power_required,
            "low power demand must not exceed full power demand"
        );
        Self {
            id,
            name: name.into(),
            category: BuildingCategory::default(),
            power_mode: PowerMode::Full,
            full_power_required,
            low_power_required,
            life_support,
            generation: None,
            storage: None,
        }
    }

    pub fn with_category(mut self, category: BuildingCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_generation(mut self, generation: PowerGeneration) -> Self {
        self.generation = Some(generation);
        self
    }

    pub fn with_storage(mut self, storage: EnergyStore) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn power_mode(&self) -> PowerMode {
        self.power_mode
    }

    /// Sets the power mode. Only the grid calls this during a tick.
    pub(crate) fn set_power_mode(&mut self, mode: PowerMode) {
        self.power_mode = mode;
    }

    /// Sets the initial power mode before the first tick.
    pub fn with_power_mode(mut self, mode: PowerMode) -> Self {
        self.power_mode = mode;
        self
    }

    /// Demand in the given mode (kW).
    pub fn power_required_in(&self, mode: PowerMode) -> f64 {
        match mode {
            PowerMode::Full => self.full_power_required,
            PowerMode::Low => self.low_power_required,
            PowerMode::None => 0.0,
        }
    }

    /// Demand in the current mode (kW).
    pub fn power_required(&self) -> f64 {
        self.power_required_in(self.power_mode)
    }

    /// Generated power cached for this tick (kW).
    pub fn generated_power(&self) -> f64 {
        self.generation
            .as_ref()
            .map_or(0.0, PowerGeneration::generated_power)
    }
}
