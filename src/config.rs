//! TOML-based scenario configuration and preset definitions.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::building::{BuildingCategory, PowerMode};
use crate::grid::controller::DEFAULT_DEGRADATION_RATE_PER_SOL;
use crate::inventory::ResourceId;
use crate::sources::{PowerSourceType, SitingInputs, SourceSpec};
use crate::storage::Apportionment;

/// Top-level scenario configuration parsed from TOML.
///
/// Every section has defaults; [`ScenarioConfig::baseline`] is the built-in
/// settlement used when no scenario is given. Load from TOML with
/// [`ScenarioConfig::from_toml_file`] or pick one of [`ScenarioConfig::PRESETS`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Settlement name, used in logs and the API.
    #[serde(default = "default_settlement_name")]
    pub name: String,
    /// Simulation timing and seed.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Grid controller parameters.
    #[serde(default)]
    pub grid: GridConfig,
    /// Surface environment model.
    #[serde(default)]
    pub environment: EnvironmentConfig,
    /// Initial settlement bulk stock.
    #[serde(default)]
    pub inventory: InventoryConfig,
    /// Inputs for siting estimates.
    #[serde(default)]
    pub siting: SitingInputs,
    /// Static building type catalogue, keyed by type name.
    #[serde(default)]
    pub building_types: BTreeMap<String, BuildingTypeConfig>,
    /// Buildings present at the start of the run.
    #[serde(default)]
    pub buildings: Vec<BuildingConfig>,
}

fn default_settlement_name() -> String {
    "Settlement".to_string()
}

/// Simulation timing and global parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Number of ticks to run (must be > 0).
    pub ticks: usize,
    /// Tick length in millisols (must be > 0).
    pub millisols_per_tick: f64,
    /// Mission sol of the first tick.
    pub start_sol: u32,
    /// Millisol of the sol at which the run starts, in `[0, 1000)`.
    pub start_millisol: f64,
    /// Master random seed.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ticks: 200,
            millisols_per_tick: 10.0,
            start_sol: 1,
            start_millisol: 0.0,
            seed: 42,
        }
    }
}

/// Grid controller parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Fractional efficiency loss per sol (>= 0).
    pub degradation_rate_per_sol: f64,
    /// Storage apportionment: `"proportional"` or `"randomized"`.
    pub apportionment: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            degradation_rate_per_sol: DEFAULT_DEGRADATION_RATE_PER_SOL,
            apportionment: "proportional".to_string(),
        }
    }
}

/// Surface environment model parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvironmentConfig {
    /// Clear-sky noon irradiance (W/m²).
    pub reference_irradiance: f64,
    /// AR(1) persistence of dust opacity (0.0-1.0).
    pub dust_alpha: f64,
    /// Innovation noise of dust opacity.
    pub dust_noise_std: f64,
    /// Long-run mean wind speed (m/s).
    pub mean_wind_speed: f64,
    /// Wind speed at which turbines reach rated output (m/s).
    pub reference_wind_speed: f64,
    /// AR(1) persistence of wind (0.0-1.0).
    pub wind_alpha: f64,
    /// Innovation noise of wind.
    pub wind_noise_std: f64,
    /// Areothermal heat fraction available at the site (0.0-1.0).
    pub areothermal_heat: f64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            reference_irradiance: 590.0,
            dust_alpha: 0.95,
            dust_noise_std: 0.1,
            mean_wind_speed: 6.0,
            reference_wind_speed: 15.0,
            wind_alpha: 0.9,
            wind_noise_std: 0.2,
            areothermal_heat: 0.5,
        }
    }
}

/// Initial settlement bulk stock (kg).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InventoryConfig {
    pub methane_kg: f64,
    pub methanol_kg: f64,
    pub oxygen_kg: f64,
}

/// Static description of one building type.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildingTypeConfig {
    /// Demand at full power (kW).
    pub full_power_kw: f64,
    /// Demand at low power (kW).
    pub low_power_kw: f64,
    /// Whether the building houses life support.
    pub life_support: bool,
    pub category: BuildingCategory,
    /// Installed power sources.
    pub sources: Vec<SourceSpec>,
    /// Installed battery bank, if any.
    pub storage: Option<StorageConfig>,
}

impl Default for BuildingTypeConfig {
    fn default() -> Self {
        Self {
            full_power_kw: 1.0,
            low_power_kw: 0.5,
            life_support: false,
            category: BuildingCategory::Other,
            sources: Vec::new(),
            storage: None,
        }
    }
}

/// Battery bank parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Number of battery modules (must be > 0).
    pub modules: u32,
    /// Energy per module (kWh).
    pub kwh_per_module: f64,
    /// Initial state of charge (0.0-1.0).
    pub initial_soc: f64,
    /// Terminal voltage (V).
    pub terminal_voltage: f64,
    /// Internal resistance (ohm).
    pub internal_resistance: f64,
    /// Maximum C-rating.
    pub max_c_rating: f64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            modules: 1,
            kwh_per_module: 10.0,
            initial_soc: 0.5,
            terminal_voltage: 600.0,
            internal_resistance: 0.1,
            max_c_rating: 2.0,
        }
    }
}

impl StorageConfig {
    /// Total bank capacity (kWh).
    pub fn capacity_kwh(&self) -> f64 {
        f64::from(self.modules) * self.kwh_per_module
    }
}

/// One building placed at the start of the run.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildingConfig {
    /// Display name; defaults to the type name.
    #[serde(default)]
    pub name: Option<String>,
    /// Key into `building_types`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Initial power mode.
    #[serde(default)]
    pub power_mode: PowerMode,
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.ticks"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

const BASELINE_TOML: &str = include_str!("../scenarios/baseline.toml");
const FUEL_BACKUP_TOML: &str = include_str!("../scenarios/fuel_backup.toml");
const BROWNOUT_TOML: &str = include_str!("../scenarios/brownout.toml");

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self::baseline()
    }
}

impl ScenarioConfig {
    /// Returns the baseline settlement: two habitats, a greenhouse, a
    /// workshop, a solar array, a fission plant and a battery bank.
    pub fn baseline() -> Self {
        let mut building_types = BTreeMap::new();
        building_types.insert(
            "habitat".to_string(),
            BuildingTypeConfig {
                full_power_kw: 12.0,
                low_power_kw: 4.0,
                life_support: true,
                category: BuildingCategory::Habitat,
                ..BuildingTypeConfig::default()
            },
        );
        building_types.insert(
            "greenhouse".to_string(),
            BuildingTypeConfig {
                full_power_kw: 8.0,
                low_power_kw: 3.0,
                life_support: false,
                category: BuildingCategory::Farming,
                ..BuildingTypeConfig::default()
            },
        );
        building_types.insert(
            "workshop".to_string(),
            BuildingTypeConfig {
                full_power_kw: 6.0,
                low_power_kw: 1.0,
                life_support: false,
                category: BuildingCategory::Workshop,
                ..BuildingTypeConfig::default()
            },
        );
        building_types.insert(
            "solar_array".to_string(),
            BuildingTypeConfig {
                full_power_kw: 0.5,
                low_power_kw: 0.2,
                life_support: false,
                category: BuildingCategory::Power,
                sources: vec![SourceSpec {
                    kind: "solar".to_string(),
                    max_power_kw: 30.0,
                    ..SourceSpec::default()
                }],
                storage: None,
            },
        );
        building_types.insert(
            "fission_plant".to_string(),
            BuildingTypeConfig {
                full_power_kw: 1.0,
                low_power_kw: 0.5,
                life_support: false,
                category: BuildingCategory::Power,
                sources: vec![SourceSpec {
                    kind: "fission".to_string(),
                    max_power_kw: 40.0,
                    conversion_efficiency: 0.9,
                    ..SourceSpec::default()
                }],
                storage: None,
            },
        );
        building_types.insert(
            "battery_bank".to_string(),
            BuildingTypeConfig {
                full_power_kw: 0.2,
                low_power_kw: 0.1,
                life_support: false,
                category: BuildingCategory::Storage,
                sources: Vec::new(),
                storage: Some(StorageConfig {
                    modules: 4,
                    ..StorageConfig::default()
                }),
            },
        );

        let building = |name: &str, kind: &str| BuildingConfig {
            name: Some(name.to_string()),
            kind: kind.to_string(),
            power_mode: PowerMode::Full,
        };

        Self {
            name: "Baseline".to_string(),
            simulation: SimulationConfig::default(),
            grid: GridConfig::default(),
            environment: EnvironmentConfig::default(),
            inventory: InventoryConfig::default(),
            siting: SitingInputs::default(),
            building_types,
            buildings: vec![
                building("Habitat A", "habitat"),
                building("Habitat B", "habitat"),
                building("Greenhouse", "greenhouse"),
                building("Workshop", "workshop"),
                building("Solar Array", "solar_array"),
                building("Fission Plant", "fission_plant"),
                building("Battery Bank", "battery_bank"),
            ],
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "fuel_backup", "brownout"];

    /// Loads a scenario from a named preset.
    ///
    /// Presets are the TOML files under `scenarios/`, embedded at build time.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        let source = match name {
            "baseline" => BASELINE_TOML,
            "fuel_backup" => FUEL_BACKUP_TOML,
            "brownout" => BROWNOUT_TOML,
            _ => {
                return Err(ConfigError::new(
                    "preset",
                    format!(
                        "unknown preset \"{name}\", available: {}",
                        Self::PRESETS.join(", ")
                    ),
                ));
            }
        };
        Self::from_toml_str(source)
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let s = &self.simulation;
        if s.ticks == 0 {
            errors.push(ConfigError::new("simulation.ticks", "must be > 0"));
        }
        if !positive(s.millisols_per_tick) {
            errors.push(ConfigError::new("simulation.millisols_per_tick", "must be > 0"));
        }
        if !(0.0..1000.0).contains(&s.start_millisol) {
            errors.push(ConfigError::new(
                "simulation.start_millisol",
                "must be in [0, 1000)",
            ));
        }

        let g = &self.grid;
        if !non_negative(g.degradation_rate_per_sol) {
            errors.push(ConfigError::new("grid.degradation_rate_per_sol", "must be >= 0"));
        }
        if g.apportionment.parse::<Apportionment>().is_err() {
            errors.push(ConfigError::new(
                "grid.apportionment",
                format!(
                    "must be \"proportional\" or \"randomized\", got \"{}\"",
                    g.apportionment
                ),
            ));
        }

        let e = &self.environment;
        if !positive(e.reference_irradiance) {
            errors.push(ConfigError::new("environment.reference_irradiance", "must be > 0"));
        }
        if !positive(e.reference_wind_speed) {
            errors.push(ConfigError::new("environment.reference_wind_speed", "must be > 0"));
        }
        if !non_negative(e.mean_wind_speed) {
            errors.push(ConfigError::new("environment.mean_wind_speed", "must be >= 0"));
        }
        for (field, value) in [
            ("environment.dust_alpha", e.dust_alpha),
            ("environment.wind_alpha", e.wind_alpha),
            ("environment.areothermal_heat", e.areothermal_heat),
        ] {
            if !(0.0..=1.0).contains(&value) {
                errors.push(ConfigError::new(field, "must be in [0.0, 1.0]"));
            }
        }
        for (field, value) in [
            ("environment.dust_noise_std", e.dust_noise_std),
            ("environment.wind_noise_std", e.wind_noise_std),
        ] {
            if !non_negative(value) {
                errors.push(ConfigError::new(field, "must be >= 0"));
            }
        }

        let inv = &self.inventory;
        for (field, value) in [
            ("inventory.methane_kg", inv.methane_kg),
            ("inventory.methanol_kg", inv.methanol_kg),
            ("inventory.oxygen_kg", inv.oxygen_kg),
        ] {
            if !non_negative(value) {
                errors.push(ConfigError::new(field, "must be >= 0"));
            }
        }

        let siting = &self.siting;
        if !non_negative(siting.fuel_value_per_kg) {
            errors.push(ConfigError::new("siting.fuel_value_per_kg", "must be >= 0"));
        }
        for (field, value) in [
            ("siting.mean_irradiance_ratio", siting.mean_irradiance_ratio),
            ("siting.mean_wind_ratio", siting.mean_wind_ratio),
            ("siting.areothermal_potential", siting.areothermal_potential),
        ] {
            if !(0.0..=1.0).contains(&value) {
                errors.push(ConfigError::new(field, "must be in [0.0, 1.0]"));
            }
        }

        for (name, bt) in &self.building_types {
            validate_building_type(name, bt, &mut errors);
        }

        for (i, b) in self.buildings.iter().enumerate() {
            if !self.building_types.contains_key(&b.kind) {
                errors.push(ConfigError::new(
                    format!("buildings[{i}].type"),
                    format!("unknown building type \"{}\"", b.kind),
                ));
            }
        }

        errors
    }
}

/// Finite and `>= 0`.
fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Finite and `> 0`.
fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn validate_building_type(name: &str, bt: &BuildingTypeConfig, errors: &mut Vec<ConfigError>) {
    let prefix = format!("building_types.{name}");
    let full_ok = non_negative(bt.full_power_kw);
    let low_ok = non_negative(bt.low_power_kw);
    if !full_ok {
        errors.push(ConfigError::new(format!("{prefix}.full_power_kw"), "must be >= 0"));
    }
    if !low_ok {
        errors.push(ConfigError::new(format!("{prefix}.low_power_kw"), "must be >= 0"));
    }
    if full_ok && low_ok && bt.low_power_kw > bt.full_power_kw {
        errors.push(ConfigError::new(
            format!("{prefix}.low_power_kw"),
            format!("must be <= {prefix}.full_power_kw"),
        ));
    }

    for (i, src) in bt.sources.iter().enumerate() {
        let field = format!("{prefix}.sources[{i}]");
        let kind = match src.kind.parse::<PowerSourceType>() {
            Ok(kind) => kind,
            Err(e) => {
                errors.push(ConfigError::new(format!("{field}.type"), e.to_string()));
                continue;
            }
        };
        if !non_negative(src.max_power_kw) {
            errors.push(ConfigError::new(format!("{field}.max_power_kw"), "must be >= 0"));
        }
        if !(src.conversion_efficiency > 0.0 && src.conversion_efficiency <= 1.0) {
            errors.push(ConfigError::new(
                format!("{field}.conversion_efficiency"),
                "must be in (0.0, 1.0]",
            ));
        }
        if src
            .load_percent
            .is_some_and(|pct| !(0.0..=100.0).contains(&pct))
        {
            errors.push(ConfigError::new(
                format!("{field}.load_percent"),
                "must be in [0, 100]",
            ));
        }
        if kind == PowerSourceType::Fuel {
            if src.fuel == ResourceId::Oxygen {
                errors.push(ConfigError::new(
                    format!("{field}.fuel"),
                    "must be \"methane\" or \"methanol\"",
                ));
            }
            if !non_negative(src.tank_ratio) {
                errors.push(ConfigError::new(format!("{field}.tank_ratio"), "must be >= 0"));
            }
        }
    }

    if let Some(st) = &bt.storage {
        let field = format!("{prefix}.storage");
        if st.modules == 0 {
            errors.push(ConfigError::new(format!("{field}.modules"), "must be > 0"));
        }
        if !positive(st.kwh_per_module) {
            errors.push(ConfigError::new(format!("{field}.kwh_per_module"), "must be > 0"));
        }
        if !(0.0..=1.0).contains(&st.initial_soc) {
            errors.push(ConfigError::new(
                format!("{field}.initial_soc"),
                "must be in [0.0, 1.0]",
            ));
        }
        if !positive(st.terminal_voltage) {
            errors.push(ConfigError::new(format!("{field}.terminal_voltage"), "must be > 0"));
        }
        if !non_negative(st.internal_resistance) {
            errors.push(ConfigError::new(
                format!("{field}.internal_resistance"),
                "must be >= 0",
            ));
        }
        if !positive(st.max_c_rating) {
            errors.push(ConfigError::new(format!("{field}.max_c_rating"), "must be > 0"));
        }
    }
}
