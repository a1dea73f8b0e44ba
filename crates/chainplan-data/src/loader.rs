//! Resolution pipeline: reads data files, sanitizes numbers, builds the
//! catalog and settings.
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and
//! deserialization helpers used by the higher-level loading pipeline.

use std::path::{Path, PathBuf};

use chainplan_core::catalog::{
    Catalog, CatalogBuilder, CatalogError, Item, Machine, Recipe, RecipeLine,
};
use chainplan_core::fixed::{checked_from_f64, Fixed64};
use chainplan_core::id::{ItemId, MachineId, RecipeId};
use chainplan_core::mining::{MAX_WORK_SPEED_PERCENT, MIN_WORK_SPEED_PERCENT};
use chainplan_core::settings::{
    BeltConfig, BoosterConfig, BoosterMultipliers, MiningSettings, RecipeChoice, Settings,
    SorterConfig,
};
use serde::de::DeserializeOwned;

use crate::schema::*;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// The definitions parsed but do not form a valid catalog.
    #[error("invalid catalog: {0}")]
    Catalog(#[from] CatalogError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a data file with the given base name (without extension).
///
/// Looks for `{base_name}.ron`, `{base_name}.toml`, and `{base_name}.json`.
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// multiple formats exist for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_str(&content, format, path)
}

fn deserialize_str<T: DeserializeOwned>(content: &str, format: Format, path: &Path) -> Result<T, DataLoadError> {
    let parse_error = |detail: String| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string())),
    }
}

// ===========================================================================
// Number sanitization
// ===========================================================================

/// Convert an untrusted number, falling back to `default` for NaN,
/// infinities, out-of-range or negative values.
fn non_negative(value: f64, field: &'static str, default: Fixed64) -> Fixed64 {
    match checked_from_f64(value) {
        Some(v) if v >= Fixed64::ZERO => v,
        _ => {
            tracing::warn!(field, value, fallback = %default, "rejected numeric config value");
            default
        }
    }
}

/// Like [`non_negative`], but zero is rejected too.
fn positive(value: f64, field: &'static str, default: Fixed64) -> Fixed64 {
    match checked_from_f64(value) {
        Some(v) if v > Fixed64::ZERO => v,
        _ => {
            tracing::warn!(field, value, fallback = %default, "rejected numeric config value");
            default
        }
    }
}

fn optional_non_negative(value: Option<f64>, field: &'static str, default: Fixed64) -> Fixed64 {
    value.map_or(default, |v| non_negative(v, field, default))
}

// ===========================================================================
// Catalog resolution
// ===========================================================================

/// Build a catalog from parsed definitions.
///
/// Bad numbers fall back with a warning. Structural problems (duplicate ids,
/// unknown item references, recipes without outputs) are errors.
pub fn catalog_from_data(data: CatalogData) -> Result<Catalog, CatalogError> {
    let mut builder = CatalogBuilder::new();

    for item in data.items {
        builder.add_item(Item {
            id: ItemId(item.id),
            name: item.name,
            raw_source: item.raw_source,
        });
    }

    for machine in data.machines {
        builder.add_machine(Machine {
            id: MachineId(machine.id),
            name: machine.name,
            production_type: machine.production_type,
            rank: machine.rank,
            speed: positive(machine.speed, "machine.speed", Fixed64::ONE),
            idle_energy_per_tick: non_negative(machine.idle_energy_per_tick, "machine.idle_energy_per_tick", Fixed64::ZERO),
            work_energy_per_tick: non_negative(machine.work_energy_per_tick, "machine.work_energy_per_tick", Fixed64::ZERO),
            exchange_energy_per_tick: non_negative(
                machine.exchange_energy_per_tick,
                "machine.exchange_energy_per_tick",
                Fixed64::ZERO,
            ),
            is_power_consumer: machine.is_power_consumer,
            is_power_exchanger: machine.is_power_exchanger,
        });
    }

    for recipe in data.recipes {
        builder.add_recipe(Recipe {
            id: RecipeId(recipe.id),
            name: recipe.name,
            production_type: recipe.production_type,
            // A rejected cycle time becomes zero, which the builder refuses.
            cycle_time: checked_from_f64(recipe.cycle_time).unwrap_or(Fixed64::ZERO),
            inputs: recipe.inputs.iter().map(recipe_line).collect(),
            outputs: recipe.outputs.iter().map(recipe_line).collect(),
            productive: recipe.productive,
        });
    }

    for sorter in data.sorters {
        builder.add_sorter(sorter.tier, ItemId(sorter.item));
    }

    let catalog = builder.build()?;
    tracing::debug!(
        items = catalog.item_count(),
        machines = catalog.machine_count(),
        recipes = catalog.recipe_count(),
        "catalog loaded"
    );
    Ok(catalog)
}

fn recipe_line(data: &RecipeLineData) -> RecipeLine {
    let (item, count, raw) = data.parts();
    RecipeLine {
        item: ItemId(item),
        count,
        raw,
    }
}

// ===========================================================================
// Settings resolution
// ===========================================================================

/// Build settings from a parsed profile. Never fails: every malformed value
/// falls back to its default with a warning.
pub fn settings_from_data(data: SettingsData) -> Settings {
    let mut settings = Settings::default();

    if let Some(booster) = data.booster {
        settings.booster = booster_config(&booster);
    }

    for entry in data.machine_ranks {
        if !entry.production_type.allows_rank(entry.rank) {
            tracing::warn!(
                production_type = ?entry.production_type,
                rank = ?entry.rank,
                "machine rank not available for production type, keeping Mk1"
            );
            continue;
        }
        settings.machine_ranks.insert(entry.production_type, entry.rank);
    }

    if let Some(belt) = data.belt {
        let mut config = BeltConfig::for_tier(belt.tier);
        config.speed = optional_non_negative(belt.speed, "belt.speed", config.speed);
        if let Some(stack_count) = belt.stack_count {
            config.stack_count = stack_count;
            config.stack_count = config.effective_stack_count();
        }
        settings.belt = config;
    }

    if let Some(sorter) = data.sorter {
        let mut config = SorterConfig::for_tier(sorter.tier);
        config.power_kw = optional_non_negative(sorter.power_kw, "sorter.power_kw", config.power_kw);
        settings.sorter = config;
    }

    for alternative in data.alternatives {
        let item = ItemId(alternative.item);
        let choice = match (alternative.mined, alternative.recipe) {
            (true, _) => RecipeChoice::Mined,
            (false, Some(recipe)) => RecipeChoice::Recipe(RecipeId(recipe)),
            (false, None) => {
                tracing::warn!(item = item.0, "alternative names neither a recipe nor mined, ignoring");
                continue;
            }
        };
        settings.alternatives.insert(item, choice);
    }

    if let Some(mining) = data.mining {
        settings.mining = mining_settings(&mining);
    }

    if let Some(multipliers) = data.booster_multipliers {
        settings.booster_multipliers = BoosterMultipliers {
            production: multipliers
                .production
                .map(|v| non_negative(v, "booster_multipliers.production", Fixed64::ONE)),
            speed: multipliers
                .speed
                .map(|v| non_negative(v, "booster_multipliers.speed", Fixed64::ONE)),
        };
    }

    if let Some(photon) = data.photon {
        settings.photon.use_graviton_lens = photon.use_graviton_lens;
        settings.photon.transmission_efficiency_level = photon.transmission_efficiency_level;
        if let Some(lens_booster) = photon.lens_booster {
            settings.photon.lens_booster = booster_config(&lens_booster);
        }
    }

    settings
}

fn booster_config(data: &BoosterData) -> BoosterConfig {
    let standard = BoosterConfig::for_tier(data.tier, data.mode);
    BoosterConfig {
        production_bonus: optional_non_negative(
            data.production_bonus,
            "booster.production_bonus",
            standard.production_bonus,
        ),
        speed_bonus: optional_non_negative(data.speed_bonus, "booster.speed_bonus", standard.speed_bonus),
        power_increase: optional_non_negative(
            data.power_increase,
            "booster.power_increase",
            standard.power_increase,
        ),
        ..standard
    }
}

fn mining_settings(data: &MiningData) -> MiningSettings {
    let defaults = MiningSettings::default();
    let work_speed_percent = match data.work_speed_percent {
        Some(percent) if (MIN_WORK_SPEED_PERCENT..=MAX_WORK_SPEED_PERCENT).contains(&percent) => percent,
        Some(percent) => {
            let clamped = percent.clamp(MIN_WORK_SPEED_PERCENT, MAX_WORK_SPEED_PERCENT);
            tracing::warn!(percent, clamped, "mining work speed out of range");
            clamped
        }
        None => defaults.work_speed_percent,
    };
    MiningSettings {
        speed_research_bonus: data
            .speed_research_bonus
            .map_or(defaults.speed_research_bonus, |v| {
                positive(v, "mining.speed_research_bonus", defaults.speed_research_bonus)
            }),
        miner: data.miner,
        work_speed_percent,
        extractors: defaults.extractors,
    }
}

// ===========================================================================
// Loading pipeline
// ===========================================================================

/// A catalog plus the settings profile shipped alongside it.
#[derive(Debug, Clone)]
pub struct CalculatorData {
    pub catalog: Catalog,
    pub settings: Settings,
}

/// Load and validate a catalog file.
pub fn load_catalog(path: &Path) -> Result<Catalog, DataLoadError> {
    let data: CatalogData = deserialize_file(path)?;
    Ok(catalog_from_data(data)?)
}

/// Load a settings profile file.
pub fn load_settings(path: &Path) -> Result<Settings, DataLoadError> {
    let data: SettingsData = deserialize_file(path)?;
    Ok(settings_from_data(data))
}

/// Load `catalog.*` (required) and `settings.*` (optional) from `dir`.
pub fn load_calculator_data(dir: &Path) -> Result<CalculatorData, DataLoadError> {
    let catalog = load_catalog(&require_data_file(dir, "catalog")?)?;
    let settings = match find_data_file(dir, "settings")? {
        Some(path) => load_settings(&path)?,
        None => Settings::default(),
    };
    Ok(CalculatorData { catalog, settings })
}

// ===========================================================================
// Tests
// ===========================================================================
