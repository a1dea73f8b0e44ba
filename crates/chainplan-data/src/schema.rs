//! Serde data file structs for catalogs and settings profiles.
//!
//! These structs define the on-disk format. They are deserialized from RON,
//! JSON, or TOML data files and then sanitized into core types by the
//! loader. Numbers are plain `f64` here; conversion to fixed point happens
//! in the loader so malformed values can fall back with a warning.

use chainplan_core::catalog::{MachineRank, ProductionType, RawSource};
use chainplan_core::settings::{BeltTier, BoosterMode, BoosterTier, MinerTier, SorterTier};
use serde::Deserialize;

fn default_true() -> bool {
    true
}

// ===========================================================================
// Catalog
// ===========================================================================

/// Top-level layout of `catalog.{ron,json,toml}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub items: Vec<ItemData>,
    #[serde(default)]
    pub machines: Vec<MachineData>,
    #[serde(default)]
    pub recipes: Vec<RecipeData>,
    /// Catalog items that name each sorter tier.
    #[serde(default)]
    pub sorters: Vec<SorterItemData>,
}

/// An item definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemData {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub raw_source: Option<RawSource>,
}

/// A machine definition in a data file. Energies are joules per tick.
#[derive(Debug, Clone, Deserialize)]
pub struct MachineData {
    pub id: u32,
    pub name: String,
    pub production_type: ProductionType,
    pub rank: MachineRank,
    pub speed: f64,
    #[serde(default)]
    pub idle_energy_per_tick: f64,
    pub work_energy_per_tick: f64,
    #[serde(default)]
    pub exchange_energy_per_tick: f64,
    #[serde(default = "default_true")]
    pub is_power_consumer: bool,
    #[serde(default)]
    pub is_power_exchanger: bool,
}

/// A recipe line, supporting both short tuple form and full form with the
/// optional `raw` flag.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RecipeLineData {
    /// Short form: `(item_id, count)`.
    Short(u32, u32),
    /// Full form with explicit fields.
    Full {
        item: u32,
        count: u32,
        #[serde(default)]
        raw: bool,
    },
}

impl RecipeLineData {
    pub fn parts(&self) -> (u32, u32, bool) {
        match *self {
            RecipeLineData::Short(item, count) => (item, count, false),
            RecipeLineData::Full { item, count, raw } => (item, count, raw),
        }
    }
}

/// A recipe definition in a data file. `outputs[0]` is the main output.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub id: u32,
    pub name: String,
    pub production_type: ProductionType,
    /// Seconds per cycle.
    pub cycle_time: f64,
    #[serde(default)]
    pub inputs: Vec<RecipeLineData>,
    pub outputs: Vec<RecipeLineData>,
    #[serde(default = "default_true")]
    pub productive: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SorterItemData {
    pub tier: SorterTier,
    pub item: u32,
}

// ===========================================================================
// Settings
// ===========================================================================

/// Top-level layout of `settings.{ron,json,toml}`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SettingsData {
    pub booster: Option<BoosterData>,
    pub machine_ranks: Vec<MachineRankData>,
    pub belt: Option<BeltData>,
    pub sorter: Option<SorterData>,
    pub alternatives: Vec<AlternativeData>,
    pub mining: Option<MiningData>,
    pub booster_multipliers: Option<BoosterMultipliersData>,
    pub photon: Option<PhotonData>,
}

/// A booster tier. Bonus fields override the tier's standard values.
#[derive(Debug, Clone, Deserialize)]
pub struct BoosterData {
    pub tier: BoosterTier,
    #[serde(default)]
    pub mode: BoosterMode,
    #[serde(default)]
    pub production_bonus: Option<f64>,
    #[serde(default)]
    pub speed_bonus: Option<f64>,
    #[serde(default)]
    pub power_increase: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MachineRankData {
    pub production_type: ProductionType,
    pub rank: MachineRank,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BeltData {
    pub tier: BeltTier,
    /// Items per second per stack layer; defaults to the tier's speed.
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub stack_count: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SorterData {
    pub tier: SorterTier,
    /// Defaults to the tier's standard draw.
    #[serde(default)]
    pub power_kw: Option<f64>,
}

/// How one item is sourced: `mined: true`, or a `recipe` id.
#[derive(Debug, Clone, Deserialize)]
pub struct AlternativeData {
    pub item: u32,
    #[serde(default)]
    pub recipe: Option<u32>,
    #[serde(default)]
    pub mined: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MiningData {
    pub speed_research_bonus: Option<f64>,
    pub miner: MinerTier,
    pub work_speed_percent: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BoosterMultipliersData {
    pub production: Option<f64>,
    pub speed: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PhotonData {
    pub use_graviton_lens: bool,
    pub lens_booster: Option<BoosterData>,
    pub transmission_efficiency_level: u32,
}
