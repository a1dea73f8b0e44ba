//! Global settings and per-node overrides.
//!
//! These are plain parameter objects owned by the caller. The engine only
//! ever borrows them immutably.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{MachineRank, ProductionType};
use crate::fixed::{f64_to_fixed64, Fixed64};
use crate::id::{ItemId, NodeId, RecipeId};
use crate::mining::ExtractorTable;

// ---------------------------------------------------------------------------
// Boosters (proliferators)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum BoosterTier {
    #[default]
    None,
    Mk1,
    Mk2,
    Mk3,
}

/// Exactly one mode is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BoosterMode {
    /// Faster cycles: fewer machines for the same rate.
    #[default]
    Speed,
    /// Extra products per cycle: fewer inputs for the same rate.
    Production,
}

/// A booster tier with its bonus fractions (0.25 = +25%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoosterConfig {
    pub tier: BoosterTier,
    pub mode: BoosterMode,
    pub production_bonus: Fixed64,
    pub speed_bonus: Fixed64,
    pub power_increase: Fixed64,
}

impl BoosterConfig {
    /// No booster.
    pub fn none() -> Self {
        Self::for_tier(BoosterTier::None, BoosterMode::Speed)
    }

    /// Standard bonuses for a tier.
    pub fn for_tier(tier: BoosterTier, mode: BoosterMode) -> Self {
        let (production, speed, power) = match tier {
            BoosterTier::None => (0.0, 0.0, 0.0),
            BoosterTier::Mk1 => (0.125, 0.25, 0.3),
            BoosterTier::Mk2 => (0.2, 0.5, 0.7),
            BoosterTier::Mk3 => (0.25, 1.0, 1.5),
        };
        Self {
            tier,
            mode,
            production_bonus: f64_to_fixed64(production),
            speed_bonus: f64_to_fixed64(speed),
            power_increase: f64_to_fixed64(power),
        }
    }

    /// Same tier and bonuses with a different mode.
    pub fn with_mode(self, mode: BoosterMode) -> Self {
        Self { mode, ..self }
    }

    pub fn is_none(&self) -> bool {
        self.tier == BoosterTier::None
    }
}

impl Default for BoosterConfig {
    fn default() -> Self {
        Self::none()
    }
}

/// Global scaling of booster output/speed bonuses (modded play). `None`
/// means 1. Never scales the power increase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoosterMultipliers {
    pub production: Option<Fixed64>,
    pub speed: Option<Fixed64>,
}

// ---------------------------------------------------------------------------
// Belts and sorters
// ---------------------------------------------------------------------------

pub const MIN_STACK_COUNT: u8 = 1;
pub const MAX_STACK_COUNT: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BeltTier {
    #[default]
    Mk1,
    Mk2,
    Mk3,
}

impl BeltTier {
    /// Base items per second for one unstacked lane.
    pub fn base_speed(self) -> Fixed64 {
        match self {
            BeltTier::Mk1 => Fixed64::from_num(6),
            BeltTier::Mk2 => Fixed64::from_num(12),
            BeltTier::Mk3 => Fixed64::from_num(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeltConfig {
    pub tier: BeltTier,
    /// Items per second per stack layer.
    pub speed: Fixed64,
    /// Items stacked per belt slot, 1..=4.
    pub stack_count: u8,
}

impl BeltConfig {
    pub fn for_tier(tier: BeltTier) -> Self {
        Self {
            tier,
            speed: tier.base_speed(),
            stack_count: MIN_STACK_COUNT,
        }
    }

    /// Stack count clamped into range. Out-of-range values fall back to 1.
    pub fn effective_stack_count(&self) -> u8 {
        if (MIN_STACK_COUNT..=MAX_STACK_COUNT).contains(&self.stack_count) {
            self.stack_count
        } else {
            tracing::warn!(
                stack_count = self.stack_count,
                "belt stack count out of range, using {MIN_STACK_COUNT}"
            );
            MIN_STACK_COUNT
        }
    }

    /// Belt speed; negative values fall back to 0.
    pub fn effective_speed(&self) -> Fixed64 {
        if self.speed < Fixed64::ZERO {
            tracing::warn!(speed = %self.speed, "negative belt speed, using 0");
            Fixed64::ZERO
        } else {
            self.speed
        }
    }

    /// Items per second one belt carries.
    pub fn capacity(&self) -> Fixed64 {
        self.effective_speed()
            .saturating_mul_int(self.effective_stack_count() as i64)
    }
}

impl Default for BeltConfig {
    fn default() -> Self {
        Self::for_tier(BeltTier::Mk1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum SorterTier {
    #[default]
    Mk1,
    Mk2,
    Mk3,
    Pile,
}

impl SorterTier {
    /// Standard power draw in kW.
    pub fn base_power_kw(self) -> Fixed64 {
        match self {
            SorterTier::Mk1 => Fixed64::from_num(18),
            SorterTier::Mk2 => Fixed64::from_num(36),
            SorterTier::Mk3 => Fixed64::from_num(72),
            SorterTier::Pile => Fixed64::from_num(144),
        }
    }

    /// Display name used when the catalog has no item for the tier.
    pub const FALLBACK_NAME: &'static str = "Sorter";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SorterConfig {
    pub tier: SorterTier,
    pub power_kw: Fixed64,
}

impl SorterConfig {
    pub fn for_tier(tier: SorterTier) -> Self {
        Self {
            tier,
            power_kw: tier.base_power_kw(),
        }
    }
}

impl Default for SorterConfig {
    fn default() -> Self {
        Self::for_tier(SorterTier::Mk1)
    }
}

// ---------------------------------------------------------------------------
// Alternatives
// ---------------------------------------------------------------------------

/// A user choice for how an item is sourced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecipeChoice {
    /// Produce the item with this recipe.
    Recipe(RecipeId),
    /// Treat the item as mined even when recipes exist.
    Mined,
}

// ---------------------------------------------------------------------------
// Mining
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MinerTier {
    #[default]
    Basic,
    /// Supports work speed 100%..=300% at quadratic power cost.
    Advanced,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningSettings {
    /// Vein mining speed multiplier from research (1.0 = no research).
    pub speed_research_bonus: Fixed64,
    pub miner: MinerTier,
    /// Advanced miner work speed in percent.
    pub work_speed_percent: u32,
    pub extractors: ExtractorTable,
}

impl Default for MiningSettings {
    fn default() -> Self {
        Self {
            speed_research_bonus: Fixed64::from_num(1),
            miner: MinerTier::Basic,
            work_speed_percent: 100,
            extractors: ExtractorTable::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Photon generation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhotonSettings {
    pub use_graviton_lens: bool,
    /// Booster applied to graviton lenses. Always used in speed mode.
    pub lens_booster: BoosterConfig,
    pub transmission_efficiency_level: u32,
}

impl PhotonSettings {
    /// Base ray transmission efficiency before research.
    const BASE_EFFICIENCY: f64 = 0.3;
    /// Efficiency gained per research level.
    const EFFICIENCY_PER_LEVEL: f64 = 0.1;

    /// The lens booster forced into speed mode.
    pub fn lens_booster(&self) -> BoosterConfig {
        self.lens_booster.with_mode(BoosterMode::Speed)
    }

    /// Continuous reception is fixed at 100%.
    pub const CONTINUOUS_RECEPTION: Fixed64 = Fixed64::ONE;

    /// Fraction of Dyson sphere energy that reaches a receiver, capped at 1.
    pub fn transmission_efficiency(&self) -> Fixed64 {
        let one = Fixed64::from_num(1);
        let level = Fixed64::from_num(self.transmission_efficiency_level.min(100));
        let efficiency = f64_to_fixed64(Self::BASE_EFFICIENCY)
            + f64_to_fixed64(Self::EFFICIENCY_PER_LEVEL) * level;
        efficiency.min(one)
    }
}

// ---------------------------------------------------------------------------
// Global settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Settings {
    pub booster: BoosterConfig,
    /// Chosen rank per production type. Missing types use Mk1.
    pub machine_ranks: HashMap<ProductionType, MachineRank>,
    pub belt: BeltConfig,
    pub sorter: SorterConfig,
    pub alternatives: HashMap<ItemId, RecipeChoice>,
    pub mining: MiningSettings,
    pub booster_multipliers: BoosterMultipliers,
    pub photon: PhotonSettings,
}

impl Settings {
    pub fn machine_rank(&self, production_type: ProductionType) -> MachineRank {
        self.machine_ranks
            .get(&production_type)
            .copied()
            .unwrap_or(MachineRank::Mk1)
    }

    pub fn alternative(&self, item: ItemId) -> Option<RecipeChoice> {
        self.alternatives.get(&item).copied()
    }
}

// ---------------------------------------------------------------------------
// Node overrides
// ---------------------------------------------------------------------------

/// Per-node settings that win over [`Settings`] for exactly one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeOverride {
    pub booster: Option<BoosterConfig>,
    pub machine_rank: Option<MachineRank>,
}

pub type NodeOverrides = HashMap<NodeId, NodeOverride>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::fixed64_to_f64;

    #[test]
    fn booster_tier_table() {
        let mk2 = BoosterConfig::for_tier(BoosterTier::Mk2, BoosterMode::Speed);
        assert_eq!(mk2.speed_bonus, f64_to_fixed64(0.5));
        assert_eq!(mk2.production_bonus, f64_to_fixed64(0.2));
        assert!((fixed64_to_f64(mk2.power_increase) - 0.7).abs() < 1e-9);
        assert!(BoosterConfig::none().is_none());
    }

    #[test]
    fn stack_count_out_of_range_falls_back() {
        let mut belt = BeltConfig::for_tier(BeltTier::Mk3);
        belt.stack_count = 4;
        assert_eq!(belt.effective_stack_count(), 4);
        belt.stack_count = 0;
        assert_eq!(belt.effective_stack_count(), 1);
        belt.stack_count = 9;
        assert_eq!(belt.effective_stack_count(), 1);
    }

    #[test]
    fn belt_capacity() {
        let mut belt = BeltConfig::for_tier(BeltTier::Mk2);
        belt.stack_count = 3;
        assert_eq!(belt.capacity(), Fixed64::from_num(36));
        belt.speed = f64_to_fixed64(-5.0);
        assert_eq!(belt.capacity(), Fixed64::ZERO);
    }

    #[test]
    fn missing_rank_defaults_to_mk1() {
        let mut settings = Settings::default();
        assert_eq!(settings.machine_rank(ProductionType::Assemble), MachineRank::Mk1);
        settings
            .machine_ranks
            .insert(ProductionType::Assemble, MachineRank::Mk3);
        assert_eq!(settings.machine_rank(ProductionType::Assemble), MachineRank::Mk3);
    }

    #[test]
    fn lens_booster_forced_to_speed() {
        let photon = PhotonSettings {
            use_graviton_lens: true,
            lens_booster: BoosterConfig::for_tier(BoosterTier::Mk3, BoosterMode::Production),
            transmission_efficiency_level: 0,
        };
        assert_eq!(photon.lens_booster().mode, BoosterMode::Speed);
        assert_eq!(photon.lens_booster().tier, BoosterTier::Mk3);
    }

    #[test]
    fn transmission_efficiency_caps_at_one() {
        let mut photon = PhotonSettings::default();
        assert!((fixed64_to_f64(photon.transmission_efficiency()) - 0.3).abs() < 1e-6);
        photon.transmission_efficiency_level = 3;
        assert!((fixed64_to_f64(photon.transmission_efficiency()) - 0.6).abs() < 1e-6);
        photon.transmission_efficiency_level = 50;
        assert_eq!(photon.transmission_efficiency(), Fixed64::from_num(1));
        assert_eq!(PhotonSettings::CONTINUOUS_RECEPTION, Fixed64::from_num(1));
    }
}
