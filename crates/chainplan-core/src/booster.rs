//! Booster engine: turns a booster configuration into effective bonuses and
//! the two mutually exclusive throughput multipliers applied to a machine.

use serde::{Deserialize, Serialize};

use crate::fixed::Fixed64;
use crate::settings::{BoosterConfig, BoosterMode, BoosterMultipliers};

/// Bonus fractions after applying the global multiplier pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveBonuses {
    pub production: Fixed64,
    pub speed: Fixed64,
    pub power_increase: Fixed64,
}

impl EffectiveBonuses {
    pub const ZERO: Self = Self {
        production: Fixed64::ZERO,
        speed: Fixed64::ZERO,
        power_increase: Fixed64::ZERO,
    };
}

/// Throughput multipliers applied to one machine. At most one exceeds 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveMultipliers {
    pub speed: Fixed64,
    pub production: Fixed64,
}

impl ActiveMultipliers {
    pub const NEUTRAL: Self = Self {
        speed: Fixed64::ONE,
        production: Fixed64::ONE,
    };

    /// Whether either multiplier changes throughput.
    pub fn is_boosting(&self) -> bool {
        self.speed > Fixed64::ONE || self.production > Fixed64::ONE
    }
}

impl Default for ActiveMultipliers {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Effective bonuses for `config` scaled by `multipliers`.
///
/// The multiplier pair scales the production and speed bonuses only; the
/// power increase is always taken as configured.
pub fn effective_bonuses(config: &BoosterConfig, multipliers: &BoosterMultipliers) -> EffectiveBonuses {
    if config.is_none() {
        return EffectiveBonuses::ZERO;
    }
    let one = Fixed64::ONE;
    EffectiveBonuses {
        production: config
            .production_bonus
            .saturating_mul(multipliers.production.unwrap_or(one)),
        speed: config
            .speed_bonus
            .saturating_mul(multipliers.speed.unwrap_or(one)),
        power_increase: config.power_increase,
    }
}

/// The multipliers actually applied to a machine.
///
/// Production mode on a recipe that does not allow it leaves the booster
/// inert: both multipliers are 1.
pub fn active_multipliers(
    config: &BoosterConfig,
    multipliers: &BoosterMultipliers,
    production_allowed: bool,
) -> ActiveMultipliers {
    let bonuses = effective_bonuses(config, multipliers);
    let one = Fixed64::ONE;
    match config.mode {
        BoosterMode::Speed => ActiveMultipliers {
            speed: one.saturating_add(bonuses.speed),
            production: one,
        },
        BoosterMode::Production if production_allowed => ActiveMultipliers {
            speed: one,
            production: one.saturating_add(bonuses.production),
        },
        BoosterMode::Production => ActiveMultipliers::NEUTRAL,
    }
}

/// Whether `config` has any effect on a recipe with the given `productive` flag.
pub fn is_inert(config: &BoosterConfig, production_allowed: bool) -> bool {
    config.is_none() || (config.mode == BoosterMode::Production && !production_allowed)
}
