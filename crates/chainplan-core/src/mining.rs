//! Mining calculator: extractor counts and power for the raw materials a
//! resolved tree demands.

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, RawSource};
use crate::fixed::{ceil_count, div_saturating, f64_to_fixed64, Fixed64};
use crate::id::ItemId;
use crate::resolver::RawDemand;
use crate::settings::{MinerTier, MiningSettings};

/// Advanced miner work speed bounds, in percent.
pub const MIN_WORK_SPEED_PERCENT: u32 = 100;
pub const MAX_WORK_SPEED_PERCENT: u32 = 300;

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExtractorKind {
    Miner,
    AdvancedMiner,
    WaterPump,
    OilExtractor,
    OrbitalCollector,
}

impl ExtractorKind {
    pub fn label(self) -> &'static str {
        match self {
            ExtractorKind::Miner => "Mining Machine",
            ExtractorKind::AdvancedMiner => "Advanced Mining Machine",
            ExtractorKind::WaterPump => "Water Pump",
            ExtractorKind::OilExtractor => "Oil Extractor",
            ExtractorKind::OrbitalCollector => "Orbital Collector",
        }
    }

    /// Orbital collectors never draw grid power.
    pub fn uses_grid_power(self) -> bool {
        self != ExtractorKind::OrbitalCollector
    }
}

/// Base output and power of one extractor at 100% work speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorSpec {
    /// Items per second. For vein miners this is the per-vein yield.
    pub output_per_second: Fixed64,
    pub power_kw: Fixed64,
}

impl ExtractorSpec {
    fn new(output_per_second: f64, power_kw: f64) -> Self {
        Self {
            output_per_second: f64_to_fixed64(output_per_second),
            power_kw: f64_to_fixed64(power_kw),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorTable {
    pub miner: ExtractorSpec,
    pub advanced_miner: ExtractorSpec,
    pub water_pump: ExtractorSpec,
    pub oil_extractor: ExtractorSpec,
    pub orbital_collector: ExtractorSpec,
}

impl ExtractorTable {
    pub fn spec(&self, kind: ExtractorKind) -> &ExtractorSpec {
        match kind {
            ExtractorKind::Miner => &self.miner,
            ExtractorKind::AdvancedMiner => &self.advanced_miner,
            ExtractorKind::WaterPump => &self.water_pump,
            ExtractorKind::OilExtractor => &self.oil_extractor,
            ExtractorKind::OrbitalCollector => &self.orbital_collector,
        }
    }
}

impl Default for ExtractorTable {
    fn default() -> Self {
        Self {
            miner: ExtractorSpec::new(0.5, 420.0),
            advanced_miner: ExtractorSpec::new(1.0, 630.0),
            water_pump: ExtractorSpec {
                output_per_second: Fixed64::from_num(50) / 60,
                power_kw: Fixed64::from_num(300),
            },
            oil_extractor: ExtractorSpec::new(1.0, 840.0),
            orbital_collector: ExtractorSpec {
                output_per_second: Fixed64::from_num(1),
                power_kw: Fixed64::ZERO,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Extraction plan for one raw material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningRequirement {
    pub item: ItemId,
    pub required_rate: Fixed64,
    pub extractor: ExtractorKind,
    pub machines: u32,
    pub output_per_machine: Fixed64,
    /// Scale applied to the extractor's base power.
    pub power_multiplier: Fixed64,
    pub power_per_machine: Fixed64,
    pub total_power: Fixed64,
    /// 100 for everything except an overclocked advanced miner.
    pub work_speed_percent: u32,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MiningResult {
    pub requirements: Vec<MiningRequirement>,
    pub total_machines: u32,
    pub total_power: Fixed64,
}

impl MiningResult {
    pub fn requirement(&self, item: ItemId) -> Option<&MiningRequirement> {
        self.requirements.iter().find(|r| r.item == item)
    }
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Power scale of an advanced miner at `work_speed_percent`: quadratic, so
/// overclocking costs power faster than it gains throughput.
pub fn advanced_power_multiplier(work_speed_percent: u32) -> Fixed64 {
    let ratio = Fixed64::from_num(work_speed_percent) / 100;
    ratio.saturating_mul(ratio)
}

fn clamp_work_speed(percent: u32) -> u32 {
    let clamped = percent.clamp(MIN_WORK_SPEED_PERCENT, MAX_WORK_SPEED_PERCENT);
    if clamped != percent {
        tracing::warn!(percent, clamped, "advanced miner work speed out of range");
    }
    clamped
}

/// Extractors needed to cover each raw demand.
///
/// Items whose catalog entry has no raw source are skipped with a warning;
/// they still appear in the tree's raw demand list.
pub fn calculate_mining(demand: &[RawDemand], catalog: &Catalog, settings: &MiningSettings) -> MiningResult {
    let mut result = MiningResult::default();

    for raw in demand {
        let Some(source) = catalog.item(raw.item).and_then(|item| item.raw_source) else {
            tracing::warn!(item = raw.item.0, "raw material has no extraction source");
            continue;
        };
        let requirement = requirement_for(raw, source, settings);
        result.total_machines = result.total_machines.saturating_add(requirement.machines);
        result.total_power = result.total_power.saturating_add(requirement.total_power);
        result.requirements.push(requirement);
    }

    tracing::debug!(
        materials = result.requirements.len(),
        machines = result.total_machines,
        power_kw = %result.total_power,
        "mining requirements computed"
    );
    result
}

fn requirement_for(raw: &RawDemand, source: RawSource, settings: &MiningSettings) -> MiningRequirement {
    let one = Fixed64::ONE;
    let (extractor, work_speed_percent) = match source {
        RawSource::Vein => match settings.miner {
            MinerTier::Basic => (ExtractorKind::Miner, 100),
            MinerTier::Advanced => (
                ExtractorKind::AdvancedMiner,
                clamp_work_speed(settings.work_speed_percent),
            ),
        },
        RawSource::WaterPump => (ExtractorKind::WaterPump, 100),
        RawSource::OilExtractor => (ExtractorKind::OilExtractor, 100),
        RawSource::OrbitalCollector => (ExtractorKind::OrbitalCollector, 100),
    };
    let spec = settings.extractors.spec(extractor);

    let (output_per_machine, power_multiplier) = match extractor {
        ExtractorKind::Miner => (
            spec.output_per_second
                .saturating_mul(settings.speed_research_bonus),
            one,
        ),
        ExtractorKind::AdvancedMiner => {
            let speed = Fixed64::from_num(work_speed_percent) / 100;
            (
                spec.output_per_second
                    .saturating_mul(settings.speed_research_bonus)
                    .saturating_mul(speed),
                advanced_power_multiplier(work_speed_percent),
            )
        }
        ExtractorKind::WaterPump | ExtractorKind::OilExtractor | ExtractorKind::OrbitalCollector => {
            (spec.output_per_second, one)
        }
    };

    let machines = ceil_count(div_saturating(raw.rate, output_per_machine));
    let power_per_machine = if extractor.uses_grid_power() {
        spec.power_kw.saturating_mul(power_multiplier)
    } else {
        Fixed64::ZERO
    };

    MiningRequirement {
        item: raw.item,
        required_rate: raw.rate,
        extractor,
        machines,
        output_per_machine,
        power_multiplier,
        power_per_machine,
        total_power: power_per_machine.saturating_mul_int(machines as i64),
        work_speed_percent,
        label: extractor.label().to_string(),
    }
}
