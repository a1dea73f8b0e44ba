//! Power breakdown for a resolved production tree.
//!
//! Groups the grid power a plan draws into entries: one per machine type,
//! one synthetic entry for all sorters, and one per extractor type and work
//! speed when mining results are supplied. Each entry carries its share of
//! the grand total.
//!
//! # Design
//!
//! - Machine entries are keyed by [`MachineId`]. When the same machine runs
//!   under different boosters, the entry keeps the highest per-machine draw
//!   and sums the machine counts.
//! - Ray Receivers draw Dyson sphere power and never enter the machine pool.
//!   Their sorters still count.
//! - Orbital collectors draw no grid power and are left out.
//! - Entries are sorted by total power, largest first.

use std::collections::BTreeMap;

use chainplan_core::catalog::Catalog;
use chainplan_core::fixed::{percent_of, Fixed64};
use chainplan_core::id::MachineId;
use chainplan_core::mining::{ExtractorKind, MiningResult};
use chainplan_core::resolver::CalculationResult;
use chainplan_core::settings::{Settings, SorterTier};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// What an entry's power is drawn by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PowerSource {
    Machine(MachineId),
    /// Every sorter in the tree, at the active tier.
    Sorters(SorterTier),
    Extractor {
        kind: ExtractorKind,
        work_speed_percent: u32,
    },
}

/// One line of the breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerEntry {
    pub source: PowerSource,
    pub name: String,
    /// Machines, sorters or extractors. Continuous for machines.
    pub count: Fixed64,
    /// kW drawn by one unit.
    pub power_per_unit: Fixed64,
    /// kW drawn by all units.
    pub total: Fixed64,
    /// Share of the grand total, in percent.
    pub percentage: Fixed64,
}

/// Grid power of a plan, grouped by consumer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PowerBreakdown {
    pub entries: Vec<PowerEntry>,
    /// Grand total in kW.
    pub total: Fixed64,
}

impl PowerBreakdown {
    pub fn entry(&self, source: PowerSource) -> Option<&PowerEntry> {
        self.entries.iter().find(|e| e.source == source)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of machine entries only.
    pub fn machine_total(&self) -> Fixed64 {
        self.entries
            .iter()
            .filter(|e| matches!(e.source, PowerSource::Machine(_)))
            .fold(Fixed64::ZERO, |acc, e| acc.saturating_add(e.total))
    }
}

/// Running totals for one source before percentages are known.
struct Accumulator {
    name: String,
    count: Fixed64,
    power_per_unit: Fixed64,
    total: Option<Fixed64>,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Build the power breakdown for `result`, adding extractors from `mining`
/// when given.
pub fn aggregate_power(
    result: &CalculationResult,
    mining: Option<&MiningResult>,
    catalog: &Catalog,
    settings: &Settings,
) -> PowerBreakdown {
    let mut sources: BTreeMap<PowerSource, Accumulator> = BTreeMap::new();
    let mut sorter_count: u64 = 0;
    let mut sorter_power = Fixed64::ZERO;

    for node in result.iter() {
        sorter_count += u64::from(node.sorter_count);
        sorter_power = sorter_power.saturating_add(node.power.sorters);

        let Some(machine) = node.machine.and_then(|id| catalog.machine(id)) else {
            continue;
        };
        if machine.draws_orbital_power() || !machine.is_power_consumer {
            continue;
        }
        let per_machine = machine
            .work_power_kw()
            .saturating_mul(Fixed64::ONE.saturating_add(node.booster.power_increase));
        let acc = sources
            .entry(PowerSource::Machine(machine.id))
            .or_insert_with(|| Accumulator {
                name: machine.name.clone(),
                count: Fixed64::ZERO,
                power_per_unit: Fixed64::ZERO,
                total: None,
            });
        acc.count = acc.count.saturating_add(node.machine_count);
        acc.power_per_unit = acc.power_per_unit.max(per_machine);
    }

    if sorter_count > 0 {
        let tier = settings.sorter.tier;
        let name = catalog
            .sorter_item(tier)
            .map(|item| item.name.clone())
            .unwrap_or_else(|| SorterTier::FALLBACK_NAME.to_string());
        sources.insert(
            PowerSource::Sorters(tier),
            Accumulator {
                name,
                count: Fixed64::saturating_from_num(sorter_count),
                power_per_unit: settings.sorter.power_kw,
                total: Some(sorter_power),
            },
        );
    }

    if let Some(mining) = mining {
        for requirement in &mining.requirements {
            if !requirement.extractor.uses_grid_power() {
                continue;
            }
            let source = PowerSource::Extractor {
                kind: requirement.extractor,
                work_speed_percent: requirement.work_speed_percent,
            };
            let acc = sources.entry(source).or_insert_with(|| Accumulator {
                name: extractor_label(requirement.extractor, requirement.work_speed_percent),
                count: Fixed64::ZERO,
                power_per_unit: requirement.power_per_machine,
                total: Some(Fixed64::ZERO),
            });
            acc.count = acc
                .count
                .saturating_add(Fixed64::saturating_from_num(requirement.machines));
            acc.total = acc
                .total
                .map(|total| total.saturating_add(requirement.total_power));
        }
    }

    let mut entries: Vec<PowerEntry> = sources
        .into_iter()
        .map(|(source, acc)| {
            let total = acc
                .total
                .unwrap_or_else(|| acc.count.saturating_mul(acc.power_per_unit));
            PowerEntry {
                source,
                name: acc.name,
                count: acc.count,
                power_per_unit: acc.power_per_unit,
                total,
                percentage: Fixed64::ZERO,
            }
        })
        .collect();

    let grand_total = entries
        .iter()
        .fold(Fixed64::ZERO, |acc, e| acc.saturating_add(e.total));
    for entry in &mut entries {
        entry.percentage = percent_of(entry.total, grand_total);
    }
    entries.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));

    tracing::debug!(
        entries = entries.len(),
        total_kw = %grand_total,
        "power breakdown aggregated"
    );

    PowerBreakdown {
        entries,
        total: grand_total,
    }
}

/// Display name for an extractor group. Advanced miners show their work
/// speed unless it is 100%.
pub fn extractor_label(kind: ExtractorKind, work_speed_percent: u32) -> String {
    match kind {
        ExtractorKind::AdvancedMiner if work_speed_percent != 100 => {
            format!("{} ({}%)", kind.label(), work_speed_percent)
        }
        _ => kind.label().to_string(),
    }
}
