//! Item statistics for a resolved production tree.
//!
//! Walks a [`CalculationResult`] once and aggregates, per item, how much the
//! plan produces and consumes. Derived views group items into raw
//! materials, intermediates and final products.
//!
//! # Usage
//!
//! ```ignore
//! let result = resolve(recipe, rate, &catalog, &settings, &overrides)?;
//! let stats = ProductionStatistics::collect(&result, &catalog);
//! for item in stats.raw_materials() {
//!     println!("{}: {}", item.name, item.consumption);
//! }
//! ```
//!
//! # Accounting
//!
//! - Non-raw nodes add their main output rate and byproduct rates to
//!   production.
//! - Every input line adds its rate to consumption.
//! - Raw leaves add their own rate to consumption as well, on top of the
//!   parent's input line.
//! - Once an item is seen as a raw leaf it stays raw.
//!
//! The views filter independently. An item that is a raw leaf on one path
//! and produced on another is both a raw material and an intermediate.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chainplan_core::catalog::Catalog;
use chainplan_core::fixed::Fixed64;
use chainplan_core::id::ItemId;
use chainplan_core::resolver::CalculationResult;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Per-item statistics
// ---------------------------------------------------------------------------

/// Where an item sits in the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemCategory {
    /// Mined, or forced raw.
    RawMaterial,
    /// Both produced and consumed.
    Intermediate,
    /// Produced and never consumed.
    FinalProduct,
    /// Consumed but never produced, without being a raw leaf.
    Unsourced,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStats {
    pub item: ItemId,
    pub name: String,
    /// Items per second produced across all nodes.
    pub production: Fixed64,
    /// Items per second consumed across all nodes.
    pub consumption: Fixed64,
    /// `production - consumption`.
    pub net: Fixed64,
    pub is_raw: bool,
    /// Nodes whose outputs include the item.
    pub producers: u32,
    /// Nodes whose input lines include the item.
    pub consumers: u32,
}

impl ItemStats {
    fn new(item: ItemId, name: String) -> Self {
        Self {
            item,
            name,
            production: Fixed64::ZERO,
            consumption: Fixed64::ZERO,
            net: Fixed64::ZERO,
            is_raw: false,
            producers: 0,
            consumers: 0,
        }
    }

    /// Single display category; raw wins over the production figures.
    pub fn category(&self) -> ItemCategory {
        let produced = self.production > Fixed64::ZERO;
        let consumed = self.consumption > Fixed64::ZERO;
        if self.is_raw {
            ItemCategory::RawMaterial
        } else if produced && consumed {
            ItemCategory::Intermediate
        } else if produced {
            ItemCategory::FinalProduct
        } else {
            ItemCategory::Unsourced
        }
    }
}

// ---------------------------------------------------------------------------
// ProductionStatistics
// ---------------------------------------------------------------------------

/// Per-item statistics plus tree-wide totals.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductionStatistics {
    items: BTreeMap<ItemId, ItemStats>,
    /// Continuous machine count; raw leaves contribute nothing.
    pub total_machines: Fixed64,
    /// Grid power in kW.
    pub total_power: Fixed64,
}

impl ProductionStatistics {
    /// Aggregate statistics for `result`. Names come from `catalog`.
    pub fn collect(result: &CalculationResult, catalog: &Catalog) -> Self {
        let mut stats = Self::default();

        for node in result.iter() {
            if node.is_raw_material {
                let entry = stats.entry(node.item, catalog);
                entry.consumption = entry.consumption.saturating_add(node.target_rate);
                entry.is_raw = true;
                continue;
            }

            stats.total_machines = stats.total_machines.saturating_add(node.machine_count);
            stats.total_power = stats.total_power.saturating_add(node.power.total);

            for output in node.outputs() {
                let entry = stats.entry(output.item, catalog);
                entry.production = entry.production.saturating_add(output.rate);
                entry.producers += 1;
            }
            for input in &node.inputs {
                let entry = stats.entry(input.item, catalog);
                entry.consumption = entry.consumption.saturating_add(input.rate);
                entry.consumers += 1;
            }
        }

        for entry in stats.items.values_mut() {
            entry.net = entry.production.saturating_sub(entry.consumption);
        }

        tracing::debug!(
            items = stats.items.len(),
            machines = %stats.total_machines,
            power_kw = %stats.total_power,
            "production statistics collected"
        );
        stats
    }

    fn entry(&mut self, item: ItemId, catalog: &Catalog) -> &mut ItemStats {
        self.items
            .entry(item)
            .or_insert_with(|| ItemStats::new(item, catalog.item_name(item)))
    }

    pub fn item(&self, item: ItemId) -> Option<&ItemStats> {
        self.items.get(&item)
    }

    /// Every item, ordered by id.
    pub fn items(&self) -> impl Iterator<Item = &ItemStats> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    /// Raw materials, largest consumption first.
    pub fn raw_materials(&self) -> Vec<&ItemStats> {
        let mut view: Vec<&ItemStats> = self.items().filter(|s| s.is_raw).collect();
        view.sort_by(|a, b| descending(a.consumption, b.consumption).then(a.item.cmp(&b.item)));
        view
    }

    /// Items both produced and consumed, largest production first.
    pub fn intermediates(&self) -> Vec<&ItemStats> {
        self.by_production(|s| s.production > Fixed64::ZERO && s.consumption > Fixed64::ZERO)
    }

    /// Items produced and never consumed, largest production first.
    pub fn final_products(&self) -> Vec<&ItemStats> {
        self.by_production(|s| s.production > Fixed64::ZERO && s.consumption == Fixed64::ZERO)
    }

    /// Raw materials first, then everything else by largest |net|.
    pub fn combined(&self) -> Vec<&ItemStats> {
        let mut view: Vec<&ItemStats> = self.items().collect();
        view.sort_by(|a, b| {
            b.is_raw
                .cmp(&a.is_raw)
                .then_with(|| descending(a.net.saturating_abs(), b.net.saturating_abs()))
                .then(a.item.cmp(&b.item))
        });
        view
    }

    /// Number of items in each category.
    pub fn category_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for stats in self.items() {
            let key = match stats.category() {
                ItemCategory::RawMaterial => "raw",
                ItemCategory::Intermediate => "intermediate",
                ItemCategory::FinalProduct => "final",
                ItemCategory::Unsourced => "unsourced",
            };
            *counts.entry(key).or_insert(0) += 1;
        }
        counts
    }

    fn by_production(&self, keep: impl Fn(&ItemStats) -> bool) -> Vec<&ItemStats> {
        let mut view: Vec<&ItemStats> = self.items().filter(|s| keep(s)).collect();
        view.sort_by(|a, b| descending(a.production, b.production).then(a.item.cmp(&b.item)));
        view
    }
}

fn descending(a: Fixed64, b: Fixed64) -> Ordering {
    b.cmp(&a)
}
