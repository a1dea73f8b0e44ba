//! Production-chain resolver.
//!
//! Expands a root recipe at a target rate into a tree of [`ResolvedNode`]s.
//! Each node resolves its own booster and machine rank (node override first,
//! then global settings), computes its machine count, power, sorters and
//! belt usage, and recurses into every input: into a recipe (the chosen
//! alternative or the default candidate) or into a raw-material leaf.
//!
//! The resolver is a pure function of its arguments. It never mutates the
//! catalog, settings or overrides, and keeps no state between calls.
//!
//! # Rates
//!
//! For a recipe with main output count `m`, cycle time `t`, machine speed
//! `s`, and active multipliers `S` (speed) and `P` (production):
//!
//! - per-machine main output = `m * s * S * P / t`
//! - machine count = `target / per-machine` (continuous)
//! - input rate = `target * count / (m * P)`
//! - byproduct rate = `target * count / m`

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::booster::{active_multipliers, effective_bonuses, is_inert, ActiveMultipliers};
use crate::catalog::{Catalog, Machine, MachineRank, ProductionType, Recipe, RecipeLine};
use crate::fixed::{ceil_count, div_saturating, percent_of, Fixed64};
use crate::id::{ItemId, MachineId, NodeId, NodeKeyHash, RecipeId};
use crate::settings::{
    BoosterConfig, BoosterMode, NodeOverride, NodeOverrides, PhotonSettings, RecipeChoice, Settings,
};

/// Seconds a graviton lens lasts in a Ray Receiver without boosting.
pub const LENS_LIFETIME_SECONDS: u32 = 120;

const TAG_ROOT: u8 = 0;
const TAG_RECIPE: u8 = 1;
const TAG_RAW: u8 = 2;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Power drawn by one node, in kW.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodePower {
    pub machines: Fixed64,
    pub sorters: Fixed64,
    pub total: Fixed64,
}

/// Which side of a node is closest to its belt capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Bottleneck {
    /// Nothing flows in or out.
    #[default]
    None,
    Input,
    Output,
}

/// Belts needed to feed and drain a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConveyorUsage {
    pub inputs: u32,
    pub outputs: u32,
    pub total: u32,
    /// Utilization of the bottleneck side, in percent.
    pub saturation: Fixed64,
    pub bottleneck: Bottleneck,
}

/// An item flowing at a rate (items/second).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRate {
    pub item: ItemId,
    pub rate: Fixed64,
}

/// One node of the resolved production tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedNode {
    pub id: NodeId,
    /// Main output item, or the mined item for raw leaves.
    pub item: ItemId,
    pub recipe: Option<RecipeId>,
    pub machine: Option<MachineId>,
    pub production_type: Option<ProductionType>,
    /// Main output rate this node must deliver.
    pub target_rate: Fixed64,
    /// Continuous machine count. Zero for raw leaves.
    pub machine_count: Fixed64,
    /// The booster actually applied; `none` when inert.
    pub booster: BoosterConfig,
    pub multipliers: ActiveMultipliers,
    pub power: NodePower,
    /// Dyson sphere power drawn by Ray Receivers, in kW. Not grid power.
    pub orbital_power: Fixed64,
    pub sorter_count: u32,
    pub conveyors: ConveyorUsage,
    pub inputs: Vec<ItemRate>,
    pub byproducts: Vec<ItemRate>,
    pub children: Vec<ResolvedNode>,
    pub is_raw_material: bool,
}

impl ResolvedNode {
    /// Whole machines to build.
    pub fn machines_ceil(&self) -> u32 {
        ceil_count(self.machine_count)
    }

    /// Depth-first, pre-order walk over this node and its descendants.
    pub fn iter(&self) -> NodeIter<'_> {
        NodeIter { stack: vec![self] }
    }

    pub fn find(&self, id: NodeId) -> Option<&ResolvedNode> {
        self.iter().find(|node| node.id == id)
    }

    /// Every output of this node: the main output then byproducts.
    pub fn outputs(&self) -> impl Iterator<Item = ItemRate> + '_ {
        std::iter::once(ItemRate {
            item: self.item,
            rate: self.target_rate,
        })
        .chain(self.byproducts.iter().copied())
    }
}

/// Pre-order iterator over a resolved tree.
pub struct NodeIter<'a> {
    stack: Vec<&'a ResolvedNode>,
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = &'a ResolvedNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Total demand for one raw material across all leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDemand {
    pub item: ItemId,
    pub rate: Fixed64,
}

/// A resolved tree plus tree-wide totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub root: ResolvedNode,
    pub total_machines: Fixed64,
    /// Grid power in kW (machines and sorters).
    pub total_power: Fixed64,
    /// Sorted by item id.
    pub raw_materials: Vec<RawDemand>,
    pub node_count: usize,
}

impl CalculationResult {
    pub fn iter(&self) -> NodeIter<'_> {
        self.root.iter()
    }

    pub fn node(&self, id: NodeId) -> Option<&ResolvedNode> {
        self.root.find(id)
    }

    pub fn raw_demand(&self, item: ItemId) -> Fixed64 {
        self.raw_materials
            .iter()
            .find(|raw| raw.item == item)
            .map(|raw| raw.rate)
            .unwrap_or(Fixed64::ZERO)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("unknown root recipe: {0:?}")]
    UnknownRecipe(RecipeId),
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Resolve `root_recipe` producing its main output at `target_rate`.
///
/// Only an unknown root recipe is an error. Everything below the root
/// degrades: a recipe with no machine at its rank becomes an unexpanded raw
/// leaf for the demanded item, and unknown or cyclic
/// inputs give raw leaves.
pub fn resolve(
    root_recipe: RecipeId,
    target_rate: Fixed64,
    catalog: &Catalog,
    settings: &Settings,
    overrides: &NodeOverrides,
) -> Result<CalculationResult, ResolveError> {
    let recipe = catalog
        .recipe(root_recipe)
        .ok_or(ResolveError::UnknownRecipe(root_recipe))?;

    let mut resolver = Resolver::new(catalog, settings, overrides);
    let root_id = root_node_id(root_recipe);
    let root = resolver.resolve_recipe(recipe, recipe.main_output().item, target_rate, root_id);

    let mut total_machines = Fixed64::ZERO;
    let mut total_power = Fixed64::ZERO;
    let mut raw: BTreeMap<ItemId, Fixed64> = BTreeMap::new();
    let mut node_count = 0;
    for node in root.iter() {
        node_count += 1;
        total_machines = total_machines.saturating_add(node.machine_count);
        total_power = total_power.saturating_add(node.power.total);
        if node.is_raw_material {
            let entry = raw.entry(node.item).or_insert(Fixed64::ZERO);
            *entry = entry.saturating_add(node.target_rate);
        }
    }

    tracing::debug!(
        recipe = root_recipe.0,
        nodes = node_count,
        machines = %total_machines,
        power_kw = %total_power,
        "production chain resolved"
    );

    Ok(CalculationResult {
        root,
        total_machines,
        total_power,
        raw_materials: raw
            .into_iter()
            .map(|(item, rate)| RawDemand { item, rate })
            .collect(),
        node_count,
    })
}

/// Resolve one root under several independently built settings objects,
/// e.g. to compare what-if variants. Runs on the rayon pool with the
/// `parallel` feature.
pub fn resolve_variants(
    root_recipe: RecipeId,
    target_rate: Fixed64,
    catalog: &Catalog,
    variants: &[Settings],
    overrides: &NodeOverrides,
) -> Result<Vec<CalculationResult>, ResolveError> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        variants
            .par_iter()
            .map(|settings| resolve(root_recipe, target_rate, catalog, settings, overrides))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        variants
            .iter()
            .map(|settings| resolve(root_recipe, target_rate, catalog, settings, overrides))
            .collect()
    }
}

/// Identifier of the root node for `recipe`.
pub fn root_node_id(recipe: RecipeId) -> NodeId {
    let mut h = NodeKeyHash::new();
    h.write_u8(TAG_ROOT);
    h.write_u32(recipe.0);
    h.finish()
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Where an input comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Recipe(RecipeId),
    Raw,
}

fn child_node_id(parent: NodeId, item: ItemId, occurrence: u32, source: Source) -> NodeId {
    let mut h = NodeKeyHash::new();
    h.write_u64(parent.0);
    h.write_u32(item.0);
    h.write_u32(occurrence);
    match source {
        Source::Recipe(recipe) => {
            h.write_u8(TAG_RECIPE);
            h.write_u32(recipe.0);
        }
        Source::Raw => h.write_u8(TAG_RAW),
    }
    h.finish()
}

/// How fast a node runs, before recursing into its inputs.
struct Throughput {
    booster: BoosterConfig,
    multipliers: ActiveMultipliers,
    machine_count: Fixed64,
    /// Input lines that are actually consumed, with their rates.
    inputs: Vec<(usize, Fixed64)>,
}

/// Per-call resolution state. Dropped when the call returns.
struct Resolver<'a> {
    catalog: &'a Catalog,
    settings: &'a Settings,
    overrides: &'a NodeOverrides,
    belt_capacity: Fixed64,
    /// Items on the current depth-first path.
    path: HashSet<ItemId>,
}

impl<'a> Resolver<'a> {
    fn new(catalog: &'a Catalog, settings: &'a Settings, overrides: &'a NodeOverrides) -> Self {
        Self {
            catalog,
            settings,
            overrides,
            belt_capacity: settings.belt.capacity(),
            path: HashSet::new(),
        }
    }

    fn resolve_recipe(&mut self, recipe: &'a Recipe, demanded: ItemId, target_rate: Fixed64, id: NodeId) -> ResolvedNode {
        let node_override = self.overrides.get(&id).copied().unwrap_or_default();
        let rank = node_override
            .machine_rank
            .unwrap_or_else(|| self.settings.machine_rank(recipe.production_type));
        let Some(machine) = self.machine_for(recipe, rank) else {
            return unresolved_leaf(recipe, demanded, target_rate, id);
        };

        let throughput = match recipe.production_type {
            ProductionType::PhotonGeneration => self.photon_throughput(recipe, target_rate, machine, &node_override),
            _ => self.standard_throughput(recipe, target_rate, machine, &node_override),
        };

        let main = recipe.main_output();
        let main_count = Fixed64::from_num(main.count);
        let byproducts: Vec<ItemRate> = recipe
            .byproducts()
            .iter()
            .map(|line| ItemRate {
                item: line.item,
                rate: div_saturating(target_rate.saturating_mul_int(line.count as i64), main_count),
            })
            .collect();

        let inputs: Vec<ItemRate> = throughput
            .inputs
            .iter()
            .map(|&(index, rate)| ItemRate {
                item: recipe.inputs[index].item,
                rate,
            })
            .collect();

        // Children see this node's items on the path.
        let inserted_main = self.path.insert(main.item);
        let inserted_demanded = self.path.insert(demanded);
        let children = inputs
            .iter()
            .enumerate()
            .map(|(position, input)| {
                let occurrence = inputs[..position]
                    .iter()
                    .filter(|earlier| earlier.item == input.item)
                    .count() as u32;
                let line = &recipe.inputs[throughput.inputs[position].0];
                self.resolve_input(line, input.rate, id, occurrence)
            })
            .collect();
        if inserted_main {
            self.path.remove(&main.item);
        }
        if inserted_demanded {
            self.path.remove(&demanded);
        }

        let lines = (inputs.len() + recipe.outputs.len()) as u32;
        let sorter_count = throughput.machine_count_ceil().saturating_mul(lines);
        let (power, orbital_power) = self.node_power(machine, &throughput, sorter_count);

        let input_rates: Vec<Fixed64> = inputs.iter().map(|input| input.rate).collect();
        let output_rates: Vec<Fixed64> = std::iter::once(target_rate)
            .chain(byproducts.iter().map(|b| b.rate))
            .collect();
        let conveyors = conveyor_usage(&input_rates, &output_rates, self.belt_capacity);

        ResolvedNode {
            id,
            item: main.item,
            recipe: Some(recipe.id),
            machine: Some(machine.id),
            production_type: Some(recipe.production_type),
            target_rate,
            machine_count: throughput.machine_count,
            booster: throughput.booster,
            multipliers: throughput.multipliers,
            power,
            orbital_power,
            sorter_count,
            conveyors,
            inputs,
            byproducts,
            children,
            is_raw_material: false,
        }
    }

    fn resolve_input(&mut self, line: &RecipeLine, rate: Fixed64, parent: NodeId, occurrence: u32) -> ResolvedNode {
        let source = self.source_for(line);
        let id = child_node_id(parent, line.item, occurrence, source);
        let recipe = match source {
            Source::Recipe(recipe_id) => self.catalog.recipe(recipe_id),
            Source::Raw => None,
        };
        let Some(recipe) = recipe else {
            return raw_leaf(line.item, rate, id);
        };

        // A recipe may be chosen for one of its secondary outputs; scale the
        // demanded rate to its main output.
        let main_target = match recipe.output_for(line.item) {
            Some(produced) if produced.item != recipe.main_output().item => div_saturating(
                rate.saturating_mul_int(recipe.main_output().count as i64),
                Fixed64::from_num(produced.count),
            ),
            _ => rate,
        };
        self.resolve_recipe(recipe, line.item, main_target, id)
    }

    fn source_for(&self, line: &RecipeLine) -> Source {
        let item = line.item;
        let choice = self.settings.alternative(item);
        if choice == Some(RecipeChoice::Mined) {
            return Source::Raw;
        }
        if self.path.contains(&item) {
            tracing::warn!(item = item.0, "recipe cycle detected, treating input as raw");
            return Source::Raw;
        }
        if let Some(RecipeChoice::Recipe(recipe_id)) = choice {
            let produces = self
                .catalog
                .recipe(recipe_id)
                .is_some_and(|recipe| recipe.output_for(item).is_some());
            if produces {
                return Source::Recipe(recipe_id);
            }
            tracing::warn!(
                item = item.0,
                recipe = recipe_id.0,
                "alternative recipe does not produce item, using default"
            );
        }
        if line.raw {
            return Source::Raw;
        }
        self.catalog
            .default_recipe_for(item)
            .map(Source::Recipe)
            .unwrap_or(Source::Raw)
    }

    fn machine_for(&self, recipe: &Recipe, rank: MachineRank) -> Option<&'a Machine> {
        let machine = self.catalog.machine_for(recipe.production_type, rank);
        if machine.is_none() {
            tracing::warn!(
                recipe = recipe.id.0,
                production_type = ?recipe.production_type,
                rank = ?rank,
                "no machine for production type and rank, treating node as raw"
            );
        }
        machine
    }

    fn standard_throughput(
        &self,
        recipe: &Recipe,
        target_rate: Fixed64,
        machine: &Machine,
        node_override: &NodeOverride,
    ) -> Throughput {
        let config = node_override.booster.unwrap_or(self.settings.booster);
        let allowed = recipe.productive;
        let multipliers = active_multipliers(&config, &self.settings.booster_multipliers, allowed);
        let booster = if is_inert(&config, allowed) {
            BoosterConfig::none()
        } else {
            config
        };

        let main_count = Fixed64::from_num(recipe.main_output().count);
        let per_machine = div_saturating(
            main_count
                .saturating_mul(machine.speed)
                .saturating_mul(multipliers.speed)
                .saturating_mul(multipliers.production),
            recipe.cycle_time,
        );
        let machine_count = div_saturating(target_rate, per_machine);

        // Cycles per second across all machines; independent of machine speed.
        let cycles = div_saturating(target_rate, main_count.saturating_mul(multipliers.production));
        let inputs = recipe
            .inputs
            .iter()
            .enumerate()
            .map(|(index, line)| (index, cycles.saturating_mul_int(line.count as i64)))
            .collect();

        Throughput {
            booster,
            multipliers,
            machine_count,
            inputs,
        }
    }

    /// Ray Receivers in photon mode. The booster applies to graviton lenses
    /// (longer lens lifetime) and never changes receiver throughput.
    fn photon_throughput(
        &self,
        recipe: &Recipe,
        target_rate: Fixed64,
        machine: &Machine,
        node_override: &NodeOverride,
    ) -> Throughput {
        let photon = &self.settings.photon;
        let config = node_override
            .booster
            .map(|b| b.with_mode(BoosterMode::Speed))
            .unwrap_or_else(|| photon.lens_booster());
        let lens = photon.use_graviton_lens;
        let booster = if lens && !config.is_none() {
            config
        } else {
            BoosterConfig::none()
        };

        let output_multiplier = Fixed64::from_num(if lens { 2 } else { 1 });
        let per_receiver = div_saturating(
            Fixed64::from_num(recipe.main_output().count)
                .saturating_mul(machine.speed)
                .saturating_mul(output_multiplier)
                .saturating_mul(PhotonSettings::CONTINUOUS_RECEPTION),
            recipe.cycle_time,
        );
        let receivers = div_saturating(target_rate, per_receiver);

        let inputs = if lens {
            let bonus = effective_bonuses(&booster, &self.settings.booster_multipliers).speed;
            let lifetime = Fixed64::from_num(LENS_LIFETIME_SECONDS).saturating_mul(Fixed64::ONE.saturating_add(bonus));
            recipe
                .inputs
                .iter()
                .enumerate()
                .map(|(index, line)| {
                    let rate = div_saturating(receivers.saturating_mul_int(line.count as i64), lifetime);
                    (index, rate)
                })
                .collect()
        } else {
            Vec::new()
        };

        Throughput {
            booster,
            multipliers: ActiveMultipliers::NEUTRAL,
            machine_count: receivers,
            inputs,
        }
    }

    fn node_power(&self, machine: &Machine, throughput: &Throughput, sorter_count: u32) -> (NodePower, Fixed64) {
        let sorters = self
            .settings
            .sorter
            .power_kw
            .saturating_mul_int(sorter_count as i64);
        let (machines, orbital) = if machine.draws_orbital_power() {
            let drawn = throughput
                .machine_count
                .saturating_mul(machine.work_power_kw());
            (
                Fixed64::ZERO,
                div_saturating(drawn, self.settings.photon.transmission_efficiency()),
            )
        } else if machine.is_power_consumer {
            let per_machine = machine
                .work_power_kw()
                .saturating_mul(Fixed64::ONE.saturating_add(throughput.booster.power_increase));
            (
                throughput.machine_count.saturating_mul(per_machine),
                Fixed64::ZERO,
            )
        } else {
            (Fixed64::ZERO, Fixed64::ZERO)
        };
        (
            NodePower {
                machines,
                sorters,
                total: machines.saturating_add(sorters),
            },
            orbital,
        )
    }
}

impl Throughput {
    fn machine_count_ceil(&self) -> u32 {
        ceil_count(self.machine_count)
    }
}

/// A recipe with no machine at the chosen rank. It stays in the tree
/// unexpanded and counts as raw demand for the item it was asked for.
fn unresolved_leaf(recipe: &Recipe, demanded: ItemId, target_rate: Fixed64, id: NodeId) -> ResolvedNode {
    let main = recipe.main_output();
    let rate = match recipe.output_for(demanded) {
        Some(line) if line.item != main.item => div_saturating(
            target_rate.saturating_mul_int(line.count as i64),
            Fixed64::from_num(main.count),
        ),
        _ => target_rate,
    };
    ResolvedNode {
        recipe: Some(recipe.id),
        production_type: Some(recipe.production_type),
        ..raw_leaf(demanded, rate, id)
    }
}

fn raw_leaf(item: ItemId, rate: Fixed64, id: NodeId) -> ResolvedNode {
    ResolvedNode {
        id,
        item,
        recipe: None,
        machine: None,
        production_type: None,
        target_rate: rate,
        machine_count: Fixed64::ZERO,
        booster: BoosterConfig::none(),
        multipliers: ActiveMultipliers::NEUTRAL,
        power: NodePower::default(),
        orbital_power: Fixed64::ZERO,
        sorter_count: 0,
        conveyors: ConveyorUsage::default(),
        inputs: Vec::new(),
        byproducts: Vec::new(),
        children: Vec::new(),
        is_raw_material: true,
    }
}

/// Belts per side: each line gets `ceil(rate / capacity)` belts.
fn conveyor_usage(inputs: &[Fixed64], outputs: &[Fixed64], capacity: Fixed64) -> ConveyorUsage {
    let side = |rates: &[Fixed64]| {
        let mut belts = 0u32;
        let mut flow = Fixed64::ZERO;
        for &rate in rates {
            belts = belts.saturating_add(ceil_count(div_saturating(rate, capacity)));
            flow = flow.saturating_add(rate);
        }
        let utilization = percent_of(flow, capacity.saturating_mul_int(belts as i64));
        (belts, flow, utilization)
    };
    let (in_belts, in_flow, in_util) = side(inputs);
    let (out_belts, out_flow, out_util) = side(outputs);

    let (bottleneck, saturation) = if in_flow <= Fixed64::ZERO && out_flow <= Fixed64::ZERO {
        (Bottleneck::None, Fixed64::ZERO)
    } else if in_util > out_util {
        (Bottleneck::Input, in_util)
    } else {
        (Bottleneck::Output, out_util)
    };

    ConveyorUsage {
        inputs: in_belts,
        outputs: out_belts,
        total: in_belts.saturating_add(out_belts),
        saturation,
        bottleneck,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{BeltConfig, BeltTier, BoosterTier, SorterConfig, SorterTier};
    use crate::test_utils::*;

    fn resolve_default(recipe: RecipeId, rate: f64) -> CalculationResult {
        resolve(recipe, fixed(rate), &fixture_catalog(), &Settings::default(), &NodeOverrides::new()).unwrap()
    }

    #[test]
    fn unknown_root_is_an_error() {
        let err = resolve(
            RecipeId(9999),
            fixed(1.0),
            &fixture_catalog(),
            &Settings::default(),
            &NodeOverrides::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ResolveError::UnknownRecipe(RecipeId(9999))));
    }

    #[test]
    fn single_smelter_chain() {
        let result = resolve_default(IRON_INGOT_RECIPE, 3.0);
        let root = &result.root;
        assert_eq!(root.item, IRON_INGOT);
        assert_eq!(root.machine, Some(ARC_SMELTER));
        assert_eq!(root.machine_count, fixed(3.0));
        assert_eq!(root.inputs, vec![ItemRate { item: IRON_ORE, rate: fixed(3.0) }]);
        assert_eq!(root.children.len(), 1);
        let ore = &root.children[0];
        assert!(ore.is_raw_material);
        assert_eq!(ore.item, IRON_ORE);
        assert_eq!(ore.target_rate, fixed(3.0));
        assert!(ore.recipe.is_none() && ore.machine.is_none());
        assert_eq!(result.raw_demand(IRON_ORE), fixed(3.0));
        assert_eq!(result.node_count, 2);
    }

    #[test]
    fn machine_speed_divides_machine_count() {
        // Gears: 1 s per gear, Assembler Mk.I speed 0.75.
        let result = resolve_default(GEAR_RECIPE, 3.0);
        assert_fixed_approx(result.root.machine_count, 4.0, 1e-6);

        let mut settings = Settings::default();
        settings
            .machine_ranks
            .insert(ProductionType::Assemble, MachineRank::Mk3);
        let fast = resolve(GEAR_RECIPE, fixed(3.0), &fixture_catalog(), &settings, &NodeOverrides::new()).unwrap();
        assert_fixed_approx(fast.root.machine_count, 2.0, 1e-6);
        // Inputs do not depend on machine speed.
        assert_eq!(fast.root.inputs, result.root.inputs);
    }

    #[test]
    fn multi_level_input_rates() {
        // Circuit board: 2 iron ingot + 1 copper ingot -> 2 boards, 1 s.
        let result = resolve_default(CIRCUIT_RECIPE, 4.0);
        let root = &result.root;
        assert_eq!(root.inputs[0], ItemRate { item: IRON_INGOT, rate: fixed(4.0) });
        assert_eq!(root.inputs[1], ItemRate { item: COPPER_INGOT, rate: fixed(2.0) });
        assert_eq!(root.children[0].recipe, Some(IRON_INGOT_RECIPE));
        assert_eq!(root.children[1].recipe, Some(COPPER_INGOT_RECIPE));
        assert_eq!(result.raw_demand(IRON_ORE), fixed(4.0));
        assert_eq!(result.raw_demand(COPPER_ORE), fixed(2.0));
    }

    #[test]
    fn byproduct_rate_follows_output_ratio() {
        // Plasma refining: 2 crude -> 2 refined oil + 1 hydrogen.
        let result = resolve_default(PLASMA_REFINING_RECIPE, 3.0);
        assert_eq!(
            result.root.byproducts,
            vec![ItemRate { item: HYDROGEN, rate: fixed(1.5) }]
        );
    }

    #[test]
    fn speed_booster_reduces_machines_not_inputs() {
        let mut settings = Settings::default();
        settings.booster = BoosterConfig::for_tier(BoosterTier::Mk3, BoosterMode::Speed);
        let base = resolve_default(CIRCUIT_RECIPE, 4.0);
        let boosted = resolve(CIRCUIT_RECIPE, fixed(4.0), &fixture_catalog(), &settings, &NodeOverrides::new()).unwrap();
        assert_fixed_approx(boosted.root.machine_count, base.root.machine_count.to_num::<f64>() / 2.0, 1e-6);
        assert_eq!(boosted.root.inputs, base.root.inputs);
        assert_eq!(boosted.root.multipliers.speed, fixed(2.0));
    }

    #[test]
    fn production_booster_reduces_inputs() {
        let mut settings = Settings::default();
        settings.booster = BoosterConfig::for_tier(BoosterTier::Mk3, BoosterMode::Production);
        let result = resolve(CIRCUIT_RECIPE, fixed(5.0), &fixture_catalog(), &settings, &NodeOverrides::new()).unwrap();
        // 5 boards / (2 * 1.25) = 2 cycles per second.
        assert_eq!(result.root.inputs[0].rate, fixed(4.0));
        assert_eq!(result.root.inputs[1].rate, fixed(2.0));
        assert_eq!(result.root.booster.mode, BoosterMode::Production);
    }

    #[test]
    fn production_mode_on_unproductive_recipe_is_inert() {
        let mut settings = Settings::default();
        settings.booster = BoosterConfig::for_tier(BoosterTier::Mk3, BoosterMode::Production);
        let result = resolve(IRON_INGOT_RECIPE, fixed(2.0), &fixture_catalog(), &settings, &NodeOverrides::new()).unwrap();
        assert_eq!(result.root.multipliers, ActiveMultipliers::NEUTRAL);
        assert!(result.root.booster.is_none());
        assert_eq!(result.root.inputs[0].rate, fixed(2.0));
        assert_eq!(result.root.power.machines, fixed(720.0));
    }

    #[test]
    fn mined_sentinel_forces_raw() {
        let mut settings = Settings::default();
        settings.alternatives.insert(IRON_INGOT, RecipeChoice::Mined);
        let result = resolve(GEAR_RECIPE, fixed(1.0), &fixture_catalog(), &settings, &NodeOverrides::new()).unwrap();
        let ingot = &result.root.children[0];
        assert!(ingot.is_raw_material);
        assert_eq!(ingot.item, IRON_INGOT);
        assert_eq!(result.raw_demand(IRON_INGOT), fixed(1.0));
        assert_eq!(result.raw_demand(IRON_ORE), Fixed64::ZERO);
    }

    #[test]
    fn explicit_alternative_recipe_is_used() {
        let mut settings = Settings::default();
        settings
            .alternatives
            .insert(HYDROGEN, RecipeChoice::Recipe(PLASMA_REFINING_RECIPE));
        // Deuterium: 10 hydrogen -> 5 deuterium.
        let result = resolve(DEUTERIUM_RECIPE, fixed(1.0), &fixture_catalog(), &settings, &NodeOverrides::new()).unwrap();
        let hydrogen = &result.root.children[0];
        assert_eq!(hydrogen.recipe, Some(PLASMA_REFINING_RECIPE));
        // 2 hydrogen/s needed; refining yields 1 hydrogen per 2 refined oil.
        assert_eq!(hydrogen.item, REFINED_OIL);
        assert_eq!(hydrogen.target_rate, fixed(4.0));
        assert_eq!(hydrogen.byproducts[0].rate, fixed(2.0));
    }

    #[test]
    fn alternative_that_does_not_produce_item_falls_back() {
        let mut settings = Settings::default();
        settings
            .alternatives
            .insert(IRON_INGOT, RecipeChoice::Recipe(GEAR_RECIPE));
        let result = resolve(GEAR_RECIPE, fixed(1.0), &fixture_catalog(), &settings, &NodeOverrides::new()).unwrap();
        assert_eq!(result.root.children[0].recipe, Some(IRON_INGOT_RECIPE));
    }

    #[test]
    fn raw_flagged_input_line_is_a_leaf() {
        // Plastic marks energetic graphite as a raw input line.
        let result = resolve_default(PLASTIC_RECIPE, 1.0);
        let graphite = result
            .root
            .children
            .iter()
            .find(|c| c.item == GRAPHITE)
            .unwrap();
        assert!(graphite.is_raw_material);
    }

    #[test]
    fn missing_machine_degrades_to_raw_leaf() {
        let mut settings = Settings::default();
        settings
            .machine_ranks
            .insert(ProductionType::Chemical, MachineRank::Mk2);
        let result = resolve(PLASTIC_RECIPE, fixed(1.0), &fixture_catalog(), &settings, &NodeOverrides::new()).unwrap();
        let root = &result.root;
        assert!(root.machine.is_none());
        assert_eq!(root.recipe, Some(PLASTIC_RECIPE));
        assert_eq!(root.production_type, Some(ProductionType::Chemical));
        assert_eq!(root.machine_count, Fixed64::ZERO);
        assert_eq!(root.power, NodePower::default());
        assert_eq!(root.sorter_count, 0);
        assert!(root.is_raw_material);
        assert!(root.children.is_empty() && root.inputs.is_empty());
        assert_eq!(result.raw_materials, vec![RawDemand { item: PLASTIC, rate: fixed(1.0) }]);
        assert_eq!(result.node_count, 1);
    }

    #[test]
    fn machine_less_child_is_raw_for_its_parent() {
        // Refineries only exist at Mk1.
        let mut settings = Settings::default();
        settings
            .machine_ranks
            .insert(ProductionType::Refine, MachineRank::Mk2);
        let result = resolve(PLASTIC_RECIPE, fixed(1.0), &fixture_catalog(), &settings, &NodeOverrides::new()).unwrap();
        let refined = result
            .root
            .children
            .iter()
            .find(|c| c.item == REFINED_OIL)
            .unwrap();
        assert!(refined.is_raw_material);
        assert_eq!(refined.recipe, Some(PLASMA_REFINING_RECIPE));
        assert_eq!(result.raw_demand(REFINED_OIL), refined.target_rate);
        assert_eq!(result.raw_demand(CRUDE_OIL), Fixed64::ZERO);
        // The plant itself still runs.
        assert!(result.root.machine.is_some());
    }

    #[test]
    fn node_override_wins_for_one_node() {
        let catalog = fixture_catalog();
        let base = resolve_default(CIRCUIT_RECIPE, 4.0);
        let iron_node = base.root.children[0].id;

        let mut overrides = NodeOverrides::new();
        overrides.insert(
            iron_node,
            NodeOverride {
                booster: Some(BoosterConfig::for_tier(BoosterTier::Mk3, BoosterMode::Speed)),
                machine_rank: Some(MachineRank::Mk2),
            },
        );
        let result = resolve(CIRCUIT_RECIPE, fixed(4.0), &catalog, &Settings::default(), &overrides).unwrap();
        let iron = &result.root.children[0];
        assert_eq!(iron.id, iron_node);
        assert_eq!(iron.machine, Some(PLANE_SMELTER));
        // Plane smelter speed 2, booster x2: 4 ingots/s on 1 machine.
        assert_eq!(iron.machine_count, fixed(1.0));
        // Siblings and root keep global settings.
        assert_eq!(result.root.children[1].machine, Some(ARC_SMELTER));
        assert_eq!(result.root.multipliers, ActiveMultipliers::NEUTRAL);
    }

    #[test]
    fn node_ids_are_stable_across_settings() {
        let catalog = fixture_catalog();
        let ids = |settings: &Settings| -> Vec<NodeId> {
            resolve(EM_MATRIX_RECIPE, fixed(1.0), &catalog, settings, &NodeOverrides::new())
                .unwrap()
                .iter()
                .map(|n| n.id)
                .collect()
        };
        let base = ids(&Settings::default());

        let mut tuned = Settings::default();
        tuned.booster = BoosterConfig::for_tier(BoosterTier::Mk2, BoosterMode::Production);
        tuned.belt = BeltConfig::for_tier(BeltTier::Mk3);
        tuned.sorter = SorterConfig::for_tier(SorterTier::Mk3);
        tuned
            .machine_ranks
            .insert(ProductionType::Assemble, MachineRank::Mk2);
        assert_eq!(ids(&tuned), base);
    }

    #[test]
    fn node_ids_change_with_shape() {
        let catalog = fixture_catalog();
        let base = resolve_default(GEAR_RECIPE, 1.0);
        let mut settings = Settings::default();
        settings.alternatives.insert(IRON_INGOT, RecipeChoice::Mined);
        let mined = resolve(GEAR_RECIPE, fixed(1.0), &catalog, &settings, &NodeOverrides::new()).unwrap();
        assert_eq!(base.root.id, mined.root.id);
        assert_ne!(base.root.children[0].id, mined.root.children[0].id);
    }

    #[test]
    fn node_ids_are_unique_within_tree() {
        let result = resolve_default(EM_MATRIX_RECIPE, 1.0);
        let ids: HashSet<NodeId> = result.iter().map(|n| n.id).collect();
        assert_eq!(ids.len(), result.node_count);
    }

    #[test]
    fn cycle_fails_closed_to_raw_leaf() {
        let catalog = cyclic_catalog();
        let result = resolve(RecipeId(1), fixed(1.0), &catalog, &Settings::default(), &NodeOverrides::new()).unwrap();
        // A <- B <- A: the second A becomes a raw leaf.
        assert_eq!(result.node_count, 3);
        let leaf = &result.root.children[0].children[0];
        assert!(leaf.is_raw_material);
        assert_eq!(leaf.item, ItemId(1));
    }

    #[test]
    fn conveyor_usage_per_line() {
        // Mk.I belt carries 6/s.
        let usage = conveyor_usage(&[fixed(8.0), fixed(2.0)], &[fixed(5.0)], fixed(6.0));
        assert_eq!(usage.inputs, 3);
        assert_eq!(usage.outputs, 1);
        assert_eq!(usage.total, 4);
        // Inputs: 10 / 18; outputs: 5 / 6.
        assert_eq!(usage.bottleneck, Bottleneck::Output);
        assert_fixed_approx(usage.saturation, 500.0 / 6.0, 1e-6);
    }

    #[test]
    fn conveyor_usage_input_bottleneck() {
        let usage = conveyor_usage(&[fixed(6.0)], &[fixed(1.0)], fixed(6.0));
        assert_eq!(usage.bottleneck, Bottleneck::Input);
        assert_eq!(usage.saturation, fixed(100.0));
    }

    #[test]
    fn conveyor_usage_zero_capacity() {
        let usage = conveyor_usage(&[fixed(6.0)], &[fixed(1.0)], Fixed64::ZERO);
        assert_eq!(usage.total, 0);
        assert_eq!(usage.saturation, Fixed64::ZERO);
        let idle = conveyor_usage(&[], &[Fixed64::ZERO], fixed(6.0));
        assert_eq!(idle.bottleneck, Bottleneck::None);
    }

    #[test]
    fn stacked_belts_need_fewer_conveyors() {
        let mut settings = Settings::default();
        settings.belt.stack_count = 4;
        let result = resolve(IRON_INGOT_RECIPE, fixed(12.0), &fixture_catalog(), &settings, &NodeOverrides::new()).unwrap();
        assert_eq!(result.root.conveyors.inputs, 1);
        assert_eq!(result.root.conveyors.outputs, 1);
        assert_eq!(result.root.conveyors.saturation, fixed(50.0));

        settings.belt.stack_count = 0;
        let fallback = resolve(IRON_INGOT_RECIPE, fixed(12.0), &fixture_catalog(), &settings, &NodeOverrides::new()).unwrap();
        assert_eq!(fallback.root.conveyors.inputs, 2);
    }

    #[test]
    fn sorters_per_machine_line() {
        // 2.5 assemblers (rounded to 3) x (2 inputs + 1 output).
        let result = resolve_default(CIRCUIT_RECIPE, 3.75);
        assert_fixed_approx(result.root.machine_count, 2.5, 1e-6);
        assert_eq!(result.root.machines_ceil(), 3);
        assert_eq!(result.root.sorter_count, 9);
        assert_eq!(result.root.power.sorters, fixed(9.0 * 18.0));
    }

    #[test]
    fn power_increase_applies_to_machines() {
        let mut settings = Settings::default();
        settings.booster = BoosterConfig::for_tier(BoosterTier::Mk1, BoosterMode::Speed);
        let result = resolve(IRON_INGOT_RECIPE, fixed(2.5), &fixture_catalog(), &settings, &NodeOverrides::new()).unwrap();
        // 2 machines at 360 kW * 1.3.
        assert_fixed_approx(result.root.machine_count, 2.0, 1e-6);
        assert_fixed_approx(result.root.power.machines, 936.0, 1e-3);
    }

    #[test]
    fn photon_generation_without_lens() {
        let result = resolve_default(PHOTON_RECIPE, 0.5);
        let root = &result.root;
        assert_eq!(root.machine, Some(RAY_RECEIVER));
        assert!(root.children.is_empty());
        assert!(root.inputs.is_empty());
        // 1 photon per 4 s per receiver.
        assert_eq!(root.machine_count, fixed(2.0));
        assert_eq!(root.power.machines, Fixed64::ZERO);
        // 2 receivers at 15 MW over 30% transmission efficiency.
        assert_fixed_approx(root.orbital_power, 100_000.0, 1e-2);
        // 2 receivers x 1 output line.
        assert_eq!(root.sorter_count, 2);
    }

    #[test]
    fn photon_generation_with_lens() {
        let mut settings = Settings::default();
        settings.photon.use_graviton_lens = true;
        settings.photon.lens_booster = BoosterConfig::for_tier(BoosterTier::Mk3, BoosterMode::Production);
        let result = resolve(PHOTON_RECIPE, fixed(0.5), &fixture_catalog(), &settings, &NodeOverrides::new()).unwrap();
        let root = &result.root;
        // Lens doubles output.
        assert_eq!(root.machine_count, fixed(1.0));
        assert_eq!(root.booster.mode, BoosterMode::Speed);
        assert_eq!(root.multipliers, ActiveMultipliers::NEUTRAL);
        // Lens lasts 120 s * 2 with the Mk.III booster.
        assert_eq!(root.inputs.len(), 1);
        assert_fixed_approx(root.inputs[0].rate, 1.0 / 240.0, 1e-6);
        assert_eq!(root.children[0].item, GRAVITON_LENS);
        assert_eq!(root.sorter_count, 2);
    }

    #[test]
    fn lens_toggle_keeps_surrounding_ids() {
        let catalog = fixture_catalog();
        let off = resolve(PHOTON_RECIPE, fixed(0.5), &catalog, &Settings::default(), &NodeOverrides::new()).unwrap();
        let mut settings = Settings::default();
        settings.photon.use_graviton_lens = true;
        let on = resolve(PHOTON_RECIPE, fixed(0.5), &catalog, &settings, &NodeOverrides::new()).unwrap();
        assert_eq!(off.root.id, on.root.id);
        assert!(on.node_count > off.node_count);
    }

    #[test]
    fn iter_is_preorder() {
        let result = resolve_default(CIRCUIT_RECIPE, 2.0);
        let items: Vec<ItemId> = result.iter().map(|n| n.item).collect();
        assert_eq!(items, vec![CIRCUIT_BOARD, IRON_INGOT, IRON_ORE, COPPER_INGOT, COPPER_ORE]);
    }

    #[test]
    fn zero_target_rate_yields_zeroes() {
        let result = resolve_default(CIRCUIT_RECIPE, 0.0);
        assert_eq!(result.total_machines, Fixed64::ZERO);
        assert_eq!(result.total_power, Fixed64::ZERO);
        assert_eq!(result.root.conveyors.bottleneck, Bottleneck::None);
    }

    #[test]
    fn resolve_variants_matches_individual_calls() {
        let catalog = fixture_catalog();
        let mut boosted = Settings::default();
        boosted.booster = BoosterConfig::for_tier(BoosterTier::Mk2, BoosterMode::Speed);
        let variants = vec![Settings::default(), boosted.clone()];
        let results = resolve_variants(GEAR_RECIPE, fixed(2.0), &catalog, &variants, &NodeOverrides::new()).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[1],
            resolve(GEAR_RECIPE, fixed(2.0), &catalog, &boosted, &NodeOverrides::new()).unwrap()
        );
    }
}
