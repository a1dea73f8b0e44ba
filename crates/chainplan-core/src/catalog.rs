//! The read-only game catalog: items, machines, recipes, and the indexes the
//! resolver needs (item → candidate recipes, (type, rank) → machine).
//!
//! Built with [`CatalogBuilder`], validated and frozen by
//! [`CatalogBuilder::build`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::fixed::{energy_per_tick_to_kw, Fixed64};
use crate::id::{ItemId, MachineId, RecipeId};
use crate::settings::SorterTier;

// ---------------------------------------------------------------------------
// Production types and machine ranks
// ---------------------------------------------------------------------------

/// Tier of machine chosen for a production type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MachineRank {
    Mk1,
    Mk2,
    Mk3,
    Mk4,
}

/// What kind of building runs a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProductionType {
    Smelt,
    Assemble,
    Chemical,
    Research,
    Refine,
    Particle,
    Fractionate,
    /// Ray Receiver photon mode. Draws orbital power, not grid power.
    PhotonGeneration,
}

impl ProductionType {
    pub const ALL: [ProductionType; 8] = [
        ProductionType::Smelt,
        ProductionType::Assemble,
        ProductionType::Chemical,
        ProductionType::Research,
        ProductionType::Refine,
        ProductionType::Particle,
        ProductionType::Fractionate,
        ProductionType::PhotonGeneration,
    ];

    /// Machine ranks that exist for this production type.
    pub fn allowed_ranks(self) -> &'static [MachineRank] {
        use MachineRank::*;
        match self {
            ProductionType::Smelt => &[Mk1, Mk2, Mk3],
            ProductionType::Assemble => &[Mk1, Mk2, Mk3, Mk4],
            ProductionType::Chemical => &[Mk1, Mk2],
            ProductionType::Research => &[Mk1, Mk2],
            ProductionType::Refine
            | ProductionType::Particle
            | ProductionType::Fractionate
            | ProductionType::PhotonGeneration => &[Mk1],
        }
    }

    pub fn allows_rank(self, rank: MachineRank) -> bool {
        self.allowed_ranks().contains(&rank)
    }
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// How a raw material is extracted when the tree needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RawSource {
    /// Solid ore mined from veins.
    Vein,
    WaterPump,
    OilExtractor,
    /// Gas giant collectors. Zero grid power.
    OrbitalCollector,
}

/// An item definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub raw_source: Option<RawSource>,
}

/// A machine definition. Energies are joules per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub id: MachineId,
    pub name: String,
    pub production_type: ProductionType,
    pub rank: MachineRank,
    /// Crafting speed factor (1.0 = recipe cycle time as written).
    pub speed: Fixed64,
    pub idle_energy_per_tick: Fixed64,
    pub work_energy_per_tick: Fixed64,
    pub exchange_energy_per_tick: Fixed64,
    pub is_power_consumer: bool,
    pub is_power_exchanger: bool,
}

impl Machine {
    /// Working power draw in kW.
    pub fn work_power_kw(&self) -> Fixed64 {
        energy_per_tick_to_kw(self.work_energy_per_tick)
    }

    /// Idle power draw in kW.
    pub fn idle_power_kw(&self) -> Fixed64 {
        energy_per_tick_to_kw(self.idle_energy_per_tick)
    }

    /// Ray Receivers are fed by the Dyson sphere rather than the local grid.
    pub fn draws_orbital_power(&self) -> bool {
        self.production_type == ProductionType::PhotonGeneration
    }
}

/// One input or output line of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeLine {
    pub item: ItemId,
    pub count: u32,
    /// Input treated as mined unless an alternative explicitly picks a recipe.
    #[serde(default)]
    pub raw: bool,
}

impl RecipeLine {
    pub fn new(item: ItemId, count: u32) -> Self {
        Self {
            item,
            count,
            raw: false,
        }
    }

    pub fn raw(item: ItemId, count: u32) -> Self {
        Self {
            item,
            count,
            raw: true,
        }
    }
}

/// A recipe definition. `outputs[0]` is the main output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    pub production_type: ProductionType,
    /// Seconds per crafting cycle at speed 1.
    pub cycle_time: Fixed64,
    pub inputs: Vec<RecipeLine>,
    pub outputs: Vec<RecipeLine>,
    /// Whether production-mode boosting (extra products) is allowed.
    pub productive: bool,
}

impl Recipe {
    /// The output that defines a node's target rate.
    pub fn main_output(&self) -> &RecipeLine {
        &self.outputs[0]
    }

    /// Secondary outputs, in recipe order.
    pub fn byproducts(&self) -> &[RecipeLine] {
        &self.outputs[1..]
    }

    /// The output line for `item`, if this recipe produces it.
    pub fn output_for(&self, item: ItemId) -> Option<&RecipeLine> {
        self.outputs.iter().find(|line| line.item == item)
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for an immutable [`Catalog`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    items: Vec<Item>,
    machines: Vec<Machine>,
    recipes: Vec<Recipe>,
    sorters: Vec<(SorterTier, ItemId)>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_item(&mut self, item: Item) -> ItemId {
        let id = item.id;
        self.items.push(item);
        id
    }

    /// Shorthand for an item without a raw source.
    pub fn item(&mut self, id: u32, name: &str) -> ItemId {
        self.add_item(Item {
            id: ItemId(id),
            name: name.to_string(),
            raw_source: None,
        })
    }

    /// Shorthand for an extractable raw material.
    pub fn raw_item(&mut self, id: u32, name: &str, source: RawSource) -> ItemId {
        self.add_item(Item {
            id: ItemId(id),
            name: name.to_string(),
            raw_source: Some(source),
        })
    }

    pub fn add_machine(&mut self, machine: Machine) -> MachineId {
        let id = machine.id;
        self.machines.push(machine);
        id
    }

    pub fn add_recipe(&mut self, recipe: Recipe) -> RecipeId {
        let id = recipe.id;
        self.recipes.push(recipe);
        id
    }

    /// Register the catalog item that names a sorter tier.
    pub fn add_sorter(&mut self, tier: SorterTier, item: ItemId) {
        self.sorters.push((tier, item));
    }

    /// Validate and freeze.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        let mut items = HashMap::with_capacity(self.items.len());
        for item in self.items {
            let id = item.id;
            if items.insert(id, item).is_some() {
                return Err(CatalogError::DuplicateItem(id));
            }
        }

        let mut machines = HashMap::with_capacity(self.machines.len());
        let mut machine_index = HashMap::new();
        for machine in self.machines {
            let id = machine.id;
            let key = (machine.production_type, machine.rank);
            if machine_index.insert(key, id).is_some() {
                return Err(CatalogError::DuplicateMachineSlot {
                    production_type: key.0,
                    rank: key.1,
                });
            }
            if machines.insert(id, machine).is_some() {
                return Err(CatalogError::DuplicateMachine(id));
            }
        }

        let mut recipes = HashMap::with_capacity(self.recipes.len());
        let mut recipes_for_item: HashMap<ItemId, Vec<RecipeId>> = HashMap::new();
        let mut default_recipe: HashMap<ItemId, RecipeId> = HashMap::new();
        for recipe in self.recipes {
            if recipe.outputs.is_empty() {
                return Err(CatalogError::NoOutputs(recipe.id));
            }
            if recipe.cycle_time <= Fixed64::ZERO {
                return Err(CatalogError::NonPositiveCycleTime(recipe.id));
            }
            for line in recipe.inputs.iter().chain(recipe.outputs.iter()) {
                if !items.contains_key(&line.item) {
                    return Err(CatalogError::InvalidItemRef {
                        recipe: recipe.id,
                        item: line.item,
                    });
                }
            }
            for line in &recipe.outputs {
                let candidates = recipes_for_item.entry(line.item).or_default();
                if !candidates.contains(&recipe.id) {
                    candidates.push(recipe.id);
                }
            }
            default_recipe
                .entry(recipe.main_output().item)
                .or_insert(recipe.id);

            let id = recipe.id;
            if recipes.insert(id, recipe).is_some() {
                return Err(CatalogError::DuplicateRecipe(id));
            }
        }

        let mut sorters = HashMap::new();
        for (tier, item) in self.sorters {
            if !items.contains_key(&item) {
                return Err(CatalogError::InvalidSorterItem(item));
            }
            sorters.insert(tier, item);
        }

        Ok(Catalog {
            items,
            machines,
            recipes,
            machine_index,
            recipes_for_item,
            default_recipe,
            sorters,
        })
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Immutable catalog. Frozen after [`CatalogBuilder::build`]; safe to share
/// across threads.
#[derive(Debug, Clone)]
pub struct Catalog {
    items: HashMap<ItemId, Item>,
    machines: HashMap<MachineId, Machine>,
    recipes: HashMap<RecipeId, Recipe>,
    machine_index: HashMap<(ProductionType, MachineRank), MachineId>,
    recipes_for_item: HashMap<ItemId, Vec<RecipeId>>,
    default_recipe: HashMap<ItemId, RecipeId>,
    sorters: HashMap<SorterTier, ItemId>,
}

impl Catalog {
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn machine(&self, id: MachineId) -> Option<&Machine> {
        self.machines.get(&id)
    }

    pub fn recipe(&self, id: RecipeId) -> Option<&Recipe> {
        self.recipes.get(&id)
    }

    /// Display name of an item, or `"#<id>"` when unknown.
    pub fn item_name(&self, id: ItemId) -> String {
        self.items
            .get(&id)
            .map(|item| item.name.clone())
            .unwrap_or_else(|| format!("#{}", id.0))
    }

    /// The machine that runs `production_type` at `rank`, if the catalog has one.
    pub fn machine_for(&self, production_type: ProductionType, rank: MachineRank) -> Option<&Machine> {
        self.machine_index
            .get(&(production_type, rank))
            .and_then(|id| self.machines.get(id))
    }

    /// Every recipe that outputs `item`, main or secondary, in registration order.
    pub fn recipes_for(&self, item: ItemId) -> &[RecipeId] {
        self.recipes_for_item
            .get(&item)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The first registered recipe whose main output is `item`.
    pub fn default_recipe_for(&self, item: ItemId) -> Option<RecipeId> {
        self.default_recipe.get(&item).copied()
    }

    /// Whether more than one recipe produces `item`.
    pub fn has_alternatives(&self, item: ItemId) -> bool {
        self.recipes_for(item).len() > 1
    }

    /// Catalog item naming a sorter tier.
    pub fn sorter_item(&self, tier: SorterTier) -> Option<&Item> {
        self.sorters.get(&tier).and_then(|id| self.items.get(id))
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn machine_count(&self) -> usize {
        self.machines.len()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate item id {0:?}")]
    DuplicateItem(ItemId),
    #[error("duplicate machine id {0:?}")]
    DuplicateMachine(MachineId),
    #[error("duplicate recipe id {0:?}")]
    DuplicateRecipe(RecipeId),
    #[error("more than one machine registered for {production_type:?} {rank:?}")]
    DuplicateMachineSlot {
        production_type: ProductionType,
        rank: MachineRank,
    },
    #[error("recipe {0:?} has no outputs")]
    NoOutputs(RecipeId),
    #[error("recipe {0:?} has a non-positive cycle time")]
    NonPositiveCycleTime(RecipeId),
    #[error("recipe {recipe:?} references unknown item {item:?}")]
    InvalidItemRef { recipe: RecipeId, item: ItemId },
    #[error("sorter tier references unknown item {0:?}")]
    InvalidSorterItem(ItemId),
}
