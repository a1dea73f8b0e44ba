//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::catalog::*;
use crate::fixed::Fixed64;
use crate::id::*;
use crate::settings::SorterTier;

// ===========================================================================
// Fixed-point helpers
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

#[track_caller]
pub fn assert_fixed_approx(actual: Fixed64, expected: f64, tolerance: f64) {
    let actual = actual.to_num::<f64>();
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected} (+/- {tolerance}), got {actual}"
    );
}

// ===========================================================================
// Fixture ids
// ===========================================================================

pub const WATER: ItemId = ItemId(1000);
pub const IRON_ORE: ItemId = ItemId(1001);
pub const COPPER_ORE: ItemId = ItemId(1002);
pub const COAL: ItemId = ItemId(1006);
pub const CRUDE_OIL: ItemId = ItemId(1007);
pub const IRON_INGOT: ItemId = ItemId(1101);
pub const MAGNET: ItemId = ItemId(1102);
pub const COPPER_INGOT: ItemId = ItemId(1104);
pub const GRAPHITE: ItemId = ItemId(1109);
pub const REFINED_OIL: ItemId = ItemId(1114);
pub const PLASTIC: ItemId = ItemId(1115);
pub const HYDROGEN: ItemId = ItemId(1120);
pub const DEUTERIUM: ItemId = ItemId(1121);
pub const GEAR: ItemId = ItemId(1201);
pub const MAGNETIC_COIL: ItemId = ItemId(1202);
pub const CRITICAL_PHOTON: ItemId = ItemId(1208);
pub const GRAVITON_LENS: ItemId = ItemId(1209);
pub const CIRCUIT_BOARD: ItemId = ItemId(1301);
pub const SORTER_MK1: ItemId = ItemId(2011);
pub const SORTER_MK2: ItemId = ItemId(2012);
pub const SORTER_MK3: ItemId = ItemId(2013);
pub const EM_MATRIX: ItemId = ItemId(6001);

pub const RAY_RECEIVER: MachineId = MachineId(2208);
pub const ARC_SMELTER: MachineId = MachineId(2302);
pub const ASSEMBLER_MK1: MachineId = MachineId(2303);
pub const ASSEMBLER_MK2: MachineId = MachineId(2304);
pub const ASSEMBLER_MK3: MachineId = MachineId(2305);
pub const OIL_REFINERY: MachineId = MachineId(2308);
pub const CHEMICAL_PLANT: MachineId = MachineId(2309);
pub const PARTICLE_COLLIDER: MachineId = MachineId(2310);
pub const PLANE_SMELTER: MachineId = MachineId(2315);
pub const MATRIX_LAB: MachineId = MachineId(2901);

pub const IRON_INGOT_RECIPE: RecipeId = RecipeId(1);
pub const MAGNET_RECIPE: RecipeId = RecipeId(2);
pub const COPPER_INGOT_RECIPE: RecipeId = RecipeId(3);
pub const GEAR_RECIPE: RecipeId = RecipeId(5);
pub const MAGNETIC_COIL_RECIPE: RecipeId = RecipeId(6);
pub const EM_MATRIX_RECIPE: RecipeId = RecipeId(9);
pub const PLASMA_REFINING_RECIPE: RecipeId = RecipeId(16);
pub const GRAPHITE_RECIPE: RecipeId = RecipeId(17);
pub const PLASTIC_RECIPE: RecipeId = RecipeId(23);
pub const DEUTERIUM_RECIPE: RecipeId = RecipeId(40);
pub const CIRCUIT_RECIPE: RecipeId = RecipeId(50);
pub const GRAVITON_LENS_RECIPE: RecipeId = RecipeId(67);
pub const PHOTON_RECIPE: RecipeId = RecipeId(208);

// ===========================================================================
// Definition constructors
// ===========================================================================

/// A grid-powered machine with zero idle draw. `work` is joules per tick.
pub fn machine(
    id: MachineId,
    name: &str,
    production_type: ProductionType,
    rank: MachineRank,
    speed: f64,
    work: f64,
) -> Machine {
    Machine {
        id,
        name: name.to_string(),
        production_type,
        rank,
        speed: fixed(speed),
        idle_energy_per_tick: Fixed64::ZERO,
        work_energy_per_tick: fixed(work),
        exchange_energy_per_tick: Fixed64::ZERO,
        is_power_consumer: true,
        is_power_exchanger: false,
    }
}

pub fn recipe(
    id: RecipeId,
    name: &str,
    production_type: ProductionType,
    cycle_time: f64,
    inputs: Vec<RecipeLine>,
    outputs: Vec<RecipeLine>,
    productive: bool,
) -> Recipe {
    Recipe {
        id,
        name: name.to_string(),
        production_type,
        cycle_time: fixed(cycle_time),
        inputs,
        outputs,
        productive,
    }
}

fn line(item: ItemId, count: u32) -> RecipeLine {
    RecipeLine::new(item, count)
}

// ===========================================================================
// Catalogs
// ===========================================================================

/// A small slice of the game: smelting, components, oil, a research matrix,
/// particle deuterium and Ray Receiver photons.
///
/// Chemical plants only exist at Mk.I, so selecting Mk.II yields
/// machine-less nodes, which resolve as raw leaves.
pub fn fixture_catalog() -> Catalog {
    use MachineRank::*;
    use ProductionType::*;

    let mut b = CatalogBuilder::new();

    b.raw_item(WATER.0, "Water", RawSource::WaterPump);
    b.raw_item(IRON_ORE.0, "Iron Ore", RawSource::Vein);
    b.raw_item(COPPER_ORE.0, "Copper Ore", RawSource::Vein);
    b.raw_item(COAL.0, "Coal", RawSource::Vein);
    b.raw_item(CRUDE_OIL.0, "Crude Oil", RawSource::OilExtractor);
    b.raw_item(HYDROGEN.0, "Hydrogen", RawSource::OrbitalCollector);
    b.raw_item(DEUTERIUM.0, "Deuterium", RawSource::OrbitalCollector);
    b.item(IRON_INGOT.0, "Iron Ingot");
    b.item(MAGNET.0, "Magnet");
    b.item(COPPER_INGOT.0, "Copper Ingot");
    b.item(GRAPHITE.0, "Energetic Graphite");
    b.item(REFINED_OIL.0, "Refined Oil");
    b.item(PLASTIC.0, "Plastic");
    b.item(GEAR.0, "Gear");
    b.item(MAGNETIC_COIL.0, "Magnetic Coil");
    b.item(CRITICAL_PHOTON.0, "Critical Photon");
    b.item(GRAVITON_LENS.0, "Graviton Lens");
    b.item(CIRCUIT_BOARD.0, "Circuit Board");
    b.item(EM_MATRIX.0, "Electromagnetic Matrix");
    b.item(SORTER_MK1.0, "Sorter Mk.I");
    b.item(SORTER_MK2.0, "Sorter Mk.II");
    b.item(SORTER_MK3.0, "Sorter Mk.III");
    b.add_sorter(SorterTier::Mk1, SORTER_MK1);
    b.add_sorter(SorterTier::Mk2, SORTER_MK2);
    b.add_sorter(SorterTier::Mk3, SORTER_MK3);

    b.add_machine(machine(ARC_SMELTER, "Arc Smelter", Smelt, Mk1, 1.0, 6000.0));
    b.add_machine(machine(PLANE_SMELTER, "Plane Smelter", Smelt, Mk2, 2.0, 24000.0));
    b.add_machine(machine(ASSEMBLER_MK1, "Assembling Machine Mk.I", Assemble, Mk1, 0.75, 4500.0));
    b.add_machine(machine(ASSEMBLER_MK2, "Assembling Machine Mk.II", Assemble, Mk2, 1.0, 8000.0));
    b.add_machine(machine(ASSEMBLER_MK3, "Assembling Machine Mk.III", Assemble, Mk3, 1.5, 13000.0));
    b.add_machine(machine(CHEMICAL_PLANT, "Chemical Plant", Chemical, Mk1, 1.0, 12000.0));
    b.add_machine(machine(OIL_REFINERY, "Oil Refinery", Refine, Mk1, 1.0, 16000.0));
    b.add_machine(machine(MATRIX_LAB, "Matrix Lab", Research, Mk1, 1.0, 8000.0));
    b.add_machine(machine(PARTICLE_COLLIDER, "Miniature Particle Collider", Particle, Mk1, 1.0, 200_000.0));
    b.add_machine(Machine {
        is_power_consumer: false,
        ..machine(RAY_RECEIVER, "Ray Receiver", PhotonGeneration, Mk1, 1.0, 250_000.0)
    });

    b.add_recipe(recipe(IRON_INGOT_RECIPE, "Iron Ingot", Smelt, 1.0, vec![line(IRON_ORE, 1)], vec![line(IRON_INGOT, 1)], false));
    b.add_recipe(recipe(MAGNET_RECIPE, "Magnet", Smelt, 1.5, vec![line(IRON_ORE, 1)], vec![line(MAGNET, 1)], false));
    b.add_recipe(recipe(COPPER_INGOT_RECIPE, "Copper Ingot", Smelt, 1.0, vec![line(COPPER_ORE, 1)], vec![line(COPPER_INGOT, 1)], false));
    b.add_recipe(recipe(GEAR_RECIPE, "Gear", Assemble, 1.0, vec![line(IRON_INGOT, 1)], vec![line(GEAR, 1)], true));
    b.add_recipe(recipe(
        MAGNETIC_COIL_RECIPE,
        "Magnetic Coil",
        Assemble,
        1.0,
        vec![line(MAGNET, 2), line(COPPER_INGOT, 1)],
        vec![line(MAGNETIC_COIL, 2)],
        true,
    ));
    b.add_recipe(recipe(
        EM_MATRIX_RECIPE,
        "Electromagnetic Matrix",
        Research,
        3.0,
        vec![line(MAGNETIC_COIL, 1), line(CIRCUIT_BOARD, 1)],
        vec![line(EM_MATRIX, 1)],
        true,
    ));
    b.add_recipe(recipe(
        PLASMA_REFINING_RECIPE,
        "Plasma Refining",
        Refine,
        4.0,
        vec![line(CRUDE_OIL, 2)],
        vec![line(REFINED_OIL, 2), line(HYDROGEN, 1)],
        false,
    ));
    b.add_recipe(recipe(GRAPHITE_RECIPE, "Energetic Graphite", Smelt, 2.0, vec![line(COAL, 2)], vec![line(GRAPHITE, 1)], false));
    b.add_recipe(recipe(
        PLASTIC_RECIPE,
        "Plastic",
        Chemical,
        3.0,
        vec![line(REFINED_OIL, 2), RecipeLine::raw(GRAPHITE, 1)],
        vec![line(PLASTIC, 1)],
        true,
    ));
    b.add_recipe(recipe(DEUTERIUM_RECIPE, "Deuterium", Particle, 2.5, vec![line(HYDROGEN, 10)], vec![line(DEUTERIUM, 5)], true));
    b.add_recipe(recipe(
        CIRCUIT_RECIPE,
        "Circuit Board",
        Assemble,
        1.0,
        vec![line(IRON_INGOT, 2), line(COPPER_INGOT, 1)],
        vec![line(CIRCUIT_BOARD, 2)],
        true,
    ));
    b.add_recipe(recipe(
        GRAVITON_LENS_RECIPE,
        "Graviton Lens",
        Assemble,
        6.0,
        vec![line(MAGNETIC_COIL, 2)],
        vec![line(GRAVITON_LENS, 1)],
        true,
    ));
    b.add_recipe(recipe(
        PHOTON_RECIPE,
        "Critical Photon",
        PhotonGeneration,
        4.0,
        vec![line(GRAVITON_LENS, 1)],
        vec![line(CRITICAL_PHOTON, 1)],
        false,
    ));

    b.build().expect("fixture catalog is valid")
}

/// Two items that are each made from the other: recipe 1 makes item 1 from
/// item 2, recipe 2 makes item 2 from item 1.
pub fn cyclic_catalog() -> Catalog {
    let mut b = CatalogBuilder::new();
    let a = b.item(1, "Alpha");
    let z = b.item(2, "Beta");
    b.add_machine(machine(
        ASSEMBLER_MK1,
        "Assembler",
        ProductionType::Assemble,
        MachineRank::Mk1,
        1.0,
        6000.0,
    ));
    b.add_recipe(recipe(RecipeId(1), "Alpha", ProductionType::Assemble, 1.0, vec![line(z, 1)], vec![line(a, 1)], true));
    b.add_recipe(recipe(RecipeId(2), "Beta", ProductionType::Assemble, 1.0, vec![line(a, 1)], vec![line(z, 1)], true));
    b.build().expect("cyclic catalog is valid")
}
