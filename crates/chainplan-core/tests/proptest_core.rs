//! Property-based tests for the chainplan resolver.
//!
//! Uses proptest to generate random settings and target rates over the
//! fixture catalog, then verify structural invariants hold.

use chainplan_core::catalog::*;
use chainplan_core::fixed::Fixed64;
use chainplan_core::id::*;
use chainplan_core::resolver::*;
use chainplan_core::settings::*;
use chainplan_core::test_utils::*;
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

const ROOTS: [RecipeId; 8] = [
    IRON_INGOT_RECIPE,
    GEAR_RECIPE,
    MAGNETIC_COIL_RECIPE,
    CIRCUIT_RECIPE,
    EM_MATRIX_RECIPE,
    PLASTIC_RECIPE,
    DEUTERIUM_RECIPE,
    PHOTON_RECIPE,
];

fn arb_root() -> impl Strategy<Value = RecipeId> {
    (0..ROOTS.len()).prop_map(|i| ROOTS[i])
}

fn arb_rate() -> impl Strategy<Value = Fixed64> {
    (1u32..=2000).prop_map(|centi| Fixed64::from_num(centi) / 100)
}

fn arb_booster() -> impl Strategy<Value = BoosterConfig> {
    (0..4u8, any::<bool>()).prop_map(|(tier, production)| {
        let tier = match tier {
            0 => BoosterTier::None,
            1 => BoosterTier::Mk1,
            2 => BoosterTier::Mk2,
            _ => BoosterTier::Mk3,
        };
        let mode = if production {
            BoosterMode::Production
        } else {
            BoosterMode::Speed
        };
        BoosterConfig::for_tier(tier, mode)
    })
}

/// Settings that vary everything except recipe alternatives, so the tree
/// shape stays fixed.
fn arb_settings() -> impl Strategy<Value = Settings> {
    (
        arb_booster(),
        0..4u8,
        0..3u8,
        0..6u8,
        1u32..=40,
        any::<bool>(),
        arb_booster(),
    )
        .prop_map(|(booster, assemble, belt, stack, multiplier, lens, lens_booster)| {
            let mut settings = Settings::default();
            settings.booster = booster;
            let rank = match assemble {
                0 => MachineRank::Mk1,
                1 => MachineRank::Mk2,
                2 => MachineRank::Mk3,
                _ => MachineRank::Mk4,
            };
            settings.machine_ranks.insert(ProductionType::Assemble, rank);
            settings.belt = BeltConfig::for_tier(match belt {
                0 => BeltTier::Mk1,
                1 => BeltTier::Mk2,
                _ => BeltTier::Mk3,
            });
            settings.belt.stack_count = stack;
            let scale = Fixed64::from_num(multiplier) / 10;
            settings.booster_multipliers = BoosterMultipliers {
                production: Some(scale),
                speed: Some(scale),
            };
            settings.photon.use_graviton_lens = lens;
            settings.photon.lens_booster = lens_booster;
            settings
        })
}

fn run(root: RecipeId, rate: Fixed64, settings: &Settings) -> CalculationResult {
    resolve(root, rate, &fixture_catalog(), settings, &NodeOverrides::new()).unwrap()
}

fn shape_ids(result: &CalculationResult) -> Vec<NodeId> {
    result.iter().map(|n| n.id).collect()
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Same inputs, same output.
    #[test]
    fn resolve_is_idempotent(root in arb_root(), rate in arb_rate(), settings in arb_settings()) {
        prop_assert_eq!(run(root, rate, &settings), run(root, rate, &settings));
    }

    /// Node ids depend on tree position only. Settings that keep the shape
    /// keep every id.
    #[test]
    fn node_ids_stable_across_settings(
        root in arb_root(),
        rate in arb_rate(),
        a in arb_settings(),
        b in arb_settings(),
    ) {
        let mut b = b;
        b.photon.use_graviton_lens = a.photon.use_graviton_lens;
        // Fixture assemblers stop at Mk3; a missing machine collapses its
        // subtree into a raw leaf.
        let a_rank = a.machine_rank(ProductionType::Assemble);
        let b_rank = b.machine_rank(ProductionType::Assemble);
        if (a_rank == MachineRank::Mk4) != (b_rank == MachineRank::Mk4) {
            b.machine_ranks.insert(ProductionType::Assemble, a_rank);
        }
        prop_assert_eq!(shape_ids(&run(root, rate, &a)), shape_ids(&run(root, rate, &b)));
    }

    /// Raising the target never lowers any node's machines or machine power.
    #[test]
    fn machines_monotonic_in_target(
        root in arb_root(),
        low in arb_rate(),
        extra in arb_rate(),
        settings in arb_settings(),
    ) {
        let small = run(root, low, &settings);
        let large = run(root, low + extra, &settings);
        for (s, l) in small.iter().zip(large.iter()) {
            prop_assert_eq!(s.id, l.id);
            prop_assert!(s.machine_count <= l.machine_count);
            prop_assert!(s.power.machines <= l.power.machines);
        }
    }

    /// Each speed tier needs no more machines than the one below it, and the
    /// machines it does need draw no less power in total.
    #[test]
    fn speed_tiers_trade_machines_for_power(root in arb_root(), rate in arb_rate()) {
        let results: Vec<CalculationResult> = [BoosterTier::None, BoosterTier::Mk1, BoosterTier::Mk2, BoosterTier::Mk3]
            .into_iter()
            .map(|tier| {
                let mut settings = Settings::default();
                settings.booster = BoosterConfig::for_tier(tier, BoosterMode::Speed);
                run(root, rate, &settings)
            })
            .collect();
        for pair in results.windows(2) {
            for (lower, higher) in pair[0].iter().zip(pair[1].iter()) {
                prop_assert!(higher.machine_count <= lower.machine_count);
                prop_assert!(higher.power.machines >= lower.power.machines);
            }
        }
    }

    /// At most one booster multiplier exceeds 1 on any node.
    #[test]
    fn booster_modes_exclusive(root in arb_root(), rate in arb_rate(), settings in arb_settings()) {
        for node in run(root, rate, &settings).iter() {
            prop_assert!(!(node.multipliers.speed > Fixed64::ONE && node.multipliers.production > Fixed64::ONE));
        }
    }

    /// Byproducts follow the recipe's output ratio to the main output.
    #[test]
    fn byproduct_ratio(rate in arb_rate(), settings in arb_settings()) {
        let result = run(PLASMA_REFINING_RECIPE, rate, &settings);
        let root = &result.root;
        prop_assert_eq!(root.byproducts.len(), 1);
        let expected = root.target_rate.to_num::<f64>() / 2.0;
        prop_assert!((root.byproducts[0].rate.to_num::<f64>() - expected).abs() < 1e-6);
    }

    /// No negative quantities anywhere in the tree.
    #[test]
    fn quantities_non_negative(root in arb_root(), rate in arb_rate(), settings in arb_settings()) {
        let result = run(root, rate, &settings);
        for node in result.iter() {
            prop_assert!(node.machine_count >= Fixed64::ZERO);
            prop_assert!(node.power.total >= Fixed64::ZERO);
            prop_assert!(node.orbital_power >= Fixed64::ZERO);
            prop_assert!(node.conveyors.saturation >= Fixed64::ZERO);
            prop_assert!(node.inputs.iter().all(|i| i.rate >= Fixed64::ZERO));
        }
        prop_assert!(result.raw_materials.iter().all(|r| r.rate > Fixed64::ZERO));
    }
}
