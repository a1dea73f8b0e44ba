//! Chainplan Core -- the production-chain calculator for Dyson Sphere style
//! factory planning.
//!
//! Given a target recipe and a rate, the resolver expands the full tree of
//! supporting production: machines, power, sorters, belts, and the raw
//! materials at its leaves. Collaborating crates aggregate that tree into a
//! power breakdown (`chainplan-power`) and item statistics
//! (`chainplan-stats`), and load catalogs from data files
//! (`chainplan-data`).
//!
//! # Pipeline
//!
//! 1. **Catalog** -- build a read-only [`catalog::Catalog`] of items,
//!    machines and recipes.
//! 2. **Settings** -- choose boosters, machine ranks, belts, sorters and
//!    recipe alternatives in [`settings::Settings`], plus optional
//!    per-node [`settings::NodeOverride`]s.
//! 3. **Resolve** -- [`resolver::resolve`] returns a
//!    [`resolver::CalculationResult`].
//! 4. **Mining** -- [`mining::calculate_mining`] sizes extractors for the
//!    tree's raw demand.
//!
//! ```rust,ignore
//! let result = resolve(recipe, Fixed64::from_num(2), &catalog, &settings, &overrides)?;
//! let mining = calculate_mining(&result.raw_materials, &catalog, &settings.mining);
//! ```
//!
//! # Key Types
//!
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point; no NaN or infinity anywhere.
//! - [`id::NodeId`] -- stable node identifier derived from the node's path.
//! - [`booster::ActiveMultipliers`] -- the speed or production multiplier a
//!   booster contributes.
//! - [`resolver::ResolvedNode`] -- one node of the production tree.

pub mod booster;
pub mod catalog;
pub mod fixed;
pub mod id;
pub mod mining;
pub mod resolver;
pub mod settings;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
