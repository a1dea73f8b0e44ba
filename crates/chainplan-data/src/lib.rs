//! Data-file loading for chainplan.
//!
//! A data directory holds a required `catalog.{ron,json,toml}` and an
//! optional `settings.{ron,json,toml}`. [`load_calculator_data`] reads both,
//! validates the catalog and sanitizes every number before it reaches the
//! resolver.

pub mod loader;
pub mod schema;

pub use loader::{load_calculator_data, load_catalog, load_settings, CalculatorData, DataLoadError};
