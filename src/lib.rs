pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Query};
pub use config::TomlConfig;

pub use adapters::{InMemoryCaseStore, InMemoryFacilityStore};
pub use core::{engine::SignalEngine, settings::AggregatorSettings};
pub use domain::catalog::RegionCatalog;
pub use domain::model::{
    Area, AreaEntry, AreaSummary, CapacitySignal, CaseObservation, CountSide, FacilityCount,
    NationalSummary, Region, RegionFilter, RegionSignal, SortOrder, Tier,
};
pub use utils::error::{Result, SignalError};
