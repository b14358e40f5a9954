// Adapters layer: concrete store implementations behind the domain ports.

pub mod csv_loader;
pub mod memory;

pub use memory::{InMemoryCaseStore, InMemoryFacilityStore};
