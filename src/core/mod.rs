pub mod area;
pub mod capacity;
pub mod engine;
pub mod fanout;
pub mod history;
pub mod joiner;
pub mod settings;
pub mod trend;

pub use crate::domain::model::{CapacitySignal, RegionFilter, RegionSignal, Tier};
pub use crate::domain::ports::{CaseRecordStore, FacilityStore, SettingsProvider};
pub use crate::utils::error::Result;
