use crate::domain::model::CaseObservation;
use crate::domain::severity::Thresholds;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;

/// Daily case counts keyed by region name and date.
#[async_trait]
pub trait CaseRecordStore: Send + Sync {
    /// `Ok(None)` when the store has no observation for the pair.
    async fn get(&self, region: &str, date: NaiveDate) -> Result<Option<u64>>;

    /// Observations in `[lo, hi]`, ordered by date.
    async fn range(&self, region: &str, lo: NaiveDate, hi: NaiveDate)
        -> Result<Vec<CaseObservation>>;
}

#[async_trait]
pub trait FacilityStore: Send + Sync {
    async fn count_by_region(&self, region: &str) -> Result<u64>;
}

/// Source of aggregator tuning; implemented by the TOML config.
pub trait SettingsProvider: Send + Sync {
    fn request_timeout(&self) -> Duration;
    fn bed_occupancy_factor(&self) -> f64;
    fn trend_thresholds(&self) -> Thresholds;
    fn capacity_thresholds(&self) -> Thresholds;
}
