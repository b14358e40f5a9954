use crate::domain::ports::SettingsProvider;
use crate::domain::severity::Thresholds;
use std::time::Duration;

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;
/// Assumed share of facility beds that are occupied.
pub const DEFAULT_BED_OCCUPANCY_FACTOR: f64 = 0.57;

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatorSettings {
    pub request_timeout: Duration,
    pub bed_occupancy_factor: f64,
    pub trend_thresholds: Thresholds,
    pub capacity_thresholds: Thresholds,
}

impl AggregatorSettings {
    pub fn from_provider(provider: &dyn SettingsProvider) -> Self {
        Self {
            request_timeout: provider.request_timeout(),
            bed_occupancy_factor: provider.bed_occupancy_factor(),
            trend_thresholds: provider.trend_thresholds(),
            capacity_thresholds: provider.capacity_thresholds(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_occupancy_factor(mut self, factor: f64) -> Self {
        self.bed_occupancy_factor = factor;
        self
    }
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            bed_occupancy_factor: DEFAULT_BED_OCCUPANCY_FACTOR,
            trend_thresholds: Thresholds::trend(),
            capacity_thresholds: Thresholds::capacity(),
        }
    }
}
