use crate::core::fanout::fan_out;
use crate::core::joiner::{RegionOutcome, ResultJoiner};
use crate::core::settings::AggregatorSettings;
use crate::domain::catalog::RegionCatalog;
use crate::domain::model::{CapacitySignal, Region, Tier};
use crate::domain::ports::{CaseRecordStore, FacilityStore};
use crate::domain::severity::{classify, Ratio, Thresholds};
use crate::utils::error::Result;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityReading {
    pub facility_count: u64,
    pub case_count: Option<u64>,
}

/// Estimates bed load per facility across all prefectures.
pub struct CapacityAggregator {
    cases: Arc<dyn CaseRecordStore>,
    facilities: Arc<dyn FacilityStore>,
    thresholds: Thresholds,
    occupancy_factor: f64,
    timeout: Duration,
}

impl CapacityAggregator {
    pub fn new(
        cases: Arc<dyn CaseRecordStore>,
        facilities: Arc<dyn FacilityStore>,
        settings: &AggregatorSettings,
    ) -> Self {
        Self {
            cases,
            facilities,
            thresholds: settings.capacity_thresholds.clone(),
            occupancy_factor: settings.bed_occupancy_factor,
            timeout: settings.request_timeout,
        }
    }

    pub async fn aggregate(&self, anchor: NaiveDate) -> Result<Vec<CapacitySignal>> {
        let catalog = RegionCatalog::global();
        let regions = catalog.all();
        let deadline = Instant::now() + self.timeout;

        tracing::debug!("capacity {} over {} regions", anchor, regions.len());

        let cases = Arc::clone(&self.cases);
        let facilities = Arc::clone(&self.facilities);
        let collected = fan_out(regions, deadline, move |region| {
            let cases = Arc::clone(&cases);
            let facilities = Arc::clone(&facilities);
            async move { read_capacity(cases.as_ref(), facilities.as_ref(), region, anchor).await }
        })
        .await;

        Ok(ResultJoiner::new(catalog)
            .join(regions, collected)
            .into_iter()
            .map(|(region, outcome)| self.to_signal(&region, outcome))
            .collect())
    }

    fn to_signal(
        &self,
        region: &Region,
        outcome: RegionOutcome<CapacityReading>,
    ) -> CapacitySignal {
        match outcome {
            RegionOutcome::Computed(reading) => {
                let utilization = Ratio::scaled(
                    reading.case_count,
                    Some(reading.facility_count),
                    self.occupancy_factor,
                );
                CapacitySignal {
                    region: region.name.to_string(),
                    facility_count: Some(reading.facility_count),
                    case_count: reading.case_count,
                    utilization: utilization.value(),
                    tier: classify(utilization, &self.thresholds),
                    error: None,
                }
            }
            RegionOutcome::Failed(message) => {
                CapacitySignal::failed(region, Tier::Error, Some(message))
            }
            RegionOutcome::TimedOut => CapacitySignal::failed(region, Tier::Timeout, None),
        }
    }
}

async fn read_capacity(
    cases: &dyn CaseRecordStore,
    facilities: &dyn FacilityStore,
    region: Region,
    anchor: NaiveDate,
) -> Result<CapacityReading> {
    let (facility_count, case_count) = tokio::try_join!(
        facilities.count_by_region(region.name),
        cases.get(region.name, anchor),
    )?;

    Ok(CapacityReading {
        facility_count,
        case_count,
    })
}
