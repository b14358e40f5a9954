use crate::core::fanout::fan_out;
use crate::core::joiner::{RegionOutcome, ResultJoiner};
use crate::core::settings::AggregatorSettings;
use crate::domain::catalog::RegionCatalog;
use crate::domain::model::{Region, RegionFilter, RegionSignal, Tier};
use crate::domain::ports::CaseRecordStore;
use crate::domain::severity::{classify, Ratio, Thresholds};
use crate::utils::error::{Result, SignalError};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Day-over-day deltas read for one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendReading {
    pub delta_current: Option<i64>,
    pub delta_previous: Option<i64>,
}

pub struct TrendAggregator {
    cases: Arc<dyn CaseRecordStore>,
    thresholds: Thresholds,
    timeout: Duration,
}

impl TrendAggregator {
    pub fn new(cases: Arc<dyn CaseRecordStore>, settings: &AggregatorSettings) -> Self {
        Self {
            cases,
            thresholds: settings.trend_thresholds.clone(),
            timeout: settings.request_timeout,
        }
    }

    pub async fn aggregate(
        &self,
        anchor: NaiveDate,
        filter: &RegionFilter,
    ) -> Result<Vec<RegionSignal>> {
        let catalog = RegionCatalog::global();
        let regions = catalog.resolve(filter)?;
        let (day_before, two_days_before) = preceding_days(anchor)?;
        let deadline = Instant::now() + self.timeout;

        tracing::debug!(
            "trend {} over {} regions ({} / {} / {})",
            anchor,
            regions.len(),
            two_days_before,
            day_before,
            anchor
        );

        let cases = Arc::clone(&self.cases);
        let collected = fan_out(&regions, deadline, move |region| {
            let cases = Arc::clone(&cases);
            async move {
                read_trend(cases.as_ref(), region, anchor, day_before, two_days_before).await
            }
        })
        .await;

        Ok(ResultJoiner::new(catalog)
            .join(&regions, collected)
            .into_iter()
            .map(|(region, outcome)| self.to_signal(&region, outcome))
            .collect())
    }

    fn to_signal(&self, region: &Region, outcome: RegionOutcome<TrendReading>) -> RegionSignal {
        match outcome {
            RegionOutcome::Computed(reading) => {
                let ratio = Ratio::percent(reading.delta_current, reading.delta_previous);
                RegionSignal {
                    region: region.name.to_string(),
                    delta_current: reading.delta_current,
                    delta_previous: reading.delta_previous,
                    ratio: ratio.value(),
                    tier: classify(ratio, &self.thresholds),
                    error: None,
                }
            }
            RegionOutcome::Failed(message) => {
                RegionSignal::failed(region, Tier::Error, Some(message))
            }
            RegionOutcome::TimedOut => RegionSignal::failed(region, Tier::Timeout, None),
        }
    }
}

/// `(anchor - 1, anchor - 2)`; fails only at the very start of the calendar.
pub fn preceding_days(anchor: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
    let out_of_range =
        || SignalError::invalid_input("date", anchor.to_string(), "no preceding days available");
    let day_before = anchor.pred_opt().ok_or_else(out_of_range)?;
    let two_days_before = day_before.pred_opt().ok_or_else(out_of_range)?;
    Ok((day_before, two_days_before))
}

async fn read_trend(
    cases: &dyn CaseRecordStore,
    region: Region,
    anchor: NaiveDate,
    day_before: NaiveDate,
    two_days_before: NaiveDate,
) -> Result<TrendReading> {
    let (current, previous, earliest) = tokio::try_join!(
        cases.get(region.name, anchor),
        cases.get(region.name, day_before),
        cases.get(region.name, two_days_before),
    )?;

    Ok(TrendReading {
        delta_current: delta(current, previous),
        delta_previous: delta(previous, earliest),
    })
}

fn delta(later: Option<u64>, earlier: Option<u64>) -> Option<i64> {
    let later = i64::try_from(later?).ok()?;
    let earlier = i64::try_from(earlier?).ok()?;
    Some(later - earlier)
}
