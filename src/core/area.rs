//! Per-area and nationwide averages over a single date.

use crate::core::fanout::fan_out;
use crate::core::joiner::{RegionOutcome, ResultJoiner};
use crate::core::settings::AggregatorSettings;
use crate::domain::catalog::RegionCatalog;
use crate::domain::model::{Area, AreaEntry, AreaSummary, CountStatus, NationalSummary, Region};
use crate::domain::ports::CaseRecordStore;
use crate::utils::error::Result;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub struct AreaAggregator {
    cases: Arc<dyn CaseRecordStore>,
    timeout: Duration,
}

impl AreaAggregator {
    pub fn new(cases: Arc<dyn CaseRecordStore>, settings: &AggregatorSettings) -> Self {
        Self {
            cases,
            timeout: settings.request_timeout,
        }
    }

    /// One summary per requested area; all eight when `area` is `None`.
    pub async fn summarize(
        &self,
        anchor: NaiveDate,
        area: Option<Area>,
    ) -> Result<Vec<AreaSummary>> {
        let catalog = RegionCatalog::global();
        let regions: Vec<Region> = match area {
            Some(area) => catalog.regions_in_area(area),
            None => catalog.all().to_vec(),
        };
        let joined = self.collect(anchor, &regions).await;

        let areas: Vec<Area> = match area {
            Some(area) => vec![area],
            None => Area::ALL.to_vec(),
        };

        Ok(areas
            .into_iter()
            .map(|area| {
                let entries = joined
                    .iter()
                    .filter(|(region, _)| region.area == area)
                    .map(|(region, outcome)| entry_for(region, outcome))
                    .collect();
                summarize_area(area, anchor, entries)
            })
            .collect())
    }

    /// Total and average over all 47 prefectures.
    pub async fn nationwide(&self, anchor: NaiveDate) -> Result<NationalSummary> {
        let regions = RegionCatalog::global().all();
        let mut entries: Vec<AreaEntry> = self
            .collect(anchor, regions)
            .await
            .iter()
            .map(|(region, outcome)| entry_for(region, outcome))
            .collect();
        let tally = tally(&mut entries);

        Ok(NationalSummary {
            date: anchor,
            reporting: tally.reporting,
            total: tally.total,
            average: tally.average,
            entries,
        })
    }

    async fn collect(
        &self,
        anchor: NaiveDate,
        regions: &[Region],
    ) -> Vec<(Region, RegionOutcome<Option<u64>>)> {
        let deadline = Instant::now() + self.timeout;

        let cases = Arc::clone(&self.cases);
        let collected = fan_out(regions, deadline, move |region| {
            let cases = Arc::clone(&cases);
            async move { cases.get(region.name, anchor).await }
        })
        .await;

        ResultJoiner::new(RegionCatalog::global()).join(regions, collected)
    }
}

fn entry_for(region: &Region, outcome: &RegionOutcome<Option<u64>>) -> AreaEntry {
    let (count, status, error) = match outcome {
        RegionOutcome::Computed(Some(count)) => (Some(*count), CountStatus::Reported, None),
        RegionOutcome::Computed(None) => (None, CountStatus::Missing, None),
        RegionOutcome::Failed(message) => (None, CountStatus::Error, Some(message.clone())),
        RegionOutcome::TimedOut => (None, CountStatus::Timeout, None),
    };

    AreaEntry {
        region: region.name.to_string(),
        count,
        status,
        above_average: false,
        error,
    }
}

struct Tally {
    reporting: usize,
    total: u128,
    average: Option<f64>,
}

/// Sums reported counts and flags the entries strictly above their average.
fn tally(entries: &mut [AreaEntry]) -> Tally {
    let mut reporting = 0usize;
    // u128 cannot overflow on 47 u64 counts
    let mut total = 0u128;
    for count in entries.iter().filter_map(|e| e.count) {
        reporting += 1;
        total += u128::from(count);
    }

    let average = (reporting > 0).then(|| total as f64 / reporting as f64);
    if let Some(average) = average {
        for entry in entries.iter_mut() {
            entry.above_average = entry.count.is_some_and(|c| c as f64 > average);
        }
    }

    Tally {
        reporting,
        total,
        average,
    }
}

fn summarize_area(area: Area, date: NaiveDate, mut entries: Vec<AreaEntry>) -> AreaSummary {
    let tally = tally(&mut entries);

    AreaSummary {
        area,
        date,
        reporting: tally.reporting,
        total: tally.total,
        average: tally.average,
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(region: &str, count: Option<u64>) -> AreaEntry {
        AreaEntry {
            region: region.to_string(),
            count,
            status: if count.is_some() {
                CountStatus::Reported
            } else {
                CountStatus::Missing
            },
            above_average: false,
            error: None,
        }
    }

    #[test]
    fn test_summary_excludes_missing_from_average() {
        let date = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        let summary = summarize_area(
            Area::Shikoku,
            date,
            vec![
                entry("Tokushima", Some(10)),
                entry("Kagawa", Some(30)),
                entry("Ehime", None),
                entry("Kochi", Some(20)),
            ],
        );

        assert_eq!(summary.reporting, 3);
        assert_eq!(summary.total, 60);
        assert_eq!(summary.average, Some(20.0));
        let above: Vec<&str> = summary.above_average().map(|e| e.region.as_str()).collect();
        // strictly above: Kochi sits exactly on the average
        assert_eq!(above, vec!["Kagawa"]);
    }

    #[test]
    fn test_summary_without_reports_has_no_average() {
        let date = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        let summary = summarize_area(Area::Hokkaido, date, vec![entry("Hokkaido", None)]);
        assert_eq!(summary.reporting, 0);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.average, None);
        assert_eq!(summary.above_average().count(), 0);
    }

    #[test]
    fn test_summary_total_does_not_overflow() {
        let date = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        let summary = summarize_area(
            Area::Shikoku,
            date,
            vec![
                entry("Tokushima", Some(u64::MAX)),
                entry("Kagawa", Some(2)),
                entry("Ehime", None),
                entry("Kochi", None),
            ],
        );

        assert_eq!(summary.reporting, 2);
        assert_eq!(summary.total, u128::from(u64::MAX) + 2);
        let above: Vec<&str> = summary.above_average().map(|e| e.region.as_str()).collect();
        assert_eq!(above, vec!["Tokushima"]);
    }
}
