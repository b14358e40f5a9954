use crate::core::area::AreaAggregator;
use crate::core::capacity::CapacityAggregator;
use crate::core::history::{first_day_over, region_history, FirstCrossing, RegionHistory};
use crate::core::settings::AggregatorSettings;
use crate::core::trend::{preceding_days, TrendAggregator};
use crate::domain::catalog::RegionCatalog;
use crate::domain::model::{
    Area, AreaEntry, AreaSummary, CapacitySignal, CountSide, NationalSummary, RegionSignal,
    SortOrder, Tier,
};
use crate::domain::ports::{CaseRecordStore, FacilityStore};
use crate::utils::error::{Result, SignalError};
use crate::utils::validation::parse_iso_date;
use std::sync::Arc;
use std::time::Instant;

/// Entry point for string-typed requests. Input is validated before anything is dispatched.
pub struct SignalEngine {
    cases: Arc<dyn CaseRecordStore>,
    facilities: Arc<dyn FacilityStore>,
    settings: AggregatorSettings,
}

impl SignalEngine {
    pub fn new(
        cases: Arc<dyn CaseRecordStore>,
        facilities: Arc<dyn FacilityStore>,
        settings: AggregatorSettings,
    ) -> Self {
        Self {
            cases,
            facilities,
            settings,
        }
    }

    pub fn settings(&self) -> &AggregatorSettings {
        &self.settings
    }

    pub async fn trend(&self, date: &str, filter: Option<&str>) -> Result<Vec<RegionSignal>> {
        let anchor = parse_iso_date("date", date)?;
        preceding_days(anchor)?;
        let filter = RegionCatalog::global().parse_filter(filter)?;

        tracing::info!("Computing trend signals for {} ({:?})", anchor, filter);
        let started = Instant::now();

        let signals = TrendAggregator::new(Arc::clone(&self.cases), &self.settings)
            .aggregate(anchor, &filter)
            .await?;

        log_tiers("trend", signals.iter().map(|s| s.tier), started);
        Ok(signals)
    }

    pub async fn capacity(&self, date: &str) -> Result<Vec<CapacitySignal>> {
        let anchor = parse_iso_date("date", date)?;

        tracing::info!("Computing capacity signals for {}", anchor);
        let started = Instant::now();

        let signals = CapacityAggregator::new(
            Arc::clone(&self.cases),
            Arc::clone(&self.facilities),
            &self.settings,
        )
        .aggregate(anchor)
        .await?;

        log_tiers("capacity", signals.iter().map(|s| s.tier), started);
        Ok(signals)
    }

    pub async fn areas(&self, date: &str, area: Option<&str>) -> Result<Vec<AreaSummary>> {
        let anchor = parse_iso_date("date", date)?;
        let area = match area.map(str::trim).filter(|a| !a.is_empty()) {
            Some(raw) => Some(
                raw.parse::<Area>()
                    .map_err(|_| SignalError::invalid_input("area", raw, "unknown area"))?,
            ),
            None => None,
        };

        tracing::info!("Summarizing areas for {}", anchor);
        let started = Instant::now();

        let summaries = AreaAggregator::new(Arc::clone(&self.cases), &self.settings)
            .summarize(anchor, area)
            .await?;

        tracing::info!(
            "Summarized {} areas in {:?}",
            summaries.len(),
            started.elapsed()
        );
        Ok(summaries)
    }

    pub async fn nationwide(&self, date: &str) -> Result<NationalSummary> {
        let anchor = parse_iso_date("date", date)?;

        tracing::info!("Summarizing all regions for {}", anchor);
        let started = Instant::now();

        let summary = AreaAggregator::new(Arc::clone(&self.cases), &self.settings)
            .nationwide(anchor)
            .await?;

        tracing::info!(
            "{} of {} regions reported {} cases in {:?}",
            summary.reporting,
            summary.entries.len(),
            summary.total,
            started.elapsed()
        );
        Ok(summary)
    }

    /// Regions whose count on `date` is strictly over or under `count`.
    pub async fn select(
        &self,
        date: &str,
        count: u64,
        side: CountSide,
        order: SortOrder,
    ) -> Result<Vec<AreaEntry>> {
        let summary = self.nationwide(date).await?;
        Ok(summary.select(count, side, order))
    }

    pub async fn first_day_over(
        &self,
        region: &str,
        count: u64,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<FirstCrossing> {
        let from = from.map(|d| parse_iso_date("from", d)).transpose()?;
        let to = to.map(|d| parse_iso_date("to", d)).transpose()?;
        let crossing = first_day_over(self.cases.as_ref(), region, count, from, to).await?;
        tracing::info!(
            "{} first exceeded {} on {:?}",
            crossing.region,
            crossing.above,
            crossing.date
        );
        Ok(crossing)
    }

    pub async fn history(&self, region: &str, from: &str, to: &str) -> Result<RegionHistory> {
        let from = parse_iso_date("from", from)?;
        let to = parse_iso_date("to", to)?;
        let history = region_history(self.cases.as_ref(), region, from, to).await?;
        tracing::info!(
            "Read {} observations for {}",
            history.observations.len(),
            history.region
        );
        Ok(history)
    }
}

fn log_tiers(kind: &str, tiers: impl Iterator<Item = Tier>, started: Instant) {
    let mut total = 0usize;
    let mut errors = 0usize;
    let mut timeouts = 0usize;
    let mut no_data = 0usize;
    for tier in tiers {
        total += 1;
        match tier {
            Tier::Error => errors += 1,
            Tier::Timeout => timeouts += 1,
            Tier::NoData => no_data += 1,
            _ => {}
        }
    }

    tracing::info!(
        "{} signals for {} regions in {:?} (no data: {}, errors: {}, timeouts: {})",
        kind,
        total,
        started.elapsed(),
        no_data,
        errors,
        timeouts
    );
}
