use crate::domain::catalog::RegionCatalog;
use crate::domain::model::{CaseObservation, Region};
use crate::domain::ports::CaseRecordStore;
use crate::utils::error::{Result, SignalError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Observations of one region over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionHistory {
    pub region: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub observations: Vec<CaseObservation>,
    pub average: Option<f64>,
    pub peak: Option<CaseObservation>,
}

/// The first date on which a region's count went strictly above `above`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirstCrossing {
    pub region: String,
    pub above: u64,
    /// `None` when the count never exceeded `above` in the searched range.
    pub date: Option<NaiveDate>,
    pub count: Option<u64>,
}

fn lookup_region(region: &str) -> Result<Region> {
    RegionCatalog::global()
        .lookup(region)
        .ok_or_else(|| SignalError::invalid_input("region", region, "unknown region"))
}

fn check_range(from: NaiveDate, to: NaiveDate) -> Result<()> {
    if from > to {
        return Err(SignalError::invalid_input(
            "from",
            from.to_string(),
            format!("range start is after its end ({})", to),
        ));
    }
    Ok(())
}

pub async fn region_history(
    cases: &dyn CaseRecordStore,
    region: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<RegionHistory> {
    let region = lookup_region(region)?;
    check_range(from, to)?;

    let observations = cases.range(region.name, from, to).await?;
    let average = if observations.is_empty() {
        None
    } else {
        let total: u128 = observations.iter().map(|o| u128::from(o.count)).sum();
        Some(total as f64 / observations.len() as f64)
    };
    // earliest date wins a tie
    let peak = observations
        .iter()
        .fold(None::<&CaseObservation>, |best, o| match best {
            Some(b) if b.count >= o.count => Some(b),
            _ => Some(o),
        })
        .cloned();

    Ok(RegionHistory {
        region: region.name.to_string(),
        from,
        to,
        observations,
        average,
        peak,
    })
}

/// Searches `[from, to]`; an open bound searches to the edge of the calendar.
pub async fn first_day_over(
    cases: &dyn CaseRecordStore,
    region: &str,
    above: u64,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<FirstCrossing> {
    let region = lookup_region(region)?;
    let from = from.unwrap_or(NaiveDate::MIN);
    let to = to.unwrap_or(NaiveDate::MAX);
    check_range(from, to)?;

    let first = cases
        .range(region.name, from, to)
        .await?
        .into_iter()
        .find(|o| o.count > above);

    Ok(FirstCrossing {
        region: region.name.to_string(),
        above,
        date: first.as_ref().map(|o| o.date),
        count: first.map(|o| o.count),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryCaseStore;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, d).unwrap()
    }

    fn store(counts: &[(u32, u64)]) -> InMemoryCaseStore {
        InMemoryCaseStore::from_observations(counts.iter().map(|&(d, count)| CaseObservation {
            date: day(d),
            region: "Tokyo".to_string(),
            count,
        }))
    }

    #[tokio::test]
    async fn test_history_average_does_not_overflow() {
        let cases = store(&[(1, u64::MAX), (2, 2)]);
        let history = region_history(&cases, "Tokyo", day(1), day(2)).await.unwrap();

        let expected = (u128::from(u64::MAX) + 2) as f64 / 2.0;
        assert_eq!(history.average, Some(expected));
        assert_eq!(history.peak.map(|p| p.count), Some(u64::MAX));
    }

    #[tokio::test]
    async fn test_first_day_over() {
        let cases = store(&[(1, 3), (2, 8), (3, 20), (4, 25)]);

        let crossing = first_day_over(&cases, "東京都", 8, None, None).await.unwrap();
        assert_eq!(crossing.region, "Tokyo");
        assert_eq!(crossing.date, Some(day(3)));
        assert_eq!(crossing.count, Some(20));

        let bounded = first_day_over(&cases, "Tokyo", 8, Some(day(4)), None).await.unwrap();
        assert_eq!(bounded.date, Some(day(4)));

        let never = first_day_over(&cases, "Tokyo", 100, None, None).await.unwrap();
        assert_eq!(never.date, None);
        assert_eq!(never.count, None);

        assert!(first_day_over(&cases, "Gotham", 1, None, None).await.is_err());
        assert!(first_day_over(&cases, "Tokyo", 1, Some(day(4)), Some(day(1)))
            .await
            .is_err());
    }
}
