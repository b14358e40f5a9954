use crate::domain::model::{CaseObservation, FacilityCount};
use crate::domain::ports::{CaseRecordStore, FacilityStore};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

/// Case counts held in memory, keyed by region then date.
#[derive(Debug, Default)]
pub struct InMemoryCaseStore {
    records: RwLock<HashMap<String, BTreeMap<NaiveDate, u64>>>,
}

impl InMemoryCaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_observations(observations: impl IntoIterator<Item = CaseObservation>) -> Self {
        let mut records: HashMap<String, BTreeMap<NaiveDate, u64>> = HashMap::new();
        for observation in observations {
            records
                .entry(observation.region)
                .or_default()
                .insert(observation.date, observation.count);
        }
        Self {
            records: RwLock::new(records),
        }
    }

    /// Replaces any earlier count for the same region and date.
    pub async fn insert(&self, region: &str, date: NaiveDate, count: u64) {
        let mut records = self.records.write().await;
        records
            .entry(region.to_string())
            .or_default()
            .insert(date, count);
    }

    pub async fn len(&self) -> usize {
        let records = self.records.read().await;
        records.values().map(BTreeMap::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CaseRecordStore for InMemoryCaseStore {
    async fn get(&self, region: &str, date: NaiveDate) -> Result<Option<u64>> {
        let records = self.records.read().await;
        Ok(records.get(region).and_then(|days| days.get(&date)).copied())
    }

    async fn range(
        &self,
        region: &str,
        lo: NaiveDate,
        hi: NaiveDate,
    ) -> Result<Vec<CaseObservation>> {
        if lo > hi {
            return Ok(Vec::new());
        }
        let records = self.records.read().await;
        Ok(records
            .get(region)
            .map(|days| {
                days.range(lo..=hi)
                    .map(|(date, count)| CaseObservation {
                        date: *date,
                        region: region.to_string(),
                        count: *count,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Facility counts per region; regions without a row have zero facilities.
#[derive(Debug, Default)]
pub struct InMemoryFacilityStore {
    counts: RwLock<HashMap<String, u64>>,
}

impl InMemoryFacilityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_counts(counts: impl IntoIterator<Item = FacilityCount>) -> Self {
        let counts = counts
            .into_iter()
            .map(|c| (c.region, c.count))
            .collect::<HashMap<_, _>>();
        Self {
            counts: RwLock::new(counts),
        }
    }

    pub async fn set(&self, region: &str, count: u64) {
        let mut counts = self.counts.write().await;
        counts.insert(region.to_string(), count);
    }
}

#[async_trait]
impl FacilityStore for InMemoryFacilityStore {
    async fn count_by_region(&self, region: &str) -> Result<u64> {
        let counts = self.counts.read().await;
        Ok(counts.get(region).copied().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, day).unwrap()
    }

    #[tokio::test]
    async fn test_get_distinguishes_absent_from_zero() {
        let store = InMemoryCaseStore::new();
        store.insert("Tokyo", date(1), 0).await;

        assert_eq!(store.get("Tokyo", date(1)).await.unwrap(), Some(0));
        assert_eq!(store.get("Tokyo", date(2)).await.unwrap(), None);
        assert_eq!(store.get("Osaka", date(1)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_range_is_inclusive_and_ordered() {
        let store = InMemoryCaseStore::from_observations(
            [5, 1, 3, 2, 4].into_iter().map(|day| CaseObservation {
                date: date(day),
                region: "Osaka".to_string(),
                count: day as u64 * 10,
            }),
        );

        let rows = store.range("Osaka", date(2), date(4)).await.unwrap();
        let days: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
        assert_eq!(days, vec![date(2), date(3), date(4)]);
        assert_eq!(rows[0].count, 20);

        assert!(store.range("Osaka", date(4), date(2)).await.unwrap().is_empty());
        assert_eq!(store.len().await, 5);
    }

    #[test]
    fn test_facility_store_defaults_to_zero() {
        let store = InMemoryFacilityStore::from_counts(vec![FacilityCount {
            region: "Kyoto".to_string(),
            count: 12,
        }]);

        tokio_test::block_on(async {
            assert_eq!(store.count_by_region("Kyoto").await.unwrap(), 12);
            assert_eq!(store.count_by_region("Nara").await.unwrap(), 0);
            store.set("Nara", 3).await;
            assert_eq!(store.count_by_region("Nara").await.unwrap(), 3);
        });
    }
}
