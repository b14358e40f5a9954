use async_trait::async_trait;
use chrono::NaiveDate;
use rand::Rng;
use regional_signal::domain::catalog::RegionCatalog;
use regional_signal::domain::ports::{CaseRecordStore, FacilityStore};
use regional_signal::{
    AggregatorSettings, CaseObservation, FacilityCount, InMemoryCaseStore, InMemoryFacilityStore,
    SignalEngine, SignalError, Tier,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Wraps the in-memory store with per-region latency and failures.
#[derive(Default)]
struct ScriptedStore {
    inner: InMemoryCaseStore,
    delays: HashMap<String, Duration>,
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl ScriptedStore {
    fn new(inner: InMemoryCaseStore) -> Self {
        Self {
            inner,
            ..Default::default()
        }
    }

    fn delay(mut self, region: &str, delay: Duration) -> Self {
        self.delays.insert(region.to_string(), delay);
        self
    }

    fn fail(mut self, region: &str) -> Self {
        self.failing.insert(region.to_string());
        self
    }
}

#[async_trait]
impl CaseRecordStore for ScriptedStore {
    async fn get(&self, region: &str, date: NaiveDate) -> regional_signal::Result<Option<u64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(region) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(region) {
            return Err(SignalError::store_unavailable(region, "connection reset"));
        }
        self.inner.get(region, date).await
    }

    async fn range(
        &self,
        region: &str,
        lo: NaiveDate,
        hi: NaiveDate,
    ) -> regional_signal::Result<Vec<CaseObservation>> {
        self.inner.range(region, lo, hi).await
    }
}

fn rising_everywhere() -> InMemoryCaseStore {
    let observations = RegionCatalog::global().all().iter().flat_map(|region| {
        [(1, 2), (2, 5), (3, 10)].map(|(d, count)| CaseObservation {
            date: NaiveDate::from_ymd_opt(2022, 1, d).unwrap(),
            region: region.name.to_string(),
            count,
        })
    });
    InMemoryCaseStore::from_observations(observations.collect::<Vec<_>>())
}

fn build_engine(store: ScriptedStore, timeout: Duration) -> (SignalEngine, Arc<ScriptedStore>) {
    let store = Arc::new(store);
    let engine = SignalEngine::new(
        store.clone(),
        Arc::new(InMemoryFacilityStore::new()),
        AggregatorSettings::default().with_timeout(timeout),
    );
    (engine, store)
}

#[tokio::test]
async fn test_store_failure_is_isolated_to_its_region() {
    let store = ScriptedStore::new(rising_everywhere()).fail("Nagano");
    let (engine, _) = build_engine(store, Duration::from_secs(5));

    let signals = engine.trend("2022-01-03", None).await.unwrap();
    assert_eq!(signals.len(), 47);

    let nagano = signals.iter().find(|s| s.region == "Nagano").unwrap();
    assert_eq!(nagano.tier, Tier::Error);
    assert!(nagano.error.as_deref().unwrap().contains("connection reset"));

    assert!(signals
        .iter()
        .filter(|s| s.region != "Nagano")
        .all(|s| s.tier == Tier::TooDanger));
}

#[tokio::test]
async fn test_slow_region_times_out_and_the_rest_complete() {
    let store = ScriptedStore::new(rising_everywhere()).delay("Kochi", Duration::from_secs(30));
    let (engine, _) = build_engine(store, Duration::from_millis(200));

    let started = std::time::Instant::now();
    let signals = engine.trend("2022-01-03", None).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));

    assert_eq!(signals.len(), 47);
    let kochi = signals.iter().find(|s| s.region == "Kochi").unwrap();
    assert_eq!(kochi.tier, Tier::Timeout);
    assert_eq!(kochi.ratio, None);

    assert!(signals
        .iter()
        .filter(|s| s.region != "Kochi")
        .all(|s| s.tier == Tier::TooDanger));
}

#[tokio::test]
async fn test_slow_region_times_out_in_area_summary() {
    let store = ScriptedStore::new(rising_everywhere()).delay("Saga", Duration::from_secs(30));
    let (engine, _) = build_engine(store, Duration::from_millis(200));

    let summaries = engine.areas("2022-01-03", Some("Kyushu")).await.unwrap();
    let kyushu = &summaries[0];
    assert_eq!(kyushu.entries.len(), 8);
    assert_eq!(kyushu.reporting, 7);
    assert_eq!(kyushu.average, Some(10.0));

    let saga = kyushu.entries.iter().find(|e| e.region == "Saga").unwrap();
    assert_eq!(saga.count, None);
    assert_eq!(
        serde_json::to_value(saga.status).unwrap(),
        serde_json::json!("timeout")
    );
}

#[tokio::test]
async fn test_invalid_date_is_rejected_before_dispatch() {
    let (engine, store) =
        build_engine(ScriptedStore::new(rising_everywhere()), Duration::from_secs(5));

    for date in ["", "2022/01/03", "2022-02-30", "yesterday"] {
        let err = engine.trend(date, None).await.unwrap_err();
        assert!(matches!(err, SignalError::InvalidInput { .. }), "{}", date);
        assert!(engine.capacity(date).await.is_err());
    }
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_randomized_latency_never_loses_or_duplicates_regions() {
    let catalog = RegionCatalog::global();
    let expected: Vec<&str> = catalog.all().iter().map(|r| r.name).collect();
    let base = Arc::new(rising_everywhere());

    for iteration in 0..1000 {
        // latencies are fixed before any task is spawned
        let store = {
            let mut rng = rand::rng();
            expected.iter().fold(ScriptedStore::default(), |store, name| {
                store.delay(name, Duration::from_micros(rng.random_range(0..300)))
            })
        };
        let store = Arc::new(DelegatingStore {
            scripted: store,
            data: Arc::clone(&base),
        });

        let engine = SignalEngine::new(
            store,
            Arc::new(InMemoryFacilityStore::new()),
            AggregatorSettings::default().with_timeout(Duration::from_secs(10)),
        );

        let signals = engine.trend("2022-01-03", None).await.unwrap();
        let names: Vec<&str> = signals.iter().map(|s| s.region.as_str()).collect();
        assert_eq!(names, expected, "iteration {}", iteration);
        assert!(
            signals.iter().all(|s| s.tier == Tier::TooDanger),
            "iteration {}",
            iteration
        );
    }
}

/// Takes latency from the scripted store and counts from a shared one.
struct DelegatingStore {
    scripted: ScriptedStore,
    data: Arc<InMemoryCaseStore>,
}

#[async_trait]
impl CaseRecordStore for DelegatingStore {
    async fn get(&self, region: &str, date: NaiveDate) -> regional_signal::Result<Option<u64>> {
        self.scripted.get(region, date).await?;
        self.data.get(region, date).await
    }

    async fn range(
        &self,
        region: &str,
        lo: NaiveDate,
        hi: NaiveDate,
    ) -> regional_signal::Result<Vec<CaseObservation>> {
        self.data.range(region, lo, hi).await
    }
}

/// Facility counts with the same per-region latency and failure injection.
#[derive(Default)]
struct ScriptedFacilities {
    inner: InMemoryFacilityStore,
    delays: HashMap<String, Duration>,
    failing: HashSet<String>,
}

impl ScriptedFacilities {
    fn ten_everywhere() -> Self {
        let counts = RegionCatalog::global().all().iter().map(|region| FacilityCount {
            region: region.name.to_string(),
            count: 10,
        });
        Self {
            inner: InMemoryFacilityStore::from_counts(counts.collect::<Vec<_>>()),
            ..Default::default()
        }
    }

    fn delay(mut self, region: &str, delay: Duration) -> Self {
        self.delays.insert(region.to_string(), delay);
        self
    }

    fn fail(mut self, region: &str) -> Self {
        self.failing.insert(region.to_string());
        self
    }
}

#[async_trait]
impl FacilityStore for ScriptedFacilities {
    async fn count_by_region(&self, region: &str) -> regional_signal::Result<u64> {
        if let Some(delay) = self.delays.get(region) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(region) {
            return Err(SignalError::store_unavailable(region, "facility registry offline"));
        }
        self.inner.count_by_region(region).await
    }
}

// 10 cases over 10 facilities at 0.57 occupancy
fn capacity_engine(facilities: ScriptedFacilities, timeout: Duration) -> SignalEngine {
    SignalEngine::new(
        Arc::new(rising_everywhere()),
        Arc::new(facilities),
        AggregatorSettings::default().with_timeout(timeout),
    )
}

#[tokio::test]
async fn test_capacity_facility_failure_is_isolated() {
    let facilities = ScriptedFacilities::ten_everywhere().fail("Shizuoka");
    let engine = capacity_engine(facilities, Duration::from_secs(5));

    let signals = engine.capacity("2022-01-03").await.unwrap();
    assert_eq!(signals.len(), 47);

    let shizuoka = signals.iter().find(|s| s.region == "Shizuoka").unwrap();
    assert_eq!(shizuoka.tier, Tier::Error);
    assert_eq!(shizuoka.utilization, None);
    assert!(shizuoka
        .error
        .as_deref()
        .unwrap()
        .contains("facility registry offline"));

    assert!(signals
        .iter()
        .filter(|s| s.region != "Shizuoka")
        .all(|s| s.tier == Tier::AttentionArea && s.facility_count == Some(10)));
}

#[tokio::test]
async fn test_capacity_slow_facility_read_times_out() {
    let facilities =
        ScriptedFacilities::ten_everywhere().delay("Yamaguchi", Duration::from_secs(30));
    let engine = capacity_engine(facilities, Duration::from_millis(200));

    let started = std::time::Instant::now();
    let signals = engine.capacity("2022-01-03").await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));

    assert_eq!(signals.len(), 47);
    let yamaguchi = signals.iter().find(|s| s.region == "Yamaguchi").unwrap();
    assert_eq!(yamaguchi.tier, Tier::Timeout);
    assert_eq!(yamaguchi.facility_count, None);

    assert!(signals
        .iter()
        .filter(|s| s.region != "Yamaguchi")
        .all(|s| s.tier == Tier::AttentionArea));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_capacity_randomized_latency_keeps_catalog_order() {
    let expected: Vec<&str> = RegionCatalog::global().all().iter().map(|r| r.name).collect();

    for iteration in 0..200 {
        let facilities = {
            let mut rng = rand::rng();
            expected
                .iter()
                .fold(ScriptedFacilities::ten_everywhere(), |store, name| {
                    store.delay(name, Duration::from_micros(rng.random_range(0..300)))
                })
        };
        let engine = capacity_engine(facilities, Duration::from_secs(10));

        let signals = engine.capacity("2022-01-03").await.unwrap();
        let names: Vec<&str> = signals.iter().map(|s| s.region.as_str()).collect();
        assert_eq!(names, expected, "iteration {}", iteration);
        assert!(
            signals.iter().all(|s| s.tier == Tier::AttentionArea),
            "iteration {}",
            iteration
        );
    }
}
