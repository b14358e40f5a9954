//! CSV snapshots for the in-memory stores.
//!
//! Case files use the header `date,region,count`, facility files `region,count`.
//! Region names may be romanized or Japanese; they are stored under the
//! catalog's romanized name.

use crate::adapters::memory::{InMemoryCaseStore, InMemoryFacilityStore};
use crate::domain::catalog::RegionCatalog;
use crate::domain::model::{CaseObservation, FacilityCount};
use crate::utils::error::{Result, SignalError};
use crate::utils::validation::parse_iso_date;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct CaseRow {
    date: String,
    region: String,
    count: u64,
}

#[derive(Debug, Deserialize)]
struct FacilityRow {
    region: String,
    count: u64,
}

fn canonical_region(raw: &str, line: usize) -> Result<&'static str> {
    RegionCatalog::global()
        .lookup(raw)
        .map(|r| r.name)
        .ok_or_else(|| {
            SignalError::invalid_input("region", raw, format!("unknown region on line {}", line))
        })
}

pub fn read_case_records<R: Read>(reader: R) -> Result<Vec<CaseObservation>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut observations = Vec::new();
    let mut seen = HashSet::new();

    for (index, row) in csv_reader.deserialize::<CaseRow>().enumerate() {
        let row = row?;
        // header is line 1
        let line = index + 2;
        let region = canonical_region(&row.region, line)?;
        let date = parse_iso_date("date", &row.date)?;
        if !seen.insert((region, date)) {
            tracing::warn!(
                "duplicate case row for {} on {} (line {}); keeping the later one",
                region,
                date,
                line
            );
        }
        observations.push(CaseObservation {
            date,
            region: region.to_string(),
            count: row.count,
        });
    }

    tracing::debug!("read {} case rows", observations.len());
    Ok(observations)
}

/// Rows for the same region are summed (one row per facility type, for example).
pub fn read_facility_counts<R: Read>(reader: R) -> Result<Vec<FacilityCount>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut totals: BTreeMap<&'static str, u64> = BTreeMap::new();

    for (index, row) in csv_reader.deserialize::<FacilityRow>().enumerate() {
        let row = row?;
        let region = canonical_region(&row.region, index + 2)?;
        let total = totals.entry(region).or_insert(0);
        *total = total.saturating_add(row.count);
    }

    Ok(totals
        .into_iter()
        .map(|(region, count)| FacilityCount {
            region: region.to_string(),
            count,
        })
        .collect())
}

pub fn load_case_store<P: AsRef<Path>>(path: P) -> Result<InMemoryCaseStore> {
    let file = std::fs::File::open(path.as_ref())?;
    let observations = read_case_records(file)?;
    tracing::info!(
        "Loaded {} case observations from {}",
        observations.len(),
        path.as_ref().display()
    );
    Ok(InMemoryCaseStore::from_observations(observations))
}

pub fn load_facility_store<P: AsRef<Path>>(path: P) -> Result<InMemoryFacilityStore> {
    let file = std::fs::File::open(path.as_ref())?;
    let counts = read_facility_counts(file)?;
    tracing::info!(
        "Loaded facility counts for {} regions from {}",
        counts.len(),
        path.as_ref().display()
    );
    Ok(InMemoryFacilityStore::from_counts(counts))
}
