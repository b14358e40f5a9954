use crate::core::fanout::Collected;
use crate::domain::catalog::RegionCatalog;
use crate::domain::model::Region;
use std::collections::HashMap;

/// What became of one dispatched region.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionOutcome<T> {
    Computed(T),
    Failed(String),
    TimedOut,
}

/// Turns collected outcomes into exactly one entry per dispatched region, in catalog order.
pub struct ResultJoiner<'a> {
    catalog: &'a RegionCatalog,
}

impl<'a> ResultJoiner<'a> {
    pub fn new(catalog: &'a RegionCatalog) -> Self {
        Self { catalog }
    }

    pub fn join<T>(
        &self,
        dispatched: &[Region],
        collected: Collected<T>,
    ) -> Vec<(Region, RegionOutcome<T>)> {
        let deadline_hit = collected.deadline_hit;
        let mut by_region: HashMap<&'static str, RegionOutcome<T>> =
            HashMap::with_capacity(dispatched.len());
        let wanted: HashMap<&'static str, &Region> =
            dispatched.iter().map(|r| (r.name, r)).collect();

        for (region, outcome) in collected.outcomes {
            if !wanted.contains_key(region.name) {
                tracing::warn!("dropping outcome for undispatched region {}", region);
                continue;
            }
            if by_region.contains_key(region.name) {
                tracing::warn!("dropping duplicate outcome for {}", region);
                continue;
            }

            let outcome = match outcome {
                Ok(value) => RegionOutcome::Computed(value),
                Err(e) => {
                    tracing::warn!("{}: {}", region, e);
                    RegionOutcome::Failed(e.to_string())
                }
            };
            by_region.insert(region.name, outcome);
        }

        let mut ordered: Vec<Region> = wanted.into_values().copied().collect();
        ordered.sort_by_key(|r| self.catalog.position(r));

        ordered
            .into_iter()
            .map(|region| {
                let outcome = by_region.remove(region.name).unwrap_or_else(|| {
                    if deadline_hit {
                        RegionOutcome::TimedOut
                    } else {
                        RegionOutcome::Failed("worker exited without reporting".to_string())
                    }
                });
                (region, outcome)
            })
            .collect()
    }
}
