//! One task per region, one collector.
//!
//! Workers never touch the result set. Each sends its outcome over a bounded
//! channel sized to the dispatch, and the calling task is the only reader.

use crate::domain::model::Region;
use crate::utils::error::{Result, SignalError};
use std::collections::HashSet;
use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Raw per-region outcomes in arrival order.
#[derive(Debug)]
pub struct Collected<T> {
    pub outcomes: Vec<(Region, Result<T>)>,
    /// The deadline fired before every region reported.
    pub deadline_hit: bool,
}

impl<T> Collected<T> {
    pub fn empty() -> Self {
        Self {
            outcomes: Vec::new(),
            deadline_hit: false,
        }
    }
}

type Report<T> = (Region, Result<T>);

/// A worker's single send. Dropped unsent (the worker panicked or was
/// cancelled), it reports the region as lost instead of staying silent.
struct Reporter<T> {
    region: Region,
    tx: Option<mpsc::Sender<Report<T>>>,
}

impl<T> Reporter<T> {
    fn new(region: Region, tx: mpsc::Sender<Report<T>>) -> Self {
        Self {
            region,
            tx: Some(tx),
        }
    }

    async fn send(mut self, outcome: Result<T>) {
        if let Some(tx) = self.tx.take() {
            // the collector is gone once the deadline fired
            let _ = tx.send((self.region, outcome)).await;
        }
    }
}

impl<T> Drop for Reporter<T> {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            // one slot per region, so this never finds the channel full
            let lost = SignalError::WorkerLost {
                region: self.region.name.to_string(),
            };
            let _ = tx.try_send((self.region, Err(lost)));
        }
    }
}

/// Runs `work` for every region concurrently and collects what reports before `deadline`.
///
/// Tasks still running at the deadline are aborted when this returns.
pub async fn fan_out<T, F, Fut>(regions: &[Region], deadline: Instant, work: F) -> Collected<T>
where
    T: Send + 'static,
    F: Fn(Region) -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let expected: HashSet<u8> = regions.iter().map(|r| r.code).collect();
    if expected.is_empty() {
        return Collected::empty();
    }

    let (tx, mut rx) = mpsc::channel::<Report<T>>(expected.len());
    let mut workers = JoinSet::new();

    for region in regions.iter().copied() {
        let reporter = Reporter::new(region, tx.clone());
        let unit = work(region);
        workers.spawn(async move {
            let outcome = unit.await;
            reporter.send(outcome).await;
        });
    }
    drop(tx);

    tracing::debug!("dispatched {} region tasks", workers.len());

    let mut outcomes = Vec::with_capacity(expected.len());
    let mut reported = HashSet::with_capacity(expected.len());
    let mut deadline_hit = false;

    while reported.len() < expected.len() {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Some((region, outcome))) => {
                reported.insert(region.code);
                outcomes.push((region, outcome));
            }
            Ok(None) => break,
            Err(_) => {
                deadline_hit = true;
                tracing::warn!(
                    "deadline reached with {} of {} regions pending",
                    expected.len() - reported.len(),
                    expected.len()
                );
                break;
            }
        }
    }

    workers.abort_all();

    Collected {
        outcomes,
        deadline_hit,
    }
}
