// src/ingest/dispatch.rs
//! Fan-out/fan-in over an activation set.
//!
//! Every operation runs in its own task and delivers exactly one batch into a
//! shared channel. Failures and per-operation timeouts degrade to an empty
//! batch; only the overall deadline surfaces as an error, carrying whatever
//! was collected so far.

use std::time::Duration;

use metrics::{counter, histogram};
use tokio::sync::mpsc;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, warn};

use crate::ingest::types::Activation;

pub const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_OVERALL_TIMEOUT_SECS: u64 = 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchCfg {
    /// Upper bound for a single fetch operation.
    pub source_timeout: Duration,
    /// Upper bound for collecting every batch of a run.
    pub overall_timeout: Duration,
}

impl Default for DispatchCfg {
    fn default() -> Self {
        Self {
            source_timeout: Duration::from_secs(DEFAULT_SOURCE_TIMEOUT_SECS),
            overall_timeout: Duration::from_secs(DEFAULT_OVERALL_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError<T> {
    /// The run deadline elapsed before every operation reported.
    /// `partial` holds the batches that did arrive, in activation order.
    #[error("aggregation timed out, {reported}/{expected} sources reported")]
    TimedOut {
        reported: usize,
        expected: usize,
        partial: Vec<Vec<T>>,
    },
}

struct Delivery<T> {
    index: usize,
    batch: Vec<T>,
}

/// Run every activation concurrently and wait for exactly one batch each.
///
/// Batches come back in activation order, not arrival order, so the merge
/// that follows sees the same input sequence on every run.
pub async fn dispatch<T>(
    activations: &[Activation<T>],
    cfg: DispatchCfg,
) -> Result<Vec<Vec<T>>, DispatchError<T>>
where
    T: Send + 'static,
{
    let expected = activations.len();
    if expected == 0 {
        return Ok(Vec::new());
    }

    // Capacity == number of senders, so a delivery never waits.
    let (tx, mut rx) = mpsc::channel::<Delivery<T>>(expected);
    let mut handles = Vec::with_capacity(expected);

    for (index, activation) in activations.iter().enumerate() {
        let activation = activation.clone();
        let tx = tx.clone();
        let limit = cfg.source_timeout;
        handles.push(tokio::spawn(async move {
            let batch = run_operation(&activation, limit).await;
            // A closed receiver means the run already gave up on this task.
            let _ = tx.send(Delivery { index, batch }).await;
        }));
    }
    drop(tx);

    let deadline = Instant::now() + cfg.overall_timeout;
    let mut slots: Vec<Option<Vec<T>>> = (0..expected).map(|_| None).collect();
    let mut reported = 0usize;

    while reported < expected {
        match timeout_at(deadline, rx.recv()).await {
            Ok(Some(Delivery { index, batch })) => {
                if slots[index].replace(batch).is_none() {
                    reported += 1;
                }
            }
            Ok(None) => {
                // All senders dropped: a task died (panicked) without reporting.
                for (index, slot) in slots.iter_mut().enumerate() {
                    if slot.is_none() {
                        warn!(
                            operation = %activations[index].label(),
                            "fetch task ended without reporting, using empty batch"
                        );
                        counter!("hound_fetch_errors_total").increment(1);
                        *slot = Some(Vec::new());
                    }
                }
                reported = expected;
            }
            Err(_) => {
                for handle in &handles {
                    handle.abort();
                }
                let missing: Vec<String> = slots
                    .iter()
                    .enumerate()
                    .filter(|(_, slot)| slot.is_none())
                    .map(|(index, _)| activations[index].label())
                    .collect();
                warn!(reported, expected, ?missing, "aggregation deadline elapsed");
                counter!("hound_aggregation_timeouts_total").increment(1);
                let partial = slots.into_iter().flatten().collect();
                return Err(DispatchError::TimedOut {
                    reported,
                    expected,
                    partial,
                });
            }
        }
    }

    Ok(slots.into_iter().map(Option::unwrap_or_default).collect())
}

async fn run_operation<T>(activation: &Activation<T>, limit: Duration) -> Vec<T> {
    let label = activation.label();
    let t0 = std::time::Instant::now();
    counter!("hound_fetch_total").increment(1);

    let batch = match timeout(limit, activation.operation.fetch()).await {
        Ok(Ok(batch)) => {
            debug!(operation = %label, items = batch.len(), "fetch ok");
            batch
        }
        Ok(Err(e)) => {
            warn!(error = ?e, operation = %label, "fetch failed, using empty batch");
            counter!("hound_fetch_errors_total").increment(1);
            Vec::new()
        }
        Err(_) => {
            warn!(
                operation = %label,
                timeout_ms = limit.as_millis() as u64,
                "fetch timed out, using empty batch"
            );
            counter!("hound_fetch_timeouts_total").increment(1);
            Vec::new()
        }
    };

    histogram!("hound_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    batch
}
