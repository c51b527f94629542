// src/ingest/mod.rs
pub mod dispatch;
pub mod merge;
pub mod providers;
pub mod types;

use crate::ingest::dispatch::{dispatch, DispatchCfg, DispatchError};
use crate::ingest::merge::merge_batches;
use crate::ingest::types::{Activation, Event, Stat};
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up once a recorder is installed).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("hound_fetch_total", "Fetch operations started.");
        describe_counter!(
            "hound_fetch_errors_total",
            "Fetch operations that failed and contributed an empty batch."
        );
        describe_counter!(
            "hound_fetch_timeouts_total",
            "Fetch operations cut off by the per-source deadline."
        );
        describe_counter!(
            "hound_aggregation_timeouts_total",
            "Runs that hit the overall deadline."
        );
        describe_counter!("hound_events_total", "Events placed on the timeline.");
        describe_histogram!("hound_fetch_ms", "Fetch duration in milliseconds.");
    });
}

/// Strip HTML from a feed title: decode entities, drop tags, collapse whitespace.
pub fn sanitize_html(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

/// What one run collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collected<T> {
    pub items: Vec<T>,
    /// Operations that delivered a batch (failed ones deliver an empty batch).
    pub reported: usize,
    pub expected: usize,
}

impl<T> Collected<T> {
    /// False when the overall deadline cut the run short.
    pub fn is_complete(&self) -> bool {
        self.reported == self.expected
    }
}

/// Dispatch every activation, then merge into one recency-ordered timeline.
///
/// Source failures never surface here. When the overall deadline elapses the
/// batches that did arrive are still merged, and the result is marked
/// incomplete.
pub async fn aggregate(activations: &[Activation<Event>], cfg: DispatchCfg) -> Collected<Event> {
    ensure_metrics_described();
    let expected = activations.len();

    let (batches, reported) = match dispatch(activations, cfg).await {
        Ok(batches) => (batches, expected),
        Err(DispatchError::TimedOut {
            reported, partial, ..
        }) => (partial, reported),
    };

    let events = merge_batches(batches);
    counter!("hound_events_total").increment(events.len() as u64);
    tracing::info!(
        target: "ingest",
        events = events.len(),
        reported,
        expected,
        "aggregation finished"
    );

    Collected {
        items: events,
        reported,
        expected,
    }
}

/// Same fan-out for the stats listing. Stats keep activation order; a source
/// that reported nothing still gets an empty block.
pub async fn collect_stats(activations: &[Activation<Stat>], cfg: DispatchCfg) -> Collected<Stat> {
    ensure_metrics_described();
    let expected = activations.len();

    match dispatch(activations, cfg).await {
        Ok(batches) => Collected {
            items: batches
                .into_iter()
                .zip(activations)
                .flat_map(|(batch, act)| {
                    if batch.is_empty() {
                        vec![Stat {
                            source: act.source,
                            items: Vec::new(),
                        }]
                    } else {
                        batch
                    }
                })
                .collect(),
            reported: expected,
            expected,
        },
        // slots that never arrived cannot be attributed; the run is flagged incomplete
        Err(DispatchError::TimedOut {
            reported, partial, ..
        }) => Collected {
            items: partial.into_iter().flatten().collect(),
            reported,
            expected,
        },
    }
}
