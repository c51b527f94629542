// src/ingest/merge.rs
use crate::ingest::types::Event;

/// Flatten per-operation batches into one timeline, most recent first.
///
/// The sort is stable: events sharing a timestamp keep the order they had in
/// the concatenated batches. No deduplication happens here.
pub fn merge_batches(batches: Vec<Vec<Event>>) -> Vec<Event> {
    let mut all: Vec<Event> = batches.into_iter().flatten().collect();
    all.sort_by(|a, b| b.on().cmp(&a.on()));
    all
}
