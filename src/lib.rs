// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod cli;
pub mod config;
pub mod ingest;
pub mod render;
pub mod setup;
pub mod timeline;

// ---- Re-exports for stable public API ----
pub use crate::config::HoundConfig;
pub use crate::ingest::dispatch::{dispatch, DispatchCfg, DispatchError};
pub use crate::ingest::merge::merge_batches;
pub use crate::ingest::types::{Activation, Event, FetchOperation, Payload, SourceKind};
pub use crate::ingest::{aggregate, collect_stats, Collected};
pub use crate::render::{Rendered, Renderer};
pub use crate::timeline::{layout, DayLabel, DayPartitioner, Entry};
