//! Collection orchestration.
//!
//! The [`Orchestrator`] fans out to every enabled probe concurrently, waits
//! for all of them (each bounded by its own timeout), then parses and merges
//! the results in a fixed order into one [`Snapshot`](crate::model::Snapshot).
//!
//! ```text
//! Idle → Collecting { Pending | Done } → Rendering → Idle
//! ```

mod cache;
mod orchestrator;
mod probes;
mod stats;

pub use cache::ScrapeCache;
pub use orchestrator::{Orchestrator, Subsystem, SubsystemState};
pub use probes::{ProbeSet, ProbeSlot};
pub use stats::{ExporterStats, StatsError};
