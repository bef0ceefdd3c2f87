//! State module for a collect run
//!
//! # Components
//!
//! - `CrawlTarget`: one concrete category listing to paginate
//! - `RunState`: run-wide dedup set, counters and record writers

mod run_state;
mod target;

// Re-export main types
pub use run_state::{DetailOutcome, RunCounters, RunState};
pub use target::CrawlTarget;
