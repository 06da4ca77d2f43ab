//! Pipeline statistics

pub mod store;

pub use store::{PipelineStats, StatsSnapshot};
