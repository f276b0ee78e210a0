pub(crate) mod cadence;
pub mod daemon;
pub mod jobs;
pub mod plan;

pub use jobs::{JobContext, Scheduler};
