//! Daily usage quota.
//!
//! - `model`: `UsageRecord` and the `Allowance` answer type
//! - `tracker`: `UsageTracker`, windowed check/consume over the local store

mod model;
mod tracker;

pub use model::{Allowance, UsageRecord};
pub use tracker::UsageTracker;
