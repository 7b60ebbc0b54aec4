//! Usage accounting.
//!
//! Every provider attempt, failed or not, becomes one [`UsageRecord`];
//! audio served from cache becomes a zero-cost row flagged `cached`.
//! Aggregations (per provider, activity, user, day) are computed over the
//! stored rows on demand.

mod record;
mod store;
mod tracker;

pub use record::{month_key, UsageFilter, UsageRecord};
pub use store::{InMemoryUsageStore, UsageStore};
pub use tracker::{UsageContext, UsageSummary, UsageTracker};
