//! Creation/update hooks for persisted records.

use chrono::{DateTime, SubsecRound, Utc};

/// Hooks a repository operation runs on a record right before writing it.
pub trait LifecycleHooks {
    /// First save: stamps both `created_at` and `updated_at` with `now`.
    fn pre_persist(&mut self, now: DateTime<Utc>);
    /// Any later save: refreshes `updated_at` only.
    fn pre_update(&mut self, now: DateTime<Utc>);
}

/// Current time at the precision storage keeps (microseconds).
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
