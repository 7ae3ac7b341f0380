//! Freshness policy for sensor results

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Readings older than this are stale for "active" status purposes
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(2 * 60 * 60);

/// Whether a reading recorded at `recorded_at` is fresh right now
pub fn is_fresh(recorded_at: Option<DateTime<Utc>>) -> bool {
    is_fresh_at(recorded_at, Utc::now())
}

/// Whether a reading recorded at `recorded_at` is fresh at `now`
///
/// A missing timestamp is always stale.
pub fn is_fresh_at(recorded_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match recorded_at {
        Some(recorded) => {
            (now - recorded).num_milliseconds() < FRESHNESS_WINDOW.as_millis() as i64
        }
        None => false,
    }
}
