//! Time-window filter helpers
//!
//! Builders for the filter conditions queries most often need: records
//! created or updated inside a window, records older or younger than an age,
//! and records about to expire. Timestamps compare as their stored RFC 3339
//! strings; `expires` compares as Unix seconds.

use chrono::{DateTime, Utc};
use std::time::Duration;

use dynamap_core::clock::format_timestamp;
use dynamap_core::{attr, Clock, Condition, ATTR_CREATED, ATTR_EXPIRES, ATTR_UPDATED};

/// `attribute <= end`
pub fn period_before(attribute: &str, end: DateTime<Utc>) -> Condition {
    attr(attribute).le(format_timestamp(&end))
}

/// `attribute >= start`
pub fn period_after(attribute: &str, start: DateTime<Utc>) -> Condition {
    attr(attribute).ge(format_timestamp(&start))
}

/// `attribute BETWEEN start AND end`
pub fn period_between(attribute: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Condition {
    attr(attribute).between(format_timestamp(&start), format_timestamp(&end))
}

/// Created at or before `end`
pub fn created_before(end: DateTime<Utc>) -> Condition {
    period_before(ATTR_CREATED, end)
}

/// Created at or after `start`
pub fn created_after(start: DateTime<Utc>) -> Condition {
    period_after(ATTR_CREATED, start)
}

/// Created inside `[start, end]`
pub fn created_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Condition {
    period_between(ATTR_CREATED, start, end)
}

/// Updated at or before `end`
pub fn updated_before(end: DateTime<Utc>) -> Condition {
    period_before(ATTR_UPDATED, end)
}

/// Updated at or after `start`
pub fn updated_after(start: DateTime<Utc>) -> Condition {
    period_after(ATTR_UPDATED, start)
}

/// Updated inside `[start, end]`
pub fn updated_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Condition {
    period_between(ATTR_UPDATED, start, end)
}

/// Created at least `age` ago
pub fn min_age(age: Duration, clock: &Clock) -> Condition {
    created_before(clock() - to_chrono(age))
}

/// Created at most `age` ago
pub fn max_age(age: Duration, clock: &Clock) -> Condition {
    created_after(clock() - to_chrono(age))
}

/// Expires strictly before `moment`
pub fn expires_before(moment: DateTime<Utc>) -> Condition {
    attr(ATTR_EXPIRES).lt(moment.timestamp())
}

/// Expires strictly after `moment`
pub fn expires_after(moment: DateTime<Utc>) -> Condition {
    attr(ATTR_EXPIRES).gt(moment.timestamp())
}

/// Expires between now and `period` from now
pub fn expires_in(period: Duration, clock: &Clock) -> Condition {
    let now = clock();
    attr(ATTR_EXPIRES).between(now.timestamp(), (now + to_chrono(period)).timestamp())
}

// Durations beyond chrono's range saturate; a window that large matches everything anyway.
fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::days(365 * 1000))
}
