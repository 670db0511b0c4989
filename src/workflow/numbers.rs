//! Human-readable entity numbers: `PREFIX-YYYYMM-NNNNNN`.
//!
//! The suffix is derived from the clock, so two callers in the same
//! millisecond can collide. Uniqueness is enforced by the store's unique
//! index; the engine bumps the attempt counter and retries on a duplicate
//! instead of trusting the formula.

use chrono::{DateTime, Utc};

pub const REQUEST_PREFIX: &str = "REQ";
pub const ORDER_PREFIX: &str = "ORD";
pub const SHIPMENT_PREFIX: &str = "SHP";

/// How many duplicate-number retries before giving up.
pub const MAX_ATTEMPTS: u32 = 5;

pub fn candidate(prefix: &str, now: DateTime<Utc>, attempt: u32) -> String {
    let suffix = (now.timestamp_millis() + i64::from(attempt)).rem_euclid(1_000_000);
    format!("{prefix}-{}-{suffix:06}", now.format("%Y%m"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn format_matches_prefix_year_month_suffix() {
        let at = Utc.with_ymd_and_hms(2026, 3, 7, 12, 0, 0).unwrap();
        let n = candidate(REQUEST_PREFIX, at, 0);
        assert!(n.starts_with("REQ-202603-"));
        assert_eq!(n.len(), "REQ-202603-".len() + 6);
    }

    #[test]
    fn attempts_produce_distinct_candidates() {
        let at = Utc.with_ymd_and_hms(2026, 3, 7, 12, 0, 0).unwrap();
        let a = candidate(ORDER_PREFIX, at, 0);
        let b = candidate(ORDER_PREFIX, at, 1);
        assert_ne!(a, b);
    }
}
