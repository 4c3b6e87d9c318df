use chrono::{DateTime, NaiveDate, Utc};

/// Inclusive UTC bounds of one calendar day, at millisecond precision:
/// `[00:00:00.000, 23:59:59.999]`.
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date
        .and_hms_milli_opt(0, 0, 0, 0)
        .unwrap_or_default()
        .and_utc();
    let end = date
        .and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_default()
        .and_utc();
    (start, end)
}
