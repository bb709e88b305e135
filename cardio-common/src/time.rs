//! Timestamp utilities

use chrono::{DateTime, Local, Utc};

/// ISO calendar date in local time, e.g. `2026-10-14`
pub fn iso_date(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%Y-%m-%d").to_string()
}

/// Human-readable local timestamp for report headers
pub fn display_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Milliseconds elapsed since `start`, clamped at zero
pub fn elapsed_ms(start: DateTime<Utc>) -> u64 {
    Utc::now()
        .signed_duration_since(start)
        .num_milliseconds()
        .max(0) as u64
}
