//! Time utilities for OpenID Federation.
//!
//! All timestamps are JWT NumericDate values: seconds since Unix epoch (u64).

/// Return the current time as seconds since Unix epoch.
pub fn now_secs() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// Convert seconds since epoch to an RFC 3339 string.
pub fn secs_to_rfc3339(secs: u64) -> String {
    let secs = i64::try_from(secs).unwrap_or(i64::MAX);
    let dt = chrono::DateTime::from_timestamp(secs, 0).unwrap_or(chrono::DateTime::UNIX_EPOCH);
    dt.to_rfc3339()
}
