use chrono::{DateTime, TimeZone, Utc};

// Artifactory usually answers with RFC 3339 ("2024-03-01T10:15:30.123Z"),
// older servers send the offset without a colon ("+0100").
pub fn parse_server_datetime(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .map(|dt| dt.with_timezone(&Utc))
}

/// Converts a millisecond epoch into an instant. Out of range values yield `None`.
pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}
