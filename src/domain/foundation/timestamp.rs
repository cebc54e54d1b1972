//! UTC instants for message rows and connection bookkeeping.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A UTC instant.
///
/// On the wire this is an RFC 3339 string; it is the `created_at` clients
/// see on message events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Wrap a value read back from storage.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Time elapsed from this instant until now, zero if it lies ahead.
    pub fn age(&self) -> std::time::Duration {
        (Utc::now() - self.0).to_std().unwrap_or_default()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(rfc3339: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
            .into()
    }

    #[test]
    fn orders_chronologically() {
        let earlier = at("2024-03-01T09:00:00Z");
        let later = at("2024-03-01T09:00:01Z");
        assert!(earlier < later);
    }

    #[test]
    fn round_trips_through_json_as_rfc3339() {
        let ts = at("2024-01-15T10:30:00Z");

        let json = serde_json::to_string(&ts).unwrap();
        assert!(json.starts_with("\"2024-01-15T10:30:00"));
        assert_eq!(serde_json::from_str::<Timestamp>(&json).unwrap(), ts);
    }

    #[test]
    fn display_uses_millisecond_utc() {
        assert_eq!(at("2024-01-15T10:30:00Z").to_string(), "2024-01-15T10:30:00.000Z");
    }

    #[test]
    fn age_of_future_instant_is_zero() {
        let ahead = Timestamp::from_datetime(Utc::now() + Duration::hours(1));
        assert_eq!(ahead.age(), std::time::Duration::ZERO);
    }
}
