//! Duration tracking for "for" conditions
//!
//! `state_held_for` is a pure point-in-time computation: no timers, no
//! background polling. The host re-evaluates conditions on every relevant
//! state change, so "held for" only needs to compare the last transition
//! timestamp against the current clock reading.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Whether a state has been held continuously for at least `required`
///
/// `last_changed` is the timestamp of the last transition into the current
/// value, so a state that flips away and back restarts the span.
pub fn state_held_for(
    last_changed: DateTime<Utc>,
    now: DateTime<Utc>,
    required: Duration,
) -> bool {
    let held = now.signed_duration_since(last_changed);
    match chrono::Duration::from_std(required) {
        Ok(required) => held >= required,
        Err(_) => false,
    }
}

/// Serde support for the `for` field's wire formats
///
/// Accepts a time period dict (`{"seconds": 5}`, any of days/hours/minutes/
/// seconds/milliseconds), an `"HH:MM:SS"` string, or a bare number of
/// seconds. Negative components are rejected at parse time. Serializes back
/// to the dict form.
pub mod time_period {
    use serde::de::Error as DeError;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TimePeriod {
        Dict {
            #[serde(default)]
            days: f64,
            #[serde(default)]
            hours: f64,
            #[serde(default)]
            minutes: f64,
            #[serde(default)]
            seconds: f64,
            #[serde(default)]
            milliseconds: f64,
        },
        Text(String),
        Seconds(f64),
    }

    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(d) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("seconds", &d.as_secs_f64())?;
                map.end()
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt: Option<TimePeriod> = Option::deserialize(deserializer)?;
        match opt {
            None => Ok(None),
            Some(period) => to_duration(period).map(Some).map_err(D::Error::custom),
        }
    }

    fn to_duration(period: TimePeriod) -> Result<Duration, String> {
        let total_seconds = match period {
            TimePeriod::Dict {
                days,
                hours,
                minutes,
                seconds,
                milliseconds,
            } => days * 86400.0 + hours * 3600.0 + minutes * 60.0 + seconds + milliseconds / 1000.0,
            TimePeriod::Text(s) => parse_clock_format(&s)?,
            TimePeriod::Seconds(secs) => secs,
        };

        if total_seconds < 0.0 {
            return Err(format!("time period must be non-negative: {total_seconds}"));
        }
        // try_from rejects NaN, infinity, and values past Duration's range
        Duration::try_from_secs_f64(total_seconds)
            .map_err(|_| format!("time period out of range: {total_seconds}"))
    }

    fn parse_clock_format(s: &str) -> Result<f64, String> {
        let parts: Vec<&str> = s.split(':').collect();
        let parse = |p: &str, what: &str| -> Result<f64, String> {
            p.parse::<f64>().map_err(|_| format!("invalid {what}: {p}"))
        };
        match parts.as_slice() {
            [secs] => parse(secs, "seconds"),
            [mins, secs] => Ok(parse(mins, "minutes")? * 60.0 + parse(secs, "seconds")?),
            [hours, mins, secs] => Ok(parse(hours, "hours")? * 3600.0
                + parse(mins, "minutes")? * 60.0
                + parse(secs, "seconds")?),
            _ => Err(format!("invalid time period: {s}")),
        }
    }
}
