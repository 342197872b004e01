//! Relative time ranges and the alert creation threshold derived from them

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, SecondsFormat, Utc};

use crate::error::{Error, Result};

/// Millisecond-precision UTC layout expected by the alerts API filter
pub const THRESHOLD_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// A signed duration such as `-24h`, `-1h 30m` or `+15m`.
///
/// The magnitude uses humantime units (`ms`, `s`, `m`, `h`, `d`, ...). A leading
/// `-` makes the range point into the past; no sign or `+` points forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange(Duration);

impl TimeRange {
    /// Parse a signed duration string
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let (negative, magnitude) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let magnitude = magnitude.trim_start();
        if magnitude.is_empty() {
            return Err(Error::invalid_duration(input, "empty duration"));
        }

        let parsed = humantime::parse_duration(magnitude)
            .map_err(|e| Error::invalid_duration(input, e.to_string()))?;
        let delta = Duration::from_std(parsed)
            .map_err(|_| Error::invalid_duration(input, "duration out of range"))?;

        Ok(Self(if negative { -delta } else { delta }))
    }

    /// The signed duration
    pub fn duration(&self) -> Duration {
        self.0
    }
}

impl FromStr for TimeRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Lower bound (inclusive) on alert creation time for one fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    /// First instant included in the window
    pub start: DateTime<Utc>,
}

impl TimeWindow {
    /// Window starting at `now + range`, using the current UTC wall clock
    pub fn from_now(range: TimeRange) -> Result<Self> {
        Self::relative_to(Utc::now(), range)
    }

    /// Window starting at `now + range`
    pub fn relative_to(now: DateTime<Utc>, range: TimeRange) -> Result<Self> {
        let start = now
            .checked_add_signed(range.duration())
            .ok_or_else(|| Error::invalid_duration(format!("{:?}", range.duration()), "threshold out of range"))?;

        Ok(Self { start })
    }

    /// Threshold in `YYYY-MM-DDTHH:mm:ss.sssZ` form
    pub fn threshold(&self) -> String {
        self.start.format(THRESHOLD_FORMAT).to_string()
    }

    /// OData `$filter` expression selecting alerts created in the window
    pub fn filter(&self) -> String {
        format!("alertCreationTime ge {}", self.threshold())
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.start.to_rfc3339_opts(SecondsFormat::Nanos, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 10, 30, 15).unwrap() + Duration::milliseconds(123)
    }

    #[rstest]
    #[case("-24h", -24 * 3600)]
    #[case("-72h", -72 * 3600)]
    #[case("-90m", -90 * 60)]
    #[case("-1h 30m", -90 * 60)]
    #[case("+15m", 15 * 60)]
    #[case("2d", 2 * 86400)]
    #[case(" -30s ", -30)]
    fn test_parse_signed_durations(#[case] input: &str, #[case] seconds: i64) {
        let range = TimeRange::parse(input).unwrap();
        assert_eq!(range.duration(), Duration::seconds(seconds));
    }

    #[rstest]
    #[case("")]
    #[case("-")]
    #[case("24")]
    #[case("yesterday")]
    #[case("--24h")]
    fn test_reject_invalid_durations(#[case] input: &str) {
        let err = TimeRange::parse(input).unwrap_err();
        assert!(matches!(err, Error::InvalidDuration { .. }), "{input:?} gave {err}");
    }

    #[test]
    fn test_threshold_is_now_minus_range() {
        let range: TimeRange = "-24h".parse().unwrap();
        let window = TimeWindow::relative_to(fixed_now(), range).unwrap();

        assert_eq!(window.start, fixed_now() - Duration::hours(24));
        assert_eq!(window.threshold(), "2024-01-01T10:30:15.123Z");
    }

    #[test]
    fn test_threshold_pads_milliseconds() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 4, 5, 6).unwrap();
        let window = TimeWindow::relative_to(now, TimeRange::parse("-1h").unwrap()).unwrap();

        assert_eq!(window.threshold(), "2024-03-09T03:05:06.000Z");
    }

    #[test]
    fn test_filter_expression() {
        let window = TimeWindow::relative_to(fixed_now(), TimeRange::parse("-72h").unwrap()).unwrap();
        assert_eq!(window.filter(), "alertCreationTime ge 2023-12-30T10:30:15.123Z");
    }

    #[test]
    fn test_from_now_uses_wall_clock() {
        let before = Utc::now();
        let window = TimeWindow::from_now(TimeRange::parse("-1h").unwrap()).unwrap();
        let after = Utc::now();

        assert!(window.start >= before - Duration::hours(1));
        assert!(window.start <= after - Duration::hours(1));
    }
}
