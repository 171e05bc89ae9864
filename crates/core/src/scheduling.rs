//! Wall-clock scheduling helpers for the daily lifecycle sweeps.

use chrono::{Duration, NaiveTime};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Parse an `HH:MM` time of day (UTC).
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, CoreError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|e| CoreError::Validation(format!("Invalid time of day '{value}': {e}")))
}

/// Next instant strictly after `now` whose UTC time of day equals `at`.
pub fn next_daily_run(now: Timestamp, at: NaiveTime) -> Timestamp {
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn parses_hours_and_minutes() {
        let t = parse_time_of_day("01:30").unwrap();
        assert_eq!(t, NaiveTime::from_hms_opt(1, 30, 0).unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert_matches!(parse_time_of_day("25:00"), Err(CoreError::Validation(_)));
        assert_matches!(parse_time_of_day("midnight"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn next_run_later_today() {
        let now = Utc.with_ymd_and_hms(2026, 5, 4, 0, 30, 0).unwrap();
        let at = NaiveTime::from_hms_opt(1, 0, 0).unwrap();
        assert_eq!(
            next_daily_run(now, at),
            Utc.with_ymd_and_hms(2026, 5, 4, 1, 0, 0).unwrap()
        );
    }

    #[test]
    fn next_run_rolls_to_tomorrow_when_time_passed_or_equal() {
        let at = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
        let exactly = Utc.with_ymd_and_hms(2026, 5, 4, 0, 0, 0).unwrap();
        assert_eq!(
            next_daily_run(exactly, at),
            Utc.with_ymd_and_hms(2026, 5, 5, 0, 0, 0).unwrap()
        );
        let later = Utc.with_ymd_and_hms(2026, 5, 4, 13, 0, 0).unwrap();
        assert_eq!(
            next_daily_run(later, at),
            Utc.with_ymd_and_hms(2026, 5, 5, 0, 0, 0).unwrap()
        );
    }
}
