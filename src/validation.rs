//! Input parsing and validation for request values and session ids

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::todo::RequestValue;

/// Maximum accepted length of a session cookie value
pub const MAX_SESSION_ID_LENGTH: usize = 64;

/// Validate a session id (UUID format)
pub fn validate_session_id(session_id: &str) -> Result<uuid::Uuid> {
    if session_id.len() > MAX_SESSION_ID_LENGTH {
        return Err(anyhow!(
            "session id too long: {} chars (max: {})",
            session_id.len(),
            MAX_SESSION_ID_LENGTH
        ));
    }
    uuid::Uuid::parse_str(session_id).map_err(|e| anyhow!("Invalid session id format: {e}"))
}

/// Parse a priority: a non-negative integer or a string of ASCII digits
pub fn parse_priority(value: &RequestValue) -> Option<u64> {
    match value {
        RequestValue::Integer(i) => u64::try_from(*i).ok(),
        RequestValue::Text(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            s.parse().ok()
        }
        _ => None,
    }
}

/// Parse a free-form date/time string in the zone of `now`
///
/// Handles the relative words `now`, `today`, `tomorrow` and `yesterday`
/// (an empty string means `now`), then defers to `dateparser` for absolute
/// formats such as `2024-01-01`, RFC 3339 and RFC 2822. Inputs without a
/// zone are read in `now`'s zone, and date-only inputs as local midnight.
pub fn parse_date<Tz: TimeZone>(input: &str, now: DateTime<Tz>) -> Result<DateTime<Utc>> {
    let trimmed = input.trim();
    let zone = now.timezone();
    let today = now.date_naive();

    let day = match trimmed.to_lowercase().as_str() {
        "" | "now" => return Ok(now.with_timezone(&Utc)),
        "today" | "midnight" => Some(today),
        "tomorrow" => today.succ_opt(),
        "yesterday" => today.pred_opt(),
        _ => return dateparser::parse_with(trimmed, &zone, NaiveTime::MIN),
    };
    let day = day.ok_or_else(|| anyhow!("date out of range: {trimmed}"))?;
    Ok(local_midnight(&zone, day))
}

fn local_midnight<Tz: TimeZone>(zone: &Tz, day: NaiveDate) -> DateTime<Utc> {
    let naive = day.and_time(NaiveTime::MIN);
    // Some zones skip midnight on DST days; the day then starts an hour later.
    zone.from_local_datetime(&naive)
        .earliest()
        .or_else(|| zone.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use chrono_tz::America::Chicago;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 13, 30, 0).unwrap()
    }

    #[test]
    fn test_validate_session_id() {
        let id = uuid::Uuid::new_v4().to_string();
        assert!(validate_session_id(&id).is_ok());
        assert!(validate_session_id("not-a-session").is_err());
        assert!(validate_session_id(&"a".repeat(100)).is_err());
    }

    #[test]
    fn test_parse_priority() {
        assert_eq!(parse_priority(&RequestValue::Integer(3)), Some(3));
        assert_eq!(parse_priority(&RequestValue::Text("12".to_string())), Some(12));
        assert_eq!(parse_priority(&RequestValue::Integer(-1)), None);
        assert_eq!(parse_priority(&RequestValue::Text("-1".to_string())), None);
        assert_eq!(parse_priority(&RequestValue::Text("1.5".to_string())), None);
        assert_eq!(parse_priority(&RequestValue::Text(String::new())), None);
        assert_eq!(parse_priority(&RequestValue::Float(2.0)), None);
        assert_eq!(parse_priority(&RequestValue::Bool(true)), None);
    }

    #[test]
    fn test_parse_date_only() {
        let parsed = parse_date("2024-01-01", fixed_now()).unwrap();
        assert_eq!((parsed.year(), parsed.month(), parsed.day()), (2024, 1, 1));
        assert_eq!(parsed.hour(), 0);
    }

    #[test]
    fn test_parse_rfc3339() {
        let parsed = parse_date("2024-02-03T04:05:06Z", fixed_now()).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap());
    }

    #[test]
    fn test_parse_relative_words() {
        let now = fixed_now();
        assert_eq!(parse_date("", now).unwrap(), now);
        assert_eq!(parse_date("NOW", now).unwrap(), now);
        assert_eq!(
            parse_date("tomorrow", now).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 16, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(parse_date("not a date at all", fixed_now()).is_err());
    }

    /// 08:30 CDT on June 15th
    fn chicago_now() -> DateTime<chrono_tz::Tz> {
        fixed_now().with_timezone(&Chicago)
    }

    #[test]
    fn test_zone_less_input_uses_local_zone() {
        let parsed = parse_date("2024-01-01 09:00", chicago_now()).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 1, 15, 0, 0).unwrap());

        let explicit = parse_date("2024-02-03T04:05:06Z", chicago_now()).unwrap();
        assert_eq!(explicit, Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap());
    }

    #[test]
    fn test_relative_words_use_local_midnight() {
        assert_eq!(
            parse_date("today", chicago_now()).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 15, 5, 0, 0).unwrap()
        );
        assert_eq!(
            parse_date("tomorrow", chicago_now()).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 16, 5, 0, 0).unwrap()
        );
        assert_eq!(parse_date("now", chicago_now()).unwrap(), fixed_now());
    }
}
