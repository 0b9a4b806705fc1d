use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::error::BookingError;

/// Minimum gap between "now" and the requested appointment start.
pub const MIN_LEAD_TIME_HOURS: f64 = 5.0;

// chrono's numeric fields are variable-width, so "12025-06-1" would slip
// through a bare `%Y-%m-%d` parse. Pin every byte's position first.
fn matches_shape(text: &str, shape: &[u8]) -> bool {
    text.len() == shape.len()
        && text.bytes().zip(shape).all(|(b, &s)| match s {
            b'd' => b.is_ascii_digit(),
            sep => b == sep,
        })
}

/// Strict `YYYY-MM-DD` parse. Anything else, including unpadded fields or
/// trailing garbage, is rejected.
pub fn parse_date(text: &str) -> Result<NaiveDate, BookingError> {
    if !matches_shape(text, b"dddd-dd-dd") {
        return Err(BookingError::InvalidFormat);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| BookingError::InvalidFormat)
}

/// Strict 24-hour `HH:MM` parse.
pub fn parse_time(text: &str) -> Result<NaiveTime, BookingError> {
    if !matches_shape(text, b"dd:dd") {
        return Err(BookingError::InvalidFormat);
    }
    NaiveTime::parse_from_str(text, "%H:%M").map_err(|_| BookingError::InvalidFormat)
}

/// Calendar-date comparison only; the time of day supplied later plays no
/// part in this check.
pub fn is_past_date(date: NaiveDate, today: NaiveDate) -> bool {
    date < today
}

/// True when the appointment start is closer than `min_hours` to `now`.
/// The difference is a real-valued hour count, so fractional hours count.
pub fn is_within_min_lead_time(date_time: DateTime<Utc>, now: DateTime<Utc>, min_hours: f64) -> bool {
    let hours = (date_time - now).num_milliseconds() as f64 / 3_600_000.0;
    hours < min_hours
}

/// Combine a validated date and time into the fixed UTC reference frame.
pub fn combine_utc(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    date.and_time(time).and_utc()
}

/// Full date check for a conversation turn: strict parse, then past-date
/// rejection against the injected "today".
pub fn validate_date(text: &str, today: NaiveDate) -> Result<NaiveDate, BookingError> {
    let date = parse_date(text)?;
    if is_past_date(date, today) {
        return Err(BookingError::PastDate);
    }
    Ok(date)
}

/// Full time check for a conversation turn: strict parse, combine with the
/// stored date, then enforce the minimum lead time against the injected
/// "now". The lead time is judged at time-submission, so a session left
/// idle between date and time entry can go stale here.
pub fn validate_time(
    text: &str,
    date: NaiveDate,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, BookingError> {
    let time = parse_time(text)?;
    let combined = combine_utc(date, time);
    if is_within_min_lead_time(combined, now, MIN_LEAD_TIME_HOURS) {
        return Err(BookingError::InsufficientLeadTime);
    }
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_date_accepts_strict_iso() {
        let date = parse_date("2025-06-10").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 6, 10).unwrap());
    }

    #[test]
    fn parse_date_rejects_deviations() {
        for input in [
            "2025-6-10",
            "10-06-2025",
            "2025/06/10",
            "2025-06-10 ",
            "2025-06-100",
            "12025-06-1",
            "2025-0610-",
            "tomorrow",
            "",
        ] {
            assert!(parse_date(input).is_err(), "should reject {:?}", input);
        }
    }

    #[test]
    fn parse_time_accepts_24_hour() {
        let time = parse_time("23:00").unwrap();
        assert_eq!(time, NaiveTime::from_hms_opt(23, 0, 0).unwrap());
    }

    #[test]
    fn parse_time_rejects_deviations() {
        for input in ["25:99", "9:00", "09:0", "09:00:00", "123:4", "9 pm", ""] {
            assert!(parse_time(input).is_err(), "should reject {:?}", input);
        }
    }

    #[test]
    fn today_is_not_a_past_date() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert!(!is_past_date(today, today));
        assert!(is_past_date(NaiveDate::from_ymd_opt(2025, 5, 31).unwrap(), today));
        assert!(!is_past_date(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(), today));
    }

    #[test]
    fn lead_time_boundary_is_inclusive_of_five_hours() {
        let now = Utc.with_ymd_and_hms(2025, 6, 9, 20, 0, 0).unwrap();
        let exactly_five = Utc.with_ymd_and_hms(2025, 6, 10, 1, 0, 0).unwrap();
        let just_under = Utc.with_ymd_and_hms(2025, 6, 10, 0, 59, 0).unwrap();
        assert!(!is_within_min_lead_time(exactly_five, now, MIN_LEAD_TIME_HOURS));
        assert!(is_within_min_lead_time(just_under, now, MIN_LEAD_TIME_HOURS));
    }

    #[test]
    fn lead_time_uses_fractional_hours() {
        let now = Utc.with_ymd_and_hms(2025, 6, 9, 20, 30, 0).unwrap();
        // 4.5 hours away: rejected even though the hour count rounds to 5.
        let close = Utc.with_ymd_and_hms(2025, 6, 10, 1, 0, 0).unwrap();
        assert!(is_within_min_lead_time(close, now, MIN_LEAD_TIME_HOURS));
    }

    #[test]
    fn validate_date_distinguishes_format_and_past_errors() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert!(matches!(
            validate_date("June 10th", today),
            Err(BookingError::InvalidFormat)
        ));
        assert!(matches!(
            validate_date("2024-01-01", today),
            Err(BookingError::PastDate)
        ));
        assert!(validate_date("2025-06-10", today).is_ok());
    }

    #[test]
    fn validate_time_distinguishes_format_and_lead_time_errors() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 6, 9, 20, 0, 0).unwrap();
        assert!(matches!(
            validate_time("25:99", date, now),
            Err(BookingError::InvalidFormat)
        ));

        let late_now = Utc.with_ymd_and_hms(2025, 6, 10, 20, 0, 0).unwrap();
        assert!(matches!(
            validate_time("23:00", date, late_now),
            Err(BookingError::InsufficientLeadTime)
        ));

        let combined = validate_time("23:00", date, now).unwrap();
        assert_eq!(combined, Utc.with_ymd_and_hms(2025, 6, 10, 23, 0, 0).unwrap());
    }

    #[test]
    fn combine_produces_utc_instant() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let time = NaiveTime::from_hms_opt(23, 0, 0).unwrap();
        let combined = combine_utc(date, time);
        assert_eq!(combined, Utc.with_ymd_and_hms(2025, 6, 10, 23, 0, 0).unwrap());
    }
}
