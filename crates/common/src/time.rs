//! Parsing of the free-form time strings the booking form sends
//! (`"2:30 PM"`, `"9AM"`, `"14:00"`).

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::Regex;
use tracing::warn;

pub const DEFAULT_TIME: &str = "09:00";

fn compact_form() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2}):?(\d{2})?\s*([AaPp][Mm])$").expect("static regex")
    })
}

fn trailing_period() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.*?)\s*([AaPp][Mm])\s*$").expect("static regex"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Period {
    Am,
    Pm,
}

impl Period {
    fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("pm") {
            Period::Pm
        } else {
            Period::Am
        }
    }
}

/// Parses a time string into hours and minutes. `None` when the hour part is
/// unusable; an unusable minute part degrades to `00`.
pub fn parse_time(input: &str) -> Option<(u32, u32)> {
    let clean = input.split_whitespace().collect::<Vec<_>>().join(" ");
    if clean.is_empty() {
        return None;
    }

    let (time_str, period) = if let Some(caps) = compact_form().captures(&clean) {
        let minutes = caps.get(2).map_or("00", |m| m.as_str());
        (format!("{}:{minutes}", &caps[1]), Some(Period::parse(&caps[3])))
    } else if let Some(caps) = trailing_period().captures(&clean) {
        (caps[1].to_string(), Some(Period::parse(&caps[2])))
    } else {
        (clean.clone(), None)
    };

    let mut parts = time_str.splitn(2, ':');
    let hours_raw = parts.next()?.trim();
    let minutes_raw = parts.next()?.trim();

    let hours: u32 = hours_raw.parse().ok()?;
    let hours = match period {
        Some(p) => {
            if !(1..=12).contains(&hours) {
                return None;
            }
            match (p, hours) {
                (Period::Pm, 12) => 12,
                (Period::Pm, h) => h + 12,
                (Period::Am, 12) => 0,
                (Period::Am, h) => h,
            }
        }
        None if hours <= 23 => hours,
        None => return None,
    };

    let minutes = match minutes_raw.parse::<u32>() {
        Ok(m) if m <= 59 => m,
        _ => {
            warn!(input, "invalid minutes in time string, using 00");
            0
        }
    };

    Some((hours, minutes))
}

/// Normalizes a 12-hour (or already 24-hour) time to zero-padded `HH:MM`,
/// falling back to [`DEFAULT_TIME`] when the input cannot be read.
pub fn convert_to_24_hour(input: &str) -> String {
    match parse_time(input) {
        Some((h, m)) => format!("{h:02}:{m:02}"),
        None => {
            warn!(input, "unparseable time string, defaulting to {DEFAULT_TIME}");
            DEFAULT_TIME.to_string()
        }
    }
}

/// Combines a `YYYY-MM-DD` date and a free-form time into a UTC instant.
/// Only the date is required to be valid; the time falls back like
/// [`convert_to_24_hour`].
pub fn appointment_time(date: &str, time: &str) -> Option<DateTime<Utc>> {
    let day = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
    let (h, m) = parse_time(time).unwrap_or((9, 0));
    let clock = NaiveTime::from_hms_opt(h, m, 0)?;
    Some(day.and_time(clock).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn afternoon_times_move_past_noon() {
        assert_eq!(convert_to_24_hour("2:30 PM"), "14:30");
        assert_eq!(convert_to_24_hour("11:05pm"), "23:05");
    }

    #[test]
    fn bare_hour_with_period() {
        assert_eq!(convert_to_24_hour("9AM"), "09:00");
        assert_eq!(convert_to_24_hour("9 am"), "09:00");
        assert_eq!(convert_to_24_hour("930AM"), "09:30");
    }

    #[test]
    fn noon_and_midnight() {
        assert_eq!(convert_to_24_hour("12:00 PM"), "12:00");
        assert_eq!(convert_to_24_hour("12:15 AM"), "00:15");
    }

    #[test]
    fn garbage_falls_back_to_nine() {
        assert_eq!(convert_to_24_hour("invalid"), "09:00");
        assert_eq!(convert_to_24_hour(""), "09:00");
        assert_eq!(convert_to_24_hour("   "), "09:00");
        assert_eq!(convert_to_24_hour("13:00 PM"), "09:00");
        assert_eq!(convert_to_24_hour("0:30 AM"), "09:00");
        assert_eq!(convert_to_24_hour("930"), "09:00");
    }

    #[test]
    fn bad_minutes_degrade_to_zero() {
        assert_eq!(convert_to_24_hour("3:75 PM"), "15:00");
        assert_eq!(convert_to_24_hour("3:xx PM"), "15:00");
    }

    #[test]
    fn messy_whitespace_is_tolerated() {
        assert_eq!(convert_to_24_hour("  4:45   pm "), "16:45");
        assert_eq!(convert_to_24_hour("4 : 45 PM"), "16:45");
    }

    #[test]
    fn twenty_four_hour_input_passes_through() {
        assert_eq!(convert_to_24_hour("14:30"), "14:30");
        assert_eq!(convert_to_24_hour("7:5"), "07:05");
        assert_eq!(convert_to_24_hour("25:00"), "09:00");
    }

    #[test]
    fn appointment_time_combines_date_and_clock() {
        let at = appointment_time("2025-03-14", "2:30 PM").unwrap();
        assert_eq!((at.year(), at.month(), at.day()), (2025, 3, 14));
        assert_eq!((at.hour(), at.minute()), (14, 30));

        let fallback = appointment_time("2025-03-14", "whenever").unwrap();
        assert_eq!((fallback.hour(), fallback.minute()), (9, 0));

        assert!(appointment_time("14/03/2025", "2:30 PM").is_none());
    }
}
