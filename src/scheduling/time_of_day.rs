use serde::{Serialize, Serializer};
use std::fmt::{self, Display};
use std::str::FromStr;
use thiserror::Error;
use time::{format_description::FormatItem, macros::format_description, Time};

const HMS: &[FormatItem<'static>] = format_description!("[hour]:[minute]:[second]");
const HM: &[FormatItem<'static>] = format_description!("[hour]:[minute]");

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed time of day {0:?}, expected zero-padded HH:MM[:SS]")]
pub struct ClockTimeError(pub String);

/// A wall-clock time with second precision, as stored in booking windows.
///
/// Values are parsed from zero-padded `HH:MM:SS` (or `HH:MM`) strings. Anything
/// else is rejected rather than compared as text. Postgres `time` also allows
/// `24:00:00`, which parses as [`ClockTime::EndOfDay`] and sorts after every
/// time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClockTime {
    At(Time),
    EndOfDay,
}

impl ClockTime {
    pub fn from_hms(hour: u8, minute: u8, second: u8) -> Result<Self, ClockTimeError> {
        if (hour, minute, second) == (24, 0, 0) {
            return Ok(ClockTime::EndOfDay);
        }
        Time::from_hms(hour, minute, second)
            .map(ClockTime::At)
            .map_err(|_| ClockTimeError(format!("{hour:02}:{minute:02}:{second:02}")))
    }

    /// Truncates sub-second precision away.
    pub fn of(time: Time) -> Self {
        let (hour, minute, second) = time.as_hms();
        Time::from_hms(hour, minute, second)
            .map(ClockTime::At)
            .unwrap_or(ClockTime::At(time))
    }

    pub fn hms(&self) -> (u8, u8, u8) {
        match self {
            ClockTime::At(time) => time.as_hms(),
            ClockTime::EndOfDay => (24, 0, 0),
        }
    }
}

impl FromStr for ClockTime {
    type Err = ClockTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if matches!(trimmed, "24:00:00" | "24:00") {
            return Ok(ClockTime::EndOfDay);
        }
        Time::parse(trimmed, HMS)
            .or_else(|_| Time::parse(trimmed, HM))
            .map(ClockTime::At)
            .map_err(|_| ClockTimeError(s.to_string()))
    }
}

impl Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (hour, minute, second) = self.hms();
        write!(f, "{hour:02}:{minute:02}:{second:02}")
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_padded_times() {
        let t: ClockTime = "09:05:07".parse().unwrap();
        assert_eq!(t.hms(), (9, 5, 7));
        assert_eq!(t.to_string(), "09:05:07");
    }

    #[test]
    fn accepts_hours_and_minutes_only() {
        let t: ClockTime = "17:30".parse().unwrap();
        assert_eq!(t.hms(), (17, 30, 0));
    }

    #[test]
    fn rejects_malformed_times() {
        for raw in ["9:00:00", "25:00:00", "12:60:00", "noon", "", "12-00-00"] {
            assert!(raw.parse::<ClockTime>().is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn ordering_matches_clock_order() {
        let early: ClockTime = "08:59:59".parse().unwrap();
        let late: ClockTime = "17:00:00".parse().unwrap();
        assert!(early < late);
        assert!(ClockTime::from_hms(10, 0, 0).unwrap() > early);
    }

    #[test]
    fn end_of_day_sorts_after_every_time() {
        let end: ClockTime = "24:00:00".parse().unwrap();
        assert_eq!(end, ClockTime::EndOfDay);
        assert_eq!("24:00".parse::<ClockTime>().unwrap(), ClockTime::EndOfDay);
        assert_eq!(ClockTime::from_hms(24, 0, 0).unwrap(), ClockTime::EndOfDay);
        assert!(ClockTime::from_hms(23, 59, 59).unwrap() < end);
        assert_eq!(end.to_string(), "24:00:00");
        assert!("24:00:01".parse::<ClockTime>().is_err());
    }

    #[test]
    fn error_names_both_accepted_shapes() {
        let err = "noon".parse::<ClockTime>().unwrap_err();
        assert!(err.to_string().ends_with("HH:MM[:SS]"));
    }

    #[test]
    fn truncates_sub_second_precision() {
        let t = Time::from_hms_milli(17, 0, 0, 500).unwrap();
        assert_eq!(ClockTime::of(t), ClockTime::from_hms(17, 0, 0).unwrap());
    }
}
