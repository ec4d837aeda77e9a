//! Derived time fields.
//!
//! Everything downstream of loading works with time of day only. This module
//! reduces a login/logout pair to hours, a duration and the "time slot"
//! display label, and parses that label back for sorting.

use chrono::{NaiveDateTime, NaiveTime, Timelike};

/// Canonical time-of-day format used in time slot labels
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Separator between the start and end of a time slot label
pub const SLOT_SEPARATOR: &str = " - ";

/// Fields derived from a record's login and logout timestamps
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedTimes {
    pub login_hour: u32,
    pub logout_hour: u32,
    pub session_duration_minutes: f64,
    pub login_time: NaiveTime,
    pub logout_time: NaiveTime,
    pub time_slot: String,
}

/// Derive the time fields for one session.
///
/// The duration is not clamped: a logout before the login gives a negative
/// number of minutes.
pub fn derive_times(login: NaiveDateTime, logout: NaiveDateTime) -> DerivedTimes {
    let login_time = login.time();
    let logout_time = logout.time();
    let session_duration_minutes = (logout - login).num_milliseconds() as f64 / 60_000.0;

    DerivedTimes {
        login_hour: login_time.hour(),
        logout_hour: logout_time.hour(),
        session_duration_minutes,
        login_time,
        logout_time,
        time_slot: format_time_slot(login_time, logout_time),
    }
}

/// `"HH:MM:SS - HH:MM:SS"`
pub fn format_time_slot(login: NaiveTime, logout: NaiveTime) -> String {
    format!(
        "{}{}{}",
        login.format(TIME_FORMAT),
        SLOT_SEPARATOR,
        logout.format(TIME_FORMAT)
    )
}

/// Parse the start time out of a time slot label
pub fn parse_slot_start(slot: &str) -> Option<NaiveTime> {
    let start = slot.split(SLOT_SEPARATOR).next()?.trim();
    NaiveTime::parse_from_str(start, TIME_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_derive_same_day_session() {
        let derived = derive_times(at(10, 8, 15, 0), at(10, 9, 45, 30));

        assert_eq!(derived.login_hour, 8);
        assert_eq!(derived.logout_hour, 9);
        assert_eq!(derived.session_duration_minutes, 90.5);
        assert_eq!(derived.login_time, NaiveTime::from_hms_opt(8, 15, 0).unwrap());
        assert_eq!(derived.time_slot, "08:15:00 - 09:45:30");
    }

    #[test]
    fn test_derive_overnight_session() {
        let derived = derive_times(at(10, 23, 0, 0), at(11, 1, 0, 0));

        assert_eq!(derived.login_hour, 23);
        assert_eq!(derived.logout_hour, 1);
        assert_eq!(derived.session_duration_minutes, 120.0);
        assert_eq!(derived.time_slot, "23:00:00 - 01:00:00");
    }

    #[test]
    fn test_negative_duration_passes_through() {
        let derived = derive_times(at(10, 10, 0, 0), at(10, 9, 30, 0));
        assert_eq!(derived.session_duration_minutes, -30.0);
    }

    #[test]
    fn test_parse_slot_start() {
        assert_eq!(
            parse_slot_start("07:05:09 - 10:00:00"),
            NaiveTime::from_hms_opt(7, 5, 9)
        );
        assert_eq!(parse_slot_start("not a slot"), None);
        assert_eq!(parse_slot_start(""), None);
    }

    #[test]
    fn test_slot_label_parses_back() {
        let login = NaiveTime::from_hms_opt(22, 0, 0).unwrap();
        let logout = NaiveTime::from_hms_opt(23, 30, 0).unwrap();
        let slot = format_time_slot(login, logout);
        assert_eq!(parse_slot_start(&slot), Some(login));
    }
}
