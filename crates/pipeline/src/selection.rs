//! What the user selected for one interaction.
//!
//! A [`SelectionRequest`] holds the raw choices (times and category labels).
//! It is resolved once against the roster's codecs into a
//! [`FilterSelection`], which is what the filters read.

use chrono::{NaiveTime, Timelike};
use data_loader::{ALL_SENTINEL, CategoricalField, CodecSet, Selector};
use serde::{Deserialize, Serialize};
use tracing::warn;

const NANOS_PER_SECOND: i64 = 1_000_000_000;
const NANOS_PER_DAY: i64 = 86_400 * NANOS_PER_SECOND;

/// Default start of the availability window (06:00)
pub fn default_start() -> NaiveTime {
    NaiveTime::from_hms_opt(6, 0, 0).unwrap_or_default()
}

/// Default end of the availability window (23:59)
pub fn default_end() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).unwrap_or_default()
}

/// Parse a time of day given as `HH:MM` or `HH:MM:SS`
pub fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

/// How a window whose end lies before its start is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowPolicy {
    /// Compare times of day as-is. An inverted window then only matches
    /// sessions that start after `start` and end before `end` the next day.
    #[default]
    Strict,
    /// An inverted window runs from `start` through midnight to `end`.
    WrapMidnight,
}

/// Selected time-of-day window; both bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// End of the window lies before its start
    pub fn is_inverted(&self) -> bool {
        self.end < self.start
    }

    /// Whether a session from `login` to `logout` lies inside the window
    pub fn contains(&self, login: NaiveTime, logout: NaiveTime, policy: WindowPolicy) -> bool {
        match policy {
            WindowPolicy::WrapMidnight if self.is_inverted() => {
                // Unroll the window so it starts at offset 0
                let offset = |t: NaiveTime| (nanos_of_day(t) - nanos_of_day(self.start)).rem_euclid(NANOS_PER_DAY);
                let len = offset(self.end);
                let (login_at, logout_at) = (offset(login), offset(logout));
                login_at <= logout_at && logout_at <= len
            }
            _ => login >= self.start && logout <= self.end,
        }
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self::new(default_start(), default_end())
    }
}

fn nanos_of_day(t: NaiveTime) -> i64 {
    t.num_seconds_from_midnight() as i64 * NANOS_PER_SECOND + t.nanosecond() as i64
}

/// A fully resolved selection, ready for the filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub window: TimeWindow,
    pub policy: WindowPolicy,
    pub speciality: Selector,
    pub region: Selector,
    pub state: Selector,
    /// Keep only records the model labelled engaged
    pub engaged_only: bool,
}

impl FilterSelection {
    pub fn new(window: TimeWindow) -> Self {
        Self {
            window,
            ..Self::default()
        }
    }

    /// Selector for a categorical field
    pub fn selector(&self, field: CategoricalField) -> Selector {
        match field {
            CategoricalField::Speciality => self.speciality,
            CategoricalField::Region => self.region,
            CategoricalField::State => self.state,
        }
    }

    pub fn with_selector(mut self, field: CategoricalField, selector: Selector) -> Self {
        match field {
            CategoricalField::Speciality => self.speciality = selector,
            CategoricalField::Region => self.region = selector,
            CategoricalField::State => self.state = selector,
        }
        self
    }

    pub fn with_policy(mut self, policy: WindowPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_engaged_only(mut self, engaged_only: bool) -> Self {
        self.engaged_only = engaged_only;
        self
    }
}

/// Raw user choices, before resolution against the codecs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRequest {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub speciality: String,
    pub region: String,
    pub state: String,
    pub policy: WindowPolicy,
    pub engaged_only: bool,
}

impl Default for SelectionRequest {
    fn default() -> Self {
        Self {
            start: default_start(),
            end: default_end(),
            speciality: ALL_SENTINEL.to_string(),
            region: ALL_SENTINEL.to_string(),
            state: ALL_SENTINEL.to_string(),
            policy: WindowPolicy::Strict,
            engaged_only: false,
        }
    }
}

impl SelectionRequest {
    /// Label chosen for a categorical field
    pub fn label(&self, field: CategoricalField) -> &str {
        match field {
            CategoricalField::Speciality => &self.speciality,
            CategoricalField::Region => &self.region,
            CategoricalField::State => &self.state,
        }
    }

    /// Resolve labels to selectors using the codecs built at load time.
    ///
    /// A label outside the vocabulary is an error rather than "no filter".
    pub fn resolve(&self, codecs: &CodecSet) -> data_loader::Result<FilterSelection> {
        let window = TimeWindow::new(self.start, self.end);
        if window.is_inverted() && self.policy == WindowPolicy::Strict {
            warn!(
                "Window end {} precedes start {}; without midnight wrapping few or no records will match",
                self.end, self.start
            );
        }

        let mut selection = FilterSelection::new(window)
            .with_policy(self.policy)
            .with_engaged_only(self.engaged_only);
        for field in CategoricalField::ALL {
            let selector = codecs.get(field).lookup_code_for_selection(self.label(field))?;
            selection = selection.with_selector(field, selector);
        }
        Ok(selection)
    }
}
