//! Contractor weekly working-hours schedule.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// Working-hours window for a single weekday.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayWindow {
    /// Whether the contractor works at all on this day. A day explicitly
    /// marked disabled fails the availability check outright.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Window start (inclusive), local time.
    pub start: NaiveTime,
    /// Window end (inclusive), local time.
    pub end: NaiveTime,
}

impl DayWindow {
    /// Check whether a time of day falls inside the window.
    pub fn contains(&self, at: NaiveTime) -> bool {
        self.enabled && at >= self.start && at <= self.end
    }
}

fn default_enabled() -> bool {
    true
}

/// Per-weekday working-hours configuration.
///
/// A day with no window means no constraint for that day; a window with
/// `enabled: false` means the contractor never works that day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    /// Monday window.
    #[serde(default)]
    pub monday: Option<DayWindow>,
    /// Tuesday window.
    #[serde(default)]
    pub tuesday: Option<DayWindow>,
    /// Wednesday window.
    #[serde(default)]
    pub wednesday: Option<DayWindow>,
    /// Thursday window.
    #[serde(default)]
    pub thursday: Option<DayWindow>,
    /// Friday window.
    #[serde(default)]
    pub friday: Option<DayWindow>,
    /// Saturday window.
    #[serde(default)]
    pub saturday: Option<DayWindow>,
    /// Sunday window.
    #[serde(default)]
    pub sunday: Option<DayWindow>,
}

impl WeeklySchedule {
    /// The configured window for a weekday, if any.
    pub fn window_for(&self, day: Weekday) -> Option<&DayWindow> {
        match day {
            Weekday::Mon => self.monday.as_ref(),
            Weekday::Tue => self.tuesday.as_ref(),
            Weekday::Wed => self.wednesday.as_ref(),
            Weekday::Thu => self.thursday.as_ref(),
            Weekday::Fri => self.friday.as_ref(),
            Weekday::Sat => self.saturday.as_ref(),
            Weekday::Sun => self.sunday.as_ref(),
        }
    }
}
