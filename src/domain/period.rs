//! Weekly periods.
//!
//! A `Week` is an ISO-8601 week (Monday start). It is stored as the Monday
//! that opens the week, which makes ordering and week arithmetic plain date
//! arithmetic: `week.offset(-52)` is exactly 364 days earlier, regardless of
//! whether the ISO year in between had 52 or 53 weeks.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::MortalityError;

/// Number of weekly periods treated as one year throughout the forecaster.
pub const WEEKS_PER_YEAR: i64 = 52;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Week {
    monday: NaiveDate,
}

impl Week {
    /// Build a week from its ISO `(year, week)` pair.
    ///
    /// Returns `None` for week numbers the ISO year does not have
    /// (e.g. week 53 of a 52-week year, or the `99` "unknown week" code).
    pub fn from_iso(year: i32, week: u32) -> Option<Self> {
        NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).map(|monday| Self { monday })
    }

    /// The week that contains `date`.
    pub fn containing(date: NaiveDate) -> Self {
        let back = date.weekday().num_days_from_monday() as i64;
        Self {
            monday: date - Duration::days(back),
        }
    }

    pub fn monday(self) -> NaiveDate {
        self.monday
    }

    /// ISO year. This is the "calendar year" of the week everywhere in the crate.
    pub fn year(self) -> i32 {
        self.monday.iso_week().year()
    }

    /// ISO week number (1..=53).
    pub fn week(self) -> u32 {
        self.monday.iso_week().week()
    }

    /// Shift by a whole number of weeks (negative = earlier).
    pub fn offset(self, weeks: i64) -> Self {
        Self {
            monday: self.monday + Duration::weeks(weeks),
        }
    }

    /// Signed number of weeks from `self` to `other`.
    pub fn weeks_until(self, other: Week) -> i64 {
        (other.monday - self.monday).num_weeks()
    }

    /// Short chart label, e.g. `2020/5`.
    pub fn label(self) -> String {
        format!("{}/{}", self.year(), self.week())
    }
}

impl fmt::Display for Week {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.year(), self.week())
    }
}

impl FromStr for Week {
    type Err = MortalityError;

    /// Accepts `2020-W05` and the raw-data form `2020W05`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MortalityError::InvalidPeriod { text: s.to_string() };
        let trimmed = s.trim();
        let (year, week) = trimmed.split_once(['W', 'w']).ok_or_else(invalid)?;
        let year: i32 = year.trim_end_matches('-').parse().map_err(|_| invalid())?;
        let week: u32 = week.parse().map_err(|_| invalid())?;
        Week::from_iso(year, week).ok_or_else(invalid)
    }
}

impl Serialize for Week {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Week {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_text_forms() {
        let a: Week = "2020-W05".parse().unwrap();
        let b: Week = "2020W05".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.year(), 2020);
        assert_eq!(a.week(), 5);
        assert_eq!(a.monday(), NaiveDate::from_ymd_opt(2020, 1, 27).unwrap());
        assert_eq!(a.to_string(), "2020-W05");
        assert_eq!(a.label(), "2020/5");
    }

    #[test]
    fn rejects_unknown_week_code() {
        assert!("2020W99".parse::<Week>().is_err());
        assert!("2021-W53".parse::<Week>().is_err());
        assert!("2020-W53".parse::<Week>().is_ok());
        assert!("garbage".parse::<Week>().is_err());
    }

    #[test]
    fn offset_is_whole_weeks_across_long_years() {
        // 2020 has 53 ISO weeks, so 52 weeks after 2020-W01 is still 2020.
        let start = Week::from_iso(2020, 1).unwrap();
        let later = start.offset(52);
        assert_eq!(later.to_string(), "2020-W53");
        assert_eq!(start.weeks_until(later), 52);
        assert_eq!(later.offset(-52), start);
    }

    #[test]
    fn containing_snaps_to_monday() {
        let sunday = NaiveDate::from_ymd_opt(2021, 1, 10).unwrap();
        let week = Week::containing(sunday);
        assert_eq!(week.monday(), NaiveDate::from_ymd_opt(2021, 1, 4).unwrap());
        assert_eq!(week.week(), 1);
    }
}
