//! Holiday rule tables.
//!
//! A rule set is plain data: swapping the table changes the calendar without
//! touching the evaluation code. Tables can be built in code or read from
//! TOML:
//!
//! ```toml
//! [[holiday]]
//! name = "Canada Day"
//! rule = { kind = "fixed", month = 7, day = 1, observed = false }
//!
//! [[holiday]]
//! name = "Victoria Day"
//! rule = { kind = "last_weekday_before", month = 5, day = 24, weekday = "Mon" }
//! ```

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Deserialize;

/// Date rule for a single holiday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HolidayRule {
    /// Same calendar date every year.
    ///
    /// With `observed`, a Saturday occurrence is also observed on the
    /// preceding Friday and a Sunday occurrence on the following Monday.
    Fixed {
        month: u32,
        day: u32,
        #[serde(default)]
        observed: bool,
    },
    /// The `nth` (1-based) given weekday of the month.
    NthWeekday { month: u32, weekday: Weekday, nth: u32 },
    /// The last given weekday of the month.
    LastWeekday { month: u32, weekday: Weekday },
    /// The last given weekday falling on or before `day` of the month.
    LastWeekdayBefore {
        month: u32,
        day: u32,
        weekday: Weekday,
    },
}

impl HolidayRule {
    /// Whether `date` is an occurrence (or observed occurrence) of this rule.
    pub fn matches(&self, date: NaiveDate) -> bool {
        match *self {
            HolidayRule::Fixed {
                month,
                day,
                observed,
            } => {
                if date.month() == month && date.day() == day {
                    return true;
                }
                if !observed {
                    return false;
                }
                let is_on = |d: Option<NaiveDate>| {
                    d.is_some_and(|d| d.month() == month && d.day() == day)
                };
                match date.weekday() {
                    Weekday::Fri => is_on(date.succ_opt()),
                    Weekday::Mon => is_on(date.pred_opt()),
                    _ => false,
                }
            }
            HolidayRule::NthWeekday {
                month,
                weekday,
                nth,
            } => {
                date.month() == month && date.weekday() == weekday && (date.day() - 1) / 7 + 1 == nth
            }
            HolidayRule::LastWeekday { month, weekday } => {
                date.month() == month
                    && date.weekday() == weekday
                    && date
                        .checked_add_days(chrono::Days::new(7))
                        .is_none_or(|next| next.month() != month)
            }
            HolidayRule::LastWeekdayBefore {
                month,
                day,
                weekday,
            } => {
                date.month() == month
                    && date.weekday() == weekday
                    && date.day() <= day
                    && date.day() + 7 > day
            }
        }
    }
}

/// A named holiday rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Holiday {
    pub name: String,
    pub rule: HolidayRule,
}

impl Holiday {
    pub fn new(name: impl Into<String>, rule: HolidayRule) -> Self {
        Self {
            name: name.into(),
            rule,
        }
    }
}

/// The default US federal-style rule table, as `(name, rule)` pairs.
pub const US_FEDERAL_RULES: &[(&str, HolidayRule)] = &[
    (
        "New Year's Day",
        HolidayRule::Fixed {
            month: 1,
            day: 1,
            observed: true,
        },
    ),
    (
        "Martin Luther King Jr. Day",
        HolidayRule::NthWeekday {
            month: 1,
            weekday: Weekday::Mon,
            nth: 3,
        },
    ),
    (
        "Presidents' Day",
        HolidayRule::NthWeekday {
            month: 2,
            weekday: Weekday::Mon,
            nth: 3,
        },
    ),
    (
        "Memorial Day",
        HolidayRule::LastWeekday {
            month: 5,
            weekday: Weekday::Mon,
        },
    ),
    (
        "Independence Day",
        HolidayRule::Fixed {
            month: 7,
            day: 4,
            observed: true,
        },
    ),
    (
        "Labor Day",
        HolidayRule::NthWeekday {
            month: 9,
            weekday: Weekday::Mon,
            nth: 1,
        },
    ),
    (
        "Columbus Day",
        HolidayRule::NthWeekday {
            month: 10,
            weekday: Weekday::Mon,
            nth: 2,
        },
    ),
    (
        "Veterans Day",
        HolidayRule::Fixed {
            month: 11,
            day: 11,
            observed: true,
        },
    ),
    (
        "Thanksgiving Day",
        HolidayRule::NthWeekday {
            month: 11,
            weekday: Weekday::Thu,
            nth: 4,
        },
    ),
    (
        "Christmas Day",
        HolidayRule::Fixed {
            month: 12,
            day: 25,
            observed: true,
        },
    ),
];

/// [`US_FEDERAL_RULES`] as owned [`Holiday`] values.
pub fn us_federal_rules() -> Vec<Holiday> {
    US_FEDERAL_RULES
        .iter()
        .map(|&(name, rule)| Holiday::new(name, rule))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn fixed_rule_matches_actual_date() {
        let rule = HolidayRule::Fixed {
            month: 7,
            day: 4,
            observed: false,
        };
        assert!(rule.matches(date(2024, 7, 4)));
        assert!(!rule.matches(date(2024, 7, 5)));
        // Saturday occurrence without observation
        assert!(!rule.matches(date(2020, 7, 3)));
    }

    #[test]
    fn observed_fixed_rule_shifts_weekends() {
        let rule = HolidayRule::Fixed {
            month: 7,
            day: 4,
            observed: true,
        };
        // 2020-07-04 was a Saturday
        assert!(rule.matches(date(2020, 7, 3)));
        assert!(rule.matches(date(2020, 7, 4)));
        // 2021-07-04 was a Sunday
        assert!(rule.matches(date(2021, 7, 5)));
        // 2024-07-04 was a Thursday: no shift
        assert!(!rule.matches(date(2024, 7, 5)));
        assert!(!rule.matches(date(2024, 7, 3)));
    }

    #[test]
    fn observed_shift_crosses_year_boundary() {
        let rule = HolidayRule::Fixed {
            month: 1,
            day: 1,
            observed: true,
        };
        // 2022-01-01 was a Saturday
        assert!(rule.matches(date(2021, 12, 31)));
    }

    #[test]
    fn nth_weekday_rule() {
        let thanksgiving = HolidayRule::NthWeekday {
            month: 11,
            weekday: Weekday::Thu,
            nth: 4,
        };
        assert!(thanksgiving.matches(date(2024, 11, 28)));
        assert!(thanksgiving.matches(date(2023, 11, 23)));
        assert!(!thanksgiving.matches(date(2024, 11, 21)));
    }

    #[test]
    fn last_weekday_rule() {
        let memorial = HolidayRule::LastWeekday {
            month: 5,
            weekday: Weekday::Mon,
        };
        assert!(memorial.matches(date(2024, 5, 27)));
        assert!(memorial.matches(date(2021, 5, 31)));
        assert!(!memorial.matches(date(2024, 5, 20)));
    }

    #[test]
    fn last_weekday_before_rule() {
        let victoria = HolidayRule::LastWeekdayBefore {
            month: 5,
            day: 24,
            weekday: Weekday::Mon,
        };
        assert!(victoria.matches(date(2024, 5, 20)));
        assert!(victoria.matches(date(2021, 5, 24)));
        assert!(!victoria.matches(date(2021, 5, 17)));
    }

    #[test]
    fn us_federal_table_has_ten_holidays() {
        assert_eq!(US_FEDERAL_RULES.len(), 10);
        let rules = us_federal_rules();
        assert_eq!(rules.len(), US_FEDERAL_RULES.len());
        assert!(rules.iter().any(|h| h.name == "Thanksgiving Day"));
        let (name, rule) = US_FEDERAL_RULES[8];
        assert_eq!(name, "Thanksgiving Day");
        assert!(rule.matches(date(2024, 11, 28)));
    }
}
