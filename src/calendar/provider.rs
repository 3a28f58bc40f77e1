//! Holiday sources.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use serde::Deserialize;

use super::rules::{us_federal_rules, Holiday};
use crate::error::Result;

/// Anything that can answer "is this date a holiday?".
///
/// Implement this to plug an external holiday service into the detectors.
pub trait HolidayCalendar: Send + Sync {
    fn is_holiday(&self, date: NaiveDate) -> bool;
}

/// Calendar evaluated from a table of [`Holiday`] rules.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleCalendar {
    holidays: Vec<Holiday>,
}

#[derive(Deserialize)]
struct RuleFile {
    #[serde(default)]
    holiday: Vec<Holiday>,
}

impl RuleCalendar {
    pub fn new(holidays: Vec<Holiday>) -> Self {
        Self { holidays }
    }

    /// The built-in US federal-style calendar.
    pub fn us_federal() -> Self {
        Self::new(us_federal_rules())
    }

    /// Parse a rule table from TOML (`[[holiday]]` entries).
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let file: RuleFile = toml::from_str(source)?;
        Ok(Self::new(file.holiday))
    }

    /// Read a rule table from a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn holidays(&self) -> &[Holiday] {
        &self.holidays
    }

    /// Name of the first rule matching `date`.
    pub fn holiday_name(&self, date: NaiveDate) -> Option<&str> {
        self.holidays
            .iter()
            .find(|h| h.rule.matches(date))
            .map(|h| h.name.as_str())
    }
}

impl Default for RuleCalendar {
    fn default() -> Self {
        Self::us_federal()
    }
}

impl HolidayCalendar for RuleCalendar {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.iter().any(|h| h.rule.matches(date))
    }
}

/// Calendar backed by an explicit set of dates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateListCalendar {
    dates: BTreeSet<NaiveDate>,
}

impl DateListCalendar {
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, date: NaiveDate) {
        self.dates.insert(date);
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

impl HolidayCalendar for DateListCalendar {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }
}

/// Holiday source used by the detectors.
///
/// An injected provider takes precedence; without one the built-in rule
/// calendar answers.
#[derive(Clone, Default)]
pub struct HolidaySource {
    provider: Option<Arc<dyn HolidayCalendar>>,
    builtin: RuleCalendar,
}

impl HolidaySource {
    /// Source backed by the built-in US federal-style rules.
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Source backed by a custom rule table.
    pub fn with_rules(rules: RuleCalendar) -> Self {
        Self {
            provider: None,
            builtin: rules,
        }
    }

    /// Source backed by an external calendar provider.
    pub fn with_provider(provider: Arc<dyn HolidayCalendar>) -> Self {
        Self {
            provider: Some(provider),
            builtin: RuleCalendar::default(),
        }
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        match &self.provider {
            Some(provider) => provider.is_holiday(date),
            None => self.builtin.is_holiday(date),
        }
    }

    /// One flag per day for `num_days` consecutive days from `start`.
    pub fn holidays(&self, start: NaiveDate, num_days: usize) -> Vec<bool> {
        (0..num_days)
            .map(|i| {
                start
                    .checked_add_days(Days::new(i as u64))
                    .is_some_and(|d| self.is_holiday(d))
            })
            .collect()
    }
}

impl fmt::Debug for HolidaySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HolidaySource")
            .field("provider", &self.provider.as_ref().map(|_| "external"))
            .field("builtin", &self.builtin)
            .finish()
    }
}

/// Holiday flags for `num_days` days from `start` using the built-in rules.
///
/// # Example
/// ```
/// use anofox_surveillance::calendar::holidays;
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let flags = holidays(start, 3);
/// assert_eq!(flags, vec![true, false, false]);
/// ```
pub fn holidays(start: NaiveDate, num_days: usize) -> Vec<bool> {
    HolidaySource::builtin().holidays(start, num_days)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn new_years_day_and_independence_day() {
        assert!(holidays(date(2024, 1, 1), 1)[0]);
        assert!(holidays(date(2024, 7, 4), 1)[0]);
    }

    #[test]
    fn saturday_independence_day_observed_friday() {
        // 2026-07-04 is a Saturday
        let flags = holidays(date(2026, 7, 2), 4);
        assert_eq!(flags, vec![false, true, true, false]);
    }

    #[test]
    fn us_federal_2024_has_expected_days() {
        let flags = holidays(date(2024, 1, 1), 366);
        let start = date(2024, 1, 1);
        let marked: Vec<NaiveDate> = flags
            .iter()
            .enumerate()
            .filter(|(_, &f)| f)
            .map(|(i, _)| start + Days::new(i as u64))
            .collect();
        assert_eq!(
            marked,
            vec![
                date(2024, 1, 1),
                date(2024, 1, 15),
                date(2024, 2, 19),
                date(2024, 5, 27),
                date(2024, 7, 4),
                date(2024, 9, 2),
                date(2024, 10, 14),
                date(2024, 11, 11),
                date(2024, 11, 28),
                date(2024, 12, 25),
            ]
        );
    }

    #[test]
    fn holiday_name_lookup() {
        let cal = RuleCalendar::us_federal();
        assert_eq!(cal.holiday_name(date(2024, 11, 28)), Some("Thanksgiving Day"));
        assert_eq!(cal.holiday_name(date(2024, 11, 29)), None);
    }

    #[test]
    fn injected_provider_replaces_builtin_rules() {
        let list = DateListCalendar::new([date(2024, 3, 17)]);
        let source = HolidaySource::with_provider(Arc::new(list));
        assert!(source.has_provider());
        assert!(source.is_holiday(date(2024, 3, 17)));
        assert!(!source.is_holiday(date(2024, 1, 1)));
    }

    #[test]
    fn rule_table_from_toml() {
        let cal = RuleCalendar::from_toml_str(
            r#"
            [[holiday]]
            name = "Canada Day"
            rule = { kind = "fixed", month = 7, day = 1 }

            [[holiday]]
            name = "Victoria Day"
            rule = { kind = "last_weekday_before", month = 5, day = 24, weekday = "Mon" }
            "#,
        )
        .unwrap();
        assert_eq!(cal.holidays().len(), 2);
        assert!(cal.is_holiday(date(2024, 7, 1)));
        assert!(cal.is_holiday(date(2024, 5, 20)));
        assert!(!cal.is_holiday(date(2024, 7, 4)));

        let source = HolidaySource::with_rules(cal);
        assert!(!source.has_provider());
        assert!(source.is_holiday(date(2024, 7, 1)));
    }

    #[test]
    fn malformed_rule_table_is_config_error() {
        let err = RuleCalendar::from_toml_str("[[holiday]]\nname = 3").unwrap_err();
        assert!(matches!(err, crate::error::DetectionError::Config(_)));
    }

    #[test]
    fn zero_days_is_empty() {
        assert!(holidays(date(2024, 1, 1), 0).is_empty());
    }
}
