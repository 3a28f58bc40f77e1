//! Holiday calendars.
//!
//! The adaptive smoothing detector treats holidays as special days. The
//! default source is a fixed US federal-style rule table; callers can swap
//! in another rule table or inject an external [`HolidayCalendar`].

mod provider;
mod rules;

pub use provider::{holidays, DateListCalendar, HolidayCalendar, HolidaySource, RuleCalendar};
pub use rules::{us_federal_rules, Holiday, HolidayRule, US_FEDERAL_RULES};
