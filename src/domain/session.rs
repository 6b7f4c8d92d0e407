//! Trading sessions and the schedule query that produces them.

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;

/// Timezone every clock schedules in.
pub const CALENDAR_TIMEZONE: Tz = chrono_tz::America::New_York;

/// Calendar every clock schedules against.
pub const CALENDAR_ID: &str = "NYSE";

/// One trading day's boundaries under the requested session policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub date: NaiveDate,
    pub open: DateTime<Tz>,
    pub close: DateTime<Tz>,
}

impl Session {
    pub fn new(date: NaiveDate, open: DateTime<Tz>, close: DateTime<Tz>) -> Self {
        Self { date, open, close }
    }
}

/// Which instant opens a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStart {
    MarketOpen,
    PreMarket,
}

impl SessionStart {
    pub fn for_extended(extended: bool) -> Self {
        if extended {
            SessionStart::PreMarket
        } else {
            SessionStart::MarketOpen
        }
    }
}

/// Which instant closes a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    MarketClose,
    PostMarket,
}

impl SessionEnd {
    pub fn for_extended(extended: bool) -> Self {
        if extended {
            SessionEnd::PostMarket
        } else {
            SessionEnd::MarketClose
        }
    }
}

/// Parameters of a schedule query. Dates are inclusive and carry no time
/// of day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRequest {
    pub timezone: Tz,
    pub calendar: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub session_start: SessionStart,
    pub session_end: SessionEnd,
}

impl ScheduleRequest {
    /// Request against the NYSE calendar in New York time.
    pub fn nyse(start_date: NaiveDate, end_date: NaiveDate, extended: bool) -> Self {
        Self {
            timezone: CALENDAR_TIMEZONE,
            calendar: CALENDAR_ID.to_string(),
            start_date,
            end_date,
            session_start: SessionStart::for_extended(extended),
            session_end: SessionEnd::for_extended(extended),
        }
    }
}
