#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone};
use chrono_tz::Tz;
use marketclock::domain::error::ClockError;
use marketclock::domain::session::{CALENDAR_TIMEZONE, ScheduleRequest, Session};
use marketclock::ports::schedule_port::SchedulePort;
use std::cell::RefCell;

/// Schedule source returning canned sessions and recording every request.
pub struct MockSchedulePort {
    pub sessions: Vec<Session>,
    pub error: Option<String>,
    pub requests: RefCell<Vec<ScheduleRequest>>,
}

impl MockSchedulePort {
    pub fn new() -> Self {
        Self {
            sessions: Vec::new(),
            error: None,
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_sessions(mut self, sessions: Vec<Session>) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl SchedulePort for MockSchedulePort {
    fn schedule(&self, request: &ScheduleRequest) -> Result<Vec<Session>, ClockError> {
        self.requests.borrow_mut().push(request.clone());
        if let Some(reason) = &self.error {
            return Err(ClockError::Calendar {
                reason: reason.clone(),
            });
        }
        Ok(self
            .sessions
            .iter()
            .filter(|s| s.date >= request.start_date && s.date <= request.end_date)
            .cloned()
            .collect())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn ny(y: i32, m: u32, d: u32, h: u32, mi: u32) -> DateTime<Tz> {
    CALENDAR_TIMEZONE.with_ymd_and_hms(y, m, d, h, mi, 0).unwrap()
}

/// A 09:30-16:00 session.
pub fn regular_session(y: i32, m: u32, d: u32) -> Session {
    Session::new(date(y, m, d), ny(y, m, d, 9, 30), ny(y, m, d, 16, 0))
}
