//! Backtest market clock.
//!
//! A [`Clock`] turns a date range, a supported interval and a trading
//! schedule into an ordered sequence of [`Bar`]s. The schedule is fetched
//! once at construction; bars are then produced lazily, one per call to
//! [`Iterator::next`], by one of three strategies picked from the
//! interval's [`Granularity`]:
//!
//! - intraday: step through each session by the interval, clipping the
//!   last bar of a session to its close;
//! - daily: one bar per session;
//! - weekly: one bar per ISO week, first session open to last session close.

use std::iter::FusedIterator;

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;

use crate::domain::bar::Bar;
use crate::domain::error::ClockError;
use crate::domain::interval::{Granularity, IntervalInput, SupportedInterval};
use crate::domain::session::{CALENDAR_TIMEZONE, ScheduleRequest, Session};
use crate::domain::truncate::truncate;
use crate::ports::schedule_port::SchedulePort;

/// Construction parameters for a [`Clock`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockConfig {
    pub start: DateTime<Tz>,
    /// `None` means "now".
    pub end: Option<DateTime<Tz>>,
    pub interval: IntervalInput,
    /// Use pre/post market session boundaries.
    pub extended: bool,
}

impl ClockConfig {
    pub fn new(start: DateTime<Tz>) -> Self {
        Self {
            start,
            end: None,
            interval: IntervalInput::default(),
            extended: false,
        }
    }

    pub fn with_end(mut self, end: DateTime<Tz>) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_interval(mut self, interval: impl Into<IntervalInput>) -> Self {
        self.interval = interval.into();
        self
    }

    pub fn with_extended(mut self, extended: bool) -> Self {
        self.extended = extended;
        self
    }
}

/// Iteration position of a [`Clock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    /// No bar handed out yet.
    Configured,
    /// At least one bar handed out, more remain.
    Iterating,
    /// Terminal. Every further `next` returns `None`.
    Exhausted,
}

#[derive(Debug)]
pub struct Clock {
    start: DateTime<Tz>,
    end: DateTime<Tz>,
    interval: SupportedInterval,
    granularity: Granularity,
    extended: bool,
    sessions: Vec<Session>,
    /// Index of the session the next bar comes from.
    session_idx: usize,
    /// Open of the next intraday bar inside `sessions[session_idx]`.
    bar_open: Option<DateTime<Tz>>,
    /// Open of the last bar handed out.
    time: Option<DateTime<Tz>>,
}

impl Clock {
    /// Validates the interval, truncates `end` to its precision and fetches
    /// the session table covering `[start, end]` from `calendar`.
    pub fn new(config: ClockConfig, calendar: &dyn SchedulePort) -> Result<Self, ClockError> {
        let interval = SupportedInterval::try_from(&config.interval)?;
        let granularity = interval.granularity();

        // Truncate in the calendar zone, where midnight always exists.
        let raw_end = config
            .end
            .map(|end| end.with_timezone(&CALENDAR_TIMEZONE))
            .unwrap_or_else(|| Utc::now().with_timezone(&CALENDAR_TIMEZONE));
        let end = truncate(&raw_end, interval.duration())?;

        let request = ScheduleRequest::nyse(
            config.start.with_timezone(&CALENDAR_TIMEZONE).date_naive(),
            end.date_naive(),
            config.extended,
        );
        let sessions = calendar.schedule(&request)?;

        tracing::debug!(
            interval = %interval,
            granularity = ?granularity,
            start_date = %request.start_date,
            end_date = %request.end_date,
            extended = config.extended,
            sessions = sessions.len(),
            "clock configured"
        );

        let mut clock = Self {
            start: config.start,
            end,
            interval,
            granularity,
            extended: config.extended,
            sessions,
            session_idx: 0,
            bar_open: None,
            time: None,
        };
        clock.skip_empty_sessions();
        Ok(clock)
    }

    pub fn start(&self) -> DateTime<Tz> {
        self.start
    }

    /// The end of the range in the calendar zone, truncated to the
    /// interval's precision.
    pub fn end(&self) -> DateTime<Tz> {
        self.end
    }

    pub fn interval(&self) -> SupportedInterval {
        self.interval
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn is_extended(&self) -> bool {
        self.extended
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// The backtest's current time: the open of the most recently produced
    /// bar, or `start` before the first one.
    pub fn time(&self) -> DateTime<Tz> {
        self.time.unwrap_or(self.start)
    }

    pub fn has_next(&self) -> bool {
        self.session_idx < self.sessions.len()
    }

    pub fn state(&self) -> ClockState {
        if !self.has_next() {
            ClockState::Exhausted
        } else if self.time.is_some() {
            ClockState::Iterating
        } else {
            ClockState::Configured
        }
    }

    /// Intraday sessions that cannot hold a bar are stepped over so that
    /// `has_next` stays exact.
    fn skip_empty_sessions(&mut self) {
        if self.granularity != Granularity::Intraday {
            return;
        }
        while let Some(session) = self.sessions.get(self.session_idx) {
            if session.open < session.close {
                break;
            }
            self.session_idx += 1;
        }
    }

    fn next_intraday(&mut self) -> Option<Bar> {
        let session = self.sessions.get(self.session_idx)?;
        let step = self.interval.duration();
        let open = self.bar_open.unwrap_or(session.open);
        let next_open = open + step;
        let bar = Bar::new(open, next_open.min(session.close));

        if next_open < session.close {
            self.bar_open = Some(next_open);
        } else {
            self.bar_open = None;
            self.session_idx += 1;
            self.skip_empty_sessions();
        }
        Some(bar)
    }

    fn next_daily(&mut self) -> Option<Bar> {
        let session = self.sessions.get(self.session_idx)?;
        let bar = Bar::new(session.open, session.close);
        self.session_idx += 1;
        Some(bar)
    }

    fn next_weekly(&mut self) -> Option<Bar> {
        let remaining = self.sessions.get(self.session_idx..)?;
        let first = remaining.first()?;
        let week = first.date.iso_week();
        let len = remaining
            .iter()
            .take_while(|s| s.date.iso_week() == week)
            .count();
        let last = &remaining[len - 1];
        let bar = Bar::new(first.open, last.close);
        self.session_idx += len;
        Some(bar)
    }
}

impl Iterator for Clock {
    type Item = Bar;

    fn next(&mut self) -> Option<Bar> {
        let bar = match self.granularity {
            Granularity::Intraday => self.next_intraday(),
            Granularity::Daily => self.next_daily(),
            Granularity::Weekly => self.next_weekly(),
        }?;
        self.time = Some(bar.open);
        Some(bar)
    }
}

impl FusedIterator for Clock {}
