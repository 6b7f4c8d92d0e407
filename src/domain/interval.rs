//! Interval expressions: parsing, canonical rendering and the allow-list.
//!
//! An interval is written as unit-magnitude pairs in fixed `w,d,h,m,s`
//! order, e.g. `1h`, `1w1d`, `26h65m`. Weeks are folded into days, so the
//! parsed value is a plain [`TimeDelta`].

use std::fmt;
use std::str::FromStr;

use chrono::TimeDelta;

use crate::domain::error::ClockError;

/// Interval texts a clock accepts. `7d` and `1w` name the same duration.
pub const INTERVALS_ALLOWED: [&str; 8] = ["1m", "5m", "10m", "30m", "1h", "1d", "7d", "1w"];

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_DAY: i64 = 86_400;
const SECONDS_PER_WEEK: i64 = 7 * SECONDS_PER_DAY;

/// Units in the only order the grammar accepts them.
const UNITS: [(char, i64); 5] = [
    ('w', SECONDS_PER_WEEK),
    ('d', SECONDS_PER_DAY),
    ('h', SECONDS_PER_HOUR),
    ('m', SECONDS_PER_MINUTE),
    ('s', 1),
];

struct IntervalParser<'a> {
    input: &'a str,
    pos: usize,
    next_unit: usize,
}

impl<'a> IntervalParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            next_unit: 0,
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn invalid(&self) -> ClockError {
        ClockError::InvalidFormat {
            text: self.input.to_string(),
        }
    }

    fn parse_magnitude(&mut self) -> Result<i64, ClockError> {
        let digits = self
            .remaining()
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        if digits == 0 {
            return Err(self.invalid());
        }
        let text = &self.remaining()[..digits];
        self.pos += digits;
        text.parse().map_err(|_| self.invalid())
    }

    /// Consumes a unit letter, which must come after every unit seen so far.
    fn parse_unit(&mut self) -> Result<i64, ClockError> {
        let ch = self.remaining().chars().next().ok_or_else(|| self.invalid())?;
        let offset = UNITS[self.next_unit..]
            .iter()
            .position(|(unit, _)| *unit == ch)
            .ok_or_else(|| self.invalid())?;
        let index = self.next_unit + offset;
        self.pos += ch.len_utf8();
        self.next_unit = index + 1;
        Ok(UNITS[index].1)
    }

    fn parse(mut self) -> Result<TimeDelta, ClockError> {
        if self.input.is_empty() {
            return Err(self.invalid());
        }
        let mut total: i64 = 0;
        while !self.remaining().is_empty() {
            let magnitude = self.parse_magnitude()?;
            let unit_seconds = self.parse_unit()?;
            total = magnitude
                .checked_mul(unit_seconds)
                .and_then(|secs| total.checked_add(secs))
                .ok_or_else(|| self.invalid())?;
        }
        TimeDelta::try_seconds(total).ok_or_else(|| self.invalid())
    }
}

/// Parses an interval expression such as `"30m"` or `"1w1d"`.
pub fn parse_interval(text: &str) -> Result<TimeDelta, ClockError> {
    IntervalParser::new(text).parse()
}

/// Renders a duration in canonical short form (`8 days` → `"1w1d"`).
///
/// Only non-zero components are emitted, so a zero duration renders as an
/// empty string. Sub-second precision is dropped.
pub fn format_interval(duration: TimeDelta) -> String {
    let total = duration.num_seconds();
    let mut out = String::new();
    if total < 0 {
        out.push('-');
    }
    let total = total.unsigned_abs();

    let days = total / SECONDS_PER_DAY as u64;
    let parts = [
        (days / 7, 'w'),
        (days % 7, 'd'),
        ((total % SECONDS_PER_DAY as u64) / SECONDS_PER_HOUR as u64, 'h'),
        ((total % SECONDS_PER_HOUR as u64) / SECONDS_PER_MINUTE as u64, 'm'),
        (total % SECONDS_PER_MINUTE as u64, 's'),
    ];
    for (value, unit) in parts {
        if value > 0 {
            out.push_str(&value.to_string());
            out.push(unit);
        }
    }
    out
}

/// Bar-generation strategy implied by an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// Shorter than a day: bars are cut inside each session.
    Intraday,
    /// Exactly one day: one bar per session.
    Daily,
    /// A week or longer: one bar per ISO week.
    Weekly,
}

impl Granularity {
    /// Classifies a duration. Durations strictly between one and seven days
    /// are never supported, so they are lumped in with `Daily`.
    pub fn classify(duration: TimeDelta) -> Self {
        if duration < TimeDelta::days(1) {
            Granularity::Intraday
        } else if duration < TimeDelta::days(7) {
            Granularity::Daily
        } else {
            Granularity::Weekly
        }
    }
}

/// An interval as supplied by the caller, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntervalInput {
    Text(String),
    Duration(TimeDelta),
}

impl Default for IntervalInput {
    fn default() -> Self {
        IntervalInput::Text("1d".to_string())
    }
}

impl From<&str> for IntervalInput {
    fn from(text: &str) -> Self {
        IntervalInput::Text(text.to_string())
    }
}

impl From<String> for IntervalInput {
    fn from(text: String) -> Self {
        IntervalInput::Text(text)
    }
}

impl From<TimeDelta> for IntervalInput {
    fn from(duration: TimeDelta) -> Self {
        IntervalInput::Duration(duration)
    }
}

/// A duration that is a member of [`INTERVALS_ALLOWED`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SupportedInterval {
    duration: TimeDelta,
}

impl SupportedInterval {
    pub fn validate(duration: TimeDelta) -> Result<Self, ClockError> {
        let allowed = INTERVALS_ALLOWED
            .iter()
            .any(|text| parse_interval(text).is_ok_and(|d| d == duration));
        if !allowed {
            return Err(ClockError::IntervalNotSupported {
                interval: format_interval(duration),
                allowed: INTERVALS_ALLOWED.join(", "),
            });
        }
        Ok(Self { duration })
    }

    pub fn duration(&self) -> TimeDelta {
        self.duration
    }

    pub fn granularity(&self) -> Granularity {
        Granularity::classify(self.duration)
    }
}

impl FromStr for SupportedInterval {
    type Err = ClockError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::validate(parse_interval(text)?)
    }
}

impl TryFrom<&IntervalInput> for SupportedInterval {
    type Error = ClockError;

    fn try_from(input: &IntervalInput) -> Result<Self, Self::Error> {
        match input {
            IntervalInput::Text(text) => text.parse(),
            IntervalInput::Duration(duration) => Self::validate(*duration),
        }
    }
}

impl fmt::Display for SupportedInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_interval(self.duration))
    }
}
