//! Configuration validation.
//!
//! Checks the `[clock]` and `[calendar]` sections before a clock is built.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

use crate::domain::error::ClockError;
use crate::domain::interval::SupportedInterval;
use crate::domain::session::CALENDAR_TIMEZONE;
use crate::ports::config_port::ConfigPort;

pub const CALENDAR_SOURCES: [&str; 2] = ["nyse", "csv"];

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn validate_clock_config(config: &dyn ConfigPort) -> Result<(), ClockError> {
    validate_dates(config)?;
    validate_interval(config)?;
    validate_extended(config)?;
    Ok(())
}

pub fn validate_calendar_config(config: &dyn ConfigPort) -> Result<(), ClockError> {
    let source = config
        .get_string("calendar", "source")
        .unwrap_or_else(|| "nyse".to_string());
    let source = source.trim().to_lowercase();
    if !CALENDAR_SOURCES.contains(&source.as_str()) {
        return Err(ClockError::ConfigInvalid {
            section: "calendar".to_string(),
            key: "source".to_string(),
            reason: format!(
                "unknown source '{}', expected one of: {}",
                source,
                CALENDAR_SOURCES.join(", ")
            ),
        });
    }
    if source == "csv" {
        match config.get_string("calendar", "path") {
            Some(p) if !p.trim().is_empty() => {}
            _ => {
                return Err(ClockError::ConfigMissing {
                    section: "calendar".to_string(),
                    key: "path".to_string(),
                })
            }
        }
    }
    Ok(())
}

/// Parses a config datetime as New York local time.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_datetime(value: &str, section: &str, field: &str) -> Result<DateTime<Tz>, ClockError> {
    let value = value.trim();
    let invalid = |reason: String| ClockError::ConfigInvalid {
        section: section.to_string(),
        key: field.to_string(),
        reason,
    };

    let naive = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| {
            invalid(format!(
                "invalid {} format, expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS",
                field
            ))
        })?;

    CALENDAR_TIMEZONE
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| invalid(format!("{} does not exist in {}", naive, CALENDAR_TIMEZONE)))
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), ClockError> {
    let start = match config.get_string("clock", "start") {
        Some(s) => parse_datetime(&s, "clock", "start")?,
        None => {
            return Err(ClockError::ConfigMissing {
                section: "clock".to_string(),
                key: "start".to_string(),
            })
        }
    };

    // A missing end means "now" and needs no check.
    if let Some(s) = config.get_string("clock", "end") {
        let end = parse_datetime(&s, "clock", "end")?;
        if start > end {
            return Err(ClockError::ConfigInvalid {
                section: "clock".to_string(),
                key: "start".to_string(),
                reason: "start must not be after end".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_interval(config: &dyn ConfigPort) -> Result<(), ClockError> {
    let Some(text) = config.get_string("clock", "interval") else {
        return Ok(());
    };
    text.trim()
        .parse::<SupportedInterval>()
        .map(|_| ())
        .map_err(|e| ClockError::ConfigInvalid {
            section: "clock".to_string(),
            key: "interval".to_string(),
            reason: e.to_string(),
        })
}

fn validate_extended(config: &dyn ConfigPort) -> Result<(), ClockError> {
    if config.get_string("clock", "extended").is_some()
        && config.get_bool_opt("clock", "extended").is_none()
    {
        return Err(ClockError::ConfigInvalid {
            section: "clock".to_string(),
            key: "extended".to_string(),
            reason: "extended must be true or false".to_string(),
        });
    }
    Ok(())
}
