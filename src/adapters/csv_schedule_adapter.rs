//! CSV file schedule adapter.
//!
//! Reads a precomputed session table with the header
//! `date,pre,market_open,market_close,post`. Instants are local wall times
//! (`YYYY-MM-DD HH:MM:SS`) in the requested timezone; empty `pre`/`post`
//! cells fall back to the regular open/close.

use crate::domain::error::ClockError;
use crate::domain::session::{ScheduleRequest, Session, SessionEnd, SessionStart};
use crate::ports::schedule_port::SchedulePort;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use std::fs;
use std::path::PathBuf;

const DATE_FORMAT: &str = "%Y-%m-%d";
const SCHEDULE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CsvScheduleAdapter {
    path: PathBuf,
}

impl CsvScheduleAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn calendar_error(reason: String) -> ClockError {
        ClockError::Calendar { reason }
    }

    fn column<'r>(
        record: &'r csv::StringRecord,
        index: usize,
        name: &str,
    ) -> Result<&'r str, ClockError> {
        record
            .get(index)
            .map(str::trim)
            .ok_or_else(|| Self::calendar_error(format!("missing {} column", name)))
    }

    fn parse_instant(tz: Tz, value: &str, name: &str) -> Result<DateTime<Tz>, ClockError> {
        let naive = NaiveDateTime::parse_from_str(value, SCHEDULE_TIME_FORMAT).map_err(|e| {
            Self::calendar_error(format!("invalid {} value '{}': {}", name, value, e))
        })?;
        tz.from_local_datetime(&naive).earliest().ok_or_else(|| {
            Self::calendar_error(format!("{} value '{}' does not exist in {}", name, value, tz))
        })
    }

    /// Parses an optional boundary, falling back to `regular` when blank.
    fn parse_optional(
        tz: Tz,
        value: &str,
        name: &str,
        regular: DateTime<Tz>,
    ) -> Result<DateTime<Tz>, ClockError> {
        if value.is_empty() {
            Ok(regular)
        } else {
            Self::parse_instant(tz, value, name)
        }
    }
}

impl SchedulePort for CsvScheduleAdapter {
    fn schedule(&self, request: &ScheduleRequest) -> Result<Vec<Session>, ClockError> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            Self::calendar_error(format!("failed to read {}: {}", self.path.display(), e))
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut sessions = Vec::new();
        let tz = request.timezone;

        for result in rdr.records() {
            let record =
                result.map_err(|e| Self::calendar_error(format!("CSV parse error: {}", e)))?;

            let date_str = Self::column(&record, 0, "date")?;
            let date = NaiveDate::parse_from_str(date_str, DATE_FORMAT)
                .map_err(|e| Self::calendar_error(format!("invalid date format: {}", e)))?;

            if date < request.start_date || date > request.end_date {
                continue;
            }

            let open_str = Self::column(&record, 2, "market_open")?;
            let market_open = Self::parse_instant(tz, open_str, "market_open")?;
            let close_str = Self::column(&record, 3, "market_close")?;
            let market_close = Self::parse_instant(tz, close_str, "market_close")?;

            let open = match request.session_start {
                SessionStart::MarketOpen => market_open,
                SessionStart::PreMarket => {
                    let pre = Self::column(&record, 1, "pre")?;
                    Self::parse_optional(tz, pre, "pre", market_open)?
                }
            };
            let close = match request.session_end {
                SessionEnd::MarketClose => market_close,
                SessionEnd::PostMarket => {
                    let post = Self::column(&record, 4, "post")?;
                    Self::parse_optional(tz, post, "post", market_close)?
                }
            };

            if open > close {
                return Err(Self::calendar_error(format!(
                    "session on {} opens after it closes",
                    date
                )));
            }
            sessions.push(Session::new(date, open, close));
        }

        sessions.sort_by_key(|s| s.date);
        if let Some(pair) = sessions.windows(2).find(|pair| pair[0].date == pair[1].date) {
            return Err(Self::calendar_error(format!(
                "duplicate session for {}",
                pair[0].date
            )));
        }
        tracing::debug!(
            file = %self.path.display(),
            sessions = sessions.len(),
            "loaded CSV schedule"
        );
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::CALENDAR_TIMEZONE;
    use tempfile::TempDir;

    const HEADER: &str = "date,pre,market_open,market_close,post\n";

    fn setup(rows: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sessions.csv");
        fs::write(&path, format!("{HEADER}{rows}")).unwrap();
        (dir, path)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ny(y: i32, m: u32, d: u32, h: u32, mi: u32) -> DateTime<Tz> {
        CALENDAR_TIMEZONE.with_ymd_and_hms(y, m, d, h, mi, 0).unwrap()
    }

    const ROWS: &str = "\
2025-04-08,2025-04-08 04:00:00,2025-04-08 09:30:00,2025-04-08 16:00:00,2025-04-08 20:00:00
2025-04-07,2025-04-07 04:00:00,2025-04-07 09:30:00,2025-04-07 16:00:00,2025-04-07 20:00:00
2025-04-09,,2025-04-09 09:30:00,2025-04-09 13:00:00,
";

    #[test]
    fn schedule_returns_sorted_regular_sessions() {
        let (_dir, path) = setup(ROWS);
        let adapter = CsvScheduleAdapter::new(path);
        let request = ScheduleRequest::nyse(date(2025, 4, 7), date(2025, 4, 9), false);
        let sessions = adapter.schedule(&request).unwrap();

        assert_eq!(sessions.len(), 3);
        assert_eq!(sessions[0].date, date(2025, 4, 7));
        assert_eq!(sessions[0].open, ny(2025, 4, 7, 9, 30));
        assert_eq!(sessions[2].close, ny(2025, 4, 9, 13, 0));
    }

    #[test]
    fn schedule_filters_by_date() {
        let (_dir, path) = setup(ROWS);
        let adapter = CsvScheduleAdapter::new(path);
        let request = ScheduleRequest::nyse(date(2025, 4, 8), date(2025, 4, 8), false);
        let sessions = adapter.schedule(&request).unwrap();

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].date, date(2025, 4, 8));
    }

    #[test]
    fn extended_uses_pre_and_post_with_fallback() {
        let (_dir, path) = setup(ROWS);
        let adapter = CsvScheduleAdapter::new(path);
        let request = ScheduleRequest::nyse(date(2025, 4, 7), date(2025, 4, 9), true);
        let sessions = adapter.schedule(&request).unwrap();

        assert_eq!(sessions[0].open, ny(2025, 4, 7, 4, 0));
        assert_eq!(sessions[0].close, ny(2025, 4, 7, 20, 0));
        assert_eq!(sessions[2].open, ny(2025, 4, 9, 9, 30));
        assert_eq!(sessions[2].close, ny(2025, 4, 9, 13, 0));
    }

    #[test]
    fn missing_file_is_a_calendar_error() {
        let adapter = CsvScheduleAdapter::new(PathBuf::from("/nonexistent/sessions.csv"));
        let request = ScheduleRequest::nyse(date(2025, 4, 7), date(2025, 4, 9), false);
        let err = adapter.schedule(&request).unwrap_err();
        assert!(matches!(err, ClockError::Calendar { .. }));
    }

    #[test]
    fn malformed_instant_is_a_calendar_error() {
        let (_dir, path) = setup("2025-04-07,,09:30,16:00,\n");
        let adapter = CsvScheduleAdapter::new(path);
        let request = ScheduleRequest::nyse(date(2025, 4, 7), date(2025, 4, 7), false);
        let err = adapter.schedule(&request).unwrap_err();
        assert!(matches!(err, ClockError::Calendar { reason } if reason.contains("market_open")));
    }

    const APR_7: &str = "2025-04-07,,2025-04-07 09:30:00,2025-04-07 16:00:00,\n";
    const APR_8: &str = "2025-04-08,,2025-04-08 09:30:00,2025-04-08 16:00:00,\n";

    #[test]
    fn duplicate_dates_are_rejected() {
        let (_dir, path) = setup(&format!("{APR_7}{APR_8}{APR_7}"));
        let adapter = CsvScheduleAdapter::new(path);
        let request = ScheduleRequest::nyse(date(2025, 4, 7), date(2025, 4, 8), false);
        let err = adapter.schedule(&request).unwrap_err();
        assert!(matches!(
            err,
            ClockError::Calendar { reason } if reason == "duplicate session for 2025-04-07"
        ));
    }

    #[test]
    fn duplicate_dates_outside_range_are_ignored() {
        let (_dir, path) = setup(&format!("{APR_7}{APR_7}{APR_8}"));
        let adapter = CsvScheduleAdapter::new(path);
        let request = ScheduleRequest::nyse(date(2025, 4, 8), date(2025, 4, 8), false);
        assert_eq!(adapter.schedule(&request).unwrap().len(), 1);
    }

    #[test]
    fn inverted_session_is_rejected() {
        let (_dir, path) = setup("2025-04-07,,2025-04-07 16:00:00,2025-04-07 09:30:00,\n");
        let adapter = CsvScheduleAdapter::new(path);
        let request = ScheduleRequest::nyse(date(2025, 4, 7), date(2025, 4, 7), false);
        assert!(adapter.schedule(&request).is_err());
    }
}
