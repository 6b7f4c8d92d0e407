//! Rule-based NYSE trading calendar.
//!
//! Deterministic, pure logic: no IO, no wall clock. Sessions are derived
//! from the exchange's standing rules:
//!
//! - Regular session 09:30-16:00, pre-market from 04:00, post-market to
//!   20:00, all New York local time.
//! - Early close at 13:00 (post-market to 17:00) on July 3 and December 24
//!   when they fall Monday-Thursday, and on the day after Thanksgiving.
//! - Weekends and the full-day holidays listed in [`is_holiday`] are closed.
//!
//! One-off closures (national days of mourning, weather) are not modelled.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeDelta, TimeZone, Weekday};
use chrono_tz::Tz;

use crate::domain::error::ClockError;
use crate::domain::session::{CALENDAR_ID, ScheduleRequest, Session, SessionEnd, SessionStart};
use crate::ports::schedule_port::SchedulePort;

const PRE_MARKET_OPEN: (u32, u32) = (4, 0);
const MARKET_OPEN: (u32, u32) = (9, 30);
const MARKET_CLOSE: (u32, u32) = (16, 0);
const EARLY_CLOSE: (u32, u32) = (13, 0);
const POST_MARKET_HOURS: i64 = 4;

#[derive(Debug, Clone, Copy, Default)]
pub struct NyseCalendarAdapter;

impl NyseCalendarAdapter {
    pub fn new() -> Self {
        Self
    }

    fn session_for(
        &self,
        date: NaiveDate,
        request: &ScheduleRequest,
    ) -> Result<Session, ClockError> {
        let tz = request.timezone;
        let regular_close = if is_early_close(date) {
            EARLY_CLOSE
        } else {
            MARKET_CLOSE
        };

        let open = match request.session_start {
            SessionStart::MarketOpen => localize(tz, date, MARKET_OPEN)?,
            SessionStart::PreMarket => localize(tz, date, PRE_MARKET_OPEN)?,
        };
        let close = localize(tz, date, regular_close)?;
        let close = match request.session_end {
            SessionEnd::MarketClose => close,
            SessionEnd::PostMarket => close + TimeDelta::hours(POST_MARKET_HOURS),
        };
        Ok(Session::new(date, open, close))
    }
}

impl SchedulePort for NyseCalendarAdapter {
    fn schedule(&self, request: &ScheduleRequest) -> Result<Vec<Session>, ClockError> {
        if !request.calendar.eq_ignore_ascii_case(CALENDAR_ID) {
            return Err(ClockError::Calendar {
                reason: format!("unknown calendar '{}'", request.calendar),
            });
        }

        let mut sessions = Vec::new();
        let mut date = request.start_date;
        while date <= request.end_date {
            if is_trading_day(date) {
                sessions.push(self.session_for(date, request)?);
            }
            date = match date.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }

        tracing::debug!(
            calendar = %request.calendar,
            start_date = %request.start_date,
            end_date = %request.end_date,
            sessions = sessions.len(),
            "built NYSE schedule"
        );
        Ok(sessions)
    }
}

fn localize(
    tz: Tz,
    date: NaiveDate,
    (hour, minute): (u32, u32),
) -> Result<DateTime<Tz>, ClockError> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| ClockError::Calendar {
        reason: format!("invalid session time {hour:02}:{minute:02}"),
    })?;
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .ok_or_else(|| ClockError::Calendar {
            reason: format!("{date} {time} does not exist in {tz}"),
        })
}

pub fn is_trading_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !is_holiday(date)
}

/// Returns `true` if the exchange is closed all day on `date`.
pub fn is_holiday(date: NaiveDate) -> bool {
    let year = date.year();
    let observed = [
        new_years_day(year),
        if year >= 1998 {
            nth_weekday(year, 1, Weekday::Mon, 3)
        } else {
            None
        },
        nth_weekday(year, 2, Weekday::Mon, 3),
        good_friday(year),
        last_weekday(year, 5, Weekday::Mon),
        if year >= 2022 {
            observed_fixed(year, 6, 19)
        } else {
            None
        },
        observed_fixed(year, 7, 4),
        nth_weekday(year, 9, Weekday::Mon, 1),
        nth_weekday(year, 11, Weekday::Thu, 4),
        observed_fixed(year, 12, 25),
    ];
    observed.contains(&Some(date))
}

/// Returns `true` if the regular session ends at 13:00 on `date`.
pub fn is_early_close(date: NaiveDate) -> bool {
    let mon_to_thu = matches!(
        date.weekday(),
        Weekday::Mon | Weekday::Tue | Weekday::Wed | Weekday::Thu
    );
    let year = date.year();
    let day_after_thanksgiving = nth_weekday(year, 11, Weekday::Thu, 4).and_then(|d| d.succ_opt());

    (mon_to_thu && (date.month(), date.day()) == (7, 3))
        || (mon_to_thu && (date.month(), date.day()) == (12, 24))
        || day_after_thanksgiving == Some(date)
}

/// Jan 1, moved to Monday when it falls on Sunday. A Saturday New Year's
/// Day is not observed.
fn new_years_day(year: i32) -> Option<NaiveDate> {
    let date = NaiveDate::from_ymd_opt(year, 1, 1)?;
    match date.weekday() {
        Weekday::Sun => date.succ_opt(),
        Weekday::Sat => None,
        _ => Some(date),
    }
}

/// Fixed-date holiday moved to Friday when on Saturday and Monday when on
/// Sunday.
fn observed_fixed(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    match date.weekday() {
        Weekday::Sat => date.pred_opt(),
        Weekday::Sun => date.succ_opt(),
        _ => Some(date),
    }
}

fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    nth_weekday(year, month, weekday, 5).or_else(|| nth_weekday(year, month, weekday, 4))
}

/// Two days before Easter Sunday (anonymous Gregorian algorithm).
fn good_friday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    let easter = NaiveDate::from_ymd_opt(year, month as u32, day as u32)?;
    easter.checked_sub_signed(TimeDelta::days(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::CALENDAR_TIMEZONE;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ny(y: i32, m: u32, d: u32, h: u32, mi: u32) -> DateTime<Tz> {
        CALENDAR_TIMEZONE.with_ymd_and_hms(y, m, d, h, mi, 0).unwrap()
    }

    /// Observed full-day closures, 2023-2026.
    const HOLIDAYS: &[(i32, u32, u32)] = &[
        (2023, 1, 2),
        (2023, 1, 16),
        (2023, 2, 20),
        (2023, 4, 7),
        (2023, 5, 29),
        (2023, 6, 19),
        (2023, 7, 4),
        (2023, 9, 4),
        (2023, 11, 23),
        (2023, 12, 25),
        (2024, 1, 1),
        (2024, 1, 15),
        (2024, 2, 19),
        (2024, 3, 29),
        (2024, 5, 27),
        (2024, 6, 19),
        (2024, 7, 4),
        (2024, 9, 2),
        (2024, 11, 28),
        (2024, 12, 25),
        (2025, 1, 1),
        (2025, 1, 20),
        (2025, 2, 17),
        (2025, 4, 18),
        (2025, 5, 26),
        (2025, 6, 19),
        (2025, 7, 4),
        (2025, 9, 1),
        (2025, 11, 27),
        (2025, 12, 25),
        (2026, 1, 1),
        (2026, 1, 19),
        (2026, 2, 16),
        (2026, 4, 3),
        (2026, 5, 25),
        (2026, 6, 19),
        (2026, 7, 3),
        (2026, 9, 7),
        (2026, 11, 26),
        (2026, 12, 25),
    ];

    #[test]
    fn known_holidays_are_closed() {
        for &(y, m, d) in HOLIDAYS {
            assert!(is_holiday(date(y, m, d)), "{y}-{m:02}-{d:02} should be a holiday");
        }
    }

    #[test]
    fn holiday_count_per_year_matches_table() {
        for year in 2023..=2026 {
            let count = NaiveDate::from_ymd_opt(year, 1, 1)
                .unwrap()
                .iter_days()
                .take_while(|d| d.year() == year)
                .filter(|d| is_holiday(*d) && !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
                .count();
            assert_eq!(count, 10, "year {year}");
        }
    }

    #[test]
    fn saturday_new_year_is_not_observed() {
        // 2022-01-01 was a Saturday; neither Dec 31 2021 nor Jan 3 2022 closed.
        assert!(is_trading_day(date(2021, 12, 31)));
        assert!(is_trading_day(date(2022, 1, 3)));
    }

    #[test]
    fn juneteenth_only_from_2022() {
        assert!(is_trading_day(date(2021, 6, 18)));
        assert!(is_holiday(date(2022, 6, 20)));
    }

    #[test]
    fn early_closes() {
        assert!(is_early_close(date(2025, 7, 3)));
        assert!(is_early_close(date(2025, 11, 28)));
        assert!(is_early_close(date(2025, 12, 24)));
        assert!(is_early_close(date(2024, 12, 24)));
        // Friday July 3 2026 is the observed Independence Day, not an early close.
        assert!(!is_early_close(date(2026, 7, 3)));
        assert!(!is_early_close(date(2025, 4, 17)));
    }

    #[test]
    fn weekends_are_closed() {
        assert!(!is_trading_day(date(2025, 4, 5)));
        assert!(!is_trading_day(date(2025, 4, 6)));
        assert!(is_trading_day(date(2025, 4, 7)));
    }

    #[test]
    fn regular_sessions_for_a_week() {
        let request = ScheduleRequest::nyse(date(2025, 4, 14), date(2025, 4, 20), false);
        let sessions = NyseCalendarAdapter::new().schedule(&request).unwrap();

        let dates: Vec<NaiveDate> = sessions.iter().map(|s| s.date).collect();
        assert_eq!(
            dates,
            vec![date(2025, 4, 14), date(2025, 4, 15), date(2025, 4, 16), date(2025, 4, 17)]
        );
        assert_eq!(sessions[0].open, ny(2025, 4, 14, 9, 30));
        assert_eq!(sessions[0].close, ny(2025, 4, 14, 16, 0));
    }

    #[test]
    fn extended_sessions_use_pre_and_post_market() {
        let request = ScheduleRequest::nyse(date(2025, 4, 7), date(2025, 4, 7), true);
        let sessions = NyseCalendarAdapter::new().schedule(&request).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].open, ny(2025, 4, 7, 4, 0));
        assert_eq!(sessions[0].close, ny(2025, 4, 7, 20, 0));
    }

    #[test]
    fn early_close_session() {
        let request = ScheduleRequest::nyse(date(2025, 7, 3), date(2025, 7, 3), false);
        let sessions = NyseCalendarAdapter::new().schedule(&request).unwrap();
        assert_eq!(sessions[0].close, ny(2025, 7, 3, 13, 0));

        let request = ScheduleRequest::nyse(date(2025, 7, 3), date(2025, 7, 3), true);
        let sessions = NyseCalendarAdapter::new().schedule(&request).unwrap();
        assert_eq!(sessions[0].close, ny(2025, 7, 3, 17, 0));
    }

    #[test]
    fn reversed_range_is_empty() {
        let request = ScheduleRequest::nyse(date(2025, 4, 10), date(2025, 4, 7), false);
        assert!(NyseCalendarAdapter::new().schedule(&request).unwrap().is_empty());
    }

    #[test]
    fn unknown_calendar_is_rejected() {
        let mut request = ScheduleRequest::nyse(date(2025, 4, 7), date(2025, 4, 7), false);
        request.calendar = "LSE".to_string();
        let err = NyseCalendarAdapter::new().schedule(&request).unwrap_err();
        assert!(matches!(err, ClockError::Calendar { .. }));
    }
}
