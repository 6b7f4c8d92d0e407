//! Timestamp truncation to the precision implied by an interval.

use chrono::offset::LocalResult;
use chrono::{DateTime, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Timelike};

use crate::domain::error::ClockError;

/// Rounds `instant` down to the coarsest field implied by `precision`.
///
/// | precision      | fields zeroed                    |
/// |----------------|----------------------------------|
/// | >= 1 day       | hour, minute, second, sub-second |
/// | >= 1 hour      | minute, second, sub-second       |
/// | >= 1 minute    | second, sub-second               |
/// | >= 1 second    | sub-second                       |
/// | < 1 second     | nothing                          |
///
/// Fields are zeroed on the local wall clock and the result stays in the
/// same time zone as `instant`.
pub fn truncate<Tz: TimeZone>(
    instant: &DateTime<Tz>,
    precision: TimeDelta,
) -> Result<DateTime<Tz>, ClockError> {
    if precision <= TimeDelta::zero() {
        return Err(ClockError::InvalidArgument {
            reason: format!(
                "truncation precision must be positive, got {}s",
                precision.num_seconds()
            ),
        });
    }

    let local = instant.naive_local();
    let time = if precision >= TimeDelta::days(1) {
        hms(0, 0, 0)?
    } else if precision >= TimeDelta::hours(1) {
        hms(local.hour(), 0, 0)?
    } else if precision >= TimeDelta::minutes(1) {
        hms(local.hour(), local.minute(), 0)?
    } else if precision >= TimeDelta::seconds(1) {
        hms(local.hour(), local.minute(), local.second())?
    } else {
        return Ok(instant.clone());
    };

    relocalize(instant, NaiveDateTime::new(local.date(), time))
}

fn hms(hour: u32, minute: u32, second: u32) -> Result<NaiveTime, ClockError> {
    NaiveTime::from_hms_opt(hour, minute, second).ok_or_else(|| ClockError::InvalidArgument {
        reason: format!("invalid time of day {hour:02}:{minute:02}:{second:02}"),
    })
}

/// Maps a truncated wall-clock time back into `instant`'s zone. An
/// ambiguous wall time resolves to the later candidate that is not after
/// `instant`.
fn relocalize<Tz: TimeZone>(
    instant: &DateTime<Tz>,
    wall: NaiveDateTime,
) -> Result<DateTime<Tz>, ClockError> {
    match instant.timezone().from_local_datetime(&wall) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earlier, later) => {
            if later <= *instant {
                Ok(later)
            } else {
                Ok(earlier)
            }
        }
        LocalResult::None => Err(ClockError::InvalidArgument {
            reason: format!("{wall} does not exist in the instant's time zone"),
        }),
    }
}
