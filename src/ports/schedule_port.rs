//! Trading-calendar schedule port.

use crate::domain::error::ClockError;
use crate::domain::session::{ScheduleRequest, Session};

/// Source of trading sessions for a date range.
///
/// Implementations return one [`Session`] per trading day in
/// `[start_date, end_date]`, ordered by date ascending. Non-trading days are
/// simply absent, and an empty range yields an empty table.
pub trait SchedulePort {
    fn schedule(&self, request: &ScheduleRequest) -> Result<Vec<Session>, ClockError>;
}
