//! Clock bar: one unit of tradable time.

use std::fmt;

use chrono::{DateTime, TimeDelta};
use chrono_tz::Tz;

/// Datetime format used when rendering a bar.
pub const BAR_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// An `(open, close)` instant pair. Ordering compares `open`, then `close`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bar {
    pub open: DateTime<Tz>,
    pub close: DateTime<Tz>,
}

impl Bar {
    pub fn new(open: DateTime<Tz>, close: DateTime<Tz>) -> Self {
        debug_assert!(open <= close, "bar opens after it closes");
        Self { open, close }
    }

    /// close - open
    pub fn duration(&self) -> TimeDelta {
        self.close - self.open
    }
}

impl fmt::Display for Bar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "open={} close={}",
            self.open.format(BAR_TIME_FORMAT),
            self.close.format(BAR_TIME_FORMAT)
        )
    }
}
