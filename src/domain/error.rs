//! Domain error types.

/// Top-level error type for marketclock.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    #[error(
        "Time fmt: {text} is not allowed. Allowed formats must have one of these units included: w,d,h,m,s"
    )]
    InvalidFormat { text: String },

    #[error("Interval: {interval} not supported, supported intervals are: {allowed}")]
    IntervalNotSupported { interval: String, allowed: String },

    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Failure reported by the trading-calendar provider.
    #[error("calendar error: {reason}")]
    Calendar { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&ClockError> for std::process::ExitCode {
    fn from(err: &ClockError) -> Self {
        let code: u8 = match err {
            ClockError::Io(_) => 1,
            ClockError::ConfigParse { .. }
            | ClockError::ConfigMissing { .. }
            | ClockError::ConfigInvalid { .. } => 2,
            ClockError::InvalidFormat { .. }
            | ClockError::IntervalNotSupported { .. }
            | ClockError::InvalidArgument { .. } => 3,
            ClockError::Calendar { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
