//! Error types shared by frames, handlers and executors.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

/// Convenience alias for results carrying this crate's [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures surfaced at a resumption point or from an executor run call.
#[derive(Debug, Error)]
pub enum Error {
    /// An operation reported failure through the error-code convention.
    #[error("operation failed: {0}")]
    Operation(ErrorCode),

    /// An arbitrary failure, either delivered through the error-indicator
    /// convention or raised by code inside a governed body.
    #[error(transparent)]
    Failure(Box<dyn std::error::Error + Send + Sync>),

    #[error("resumed a frame that already reached its terminal state")]
    AlreadyComplete,

    #[error("no suspension point is labelled {0}")]
    UnknownLabel(i32),

    #[error("outcome slot does not hold a value of type {expected}")]
    OutcomeMismatch { expected: &'static str },

    #[error("no outcome was stored for the current suspension")]
    MissingOutcome,

    #[error("executor task panicked: {0}")]
    Panicked(String),
}

impl Error {
    /// Box any error as a [`Error::Failure`].
    pub fn failure<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Failure(Box::new(err))
    }

    /// A [`Error::Failure`] carrying only a message.
    pub fn msg(msg: impl Into<String>) -> Self {
        Error::Failure(msg.into().into())
    }

    /// The error code, when this failure came from the error-code convention.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Error::Operation(code) => Some(*code),
            _ => None,
        }
    }
}

impl From<ErrorCode> for Error {
    fn from(code: ErrorCode) -> Self {
        Error::Operation(code)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::failure(err)
    }
}

/// A small copyable failure code. Zero means success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    value: i32,
    category: &'static str,
}

impl ErrorCode {
    pub const GENERIC: &'static str = "generic";
    pub const SYSTEM: &'static str = "system";

    pub const fn new(value: i32, category: &'static str) -> Self {
        ErrorCode { value, category }
    }

    /// The success code.
    pub const fn success() -> Self {
        ErrorCode::new(0, ErrorCode::SYSTEM)
    }

    pub const fn value(&self) -> i32 {
        self.value
    }

    pub const fn category(&self) -> &'static str {
        self.category
    }

    /// Returns `true` if the code denotes failure.
    pub const fn is_err(&self) -> bool {
        self.value != 0
    }

    /// Converts into a `Result`, mapping failure to [`Error::Operation`].
    pub fn check(self) -> Result<()> {
        if self.is_err() {
            Err(Error::Operation(self))
        } else {
            Ok(())
        }
    }
}

impl Default for ErrorCode {
    fn default() -> Self {
        ErrorCode::success()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category, self.value)
    }
}

impl From<&std::io::Error> for ErrorCode {
    fn from(err: &std::io::Error) -> Self {
        match err.raw_os_error() {
            Some(value) => ErrorCode::new(value, ErrorCode::SYSTEM),
            // kind discriminants are not stable, so all non-OS errors share one value
            None => ErrorCode::new(-1, ErrorCode::GENERIC),
        }
    }
}

/// Redirect target receiving an error code instead of it being raised.
///
/// The slot is shared: clone it into the governed body's captured state,
/// install it for one suspension with
/// [`AwaitContext::redirect`](crate::AwaitContext::redirect), then read it
/// after the body resumes.
#[derive(Debug, Clone, Default)]
pub struct ErrorSlot(Arc<Mutex<ErrorCode>>);

impl ErrorSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> ErrorCode {
        *self.0.lock()
    }

    pub fn set(&self, code: ErrorCode) {
        *self.0.lock() = code;
    }

    /// Returns `true` if the last code written denotes failure.
    pub fn is_err(&self) -> bool {
        self.get().is_err()
    }
}
