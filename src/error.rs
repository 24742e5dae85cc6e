//! The error type shared across the crate.
//!
//! Every fallible operation reports a [`TempusError`] carrying an error
//! kind and a static or owned message. The kinds mirror the categories a
//! host language binding would surface: range violations, type mismatches
//! at capability boundaries, syntax errors from the text engine, and
//! internal assertion failures.

use alloc::borrow::Cow;
use core::fmt;

/// The result type returned by fallible operations.
pub type TempusResult<T> = Result<T, TempusError>;

/// The category of a [`TempusError`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A general-purpose error.
    #[default]
    Generic,
    /// A value was outside its valid range.
    Range,
    /// A value had the wrong type at a capability boundary.
    Type,
    /// A string failed to parse.
    Syntax,
    /// An internal invariant did not hold.
    Assert,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generic => "Error",
            Self::Range => "RangeError",
            Self::Type => "TypeError",
            Self::Syntax => "SyntaxError",
            Self::Assert => "ImplementationError",
        }
        .fmt(f)
    }
}

/// The error returned by fallible operations in this crate.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TempusError {
    kind: ErrorKind,
    message: Cow<'static, str>,
}

impl TempusError {
    #[inline]
    #[must_use]
    const fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: Cow::Borrowed(""),
        }
    }

    /// Creates a general-purpose error with the provided message.
    #[inline]
    #[must_use]
    pub fn general(message: &'static str) -> Self {
        Self::new(ErrorKind::Generic).with_message(message)
    }

    /// Creates a range error.
    #[inline]
    #[must_use]
    pub const fn range() -> Self {
        Self::new(ErrorKind::Range)
    }

    /// Creates a type error.
    #[inline]
    #[must_use]
    pub const fn r#type() -> Self {
        Self::new(ErrorKind::Type)
    }

    /// Creates a syntax error.
    #[inline]
    #[must_use]
    pub const fn syntax() -> Self {
        Self::new(ErrorKind::Syntax)
    }

    /// Creates an assertion error; these always represent an internal bug.
    #[inline]
    #[must_use]
    pub const fn assert() -> Self {
        Self::new(ErrorKind::Assert)
    }

    /// Attaches a message to this error.
    #[must_use]
    pub fn with_message<S>(mut self, message: S) -> Self
    where
        S: Into<Cow<'static, str>>,
    {
        self.message = message.into();
        self
    }

    /// The error's kind.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The error's message.
    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for TempusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

impl core::error::Error for TempusError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let err = TempusError::range().with_message("month must be in 1..=12");
        assert_eq!(err.to_string(), "RangeError: month must be in 1..=12");
        assert_eq!(err.kind(), ErrorKind::Range);

        let err = TempusError::assert();
        assert_eq!(err.to_string(), "ImplementationError");
    }
}
