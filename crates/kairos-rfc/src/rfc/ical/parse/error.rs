//! iCalendar parsing error types.

/// Result type for iCalendar parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Error type for iCalendar parsing, positioned at a content line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Line number where the error occurred (1-based).
    pub line: usize,
    /// Column number where the error occurred (1-based).
    pub column: usize,
    /// The offending text or a short explanation.
    pub context: Option<String>,
}

impl ParseError {
    #[must_use]
    pub const fn new(kind: ParseErrorKind, line: usize, column: usize) -> Self {
        Self {
            kind,
            line,
            column,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at line {}, column {}", self.kind, self.line, self.column)?;
        match &self.context {
            Some(context) => write!(f, ": {context}"),
            None => Ok(()),
        }
    }
}

impl std::error::Error for ParseError {}

/// Kinds of parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("invalid property name")]
    InvalidPropertyName,
    #[error("missing property name")]
    MissingPropertyName,
    #[error("missing colon separator")]
    MissingColon,
    #[error("invalid parameter format")]
    InvalidParameter,
    #[error("unclosed quoted string")]
    UnclosedQuote,

    #[error("missing BEGIN line")]
    MissingBegin,
    #[error("missing END line")]
    MissingEnd,
    #[error("mismatched BEGIN/END")]
    MismatchedComponent,
    #[error("invalid component nesting")]
    InvalidNesting,
    #[error("missing required property")]
    MissingRequiredProperty,

    #[error("invalid date format")]
    InvalidDate,
    #[error("invalid time format")]
    InvalidTime,
    #[error("invalid date-time format")]
    InvalidDateTime,
    #[error("invalid duration format")]
    InvalidDuration,
    #[error("invalid period format")]
    InvalidPeriod,
    #[error("invalid UTC offset format")]
    InvalidUtcOffset,
    #[error("invalid boolean value")]
    InvalidBoolean,
    #[error("invalid integer value")]
    InvalidInteger,
    #[error("invalid property value")]
    InvalidValue,

    #[error("invalid recurrence rule")]
    InvalidRRule,
    #[error("invalid frequency")]
    InvalidFrequency,
    #[error("invalid weekday")]
    InvalidWeekday,
    #[error("UNTIL and COUNT are mutually exclusive")]
    UntilCountConflict,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
