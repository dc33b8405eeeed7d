//! Errors raised while expanding recurrences or resolving zones.

use chrono::NaiveDateTime;

/// Error during recurrence expansion or time zone conversion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpansionError {
    /// The rule is self-contradictory or can never produce an occurrence.
    #[error("Malformed recurrence rule: {0}")]
    MalformedRule(String),

    /// A wall-clock value falls in a transition gap or overlap of its zone.
    #[error("Local time {local} is ambiguous or skipped in zone {tzid}")]
    AmbiguousLocalTime {
        /// The wall-clock value being converted.
        local: NaiveDateTime,
        /// The zone it was interpreted in.
        tzid: String,
    },

    /// The zone identifier is unknown to the resolver.
    #[error("Unresolvable time zone: {0}")]
    UnresolvableZone(String),

    /// A component lacks what expansion needs, such as a start.
    #[error("Invalid component: {0}")]
    InvalidComponent(String),
}

/// Result type for expansion operations.
pub type ExpansionResult<T> = std::result::Result<T, ExpansionError>;
