//! Recurrence expansion for iCalendar components.
//!
//! This module expands RFC 5545 recurrence rules into occurrences, combines
//! them with RDATE and EXDATE lists, and resolves zoned values to UTC through
//! an injected [`ZoneResolver`].

mod error;
mod recurrence_set;
mod rrule;
mod timezone;
mod vtimezone;

pub use error::{ExpansionError, ExpansionResult};
pub use recurrence_set::{Occurrence, RecurrenceSet, SetIter};
pub use rrule::{ExpansionOptions, RecurrenceIter};
pub use timezone::{
    CalendarResolver, FixedOffsetResolver, IanaResolver, ZoneResolver, local_to_utc,
    normalize_tzid,
};
pub use vtimezone::{Observance, ObservanceKind, VTimezone};
