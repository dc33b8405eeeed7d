//! iCalendar RFC 5545 implementation.
//!
//! - `core`: value types shared by every other module
//! - `parse` and `build`: the text codec
//! - `expand`: recurrence rules, recurrence sets and zone resolution
//! - `freebusy`: busy time derived from expanded occurrences
//! - `model`: typed calendars, events, todos and journals
//!
//! ## Example
//!
//! ```rust
//! use kairos_rfc::rfc::ical::expand::{ExpansionOptions, FixedOffsetResolver};
//! use kairos_rfc::rfc::ical::model;
//!
//! let input = "BEGIN:VCALENDAR\r\n\
//! VERSION:2.0\r\n\
//! PRODID:-//Example//EN\r\n\
//! BEGIN:VEVENT\r\n\
//! UID:standup\r\n\
//! DTSTAMP:20260101T000000Z\r\n\
//! DTSTART:20260105T090000Z\r\n\
//! RRULE:FREQ=DAILY;COUNT=3\r\n\
//! END:VEVENT\r\n\
//! END:VCALENDAR\r\n";
//!
//! let calendar = model::from_ical(input).unwrap();
//! let event = calendar.components.first().unwrap();
//! let set = event.common().recurrence_set().unwrap();
//! let resolver = FixedOffsetResolver::new();
//! let starts: Vec<_> = set
//!     .occurrences(&resolver, ExpansionOptions::default())
//!     .unwrap()
//!     .map(|o| o.unwrap().instant)
//!     .collect();
//! assert_eq!(starts.len(), 3);
//! ```

pub mod build;
pub mod core;
pub mod expand;
pub mod freebusy;
pub mod model;
pub mod parse;

#[cfg(test)]
mod tests;

pub use build::serialize;
pub use core::{Component, ComponentKind, Parameter, Property};
pub use parse::{ParseError, ParseResult, parse};
