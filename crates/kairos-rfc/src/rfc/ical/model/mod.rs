//! Typed calendar model.
//!
//! Events, todos and journals share one [`RecurringComponent`] aggregate and
//! differ only in a few fields, so [`CalendarComponent`] is a tagged variant
//! over that aggregate. Every collection-typed field is an
//! [`UnorderedVec`](crate::rfc::ical::core::UnorderedVec).

mod attendee;
mod calendar;
mod component;

pub use attendee::{Attachment, Attendee, Organizer};
pub use calendar::{Calendar, from_ical, to_ical};
pub use component::{CalendarComponent, RecurringComponent};
