//! RFC 5545 calendaring engine: date-time values, recurrence expansion,
//! free/busy classification and the iCalendar text codec.

pub mod error;
pub mod rfc;
