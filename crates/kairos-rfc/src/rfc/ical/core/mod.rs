//! iCalendar core models (RFC 5545).
//!
//! This module defines the value types shared by the codec, the recurrence
//! engine and the component model:
//! - Structural equality: collections that are sets in meaning compare and
//!   hash independently of their order
//! - Exact offsets: UTC offsets keep second precision
//! - Wire fidelity: unknown properties and parameters survive a round trip

mod component;
mod datetime;
mod duration;
mod parameter;
mod property;
mod rrule;
mod unordered;
mod value;

pub use component::{Component, ComponentKind};
pub use datetime::{DateTime, DateTimeForm, NullableOrdering, UtcOffset};
pub use duration::Duration;
pub use parameter::{Parameter, names as param_names};
pub use property::{ContentLine, Property, names as prop_names};
pub use rrule::{Frequency, RRule, Weekday, WeekdayNum};
pub use unordered::UnorderedVec;
pub use value::{Period, PeriodList, Value};
