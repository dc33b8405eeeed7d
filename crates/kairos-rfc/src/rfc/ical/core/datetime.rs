//! iCalendar DATE, DATE-TIME and UTC-OFFSET value types (RFC 5545 §3.3.4, §3.3.5, §3.3.14).

use std::cmp::Ordering;
use std::fmt;

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};

use crate::rfc::ical::expand::{ExpansionResult, ZoneResolver, local_to_utc};

/// UTC offset representation (e.g., +0530, -0800, -001730).
///
/// Stored as total seconds from UTC so offsets that are not whole minutes
/// survive parsing, arithmetic and serialization unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UtcOffset {
    /// Total seconds from UTC (positive = east, negative = west).
    seconds: i32,
}

impl UtcOffset {
    /// UTC offset (zero).
    pub const UTC: Self = Self { seconds: 0 };

    /// Largest magnitude representable as `±HHMMSS`.
    const MAX_SECONDS: i32 = 23 * 3600 + 59 * 60 + 59;

    /// Creates a UTC offset from its sign and `HH`, `MM`, `SS` parts.
    ///
    /// Returns `None` when a part is out of range.
    #[must_use]
    pub fn from_hms(negative: bool, hours: u8, minutes: u8, seconds: u8) -> Option<Self> {
        if hours > 23 || minutes > 59 || seconds > 59 {
            return None;
        }
        let total = i32::from(hours) * 3600 + i32::from(minutes) * 60 + i32::from(seconds);
        Some(Self {
            seconds: if negative { -total } else { total },
        })
    }

    /// Creates a UTC offset from total seconds.
    ///
    /// Returns `None` when the magnitude exceeds `23:59:59`.
    #[must_use]
    pub const fn from_seconds(seconds: i32) -> Option<Self> {
        if seconds.abs() > Self::MAX_SECONDS {
            return None;
        }
        Some(Self { seconds })
    }

    /// Returns the offset as total seconds from UTC.
    #[must_use]
    pub const fn as_seconds(self) -> i32 {
        self.seconds
    }

    /// Returns hours component (may be negative).
    #[must_use]
    pub const fn hours(self) -> i32 {
        self.seconds / 3600
    }

    /// Returns minutes component (always positive).
    #[must_use]
    pub const fn minutes(self) -> i32 {
        (self.seconds.abs() % 3600) / 60
    }

    /// Returns seconds component (always positive).
    #[must_use]
    pub const fn seconds(self) -> i32 {
        self.seconds.abs() % 60
    }

    /// Converts to a `chrono` fixed offset.
    #[must_use]
    pub fn to_fixed(self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.seconds)
    }
}

impl fmt::Display for UtcOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.seconds >= 0 { '+' } else { '-' };
        let abs = self.seconds.abs();
        write!(f, "{sign}{:02}{:02}", abs / 3600, (abs % 3600) / 60)?;
        if abs % 60 != 0 {
            write!(f, "{:02}", abs % 60)?;
        }
        Ok(())
    }
}

/// Form of DATE-TIME value (RFC 5545 §3.3.5).
///
/// iCalendar DATE-TIME values come in three mutually exclusive forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DateTimeForm {
    /// Floating time - same wall-clock time in any timezone.
    ///
    /// Example: `19980118T230000`
    Floating,

    /// UTC time - absolute instant, indicated by 'Z' suffix.
    ///
    /// Example: `19980119T070000Z`
    Utc,

    /// Zoned time - local time with TZID reference.
    ///
    /// Example: `TZID=America/New_York:19980119T020000`
    Zoned {
        /// The time zone identifier as written.
        tzid: String,
    },
}

/// A calendar date or date-time with its interpretation.
///
/// Equality is structural: the wall-clock value, the date/date-time flag and
/// the form (including the zone identifier) must all match. Two values naming
/// the same instant in different zones are therefore unequal; use
/// [`DateTime::instant`] to compare points in time.
///
/// No UTC projection is cached, so [`DateTime::set_local`] never leaves stale
/// derived state behind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DateTime {
    local: NaiveDateTime,
    has_time: bool,
    form: DateTimeForm,
}

impl DateTime {
    /// Creates a floating DATE-TIME.
    #[must_use]
    pub const fn floating(local: NaiveDateTime) -> Self {
        Self {
            local,
            has_time: true,
            form: DateTimeForm::Floating,
        }
    }

    /// Creates a UTC DATE-TIME.
    #[must_use]
    pub const fn utc(local: NaiveDateTime) -> Self {
        Self {
            local,
            has_time: true,
            form: DateTimeForm::Utc,
        }
    }

    /// Creates a zoned DATE-TIME.
    #[must_use]
    pub fn zoned(local: NaiveDateTime, tzid: impl Into<String>) -> Self {
        Self {
            local,
            has_time: true,
            form: DateTimeForm::Zoned { tzid: tzid.into() },
        }
    }

    /// Creates a DATE value (no time of day, floating).
    #[must_use]
    pub fn date(date: NaiveDate) -> Self {
        Self {
            local: date.and_time(NaiveTime::MIN),
            has_time: false,
            form: DateTimeForm::Floating,
        }
    }

    /// Creates a UTC DATE-TIME from an absolute instant.
    #[must_use]
    pub fn from_instant(instant: chrono::DateTime<Utc>) -> Self {
        Self::utc(instant.naive_utc())
    }

    /// Current instant truncated to whole seconds, in UTC form.
    #[must_use]
    pub fn now_utc() -> Self {
        let now = Utc::now();
        Self::from_instant(now.with_nanosecond(0).unwrap_or(now))
    }

    /// Rebuilds a value with the same form from another wall-clock value.
    #[must_use]
    pub(crate) fn with_local(&self, local: NaiveDateTime) -> Self {
        Self {
            local,
            has_time: self.has_time,
            form: self.form.clone(),
        }
    }

    /// Returns the wall-clock value.
    #[must_use]
    pub const fn local(&self) -> NaiveDateTime {
        self.local
    }

    /// Returns the calendar date of the wall-clock value.
    #[must_use]
    pub const fn naive_date(&self) -> NaiveDate {
        self.local.date()
    }

    /// Returns whether this is a DATE-TIME rather than a DATE.
    #[must_use]
    pub const fn has_time(&self) -> bool {
        self.has_time
    }

    /// Returns the form of this value.
    #[must_use]
    pub const fn form(&self) -> &DateTimeForm {
        &self.form
    }

    /// Returns whether this is a UTC time.
    #[must_use]
    pub const fn is_utc(&self) -> bool {
        matches!(self.form, DateTimeForm::Utc)
    }

    /// Returns whether this is a floating time.
    #[must_use]
    pub const fn is_floating(&self) -> bool {
        matches!(self.form, DateTimeForm::Floating)
    }

    /// Returns the timezone ID if this is a zoned time.
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        match &self.form {
            DateTimeForm::Zoned { tzid } => Some(tzid),
            _ => None,
        }
    }

    /// Replaces the wall-clock value, keeping the form and zone.
    pub fn set_local(&mut self, local: NaiveDateTime) {
        self.local = local;
    }

    /// Resolves this value to an absolute instant.
    ///
    /// Floating values (and DATE values without a zone) are read as if their
    /// wall-clock value were already UTC.
    ///
    /// ## Errors
    /// Returns `UnresolvableZone` if the zone is unknown to `resolver`, or
    /// `AmbiguousLocalTime` if the wall-clock value falls in a transition
    /// gap or overlap.
    pub fn instant<R: ZoneResolver + ?Sized>(
        &self,
        resolver: &R,
    ) -> ExpansionResult<chrono::DateTime<Utc>> {
        match &self.form {
            DateTimeForm::Utc | DateTimeForm::Floating => Ok(self.local.and_utc()),
            DateTimeForm::Zoned { tzid } => local_to_utc(resolver, self.local, tzid),
        }
    }

    /// Returns the same instant in UTC form.
    ///
    /// ## Errors
    /// Same as [`DateTime::instant`].
    pub fn as_utc<R: ZoneResolver + ?Sized>(&self, resolver: &R) -> ExpansionResult<Self> {
        if self.is_utc() {
            return Ok(self.clone());
        }
        self.instant(resolver).map(Self::from_instant)
    }

    /// Compares two possibly-absent values by instant.
    ///
    /// ## Errors
    /// Propagates zone resolution failures from either side.
    pub fn nullable_cmp<R: ZoneResolver + ?Sized>(
        a: Option<&Self>,
        b: Option<&Self>,
        resolver: &R,
    ) -> ExpansionResult<NullableOrdering> {
        let a = a.map(|dt| dt.instant(resolver)).transpose()?;
        let b = b.map(|dt| dt.instant(resolver)).transpose()?;
        Ok(NullableOrdering::of(a.as_ref(), b.as_ref()))
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_time {
            return write!(f, "{}", self.local.format("%Y%m%d"));
        }
        write!(f, "{}", self.local.format("%Y%m%dT%H%M%S"))?;
        if self.is_utc() {
            write!(f, "Z")?;
        }
        Ok(())
    }
}

/// Outcome of comparing two optional values.
///
/// Mirrors nullable-integer semantics: two absent values are equal, while an
/// absent value is neither less than, greater than nor equal to a present one.
/// Every ordering predicate involving an absent value is false.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullableOrdering {
    /// Neither side has a value.
    BothAbsent,
    /// Exactly one side has a value.
    OneAbsent,
    /// Both sides have values with this ordering.
    Defined(Ordering),
}

impl NullableOrdering {
    /// Compares two optional values.
    #[must_use]
    pub fn of<T: Ord>(a: Option<&T>, b: Option<&T>) -> Self {
        match (a, b) {
            (None, None) => Self::BothAbsent,
            (Some(a), Some(b)) => Self::Defined(a.cmp(b)),
            _ => Self::OneAbsent,
        }
    }

    #[must_use]
    pub const fn is_eq(self) -> bool {
        matches!(self, Self::BothAbsent | Self::Defined(Ordering::Equal))
    }

    #[must_use]
    pub const fn is_ne(self) -> bool {
        !self.is_eq()
    }

    #[must_use]
    pub const fn is_lt(self) -> bool {
        matches!(self, Self::Defined(Ordering::Less))
    }

    #[must_use]
    pub const fn is_le(self) -> bool {
        matches!(self, Self::Defined(Ordering::Less | Ordering::Equal))
    }

    #[must_use]
    pub const fn is_gt(self) -> bool {
        matches!(self, Self::Defined(Ordering::Greater))
    }

    #[must_use]
    pub const fn is_ge(self) -> bool {
        matches!(self, Self::Defined(Ordering::Greater | Ordering::Equal))
    }
}

#[cfg(test)]
#[path = "datetime_tests.rs"]
mod tests;
