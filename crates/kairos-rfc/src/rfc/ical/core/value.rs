//! iCalendar PERIOD values and the parsed property value (RFC 5545 §3.3).

use std::fmt;
use std::ops::{Deref, DerefMut};

use chrono::Utc;

use super::{DateTime, Duration, RRule, UnorderedVec, UtcOffset};
use crate::rfc::ical::expand::{ExpansionResult, ZoneResolver};

/// PERIOD value (RFC 5545 §3.3.9), or a bare start as used by `RDATE` and
/// `EXDATE` lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Period {
    /// A single date or date-time with no extent.
    Instant(DateTime),
    /// Explicit start and end times.
    Explicit {
        /// Start of the period.
        start: DateTime,
        /// End of the period.
        end: DateTime,
    },
    /// Start time and duration.
    Duration {
        /// Start of the period.
        start: DateTime,
        /// Duration of the period.
        duration: Duration,
    },
}

impl Period {
    /// Creates an explicit period from start to end.
    #[must_use]
    pub const fn explicit(start: DateTime, end: DateTime) -> Self {
        Self::Explicit { start, end }
    }

    /// Creates a period from a start time and duration.
    #[must_use]
    pub const fn from_duration(start: DateTime, duration: Duration) -> Self {
        Self::Duration { start, duration }
    }

    /// Returns the start of the period.
    #[must_use]
    pub const fn start(&self) -> &DateTime {
        match self {
            Self::Instant(start) | Self::Explicit { start, .. } | Self::Duration { start, .. } => {
                start
            }
        }
    }

    /// Resolves the period to UTC bounds. The end is `None` for a bare instant.
    ///
    /// ## Errors
    /// Propagates zone resolution failures.
    pub fn resolve<R: ZoneResolver + ?Sized>(
        &self,
        resolver: &R,
    ) -> ExpansionResult<(chrono::DateTime<Utc>, Option<chrono::DateTime<Utc>>)> {
        match self {
            Self::Instant(start) => Ok((start.instant(resolver)?, None)),
            Self::Explicit { start, end } => {
                Ok((start.instant(resolver)?, Some(end.instant(resolver)?)))
            }
            Self::Duration { start, duration } => {
                let start = start.instant(resolver)?;
                Ok((start, Some(start + duration.to_time_delta())))
            }
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instant(start) => write!(f, "{start}"),
            Self::Explicit { start, end } => write!(f, "{start}/{end}"),
            Self::Duration { start, duration } => write!(f, "{start}/{duration}"),
        }
    }
}

/// The values of one `RDATE` or `EXDATE` property.
///
/// Ordered at the API surface, but compared and hashed as a multiset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PeriodList(UnorderedVec<Period>);

impl PeriodList {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self(UnorderedVec::new())
    }

    /// Creates a list of bare instants.
    #[must_use]
    pub fn from_dates(dates: impl IntoIterator<Item = DateTime>) -> Self {
        dates.into_iter().map(Period::Instant).collect()
    }

    /// Returns the zone shared by the starts, taken from the first entry.
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        self.0.first().and_then(|period| period.start().tzid())
    }

    /// Returns a list holding every period of `self` and `other`, without
    /// duplicating periods already present.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut result = self.clone();
        for period in other.iter() {
            if !result.contains(period) {
                result.push(period.clone());
            }
        }
        result
    }

    /// Returns the periods of `self` whose start instant is not the start of
    /// any period in `other`.
    ///
    /// ## Errors
    /// Propagates zone resolution failures.
    pub fn difference<R: ZoneResolver + ?Sized>(
        &self,
        other: &Self,
        resolver: &R,
    ) -> ExpansionResult<Self> {
        let excluded = other.start_instants(resolver)?;
        let mut result = Self::new();
        for period in self.iter() {
            if !excluded.contains(&period.start().instant(resolver)?) {
                result.push(period.clone());
            }
        }
        Ok(result)
    }

    /// Resolves every start to UTC, in list order.
    ///
    /// ## Errors
    /// Propagates zone resolution failures.
    pub fn start_instants<R: ZoneResolver + ?Sized>(
        &self,
        resolver: &R,
    ) -> ExpansionResult<Vec<chrono::DateTime<Utc>>> {
        self.iter()
            .map(|period| period.start().instant(resolver))
            .collect()
    }
}

impl Deref for PeriodList {
    type Target = UnorderedVec<Period>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for PeriodList {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl FromIterator<Period> for PeriodList {
    fn from_iter<I: IntoIterator<Item = Period>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a PeriodList {
    type Item = &'a Period;
    type IntoIter = std::slice::Iter<'a, Period>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Value types (RFC 5545 §3.3).
///
/// This enum represents the parsed value of a property. The raw string
/// is preserved separately on [`super::Property`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// BINARY value (base64 decoded).
    Binary(Vec<u8>),
    /// BOOLEAN value.
    Boolean(bool),
    /// DATE or DATE-TIME value.
    DateTime(DateTime),
    /// Comma-separated DATE or DATE-TIME values.
    DateTimeList(Vec<DateTime>),
    /// DURATION value.
    Duration(Duration),
    /// INTEGER value.
    Integer(i32),
    /// PERIOD value.
    Period(Period),
    /// Comma-separated PERIOD values.
    PeriodList(Vec<Period>),
    /// RECUR value (recurrence rule).
    Recur(Box<RRule>),
    /// TEXT value (unescaped).
    Text(String),
    /// Comma-separated TEXT values (unescaped).
    TextList(Vec<String>),
    /// URI or CAL-ADDRESS value.
    Uri(String),
    /// UTC-OFFSET value.
    UtcOffset(UtcOffset),
    /// Unknown or unparsed value. Preserved for round-trip.
    Unknown(String),
}

impl Value {
    /// Returns this value as text, if it is a text or URI value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Uri(s) => Some(s),
            _ => None,
        }
    }

    /// Returns this value as an integer, if it is an integer value.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i32> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns this value as a date-time, if it is a date-time value.
    #[must_use]
    pub const fn as_datetime(&self) -> Option<&DateTime> {
        match self {
            Self::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    /// Returns this value as a duration, if it is a duration value.
    #[must_use]
    pub const fn as_duration(&self) -> Option<&Duration> {
        match self {
            Self::Duration(d) => Some(d),
            _ => None,
        }
    }

    /// Returns this value as a recurrence rule, if it is a recur value.
    #[must_use]
    pub fn as_recur(&self) -> Option<&RRule> {
        match self {
            Self::Recur(r) => Some(r),
            _ => None,
        }
    }

    /// Returns this value as a UTC offset, if it is one.
    #[must_use]
    pub const fn as_utc_offset(&self) -> Option<UtcOffset> {
        match self {
            Self::UtcOffset(offset) => Some(*offset),
            _ => None,
        }
    }

    /// Returns the date-time or period values of an `RDATE`/`EXDATE` style
    /// property as a list.
    #[must_use]
    pub fn to_period_list(&self) -> Option<PeriodList> {
        match self {
            Self::DateTime(dt) => Some(PeriodList::from_dates([dt.clone()])),
            Self::DateTimeList(dts) => Some(PeriodList::from_dates(dts.iter().cloned())),
            Self::Period(period) => Some(std::iter::once(period.clone()).collect()),
            Self::PeriodList(periods) => Some(periods.iter().cloned().collect()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::hash::{DefaultHasher, Hash, Hasher};

    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;
    use crate::rfc::ical::expand::FixedOffsetResolver;

    fn utc(y: i32, mo: u32, d: u32, h: u32) -> DateTime {
        DateTime::utc(naive(y, mo, d, h))
    }

    fn naive(y: i32, mo: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn period_explicit_display() {
        let period = Period::explicit(utc(2026, 1, 23, 9), utc(2026, 1, 23, 17));
        assert_eq!(period.to_string(), "20260123T090000Z/20260123T170000Z");
    }

    #[test]
    fn period_duration_display() {
        let period = Period::from_duration(utc(2026, 1, 23, 9), Duration::hours(8));
        assert_eq!(period.to_string(), "20260123T090000Z/PT8H");
    }

    #[test]
    fn period_resolve_applies_duration() {
        let period = Period::from_duration(utc(2026, 1, 23, 9), Duration::hours(8));
        let (start, end) = period.resolve(&FixedOffsetResolver::new()).unwrap();
        assert_eq!(start, naive(2026, 1, 23, 9).and_utc());
        assert_eq!(end, Some(naive(2026, 1, 23, 17).and_utc()));
    }

    #[test]
    fn equal_periods_hash_equal() {
        let a = Period::explicit(utc(2026, 1, 23, 9), utc(2026, 1, 23, 17));
        let b = Period::explicit(utc(2026, 1, 23, 9), utc(2026, 1, 23, 17));
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a, Period::Instant(utc(2026, 1, 23, 9)));
    }

    #[test]
    fn period_list_ignores_order() {
        let a = PeriodList::from_dates([utc(2026, 1, 1, 9), utc(2026, 1, 2, 9)]);
        let b = PeriodList::from_dates([utc(2026, 1, 2, 9), utc(2026, 1, 1, 9)]);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn period_list_union_and_difference() {
        let resolver = FixedOffsetResolver::new();
        let a = PeriodList::from_dates([utc(2026, 1, 1, 9), utc(2026, 1, 2, 9)]);
        let b = PeriodList::from_dates([utc(2026, 1, 2, 9), utc(2026, 1, 3, 9)]);

        let union = a.union(&b);
        assert_eq!(union.len(), 3);

        let difference = union.difference(&b, &resolver).unwrap();
        assert_eq!(difference, PeriodList::from_dates([utc(2026, 1, 1, 9)]));
    }

    #[test]
    fn to_period_list_wraps_single_values() {
        let value = Value::DateTime(utc(2026, 1, 1, 9));
        let list = value.to_period_list().unwrap();
        assert_eq!(list.len(), 1);
        assert!(Value::Text("x".to_string()).to_period_list().is_none());
    }
}
