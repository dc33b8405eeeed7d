//! iCalendar RRULE (Recurrence Rule) value type (RFC 5545 §3.3.10, §3.8.5.3).

use std::fmt;
use std::num::NonZeroU32;

use super::{DateTime, UnorderedVec};
use crate::rfc::ical::expand::{ExpansionError, ExpansionResult};

/// Recurrence frequency (RFC 5545 §3.3.10).
///
/// Ordered from finest to coarsest, so `Frequency::Daily < Frequency::Weekly`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Frequency {
    Secondly,
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Secondly => "SECONDLY",
            Self::Minutely => "MINUTELY",
            Self::Hourly => "HOURLY",
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }

    /// Parses a frequency from a string (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "SECONDLY" => Self::Secondly,
            "MINUTELY" => Self::Minutely,
            "HOURLY" => Self::Hourly,
            "DAILY" => Self::Daily,
            "WEEKLY" => Self::Weekly,
            "MONTHLY" => Self::Monthly,
            "YEARLY" => Self::Yearly,
            _ => return None,
        })
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Day of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    /// Returns the two-letter abbreviation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sunday => "SU",
            Self::Monday => "MO",
            Self::Tuesday => "TU",
            Self::Wednesday => "WE",
            Self::Thursday => "TH",
            Self::Friday => "FR",
            Self::Saturday => "SA",
        }
    }

    /// Parses a weekday from a two-letter abbreviation (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "SU" => Self::Sunday,
            "MO" => Self::Monday,
            "TU" => Self::Tuesday,
            "WE" => Self::Wednesday,
            "TH" => Self::Thursday,
            "FR" => Self::Friday,
            "SA" => Self::Saturday,
            _ => return None,
        })
    }

    /// Converts to the `chrono` weekday.
    #[must_use]
    pub const fn to_chrono(self) -> chrono::Weekday {
        match self {
            Self::Sunday => chrono::Weekday::Sun,
            Self::Monday => chrono::Weekday::Mon,
            Self::Tuesday => chrono::Weekday::Tue,
            Self::Wednesday => chrono::Weekday::Wed,
            Self::Thursday => chrono::Weekday::Thu,
            Self::Friday => chrono::Weekday::Fri,
            Self::Saturday => chrono::Weekday::Sat,
        }
    }

    /// Converts from the `chrono` weekday.
    #[must_use]
    pub const fn from_chrono(weekday: chrono::Weekday) -> Self {
        match weekday {
            chrono::Weekday::Sun => Self::Sunday,
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Weekday with optional occurrence number.
///
/// Used in BYDAY rule part. Examples:
/// - `MO` - every Monday
/// - `1MO` - first Monday of the month/year
/// - `-1FR` - last Friday of the month/year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekdayNum {
    /// Optional occurrence number (-53 to 53, excluding 0).
    pub ordinal: Option<i8>,
    /// The day of the week.
    pub weekday: Weekday,
}

impl WeekdayNum {
    /// Creates a weekday occurrence without an ordinal.
    #[must_use]
    pub const fn every(weekday: Weekday) -> Self {
        Self {
            ordinal: None,
            weekday,
        }
    }

    /// Creates a weekday occurrence with an ordinal.
    ///
    /// Returns `None` if the ordinal is 0 or outside `-53..=53`.
    #[must_use]
    pub fn nth(ordinal: i8, weekday: Weekday) -> Option<Self> {
        (ordinal != 0 && (-53..=53).contains(&ordinal)).then_some(Self {
            ordinal: Some(ordinal),
            weekday,
        })
    }
}

impl fmt::Display for WeekdayNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(n) = self.ordinal {
            write!(f, "{n}")?;
        }
        write!(f, "{}", self.weekday)
    }
}

/// Recurrence rule (RFC 5545 §3.3.10, §3.8.5.3).
///
/// `COUNT` and `UNTIL` are mutually exclusive and the interval is always
/// positive; the checked setters keep both invariants. Every `BY*` list is an
/// [`UnorderedVec`], so `BYDAY=MO,TU` and `BYDAY=TU,MO` are the same rule.
/// The setters and the parser drop repeated values, so `BYDAY=MO,MO` is
/// `BYDAY=MO`.
///
/// The rule holds no iteration state. Each call to [`RRule::occurrences`]
/// builds a fresh iterator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RRule {
    /// Recurrence frequency.
    pub freq: Frequency,

    interval: NonZeroU32,
    count: Option<u32>,
    until: Option<DateTime>,

    /// Week start day (default: Monday).
    pub wkst: Weekday,

    /// By-second list (0-60, 60 for leap second).
    pub by_second: UnorderedVec<u8>,

    /// By-minute list (0-59).
    pub by_minute: UnorderedVec<u8>,

    /// By-hour list (0-23).
    pub by_hour: UnorderedVec<u8>,

    /// By-day list with optional occurrence numbers.
    pub by_day: UnorderedVec<WeekdayNum>,

    /// By-monthday list (-31 to 31, excluding 0).
    pub by_monthday: UnorderedVec<i8>,

    /// By-yearday list (-366 to 366, excluding 0).
    pub by_yearday: UnorderedVec<i16>,

    /// By-weekno list (-53 to 53, excluding 0).
    pub by_weekno: UnorderedVec<i8>,

    /// By-month list (1-12).
    pub by_month: UnorderedVec<u8>,

    /// By-setpos list (-366 to 366, excluding 0).
    pub by_setpos: UnorderedVec<i16>,
}

impl RRule {
    /// Creates an unbounded rule with interval 1.
    #[must_use]
    pub fn new(freq: Frequency) -> Self {
        Self {
            freq,
            interval: NonZeroU32::MIN,
            count: None,
            until: None,
            wkst: Weekday::Monday,
            by_second: UnorderedVec::new(),
            by_minute: UnorderedVec::new(),
            by_hour: UnorderedVec::new(),
            by_day: UnorderedVec::new(),
            by_monthday: UnorderedVec::new(),
            by_yearday: UnorderedVec::new(),
            by_weekno: UnorderedVec::new(),
            by_month: UnorderedVec::new(),
            by_setpos: UnorderedVec::new(),
        }
    }

    /// Creates a daily recurrence rule.
    #[must_use]
    pub fn daily() -> Self {
        Self::new(Frequency::Daily)
    }

    /// Creates a weekly recurrence rule.
    #[must_use]
    pub fn weekly() -> Self {
        Self::new(Frequency::Weekly)
    }

    /// Creates a monthly recurrence rule.
    #[must_use]
    pub fn monthly() -> Self {
        Self::new(Frequency::Monthly)
    }

    /// Creates a yearly recurrence rule.
    #[must_use]
    pub fn yearly() -> Self {
        Self::new(Frequency::Yearly)
    }

    /// Returns the interval between recurrence periods.
    #[must_use]
    pub const fn interval(&self) -> u32 {
        self.interval.get()
    }

    /// Returns the occurrence count bound.
    #[must_use]
    pub const fn count(&self) -> Option<u32> {
        self.count
    }

    /// Returns the inclusive end bound.
    #[must_use]
    pub const fn until(&self) -> Option<&DateTime> {
        self.until.as_ref()
    }

    /// Returns whether neither `COUNT` nor `UNTIL` bounds the series.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.count.is_none() && self.until.is_none()
    }

    /// Sets the interval.
    ///
    /// ## Errors
    /// Returns `MalformedRule` if `interval` is zero.
    pub fn with_interval(mut self, interval: u32) -> ExpansionResult<Self> {
        self.interval = NonZeroU32::new(interval).ok_or_else(|| {
            ExpansionError::MalformedRule("INTERVAL must be positive".to_string())
        })?;
        Ok(self)
    }

    /// Bounds the series by occurrence count.
    ///
    /// ## Errors
    /// Returns `MalformedRule` if `count` is zero or `UNTIL` is already set.
    pub fn with_count(mut self, count: u32) -> ExpansionResult<Self> {
        if count == 0 {
            return Err(ExpansionError::MalformedRule(
                "COUNT must be positive".to_string(),
            ));
        }
        if self.until.is_some() {
            return Err(ExpansionError::MalformedRule(
                "COUNT and UNTIL are mutually exclusive".to_string(),
            ));
        }
        self.count = Some(count);
        Ok(self)
    }

    /// Bounds the series by an inclusive end.
    ///
    /// ## Errors
    /// Returns `MalformedRule` if `COUNT` is already set.
    pub fn with_until(mut self, until: DateTime) -> ExpansionResult<Self> {
        if self.count.is_some() {
            return Err(ExpansionError::MalformedRule(
                "COUNT and UNTIL are mutually exclusive".to_string(),
            ));
        }
        self.until = Some(until);
        Ok(self)
    }

    #[must_use]
    pub fn with_by_day(mut self, days: impl IntoIterator<Item = WeekdayNum>) -> Self {
        self.by_day = UnorderedVec::distinct(days);
        self
    }

    #[must_use]
    pub fn with_by_month(mut self, months: impl IntoIterator<Item = u8>) -> Self {
        self.by_month = UnorderedVec::distinct(months);
        self
    }

    #[must_use]
    pub fn with_by_month_day(mut self, days: impl IntoIterator<Item = i8>) -> Self {
        self.by_monthday = UnorderedVec::distinct(days);
        self
    }

    #[must_use]
    pub fn with_by_set_pos(mut self, positions: impl IntoIterator<Item = i16>) -> Self {
        self.by_setpos = UnorderedVec::distinct(positions);
        self
    }

    #[must_use]
    pub const fn with_wkst(mut self, wkst: Weekday) -> Self {
        self.wkst = wkst;
        self
    }
}

/// Writes `NAME=v1,v2` for a non-empty list.
fn push_list<T: fmt::Display>(parts: &mut Vec<String>, name: &str, values: &[T]) {
    if values.is_empty() {
        return;
    }
    let joined: Vec<_> = values.iter().map(ToString::to_string).collect();
    parts.push(format!("{name}={}", joined.join(",")));
}

impl fmt::Display for RRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = vec![format!("FREQ={}", self.freq)];

        if self.interval.get() != 1 {
            parts.push(format!("INTERVAL={}", self.interval));
        }

        if let Some(ref until) = self.until {
            parts.push(format!("UNTIL={until}"));
        }

        if let Some(count) = self.count {
            parts.push(format!("COUNT={count}"));
        }

        if self.wkst != Weekday::Monday {
            parts.push(format!("WKST={}", self.wkst));
        }

        push_list(&mut parts, "BYSECOND", &self.by_second);
        push_list(&mut parts, "BYMINUTE", &self.by_minute);
        push_list(&mut parts, "BYHOUR", &self.by_hour);
        push_list(&mut parts, "BYDAY", &self.by_day);
        push_list(&mut parts, "BYMONTHDAY", &self.by_monthday);
        push_list(&mut parts, "BYYEARDAY", &self.by_yearday);
        push_list(&mut parts, "BYWEEKNO", &self.by_weekno);
        push_list(&mut parts, "BYMONTH", &self.by_month);
        push_list(&mut parts, "BYSETPOS", &self.by_setpos);

        write!(f, "{}", parts.join(";"))
    }
}

#[cfg(test)]
mod tests {
    use std::hash::{DefaultHasher, Hash, Hasher};

    use super::*;

    fn hash_of(rule: &RRule) -> u64 {
        let mut hasher = DefaultHasher::new();
        rule.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn rrule_display_basic() {
        let rrule = RRule::daily().with_count(10).unwrap();
        assert_eq!(rrule.to_string(), "FREQ=DAILY;COUNT=10");
    }

    #[test]
    fn rrule_display_weekly_byday() {
        let rrule = RRule::weekly().with_by_day([
            WeekdayNum::every(Weekday::Monday),
            WeekdayNum::every(Weekday::Wednesday),
            WeekdayNum::every(Weekday::Friday),
        ]);
        assert_eq!(rrule.to_string(), "FREQ=WEEKLY;BYDAY=MO,WE,FR");
    }

    #[test]
    fn rrule_display_monthly_nth() {
        let rrule = RRule::monthly().with_by_day(WeekdayNum::nth(-1, Weekday::Friday));
        assert_eq!(rrule.to_string(), "FREQ=MONTHLY;BYDAY=-1FR");
    }

    #[test]
    fn rrule_display_with_interval_and_wkst() {
        let rrule = RRule::weekly()
            .with_interval(2)
            .unwrap()
            .with_wkst(Weekday::Sunday);
        assert_eq!(rrule.to_string(), "FREQ=WEEKLY;INTERVAL=2;WKST=SU");
    }

    #[test]
    fn zero_interval_is_malformed() {
        let err = RRule::daily().with_interval(0).unwrap_err();
        assert!(matches!(err, ExpansionError::MalformedRule(_)));
    }

    #[test]
    fn count_and_until_are_exclusive() {
        let until = DateTime::date(chrono::NaiveDate::from_ymd_opt(2026, 1, 31).unwrap());
        let err = RRule::daily()
            .with_count(3)
            .unwrap()
            .with_until(until.clone())
            .unwrap_err();
        assert!(matches!(err, ExpansionError::MalformedRule(_)));

        let err = RRule::daily()
            .with_until(until)
            .unwrap()
            .with_count(3)
            .unwrap_err();
        assert!(matches!(err, ExpansionError::MalformedRule(_)));
    }

    #[test]
    fn zero_count_is_malformed() {
        assert!(RRule::daily().with_count(0).is_err());
    }

    #[test]
    fn by_day_order_is_irrelevant() {
        let a = RRule::weekly().with_by_day([
            WeekdayNum::every(Weekday::Monday),
            WeekdayNum::every(Weekday::Tuesday),
        ]);
        let b = RRule::weekly().with_by_day([
            WeekdayNum::every(Weekday::Tuesday),
            WeekdayNum::every(Weekday::Monday),
        ]);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn identical_rules_hash_equal() {
        let a = RRule::daily().with_count(5).unwrap();
        let b = RRule::daily().with_count(5).unwrap();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a, RRule::daily().with_count(6).unwrap());
    }

    #[test]
    fn nth_rejects_zero_ordinal() {
        assert!(WeekdayNum::nth(0, Weekday::Monday).is_none());
        assert!(WeekdayNum::nth(54, Weekday::Monday).is_none());
        assert!(WeekdayNum::nth(-53, Weekday::Monday).is_some());
    }

    #[test]
    fn weekday_parse() {
        assert_eq!(Weekday::parse("MO"), Some(Weekday::Monday));
        assert_eq!(Weekday::parse("fr"), Some(Weekday::Friday));
        assert_eq!(Weekday::parse("XX"), None);
    }

    #[test]
    fn weekday_chrono_round_trip() {
        for day in [Weekday::Sunday, Weekday::Wednesday, Weekday::Saturday] {
            assert_eq!(Weekday::from_chrono(day.to_chrono()), day);
        }
    }

    #[test]
    fn frequency_parse_and_order() {
        assert_eq!(Frequency::parse("DAILY"), Some(Frequency::Daily));
        assert_eq!(Frequency::parse("weekly"), Some(Frequency::Weekly));
        assert_eq!(Frequency::parse("INVALID"), None);
        assert!(Frequency::Hourly < Frequency::Daily);
        assert!(Frequency::Yearly > Frequency::Monthly);
    }

    #[test]
    fn repeated_by_values_collapse() {
        let monday = WeekdayNum::every(Weekday::Monday);
        let twice = RRule::weekly().with_by_day([monday, monday]);
        let once = RRule::weekly().with_by_day([monday]);
        assert_eq!(twice, once);
        assert_eq!(hash_of(&twice), hash_of(&once));
        assert_eq!(twice.to_string(), "FREQ=WEEKLY;BYDAY=MO");

        let months = RRule::yearly().with_by_month([3, 1, 3]);
        assert_eq!(months.by_month.as_slice(), &[3, 1]);
    }
}
