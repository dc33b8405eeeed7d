//! Value type parsers for iCalendar (RFC 5545 §3.3).

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::rfc::ical::core::{
    DateTime, Duration, Frequency, Period, RRule, UnorderedVec, UtcOffset, Weekday, WeekdayNum,
};
use crate::rfc::ical::expand::ExpansionError;

fn digits<T: std::str::FromStr>(s: &str, range: std::ops::Range<usize>) -> Option<T> {
    let part = s.get(range)?;
    if !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// Parses a DATE value (RFC 5545 §3.3.4).
///
/// Format: YYYYMMDD (e.g., "19970714")
///
/// ## Errors
/// Returns an error if the string is not a valid 8-digit calendar date.
pub fn parse_date(s: &str, line: usize, col: usize) -> ParseResult<NaiveDate> {
    let invalid = || ParseError::new(ParseErrorKind::InvalidDate, line, col).with_context(s);
    if s.len() != 8 {
        return Err(invalid());
    }
    let year = digits(s, 0..4).ok_or_else(invalid)?;
    let month = digits(s, 4..6).ok_or_else(invalid)?;
    let day = digits(s, 6..8).ok_or_else(invalid)?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// Parses a TIME value (RFC 5545 §3.3.12), returning whether it was UTC.
fn parse_time(s: &str, line: usize, col: usize) -> ParseResult<(NaiveTime, bool)> {
    let invalid = || ParseError::new(ParseErrorKind::InvalidTime, line, col).with_context(s);
    let (digits_part, is_utc) = match s.strip_suffix('Z') {
        Some(stripped) => (stripped, true),
        None => (s, false),
    };
    if digits_part.len() != 6 {
        return Err(invalid());
    }
    let hour = digits(digits_part, 0..2).ok_or_else(invalid)?;
    let minute = digits(digits_part, 2..4).ok_or_else(invalid)?;
    // Leap second 60 is clamped to 59; chrono has no representation for it.
    let second: u32 = digits(digits_part, 4..6).ok_or_else(invalid)?;
    if second > 60 {
        return Err(invalid());
    }
    let time = NaiveTime::from_hms_opt(hour, minute, second.min(59)).ok_or_else(invalid)?;
    Ok((time, is_utc))
}

/// Parses a DATE-TIME value (RFC 5545 §3.3.5).
///
/// A trailing `Z` makes the value UTC (any `tzid` is then ignored); a
/// `tzid` makes it zoned; otherwise it is floating.
///
/// ## Errors
/// Returns an error if the string is not `YYYYMMDD"T"HHMMSS[Z]`.
pub fn parse_datetime(
    s: &str,
    tzid: Option<&str>,
    line: usize,
    col: usize,
) -> ParseResult<DateTime> {
    let (date_str, time_str) = s.split_once('T').ok_or_else(|| {
        ParseError::new(ParseErrorKind::InvalidDateTime, line, col).with_context(s)
    })?;
    let date = parse_date(date_str, line, col)?;
    let (time, is_utc) = parse_time(time_str, line, col + date_str.len() + 1)?;
    let local = NaiveDateTime::new(date, time);

    Ok(match (is_utc, tzid) {
        (true, _) => DateTime::utc(local),
        (false, Some(tzid)) => DateTime::zoned(local, tzid),
        (false, None) => DateTime::floating(local),
    })
}

/// Parses either a DATE or a DATE-TIME, choosing by the presence of `T`.
///
/// ## Errors
/// Returns an error if the value is neither.
pub fn parse_date_or_datetime(
    s: &str,
    tzid: Option<&str>,
    line: usize,
    col: usize,
) -> ParseResult<DateTime> {
    if s.contains('T') {
        parse_datetime(s, tzid, line, col)
    } else {
        parse_date(s, line, col).map(DateTime::date)
    }
}

/// Parses a UTC-OFFSET value (RFC 5545 §3.3.14).
///
/// Format: (+|-)HHMM[SS]. Seconds are kept, so `-001730` is -1050 seconds.
///
/// ## Errors
/// Returns an error if the string is not a valid UTC offset.
pub fn parse_utc_offset(s: &str, line: usize, col: usize) -> ParseResult<UtcOffset> {
    let invalid = || ParseError::new(ParseErrorKind::InvalidUtcOffset, line, col).with_context(s);
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'+') => (false, &s[1..]),
        Some(b'-') => (true, &s[1..]),
        _ => return Err(invalid()),
    };
    if rest.len() != 4 && rest.len() != 6 {
        return Err(invalid());
    }
    let hours = digits(rest, 0..2).ok_or_else(invalid)?;
    let minutes = digits(rest, 2..4).ok_or_else(invalid)?;
    let seconds = if rest.len() == 6 {
        digits(rest, 4..6).ok_or_else(invalid)?
    } else {
        0
    };
    UtcOffset::from_hms(negative, hours, minutes, seconds).ok_or_else(invalid)
}

/// Parses a DURATION value (RFC 5545 §3.3.6).
///
/// Format: `[+|-]P(nW | [nD][T[nH][nM][nS]])`
///
/// ## Errors
/// Returns an error if the string is not a valid duration.
pub fn parse_duration(s: &str, line: usize, col: usize) -> ParseResult<Duration> {
    let invalid = || ParseError::new(ParseErrorKind::InvalidDuration, line, col).with_context(s);

    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let body = rest.strip_prefix('P').ok_or_else(invalid)?;
    if body.is_empty() {
        return Err(invalid());
    }

    let mut duration = Duration::zero();
    let mut in_time = false;
    let mut number = String::new();
    let mut seen_unit = false;

    for c in body.chars() {
        if c.is_ascii_digit() {
            number.push(c);
            continue;
        }
        if c == 'T' {
            if in_time || !number.is_empty() {
                return Err(invalid());
            }
            in_time = true;
            continue;
        }
        let value: u32 = number.parse().map_err(|_ignored| invalid())?;
        number.clear();
        seen_unit = true;
        match (c, in_time) {
            ('W', false) => duration.weeks = value,
            ('D', false) => duration.days = value,
            ('H', true) => duration.hours = value,
            ('M', true) => duration.minutes = value,
            ('S', true) => duration.seconds = value,
            _ => return Err(invalid()),
        }
    }

    if !number.is_empty() || !seen_unit {
        return Err(invalid());
    }
    Ok(if negative { duration.negate() } else { duration })
}

/// Parses a PERIOD value (RFC 5545 §3.3.9).
///
/// Format: start"/"end or start"/"duration
///
/// ## Errors
/// Returns an error if the string is not a valid period.
pub fn parse_period(s: &str, tzid: Option<&str>, line: usize, col: usize) -> ParseResult<Period> {
    let (start_str, end_str) = s
        .split_once('/')
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidPeriod, line, col).with_context(s))?;
    let start = parse_datetime(start_str, tzid, line, col)?;
    let end_col = col + start_str.len() + 1;

    if end_str.starts_with(['P', '+', '-']) {
        let duration = parse_duration(end_str, line, end_col)?;
        Ok(Period::from_duration(start, duration))
    } else {
        let end = parse_datetime(end_str, tzid, line, end_col)?;
        Ok(Period::explicit(start, end))
    }
}

/// Parses a RECUR value (RFC 5545 §3.3.10).
///
/// `FREQ` is required; unknown rule parts are ignored.
///
/// ## Errors
/// Returns `UntilCountConflict` when both bounds are present, and
/// `InvalidRRule` (or a more specific kind) for any malformed part.
pub fn parse_rrule(s: &str, line: usize, col: usize) -> ParseResult<RRule> {
    let invalid = |context: &str| {
        ParseError::new(ParseErrorKind::InvalidRRule, line, col).with_context(context)
    };

    let parts: Vec<(String, &str)> = s
        .split(';')
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.split_once('=')
                .map(|(key, value)| (key.to_ascii_uppercase(), value))
                .ok_or_else(|| invalid(part))
        })
        .collect::<ParseResult<_>>()?;

    let freq = parts
        .iter()
        .find(|(key, _)| key == "FREQ")
        .ok_or_else(|| invalid("missing FREQ"))
        .and_then(|(_, value)| {
            Frequency::parse(value).ok_or_else(|| {
                ParseError::new(ParseErrorKind::InvalidFrequency, line, col).with_context(*value)
            })
        })?;

    let checked = |result: Result<RRule, ExpansionError>, key: &str| {
        result.map_err(|err| match err {
            ExpansionError::MalformedRule(msg) if msg.contains("mutually exclusive") => {
                ParseError::new(ParseErrorKind::UntilCountConflict, line, col)
            }
            other => invalid(&format!("{key}: {other}")),
        })
    };

    let mut rule = RRule::new(freq);
    for (key, value) in parts {
        rule = match key.as_str() {
            "FREQ" => rule,
            "INTERVAL" => {
                let interval = value.parse().map_err(|_ignored| invalid(value))?;
                checked(rule.with_interval(interval), &key)?
            }
            "COUNT" => {
                let count = value.parse().map_err(|_ignored| invalid(value))?;
                checked(rule.with_count(count), &key)?
            }
            "UNTIL" => {
                let until = parse_date_or_datetime(value, None, line, col)?;
                checked(rule.with_until(until), &key)?
            }
            "WKST" => rule.with_wkst(Weekday::parse(value).ok_or_else(|| {
                ParseError::new(ParseErrorKind::InvalidWeekday, line, col).with_context(value)
            })?),
            "BYSECOND" => set(rule, |r| &mut r.by_second, value, line, col)?,
            "BYMINUTE" => set(rule, |r| &mut r.by_minute, value, line, col)?,
            "BYHOUR" => set(rule, |r| &mut r.by_hour, value, line, col)?,
            "BYMONTHDAY" => set(rule, |r| &mut r.by_monthday, value, line, col)?,
            "BYYEARDAY" => set(rule, |r| &mut r.by_yearday, value, line, col)?,
            "BYWEEKNO" => set(rule, |r| &mut r.by_weekno, value, line, col)?,
            "BYMONTH" => set(rule, |r| &mut r.by_month, value, line, col)?,
            "BYSETPOS" => set(rule, |r| &mut r.by_setpos, value, line, col)?,
            "BYDAY" => {
                let days = value
                    .split(',')
                    .map(|day| parse_weekday_num(day.trim(), line, col))
                    .collect::<ParseResult<Vec<_>>>()?;
                rule.with_by_day(days)
            }
            _ => {
                tracing::trace!(part = %key, "Ignoring unknown RRULE part");
                rule
            }
        };
    }

    Ok(rule)
}

/// Fills one numeric `BY*` list of `rule` from a comma-separated value.
fn set<T: std::str::FromStr + PartialEq>(
    mut rule: RRule,
    field: impl FnOnce(&mut RRule) -> &mut UnorderedVec<T>,
    value: &str,
    line: usize,
    col: usize,
) -> ParseResult<RRule> {
    let values = value
        .split(',')
        .map(|v| {
            v.trim().parse().map_err(|_ignored| {
                ParseError::new(ParseErrorKind::InvalidRRule, line, col).with_context(value)
            })
        })
        .collect::<ParseResult<Vec<T>>>()?;
    *field(&mut rule) = UnorderedVec::distinct(values);
    Ok(rule)
}

/// Parses a single weekday with optional ordinal (e.g., "MO", "1MO", "-1FR").
fn parse_weekday_num(s: &str, line: usize, col: usize) -> ParseResult<WeekdayNum> {
    let invalid = || ParseError::new(ParseErrorKind::InvalidWeekday, line, col).with_context(s);
    let split = s.len().checked_sub(2).ok_or_else(invalid)?;
    let (ordinal_str, weekday_str) = (s.get(..split).ok_or_else(invalid)?, &s[split..]);
    let weekday = Weekday::parse(weekday_str).ok_or_else(invalid)?;

    if ordinal_str.is_empty() {
        return Ok(WeekdayNum::every(weekday));
    }
    let ordinal = ordinal_str.parse().map_err(|_ignored| invalid())?;
    WeekdayNum::nth(ordinal, weekday).ok_or_else(invalid)
}

/// Unescapes text values (RFC 5545 §3.3.11).
///
/// Escape sequences: \\ \, \; \n \N
#[must_use]
pub fn unescape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => result.push('\n'),
            Some(escaped @ (',' | ';' | '\\')) => result.push(escaped),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }

    result
}

/// Splits a multi-valued text on unescaped commas, unescaping each part.
#[must_use]
pub fn split_text_list(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            ',' => {
                parts.push(unescape_text(&s[start..i]));
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(unescape_text(&s[start..]));
    parts
}

/// Parses a BOOLEAN value (RFC 5545 §3.3.2).
///
/// ## Errors
/// Returns an error if the string is not "TRUE" or "FALSE".
pub fn parse_boolean(s: &str, line: usize, col: usize) -> ParseResult<bool> {
    if s.eq_ignore_ascii_case("TRUE") {
        Ok(true)
    } else if s.eq_ignore_ascii_case("FALSE") {
        Ok(false)
    } else {
        Err(ParseError::new(ParseErrorKind::InvalidBoolean, line, col).with_context(s))
    }
}

/// Parses an INTEGER value (RFC 5545 §3.3.8).
///
/// ## Errors
/// Returns an error if the string is not a valid integer.
pub fn parse_integer(s: &str, line: usize, col: usize) -> ParseResult<i32> {
    s.trim_start_matches('+').parse().map_err(|_ignored| {
        ParseError::new(ParseErrorKind::InvalidInteger, line, col).with_context(s)
    })
}
