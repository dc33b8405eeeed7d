//! iCalendar document parser (RFC 5545).
//!
//! Parses a complete iCalendar document into a [`Component`] tree whose
//! property values are typed.

use base64::{Engine, engine::general_purpose::STANDARD};

use super::error::{ParseError, ParseErrorKind, ParseResult};
use super::lexer::{LogicalLine, logical_lines, parse_content_line};
use super::values::{
    parse_boolean, parse_date, parse_date_or_datetime, parse_datetime, parse_duration,
    parse_integer, parse_period, parse_rrule, parse_utc_offset, split_text_list, unescape_text,
};
use crate::rfc::ical::core::{Component, ComponentKind, ContentLine, DateTime, Property, Value};

/// Parses an iCalendar document from a string.
///
/// The result is the root component, normally a VCALENDAR.
///
/// ## Errors
/// Returns an error if the input is not valid iCalendar: a malformed content
/// line, a value that does not match its type, or unbalanced BEGIN/END.
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
pub fn parse(input: &str) -> ParseResult<Component> {
    let lines = logical_lines(input);
    tracing::debug!(count = lines.len(), "Unfolded content lines");

    let mut stack: Vec<Component> = Vec::new();
    let mut root = None;
    let mut last_line = 0;

    for LogicalLine { number, text } in lines {
        last_line = number;
        let line = parse_content_line(&text, number)?;

        if root.is_some() {
            return Err(ParseError::new(ParseErrorKind::InvalidNesting, number, 1)
                .with_context("content after the root component"));
        }

        match line.name.as_str() {
            "BEGIN" => {
                let name = line.raw_value.to_ascii_uppercase();
                let component = match ComponentKind::parse(&name) {
                    ComponentKind::Other => Component::custom(name),
                    kind => Component::new(kind),
                };
                stack.push(component);
            }
            "END" => {
                let name = line.raw_value.to_ascii_uppercase();
                let component = stack.pop().ok_or_else(|| {
                    ParseError::new(ParseErrorKind::MissingBegin, number, 1)
                        .with_context(format!("END:{name} without BEGIN"))
                })?;
                if component.name != name {
                    return Err(
                        ParseError::new(ParseErrorKind::MismatchedComponent, number, 1)
                            .with_context(format!(
                                "expected END:{}, got END:{name}",
                                component.name
                            )),
                    );
                }
                match stack.last_mut() {
                    Some(parent) => parent.add_child(component),
                    None => root = Some(component),
                }
            }
            _ => {
                let column = text.len() - line.raw_value.len() + 1;
                let current = stack.last_mut().ok_or_else(|| {
                    ParseError::new(ParseErrorKind::MissingBegin, number, 1)
                        .with_context(format!("{} outside any component", line.name))
                })?;
                current.add_property(parse_property(line, number, column)?);
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::new(ParseErrorKind::MissingEnd, last_line, 1)
            .with_context(format!("missing END:{}", open.name)));
    }

    let root = root.ok_or_else(|| ParseError::new(ParseErrorKind::MissingBegin, 1, 1))?;
    tracing::debug!(
        kind = %root.kind,
        children = root.children.len(),
        "iCalendar document parsed"
    );
    Ok(root)
}

/// Parses a property from a content line, resolving the value type.
fn parse_property(line: ContentLine, number: usize, column: usize) -> ParseResult<Property> {
    let value_type = ValueType::of(&line);
    let value = parse_value(&line, value_type, number, column)?;

    Ok(Property {
        name: line.name,
        params: line.params.into(),
        value,
        raw_value: line.raw_value,
    })
}

/// Value types this parser distinguishes (RFC 5545 §3.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueType {
    Binary,
    Boolean,
    /// DATE or DATE-TIME, told apart per value.
    Temporal,
    /// A list of DATE or DATE-TIME values.
    TemporalList,
    Duration,
    Integer,
    PeriodList,
    Recur,
    Text,
    TextList,
    Uri,
    UtcOffset,
    Unknown,
}

impl ValueType {
    /// Resolves the type from the VALUE parameter, or the property's default.
    fn of(line: &ContentLine) -> Self {
        let is_list = matches!(line.name.as_str(), "RDATE" | "EXDATE");

        if let Some(explicit) = line.value_type() {
            return match explicit.to_ascii_uppercase().as_str() {
                "BINARY" => Self::Binary,
                "BOOLEAN" => Self::Boolean,
                "DATE" | "DATE-TIME" if is_list => Self::TemporalList,
                "DATE" | "DATE-TIME" => Self::Temporal,
                "DURATION" => Self::Duration,
                "INTEGER" => Self::Integer,
                "PERIOD" => Self::PeriodList,
                "RECUR" => Self::Recur,
                "TEXT" => Self::Text,
                "URI" | "CAL-ADDRESS" => Self::Uri,
                "UTC-OFFSET" => Self::UtcOffset,
                _ => Self::Unknown,
            };
        }

        match line.name.as_str() {
            "DTSTART" | "DTEND" | "DTSTAMP" | "CREATED" | "LAST-MODIFIED" | "COMPLETED"
            | "DUE" | "RECURRENCE-ID" => Self::Temporal,
            "RDATE" | "EXDATE" => Self::TemporalList,
            "DURATION" => Self::Duration,
            "PERCENT-COMPLETE" | "PRIORITY" | "REPEAT" | "SEQUENCE" => Self::Integer,
            "RRULE" | "EXRULE" => Self::Recur,
            "TZOFFSETFROM" | "TZOFFSETTO" => Self::UtcOffset,
            "URL" | "TZURL" | "ATTENDEE" | "ORGANIZER" | "ATTACH" => Self::Uri,
            "FREEBUSY" => Self::PeriodList,
            "CATEGORIES" | "RESOURCES" => Self::TextList,
            "GEO" => Self::Unknown,
            _ => Self::Text,
        }
    }
}

/// Parses a raw value string into a typed [`Value`].
fn parse_value(
    line: &ContentLine,
    value_type: ValueType,
    number: usize,
    column: usize,
) -> ParseResult<Value> {
    let raw = line.raw_value.as_str();
    let tzid = line.tzid();
    let is_date = line
        .value_type()
        .is_some_and(|v| v.eq_ignore_ascii_case("DATE"));

    let temporal = |s: &str| {
        if is_date {
            parse_date(s, number, column).map(DateTime::date)
        } else if line.value_type().is_some() {
            parse_datetime(s, tzid, number, column)
        } else {
            parse_date_or_datetime(s, tzid, number, column)
        }
    };

    Ok(match value_type {
        ValueType::Text => Value::Text(unescape_text(raw)),
        ValueType::TextList => Value::TextList(split_text_list(raw)),
        ValueType::Temporal => Value::DateTime(temporal(raw)?),
        ValueType::TemporalList => Value::DateTimeList(
            raw.split(',')
                .map(|s| temporal(s.trim()))
                .collect::<ParseResult<_>>()?,
        ),
        ValueType::PeriodList => Value::PeriodList(
            raw.split(',')
                .map(|s| parse_period(s.trim(), tzid, number, column))
                .collect::<ParseResult<_>>()?,
        ),
        ValueType::Duration => Value::Duration(parse_duration(raw, number, column)?),
        ValueType::Integer => Value::Integer(parse_integer(raw, number, column)?),
        ValueType::Boolean => Value::Boolean(parse_boolean(raw, number, column)?),
        ValueType::Recur => Value::Recur(Box::new(parse_rrule(raw, number, column)?)),
        ValueType::UtcOffset => Value::UtcOffset(parse_utc_offset(raw, number, column)?),
        ValueType::Uri => Value::Uri(raw.to_string()),
        ValueType::Binary => Value::Binary(STANDARD.decode(raw).map_err(|e| {
            ParseError::new(ParseErrorKind::InvalidValue, number, column)
                .with_context(format!("invalid Base64 encoding: {e}"))
        })?),
        ValueType::Unknown => Value::Unknown(raw.to_string()),
    })
}
