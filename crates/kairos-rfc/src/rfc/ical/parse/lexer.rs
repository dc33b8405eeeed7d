//! Content line lexer for iCalendar (RFC 5545 §3.1).
//!
//! Handles line unfolding and tokenization of content lines.

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::rfc::ical::core::{ContentLine, Parameter};

/// One unfolded content line and the physical line it started on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    /// 1-based physical line number of the first segment.
    pub number: usize,
    pub text: String,
}

/// Splits input into unfolded content lines.
///
/// Accepts CRLF and bare LF endings. A line starting with SPACE or HTAB
/// continues the previous one; RFC 5545 §3.1 unfolding drops the line break
/// and that single whitespace character. Blank lines are skipped.
#[must_use]
pub fn logical_lines(input: &str) -> Vec<LogicalLine> {
    let mut lines: Vec<LogicalLine> = Vec::new();

    for (index, raw) in input.split('\n').enumerate() {
        let segment = raw.strip_suffix('\r').unwrap_or(raw);
        if segment.is_empty() {
            continue;
        }
        match (segment.strip_prefix([' ', '\t']), lines.last_mut()) {
            (Some(continuation), Some(previous)) => previous.text.push_str(continuation),
            (Some(continuation), None) => lines.push(LogicalLine {
                number: index + 1,
                text: continuation.to_string(),
            }),
            (None, _) => lines.push(LogicalLine {
                number: index + 1,
                text: segment.to_string(),
            }),
        }
    }

    lines
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-'
}

/// Parses a single unfolded content line.
///
/// Format: `name *(";" param) ":" value`. Names are upper-cased.
///
/// ## Errors
/// Returns an error if the name or a parameter is malformed, a quoted
/// parameter value is unterminated, or the `:` separator is missing.
pub fn parse_content_line(line: &str, line_num: usize) -> ParseResult<ContentLine> {
    let bytes = line.as_bytes();
    let name_end = bytes
        .iter()
        .position(|&b| b == b';' || b == b':')
        .ok_or_else(|| ParseError::new(ParseErrorKind::MissingColon, line_num, line.len()))?;

    if name_end == 0 {
        return Err(ParseError::new(
            ParseErrorKind::MissingPropertyName,
            line_num,
            1,
        ));
    }
    if let Some(bad) = bytes[..name_end].iter().position(|&b| !is_name_char(b)) {
        return Err(ParseError::new(
            ParseErrorKind::InvalidPropertyName,
            line_num,
            bad + 1,
        ));
    }

    let mut pos = name_end;
    let mut params = Vec::new();
    while bytes.get(pos) == Some(&b';') {
        let (param, next) = parse_parameter(line, pos + 1, line_num)?;
        params.push(param);
        pos = next;
    }

    if bytes.get(pos) != Some(&b':') {
        return Err(ParseError::new(ParseErrorKind::MissingColon, line_num, pos + 1));
    }

    Ok(ContentLine {
        name: line[..name_end].to_ascii_uppercase(),
        params,
        raw_value: line[pos + 1..].to_string(),
    })
}

/// Parses `NAME=value *("," value)` starting at `start`.
///
/// Returns the parameter and the offset of the `;` or `:` that ends it.
fn parse_parameter(line: &str, start: usize, line_num: usize) -> ParseResult<(Parameter, usize)> {
    let bytes = line.as_bytes();
    let eq = start
        + bytes[start..]
            .iter()
            .position(|&b| !is_name_char(b))
            .unwrap_or(bytes.len() - start);

    if eq == start || bytes.get(eq) != Some(&b'=') {
        return Err(ParseError::new(
            ParseErrorKind::InvalidParameter,
            line_num,
            eq + 1,
        ));
    }
    let name = line[start..eq].to_ascii_uppercase();

    let mut values = Vec::new();
    let mut pos = eq + 1;
    loop {
        let (value, next) = if bytes.get(pos) == Some(&b'"') {
            let close = line[pos + 1..].find('"').ok_or_else(|| {
                ParseError::new(ParseErrorKind::UnclosedQuote, line_num, pos + 1)
            })?;
            let end = pos + 1 + close;
            (decode_caret(&line[pos + 1..end]), end + 1)
        } else {
            let end = pos
                + line[pos..]
                    .find([',', ';', ':'])
                    .unwrap_or(line.len() - pos);
            (line[pos..end].to_string(), end)
        };
        values.push(value);

        match bytes.get(next) {
            Some(b',') => pos = next + 1,
            Some(b';' | b':') => return Ok((Parameter::with_values(name, values), next)),
            Some(&other) => {
                return Err(
                    ParseError::new(ParseErrorKind::InvalidParameter, line_num, next + 1)
                        .with_context(format!("unexpected character '{}'", char::from(other))),
                );
            }
            None => {
                return Err(ParseError::new(
                    ParseErrorKind::MissingColon,
                    line_num,
                    line.len(),
                ));
            }
        }
    }
}

/// Decodes RFC 6868 caret escapes in a quoted parameter value.
fn decode_caret(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '^' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('^') => out.push('^'),
            Some('n') => out.push('\n'),
            Some('\'') => out.push('"'),
            _ => {
                out.push('^');
                continue;
            }
        }
        chars.next();
    }
    out
}
