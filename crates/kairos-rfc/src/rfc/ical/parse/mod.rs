//! iCalendar text parsing (RFC 5545).
//!
//! - Lexer: unfolding and content line tokenization
//! - Values: typed value parsers (DATE, DATE-TIME, DURATION, RECUR, ...)
//! - Parser: whole documents into a [`Component`](crate::rfc::ical::core::Component) tree

mod error;
mod lexer;
mod parser;
mod values;

pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use lexer::{LogicalLine, logical_lines, parse_content_line};
pub use parser::parse;
pub use values::{
    parse_boolean, parse_date, parse_date_or_datetime, parse_datetime, parse_duration,
    parse_integer, parse_period, parse_rrule, parse_utc_offset, split_text_list, unescape_text,
};
