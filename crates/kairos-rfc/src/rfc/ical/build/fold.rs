//! Content line folding for iCalendar (RFC 5545 §3.1).

/// Maximum line length in octets, not counting CRLF.
const MAX_LINE_OCTETS: usize = 75;

/// Folds a content line at 75 octets and terminates it with CRLF.
///
/// Continuation segments start with a single space, which counts towards
/// their length. Breaks only fall on UTF-8 character boundaries.
#[must_use]
pub fn fold_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3 + 2);
    let mut used = 0;

    for c in line.chars() {
        let width = c.len_utf8();
        if used + width > MAX_LINE_OCTETS {
            out.push_str("\r\n ");
            used = 1;
        }
        out.push(c);
        used += width;
    }

    out.push_str("\r\n");
    out
}
