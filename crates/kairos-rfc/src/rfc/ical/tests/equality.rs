//! Structural equality of parsed calendars.
//!
//! Collections compare as multisets, `DTSTAMP` is ignored, and date-times
//! compare by form and wall clock rather than by instant.

use std::hash::{DefaultHasher, Hash, Hasher};

use chrono::{Days, NaiveDate};

use crate::rfc::ical::core::{DateTime, NullableOrdering};
use crate::rfc::ical::expand::IanaResolver;
use crate::rfc::ical::model::{Calendar, from_ical, to_ical};

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn calendar(body: &str) -> Calendar {
    let input = format!(
        "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Test//EN\r\n{body}END:VCALENDAR\r\n"
    );
    from_ical(&input).unwrap()
}

fn daily_event(stamp: &str, exdates: &[String]) -> Calendar {
    let exdate = if exdates.is_empty() {
        String::new()
    } else {
        format!("EXDATE:{}\r\n", exdates.join(","))
    };
    calendar(&format!(
        "BEGIN:VEVENT\r\nUID:daily@example.com\r\nDTSTAMP:{stamp}\r\n\
DTSTART:20260105T090000Z\r\nDURATION:PT1H\r\nRRULE:FREQ=DAILY;COUNT=60\r\n{exdate}END:VEVENT\r\n"
    ))
}

fn exception_dates(count: u64) -> Vec<String> {
    let first = NaiveDate::from_ymd_opt(2026, 1, 6).unwrap();
    (0..count)
        .map(|i| {
            let day = first.checked_add_days(Days::new(i)).unwrap();
            format!("{}T090000Z", day.format("%Y%m%d"))
        })
        .collect()
}

#[test_log::test]
fn permuted_exception_dates_are_equal() {
    let dates = exception_dates(38);
    let permuted: Vec<String> = (0..dates.len())
        .map(|i| dates[(i * 7) % dates.len()].clone())
        .collect();
    assert_ne!(dates, permuted);

    let a = daily_event("20260101T000000Z", &dates);
    let b = daily_event("20260101T000000Z", &permuted);

    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
}

#[test]
fn extra_exception_date_breaks_equality() {
    let dates = exception_dates(3);
    let a = daily_event("20260101T000000Z", &dates[..2]);
    let b = daily_event("20260101T000000Z", &dates);
    assert_ne!(a, b);
}

#[test]
fn dt_stamp_difference_is_ignored() {
    let dates = exception_dates(2);
    let a = daily_event("20260101T000000Z", &dates);
    let b = daily_event("20260301T120000Z", &dates);
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
}

#[test]
fn second_precision_offsets_survive() {
    let cal = calendar(
        "BEGIN:VTIMEZONE\r\nTZID:Test/Amsterdam-1900\r\nBEGIN:STANDARD\r\n\
DTSTART:18350101T000000\r\nTZOFFSETFROM:+001932\r\nTZOFFSETTO:-001730\r\nEND:STANDARD\r\n\
END:VTIMEZONE\r\n",
    );
    let observance = &cal.timezones[0].observances[0];
    assert_eq!(observance.offset_to.as_seconds(), -1050);
    assert_eq!(observance.offset_from.as_seconds(), 1172);

    let written = to_ical(&cal);
    assert!(written.contains("TZOFFSETTO:-001730\r\n"));
    assert!(written.contains("TZOFFSETFROM:+001932\r\n"));
    assert_eq!(from_ical(&written).unwrap(), cal);
}

#[test]
fn zoned_start_is_written_with_tzid() {
    let cal = calendar(
        "BEGIN:VEVENT\r\nUID:z@example.com\r\nDTSTAMP:19970701T000000Z\r\n\
DTSTART;TZID=America/New_York:19970714T133000\r\nEND:VEVENT\r\n",
    );
    assert!(to_ical(&cal).contains("DTSTART;TZID=America/New_York:19970714T133000\r\n"));
}

#[test]
fn same_instant_in_different_forms_is_not_equal() {
    let new_york = calendar(
        "BEGIN:VEVENT\r\nUID:i@example.com\r\nDTSTAMP:19970701T000000Z\r\n\
DTSTART;TZID=America/New_York:19970714T133000\r\nEND:VEVENT\r\n",
    );
    let utc = calendar(
        "BEGIN:VEVENT\r\nUID:i@example.com\r\nDTSTAMP:19970701T000000Z\r\n\
DTSTART:19970714T173000Z\r\nEND:VEVENT\r\n",
    );
    assert_ne!(new_york, utc);

    let start = |c: &Calendar| c.events().next().unwrap().common().start.clone();
    let (a, b) = (start(&new_york), start(&utc));
    let ordering = DateTime::nullable_cmp(a.as_ref(), b.as_ref(), &IanaResolver::new()).unwrap();
    assert!(ordering.is_eq());
}

#[test]
fn absent_values_compare_like_nulls() {
    let resolver = IanaResolver::new();
    let present = DateTime::from_instant(chrono::DateTime::UNIX_EPOCH);

    let both = DateTime::nullable_cmp(None, None, &resolver).unwrap();
    assert_eq!(both, NullableOrdering::BothAbsent);
    assert!(both.is_eq());

    let one = DateTime::nullable_cmp(Some(&present), None, &resolver).unwrap();
    assert!(one.is_ne());
    assert!(!one.is_eq() && !one.is_lt() && !one.is_gt());
    assert!(!one.is_le() && !one.is_ge());
}

#[test]
fn tzurl_trailing_slash_is_ignored() {
    let zone = |url: &str| {
        calendar(&format!(
            "BEGIN:VTIMEZONE\r\nTZID:Test/Zone\r\nTZURL:{url}\r\nBEGIN:STANDARD\r\n\
DTSTART:19700101T000000\r\nTZOFFSETFROM:+0100\r\nTZOFFSETTO:+0100\r\nEND:STANDARD\r\n\
END:VTIMEZONE\r\n"
        ))
    };
    let a = zone("http://tz.example.com/zones/Test-Zone/");
    let b = zone("http://tz.example.com/zones/Test-Zone");
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
}
