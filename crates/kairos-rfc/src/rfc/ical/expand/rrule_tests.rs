use chrono::{NaiveDate, NaiveDateTime};

use super::*;
use crate::rfc::ical::core::UtcOffset;
use crate::rfc::ical::expand::FixedOffsetResolver;
use crate::rfc::ical::parse::parse_rrule;

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, s)
        .unwrap()
}

fn rule(text: &str) -> RRule {
    parse_rrule(text, 1, 1).unwrap()
}

fn expand(text: &str, start: &DateTime) -> Vec<NaiveDateTime> {
    rule(text)
        .occurrences(start, ExpansionOptions::default())
        .map(|occurrence| occurrence.unwrap().local())
        .collect()
}

/// Expands the same rule with the `rrule` crate.
fn expand_reference(dtstart: &str, text: &str, limit: u16) -> Vec<NaiveDateTime> {
    let set: rrule::RRuleSet = format!("DTSTART:{dtstart}\nRRULE:{text}")
        .parse()
        .unwrap();
    set.all(limit)
        .dates
        .iter()
        .map(chrono::DateTime::naive_utc)
        .collect()
}

#[test_log::test]
fn daily_with_count() {
    let start = DateTime::utc(at(2026, 1, 1, 9, 0, 0));
    let dates = expand("FREQ=DAILY;COUNT=3", &start);
    assert_eq!(
        dates,
        vec![
            at(2026, 1, 1, 9, 0, 0),
            at(2026, 1, 2, 9, 0, 0),
            at(2026, 1, 3, 9, 0, 0),
        ]
    );
}

#[test_log::test]
fn weekly_on_several_days() {
    let start = DateTime::utc(at(2026, 1, 5, 10, 0, 0));
    let dates = expand("FREQ=WEEKLY;BYDAY=MO,WE,FR;COUNT=6", &start);
    let days: Vec<u32> = dates.iter().map(Datelike::day).collect();
    assert_eq!(days, vec![5, 7, 9, 12, 14, 16]);
}

#[test_log::test]
fn every_other_week_with_sunday_week_start() {
    let start = DateTime::floating(at(1997, 9, 2, 9, 0, 0));
    let dates = expand(
        "FREQ=WEEKLY;INTERVAL=2;WKST=SU;BYDAY=TU,TH;COUNT=8",
        &start,
    );
    assert_eq!(
        dates,
        vec![
            at(1997, 9, 2, 9, 0, 0),
            at(1997, 9, 4, 9, 0, 0),
            at(1997, 9, 16, 9, 0, 0),
            at(1997, 9, 18, 9, 0, 0),
            at(1997, 9, 30, 9, 0, 0),
            at(1997, 10, 2, 9, 0, 0),
            at(1997, 10, 14, 9, 0, 0),
            at(1997, 10, 16, 9, 0, 0),
        ]
    );
}

#[test_log::test]
fn monthly_first_friday() {
    let start = DateTime::floating(at(1997, 9, 5, 9, 0, 0));
    let dates = expand("FREQ=MONTHLY;COUNT=10;BYDAY=1FR", &start);
    let expected: Vec<NaiveDateTime> = [
        (1997, 9, 5),
        (1997, 10, 3),
        (1997, 11, 7),
        (1997, 12, 5),
        (1998, 1, 2),
        (1998, 2, 6),
        (1998, 3, 6),
        (1998, 4, 3),
        (1998, 5, 1),
        (1998, 6, 5),
    ]
    .into_iter()
    .map(|(y, m, d)| at(y, m, d, 9, 0, 0))
    .collect();
    assert_eq!(dates, expected);
}

#[test_log::test]
fn monthly_last_friday() {
    let start = DateTime::utc(at(2026, 1, 30, 12, 0, 0));
    let dates = expand("FREQ=MONTHLY;BYDAY=-1FR;COUNT=4", &start);
    let days: Vec<(u32, u32)> = dates.iter().map(|d| (d.month(), d.day())).collect();
    assert_eq!(days, vec![(1, 30), (2, 27), (3, 27), (4, 24)]);
}

#[test_log::test]
fn last_weekday_of_month_with_setpos() {
    let start = DateTime::utc(at(2026, 1, 30, 17, 0, 0));
    let dates = expand(
        "FREQ=MONTHLY;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=-1;COUNT=3",
        &start,
    );
    let days: Vec<(u32, u32)> = dates.iter().map(|d| (d.month(), d.day())).collect();
    assert_eq!(days, vec![(1, 30), (2, 27), (3, 31)]);
}

#[test_log::test]
fn yearly_second_sunday_of_march() {
    let start = DateTime::floating(at(2026, 3, 8, 2, 0, 0));
    let dates = expand("FREQ=YEARLY;BYMONTH=3;BYDAY=2SU;COUNT=3", &start);
    assert_eq!(
        dates,
        vec![
            at(2026, 3, 8, 2, 0, 0),
            at(2027, 3, 14, 2, 0, 0),
            at(2028, 3, 12, 2, 0, 0),
        ]
    );
}

#[test_log::test]
fn yearly_by_week_number() {
    let start = DateTime::floating(at(1997, 5, 12, 9, 0, 0));
    let dates = expand("FREQ=YEARLY;BYWEEKNO=20;BYDAY=MO;COUNT=3", &start);
    assert_eq!(
        dates,
        vec![
            at(1997, 5, 12, 9, 0, 0),
            at(1998, 5, 11, 9, 0, 0),
            at(1999, 5, 17, 9, 0, 0),
        ]
    );
}

#[test_log::test]
fn leap_day_only_in_leap_years() {
    let start = DateTime::utc(at(2024, 2, 29, 8, 0, 0));
    let dates = expand("FREQ=YEARLY;COUNT=3", &start);
    let years: Vec<i32> = dates.iter().map(Datelike::year).collect();
    assert_eq!(years, vec![2024, 2028, 2032]);
}

#[test_log::test]
fn hourly_until_is_inclusive() {
    let start = DateTime::utc(at(1997, 9, 2, 9, 0, 0));
    let dates = expand("FREQ=HOURLY;INTERVAL=3;UNTIL=19970902T150000Z", &start);
    assert_eq!(
        dates,
        vec![
            at(1997, 9, 2, 9, 0, 0),
            at(1997, 9, 2, 12, 0, 0),
            at(1997, 9, 2, 15, 0, 0),
        ]
    );
}

#[test_log::test]
fn daily_expands_hours() {
    let start = DateTime::utc(at(2026, 1, 1, 9, 0, 0));
    let dates = expand("FREQ=DAILY;BYHOUR=9,17;COUNT=4", &start);
    assert_eq!(
        dates,
        vec![
            at(2026, 1, 1, 9, 0, 0),
            at(2026, 1, 1, 17, 0, 0),
            at(2026, 1, 2, 9, 0, 0),
            at(2026, 1, 2, 17, 0, 0),
        ]
    );
}

#[test_log::test]
fn date_until_covers_whole_day() {
    let start = DateTime::utc(at(2026, 1, 1, 9, 0, 0));
    assert_eq!(expand("FREQ=DAILY;UNTIL=20260103", &start).len(), 3);
}

#[test_log::test]
fn date_start_yields_dates() {
    let start = DateTime::date(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    let occurrences: Vec<DateTime> = rule("FREQ=DAILY;COUNT=2")
        .occurrences(&start, ExpansionOptions::default())
        .collect::<ExpansionResult<_>>()
        .unwrap();
    assert!(occurrences.iter().all(|o| !o.has_time()));
    assert_eq!(occurrences[1].to_string(), "20260102");
}

#[test_log::test]
fn occurrences_keep_the_start_zone() {
    let start = DateTime::zoned(at(2026, 1, 1, 9, 0, 0), "America/New_York");
    let first = rule("FREQ=DAILY;COUNT=1")
        .occurrences(&start, ExpansionOptions::default())
        .next()
        .unwrap()
        .unwrap();
    assert_eq!(first, start);
}

#[test_log::test]
fn iteration_is_restartable() {
    let start = DateTime::utc(at(2026, 1, 5, 10, 0, 0));
    let rule = rule("FREQ=WEEKLY;BYDAY=MO,FR");
    let options = ExpansionOptions::default();
    let first: Vec<_> = rule.occurrences(&start, options).take(10).collect();
    let second: Vec<_> = rule.occurrences(&start, options).take(10).collect();
    assert_eq!(first, second);
}

#[test_log::test]
fn coarse_filters_skip_ahead_for_fine_rules() {
    let start = DateTime::utc(at(2026, 2, 10, 10, 0, 0));
    let options = ExpansionOptions {
        max_lookahead: 50,
        ..ExpansionOptions::default()
    };
    let dates: Vec<NaiveDateTime> = rule("FREQ=MINUTELY;BYMONTH=1;COUNT=2")
        .occurrences(&start, options)
        .map(|o| o.unwrap().local())
        .collect();
    assert_eq!(dates, vec![at(2027, 1, 1, 0, 0, 0), at(2027, 1, 1, 0, 1, 0)]);
}

#[test_log::test]
fn unsatisfiable_rule_fails_once() {
    let start = DateTime::utc(at(2026, 4, 1, 9, 0, 0));
    let options = ExpansionOptions {
        max_lookahead: 20,
        ..ExpansionOptions::default()
    };
    let mut iter = rule("FREQ=YEARLY;BYMONTH=4,6,9,11;BYMONTHDAY=31").occurrences(&start, options);
    assert!(matches!(
        iter.next(),
        Some(Err(ExpansionError::MalformedRule(_)))
    ));
    assert!(iter.next().is_none());
}

#[test_log::test]
fn out_of_range_parts_are_malformed() {
    let start = DateTime::utc(at(2026, 4, 1, 9, 0, 0));
    let mut iter = RRule::yearly()
        .with_by_month([13])
        .occurrences(&start, ExpansionOptions::default());
    assert!(matches!(
        iter.next(),
        Some(Err(ExpansionError::MalformedRule(_)))
    ));
    assert!(iter.next().is_none());
}

#[test_log::test]
fn resolved_until_uses_the_start_zone() {
    let resolver = FixedOffsetResolver::new().with_zone(
        "America/New_York",
        UtcOffset::from_hms(true, 5, 0, 0).unwrap(),
    );
    let start = DateTime::zoned(at(2026, 1, 1, 9, 0, 0), "America/New_York");
    // 13:59:59Z is 08:59:59 in New York, just before the third occurrence.
    let rule = rule("FREQ=DAILY;UNTIL=20260103T135959Z");

    let resolved = rule
        .occurrences_resolved(&start, &resolver, ExpansionOptions::default())
        .unwrap()
        .count();
    assert_eq!(resolved, 2);

    let wall_clock = rule
        .occurrences(&start, ExpansionOptions::default())
        .count();
    assert_eq!(wall_clock, 3);
}

#[test_log::test]
fn options_follow_configuration() {
    let config = kairos_core::config::ExpansionConfig {
        max_lookahead: 7,
        max_instances: 9,
    };
    let options = ExpansionOptions::from(config);
    assert_eq!(options.max_lookahead, 7);
    assert_eq!(options.max_instances, 9);
}

#[test_log::test]
fn agrees_with_rrule_crate() {
    let cases = [
        ("20260105T090000Z", "FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,TH;COUNT=12"),
        ("20260130T120000Z", "FREQ=MONTHLY;BYDAY=-1FR;COUNT=12"),
        ("20260131T080000Z", "FREQ=MONTHLY;BYMONTHDAY=-1;COUNT=12"),
        ("20260308T020000Z", "FREQ=YEARLY;BYMONTH=3;BYDAY=2SU;COUNT=8"),
        ("20260101T000000Z", "FREQ=YEARLY;BYYEARDAY=1,100,200;COUNT=9"),
        ("20260102T090000Z", "FREQ=DAILY;INTERVAL=3;BYHOUR=9,18;BYMINUTE=0,30;COUNT=20"),
        (
            "20260130T170000Z",
            "FREQ=MONTHLY;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=-1;COUNT=12",
        ),
    ];

    for (dtstart, text) in cases {
        let start = DateTime::utc(
            NaiveDateTime::parse_from_str(dtstart, "%Y%m%dT%H%M%SZ").unwrap(),
        );
        let ours = expand(text, &start);
        let reference = expand_reference(dtstart, text, 100);
        assert_eq!(ours, reference, "{text}");
    }
}
