//! RRULE expansion (RFC 5545 §3.3.10).
//!
//! Occurrences are produced lazily, one recurrence period at a time. Each
//! period (a year, month, week, day, hour, minute or second, stepped by the
//! rule's interval) yields a finite, sorted candidate set built from the
//! `BY*` parts; `BYSETPOS` then selects from that set.

use std::collections::VecDeque;

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};

use super::{ExpansionError, ExpansionResult, ZoneResolver};
use crate::rfc::ical::core::{DateTime, Frequency, RRule, Weekday, WeekdayNum};

/// Limits applied while expanding recurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionOptions {
    /// Consecutive recurrence periods without a candidate before the rule is
    /// declared unsatisfiable.
    pub max_lookahead: u32,
    /// Upper bound on occurrences collected into a `Vec` by one call.
    pub max_instances: usize,
}

impl Default for ExpansionOptions {
    fn default() -> Self {
        Self {
            max_lookahead: 1000,
            max_instances: 10_000,
        }
    }
}

impl From<kairos_core::config::ExpansionConfig> for ExpansionOptions {
    fn from(config: kairos_core::config::ExpansionConfig) -> Self {
        Self {
            max_lookahead: config.max_lookahead,
            max_instances: config.max_instances,
        }
    }
}

impl RRule {
    /// ## Summary
    /// Returns a fresh iterator over the occurrences of this rule from `start`.
    ///
    /// `UNTIL` is compared with occurrences by wall-clock value. A DATE
    /// `UNTIL` with a DATE-TIME start includes the whole day.
    #[must_use]
    pub fn occurrences(&self, start: &DateTime, options: ExpansionOptions) -> RecurrenceIter {
        let until_local = self.until().map(|until| until_wall_clock(until, start));
        RecurrenceIter::new(self, start, until_local, options)
    }

    /// ## Summary
    /// Returns a fresh iterator, projecting a UTC `UNTIL` into the zone of a
    /// zoned `start` first.
    ///
    /// ## Errors
    /// Propagates zone resolution failures for the `UNTIL` projection.
    pub fn occurrences_resolved<R: ZoneResolver + ?Sized>(
        &self,
        start: &DateTime,
        resolver: &R,
        options: ExpansionOptions,
    ) -> ExpansionResult<RecurrenceIter> {
        let until_local = match (self.until(), start.tzid()) {
            (Some(until), Some(tzid)) if until.is_utc() => {
                let instant = until.local().and_utc();
                let offset = resolver.offset_at(tzid, instant)?;
                let local = until
                    .local()
                    .checked_add_signed(TimeDelta::seconds(i64::from(offset.as_seconds())))
                    .unwrap_or_else(|| until.local());
                Some(local)
            }
            (Some(until), _) => Some(until_wall_clock(until, start)),
            (None, _) => None,
        };
        Ok(RecurrenceIter::new(self, start, until_local, options))
    }
}

fn until_wall_clock(until: &DateTime, start: &DateTime) -> NaiveDateTime {
    let local = until.local();
    if start.has_time() && !until.has_time() {
        local
            .date()
            .and_hms_opt(23, 59, 59)
            .unwrap_or(local)
    } else {
        local
    }
}

/// Lazy, ordered, non-repeating occurrence sequence of one rule.
///
/// Yields `Err` at most once and then ends, so a consumer can always tell an
/// exhausted sequence from a failed one.
#[derive(Debug, Clone)]
pub struct RecurrenceIter {
    rule: RRule,
    start: DateTime,
    until_local: Option<NaiveDateTime>,
    max_lookahead: u32,
    cursor: Option<NaiveDateTime>,
    pending: VecDeque<NaiveDateTime>,
    emitted: u32,
    last: Option<NaiveDateTime>,
    empty_streak: u32,
    error: Option<ExpansionError>,
}

impl RecurrenceIter {
    /// ## Summary
    /// Builds an iterator with an explicit wall-clock `UNTIL` bound,
    /// overriding the rule's own.
    #[must_use]
    pub fn new(
        rule: &RRule,
        start: &DateTime,
        until_local: Option<NaiveDateTime>,
        options: ExpansionOptions,
    ) -> Self {
        let error = validate(rule).err();
        let rule = with_default_parts(rule.clone(), start.local());
        let cursor = error.is_none().then(|| period_start(&rule, start.local()));
        tracing::trace!(rule = %rule, start = %start, "Starting recurrence expansion");

        Self {
            rule,
            start: start.clone(),
            until_local,
            max_lookahead: options.max_lookahead,
            cursor: cursor.flatten(),
            pending: VecDeque::new(),
            emitted: 0,
            last: None,
            empty_streak: 0,
            error,
        }
    }

    fn finish(&mut self) {
        self.cursor = None;
        self.pending.clear();
    }

    /// Expands one period into `pending` and moves the cursor on.
    fn expand_period(&mut self, cursor: NaiveDateTime) -> ExpansionResult<()> {
        let (candidates, next) = match self.coarse_miss(cursor) {
            Some(target) => (Vec::new(), self.align(cursor, target)),
            None => (self.candidates(cursor), self.advance(cursor)),
        };

        if candidates.is_empty() {
            self.empty_streak += 1;
            if self.empty_streak > self.max_lookahead {
                tracing::warn!(
                    rule = %self.rule,
                    periods = self.empty_streak,
                    "Recurrence rule never matches"
                );
                return Err(ExpansionError::MalformedRule(format!(
                    "no occurrence within {} recurrence periods",
                    self.max_lookahead
                )));
            }
        } else {
            self.empty_streak = 0;
        }

        let floor = self.start.local();
        let last = self.last;
        self.pending.extend(
            candidates
                .into_iter()
                .filter(|candidate| *candidate >= floor && last.is_none_or(|l| *candidate > l)),
        );
        self.cursor = next;
        Ok(())
    }

    /// For daily and finer rules, returns the next coarser boundary worth
    /// visiting when the period fails a coarser filter outright.
    fn coarse_miss(&self, cursor: NaiveDateTime) -> Option<NaiveDateTime> {
        let freq = self.rule.freq;
        if freq > Frequency::Daily {
            return None;
        }
        let date = cursor.date();
        if !self.rule.by_month.is_empty() && !self.rule.by_month.contains(&month_u8(date)) {
            let next_month = date.with_day(1)?.checked_add_months(Months::new(1))?;
            return Some(next_month.and_time(NaiveTime::MIN));
        }
        if freq == Frequency::Daily {
            return None;
        }
        if !self.day_matches(date) {
            return Some(date.succ_opt()?.and_time(NaiveTime::MIN));
        }
        if freq == Frequency::Hourly {
            return None;
        }
        if !matches_u8(&self.rule.by_hour, cursor.hour()) {
            let hour = cursor.with_minute(0)?.with_second(0)?;
            return hour.checked_add_signed(TimeDelta::hours(1));
        }
        if freq == Frequency::Minutely {
            return None;
        }
        if !matches_u8(&self.rule.by_minute, cursor.minute()) {
            let minute = cursor.with_second(0)?;
            return minute.checked_add_signed(TimeDelta::minutes(1));
        }
        None
    }

    /// Moves the cursor to the first grid point at or after `target`.
    fn align(&self, cursor: NaiveDateTime, target: NaiveDateTime) -> Option<NaiveDateTime> {
        let step = self.step_seconds()?;
        let gap = (target - cursor).num_seconds();
        let steps = ((gap + step - 1) / step).max(1);
        cursor.checked_add_signed(TimeDelta::try_seconds(steps.checked_mul(step)?)?)
    }

    fn step_seconds(&self) -> Option<i64> {
        let unit = match self.rule.freq {
            Frequency::Daily => 86_400,
            Frequency::Hourly => 3_600,
            Frequency::Minutely => 60,
            Frequency::Secondly => 1,
            Frequency::Weekly | Frequency::Monthly | Frequency::Yearly => return None,
        };
        i64::from(self.rule.interval()).checked_mul(unit)
    }

    fn advance(&self, cursor: NaiveDateTime) -> Option<NaiveDateTime> {
        let interval = self.rule.interval();
        match self.rule.freq {
            Frequency::Yearly => {
                let year = cursor.year().checked_add(i32::try_from(interval).ok()?)?;
                Some(NaiveDate::from_ymd_opt(year, 1, 1)?.and_time(NaiveTime::MIN))
            }
            Frequency::Monthly => cursor.checked_add_months(Months::new(interval)),
            Frequency::Weekly => {
                cursor.checked_add_signed(TimeDelta::try_days(i64::from(interval) * 7)?)
            }
            Frequency::Daily | Frequency::Hourly | Frequency::Minutely | Frequency::Secondly => {
                cursor.checked_add_signed(TimeDelta::try_seconds(self.step_seconds()?)?)
            }
        }
    }

    /// Builds the sorted candidate set of the period beginning at `cursor`.
    fn candidates(&self, cursor: NaiveDateTime) -> Vec<NaiveDateTime> {
        let dates: Vec<NaiveDate> = period_dates(self.rule.freq, cursor.date())
            .into_iter()
            .filter(|date| self.day_matches(*date))
            .collect();
        if dates.is_empty() {
            return Vec::new();
        }

        let times = self.times(cursor);
        let mut set: Vec<NaiveDateTime> = dates
            .iter()
            .flat_map(|date| times.iter().map(move |time| date.and_time(*time)))
            .collect();
        set.sort_unstable();
        set.dedup();

        if self.rule.by_setpos.is_empty() {
            set
        } else {
            select_positions(&set, &self.rule.by_setpos)
        }
    }

    /// Applies the day-level filters in order: month, week number, year day,
    /// month day, weekday.
    fn day_matches(&self, date: NaiveDate) -> bool {
        let rule = &self.rule;
        if !rule.by_month.is_empty() && !rule.by_month.contains(&month_u8(date)) {
            return false;
        }
        if !rule.by_weekno.is_empty() {
            let (week, weeks_in_year) = week_number(date, rule.wkst);
            if !rule
                .by_weekno
                .iter()
                .any(|&n| signed_matches(i32::from(n), week, weeks_in_year))
            {
                return false;
            }
        }
        if !rule.by_yearday.is_empty() {
            let days = days_in_year(date.year());
            if !rule
                .by_yearday
                .iter()
                .any(|&n| signed_matches(i32::from(n), date.ordinal(), days))
            {
                return false;
            }
        }
        if !rule.by_monthday.is_empty() {
            let days = days_in_month(date.year(), date.month());
            if !rule
                .by_monthday
                .iter()
                .any(|&n| signed_matches(i32::from(n), date.day(), days))
            {
                return false;
            }
        }
        rule.by_day.is_empty() || rule.by_day.iter().any(|wdn| self.weekday_matches(*wdn, date))
    }

    fn weekday_matches(&self, wdn: WeekdayNum, date: NaiveDate) -> bool {
        if Weekday::from_chrono(date.weekday()) != wdn.weekday {
            return false;
        }
        let Some(ordinal) = wdn.ordinal else {
            return true;
        };
        let Some((day, len)) = self.ordinal_frame(date) else {
            return true;
        };
        let ordinal = i32::from(ordinal);
        let from_start = i32::try_from((day - 1) / 7 + 1).unwrap_or(i32::MAX);
        let from_end = -i32::try_from((len - day) / 7 + 1).unwrap_or(i32::MAX);
        ordinal == from_start || ordinal == from_end
    }

    /// Position of `date` within the frame that numbered weekdays count in,
    /// and the frame's length. `None` when ordinals do not apply.
    fn ordinal_frame(&self, date: NaiveDate) -> Option<(u32, u32)> {
        let month_frame = (date.day(), days_in_month(date.year(), date.month()));
        match self.rule.freq {
            Frequency::Monthly => Some(month_frame),
            Frequency::Yearly if self.rule.by_weekno.is_empty() => {
                if self.rule.by_month.is_empty() {
                    Some((date.ordinal(), days_in_year(date.year())))
                } else {
                    Some(month_frame)
                }
            }
            _ => None,
        }
    }

    /// Times of day within a period, sorted.
    fn times(&self, cursor: NaiveDateTime) -> Vec<NaiveTime> {
        if !self.start.has_time() {
            return vec![NaiveTime::MIN];
        }
        let rule = &self.rule;
        let start = self.start.local();
        let freq = rule.freq;

        let hours = time_part(&rule.by_hour, freq >= Frequency::Daily, cursor.hour(), start.hour());
        let minutes = time_part(
            &rule.by_minute,
            freq >= Frequency::Hourly,
            cursor.minute(),
            start.minute(),
        );
        let seconds = time_part(
            &rule.by_second,
            freq >= Frequency::Minutely,
            cursor.second(),
            start.second(),
        );

        let (minutes, seconds) = (&minutes, &seconds);
        let mut times: Vec<NaiveTime> = hours
            .iter()
            .flat_map(|&h| {
                minutes.iter().flat_map(move |&m| {
                    seconds
                        .iter()
                        .filter_map(move |&s| NaiveTime::from_hms_opt(h, m, s))
                })
            })
            .collect();
        times.sort_unstable();
        times.dedup();
        times
    }
}

impl Iterator for RecurrenceIter {
    type Item = ExpansionResult<DateTime>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.error.take() {
            self.finish();
            return Some(Err(err));
        }

        loop {
            if self.rule.count().is_some_and(|count| self.emitted >= count) {
                self.finish();
                return None;
            }

            if let Some(next) = self.pending.pop_front() {
                if self.until_local.is_some_and(|until| next > until) {
                    self.finish();
                    return None;
                }
                self.emitted += 1;
                self.last = Some(next);
                return Some(Ok(self.start.with_local(next)));
            }

            let cursor = self.cursor?;
            if self.until_local.is_some_and(|until| cursor > until) {
                self.finish();
                return None;
            }
            if let Err(err) = self.expand_period(cursor) {
                self.finish();
                return Some(Err(err));
            }
        }
    }
}

/// Rejects rules whose parts are out of range.
fn validate(rule: &RRule) -> ExpansionResult<()> {
    fn check<T: Copy>(
        name: &str,
        values: &[T],
        valid: impl Fn(T) -> bool,
    ) -> ExpansionResult<()> {
        if values.iter().all(|&v| valid(v)) {
            Ok(())
        } else {
            Err(ExpansionError::MalformedRule(format!(
                "{name} value out of range"
            )))
        }
    }

    check("BYSECOND", &rule.by_second, |v| v <= 60)?;
    check("BYMINUTE", &rule.by_minute, |v| v <= 59)?;
    check("BYHOUR", &rule.by_hour, |v| v <= 23)?;
    check("BYMONTHDAY", &rule.by_monthday, |v| v != 0 && (-31..=31).contains(&v))?;
    check("BYYEARDAY", &rule.by_yearday, |v| v != 0 && (-366..=366).contains(&v))?;
    check("BYWEEKNO", &rule.by_weekno, |v| v != 0 && (-53..=53).contains(&v))?;
    check("BYMONTH", &rule.by_month, |v| (1..=12).contains(&v))?;
    check("BYSETPOS", &rule.by_setpos, |v| v != 0 && (-366..=366).contains(&v))?;
    check("BYDAY", &rule.by_day, |v: WeekdayNum| {
        v.ordinal.is_none_or(|n| n != 0 && (-53..=53).contains(&n))
    })
}

/// Fills in the parts a rule inherits from its start when it names no day.
fn with_default_parts(mut rule: RRule, start: NaiveDateTime) -> RRule {
    let names_no_day = rule.by_weekno.is_empty()
        && rule.by_yearday.is_empty()
        && rule.by_monthday.is_empty()
        && rule.by_day.is_empty();
    if !names_no_day {
        return rule;
    }

    let day = i8::try_from(start.day()).unwrap_or(1);
    match rule.freq {
        Frequency::Yearly => {
            if rule.by_month.is_empty() {
                rule.by_month.push(month_u8(start.date()));
            }
            rule.by_monthday.push(day);
        }
        Frequency::Monthly => rule.by_monthday.push(day),
        Frequency::Weekly => rule
            .by_day
            .push(WeekdayNum::every(Weekday::from_chrono(start.weekday()))),
        Frequency::Daily | Frequency::Hourly | Frequency::Minutely | Frequency::Secondly => {}
    }
    rule
}

/// Beginning of the period containing `start`.
fn period_start(rule: &RRule, start: NaiveDateTime) -> Option<NaiveDateTime> {
    let date = start.date();
    let midnight = |d: NaiveDate| d.and_time(NaiveTime::MIN);
    match rule.freq {
        Frequency::Yearly => NaiveDate::from_ymd_opt(date.year(), 1, 1).map(midnight),
        Frequency::Monthly => date.with_day(1).map(midnight),
        Frequency::Weekly => {
            let back = days_since(date.weekday(), rule.wkst);
            date.checked_sub_signed(TimeDelta::days(back)).map(midnight)
        }
        Frequency::Daily => Some(midnight(date)),
        Frequency::Hourly => start.with_minute(0)?.with_second(0),
        Frequency::Minutely => start.with_second(0),
        Frequency::Secondly => start.with_nanosecond(0),
    }
}

/// Every date of the period beginning on `first`.
fn period_dates(freq: Frequency, first: NaiveDate) -> Vec<NaiveDate> {
    let len = match freq {
        Frequency::Yearly => days_in_year(first.year()),
        Frequency::Monthly => days_in_month(first.year(), first.month()),
        Frequency::Weekly => 7,
        Frequency::Daily | Frequency::Hourly | Frequency::Minutely | Frequency::Secondly => 1,
    };
    first
        .iter_days()
        .take(usize::try_from(len).unwrap_or(0))
        .collect()
}

/// Values of one time part: the rule's list when the part expands, the
/// start's value when it defaults, or the period's own value when the part
/// only filters.
fn time_part(by: &[u8], expands: bool, period_value: u32, start_value: u32) -> Vec<u32> {
    if expands {
        if by.is_empty() {
            vec![start_value]
        } else {
            by.iter().map(|&v| u32::from(v)).collect()
        }
    } else if matches_u8(by, period_value) {
        vec![period_value]
    } else {
        Vec::new()
    }
}

fn matches_u8(by: &[u8], value: u32) -> bool {
    by.is_empty() || by.iter().any(|&v| u32::from(v) == value)
}

/// Whether a possibly negative index `n` names `value` in `1..=len`.
fn signed_matches(n: i32, value: u32, len: u32) -> bool {
    let (Ok(value), Ok(len)) = (i32::try_from(value), i32::try_from(len)) else {
        return false;
    };
    if n > 0 { n == value } else { len + n + 1 == value }
}

/// Keeps the 1-based (or negative, from the end) positions of a sorted set.
fn select_positions(set: &[NaiveDateTime], positions: &[i16]) -> Vec<NaiveDateTime> {
    let Ok(len) = i64::try_from(set.len()) else {
        return Vec::new();
    };
    let mut picked: Vec<usize> = positions
        .iter()
        .filter_map(|&pos| {
            let pos = i64::from(pos);
            let index = if pos > 0 { pos - 1 } else { len + pos };
            usize::try_from(index).ok().filter(|&i| i < set.len())
        })
        .collect();
    picked.sort_unstable();
    picked.dedup();
    picked.into_iter().map(|i| set[i]).collect()
}

fn month_u8(date: NaiveDate) -> u8 {
    u8::try_from(date.month()).unwrap_or(0)
}

fn days_since(weekday: chrono::Weekday, wkst: Weekday) -> i64 {
    let from = i64::from(weekday.num_days_from_monday());
    let to = i64::from(wkst.to_chrono().num_days_from_monday());
    (from - to).rem_euclid(7)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .map_or(31, |last| last.day())
}

fn days_in_year(year: i32) -> u32 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}

/// First day of week 1 of `year`: the first week, starting on `wkst`, that
/// has at least four days in the year.
fn week_one_start(year: i32, wkst: Weekday) -> Option<NaiveDate> {
    let jan1 = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let offset = days_since(jan1.weekday(), wkst);
    if offset <= 3 {
        jan1.checked_sub_signed(TimeDelta::days(offset))
    } else {
        jan1.checked_add_signed(TimeDelta::days(7 - offset))
    }
}

/// Week number of `date` and the number of weeks in its week-numbering year.
fn week_number(date: NaiveDate, wkst: Weekday) -> (u32, u32) {
    let weeks = |year: i32| -> Option<(NaiveDate, NaiveDate)> {
        Some((week_one_start(year, wkst)?, week_one_start(year + 1, wkst)?))
    };

    let year = date.year();
    let Some((mut first, mut next)) = weeks(year) else {
        return (0, 0);
    };
    if date < first {
        if let Some(previous) = weeks(year - 1) {
            (first, next) = previous;
        }
    } else if date >= next {
        if let Some(following) = weeks(year + 1) {
            (first, next) = following;
        }
    } else {
        // date lies in this year's week numbering
    }

    let week = (date - first).num_days() / 7 + 1;
    let total = (next - first).num_days() / 7;
    (
        u32::try_from(week).unwrap_or(0),
        u32::try_from(total).unwrap_or(0),
    )
}

#[cfg(test)]
#[path = "rrule_tests.rs"]
mod tests;
