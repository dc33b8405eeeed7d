//! Recurrence sets: DTSTART ∪ RRULE ∪ RDATE − EXDATE (RFC 5545 §3.8.5).

use std::collections::{HashSet, VecDeque};

use chrono::Utc;

use super::{ExpansionError, ExpansionOptions, ExpansionResult, RecurrenceIter, ZoneResolver};
use crate::rfc::ical::core::{DateTime, PeriodList, RRule};

/// One concrete occurrence of a recurrence set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// Start in the form (floating, zoned, UTC, date) of its source.
    pub start: DateTime,
    /// Start resolved to UTC.
    pub instant: chrono::DateTime<Utc>,
    /// End carried by an `RDATE` period, if any.
    pub end: Option<chrono::DateTime<Utc>>,
}

/// Borrowed view over the recurrence fields of one component.
#[derive(Debug, Clone, Copy)]
pub struct RecurrenceSet<'a> {
    start: &'a DateTime,
    rules: &'a [RRule],
    rdates: &'a [PeriodList],
    exdates: &'a [PeriodList],
}

impl<'a> RecurrenceSet<'a> {
    #[must_use]
    pub const fn new(start: &'a DateTime) -> Self {
        Self {
            start,
            rules: &[],
            rdates: &[],
            exdates: &[],
        }
    }

    #[must_use]
    pub const fn with_rules(mut self, rules: &'a [RRule]) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub const fn with_rdates(mut self, rdates: &'a [PeriodList]) -> Self {
        self.rdates = rdates;
        self
    }

    #[must_use]
    pub const fn with_exdates(mut self, exdates: &'a [PeriodList]) -> Self {
        self.exdates = exdates;
        self
    }

    /// Returns whether the set is more than its start.
    #[must_use]
    pub fn is_recurring(&self) -> bool {
        !self.rules.is_empty() || self.rdates.iter().any(|list| !list.is_empty())
    }

    /// ## Summary
    /// Returns a fresh, ascending, deduplicated iterator over the set.
    ///
    /// Exception dates are matched by UTC instant. A rule occurrence whose
    /// wall-clock time is skipped or repeated by its zone is yielded as an
    /// error and merging continues. A malformed rule is yielded once, after
    /// which the iterator ends.
    ///
    /// ## Errors
    /// Returns an error if the start, an `RDATE` or an `EXDATE` cannot be
    /// resolved to UTC.
    #[tracing::instrument(
        skip(self, resolver, options),
        fields(start = %self.start, rules = self.rules.len())
    )]
    pub fn occurrences<R: ZoneResolver + ?Sized>(
        &self,
        resolver: &'a R,
        options: ExpansionOptions,
    ) -> ExpansionResult<SetIter<'a, R>> {
        let mut excluded = HashSet::new();
        for list in self.exdates {
            excluded.extend(list.start_instants(resolver)?);
        }

        let mut explicit = vec![Occurrence {
            start: self.start.clone(),
            instant: self.start.instant(resolver)?,
            end: None,
        }];
        for period in self.rdates.iter().flat_map(|list| list.iter()) {
            let (instant, end) = period.resolve(resolver)?;
            explicit.push(Occurrence {
                start: period.start().clone(),
                instant,
                end,
            });
        }
        explicit.sort_by_key(|o| o.instant);

        let mut rules = Vec::with_capacity(self.rules.len());
        for rule in self.rules {
            rules.push(RuleCursor {
                iter: rule.occurrences_resolved(self.start, resolver, options)?,
                head: None,
                done: false,
            });
        }

        tracing::debug!(
            explicit = explicit.len(),
            excluded = excluded.len(),
            "Prepared recurrence set"
        );

        Ok(SetIter {
            resolver,
            rules,
            explicit: VecDeque::from(explicit),
            excluded,
            last: None,
            failed: false,
        })
    }

    /// ## Summary
    /// Collects the occurrences starting in `[from, to)`.
    ///
    /// At most `options.max_instances` occurrences are returned.
    ///
    /// ## Errors
    /// Returns the first expansion or resolution error met.
    pub fn collect_between<R: ZoneResolver + ?Sized>(
        &self,
        from: chrono::DateTime<Utc>,
        to: chrono::DateTime<Utc>,
        resolver: &'a R,
        options: ExpansionOptions,
    ) -> ExpansionResult<Vec<Occurrence>> {
        let mut result = Vec::new();
        for occurrence in self.occurrences(resolver, options)? {
            let occurrence = occurrence?;
            if occurrence.instant >= to {
                break;
            }
            if occurrence.instant < from {
                continue;
            }
            if result.len() >= options.max_instances {
                tracing::warn!(
                    limit = options.max_instances,
                    "Occurrence limit reached, truncating"
                );
                break;
            }
            result.push(occurrence);
        }
        Ok(result)
    }
}

#[derive(Debug)]
struct RuleCursor {
    iter: RecurrenceIter,
    head: Option<Occurrence>,
    done: bool,
}

/// Iterator over a [`RecurrenceSet`], merging every source in instant order.
#[derive(Debug)]
pub struct SetIter<'a, R: ?Sized> {
    resolver: &'a R,
    rules: Vec<RuleCursor>,
    explicit: VecDeque<Occurrence>,
    excluded: HashSet<chrono::DateTime<Utc>>,
    last: Option<chrono::DateTime<Utc>>,
    failed: bool,
}

impl<R: ZoneResolver + ?Sized> SetIter<'_, R> {
    /// Pulls a head for every live rule.
    ///
    /// A rule error ends that rule. A start that cannot be resolved to UTC
    /// drops only that occurrence.
    fn fill_heads(&mut self) -> ExpansionResult<()> {
        for cursor in &mut self.rules {
            if cursor.head.is_some() || cursor.done {
                continue;
            }
            match cursor.iter.next() {
                Some(Ok(start)) => {
                    let instant = start.instant(self.resolver)?;
                    cursor.head = Some(Occurrence {
                        start,
                        instant,
                        end: None,
                    });
                }
                Some(Err(err)) => {
                    cursor.done = true;
                    return Err(err);
                }
                None => cursor.done = true,
            }
        }
        Ok(())
    }

    fn pop_earliest(&mut self) -> Option<Occurrence> {
        let rule_min = self
            .rules
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.head.as_ref().map(|h| (i, h.instant)))
            .min_by_key(|&(_, instant)| instant);
        let explicit_min = self.explicit.front().map(|o| o.instant);

        match (rule_min, explicit_min) {
            // Explicit entries win ties so an RDATE period keeps its end.
            (Some((_, r)), Some(e)) if e <= r => self.explicit.pop_front(),
            (Some((i, _)), _) => self.rules[i].head.take(),
            (None, Some(_)) => self.explicit.pop_front(),
            (None, None) => None,
        }
    }
}

impl<R: ZoneResolver + ?Sized> Iterator for SetIter<'_, R> {
    type Item = ExpansionResult<Occurrence>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Err(err) = self.fill_heads() {
                // Resolution errors cost one occurrence; rule errors end the set.
                self.failed = matches!(err, ExpansionError::MalformedRule(_));
                return Some(Err(err));
            }
            let occurrence = self.pop_earliest()?;
            if self.last == Some(occurrence.instant) {
                continue;
            }
            self.last = Some(occurrence.instant);
            if self.excluded.contains(&occurrence.instant) {
                tracing::trace!(instant = %occurrence.instant, "Occurrence excluded");
                continue;
            }
            return Some(Ok(occurrence));
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime, TimeZone};

    use super::*;
    use crate::rfc::ical::core::{Period, UtcOffset};
    use crate::rfc::ical::expand::{FixedOffsetResolver, IanaResolver};

    fn at(y: i32, mo: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn days(iter: impl Iterator<Item = ExpansionResult<Occurrence>>) -> Vec<u32> {
        use chrono::Datelike;
        iter.map(|o| o.unwrap().instant.day()).collect()
    }

    #[test_log::test]
    fn start_alone_is_one_occurrence() {
        let start = DateTime::utc(at(2026, 1, 1, 9));
        let resolver = FixedOffsetResolver::new();
        let set = RecurrenceSet::new(&start);
        assert!(!set.is_recurring());
        let all: Vec<_> = set
            .occurrences(&resolver, ExpansionOptions::default())
            .unwrap()
            .collect();
        assert_eq!(all.len(), 1);
    }

    #[test_log::test]
    fn rules_rdates_and_exdates_combine() {
        let start = DateTime::utc(at(2026, 1, 1, 9));
        let rules = [RRule::daily().with_count(5).unwrap()];
        let rdates = [PeriodList::from_dates([
            DateTime::utc(at(2026, 1, 10, 9)),
            // Also produced by the rule; must not repeat.
            DateTime::utc(at(2026, 1, 2, 9)),
        ])];
        let exdates = [PeriodList::from_dates([DateTime::utc(at(2026, 1, 3, 9))])];
        let resolver = FixedOffsetResolver::new();

        let set = RecurrenceSet::new(&start)
            .with_rules(&rules)
            .with_rdates(&rdates)
            .with_exdates(&exdates);
        let iter = set
            .occurrences(&resolver, ExpansionOptions::default())
            .unwrap();
        assert_eq!(days(iter), vec![1, 2, 4, 5, 10]);
    }

    #[test_log::test]
    fn overlapping_rules_are_deduplicated() {
        let start = DateTime::utc(at(2026, 1, 5, 9));
        let rules = [
            RRule::daily().with_count(4).unwrap(),
            RRule::daily().with_interval(2).unwrap().with_count(3).unwrap(),
        ];
        let resolver = FixedOffsetResolver::new();
        let iter = RecurrenceSet::new(&start)
            .with_rules(&rules)
            .occurrences(&resolver, ExpansionOptions::default())
            .unwrap();
        assert_eq!(days(iter), vec![5, 6, 7, 8, 9]);
    }

    #[test_log::test]
    fn exdate_matches_by_instant_across_zones() {
        let resolver = FixedOffsetResolver::new()
            .with_zone("Europe/Berlin", UtcOffset::from_hms(false, 1, 0, 0).unwrap());
        let start = DateTime::zoned(at(2026, 1, 1, 10), "Europe/Berlin");
        let rules = [RRule::daily().with_count(3).unwrap()];
        // 09:00Z on Jan 2 is 10:00 in Berlin.
        let exdates = [PeriodList::from_dates([DateTime::utc(at(2026, 1, 2, 9))])];
        let iter = RecurrenceSet::new(&start)
            .with_rules(&rules)
            .with_exdates(&exdates)
            .occurrences(&resolver, ExpansionOptions::default())
            .unwrap();
        assert_eq!(days(iter), vec![1, 3]);
    }

    #[test_log::test]
    fn exdate_on_a_different_time_does_not_exclude() {
        let start = DateTime::utc(at(2026, 1, 1, 9));
        let rules = [RRule::daily().with_count(2).unwrap()];
        let exdates = [PeriodList::from_dates([DateTime::utc(at(2026, 1, 2, 10))])];
        let resolver = FixedOffsetResolver::new();
        let iter = RecurrenceSet::new(&start)
            .with_rules(&rules)
            .with_exdates(&exdates)
            .occurrences(&resolver, ExpansionOptions::default())
            .unwrap();
        assert_eq!(days(iter), vec![1, 2]);
    }

    #[test_log::test]
    fn start_can_be_excluded() {
        let start = DateTime::utc(at(2026, 1, 1, 9));
        let rules = [RRule::daily().with_count(2).unwrap()];
        let exdates = [PeriodList::from_dates([start.clone()])];
        let resolver = FixedOffsetResolver::new();
        let iter = RecurrenceSet::new(&start)
            .with_rules(&rules)
            .with_exdates(&exdates)
            .occurrences(&resolver, ExpansionOptions::default())
            .unwrap();
        assert_eq!(days(iter), vec![2]);
    }

    #[test_log::test]
    fn rdate_period_keeps_its_end() {
        let start = DateTime::utc(at(2026, 1, 1, 9));
        let rdates = [[Period::explicit(
            DateTime::utc(at(2026, 1, 4, 9)),
            DateTime::utc(at(2026, 1, 4, 12)),
        )]
        .into_iter()
        .collect::<PeriodList>()];
        let resolver = FixedOffsetResolver::new();
        let all: Vec<Occurrence> = RecurrenceSet::new(&start)
            .with_rdates(&rdates)
            .occurrences(&resolver, ExpansionOptions::default())
            .unwrap()
            .collect::<ExpansionResult<_>>()
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(
            all[1].end,
            Some(Utc.with_ymd_and_hms(2026, 1, 4, 12, 0, 0).unwrap())
        );
    }

    #[test_log::test]
    fn unbounded_rule_is_lazy() {
        let start = DateTime::utc(at(2026, 1, 1, 9));
        let rules = [RRule::weekly()];
        let resolver = FixedOffsetResolver::new();
        let set = RecurrenceSet::new(&start).with_rules(&rules);
        let first: Vec<_> = set
            .occurrences(&resolver, ExpansionOptions::default())
            .unwrap()
            .take(100)
            .collect::<ExpansionResult<_>>()
            .unwrap();
        assert_eq!(first.len(), 100);
    }

    #[test_log::test]
    fn collect_between_is_half_open_and_capped() {
        let start = DateTime::utc(at(2026, 1, 1, 9));
        let rules = [RRule::daily()];
        let resolver = FixedOffsetResolver::new();
        let set = RecurrenceSet::new(&start).with_rules(&rules);

        let from = Utc.with_ymd_and_hms(2026, 1, 3, 9, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2026, 1, 6, 9, 0, 0).unwrap();
        let found = set
            .collect_between(from, to, &resolver, ExpansionOptions::default())
            .unwrap();
        assert_eq!(found.len(), 3);

        let capped = ExpansionOptions {
            max_instances: 2,
            ..ExpansionOptions::default()
        };
        let found = set.collect_between(from, to, &resolver, capped).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test_log::test]
    fn unknown_zone_fails_up_front() {
        let start = DateTime::zoned(at(2026, 1, 1, 9), "Nowhere/Special");
        let resolver = FixedOffsetResolver::new();
        let result = RecurrenceSet::new(&start).occurrences(&resolver, ExpansionOptions::default());
        assert!(matches!(result, Err(ExpansionError::UnresolvableZone(_))));
    }

    #[test_log::test]
    fn rule_error_is_yielded_once() {
        let start = DateTime::utc(at(2026, 4, 1, 9));
        let rules = [RRule::yearly().with_by_month([4, 6, 9, 11]).with_by_month_day([31])];
        let resolver = FixedOffsetResolver::new();
        let options = ExpansionOptions {
            max_lookahead: 10,
            ..ExpansionOptions::default()
        };
        let mut iter = RecurrenceSet::new(&start)
            .with_rules(&rules)
            .occurrences(&resolver, options)
            .unwrap();
        assert!(matches!(
            iter.next(),
            Some(Err(ExpansionError::MalformedRule(_)))
        ));
        assert!(iter.next().is_none());
    }

    #[test_log::test]
    fn ambiguous_occurrence_is_skipped_with_an_error() {
        let start = DateTime::zoned(
            NaiveDate::from_ymd_opt(2026, 10, 30)
                .unwrap()
                .and_hms_opt(1, 30, 0)
                .unwrap(),
            "America/New_York",
        );
        let rules = [RRule::daily().with_count(5).unwrap()];
        let resolver = IanaResolver::new();
        let found: Vec<_> = RecurrenceSet::new(&start)
            .with_rules(&rules)
            .occurrences(&resolver, ExpansionOptions::default())
            .unwrap()
            .collect();

        assert_eq!(found.len(), 5);
        let instant = |i: usize| found[i].as_ref().unwrap().instant;
        assert_eq!(instant(0), Utc.with_ymd_and_hms(2026, 10, 30, 5, 30, 0).unwrap());
        assert_eq!(instant(1), Utc.with_ymd_and_hms(2026, 10, 31, 5, 30, 0).unwrap());
        assert!(matches!(
            found[2],
            Err(ExpansionError::AmbiguousLocalTime { .. })
        ));
        assert_eq!(instant(3), Utc.with_ymd_and_hms(2026, 11, 2, 6, 30, 0).unwrap());
        assert_eq!(instant(4), Utc.with_ymd_and_hms(2026, 11, 3, 6, 30, 0).unwrap());
    }
}
