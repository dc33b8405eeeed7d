//! VTIMEZONE component parsing and offset calculation.
//!
//! Implements parsing of VTIMEZONE components per RFC 5545 §3.6.5 so that
//! calendars can carry zone definitions the IANA database does not know.

use chrono::{NaiveDateTime, TimeDelta, Utc};
use url::Url;

use super::{ExpansionError, ExpansionOptions, ExpansionResult, RecurrenceIter};
use crate::rfc::ical::core::{
    Component, ComponentKind, DateTime, PeriodList, Property, RRule, UnorderedVec, UtcOffset,
    prop_names,
};

/// Kind of timezone observance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObservanceKind {
    /// Standard time (e.g., EST, GMT).
    Standard,
    /// Daylight saving time (e.g., EDT, BST).
    Daylight,
}

impl ObservanceKind {
    #[must_use]
    pub const fn component_kind(self) -> ComponentKind {
        match self {
            Self::Standard => ComponentKind::Standard,
            Self::Daylight => ComponentKind::Daylight,
        }
    }
}

impl std::fmt::Display for ObservanceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.component_kind().as_str())
    }
}

/// A STANDARD or DAYLIGHT sub-component: when an offset takes effect.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Observance {
    pub kind: ObservanceKind,
    /// First onset, as a wall-clock value in the `offset_from` offset.
    pub dtstart: NaiveDateTime,
    /// Offset in effect before each onset.
    pub offset_from: UtcOffset,
    /// Offset in effect after each onset.
    pub offset_to: UtcOffset,
    pub rules: UnorderedVec<RRule>,
    pub rdates: UnorderedVec<NaiveDateTime>,
    pub tzname: Option<String>,
}

impl Observance {
    /// ## Summary
    /// Returns the latest onset at or before `instant`, as a UTC instant.
    ///
    /// ## Errors
    /// Propagates failures from expanding the observance's rules.
    fn latest_onset(
        &self,
        instant: chrono::DateTime<Utc>,
    ) -> ExpansionResult<Option<chrono::DateTime<Utc>>> {
        let target = instant.naive_utc();
        let mut best = None;
        let mut consider = |onset_utc: NaiveDateTime| {
            if onset_utc <= target && best.is_none_or(|b| onset_utc > b) {
                best = Some(onset_utc);
            }
        };

        consider(self.to_utc(self.dtstart));
        for rdate in &self.rdates {
            consider(self.to_utc(*rdate));
        }

        let start = DateTime::floating(self.dtstart);
        for rule in &self.rules {
            let until_local = rule.until().map(|until| {
                if until.is_utc() {
                    until.local() + self.shift()
                } else {
                    until.local()
                }
            });
            let onsets =
                RecurrenceIter::new(rule, &start, until_local, ExpansionOptions::default());
            for onset in onsets {
                let onset_utc = self.to_utc(onset?.local());
                if onset_utc > target {
                    break;
                }
                consider(onset_utc);
            }
        }

        Ok(best.map(|b| b.and_utc()))
    }

    fn shift(&self) -> TimeDelta {
        TimeDelta::seconds(i64::from(self.offset_from.as_seconds()))
    }

    fn to_utc(&self, local: NaiveDateTime) -> NaiveDateTime {
        local - self.shift()
    }

    fn parse(component: &Component, kind: ObservanceKind) -> ExpansionResult<Self> {
        let missing =
            |name: &str| ExpansionError::InvalidComponent(format!("{kind} missing {name}"));

        let dtstart = component
            .get_property(prop_names::DTSTART)
            .and_then(Property::as_datetime)
            .ok_or_else(|| missing(prop_names::DTSTART))?
            .local();
        let offset_to = component
            .get_property(prop_names::TZOFFSETTO)
            .and_then(|p| p.value.as_utc_offset())
            .ok_or_else(|| missing(prop_names::TZOFFSETTO))?;
        let offset_from = component
            .get_property(prop_names::TZOFFSETFROM)
            .and_then(|p| p.value.as_utc_offset())
            .ok_or_else(|| missing(prop_names::TZOFFSETFROM))?;

        let rules = component
            .get_properties(prop_names::RRULE)
            .filter_map(|p| p.value.as_recur())
            .cloned()
            .collect();
        let rdates = component
            .get_properties(prop_names::RDATE)
            .filter_map(|p| p.value.to_period_list())
            .flat_map(|list| list.iter().map(|period| period.start().local()).collect::<Vec<_>>())
            .collect();
        let tzname = component
            .get_property(prop_names::TZNAME)
            .and_then(Property::as_text)
            .map(String::from);

        Ok(Self {
            kind,
            dtstart,
            offset_from,
            offset_to,
            rules,
            rdates,
            tzname,
        })
    }

    fn to_component(&self) -> Component {
        let mut component = Component::new(self.kind.component_kind());
        component.add_property(Property::datetime(
            prop_names::DTSTART,
            &DateTime::floating(self.dtstart),
        ));
        component.add_property(Property::utc_offset(prop_names::TZOFFSETFROM, self.offset_from));
        component.add_property(Property::utc_offset(prop_names::TZOFFSETTO, self.offset_to));
        for rule in &self.rules {
            component.add_property(Property::recur(prop_names::RRULE, rule));
        }
        if !self.rdates.is_empty() {
            let dates = PeriodList::from_dates(self.rdates.iter().copied().map(DateTime::floating));
            component.add_property(Property::period_list(prop_names::RDATE, &dates));
        }
        if let Some(tzname) = &self.tzname {
            component.add_property(Property::text(prop_names::TZNAME, tzname));
        }
        component
    }
}

/// A parsed VTIMEZONE component.
///
/// Equality ignores the order of observances, and a `TZURL` that differs only
/// by a trailing slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VTimezone {
    pub tzid: String,
    pub tzurl: Option<Url>,
    pub last_modified: Option<DateTime>,
    pub observances: UnorderedVec<Observance>,
}

impl VTimezone {
    /// ## Summary
    /// Parses a VTIMEZONE component.
    ///
    /// ## Errors
    /// Returns `InvalidComponent` if the component is not a VTIMEZONE, lacks
    /// a TZID, has no observances, or an observance lacks a required property.
    pub fn parse(component: &Component) -> ExpansionResult<Self> {
        if component.kind != ComponentKind::Timezone {
            return Err(ExpansionError::InvalidComponent(format!(
                "expected VTIMEZONE, found {}",
                component.name
            )));
        }

        let tzid = component
            .get_property(prop_names::TZID)
            .and_then(Property::as_text)
            .ok_or_else(|| ExpansionError::InvalidComponent("VTIMEZONE missing TZID".to_string()))?
            .to_string();

        let mut observances = UnorderedVec::new();
        for child in &component.children {
            let kind = match child.kind {
                ComponentKind::Standard => ObservanceKind::Standard,
                ComponentKind::Daylight => ObservanceKind::Daylight,
                _ => continue,
            };
            observances.push(Observance::parse(child, kind)?);
        }

        if observances.is_empty() {
            return Err(ExpansionError::InvalidComponent(format!(
                "VTIMEZONE {tzid} has no STANDARD or DAYLIGHT observance"
            )));
        }

        let tzurl = component
            .get_property(prop_names::TZURL)
            .and_then(Property::as_text)
            .and_then(|text| match Url::parse(text) {
                Ok(url) => Some(normalize_tzurl(url)),
                Err(err) => {
                    tracing::warn!(tzid = %tzid, error = %err, "Ignoring malformed TZURL");
                    None
                }
            });

        let last_modified = component
            .get_property(prop_names::LAST_MODIFIED)
            .and_then(Property::as_datetime)
            .cloned();

        Ok(Self {
            tzid,
            tzurl,
            last_modified,
            observances,
        })
    }

    /// Builds the VTIMEZONE component for this definition.
    #[must_use]
    pub fn to_component(&self) -> Component {
        let mut component = Component::new(ComponentKind::Timezone);
        component.add_property(Property::text(prop_names::TZID, &self.tzid));
        if let Some(url) = &self.tzurl {
            component.add_property(Property::uri(prop_names::TZURL, url.as_str()));
        }
        if let Some(last_modified) = &self.last_modified {
            component.add_property(Property::datetime(prop_names::LAST_MODIFIED, last_modified));
        }
        for observance in &self.observances {
            component.add_child(observance.to_component());
        }
        component
    }

    /// ## Summary
    /// Returns the UTC offset in effect at `instant`.
    ///
    /// The observance with the latest onset at or before `instant` wins.
    /// Before any onset, the earliest observance's `offset_from` applies.
    ///
    /// ## Errors
    /// Propagates failures from expanding observance rules.
    pub fn offset_at(&self, instant: chrono::DateTime<Utc>) -> ExpansionResult<UtcOffset> {
        let mut best: Option<(chrono::DateTime<Utc>, &Observance)> = None;
        for observance in &self.observances {
            if let Some(onset) = observance.latest_onset(instant)?
                && best.is_none_or(|(b, _)| onset > b)
            {
                best = Some((onset, observance));
            }
        }

        let offset = match best {
            Some((_, observance)) => observance.offset_to,
            None => self
                .observances
                .iter()
                .min_by_key(|o| o.dtstart)
                .map_or(UtcOffset::UTC, |o| o.offset_from),
        };
        Ok(offset)
    }
}

fn normalize_tzurl(mut url: Url) -> Url {
    let trimmed = url.path().trim_end_matches('/').to_string();
    if !trimmed.is_empty() {
        url.set_path(&trimmed);
    }
    url
}
