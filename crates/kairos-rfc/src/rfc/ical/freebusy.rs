//! Free/busy time derived from expanded occurrences (RFC 5545 §3.2.9, §3.8.2.7).
//!
//! Every occurrence covers the half-open interval `[start, start + extent)`,
//! so a query exactly at an occurrence's start is inside it and a query
//! exactly at its end is not.

use std::fmt;
use std::ops::ControlFlow;

use chrono::Utc;
use kairos_core::error::CoreError;

use crate::error::RfcResult;
use crate::rfc::ical::core::{DateTime, Period, Property, prop_names};
use crate::rfc::ical::expand::{ExpansionError, ExpansionOptions, ZoneResolver};
use crate::rfc::ical::model::CalendarComponent;

/// Free/busy classification of a point in time.
///
/// Ordered by precedence: when several occurrences cover an instant the
/// greatest status wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FreeBusyStatus {
    Free,
    Tentative,
    Unavailable,
    Busy,
}

impl FreeBusyStatus {
    /// Returns the `FBTYPE` value for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "FREE",
            Self::Tentative => "BUSY-TENTATIVE",
            Self::Unavailable => "BUSY-UNAVAILABLE",
            Self::Busy => "BUSY",
        }
    }

    /// Returns the status a component's occurrences impose.
    ///
    /// Only events block time. Transparent and cancelled events are free.
    #[must_use]
    pub fn of(component: &CalendarComponent) -> Self {
        let CalendarComponent::Event {
            common,
            transparency,
            ..
        } = component
        else {
            return Self::Free;
        };

        if transparency
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("TRANSPARENT"))
        {
            return Self::Free;
        }

        let vendor = common
            .extra_properties
            .iter()
            .find(|p| p.name == prop_names::MICROSOFT_BUSY_STATUS)
            .and_then(Property::as_text);
        match vendor.map(str::to_ascii_uppercase).as_deref() {
            Some("FREE") => return Self::Free,
            Some("TENTATIVE") => return Self::Tentative,
            Some("OOF" | "BUSY-UNAVAILABLE") => return Self::Unavailable,
            _ => {}
        }

        match common.status.as_deref().map(str::to_ascii_uppercase).as_deref() {
            Some("CANCELLED") => Self::Free,
            Some("TENTATIVE") => Self::Tentative,
            _ => Self::Busy,
        }
    }
}

impl fmt::Display for FreeBusyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A half-open query window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeBusyWindow {
    start: chrono::DateTime<Utc>,
    end: chrono::DateTime<Utc>,
}

impl FreeBusyWindow {
    /// ## Summary
    /// Creates a window.
    ///
    /// ## Errors
    /// Returns `InvalidInput` unless `start` is before `end`.
    pub fn new(start: chrono::DateTime<Utc>, end: chrono::DateTime<Utc>) -> RfcResult<Self> {
        if start >= end {
            return Err(CoreError::InvalidInput(format!(
                "free/busy window start {start} is not before end {end}"
            ))
            .into());
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub const fn start(&self) -> chrono::DateTime<Utc> {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> chrono::DateTime<Utc> {
        self.end
    }

    /// Clips `[start, end)` to the window. Empty results are `None`.
    fn clip(
        &self,
        start: chrono::DateTime<Utc>,
        end: chrono::DateTime<Utc>,
    ) -> Option<(chrono::DateTime<Utc>, chrono::DateTime<Utc>)> {
        let start = start.max(self.start);
        let end = end.min(self.end);
        (start < end).then_some((start, end))
    }
}

/// A busy interval with its status, as reported by [`busy_periods`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FreeBusyPeriod {
    pub start: chrono::DateTime<Utc>,
    pub end: chrono::DateTime<Utc>,
    pub status: FreeBusyStatus,
}

/// Feeds the resolved `[start, end)` spans of a component's occurrences to
/// `visit` in ascending order of start until it breaks. Zero-length spans are
/// dropped, as are occurrences skipped or repeated by a zone transition.
fn for_each_span<R, F>(
    component: &CalendarComponent,
    resolver: &R,
    options: ExpansionOptions,
    mut visit: F,
) -> RfcResult<()>
where
    R: ZoneResolver + ?Sized,
    F: FnMut(chrono::DateTime<Utc>, chrono::DateTime<Utc>) -> ControlFlow<()>,
{
    let Some(set) = component.common().recurrence_set() else {
        return Ok(());
    };
    let extent = component.extent(resolver)?;

    for occurrence in set.occurrences(resolver, options)? {
        let occurrence = match occurrence {
            Ok(occurrence) => occurrence,
            Err(ExpansionError::AmbiguousLocalTime { local, tzid }) => {
                tracing::warn!(
                    %local,
                    tzid = %tzid,
                    "Skipping occurrence with no single instant"
                );
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        let end = occurrence
            .end
            .unwrap_or_else(|| occurrence.instant + extent);
        if end > occurrence.instant && visit(occurrence.instant, end).is_break() {
            break;
        }
    }
    Ok(())
}

/// ## Summary
/// Returns the occurrences of `component` that intersect `window`, clipped
/// to it, in ascending order.
///
/// Zero-length occurrences are omitted, as are components without a start.
///
/// ## Errors
/// Returns an error if expansion fails or a zone cannot be resolved.
#[tracing::instrument(skip(component, resolver, options), fields(uid = %component.common().uid))]
pub fn expand<R: ZoneResolver + ?Sized>(
    component: &CalendarComponent,
    window: &FreeBusyWindow,
    resolver: &R,
    options: ExpansionOptions,
) -> RfcResult<Vec<Period>> {
    let mut periods = Vec::new();
    for_each_span(component, resolver, options, |start, end| {
        if start >= window.end {
            return ControlFlow::Break(());
        }
        let Some((start, end)) = window.clip(start, end) else {
            return ControlFlow::Continue(());
        };
        if periods.len() >= options.max_instances {
            tracing::warn!(limit = options.max_instances, "Period limit reached, truncating");
            return ControlFlow::Break(());
        }
        periods.push(Period::explicit(
            DateTime::from_instant(start),
            DateTime::from_instant(end),
        ));
        ControlFlow::Continue(())
    })?;
    tracing::debug!(count = periods.len(), "Expanded free/busy periods");
    Ok(periods)
}

/// ## Summary
/// Classifies `instant` against a set of components.
///
/// An occurrence covers `[start, end)`. Among covering occurrences the
/// highest-precedence status wins; with none the instant is free.
///
/// ## Errors
/// Returns an error if expansion fails or a zone cannot be resolved.
#[tracing::instrument(skip(components, resolver, options))]
pub fn classify<'c, R: ZoneResolver + ?Sized>(
    components: impl IntoIterator<Item = &'c CalendarComponent>,
    instant: chrono::DateTime<Utc>,
    resolver: &R,
    options: ExpansionOptions,
) -> RfcResult<FreeBusyStatus> {
    let mut status = FreeBusyStatus::Free;

    for component in components {
        let imposed = FreeBusyStatus::of(component);
        if imposed <= status {
            continue;
        }
        let mut covered = false;
        for_each_span(component, resolver, options, |start, end| {
            if start > instant {
                return ControlFlow::Break(());
            }
            covered = instant < end;
            if covered {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })?;
        if covered {
            tracing::trace!(uid = %component.common().uid, %imposed, "Instant covered");
            status = imposed;
        }
        if status == FreeBusyStatus::Busy {
            break;
        }
    }
    Ok(status)
}

/// ## Summary
/// Returns the non-free time of `components` within `window`.
///
/// At most `options.max_instances` periods are taken from each component.
/// Overlapping or touching periods of the same status are merged. The result
/// is ordered by start, then by status.
///
/// ## Errors
/// Returns an error if expansion fails or a zone cannot be resolved.
#[tracing::instrument(skip(components, resolver, options))]
pub fn busy_periods<'c, R: ZoneResolver + ?Sized>(
    components: impl IntoIterator<Item = &'c CalendarComponent>,
    window: &FreeBusyWindow,
    resolver: &R,
    options: ExpansionOptions,
) -> RfcResult<Vec<FreeBusyPeriod>> {
    let mut periods = Vec::new();
    for component in components {
        let status = FreeBusyStatus::of(component);
        if status == FreeBusyStatus::Free {
            continue;
        }
        let mut found = 0;
        for_each_span(component, resolver, options, |start, end| {
            if start >= window.end {
                return ControlFlow::Break(());
            }
            let Some((start, end)) = window.clip(start, end) else {
                return ControlFlow::Continue(());
            };
            if found >= options.max_instances {
                tracing::warn!(limit = options.max_instances, "Period limit reached, truncating");
                return ControlFlow::Break(());
            }
            found += 1;
            periods.push(FreeBusyPeriod { start, end, status });
            ControlFlow::Continue(())
        })?;
    }

    periods.sort_by_key(|p| (p.status, p.start));
    let mut merged: Vec<FreeBusyPeriod> = Vec::with_capacity(periods.len());
    for period in periods {
        match merged.last_mut() {
            Some(last) if last.status == period.status && period.start <= last.end => {
                last.end = last.end.max(period.end);
            }
            _ => merged.push(period),
        }
    }
    merged.sort_by_key(|p| (p.start, p.status));

    tracing::debug!(count = merged.len(), "Computed busy periods");
    Ok(merged)
}

#[cfg(test)]
#[path = "freebusy_tests.rs"]
mod tests;
