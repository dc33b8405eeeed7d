//! Command implementations over calendar text.
//!
//! Each command returns a serializable report; printing is left to `main`.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use kairos_rfc::rfc::ical::expand::{ExpansionOptions, IanaResolver};
use kairos_rfc::rfc::ical::freebusy::{self, FreeBusyWindow};
use kairos_rfc::rfc::ical::model::from_ical;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OccurrenceRow {
    pub uid: String,
    pub summary: Option<String>,
    /// Start as written in the source, e.g. `20260105T090000` with its zone.
    pub start: String,
    pub tzid: Option<String>,
    pub instant: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub at: DateTime<Utc>,
    pub status: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodRow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: &'static str,
}

/// ## Summary
/// Lists occurrences of every event, todo and journal starting in
/// `[start, end)`, ordered by instant.
///
/// ## Errors
/// Returns an error if the text is not a valid calendar or expansion fails.
#[tracing::instrument(skip(input, options), fields(input_len = input.len()))]
pub fn occurrences(
    input: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    options: ExpansionOptions,
) -> Result<Vec<OccurrenceRow>> {
    let calendar = from_ical(input).context("Failed to read calendar")?;
    let resolver = calendar.resolver(IanaResolver::new());

    let mut rows = Vec::new();
    for component in &calendar.components {
        let common = component.common();
        let Some(set) = common.recurrence_set() else {
            tracing::debug!(uid = %common.uid, "Component has no start, skipping");
            continue;
        };
        let found = set
            .collect_between(start, end, &resolver, options)
            .with_context(|| format!("Failed to expand {}", common.uid))?;
        rows.extend(found.into_iter().map(|occurrence| OccurrenceRow {
            uid: common.uid.clone(),
            summary: common.summary.clone(),
            start: occurrence.start.to_string(),
            tzid: occurrence.start.tzid().map(ToString::to_string),
            instant: occurrence.instant,
            end: occurrence.end,
        }));
    }

    rows.sort_by(|a, b| a.instant.cmp(&b.instant).then_with(|| a.uid.cmp(&b.uid)));
    tracing::info!(count = rows.len(), "Occurrences listed");
    Ok(rows)
}

/// ## Summary
/// Classifies one instant against the calendar.
///
/// ## Errors
/// Returns an error if the text is not a valid calendar or expansion fails.
pub fn status_at(
    input: &str,
    at: DateTime<Utc>,
    options: ExpansionOptions,
) -> Result<StatusReport> {
    let calendar = from_ical(input).context("Failed to read calendar")?;
    let resolver = calendar.resolver(IanaResolver::new());
    let status = freebusy::classify(&calendar.components, at, &resolver, options)
        .context("Failed to classify instant")?;
    Ok(StatusReport {
        at,
        status: status.as_str(),
    })
}

/// ## Summary
/// Lists the non-free periods within `[start, end)`, where `end` defaults to
/// `default_window_days` after `start`.
///
/// ## Errors
/// Returns an error if the window is empty, the text is not a valid calendar
/// or expansion fails.
pub fn busy_periods(
    input: &str,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    default_window_days: u32,
    options: ExpansionOptions,
) -> Result<Vec<PeriodRow>> {
    let end = end.unwrap_or_else(|| start + TimeDelta::days(i64::from(default_window_days)));
    let window = FreeBusyWindow::new(start, end)?;

    let calendar = from_ical(input).context("Failed to read calendar")?;
    let resolver = calendar.resolver(IanaResolver::new());
    let periods = freebusy::busy_periods(&calendar.components, &window, &resolver, options)
        .context("Failed to compute busy periods")?;

    Ok(periods
        .into_iter()
        .map(|p| PeriodRow {
            start: p.start,
            end: p.end,
            status: p.status.as_str(),
        })
        .collect())
}
