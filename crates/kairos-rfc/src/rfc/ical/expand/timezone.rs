//! Time zone resolution for zoned iCalendar date-times.
//!
//! Resolution is a capability injected by the caller through [`ZoneResolver`]:
//! given a zone identifier and an absolute instant it reports the UTC offset in
//! effect. Local-to-UTC conversion is derived from that single query.
//!
//! Uses ICU4X for Windows timezone ID to IANA mapping and timezone
//! canonicalization.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{PoisonError, RwLock};

use chrono::{NaiveDateTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use icu::time::zone::WindowsParser;
use icu::time::zone::iana::IanaParserExtended;

use super::vtimezone::VTimezone;
use super::{ExpansionError, ExpansionResult};
use crate::rfc::ical::core::UtcOffset;

/// Reports the UTC offset of a zone at an instant.
pub trait ZoneResolver {
    /// Returns the offset in effect for `tzid` at `instant`.
    ///
    /// ## Errors
    /// Returns `UnresolvableZone` if the identifier is unknown.
    fn offset_at(&self, tzid: &str, instant: chrono::DateTime<Utc>) -> ExpansionResult<UtcOffset>;
}

/// Returns whether the identifier names UTC itself.
fn is_utc_alias(tzid: &str) -> bool {
    ["UTC", "Z", "GMT", "Etc/UTC", "Etc/GMT"]
        .iter()
        .any(|alias| tzid.eq_ignore_ascii_case(alias))
}

/// ## Summary
/// Converts a wall-clock value in `tzid` to the unique instant it names.
///
/// Candidate offsets are sampled a day either side of the value; a candidate
/// is kept when the zone really uses that offset at the resulting instant.
///
/// ## Errors
/// Returns `AmbiguousLocalTime` when the value is skipped by a transition
/// (no candidate) or repeated by one (two candidates), and propagates
/// `UnresolvableZone` from the resolver.
pub fn local_to_utc<R: ZoneResolver + ?Sized>(
    resolver: &R,
    local: NaiveDateTime,
    tzid: &str,
) -> ExpansionResult<chrono::DateTime<Utc>> {
    let as_utc = local.and_utc();
    let day = TimeDelta::days(1);
    let samples = [
        as_utc.checked_sub_signed(day).unwrap_or(as_utc),
        as_utc,
        as_utc.checked_add_signed(day).unwrap_or(as_utc),
    ];

    let mut offsets: Vec<UtcOffset> = Vec::with_capacity(samples.len());
    for sample in samples {
        let offset = resolver.offset_at(tzid, sample)?;
        if !offsets.contains(&offset) {
            offsets.push(offset);
        }
    }

    let mut candidates: Vec<chrono::DateTime<Utc>> = Vec::with_capacity(2);
    for offset in offsets {
        let Some(candidate) =
            as_utc.checked_sub_signed(TimeDelta::seconds(i64::from(offset.as_seconds())))
        else {
            continue;
        };
        if resolver.offset_at(tzid, candidate)? == offset && !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }

    match candidates.as_slice() {
        [instant] => Ok(*instant),
        _ => {
            tracing::debug!(
                %local,
                tzid,
                count = candidates.len(),
                "Local time does not map to one instant"
            );
            Err(ExpansionError::AmbiguousLocalTime {
                local,
                tzid: tzid.to_string(),
            })
        }
    }
}

/// Resolver with a fixed offset per zone.
///
/// Knows UTC and its aliases plus whatever zones are registered.
#[derive(Debug, Clone, Default)]
pub struct FixedOffsetResolver {
    zones: HashMap<String, UtcOffset>,
}

impl FixedOffsetResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a zone with a constant offset.
    #[must_use]
    pub fn with_zone(mut self, tzid: impl Into<String>, offset: UtcOffset) -> Self {
        self.zones.insert(tzid.into(), offset);
        self
    }
}

impl ZoneResolver for FixedOffsetResolver {
    fn offset_at(&self, tzid: &str, _instant: chrono::DateTime<Utc>) -> ExpansionResult<UtcOffset> {
        if let Some(offset) = self.zones.get(tzid) {
            return Ok(*offset);
        }
        if is_utc_alias(tzid) {
            return Ok(UtcOffset::UTC);
        }
        Err(ExpansionError::UnresolvableZone(tzid.to_string()))
    }
}

/// Resolver backed by the IANA database shipped with `chrono-tz`.
///
/// Windows zone names, vendor prefixes and renamed zones are normalized
/// through ICU before lookup. Successful lookups are cached.
#[derive(Debug, Default)]
pub struct IanaResolver {
    cache: RwLock<HashMap<String, Tz>>,
}

impl IanaResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// ## Summary
    /// Resolves a timezone identifier to a `chrono_tz::Tz`.
    ///
    /// ## Errors
    /// Returns `UnresolvableZone` if the TZID cannot be resolved.
    ///
    /// ## Side Effects
    /// Caches successful resolutions to avoid repeated parsing.
    pub fn resolve(&self, tzid: &str) -> ExpansionResult<Tz> {
        if let Some(tz) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tzid)
        {
            return Ok(*tz);
        }

        let normalized = normalize_tzid(tzid);
        let tz = Tz::from_str(&normalized).map_err(|_e| {
            tracing::debug!(tzid, normalized, "Unknown IANA timezone");
            ExpansionError::UnresolvableZone(tzid.to_string())
        })?;

        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(tzid.to_string(), tz);

        Ok(tz)
    }
}

impl ZoneResolver for IanaResolver {
    fn offset_at(&self, tzid: &str, instant: chrono::DateTime<Utc>) -> ExpansionResult<UtcOffset> {
        if is_utc_alias(tzid) {
            return Ok(UtcOffset::UTC);
        }
        let tz = self.resolve(tzid)?;
        let seconds = tz
            .offset_from_utc_datetime(&instant.naive_utc())
            .fix()
            .local_minus_utc();
        UtcOffset::from_seconds(seconds)
            .ok_or_else(|| ExpansionError::UnresolvableZone(tzid.to_string()))
    }
}

/// Normalizes common CalDAV/iCalendar timezone identifiers to IANA names.
///
/// Uses ICU4X for Windows timezone ID mapping and IANA canonicalization.
#[must_use]
pub fn normalize_tzid(tzid: &str) -> String {
    let stripped = tzid
        .strip_prefix("/mozilla.org/")
        .or_else(|| tzid.strip_prefix("/softwarestudio.org/"))
        .unwrap_or(tzid);

    let iana_parser = IanaParserExtended::new();

    let windows_parser = WindowsParser::new();
    if let Some(tz) = windows_parser.parse(stripped, None) {
        for entry in iana_parser.iter() {
            if entry.time_zone == tz {
                return entry.canonical.to_string();
            }
        }
    }

    // Handles aliases like Europe/Kiev -> Europe/Kyiv
    let parsed = iana_parser.parse(stripped);
    if parsed.time_zone != icu::time::TimeZone::UNKNOWN {
        return parsed.canonical.to_string();
    }

    stripped.to_string()
}

/// Resolver that prefers a calendar's own `VTIMEZONE` definitions and falls
/// back to another resolver for every other identifier.
#[derive(Debug, Clone, Default)]
pub struct CalendarResolver<F> {
    definitions: HashMap<String, VTimezone>,
    fallback: F,
}

impl<F: ZoneResolver> CalendarResolver<F> {
    #[must_use]
    pub fn new(fallback: F) -> Self {
        Self {
            definitions: HashMap::new(),
            fallback,
        }
    }

    /// ## Summary
    /// Registers a parsed VTIMEZONE, replacing any earlier one with its TZID.
    pub fn register(&mut self, vtimezone: VTimezone) {
        self.definitions.insert(vtimezone.tzid.clone(), vtimezone);
    }

    /// Returns whether a definition exists for `tzid`.
    #[must_use]
    pub fn has_definition(&self, tzid: &str) -> bool {
        self.definitions.contains_key(tzid)
    }
}

impl<F: ZoneResolver> ZoneResolver for CalendarResolver<F> {
    fn offset_at(&self, tzid: &str, instant: chrono::DateTime<Utc>) -> ExpansionResult<UtcOffset> {
        match self.definitions.get(tzid) {
            Some(vtimezone) => vtimezone.offset_at(instant),
            None => self.fallback.offset_at(tzid, instant),
        }
    }
}
