//! Events, todos and journals.

use std::hash::{Hash, Hasher};

use chrono::TimeDelta;

use super::attendee::{Attachment, Attendee, Organizer};
use crate::error::{RfcError, RfcResult};
use crate::rfc::ical::core::{
    Component, ComponentKind, DateTime, Duration, PeriodList, Property, RRule, UnorderedVec,
    Value, prop_names,
};
use crate::rfc::ical::expand::{ExpansionError, ExpansionResult, RecurrenceSet, ZoneResolver};

/// Fields shared by every recurring component kind.
///
/// Equality and hashing are structural: every collection compares as a
/// multiset, and the bookkeeping fields `uid` and `dt_stamp` are ignored.
#[derive(Debug, Clone)]
pub struct RecurringComponent {
    pub uid: String,
    /// Required for events, optional for todos and journals.
    pub start: Option<DateTime>,
    dt_stamp: DateTime,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub class: Option<String>,
    pub status: Option<String>,
    pub sequence: Option<i32>,
    pub created: Option<DateTime>,
    pub last_modified: Option<DateTime>,
    pub recurrence_rules: UnorderedVec<RRule>,
    pub recurrence_dates: UnorderedVec<PeriodList>,
    pub exception_dates: UnorderedVec<PeriodList>,
    pub attachments: UnorderedVec<Attachment>,
    pub attendees: UnorderedVec<Attendee>,
    pub organizer: Option<Organizer>,
    pub categories: UnorderedVec<String>,
    pub resources: UnorderedVec<String>,
    pub comments: UnorderedVec<String>,
    /// Properties without a dedicated field, kept as parsed.
    pub extra_properties: UnorderedVec<Property>,
    /// Nested components such as VALARM, kept as generic trees.
    pub sub_components: UnorderedVec<Component>,
}

impl RecurringComponent {
    /// Creates a component with a fresh UUID v4 `uid` and a `dt_stamp` of now.
    #[must_use]
    pub fn new(start: Option<DateTime>) -> Self {
        Self {
            uid: uuid::Uuid::new_v4().to_string(),
            ..Self::blank(start)
        }
    }

    fn blank(start: Option<DateTime>) -> Self {
        Self {
            uid: String::new(),
            start,
            dt_stamp: DateTime::now_utc(),
            summary: None,
            description: None,
            location: None,
            class: None,
            status: None,
            sequence: None,
            created: None,
            last_modified: None,
            recurrence_rules: UnorderedVec::new(),
            recurrence_dates: UnorderedVec::new(),
            exception_dates: UnorderedVec::new(),
            attachments: UnorderedVec::new(),
            attendees: UnorderedVec::new(),
            organizer: None,
            categories: UnorderedVec::new(),
            resources: UnorderedVec::new(),
            comments: UnorderedVec::new(),
            extra_properties: UnorderedVec::new(),
            sub_components: UnorderedVec::new(),
        }
    }

    #[must_use]
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = uid.into();
        self
    }

    #[must_use]
    pub fn with_rule(mut self, rule: RRule) -> Self {
        self.recurrence_rules.push(rule);
        self
    }

    /// Returns the `DTSTAMP`, always in UTC form.
    #[must_use]
    pub const fn dt_stamp(&self) -> &DateTime {
        &self.dt_stamp
    }

    /// ## Summary
    /// Replaces the `DTSTAMP`, converting it to UTC form.
    ///
    /// ## Errors
    /// Returns an error if a zoned value cannot be resolved.
    pub fn set_dt_stamp<R: ZoneResolver + ?Sized>(
        &mut self,
        value: &DateTime,
        resolver: &R,
    ) -> ExpansionResult<()> {
        self.dt_stamp = value.as_utc(resolver)?;
        Ok(())
    }

    /// Adds a single `EXDATE` value.
    pub fn add_exception_date(&mut self, date: DateTime) {
        self.exception_dates.push(PeriodList::from_dates([date]));
    }

    /// Adds a single `RDATE` value.
    pub fn add_recurrence_date(&mut self, date: DateTime) {
        self.recurrence_dates.push(PeriodList::from_dates([date]));
    }

    /// Returns the recurrence set view, or `None` without a start.
    #[must_use]
    pub fn recurrence_set(&self) -> Option<RecurrenceSet<'_>> {
        let start = self.start.as_ref()?;
        Some(
            RecurrenceSet::new(start)
                .with_rules(&self.recurrence_rules)
                .with_rdates(&self.recurrence_dates)
                .with_exdates(&self.exception_dates),
        )
    }

    /// Takes a property into its field. Returns `false` for properties this
    /// aggregate has no field for, or whose value has an unexpected type.
    fn absorb<R: ZoneResolver + ?Sized>(
        &mut self,
        prop: &Property,
        resolver: &R,
    ) -> ExpansionResult<bool> {
        // Text with LANGUAGE, ALTREP or other parameters stays whole in
        // `extra_properties`.
        let plain = prop.params.is_empty();
        let text = || prop.as_text().filter(|_| plain).map(ToString::to_string);
        let datetime = || prop.as_datetime().cloned();

        let slot = match prop.name.as_str() {
            prop_names::UID => match prop.as_text() {
                Some(uid) => {
                    self.uid = uid.to_string();
                    true
                }
                None => false,
            },
            prop_names::DTSTAMP => match prop.as_datetime() {
                Some(stamp) => {
                    self.set_dt_stamp(stamp, resolver)?;
                    true
                }
                None => false,
            },
            prop_names::DTSTART => set_once(&mut self.start, datetime()),
            prop_names::SUMMARY => set_once(&mut self.summary, text()),
            prop_names::DESCRIPTION => set_once(&mut self.description, text()),
            prop_names::LOCATION => set_once(&mut self.location, text()),
            prop_names::CLASS => set_once(&mut self.class, text()),
            prop_names::STATUS => set_once(&mut self.status, text()),
            prop_names::SEQUENCE => set_once(&mut self.sequence, prop.as_integer()),
            prop_names::CREATED => set_once(&mut self.created, datetime()),
            prop_names::LAST_MODIFIED => set_once(&mut self.last_modified, datetime()),
            prop_names::RRULE => match prop.value.as_recur() {
                Some(rule) => {
                    self.recurrence_rules.push(rule.clone());
                    true
                }
                None => false,
            },
            prop_names::RDATE => push_list(&mut self.recurrence_dates, &prop.value),
            prop_names::EXDATE => push_list(&mut self.exception_dates, &prop.value),
            prop_names::ATTACH => {
                self.attachments.push(Attachment::from_property(prop));
                true
            }
            prop_names::ATTENDEE => {
                self.attendees.push(Attendee::from_property(prop));
                true
            }
            prop_names::ORGANIZER => {
                set_once(&mut self.organizer, Some(Organizer::from_property(prop)))
            }
            prop_names::CATEGORIES if plain => extend_text(&mut self.categories, &prop.value),
            prop_names::RESOURCES if plain => extend_text(&mut self.resources, &prop.value),
            prop_names::COMMENT if plain => match prop.as_text() {
                Some(comment) => {
                    self.comments.push(comment.to_string());
                    true
                }
                None => false,
            },
            _ => false,
        };
        Ok(slot)
    }

    fn write_into(&self, component: &mut Component) {
        component.add_property(Property::text(prop_names::UID, &self.uid));
        component.add_property(Property::datetime(prop_names::DTSTAMP, &self.dt_stamp));
        if let Some(start) = &self.start {
            component.add_property(Property::datetime(prop_names::DTSTART, start));
        }
        for rule in &self.recurrence_rules {
            component.add_property(Property::recur(prop_names::RRULE, rule));
        }
        for list in &self.recurrence_dates {
            component.add_property(Property::period_list(prop_names::RDATE, list));
        }
        for list in &self.exception_dates {
            component.add_property(Property::period_list(prop_names::EXDATE, list));
        }

        let texts = [
            (prop_names::SUMMARY, &self.summary),
            (prop_names::DESCRIPTION, &self.description),
            (prop_names::LOCATION, &self.location),
            (prop_names::CLASS, &self.class),
            (prop_names::STATUS, &self.status),
        ];
        for (name, value) in texts {
            if let Some(value) = value {
                component.add_property(Property::text(name, value));
            }
        }
        if let Some(sequence) = self.sequence {
            component.add_property(Property::integer(prop_names::SEQUENCE, sequence));
        }
        if let Some(created) = &self.created {
            component.add_property(Property::datetime(prop_names::CREATED, created));
        }
        if let Some(last_modified) = &self.last_modified {
            component.add_property(Property::datetime(prop_names::LAST_MODIFIED, last_modified));
        }

        if let Some(organizer) = &self.organizer {
            component.add_property(organizer.to_property(prop_names::ORGANIZER));
        }
        for attendee in &self.attendees {
            component.add_property(attendee.to_property(prop_names::ATTENDEE));
        }
        for attachment in &self.attachments {
            component.add_property(attachment.to_property(prop_names::ATTACH));
        }
        if !self.categories.is_empty() {
            component.add_property(Property::text_list(
                prop_names::CATEGORIES,
                self.categories.to_vec(),
            ));
        }
        if !self.resources.is_empty() {
            component.add_property(Property::text_list(
                prop_names::RESOURCES,
                self.resources.to_vec(),
            ));
        }
        for comment in &self.comments {
            component.add_property(Property::text(prop_names::COMMENT, comment));
        }

        component.properties.extend(self.extra_properties.iter().cloned());
        component.children.extend(self.sub_components.iter().cloned());
    }
}

fn set_once<T>(slot: &mut Option<T>, value: Option<T>) -> bool {
    if slot.is_some() || value.is_none() {
        return false;
    }
    *slot = value;
    true
}

fn push_list(lists: &mut UnorderedVec<PeriodList>, value: &Value) -> bool {
    match value.to_period_list() {
        Some(list) => {
            lists.push(list);
            true
        }
        None => false,
    }
}

fn extend_text(values: &mut UnorderedVec<String>, value: &Value) -> bool {
    match value {
        Value::TextList(items) => values.extend(items.iter().cloned()),
        Value::Text(item) => values.push(item.clone()),
        _ => return false,
    }
    true
}

impl PartialEq for RecurringComponent {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start
            && self.summary == other.summary
            && self.description == other.description
            && self.location == other.location
            && self.class == other.class
            && self.status == other.status
            && self.sequence == other.sequence
            && self.created == other.created
            && self.last_modified == other.last_modified
            && self.recurrence_rules == other.recurrence_rules
            && self.recurrence_dates == other.recurrence_dates
            && self.exception_dates == other.exception_dates
            && self.attachments == other.attachments
            && self.attendees == other.attendees
            && self.organizer == other.organizer
            && self.categories == other.categories
            && self.resources == other.resources
            && self.comments == other.comments
            && self.extra_properties == other.extra_properties
            && self.sub_components == other.sub_components
    }
}

impl Eq for RecurringComponent {}

impl Hash for RecurringComponent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.start.hash(state);
        self.summary.hash(state);
        self.description.hash(state);
        self.location.hash(state);
        self.class.hash(state);
        self.status.hash(state);
        self.sequence.hash(state);
        self.created.hash(state);
        self.last_modified.hash(state);
        self.recurrence_rules.hash(state);
        self.recurrence_dates.hash(state);
        self.exception_dates.hash(state);
        self.attachments.hash(state);
        self.attendees.hash(state);
        self.organizer.hash(state);
        self.categories.hash(state);
        self.resources.hash(state);
        self.comments.hash(state);
        self.extra_properties.hash(state);
        self.sub_components.hash(state);
    }
}

/// A schedulable component: the shared aggregate plus kind-specific fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CalendarComponent {
    Event {
        common: RecurringComponent,
        end: Option<DateTime>,
        duration: Option<Duration>,
        /// `OPAQUE` or `TRANSPARENT`.
        transparency: Option<String>,
    },
    Todo {
        common: RecurringComponent,
        due: Option<DateTime>,
        duration: Option<Duration>,
        completed: Option<DateTime>,
        percent_complete: Option<i32>,
        priority: Option<i32>,
    },
    Journal {
        common: RecurringComponent,
    },
}

impl CalendarComponent {
    #[must_use]
    pub const fn event(common: RecurringComponent) -> Self {
        Self::Event {
            common,
            end: None,
            duration: None,
            transparency: None,
        }
    }

    #[must_use]
    pub const fn todo(common: RecurringComponent) -> Self {
        Self::Todo {
            common,
            due: None,
            duration: None,
            completed: None,
            percent_complete: None,
            priority: None,
        }
    }

    #[must_use]
    pub const fn journal(common: RecurringComponent) -> Self {
        Self::Journal { common }
    }

    #[must_use]
    pub const fn kind(&self) -> ComponentKind {
        match self {
            Self::Event { .. } => ComponentKind::Event,
            Self::Todo { .. } => ComponentKind::Todo,
            Self::Journal { .. } => ComponentKind::Journal,
        }
    }

    #[must_use]
    pub const fn common(&self) -> &RecurringComponent {
        match self {
            Self::Event { common, .. } | Self::Todo { common, .. } | Self::Journal { common } => {
                common
            }
        }
    }

    pub const fn common_mut(&mut self) -> &mut RecurringComponent {
        match self {
            Self::Event { common, .. } | Self::Todo { common, .. } | Self::Journal { common } => {
                common
            }
        }
    }

    /// ## Summary
    /// Returns the span each occurrence covers.
    ///
    /// The end (`DTEND` or `DUE`) minus the start wins, then `DURATION`.
    /// Otherwise a DATE start spans one day and a DATE-TIME start spans
    /// nothing. Negative spans are clamped to zero.
    ///
    /// ## Errors
    /// Returns an error if the start or end cannot be resolved to UTC.
    pub fn extent<R: ZoneResolver + ?Sized>(&self, resolver: &R) -> ExpansionResult<TimeDelta> {
        let Some(start) = &self.common().start else {
            return Ok(TimeDelta::zero());
        };
        let (end, duration) = match self {
            Self::Event { end, duration, .. } => (end.as_ref(), duration.as_ref()),
            Self::Todo { due, duration, .. } => (due.as_ref(), duration.as_ref()),
            Self::Journal { .. } => (None, None),
        };

        let span = match (end, duration) {
            (Some(end), _) => end.instant(resolver)? - start.instant(resolver)?,
            (None, Some(duration)) => duration.to_time_delta(),
            (None, None) if start.has_time() => TimeDelta::zero(),
            (None, None) => TimeDelta::days(1),
        };
        Ok(span.max(TimeDelta::zero()))
    }

    /// ## Summary
    /// Reads a VEVENT, VTODO or VJOURNAL.
    ///
    /// `DTSTAMP` is normalized to UTC through `resolver`; when absent it is
    /// set to now.
    ///
    /// ## Errors
    /// Returns `MissingProperty` without a `UID`, or an event without a
    /// `DTSTART`. Returns an expansion error for other component kinds or
    /// an unresolvable `DTSTAMP` zone.
    pub fn from_component<R: ZoneResolver + ?Sized>(
        component: &Component,
        resolver: &R,
    ) -> RfcResult<Self> {
        let mut common = RecurringComponent::blank(None);
        let mut parsed = match component.kind {
            ComponentKind::Event => Self::event(RecurringComponent::blank(None)),
            ComponentKind::Todo => Self::todo(RecurringComponent::blank(None)),
            ComponentKind::Journal => Self::journal(RecurringComponent::blank(None)),
            _ => {
                return Err(ExpansionError::InvalidComponent(format!(
                    "{} is not an event, todo or journal",
                    component.name
                ))
                .into());
            }
        };

        let mut uid_seen = false;
        for prop in &component.properties {
            uid_seen |= prop.name == prop_names::UID;
            if common.absorb(prop, resolver)? || parsed.absorb_specific(prop) {
                continue;
            }
            common.extra_properties.push(prop.clone());
        }
        common.sub_components = component.children.iter().cloned().collect();

        let missing = |property| RfcError::MissingProperty {
            component: component.name.clone(),
            property,
        };
        if !uid_seen {
            return Err(missing(prop_names::UID));
        }
        if component.kind == ComponentKind::Event && common.start.is_none() {
            return Err(missing(prop_names::DTSTART));
        }

        *parsed.common_mut() = common;
        Ok(parsed)
    }

    fn absorb_specific(&mut self, prop: &Property) -> bool {
        let datetime = || prop.as_datetime().cloned();
        let duration = || prop.as_duration().copied();
        match (self, prop.name.as_str()) {
            (Self::Event { end, .. }, prop_names::DTEND) => set_once(end, datetime()),
            (
                Self::Event { duration: d, .. } | Self::Todo { duration: d, .. },
                prop_names::DURATION,
            ) => set_once(d, duration()),
            (Self::Event { transparency, .. }, prop_names::TRANSP) => {
                set_once(transparency, prop.as_text().map(ToString::to_string))
            }
            (Self::Todo { due, .. }, prop_names::DUE) => set_once(due, datetime()),
            (Self::Todo { completed, .. }, prop_names::COMPLETED) => {
                set_once(completed, datetime())
            }
            (Self::Todo { percent_complete, .. }, prop_names::PERCENT_COMPLETE) => {
                set_once(percent_complete, prop.as_integer())
            }
            (Self::Todo { priority, .. }, prop_names::PRIORITY) => {
                set_once(priority, prop.as_integer())
            }
            _ => false,
        }
    }

    /// Builds the generic component tree for serialization.
    #[must_use]
    pub fn to_component(&self) -> Component {
        let mut component = Component::new(self.kind());
        self.common().write_into(&mut component);

        match self {
            Self::Event {
                end,
                duration,
                transparency,
                ..
            } => {
                if let Some(end) = end {
                    component.add_property(Property::datetime(prop_names::DTEND, end));
                }
                if let Some(duration) = duration {
                    component.add_property(Property::duration(prop_names::DURATION, *duration));
                }
                if let Some(transparency) = transparency {
                    component.add_property(Property::text(prop_names::TRANSP, transparency));
                }
            }
            Self::Todo {
                due,
                duration,
                completed,
                percent_complete,
                priority,
                ..
            } => {
                if let Some(due) = due {
                    component.add_property(Property::datetime(prop_names::DUE, due));
                }
                if let Some(duration) = duration {
                    component.add_property(Property::duration(prop_names::DURATION, *duration));
                }
                if let Some(completed) = completed {
                    component.add_property(Property::datetime(prop_names::COMPLETED, completed));
                }
                if let Some(percent) = percent_complete {
                    component.add_property(Property::integer(
                        prop_names::PERCENT_COMPLETE,
                        *percent,
                    ));
                }
                if let Some(priority) = priority {
                    component.add_property(Property::integer(prop_names::PRIORITY, *priority));
                }
            }
            Self::Journal { .. } => {}
        }
        component
    }
}

#[cfg(test)]
#[path = "component_tests.rs"]
mod tests;
