//! The VCALENDAR container and its conversion to and from text.

use kairos_core::constants::{ICALENDAR_VERSION, PRODID};

use super::component::CalendarComponent;
use crate::error::{RfcError, RfcResult};
use crate::rfc::ical::build::serialize;
use crate::rfc::ical::core::{Component, ComponentKind, Property, UnorderedVec, prop_names};
use crate::rfc::ical::expand::{CalendarResolver, IanaResolver, VTimezone, ZoneResolver};
use crate::rfc::ical::parse::{ParseError, ParseErrorKind, parse};

/// A calendar object (RFC 5545 §3.4).
///
/// Components, timezones and leftovers compare as unordered collections.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Calendar {
    pub prodid: String,
    pub version: String,
    pub method: Option<String>,
    pub calscale: Option<String>,
    pub components: UnorderedVec<CalendarComponent>,
    pub timezones: UnorderedVec<VTimezone>,
    /// Calendar properties without a dedicated field.
    pub extra_properties: UnorderedVec<Property>,
    /// Components other than events, todos, journals and timezones.
    pub extra_components: UnorderedVec<Component>,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::new()
    }
}

impl Calendar {
    /// Creates an empty calendar stamped with this product's `PRODID`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            prodid: PRODID.to_string(),
            version: ICALENDAR_VERSION.to_string(),
            method: None,
            calscale: None,
            components: UnorderedVec::new(),
            timezones: UnorderedVec::new(),
            extra_properties: UnorderedVec::new(),
            extra_components: UnorderedVec::new(),
        }
    }

    pub fn add_component(&mut self, component: CalendarComponent) {
        self.components.push(component);
    }

    /// Returns the events of this calendar.
    pub fn events(&self) -> impl Iterator<Item = &CalendarComponent> {
        self.components
            .iter()
            .filter(|c| c.kind() == ComponentKind::Event)
    }

    /// Returns a resolver that knows this calendar's VTIMEZONE definitions
    /// and defers to `fallback` for other zones.
    #[must_use]
    pub fn resolver<F: ZoneResolver>(&self, fallback: F) -> CalendarResolver<F> {
        let mut resolver = CalendarResolver::new(fallback);
        for vtimezone in &self.timezones {
            resolver.register(vtimezone.clone());
        }
        resolver
    }

    /// ## Summary
    /// Reads a calendar from a parsed VCALENDAR tree.
    ///
    /// Timezones are read first so a zoned `DTSTAMP` can be normalized to
    /// UTC against them, with the IANA database as fallback.
    ///
    /// ## Errors
    /// Returns an error if the root is not a VCALENDAR, `PRODID` or `VERSION`
    /// is missing, or a child component cannot be read.
    pub fn from_component(root: &Component) -> RfcResult<Self> {
        if root.kind != ComponentKind::Calendar {
            return Err(ParseError::new(ParseErrorKind::InvalidNesting, 1, 1)
                .with_context(format!("expected VCALENDAR, found {}", root.name))
                .into());
        }

        let mut calendar = Self::new();
        let mut prodid = None;
        let mut version = None;
        for prop in &root.properties {
            let text = prop.as_text().map(ToString::to_string);
            match prop.name.as_str() {
                prop_names::PRODID if text.is_some() => prodid = text,
                prop_names::VERSION if text.is_some() => version = text,
                prop_names::METHOD if text.is_some() => calendar.method = text,
                prop_names::CALSCALE if text.is_some() => calendar.calscale = text,
                _ => calendar.extra_properties.push(prop.clone()),
            }
        }

        let missing = |property| RfcError::MissingProperty {
            component: root.name.clone(),
            property,
        };
        calendar.prodid = prodid.ok_or_else(|| missing(prop_names::PRODID))?;
        calendar.version = version.ok_or_else(|| missing(prop_names::VERSION))?;

        for child in root.children_of_kind(ComponentKind::Timezone) {
            calendar.timezones.push(VTimezone::parse(child)?);
        }

        let resolver = calendar.resolver(IanaResolver::new());
        for child in &root.children {
            match child.kind {
                ComponentKind::Event | ComponentKind::Todo | ComponentKind::Journal => {
                    let component = CalendarComponent::from_component(child, &resolver)?;
                    calendar.components.push(component);
                }
                ComponentKind::Timezone => {}
                _ => calendar.extra_components.push(child.clone()),
            }
        }

        tracing::debug!(
            components = calendar.components.len(),
            timezones = calendar.timezones.len(),
            "Calendar read"
        );
        Ok(calendar)
    }

    /// Builds the generic VCALENDAR tree for serialization.
    #[must_use]
    pub fn to_component(&self) -> Component {
        let mut root = Component::new(ComponentKind::Calendar);
        root.add_property(Property::text(prop_names::VERSION, &self.version));
        root.add_property(Property::text(prop_names::PRODID, &self.prodid));
        if let Some(calscale) = &self.calscale {
            root.add_property(Property::text(prop_names::CALSCALE, calscale));
        }
        if let Some(method) = &self.method {
            root.add_property(Property::text(prop_names::METHOD, method));
        }
        root.properties.extend(self.extra_properties.iter().cloned());

        for vtimezone in &self.timezones {
            root.add_child(vtimezone.to_component());
        }
        for component in &self.components {
            root.add_child(component.to_component());
        }
        root.children.extend(self.extra_components.iter().cloned());
        root
    }
}

/// ## Summary
/// Parses iCalendar text into a typed [`Calendar`].
///
/// ## Errors
/// Returns a parse error for malformed text, or any error of
/// [`Calendar::from_component`].
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
pub fn from_ical(input: &str) -> RfcResult<Calendar> {
    let root = parse(input)?;
    Calendar::from_component(&root)
}

/// Serializes a typed [`Calendar`] to folded iCalendar text.
#[must_use]
pub fn to_ical(calendar: &Calendar) -> String {
    serialize(&calendar.to_component())
}
