//! iCalendar serializer (RFC 5545).
//!
//! Output is deterministic: known properties, parameters and child components
//! are written in a canonical order and everything else follows in the order
//! it was added.

use std::cmp::Ordering;

use super::escape::{escape_param_value, escape_text};
use super::fold::fold_line;
use crate::rfc::ical::core::{Component, ComponentKind, Parameter, Property, Value, prop_names};

const CALENDAR_ORDER: &[&str] = &["VERSION", "PRODID", "CALSCALE", "METHOD"];

const SCHEDULABLE_ORDER: &[&str] = &[
    "UID",
    "DTSTAMP",
    "DTSTART",
    "DTEND",
    "DUE",
    "DURATION",
    "RRULE",
    "RDATE",
    "EXDATE",
    "RECURRENCE-ID",
    "SUMMARY",
    "DESCRIPTION",
    "LOCATION",
    "CLASS",
    "STATUS",
    "PRIORITY",
    "TRANSP",
    "PERCENT-COMPLETE",
    "COMPLETED",
    "ORGANIZER",
    "ATTENDEE",
    "CATEGORIES",
    "RESOURCES",
    "COMMENT",
    "ATTACH",
    "CREATED",
    "LAST-MODIFIED",
    "SEQUENCE",
];

const TIMEZONE_ORDER: &[&str] = &["TZID", "LAST-MODIFIED", "TZURL"];

const OBSERVANCE_ORDER: &[&str] = &[
    "DTSTART",
    "TZOFFSETFROM",
    "TZOFFSETTO",
    "RRULE",
    "RDATE",
    "TZNAME",
    "COMMENT",
];

const PARAM_ORDER: &[&str] = &[
    "VALUE",
    "TZID",
    "ENCODING",
    "FMTTYPE",
    "LANGUAGE",
    "ALTREP",
    "CN",
    "DIR",
    "CUTYPE",
    "ROLE",
    "PARTSTAT",
    "RSVP",
    "DELEGATED-FROM",
    "DELEGATED-TO",
    "SENT-BY",
    "MEMBER",
    "RELATED",
    "RELTYPE",
    "FBTYPE",
    "RANGE",
];

/// Serializes a component tree to folded iCalendar text with CRLF endings.
#[must_use]
pub fn serialize(root: &Component) -> String {
    let mut out = String::new();
    write_component(&mut out, root);
    out
}

fn write_component(out: &mut String, component: &Component) {
    out.push_str(&fold_line(&format!("BEGIN:{}", component.name)));

    for prop in canonical_property_order(&component.properties, component.kind) {
        out.push_str(&serialize_property(prop));
    }
    for child in canonical_component_order(&component.children) {
        write_component(out, child);
    }

    out.push_str(&fold_line(&format!("END:{}", component.name)));
}

/// Serializes one property to a folded content line.
#[must_use]
pub fn serialize_property(prop: &Property) -> String {
    let mut line = prop.name.clone();

    for param in ordered_by_name(prop.params.as_slice(), PARAM_ORDER, |p| &p.name) {
        line.push(';');
        line.push_str(&serialize_parameter(param));
    }

    line.push(':');
    line.push_str(&serialize_value(prop));

    fold_line(&line)
}

fn serialize_parameter(param: &Parameter) -> String {
    let values: Vec<String> = param.values.iter().map(|v| escape_param_value(v)).collect();
    format!("{}={}", param.name, values.join(","))
}

/// Text is re-escaped from its decoded form; everything else keeps its wire form.
fn serialize_value(prop: &Property) -> String {
    match &prop.value {
        Value::Text(s) => escape_text(s),
        Value::TextList(list) => list
            .iter()
            .map(|s| escape_text(s))
            .collect::<Vec<_>>()
            .join(","),
        _ => prop.raw_value.clone(),
    }
}

fn canonical_property_order(props: &[Property], kind: ComponentKind) -> Vec<&Property> {
    let order = match kind {
        ComponentKind::Calendar => CALENDAR_ORDER,
        ComponentKind::Event | ComponentKind::Todo | ComponentKind::Journal => SCHEDULABLE_ORDER,
        ComponentKind::Timezone => TIMEZONE_ORDER,
        ComponentKind::Standard | ComponentKind::Daylight => OBSERVANCE_ORDER,
        ComponentKind::Other => &[],
    };
    ordered_by_name(props, order, |p| &p.name)
}

/// Known names first in table order, then the rest in their original order.
fn ordered_by_name<'a, T>(
    items: &'a [T],
    order: &[&str],
    name: impl Fn(&T) -> &str,
) -> Vec<&'a T> {
    let rank = |item: &T| {
        order
            .iter()
            .position(|known| name(item).eq_ignore_ascii_case(known))
            .unwrap_or(order.len())
    };
    let mut ordered: Vec<&T> = items.iter().collect();
    // Stable sort keeps repeated and unknown names in insertion order.
    ordered.sort_by_key(|item| rank(item));
    ordered
}

/// Timezones first, then events, todos and journals sorted by UID.
fn canonical_component_order(children: &[Component]) -> Vec<&Component> {
    let group = |c: &Component| match c.kind {
        ComponentKind::Timezone => 0,
        ComponentKind::Event => 1,
        ComponentKind::Todo => 2,
        ComponentKind::Journal => 3,
        ComponentKind::Standard | ComponentKind::Daylight | ComponentKind::Calendar => 4,
        ComponentKind::Other => 5,
    };
    let mut ordered: Vec<&Component> = children.iter().collect();
    ordered.sort_by(|a, b| {
        group(a).cmp(&group(b)).then_with(|| match group(a) {
            1..=3 => cmp_by_uid_recurrence(a, b),
            _ => Ordering::Equal,
        })
    });
    ordered
}

fn recurrence_id(component: &Component) -> &str {
    component
        .get_property(prop_names::RECURRENCE_ID)
        .map_or("", |p| p.raw_value.as_str())
}

fn cmp_by_uid_recurrence(a: &Component, b: &Component) -> Ordering {
    a.uid()
        .unwrap_or("")
        .cmp(b.uid().unwrap_or(""))
        .then_with(|| recurrence_id(a).cmp(recurrence_id(b)))
}
