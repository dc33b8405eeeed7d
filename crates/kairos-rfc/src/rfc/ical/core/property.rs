//! iCalendar property and content line types (RFC 5545 §3.1, §3.8).

use std::hash::{Hash, Hasher};

use base64::{Engine, engine::general_purpose::STANDARD};

use super::{
    DateTime, Duration, Parameter, Period, PeriodList, RRule, UnorderedVec, UtcOffset, Value,
};
use super::parameter::names as param;

/// A raw content line as parsed from iCalendar text.
///
/// This is the low-level representation before value type resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentLine {
    /// Property name (normalized to uppercase).
    pub name: String,
    /// Parameters in order of appearance.
    pub params: Vec<Parameter>,
    /// Raw value string (after unfolding, before unescaping).
    pub raw_value: String,
}

impl ContentLine {
    /// Creates a content line with parameters.
    #[must_use]
    pub fn with_params(
        name: impl Into<String>,
        params: Vec<Parameter>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            params,
            raw_value: value.into(),
        }
    }

    /// Returns the value of a parameter.
    #[must_use]
    pub fn get_param_value(&self, name: &str) -> Option<&str> {
        find_param(&self.params, name)?.value()
    }

    /// Returns the VALUE parameter if present.
    #[must_use]
    pub fn value_type(&self) -> Option<&str> {
        self.get_param_value(param::VALUE)
    }

    /// Returns the TZID parameter if present.
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        self.get_param_value(param::TZID)
    }
}

fn find_param<'a>(params: &'a [Parameter], name: &str) -> Option<&'a Parameter> {
    params.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

/// A fully parsed iCalendar property.
///
/// The raw value is the wire form of every non-text value and is written back
/// verbatim by the serializer. Equality and hashing ignore it, since the typed
/// value carries the same content, and treat parameters as unordered.
#[derive(Debug, Clone)]
pub struct Property {
    /// Property name (normalized to uppercase).
    pub name: String,
    /// Parameters in order of appearance.
    pub params: UnorderedVec<Parameter>,
    /// Parsed value.
    pub value: Value,
    /// Original raw value string (for round-trip).
    pub raw_value: String,
}

impl PartialEq for Property {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.params == other.params && self.value == other.value
    }
}

impl Eq for Property {}

impl Hash for Property {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.params.hash(state);
        self.value.hash(state);
    }
}

impl Property {
    fn build(name: impl Into<String>, value: Value, raw_value: String) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            params: UnorderedVec::new(),
            value,
            raw_value,
        }
    }

    /// Creates a property with a text value.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        Self::build(name, Value::Text(value.clone()), value)
    }

    /// Creates a property with a comma-separated text list.
    #[must_use]
    pub fn text_list(name: impl Into<String>, values: Vec<String>) -> Self {
        let raw = values.join(",");
        Self::build(name, Value::TextList(values), raw)
    }

    /// Creates a property with an integer value.
    #[must_use]
    pub fn integer(name: impl Into<String>, value: i32) -> Self {
        Self::build(name, Value::Integer(value), value.to_string())
    }

    /// Creates a property with a URI or CAL-ADDRESS value.
    #[must_use]
    pub fn uri(name: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        Self::build(name, Value::Uri(value.clone()), value)
    }

    /// Creates a property with a date or date-time value.
    ///
    /// Dates get `VALUE=DATE` and zoned values get their `TZID`. UTC values
    /// carry the `Z` suffix and no `TZID`.
    #[must_use]
    pub fn datetime(name: impl Into<String>, dt: &DateTime) -> Self {
        let mut prop = Self::build(name, Value::DateTime(dt.clone()), dt.to_string());
        if !dt.has_time() {
            prop.params.push(Parameter::value_type("DATE"));
        }
        if let Some(tzid) = dt.tzid() {
            prop.params.push(Parameter::tzid(tzid));
        }
        prop
    }

    /// Creates an `RDATE` or `EXDATE` style property from one period list.
    #[must_use]
    pub fn period_list(name: impl Into<String>, list: &PeriodList) -> Self {
        let raw = list
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let all_instants = list.iter().all(|p| matches!(p, Period::Instant(_)));
        let value = if all_instants {
            Value::DateTimeList(list.iter().map(|p| p.start().clone()).collect())
        } else {
            Value::PeriodList(list.iter().cloned().collect())
        };

        let mut prop = Self::build(name, value, raw);
        if !all_instants {
            prop.params.push(Parameter::value_type("PERIOD"));
        } else if list.first().is_some_and(|p| !p.start().has_time()) {
            prop.params.push(Parameter::value_type("DATE"));
        }
        if let Some(tzid) = list.tzid() {
            prop.params.push(Parameter::tzid(tzid));
        }
        prop
    }

    /// Creates a property with a duration value.
    #[must_use]
    pub fn duration(name: impl Into<String>, d: Duration) -> Self {
        Self::build(name, Value::Duration(d), d.to_string())
    }

    /// Creates a property with a UTC offset value.
    #[must_use]
    pub fn utc_offset(name: impl Into<String>, offset: UtcOffset) -> Self {
        Self::build(name, Value::UtcOffset(offset), offset.to_string())
    }

    /// Creates a property with a recurrence rule value.
    #[must_use]
    pub fn recur(name: impl Into<String>, rule: &RRule) -> Self {
        Self::build(name, Value::Recur(Box::new(rule.clone())), rule.to_string())
    }

    /// Creates a base64-encoded binary property.
    #[must_use]
    pub fn binary(name: impl Into<String>, data: &[u8]) -> Self {
        let mut prop = Self::build(name, Value::Binary(data.to_vec()), STANDARD.encode(data));
        prop.params.push(Parameter::new(param::ENCODING, "BASE64"));
        prop.params.push(Parameter::value_type("BINARY"));
        prop
    }

    /// Adds a parameter and returns the property.
    #[must_use]
    pub fn with_param(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }

    /// Returns the parameter with the given name.
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&Parameter> {
        find_param(&self.params, name)
    }

    /// Returns the value of a parameter.
    #[must_use]
    pub fn get_param_value(&self, name: &str) -> Option<&str> {
        self.get_param(name)?.value()
    }

    /// Returns the value as text if it is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        self.value.as_text()
    }

    /// Returns the value as an integer if it is an integer value.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i32> {
        self.value.as_integer()
    }

    /// Returns the value as a date-time if it is a date-time value.
    #[must_use]
    pub const fn as_datetime(&self) -> Option<&DateTime> {
        self.value.as_datetime()
    }

    /// Returns the value as a duration if it is a duration value.
    #[must_use]
    pub const fn as_duration(&self) -> Option<&Duration> {
        self.value.as_duration()
    }
}

/// Property names used by the component model.
pub mod names {
    // Calendar properties
    pub const CALSCALE: &str = "CALSCALE";
    pub const METHOD: &str = "METHOD";
    pub const PRODID: &str = "PRODID";
    pub const VERSION: &str = "VERSION";

    // Descriptive properties
    pub const ATTACH: &str = "ATTACH";
    pub const CATEGORIES: &str = "CATEGORIES";
    pub const CLASS: &str = "CLASS";
    pub const COMMENT: &str = "COMMENT";
    pub const DESCRIPTION: &str = "DESCRIPTION";
    pub const LOCATION: &str = "LOCATION";
    pub const PERCENT_COMPLETE: &str = "PERCENT-COMPLETE";
    pub const PRIORITY: &str = "PRIORITY";
    pub const RESOURCES: &str = "RESOURCES";
    pub const STATUS: &str = "STATUS";
    pub const SUMMARY: &str = "SUMMARY";

    // Date and time properties
    pub const COMPLETED: &str = "COMPLETED";
    pub const DTEND: &str = "DTEND";
    pub const DUE: &str = "DUE";
    pub const DTSTART: &str = "DTSTART";
    pub const DURATION: &str = "DURATION";
    pub const FREEBUSY: &str = "FREEBUSY";
    pub const TRANSP: &str = "TRANSP";

    // Timezone properties
    pub const TZID: &str = "TZID";
    pub const TZNAME: &str = "TZNAME";
    pub const TZOFFSETFROM: &str = "TZOFFSETFROM";
    pub const TZOFFSETTO: &str = "TZOFFSETTO";
    pub const TZURL: &str = "TZURL";

    // Relationship properties
    pub const ATTENDEE: &str = "ATTENDEE";
    pub const ORGANIZER: &str = "ORGANIZER";
    pub const UID: &str = "UID";

    // Recurrence properties
    pub const EXDATE: &str = "EXDATE";
    pub const RDATE: &str = "RDATE";
    pub const RECURRENCE_ID: &str = "RECURRENCE-ID";
    pub const RRULE: &str = "RRULE";

    // Change management properties
    pub const CREATED: &str = "CREATED";
    pub const DTSTAMP: &str = "DTSTAMP";
    pub const LAST_MODIFIED: &str = "LAST-MODIFIED";
    pub const SEQUENCE: &str = "SEQUENCE";

    // Vendor busy status consulted by free/busy classification
    pub const MICROSOFT_BUSY_STATUS: &str = "X-MICROSOFT-CDO-BUSYSTATUS";
}
