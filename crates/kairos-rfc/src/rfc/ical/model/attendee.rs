//! Participants and attachments of a calendar component.

use crate::rfc::ical::core::{Parameter, Property, UnorderedVec, Value, param_names};

/// An `ATTENDEE` property (RFC 5545 §3.8.4.1).
///
/// The membership and delegation lists compare as unordered collections.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Attendee {
    /// Cal-address URI, e.g. `mailto:jane@example.com`.
    pub address: String,
    pub common_name: Option<String>,
    pub role: Option<String>,
    pub participation_status: Option<String>,
    pub rsvp: Option<bool>,
    pub calendar_user_type: Option<String>,
    pub sent_by: Option<String>,
    pub directory: Option<String>,
    pub members: UnorderedVec<String>,
    pub delegated_to: UnorderedVec<String>,
    pub delegated_from: UnorderedVec<String>,
    /// Parameters without a dedicated field.
    pub extra_params: UnorderedVec<Parameter>,
}

impl Attendee {
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// Reads an attendee from its property.
    #[must_use]
    pub fn from_property(prop: &Property) -> Self {
        let mut attendee = Self::new(prop.value.as_text().unwrap_or(&prop.raw_value));
        for param in &prop.params {
            let first = || param.value().map(ToString::to_string);
            match param.name.as_str() {
                param_names::CN => attendee.common_name = first(),
                param_names::ROLE => attendee.role = first(),
                param_names::PARTSTAT => attendee.participation_status = first(),
                param_names::RSVP => {
                    attendee.rsvp = param.value().map(|v| v.eq_ignore_ascii_case("TRUE"));
                }
                param_names::CUTYPE => attendee.calendar_user_type = first(),
                param_names::SENT_BY => attendee.sent_by = first(),
                param_names::DIR => attendee.directory = first(),
                param_names::MEMBER => attendee.members.extend(param.values.iter().cloned()),
                param_names::DELEGATED_TO => {
                    attendee.delegated_to.extend(param.values.iter().cloned());
                }
                param_names::DELEGATED_FROM => {
                    attendee.delegated_from.extend(param.values.iter().cloned());
                }
                _ => attendee.extra_params.push(param.clone()),
            }
        }
        attendee
    }

    /// Builds the property for this attendee under `name`.
    #[must_use]
    pub fn to_property(&self, name: &str) -> Property {
        let mut prop = Property::uri(name, &self.address);
        push_param(&mut prop, param_names::CN, self.common_name.as_ref());
        push_param(&mut prop, param_names::CUTYPE, self.calendar_user_type.as_ref());
        push_param(&mut prop, param_names::ROLE, self.role.as_ref());
        push_param(&mut prop, param_names::PARTSTAT, self.participation_status.as_ref());
        if let Some(rsvp) = self.rsvp {
            prop.params.push(Parameter::rsvp(rsvp));
        }
        push_param(&mut prop, param_names::SENT_BY, self.sent_by.as_ref());
        push_param(&mut prop, param_names::DIR, self.directory.as_ref());
        push_list(&mut prop, param_names::MEMBER, &self.members);
        push_list(&mut prop, param_names::DELEGATED_TO, &self.delegated_to);
        push_list(&mut prop, param_names::DELEGATED_FROM, &self.delegated_from);
        prop.params.extend(self.extra_params.iter().cloned());
        prop
    }
}

/// An `ORGANIZER` property (RFC 5545 §3.8.4.3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Organizer {
    pub address: String,
    pub common_name: Option<String>,
    pub sent_by: Option<String>,
    pub directory: Option<String>,
    pub extra_params: UnorderedVec<Parameter>,
}

impl Organizer {
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn from_property(prop: &Property) -> Self {
        let mut organizer = Self::new(prop.value.as_text().unwrap_or(&prop.raw_value));
        for param in &prop.params {
            let first = param.value().map(ToString::to_string);
            match param.name.as_str() {
                param_names::CN => organizer.common_name = first,
                param_names::SENT_BY => organizer.sent_by = first,
                param_names::DIR => organizer.directory = first,
                _ => organizer.extra_params.push(param.clone()),
            }
        }
        organizer
    }

    #[must_use]
    pub fn to_property(&self, name: &str) -> Property {
        let mut prop = Property::uri(name, &self.address);
        push_param(&mut prop, param_names::CN, self.common_name.as_ref());
        push_param(&mut prop, param_names::SENT_BY, self.sent_by.as_ref());
        push_param(&mut prop, param_names::DIR, self.directory.as_ref());
        prop.params.extend(self.extra_params.iter().cloned());
        prop
    }
}

/// An `ATTACH` property (RFC 5545 §3.8.1.1).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Attachment {
    /// A reference to external content.
    Uri {
        uri: String,
        format_type: Option<String>,
    },
    /// Inline content, BASE64 encoded on the wire.
    Binary {
        data: Vec<u8>,
        format_type: Option<String>,
    },
}

impl Attachment {
    #[must_use]
    pub fn from_property(prop: &Property) -> Self {
        let format_type = prop
            .get_param_value(param_names::FMTTYPE)
            .map(ToString::to_string);
        match &prop.value {
            Value::Binary(data) => Self::Binary {
                data: data.clone(),
                format_type,
            },
            other => Self::Uri {
                uri: other.as_text().unwrap_or(&prop.raw_value).to_string(),
                format_type,
            },
        }
    }

    #[must_use]
    pub fn to_property(&self, name: &str) -> Property {
        let (mut prop, format_type) = match self {
            Self::Uri { uri, format_type } => (Property::uri(name, uri), format_type),
            Self::Binary { data, format_type } => (Property::binary(name, data), format_type),
        };
        push_param(&mut prop, param_names::FMTTYPE, format_type.as_ref());
        prop
    }

    #[must_use]
    pub fn format_type(&self) -> Option<&str> {
        match self {
            Self::Uri { format_type, .. } | Self::Binary { format_type, .. } => {
                format_type.as_deref()
            }
        }
    }
}

fn push_param(prop: &mut Property, name: &str, value: Option<&String>) {
    if let Some(value) = value {
        prop.params.push(Parameter::new(name, value.clone()));
    }
}

fn push_list(prop: &mut Property, name: &str, values: &UnorderedVec<String>) {
    if !values.is_empty() {
        prop.params
            .push(Parameter::with_values(name, values.iter().cloned().collect()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::ical::core::prop_names;
    use crate::rfc::ical::parse::parse;

    fn first_property(input: &str, name: &str) -> Property {
        let event = format!("BEGIN:VEVENT\r\n{input}\r\nEND:VEVENT\r\n");
        parse(&event).unwrap().get_property(name).unwrap().clone()
    }

    #[test]
    fn attendee_reads_parameters() {
        let prop = first_property(
            "ATTENDEE;CN=\"Doe, Jane\";ROLE=REQ-PARTICIPANT;PARTSTAT=ACCEPTED;RSVP=TRUE;\
             DELEGATED-FROM=\"mailto:a@example.com\",\"mailto:b@example.com\";X-NUM-GUESTS=2:\
             mailto:jane@example.com",
            prop_names::ATTENDEE,
        );
        let attendee = Attendee::from_property(&prop);

        assert_eq!(attendee.address, "mailto:jane@example.com");
        assert_eq!(attendee.common_name.as_deref(), Some("Doe, Jane"));
        assert_eq!(attendee.role.as_deref(), Some("REQ-PARTICIPANT"));
        assert_eq!(attendee.participation_status.as_deref(), Some("ACCEPTED"));
        assert_eq!(attendee.rsvp, Some(true));
        assert_eq!(attendee.delegated_from.len(), 2);
        assert_eq!(attendee.extra_params.len(), 1);
    }

    #[test]
    fn attendee_survives_property_round_trip() {
        let mut attendee = Attendee::new("mailto:team@example.com");
        attendee.calendar_user_type = Some("GROUP".to_string());
        attendee.members = vec!["mailto:x@example.com".to_string()].into();
        attendee.rsvp = Some(false);

        let prop = attendee.to_property(prop_names::ATTENDEE);
        assert_eq!(Attendee::from_property(&prop), attendee);
    }

    #[test]
    fn delegation_lists_compare_unordered() {
        let mut a = Attendee::new("mailto:a@example.com");
        a.delegated_to = vec![
            "mailto:x@example.com".to_string(),
            "mailto:y@example.com".to_string(),
        ]
        .into();
        let mut b = a.clone();
        b.delegated_to = vec![
            "mailto:y@example.com".to_string(),
            "mailto:x@example.com".to_string(),
        ]
        .into();
        assert_eq!(a, b);
    }

    #[test]
    fn organizer_keeps_unknown_params() {
        let prop = first_property(
            "ORGANIZER;CN=Boss;SCHEDULE-AGENT=CLIENT:mailto:boss@example.com",
            prop_names::ORGANIZER,
        );
        let organizer = Organizer::from_property(&prop);
        assert_eq!(organizer.common_name.as_deref(), Some("Boss"));
        assert_eq!(
            Organizer::from_property(&organizer.to_property(prop_names::ORGANIZER)),
            organizer
        );
    }

    #[test]
    fn binary_attachment_round_trips() {
        let prop = first_property(
            "ATTACH;FMTTYPE=text/plain;ENCODING=BASE64;VALUE=BINARY:aGVsbG8=",
            prop_names::ATTACH,
        );
        let attachment = Attachment::from_property(&prop);
        assert_eq!(
            attachment,
            Attachment::Binary {
                data: b"hello".to_vec(),
                format_type: Some("text/plain".to_string()),
            }
        );

        let written = attachment.to_property(prop_names::ATTACH);
        assert_eq!(written.raw_value, "aGVsbG8=");
        assert_eq!(Attachment::from_property(&written), attachment);
    }

    #[test]
    fn uri_attachment_keeps_format() {
        let prop = first_property(
            "ATTACH;FMTTYPE=application/pdf:https://example.com/agenda.pdf",
            prop_names::ATTACH,
        );
        let attachment = Attachment::from_property(&prop);
        assert_eq!(attachment.format_type(), Some("application/pdf"));
        assert!(matches!(
            attachment,
            Attachment::Uri { ref uri, .. } if uri == "https://example.com/agenda.pdf"
        ));
    }
}
