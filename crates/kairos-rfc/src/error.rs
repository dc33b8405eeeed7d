use thiserror::Error;

use crate::rfc::ical::expand::ExpansionError;
use crate::rfc::ical::parse::ParseError;

/// Errors surfaced by the calendaring engine
#[derive(Error, Debug)]
pub enum RfcError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Expansion error: {0}")]
    Expansion(#[from] ExpansionError),

    #[error("{component} is missing required property {property}")]
    MissingProperty {
        component: String,
        property: &'static str,
    },

    #[error(transparent)]
    Core(#[from] kairos_core::error::CoreError),
}

pub type RfcResult<T> = std::result::Result<T, RfcError>;
