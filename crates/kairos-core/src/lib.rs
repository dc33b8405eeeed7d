//! Shared configuration, constants and error types.

pub mod config;
pub mod constants;
pub mod error;
