//! Cross-module tests over RFC 5545 sample data.

mod equality;
mod fixtures;
