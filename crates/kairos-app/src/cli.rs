//! Command-line interface definition.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "kairos",
    version,
    about = "Expand iCalendar recurrences and compute free/busy time"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the occurrences of every component that start in `[start, end)`.
    Occurrences {
        /// iCalendar file to read.
        file: PathBuf,
        /// Window start (RFC 3339).
        #[arg(long)]
        start: DateTime<Utc>,
        /// Window end (RFC 3339).
        #[arg(long)]
        end: DateTime<Utc>,
        /// Maximum number of occurrences per component.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Classify an instant, or list busy periods within a window.
    Freebusy {
        /// iCalendar file to read.
        file: PathBuf,
        /// Instant to classify (RFC 3339).
        #[arg(long, conflicts_with_all = ["start", "end"])]
        at: Option<DateTime<Utc>>,
        /// Window start (RFC 3339).
        #[arg(long, required_unless_present = "at")]
        start: Option<DateTime<Utc>>,
        /// Window end (RFC 3339). Defaults to the configured window length.
        #[arg(long, requires = "start")]
        end: Option<DateTime<Utc>>,
    },
}
