use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use kairos_app::cli::{Cli, Command};
use kairos_app::commands;
use kairos_core::config::load_config;
use kairos_rfc::rfc::ical::expand::ExpansionOptions;
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    let config = load_config()?;

    tracing::debug!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    let mut options = ExpansionOptions::from(config.expansion);

    match cli.command {
        Command::Occurrences {
            file,
            start,
            end,
            limit,
        } => {
            if let Some(limit) = limit {
                options.max_instances = limit;
            }
            let input = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            print_json(&commands::occurrences(&input, start, end, options)?)
        }
        Command::Freebusy {
            file,
            at,
            start,
            end,
        } => {
            let input = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            match (at, start) {
                (Some(at), _) => print_json(&commands::status_at(&input, at, options)?),
                (None, Some(start)) => print_json(&commands::busy_periods(
                    &input,
                    start,
                    end,
                    config.freebusy.default_window_days,
                    options,
                )?),
                (None, None) => anyhow::bail!("either --at or --start is required"),
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to encode output")?;
    println!("{json}");
    Ok(())
}
