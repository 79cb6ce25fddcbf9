// Copyright (c) 2026 R3BL LLC. Licensed under Apache License, Version 2.0.

//! # Line formatter for tracing
//!
//! [`LineFormatter`] renders each event as a single human readable line:
//!
//! ```text
//! <timestamp> <level>: [prefix] <message> [key=value ..]
//! ```
//!
//! - The timestamp is optional, and uses the `YYYY-MM-DD HH:MM:SS:mmm` format (24 hour
//!   clock, millisecond precision). It is UTC unless the local timezone is requested.
//! - The level is the [`Severity`] name, colored when colorization is on.
//! - The `message` field of the event is the body. Other fields are appended as
//!   `key=value` pairs.
//!
//! The same rendering is used by the [`crate::ConsoleNotifier`], so that the facade's
//! own notices look like every other console line.

use std::fmt::{self, Write as _};

use chrono::{Local, Utc};
use tracing::{Event, Subscriber,
              field::{Field, Visit}};
use tracing_subscriber::{fmt::{FormatEvent, FormatFields},
                         registry::LookupSpan};

use crate::Severity;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S:%3f";
pub const LEVEL_SUFFIX: &str = ":";

/// Produces timestamps for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimestampClock {
    /// Use the local timezone. When `false` the time is normalized to UTC.
    pub local: bool,
}

impl TimestampClock {
    #[must_use]
    pub fn new(local: bool) -> Self { Self { local } }

    #[must_use]
    pub fn now_formatted(&self) -> String {
        if self.local {
            Local::now().format(TIMESTAMP_FORMAT).to_string()
        } else {
            Utc::now().format(TIMESTAMP_FORMAT).to_string()
        }
    }
}

/// Register with `tracing_subscriber::fmt::layer().event_format(..)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormatter {
    pub colorize: bool,
    /// `None` means no timestamp column.
    pub clock: Option<TimestampClock>,
}

impl LineFormatter {
    #[must_use]
    pub fn new(colorize: bool, clock: Option<TimestampClock>) -> Self {
        Self { colorize, clock }
    }
}

/// Write one complete line (including the trailing newline) for `severity` and
/// `message`.
///
/// # Errors
///
/// Returns an error if writing to `f` fails.
pub fn write_line(
    f: &mut impl fmt::Write,
    formatter: &LineFormatter,
    severity: Severity,
    message: &str,
) -> fmt::Result {
    if let Some(clock) = formatter.clock {
        write!(f, "{} ", clock.now_formatted())?;
    }
    if formatter.colorize {
        write!(f, "{}", severity.styled_name())?;
    } else {
        write!(f, "{severity}")?;
    }
    writeln!(f, "{LEVEL_SUFFIX} {message}")
}

/// Render a line into a new [String].
#[must_use]
pub fn format_line(formatter: &LineFormatter, severity: Severity, message: &str) -> String {
    let mut acc = String::new();
    // Writing to a String can't fail.
    let _ = write_line(&mut acc, formatter, severity, message);
    acc
}

impl<S, N> FormatEvent<S, N> for LineFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut f: tracing_subscriber::fmt::format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let severity = Severity::from(*event.metadata().level());
        let body = EventBody::from_event(event);
        write_line(&mut f, self, severity, &body.render())
    }
}

/// The `message` field of an event and its remaining fields, in recording order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EventBody {
    pub message: String,
    pub fields: Vec<(String, String)>,
}

impl EventBody {
    #[must_use]
    pub fn from_event(event: &Event<'_>) -> Self {
        let mut it = Self::default();
        event.record(&mut it);
        it
    }

    /// `message` followed by ` key=value` for every other field.
    #[must_use]
    pub fn render(&self) -> String {
        let mut acc = self.message.clone();
        for (name, value) in &self.fields {
            if !acc.is_empty() {
                acc.push(' ');
            }
            let _ = write!(acc, "{name}={value}");
        }
        acc
    }
}

impl Visit for EventBody {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push((field.name().to_string(), value.to_string()));
        }
    }

    /// `message` arrives here as [`fmt::Arguments`], whose `Debug` output is the plain
    /// formatted text.
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push((field.name().to_string(), format!("{value:?}")));
        }
    }
}
