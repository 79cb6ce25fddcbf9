// Copyright (c) 2026 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::io::Write;

use crate::{DisplayPreference, LineFormatter, LoggerConfig, Severity, TimestampClock,
            format_line, strip_ansi_sgr};

/// Writes the facade's own notices straight to the console target, bypassing the sink
/// list. Sink construction happens before the dispatch exists, and the network workers
/// run on their own threads, so neither can log through the normal path.
///
/// Lines look exactly like console sink lines. Write failures are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsoleNotifier {
    pub display: DisplayPreference,
    pub colorize: bool,
    pub clock: Option<TimestampClock>,
}

impl ConsoleNotifier {
    #[must_use]
    pub fn new(config: &LoggerConfig) -> Self {
        Self {
            display: config.display.clone(),
            colorize: config.colorize(),
            clock: config.log_timestamp.then(|| config.clock()),
        }
    }

    pub fn notify(&self, severity: Severity, message: &str) {
        let formatter = LineFormatter::new(self.colorize, self.clock);
        let line = format_line(&formatter, severity, message);
        let line = if self.colorize {
            line
        } else {
            strip_ansi_sgr(&line).into_owned()
        };
        let mut writer = self.display.writer();
        drop(writer.write_all(line.as_bytes()).and_then(|()| writer.flush()));
    }

    pub fn warn(&self, message: &str) { self.notify(Severity::Warn, message); }

    /// Report an error together with its chain of causes on one line.
    pub fn warn_error(&self, context: &str, error: &miette::Report) {
        let causes = error
            .chain()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(": ");
        self.warn(&format!("{context}: {causes}"));
    }
}
