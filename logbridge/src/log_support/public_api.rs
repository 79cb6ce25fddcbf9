// Copyright (c) 2026 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Process wide entry points. They all share one [`LoggerRegistry`], so the logger is
//! built at most once per process no matter how many libraries call [`init`].
//!
//! ```no_run
//! use logbridge::{InitOutcome, LogMethods, LoggerConfig};
//!
//! let config = LoggerConfig::try_from_json_str(r#"{ "console": { "level": "debug" } }"#)
//!     .unwrap_or_default();
//! assert_eq!(logbridge::init(config), InitOutcome::Initialized);
//!
//! // Later, anywhere in the process.
//! logbridge::get_with(Some("worker")).debug("picked up job 42");
//! ```

use std::time::Duration;

use crate::{ExternalLogEvent, InitOutcome, LogHandle, Logger, LoggerConfig,
            LoggerRegistry, PrefixedLogger};

static LOGGER_REGISTRY: LoggerRegistry = LoggerRegistry::new();

/// The registry behind the free functions in this module.
#[must_use]
pub fn process_registry() -> &'static LoggerRegistry { &LOGGER_REGISTRY }

/// Build the process wide logger. Only the first call has any effect, later ones write
/// a notice to the console and return [`InitOutcome::AlreadyInitialized`].
pub fn init(config: impl Into<LoggerConfig>) -> InitOutcome { LOGGER_REGISTRY.init(config) }

/// Has the process wide logger been built yet?
#[must_use]
pub fn is_initialized() -> bool { LOGGER_REGISTRY.is_initialized() }

/// The process wide logger. Builds it with the default config if [`init`] hasn't run.
pub fn get() -> &'static Logger { LOGGER_REGISTRY.get() }

pub fn get_prefixed(prefix: &str) -> PrefixedLogger<'static> {
    LOGGER_REGISTRY.get_prefixed(prefix)
}

/// A prefixed view for a non empty `prefix`, the logger itself otherwise.
pub fn get_with(prefix: Option<&str>) -> LogHandle<'static> { LOGGER_REGISTRY.get_with(prefix) }

/// Republish an event from another logging convention through the process wide logger.
pub fn forward_external(event: &ExternalLogEvent) { get().forward(event); }

/// Wait up to `timeout` for the network sinks to deliver their queued records, see
/// [`Logger::flush`]. Does nothing if the logger was never built.
pub fn flush(timeout: Duration) -> bool {
    LOGGER_REGISTRY
        .try_get()
        .is_none_or(|logger| logger.flush(timeout))
}
