// Copyright (c) 2026 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The [`Logger`] and the ways to get hold of it.
//!
//! A [`LoggerRegistry`] owns at most one [`Logger`]. The first call to
//! [`LoggerRegistry::init`] (or [`LoggerRegistry::get`], which initializes with the
//! default config) builds it; after that it is read only. See [`crate::init`] and
//! [`crate::get`] for the process wide registry.

use std::{panic::AssertUnwindSafe,
          sync::OnceLock,
          time::{Duration, Instant}};

use tracing::Dispatch;
use tracing_subscriber::layer::SubscriberExt;

use crate::{ConsoleNotifier, LoggerConfig, Severity, SinkInfo, StackAnnotator, Transports,
            WorkerHandle, map_external_level, try_create_transports};

pub const ALREADY_INITIALIZED_NOTICE: &str = "logger already initialized";

/// How long [`crate::LogBridge`] waits for the network sinks when the `log` facade asks
/// for a flush.
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// The four level methods, all funneled into [`LogMethods::log`].
pub trait LogMethods {
    fn log(&self, severity: Severity, message: &str);

    fn debug(&self, message: &str) { self.log(Severity::Debug, message); }

    fn info(&self, message: &str) { self.log(Severity::Info, message); }

    fn warn(&self, message: &str) { self.log(Severity::Warn, message); }

    fn error(&self, message: &str) { self.log(Severity::Error, message); }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Plain,
    /// The message gets the caller's stack appended.
    Annotated,
}

/// How each severity is rendered, decided once when the logger is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodTable {
    methods: [MethodKind; 4],
}

impl MethodTable {
    /// With `async_trace`, `info`, `warn` and `error` are annotated. `debug` never is.
    #[must_use]
    pub fn new(async_trace: bool) -> Self {
        let mut methods = [MethodKind::Plain; 4];
        if async_trace {
            for it in [Severity::Info, Severity::Warn, Severity::Error] {
                methods[it.index()] = MethodKind::Annotated;
            }
        }
        Self { methods }
    }

    #[must_use]
    pub fn get(&self, severity: Severity) -> MethodKind { self.methods[severity.index()] }
}

/// A log event that comes from another logging convention, eg: an npm style emitter
/// with `silly`, `verbose`, `http` levels and an optional prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalLogEvent {
    pub level: String,
    pub prefix: Option<String>,
    pub message: Option<String>,
}

impl ExternalLogEvent {
    #[must_use]
    pub fn new(
        level: impl Into<String>,
        prefix: Option<&str>,
        message: Option<&str>,
    ) -> Self {
        Self {
            level: level.into(),
            prefix: prefix.map(str::to_string),
            message: message.map(str::to_string),
        }
    }

    #[must_use]
    pub fn severity(&self) -> Severity { map_external_level(&self.level) }

    /// `prefix: message` when both are present, otherwise whichever one is. Empty
    /// strings count as missing.
    #[must_use]
    pub fn text(&self) -> Option<String> { join_prefix(self.prefix.as_deref(), self.message.as_deref()) }
}

pub(crate) fn join_prefix(prefix: Option<&str>, message: Option<&str>) -> Option<String> {
    let prefix = prefix.filter(|it| !it.is_empty());
    let message = message.filter(|it| !it.is_empty());
    match (prefix, message) {
        (Some(prefix), Some(message)) => Some(format!("{prefix}: {message}")),
        (Some(it), None) | (None, Some(it)) => Some(it.to_string()),
        (None, None) => None,
    }
}

/// Sends every record to all of its sinks. Built by [`Logger::new`] and never changed
/// afterwards.
#[derive(Debug)]
pub struct Logger {
    dispatch: Dispatch,
    sinks: Vec<SinkInfo>,
    workers: Vec<WorkerHandle>,
    methods: MethodTable,
    annotator: Option<StackAnnotator>,
    notifier: ConsoleNotifier,
}

impl Logger {
    /// Build all the sinks in `config`. Sinks that fail to build are reported on the
    /// console and left out, so this always succeeds.
    pub fn new(config: impl Into<LoggerConfig>) -> Self {
        let config: LoggerConfig = config.into();
        let notifier = ConsoleNotifier::new(&config);

        let Transports {
            layers,
            sinks,
            workers,
        } =
            try_create_transports::<tracing_subscriber::Registry>(&config, &notifier);
        let dispatch = Dispatch::new(tracing_subscriber::registry().with(layers));

        Self {
            dispatch,
            sinks,
            workers,
            methods: MethodTable::new(config.async_trace),
            annotator: config
                .async_trace
                .then(|| StackAnnotator::new(config.app_root())),
            notifier,
        }
    }

    #[must_use]
    pub fn sinks(&self) -> &[SinkInfo] { &self.sinks }

    #[must_use]
    pub fn methods(&self) -> &MethodTable { &self.methods }

    #[must_use]
    pub fn notifier(&self) -> &ConsoleNotifier { &self.notifier }

    #[must_use]
    pub fn prefixed(&self, prefix: &str) -> PrefixedLogger<'_> { PrefixedLogger::new(self, prefix) }

    /// Wait up to `timeout` for the network sinks to deliver what they have queued. Call
    /// this before the process exits, since their worker threads are not waited for.
    /// Afterwards the network sinks drop new records, the console and file keep working.
    ///
    /// Returns `false` if a worker was still busy when `timeout` ran out.
    pub fn flush(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        self.workers
            .iter()
            .fold(true, |acc, worker| worker.close_and_join(deadline) && acc)
    }

    /// Republish an event from another logging convention. Events with neither a prefix
    /// nor a message are dropped.
    pub fn forward(&self, event: &ExternalLogEvent) {
        if let Some(text) = event.text() {
            self.log(event.severity(), &text);
        }
    }

    /// Hand `message` to every sink, as is.
    fn emit(&self, severity: Severity, message: &str) {
        tracing::dispatcher::with_default(&self.dispatch, || match severity {
            Severity::Debug => tracing::debug!("{message}"),
            Severity::Info => tracing::info!("{message}"),
            Severity::Warn => tracing::warn!("{message}"),
            Severity::Error => tracing::error!("{message}"),
        });
    }
}

impl LogMethods for Logger {
    fn log(&self, severity: Severity, message: &str) {
        match (self.methods.get(severity), &self.annotator) {
            (MethodKind::Annotated, Some(annotator)) => {
                self.emit(severity, &annotator.annotate(message));
            }
            _ => self.emit(severity, message),
        }
    }
}

/// A view of a [Logger] that prepends `[prefix] ` to every message. Cheap to create, it
/// owns no sink state.
#[derive(Debug, Clone)]
pub struct PrefixedLogger<'a> {
    logger: &'a Logger,
    prefix: String,
}

impl<'a> PrefixedLogger<'a> {
    #[must_use]
    pub fn new(logger: &'a Logger, prefix: &str) -> Self {
        Self {
            logger,
            prefix: prefix.to_string(),
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str { &self.prefix }
}

impl LogMethods for PrefixedLogger<'_> {
    /// A failure while delegating never reaches the caller.
    fn log(&self, severity: Severity, message: &str) {
        let message = format!("[{}] {message}", self.prefix);
        drop(std::panic::catch_unwind(AssertUnwindSafe(|| {
            self.logger.log(severity, &message);
        })));
    }
}

/// What [`LoggerRegistry::get_with`] hands out.
#[derive(Debug, Clone)]
pub enum LogHandle<'a> {
    Raw(&'a Logger),
    Prefixed(PrefixedLogger<'a>),
}

impl LogMethods for LogHandle<'_> {
    fn log(&self, severity: Severity, message: &str) {
        match self {
            LogHandle::Raw(logger) => logger.log(severity, message),
            LogHandle::Prefixed(logger) => logger.log(severity, message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Initialized,
    AlreadyInitialized,
}

/// Holds at most one [Logger]. Concurrent first callers race safely: exactly one of them
/// builds the logger, and everyone sees that one.
#[derive(Debug, Default)]
pub struct LoggerRegistry {
    cell: OnceLock<Logger>,
}

impl LoggerRegistry {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Build the logger from `config`, unless there already is one. In that case
    /// `config` is ignored and a notice is written to the console.
    pub fn init(&self, config: impl Into<LoggerConfig>) -> InitOutcome {
        let mut is_built_here = false;
        let logger = self.cell.get_or_init(|| {
            is_built_here = true;
            Logger::new(config)
        });

        if is_built_here {
            InitOutcome::Initialized
        } else {
            logger
                .notifier()
                .notify(Severity::Info, ALREADY_INITIALIZED_NOTICE);
            InitOutcome::AlreadyInitialized
        }
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool { self.cell.get().is_some() }

    /// The logger, if it has been built. Unlike [`LoggerRegistry::get`] this never
    /// builds one.
    #[must_use]
    pub fn try_get(&self) -> Option<&Logger> { self.cell.get() }

    /// The logger, built with [`LoggerConfig::default`] if nobody has called
    /// [`LoggerRegistry::init`] yet.
    pub fn get(&self) -> &Logger { self.cell.get_or_init(|| Logger::new(LoggerConfig::default())) }

    pub fn get_prefixed(&self, prefix: &str) -> PrefixedLogger<'_> { self.get().prefixed(prefix) }

    /// A prefixed view for a non empty `prefix`, the logger itself otherwise.
    pub fn get_with(&self, prefix: Option<&str>) -> LogHandle<'_> {
        match prefix.filter(|it| !it.is_empty()) {
            Some(prefix) => LogHandle::Prefixed(self.get_prefixed(prefix)),
            None => LogHandle::Raw(self.get()),
        }
    }
}
