// Copyright (c) 2026 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::path::PathBuf;

use strum_macros::{AsRefStr, Display};
use tracing::{Metadata, Subscriber};
use tracing_core::LevelFilter;
use tracing_subscriber::{Layer,
                         layer::{Context, Filter},
                         registry::LookupSpan};

use crate::{ConsoleNotifier, DisplayPreference, LoggerConfig, NetworkLayer,
            RemoteCollectorSink, SanitizingMakeWriter, Severity, WebhookSink, WorkerHandle,
            file_appender_impl, parse_webhook_target};

/// Avoid gnarly type annotations by using a macro to create the `fmt` layer. Every sink
/// that writes text lines uses the same [`crate::LineFormatter`].
#[macro_export]
macro_rules! create_fmt {
    ($colorize:expr, $clock:expr) => {
        tracing_subscriber::fmt::layer()
            .event_format($crate::LineFormatter::new($colorize, $clock))
    };
}

/// Type alias for a boxed layer.
pub type DynLayer<S> = dyn Layer<S> + Send + Sync + 'static;

/// Per layer filter that lets through events whose [`Severity`] is at least `min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityFilter {
    pub min: Severity,
}

impl SeverityFilter {
    #[must_use]
    pub fn new(min: Severity) -> Self { Self { min } }
}

impl<S> Filter<S> for SeverityFilter {
    fn enabled(&self, meta: &Metadata<'_>, _ctx: &Context<'_, S>) -> bool {
        Severity::from(*meta.level()).enables(self.min)
    }

    fn max_level_hint(&self) -> Option<LevelFilter> { Some(self.min.as_level_filter_hint()) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SinkKind {
    Console,
    File,
    Webhook,
    RemoteCollector,
}

/// Describes one active sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkInfo {
    pub kind: SinkKind,
    pub level: Severity,
    /// Where the output goes: `stdout`, a file path, a URL, or `host:port`.
    pub target: String,
}

/// The layers for every sink that could be built, in the order console, file, remote
/// collector, webhook. `sinks[i]` describes `layers[i]`. Network sinks also leave a
/// [`WorkerHandle`] in `workers`.
pub struct Transports<S = tracing_subscriber::Registry> {
    pub layers: Vec<Box<DynLayer<S>>>,
    pub sinks: Vec<SinkInfo>,
    pub workers: Vec<WorkerHandle>,
}

impl<S> std::fmt::Debug for Transports<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transports")
            .field("sinks", &self.sinks)
            .field("workers", &self.workers)
            .finish()
    }
}

impl<S> Transports<S> {
    #[must_use]
    pub fn kinds(&self) -> Vec<SinkKind> { self.sinks.iter().map(|it| it.kind).collect() }

    #[must_use]
    pub fn get(&self, kind: SinkKind) -> Option<&SinkInfo> {
        self.sinks.iter().find(|it| it.kind == kind)
    }

    fn push(&mut self, layer: Box<DynLayer<S>>, info: SinkInfo) {
        self.layers.push(layer);
        self.sinks.push(info);
    }
}

/// Build every sink `config` asks for. This does not install anything, the caller
/// composes the layers into a subscriber.
///
/// A sink that can't be built is reported through `notifier` and left out. The console
/// sink is always present.
pub fn try_create_transports<S>(config: &LoggerConfig, notifier: &ConsoleNotifier) -> Transports<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let mut transports = Transports {
        layers: vec![],
        sinks: vec![],
        workers: vec![],
    };

    let console_level = config.console_level();
    transports.push(create_console_layer(config), SinkInfo {
        kind: SinkKind::Console,
        level: console_level,
        target: display_target(&config.display),
    });

    if let Some((path, level)) = config.file_sink_settings() {
        match try_create_file_layer(path, level, config) {
            Ok((layer, resolved_path)) => transports.push(layer, SinkInfo {
                kind: SinkKind::File,
                level,
                target: resolved_path.display().to_string(),
            }),
            Err(report) => notifier.warn_error(
                &format!("File sink disabled, could not attach '{path}'"),
                &report,
            ),
        }
    }

    if let Some(collector) = &config.logstash {
        let target = format!("{}:{}", collector.host, collector.port);
        let level = collector.level();
        let sink = RemoteCollectorSink::new(collector.clone());
        match NetworkLayer::try_spawn(sink, false, notifier.clone()) {
            Ok((layer, worker)) => {
                transports.push(
                    Box::new(layer.with_filter(SeverityFilter::new(level))),
                    SinkInfo {
                        kind: SinkKind::RemoteCollector,
                        level,
                        target,
                    },
                );
                transports.workers.push(worker);
            }
            Err(report) => notifier.warn_error(
                &format!("Remote collector sink disabled, could not attach '{target}'"),
                &report,
            ),
        }
    }

    if let Some(webhook) = config.webhook.as_deref() {
        let (host, port) = parse_webhook_target(webhook);
        let sink = WebhookSink::new(&host, port);
        let target = sink.url().to_string();
        let level = config.webhook_level();
        match NetworkLayer::try_spawn(sink, true, notifier.clone()) {
            Ok((layer, worker)) => {
                transports.push(
                    Box::new(layer.with_filter(SeverityFilter::new(level))),
                    SinkInfo {
                        kind: SinkKind::Webhook,
                        level,
                        target,
                    },
                );
                transports.workers.push(worker);
            }
            Err(report) => notifier.warn_error(
                &format!("Webhook sink disabled, could not attach '{webhook}'"),
                &report,
            ),
        }
    }

    transports
}

fn display_target(display: &DisplayPreference) -> String {
    match display {
        DisplayPreference::Stdout => "stdout",
        DisplayPreference::Stderr => "stderr",
        DisplayPreference::Capture(_) => "capture",
    }
    .to_string()
}

/// This erases the concrete type of the writer, and returns a boxed layer.
///
/// Colors in messages are only kept when colorization is on.
pub fn create_console_layer<S>(config: &LoggerConfig) -> Box<DynLayer<S>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let colorize = config.colorize();
    let fmt_layer = create_fmt!(colorize, config.log_timestamp.then(|| config.clock()));
    let filter = SeverityFilter::new(config.console_level());
    let display = config.display.clone();
    let make_writer = move || display.writer();

    if colorize {
        Box::new(fmt_layer.with_writer(make_writer).with_filter(filter))
    } else {
        Box::new(
            fmt_layer
                .with_writer(SanitizingMakeWriter::new(make_writer))
                .with_filter(filter),
        )
    }
}

/// This erases the concrete type of the writer, and returns a boxed layer, along with
/// the resolved path of the log file. File lines always carry a timestamp, and never
/// carry colors.
///
/// # Errors
///
/// See [`file_appender_impl::try_create`].
pub fn try_create_file_layer<S>(
    path: &str,
    level: Severity,
    config: &LoggerConfig,
) -> miette::Result<(Box<DynLayer<S>>, PathBuf)>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let (appender, resolved_path) = file_appender_impl::try_create(path, &config.app_root())?;
    let layer = create_fmt!(false, Some(config.clock()))
        .with_writer(SanitizingMakeWriter::new(appender))
        .with_filter(SeverityFilter::new(level));
    Ok((Box::new(layer), resolved_path))
}
