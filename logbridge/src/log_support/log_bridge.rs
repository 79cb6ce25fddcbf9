// Copyright (c) 2026 R3BL LLC. Licensed under Apache License, Version 2.0.

use log::{LevelFilter, Log, Metadata, Record};

use crate::{DEFAULT_FLUSH_TIMEOUT, LogMethods, LoggerRegistry, Severity,
            log_support::facade::join_prefix, ok, process_registry};

/// Records from these crates are produced while a network sink is delivering. Passing
/// them on would feed the sink its own traffic.
const IGNORED_TARGET_PREFIXES: [&str; 5] = ["reqwest", "hyper", "h2", "native_tls", "want"];

/// Republishes records from crates that use the [`log`] facade. The record's target is
/// used as the prefix, so a line reads `<level>: <target>: <message>`.
#[derive(Debug, Clone, Copy)]
pub struct LogBridge {
    registry: &'static LoggerRegistry,
}

impl Default for LogBridge {
    fn default() -> Self { Self::new(process_registry()) }
}

impl LogBridge {
    #[must_use]
    pub fn new(registry: &'static LoggerRegistry) -> Self { Self { registry } }

    fn is_ignored_target(target: &str) -> bool {
        IGNORED_TARGET_PREFIXES.iter().any(|prefix| {
            target
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
        })
    }
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        !Self::is_ignored_target(metadata.target())
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = record.args().to_string();
        if let Some(text) = join_prefix(Some(record.target()), Some(&message)) {
            self.registry
                .get()
                .log(Severity::from(record.level()), &text);
        }
    }

    /// Drains the network sinks, so call it right before the process exits.
    fn flush(&self) {
        if let Some(logger) = self.registry.try_get() {
            logger.flush(DEFAULT_FLUSH_TIMEOUT);
        }
    }
}

/// Install a [`LogBridge`] for the process wide logger as the [`log`] crate's logger.
///
/// # Errors
///
/// Fails if another `log` logger is already installed.
pub fn install_log_bridge(max_level: LevelFilter) -> miette::Result<()> {
    log::set_boxed_logger(Box::new(LogBridge::default()))
        .map_err(|error| miette::miette!("Could not install log bridge: {error}"))?;
    log::set_max_level(max_level);
    ok!()
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{CaptureBuffer, DisplayPreference, LoggerConfig,
                network::webhook::test_server::serve_one};

    #[test]
    fn test_ignored_targets() {
        assert!(LogBridge::is_ignored_target("reqwest::connect"));
        assert!(LogBridge::is_ignored_target("hyper"));
        assert!(LogBridge::is_ignored_target("h2::codec"));
        assert!(!LogBridge::is_ignored_target("h2o_app"));
        assert!(!LogBridge::is_ignored_target("my_app::db"));
    }

    #[test]
    fn test_bridge_republishes_log_records() {
        let capture = CaptureBuffer::new();
        let mut config = LoggerConfig::from(DisplayPreference::Capture(capture.clone()));
        config.console.level = Some(Severity::Debug);
        config.log_no_colors = true;

        let registry: &'static LoggerRegistry = Box::leak(Box::new(LoggerRegistry::new()));
        registry.init(config);
        let bridge = LogBridge::new(registry);

        bridge.log(
            &Record::builder()
                .level(log::Level::Warn)
                .target("my_app::db")
                .args(format_args!("pool exhausted"))
                .build(),
        );
        bridge.log(
            &Record::builder()
                .level(log::Level::Trace)
                .target("my_app")
                .args(format_args!("tick"))
                .build(),
        );
        bridge.log(
            &Record::builder()
                .level(log::Level::Error)
                .target("reqwest::connect")
                .args(format_args!("ignored"))
                .build(),
        );

        assert_eq!(
            capture.get_copy_of_buffer_as_string(),
            "warn: my_app::db: pool exhausted\ndebug: my_app: tick\n"
        );
    }

    #[test]
    fn test_bridge_flush_drains_network_sinks() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = serve_one(listener, "HTTP/1.1 200 OK");

        let mut config = LoggerConfig::from(DisplayPreference::Capture(CaptureBuffer::new()));
        config.webhook = Some(format!("127.0.0.1:{port}"));

        let registry: &'static LoggerRegistry = Box::leak(Box::new(LoggerRegistry::new()));
        let bridge = LogBridge::new(registry);

        // Nothing to drain before the logger exists, and flushing doesn't build it.
        bridge.flush();
        assert!(!registry.is_initialized());

        registry.init(config);
        bridge.log(
            &Record::builder()
                .level(log::Level::Error)
                .target("my_app")
                .args(format_args!("shutting down"))
                .build(),
        );
        bridge.flush();

        let (_, body) = server.join().unwrap();
        let body: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["params"]["message"], "my_app: shutting down");
    }
}
