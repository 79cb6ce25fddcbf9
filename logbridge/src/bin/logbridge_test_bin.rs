// Copyright (c) 2026 R3BL LLC. Licensed under Apache License, Version 2.0.

use logbridge::{DisplayPreference, ExternalLogEvent, LogMethods, LoggerConfig, Severity};

/// This is the binary under test, used by the tests in `tests/bin_stdio.rs`. There is no
/// easy way to test `stdout`, `stderr`, or the process wide registry without spawning a
/// new process, so each mode runs in a process of its own.
///
/// It takes 1 argument:
/// - `stdout` / `stderr`: init with a debug console on that stream, and log at every
///   level.
/// - `lazy`: log without calling `init` first.
/// - `twice`: call `init` twice.
/// - `forward`: republish external events, and records from the `log` facade.
/// - `webhook <port>`: log an error to a webhook on `127.0.0.1:<port>`, flush through
///   the `log` facade, and exit.
///
/// See: <https://docs.rs/assert_cmd/latest/assert_cmd/index.html>
fn main() -> miette::Result<()> {
    let arg = std::env::args().nth(1).unwrap_or_default();

    match arg.as_str() {
        "lazy" => {
            logbridge::get().info("lazy info");
            logbridge::get().debug("lazy debug");
            logbridge::get_prefixed("lazy").warn("prefixed warn");
        }
        "twice" => {
            let first = logbridge::init(debug_console(DisplayPreference::Stdout));
            let second = logbridge::init(LoggerConfig::from(Severity::Error));
            logbridge::get().debug(&format!("{first:?} then {second:?}"));
        }
        "forward" => {
            logbridge::init(debug_console(DisplayPreference::Stdout));
            logbridge::install_log_bridge(log::LevelFilter::Debug)?;
            logbridge::forward_external(&ExternalLogEvent::new(
                "verbose",
                Some("npm"),
                Some("fetching manifest"),
            ));
            log::warn!(target: "my_app::db", "pool exhausted");
            log::trace!(target: "my_app::db", "filtered by max level");
        }
        "webhook" => {
            let port = std::env::args().nth(2).unwrap_or_default();
            let mut config = debug_console(DisplayPreference::Stdout);
            config.webhook = Some(format!("127.0.0.1:{port}"));
            logbridge::init(config);
            logbridge::install_log_bridge(log::LevelFilter::Info)?;
            logbridge::get().error("fatal before exit");
            log::logger().flush();
        }
        _ => {
            let display = if arg == "stderr" {
                DisplayPreference::Stderr
            } else {
                DisplayPreference::Stdout
            };
            logbridge::init(debug_console(display));
            for it in Severity::ALL.iter().rev() {
                logbridge::get().log(*it, it.as_ref());
            }
        }
    }

    Ok(())
}

fn debug_console(display: DisplayPreference) -> LoggerConfig {
    let mut config = LoggerConfig::from(display);
    config.console.level = Some(Severity::Debug);
    config.log_no_colors = true;
    config
}
