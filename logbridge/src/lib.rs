// Copyright (c) 2026 R3BL LLC. Licensed under Apache License, Version 2.0.

//! # logbridge
//!
//! A process wide logging facade. A single [`LoggerConfig`] decides which sinks are
//! active:
//!
//! 1. Console (always present), optionally colorized and timestamped.
//! 2. File, at a path that can contain environment variable placeholders, resolved
//!    against the application root. The file is recreated on every run.
//! 3. Remote log collector (Logstash style), newline delimited JSON over TCP or TLS.
//! 4. Webhook, which `POST`s every record as JSON to `http://host:port/`.
//!
//! Every sink has its own minimum [`Severity`]. Sinks that must not receive color codes
//! are wrapped in a [`SanitizingWriter`] that strips ANSI SGR sequences.
//!
//! The logger is built once per process and handed out by [`get`] (or
//! [`get_prefixed`], which prepends `[prefix] ` to every message). Calling [`init`] more
//! than once is a no-op. Network sinks deliver from worker threads, call [`flush`]
//! before the process exits so their queued records aren't lost.
//!
//! ```no_run
//! use logbridge::{LogMethods, LoggerConfig, Severity};
//!
//! let mut config = LoggerConfig::from(Severity::Debug);
//! config.file.path = Some("$HOME/logs/app.log".into());
//! config.file.level = Some(Severity::Info);
//! logbridge::init(config);
//!
//! logbridge::get().info("server started");
//! logbridge::get_prefixed("db").warn("slow query");
//!
//! logbridge::flush(std::time::Duration::from_secs(5));
//! ```
//!
//! Logs produced by other libraries are brought in explicitly, either with
//! [`forward_external`] (npm style level names) or by installing the [`LogBridge`] for
//! crates that use the [`log`] facade.

// Enforce strict error handling in production code.
#![cfg_attr(not(test), deny(clippy::unwrap_in_result))]

// Connect to source file.
pub mod decl_macros;
pub mod log_support;

// Re-export.
pub use log_support::*;
