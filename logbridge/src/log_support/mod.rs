// Copyright (c) 2026 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod capture_buffer;
pub mod console_notifier;
pub mod custom_event_formatter;
pub mod error;
pub mod facade;
pub mod file_appender_impl;
pub mod log_bridge;
pub mod logger_config;
pub mod network;
pub mod public_api;
pub mod sanitizer;
pub mod severity;
pub mod stack_annotator;
pub mod transports;

// Re-export.
pub use capture_buffer::*;
pub use console_notifier::*;
pub use custom_event_formatter::*;
pub use error::*;
pub use facade::*;
pub use file_appender_impl::*;
pub use log_bridge::*;
pub use logger_config::*;
pub use network::*;
pub use public_api::*;
pub use sanitizer::*;
pub use severity::*;
pub use stack_annotator::*;
pub use transports::*;
