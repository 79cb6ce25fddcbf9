// Copyright (c) 2026 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Sinks that talk to the network. Each one is fed through a channel by a
//! [`NetworkLayer`] and drained by its own worker thread, so a log call never waits on
//! network I/O.

// Attach sources.
pub mod remote_collector;
pub mod webhook;
pub mod worker;

// Re-export.
pub use remote_collector::*;
pub use webhook::*;
pub use worker::*;
