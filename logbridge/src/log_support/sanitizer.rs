// Copyright (c) 2026 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Strip ANSI SGR (color) sequences before text reaches a sink that must not receive
//! them: files, network sinks, and the console when colors are turned off.
//!
//! Only SGR sequences are removed: `ESC [`, then optional `;` separated digit groups,
//! then `m`. Every other byte is passed through untouched.

use std::{borrow::Cow,
          io::{self, Write},
          sync::OnceLock};

use regex::Regex;
use tracing_subscriber::fmt::MakeWriter;

static ANSI_SGR_REGEX: OnceLock<Regex> = OnceLock::new();

fn ansi_sgr_regex() -> &'static Regex {
    ANSI_SGR_REGEX.get_or_init(|| {
        Regex::new(r"\x1b\[(\d+(;\d+)*)?m").expect("ANSI SGR regex is a valid static pattern")
    })
}

/// Remove every ANSI SGR sequence from `text`. Borrows when there is nothing to strip.
#[must_use]
pub fn strip_ansi_sgr(text: &str) -> Cow<'_, str> { ansi_sgr_regex().replace_all(text, "") }

/// Wraps a writer so that each write is stripped of SGR sequences before it is passed
/// on. The whole input buffer is always reported as consumed.
#[derive(Debug)]
pub struct SanitizingWriter<W> {
    inner: W,
}

impl<W: Write> SanitizingWriter<W> {
    pub fn new(inner: W) -> Self { Self { inner } }

    pub fn into_inner(self) -> W { self.inner }
}

impl<W: Write> Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match std::str::from_utf8(buf) {
            Ok(text) => self.inner.write_all(strip_ansi_sgr(text).as_bytes())?,
            Err(_) => {
                let text = String::from_utf8_lossy(buf);
                self.inner.write_all(strip_ansi_sgr(&text).as_bytes())?;
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> { self.inner.flush() }
}

/// [`MakeWriter`] adapter so a sanitizer can be attached to any `tracing_subscriber`
/// fmt layer, eg: `fmt::layer().with_writer(SanitizingMakeWriter::new(std::io::stdout))`.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    pub fn new(inner: M) -> Self { Self { inner } }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer())
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer_for(meta))
    }
}
