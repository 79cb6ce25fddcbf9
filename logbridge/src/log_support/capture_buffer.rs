// Copyright (c) 2026 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{io::{Result, Write},
          sync::{Arc, Mutex, MutexGuard, PoisonError}};

use crate::strip_ansi_sgr;

/// In memory console target. Use it with [`crate::DisplayPreference::Capture`] to
/// collect console output instead of writing it to `stdout`.
///
/// You can safely clone this struct, since it only contains an `Arc<Mutex<Vec<u8>>>`.
/// The inner `buffer` will not be cloned, just the [Arc] will be cloned.
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer {
    pub buffer: Arc<Mutex<Vec<u8>>>,
}

impl CaptureBuffer {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn get_copy_of_buffer_as_string(&self) -> String {
        String::from_utf8_lossy(&self.lock()).into_owned()
    }

    #[must_use]
    pub fn get_copy_of_buffer_as_string_strip_ansi(&self) -> String {
        strip_ansi_sgr(&self.get_copy_of_buffer_as_string()).into_owned()
    }

    /// Both handles point at the same buffer.
    #[must_use]
    pub fn is_same_buffer(&self, other: &CaptureBuffer) -> bool {
        Arc::ptr_eq(&self.buffer, &other.buffer)
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<()> { Ok(()) }
}
