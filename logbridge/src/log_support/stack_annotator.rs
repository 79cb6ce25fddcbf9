// Copyright (c) 2026 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Appends the caller's stack to a message:
//!
//! ```text
//! connection refused
//!
//!     [------TRACE------]
//!     at my_app::db.connect (src/db.rs:42:9)
//!     at my_app.main (src/main.rs:7:5)
//! ```
//!
//! Frames that belong to this crate or to the backtrace machinery are left out, and so
//! are frames whose symbol can't be split into a type (or module) path and a function.

use std::path::{Path, PathBuf};

pub const TRACE_HEADER: &str = "[------TRACE------]";
pub const TRACE_INDENT: &str = "    ";
pub const MAX_TRACE_FRAMES: usize = 15;

const SKIPPED_SYMBOL_PREFIXES: [&str; 2] = ["logbridge::", "backtrace::"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameInfo {
    /// Type or module path, eg: `my_app::db::Pool`.
    pub type_name: String,
    pub function: String,
    pub file: Option<PathBuf>,
    pub line: u32,
    pub column: u32,
}

impl FrameInfo {
    /// `at Type.function (path:line:col)`, where `path` is relative to `app_root` when
    /// the file is inside it.
    #[must_use]
    pub fn render(&self, app_root: &Path) -> String {
        let location = match &self.file {
            Some(file) => file.strip_prefix(app_root).unwrap_or(file).display().to_string(),
            None => "unknown".to_string(),
        };
        format!(
            "at {}.{} ({location}:{}:{})",
            self.type_name, self.function, self.line, self.column
        )
    }
}

/// Split a demangled symbol into its type (or module) path and its function name.
///
/// - `my_app::db::connect` -> (`my_app::db`, `connect`)
/// - `<my_app::Pool as my_app::Connect>::open` -> (`my_app::Pool`, `open`)
///
/// Returns `None` if either half is missing.
#[must_use]
pub fn split_symbol(symbol: &str) -> Option<(String, String)> {
    let symbol = symbol.trim();

    if let Some(rest) = symbol.strip_prefix('<') {
        let close = matching_angle_bracket(rest)?;
        let qualified = &rest[..close];
        let function = rest[close + 1..].strip_prefix("::")?;
        let type_name = qualified
            .split_once(" as ")
            .map_or(qualified, |(type_name, _)| type_name);
        return non_empty_pair(type_name, function);
    }

    let (type_name, function) = symbol.rsplit_once("::")?;
    non_empty_pair(type_name, function)
}

/// Index of the `>` that closes an already opened `<`.
fn matching_angle_bracket(text: &str) -> Option<usize> {
    let mut depth = 1_usize;
    for (index, ch) in text.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

fn non_empty_pair(type_name: &str, function: &str) -> Option<(String, String)> {
    let (type_name, function) = (type_name.trim(), function.trim());
    if type_name.is_empty() || function.is_empty() {
        None
    } else {
        Some((type_name.to_string(), function.to_string()))
    }
}

/// Does this symbol belong to the logging machinery?
#[must_use]
pub fn is_skipped_symbol(symbol: &str) -> bool {
    let symbol = symbol.trim_start_matches('<');
    SKIPPED_SYMBOL_PREFIXES
        .iter()
        .any(|prefix| symbol.starts_with(prefix))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackAnnotator {
    pub app_root: PathBuf,
    pub max_frames: usize,
}

impl StackAnnotator {
    #[must_use]
    pub fn new(app_root: PathBuf) -> Self {
        Self {
            app_root,
            max_frames: MAX_TRACE_FRAMES,
        }
    }

    /// Walk the current thread's stack, keeping at most `max_frames` frames.
    #[must_use]
    pub fn capture(&self) -> Vec<FrameInfo> {
        let mut acc = Vec::with_capacity(self.max_frames);
        backtrace::trace(|frame| {
            backtrace::resolve_frame(frame, |symbol| {
                if acc.len() >= self.max_frames {
                    return;
                }
                let Some(name) = symbol.name() else {
                    return;
                };
                let name = format!("{name:#}");
                if is_skipped_symbol(&name) {
                    return;
                }
                let Some((type_name, function)) = split_symbol(&name) else {
                    return;
                };
                acc.push(FrameInfo {
                    type_name,
                    function,
                    file: symbol.filename().map(Path::to_path_buf),
                    line: symbol.lineno().unwrap_or(0),
                    column: symbol.colno().unwrap_or(0),
                });
            });
            acc.len() < self.max_frames
        });
        acc
    }

    /// The trace block: an empty line, the header, then one line per frame.
    #[must_use]
    pub fn render(&self, frames: &[FrameInfo]) -> String {
        let mut acc = format!("\n{TRACE_INDENT}{TRACE_HEADER}\n");
        for frame in frames.iter().take(self.max_frames) {
            acc.push_str(TRACE_INDENT);
            acc.push_str(&frame.render(&self.app_root));
            acc.push('\n');
        }
        acc
    }

    /// `message`, followed by the trace block for the current stack.
    #[must_use]
    pub fn annotate(&self, message: &str) -> String {
        let block = self.render(&self.capture());
        format!("{message}\n{block}")
    }
}
