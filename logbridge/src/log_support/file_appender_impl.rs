// Copyright (c) 2026 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Everything the file sink needs before the first line is written: placeholder
//! expansion, resolution against the application root, folder creation, and removal of
//! the previous run's file (logs are never appended across runs).

use std::{path::{Path, PathBuf},
          sync::OnceLock};

use regex::{Captures, Regex};
use tracing_appender::rolling::{RollingFileAppender, Rotation};

use crate::{LogBridgeError, ok};

static PERCENT_PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();
static DOLLAR_PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

/// `%NAME%`
fn percent_placeholder_regex() -> &'static Regex {
    PERCENT_PLACEHOLDER_REGEX.get_or_init(|| {
        Regex::new(r"%([^%]+)%").expect("percent placeholder regex is a valid static pattern")
    })
}

/// `$NAME/`, the name runs up to the next `/`.
fn dollar_placeholder_regex() -> &'static Regex {
    DOLLAR_PLACEHOLDER_REGEX.get_or_init(|| {
        Regex::new(r"\$([^$|/]+)/").expect("dollar placeholder regex is a valid static pattern")
    })
}

/// Replace `%NAME%` with the value `lookup` returns for `NAME`. Unknown names are kept as
/// is.
pub(crate) fn expand_percent_placeholders(
    path: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> String {
    percent_placeholder_regex()
        .replace_all(path, |caps: &Captures<'_>| {
            lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Replace `$NAME/` with the value `lookup` returns for `NAME`, followed by the `/`.
/// Unknown names are kept as is.
pub(crate) fn expand_dollar_placeholders(
    path: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> String {
    dollar_placeholder_regex()
        .replace_all(path, |caps: &Captures<'_>| match lookup(&caps[1]) {
            Some(value) => format!("{value}/"),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Expand environment variable placeholders using the platform's syntax: `%NAME%` on
/// Windows, `$NAME/` everywhere else.
#[must_use]
pub fn expand_env_placeholders(path: &str) -> String {
    let lookup = |name: &str| std::env::var(name).ok();
    if cfg!(windows) {
        expand_percent_placeholders(path, lookup)
    } else {
        expand_dollar_placeholders(path, lookup)
    }
}

/// Expand placeholders, then join relative paths onto `app_root`.
#[must_use]
pub fn resolve_log_file_path(path: &str, app_root: &Path) -> PathBuf {
    let expanded = PathBuf::from(expand_env_placeholders(path));
    if expanded.is_relative() {
        app_root.join(expanded)
    } else {
        expanded
    }
}

/// Create the containing folder and delete the file left over from a previous run.
///
/// # Errors
///
/// - The folder can't be created (an existing folder is fine).
/// - A previous file exists and can't be removed.
pub fn try_prepare_log_file(path: &Path) -> miette::Result<()> {
    if let Some(parent) = path.parent().filter(|it| !it.as_os_str().is_empty()) {
        match std::fs::create_dir_all(parent) {
            Ok(()) => {}
            Err(error)
                if error.kind() == std::io::ErrorKind::AlreadyExists && parent.is_dir() => {}
            Err(source) => {
                return Err(LogBridgeError::CreateLogDir {
                    path: parent.to_path_buf(),
                    source,
                }
                .into());
            }
        }
    }

    if path.is_file() {
        std::fs::remove_file(path).map_err(|source| LogBridgeError::RemoveStaleLogFile {
            path: path.to_path_buf(),
            source,
        })?;
    }

    ok!()
}

/// Resolve and prepare `path_str`, and open a non rotating appender on it.
///
/// # Errors
///
/// Any failure to resolve, prepare, or open the file. The file sink is skipped in that
/// case, see [`crate::try_create_transports`].
pub fn try_create(
    path_str: &str,
    app_root: &Path,
) -> miette::Result<(RollingFileAppender, PathBuf)> {
    let path = resolve_log_file_path(path_str, app_root);

    let (parent, file_name) = match (path.parent(), path.file_name()) {
        (Some(parent), Some(file_name)) => {
            (parent.to_path_buf(), file_name.to_string_lossy().into_owned())
        }
        _ => return Err(LogBridgeError::InvalidLogFilePath { path }.into()),
    };

    try_prepare_log_file(&path)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(parent)
        .map_err(|source| LogBridgeError::OpenLogFile {
            path: path.clone(),
            source,
        })?;

    Ok((appender, path))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use serial_test::serial;

    use super::*;

    fn fake_env(name: &str) -> Option<String> {
        match name {
            "HOME" => Some("/home/alice".to_string()),
            "LOG_DIR" => Some("C:\\logs".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_expand_dollar_placeholders() {
        assert_eq!(
            expand_dollar_placeholders("$HOME/logs/app.log", fake_env),
            "/home/alice/logs/app.log"
        );
        assert_eq!(
            expand_dollar_placeholders("$NOPE/app.log", fake_env),
            "$NOPE/app.log"
        );
        // Without a trailing `/` there is no placeholder.
        assert_eq!(expand_dollar_placeholders("logs/$HOME", fake_env), "logs/$HOME");
        assert_eq!(expand_dollar_placeholders("plain.log", fake_env), "plain.log");
    }

    #[test]
    fn test_expand_percent_placeholders() {
        assert_eq!(
            expand_percent_placeholders("%LOG_DIR%\\app.log", fake_env),
            "C:\\logs\\app.log"
        );
        assert_eq!(
            expand_percent_placeholders("%NOPE%\\app.log", fake_env),
            "%NOPE%\\app.log"
        );
        assert_eq!(expand_percent_placeholders("100%", fake_env), "100%");
    }

    #[cfg(not(windows))]
    #[serial]
    #[test]
    fn test_expand_env_placeholders_reads_process_env() {
        // SAFETY: Serialized with the other env var tests.
        unsafe { std::env::set_var("LOGBRIDGE_TEST_LOG_DIR", "/var/tmp/logbridge") };
        assert_eq!(
            expand_env_placeholders("$LOGBRIDGE_TEST_LOG_DIR/app.log"),
            "/var/tmp/logbridge/app.log"
        );
        // SAFETY: Serialized with the other env var tests.
        unsafe { std::env::remove_var("LOGBRIDGE_TEST_LOG_DIR") };
    }

    #[test]
    fn test_relative_path_is_joined_onto_app_root() {
        let app_root = Path::new("/srv/app");
        assert_eq!(
            resolve_log_file_path("logs/app.log", app_root),
            PathBuf::from("/srv/app/logs/app.log")
        );
    }

    #[cfg(not(windows))]
    #[test]
    fn test_absolute_path_is_kept() {
        assert_eq!(
            resolve_log_file_path("/tmp/app.log", Path::new("/srv/app")),
            PathBuf::from("/tmp/app.log")
        );
    }

    #[test]
    fn test_prepare_creates_folder_and_removes_stale_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("app.log");

        try_prepare_log_file(&path).unwrap();
        assert!(path.parent().unwrap().is_dir());
        assert!(!path.exists());

        std::fs::write(&path, "previous run\n").unwrap();
        try_prepare_log_file(&path).unwrap();
        assert!(!path.exists());

        // Existing folder is fine.
        try_prepare_log_file(&path).unwrap();
    }

    #[test]
    fn test_prepare_fails_when_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let report = try_prepare_log_file(&blocker.join("app.log")).unwrap_err();
        assert!(
            matches!(
                report.downcast_ref::<LogBridgeError>(),
                Some(LogBridgeError::CreateLogDir { path, .. }) if *path == blocker
            ),
            "report: {report:?}"
        );
    }

    #[test]
    fn test_try_create_writes_into_fresh_file() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("logs").join("app.log");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, "previous run\n").unwrap();

        let (mut appender, path) = try_create("logs/app.log", dir.path()).unwrap();
        assert_eq!(path, stale);

        appender.write_all(b"fresh\n").unwrap();
        appender.flush().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh\n");
    }
}
