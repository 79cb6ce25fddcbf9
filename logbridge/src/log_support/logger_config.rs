// Copyright (c) 2026 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{fmt::Debug,
          io::Write,
          path::{Path, PathBuf}};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::{CaptureBuffer, LogBridgeError, Severity, TimestampClock};

pub const DEFAULT_COLLECTOR_HOST: &str = "127.0.0.1";
pub const DEFAULT_COLLECTOR_PORT: u16 = 28777;
pub const DEFAULT_COLLECTOR_NODE_NAME: &str = "agent007";
pub const DEFAULT_COLLECTOR_MAX_CONNECT_RETRIES: i32 = 4;
pub const DEFAULT_COLLECTOR_RETRY_TIMEOUT_MS: u64 = 100;

// XMARK: Clever Rust, use of `impl Into<ConfigStruct>` for elegant constructor config options.
/// Everything the facade needs to decide which sinks to build. All fields are optional;
/// the [Default] is a colorized console at `info` and nothing else.
///
/// The field names (camelCase) match the JSON config files this is usually loaded from,
/// see [`LoggerConfig::try_from_json_str`]. The console target is not part of the file
/// format, and is set in code via [`LoggerConfig::display`]. A few conversions are
/// provided so that simple setups stay short:
///
/// ```
/// use logbridge::{CaptureBuffer, DisplayPreference, LoggerConfig, Severity};
///
/// let config_1: LoggerConfig = Severity::Debug.into();
/// let config_2: LoggerConfig = DisplayPreference::Capture(CaptureBuffer::new()).into();
///
/// assert_eq!(config_1.console_level(), Severity::Debug);
/// assert_eq!(config_2.console_level(), Severity::Info);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggerConfig {
    pub console: ConsoleConfig,
    /// `"level"`, or `"console_level:file_level"`. Used when `console.level` or
    /// `file.level` are not set.
    #[serde(rename = "loglevel")]
    pub log_level: Option<String>,
    pub log_no_colors: bool,
    pub log_timestamp: bool,
    /// Any value turns local time on, eg: `true` or `"Europe/Berlin"`. Only `null`,
    /// `false`, `0` and `""` leave timestamps in UTC.
    #[serde(deserialize_with = "deserialize_is_set")]
    pub local_timezone: bool,
    pub file: FileConfig,
    /// `"host:port"`.
    pub webhook: Option<String>,
    pub logstash: Option<RemoteCollectorConfig>,
    pub async_trace: bool,
    /// Relative file paths are resolved against this folder. Defaults to the folder
    /// that contains the running executable.
    pub app_root: Option<PathBuf>,
    #[serde(skip)]
    pub display: DisplayPreference,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub level: Option<Severity>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub path: Option<String>,
    pub level: Option<Severity>,
}

/// Settings for a Logstash style collector that receives newline delimited JSON.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteCollectorConfig {
    pub host: String,
    pub port: u16,
    pub ssl_enable: bool,
    /// Only meaningful with `ssl_enable`. Turning this off accepts any certificate.
    pub reject_unauthorized: bool,
    /// Negative means retry forever.
    #[serde(rename = "max_connect_retries")]
    pub max_connect_retries: Option<i32>,
    /// Milliseconds to wait between connection attempts.
    #[serde(rename = "timeout_connect_retries")]
    pub timeout_connect_retries: Option<u64>,
    pub location_name: Option<String>,
    pub deployment: Option<String>,
    #[serde(rename = "node_name")]
    pub node_name: Option<String>,
    pub level: Option<Severity>,
}

impl Default for RemoteCollectorConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_COLLECTOR_HOST.to_string(),
            port: DEFAULT_COLLECTOR_PORT,
            ssl_enable: false,
            reject_unauthorized: true,
            max_connect_retries: None,
            timeout_connect_retries: None,
            location_name: None,
            deployment: None,
            node_name: None,
            level: None,
        }
    }
}

impl RemoteCollectorConfig {
    #[must_use]
    pub fn level(&self) -> Severity { self.level.unwrap_or(Severity::Error) }

    #[must_use]
    pub fn node_name(&self) -> &str {
        self.node_name
            .as_deref()
            .unwrap_or(DEFAULT_COLLECTOR_NODE_NAME)
    }

    #[must_use]
    pub fn max_connect_retries(&self) -> i32 {
        self.max_connect_retries
            .unwrap_or(DEFAULT_COLLECTOR_MAX_CONNECT_RETRIES)
    }

    #[must_use]
    pub fn retry_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(
            self.timeout_connect_retries
                .unwrap_or(DEFAULT_COLLECTOR_RETRY_TIMEOUT_MS),
        )
    }
}

fn deserialize_is_set<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(it) => !it.is_empty(),
        Value::Number(it) => it.as_f64().is_none_or(|n| n.abs() > f64::EPSILON),
        _ => true,
    })
}

/// Where console output goes.
#[derive(Clone, Default)]
pub enum DisplayPreference {
    #[default]
    Stdout,
    Stderr,
    Capture(CaptureBuffer),
}

impl Debug for DisplayPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayPreference::Stdout => write!(f, "Stdout"),
            DisplayPreference::Stderr => write!(f, "Stderr"),
            DisplayPreference::Capture(_) => write!(f, "Capture"),
        }
    }
}

impl PartialEq for DisplayPreference {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DisplayPreference::Stdout, DisplayPreference::Stdout)
            | (DisplayPreference::Stderr, DisplayPreference::Stderr) => true,
            (DisplayPreference::Capture(lhs), DisplayPreference::Capture(rhs)) => {
                lhs.is_same_buffer(rhs)
            }
            _ => false,
        }
    }
}

impl DisplayPreference {
    /// A fresh writer for this target. Cheap, so it is called per event.
    #[must_use]
    pub fn writer(&self) -> Box<dyn Write + Send> {
        match self {
            DisplayPreference::Stdout => Box::new(std::io::stdout()),
            DisplayPreference::Stderr => Box::new(std::io::stderr()),
            DisplayPreference::Capture(buffer) => Box::new(buffer.clone()),
        }
    }
}

pub mod logger_config_options {
    use super::{DisplayPreference, LoggerConfig, Severity};

    impl From<Severity> for LoggerConfig {
        fn from(level: Severity) -> Self {
            let mut it = Self::default();
            it.console.level = Some(level);
            it
        }
    }

    impl From<DisplayPreference> for LoggerConfig {
        fn from(display: DisplayPreference) -> Self {
            Self {
                display,
                ..Default::default()
            }
        }
    }
}

impl LoggerConfig {
    /// # Errors
    ///
    /// Returns [`LogBridgeError::ConfigParse`] if `json` isn't a valid config object.
    pub fn try_from_json_str(json: &str) -> miette::Result<Self> {
        Ok(serde_json::from_str(json).map_err(LogBridgeError::ConfigParse)?)
    }

    /// # Errors
    ///
    /// Returns an error if the file can't be read or parsed.
    pub fn try_from_json_file(path: impl AsRef<Path>) -> miette::Result<Self> {
        let path = path.as_ref();
        let json =
            std::fs::read_to_string(path).map_err(|source| LogBridgeError::ConfigRead {
                path: path.to_path_buf(),
                source,
            })?;
        Self::try_from_json_str(&json)
    }

    /// Levels from the `loglevel` field, as `(console, file)`. A single level applies to
    /// both; an empty or unknown half is `None`.
    #[must_use]
    pub fn log_level_pair(&self) -> (Option<Severity>, Option<Severity>) {
        let Some(log_level) = self.log_level.as_deref() else {
            return (None, None);
        };
        let parse = |it: &str| it.trim().parse::<Severity>().ok();
        match log_level.split_once(':') {
            Some((console, file)) => (parse(console), parse(file)),
            None => (parse(log_level), parse(log_level)),
        }
    }

    #[must_use]
    pub fn console_level(&self) -> Severity {
        self.console
            .level
            .or(self.log_level_pair().0)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn file_level(&self) -> Option<Severity> {
        self.file.level.or(self.log_level_pair().1)
    }

    /// The file sink needs both a path and a level.
    #[must_use]
    pub fn file_sink_settings(&self) -> Option<(&str, Severity)> {
        match (self.file.path.as_deref(), self.file_level()) {
            (Some(path), Some(level)) if !path.trim().is_empty() => Some((path, level)),
            _ => None,
        }
    }

    /// The webhook uses the file level unless there is none.
    #[must_use]
    pub fn webhook_level(&self) -> Severity { self.file_level().unwrap_or_default() }

    #[must_use]
    pub fn colorize(&self) -> bool { !self.log_no_colors }

    #[must_use]
    pub fn clock(&self) -> TimestampClock { TimestampClock::new(self.local_timezone) }

    /// Explicit `app_root`, else the folder of the running executable, else the current
    /// working directory.
    #[must_use]
    pub fn app_root(&self) -> PathBuf {
        if let Some(it) = &self.app_root {
            return it.clone();
        }
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggerConfig::default();
        assert_eq!(config.console_level(), Severity::Info);
        assert!(config.colorize());
        assert_eq!(config.file_sink_settings(), None);
        assert_eq!(config.webhook_level(), Severity::Info);
        assert_eq!(config.display, DisplayPreference::Stdout);
    }

    #[test]
    fn test_local_timezone_accepts_any_set_value() {
        let config = LoggerConfig::try_from_json_str(
            r#"{ "localTimezone": "Europe/Berlin", "webhook": "a:1" }"#,
        )
        .unwrap();
        assert!(config.local_timezone);
        assert_eq!(config.clock(), TimestampClock::new(true));
        assert_eq!(config.webhook.as_deref(), Some("a:1"));

        for json in [
            r#"{ "localTimezone": null }"#,
            r#"{ "localTimezone": false }"#,
            r#"{ "localTimezone": "" }"#,
            r#"{ "localTimezone": 0 }"#,
            "{}",
        ] {
            let config = LoggerConfig::try_from_json_str(json).unwrap();
            assert!(!config.local_timezone, "json: {json}");
        }

        let config = LoggerConfig::try_from_json_str(r#"{ "localTimezone": 1 }"#).unwrap();
        assert!(config.local_timezone);
    }

    #[test]
    fn test_parse_full_json() {
        let json = r#"{
            "console": { "level": "debug" },
            "logNoColors": true,
            "logTimestamp": true,
            "localTimezone": true,
            "file": { "path": "$HOME/logs/app.log", "level": "warn" },
            "webhook": "example.com:1234",
            "logstash": {
                "port": 5000,
                "sslEnable": true,
                "host": "logs.internal",
                "max_connect_retries": -1,
                "timeout_connect_retries": 250,
                "locationName": "eu-west",
                "deployment": "staging",
                "node_name": "node-7",
                "level": "warn"
            },
            "asyncTrace": true,
            "appRoot": "/srv/app"
        }"#;
        let config = LoggerConfig::try_from_json_str(json).unwrap();

        assert_eq!(config.console_level(), Severity::Debug);
        assert!(!config.colorize());
        assert!(config.log_timestamp);
        assert!(config.local_timezone);
        assert_eq!(
            config.file_sink_settings(),
            Some(("$HOME/logs/app.log", Severity::Warn))
        );
        assert_eq!(config.webhook.as_deref(), Some("example.com:1234"));
        assert_eq!(config.webhook_level(), Severity::Warn);
        assert!(config.async_trace);
        assert_eq!(config.app_root(), PathBuf::from("/srv/app"));

        let logstash = config.logstash.unwrap();
        assert_eq!(logstash.host, "logs.internal");
        assert_eq!(logstash.port, 5000);
        assert!(logstash.ssl_enable);
        assert!(logstash.reject_unauthorized);
        assert_eq!(logstash.max_connect_retries(), -1);
        assert_eq!(logstash.retry_timeout(), std::time::Duration::from_millis(250));
        assert_eq!(logstash.location_name.as_deref(), Some("eu-west"));
        assert_eq!(logstash.deployment.as_deref(), Some("staging"));
        assert_eq!(logstash.node_name(), "node-7");
        assert_eq!(logstash.level(), Severity::Warn);
    }

    #[test]
    fn test_logstash_defaults() {
        let config = LoggerConfig::try_from_json_str(r#"{ "logstash": {} }"#).unwrap();
        let logstash = config.logstash.unwrap();
        assert_eq!(logstash.host, DEFAULT_COLLECTOR_HOST);
        assert_eq!(logstash.port, DEFAULT_COLLECTOR_PORT);
        assert_eq!(logstash.level(), Severity::Error);
        assert_eq!(logstash.node_name(), "agent007");
        assert_eq!(logstash.max_connect_retries(), 4);
        assert_eq!(logstash.retry_timeout(), std::time::Duration::from_millis(100));
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(LoggerConfig::try_from_json_str(r#"{ "console": { "level": "loud" } }"#).is_err());
        assert!(LoggerConfig::try_from_json_str("not json").is_err());
    }

    #[test]
    fn test_file_path_without_level_has_no_file_sink() {
        let mut config = LoggerConfig::default();
        config.file.path = Some("app.log".into());
        assert_eq!(config.file_sink_settings(), None);

        config.file.level = Some(Severity::Debug);
        assert_eq!(config.file_sink_settings(), Some(("app.log", Severity::Debug)));
    }

    #[test]
    fn test_log_level_pair() {
        let mut config = LoggerConfig::default();

        config.log_level = Some("warn:debug".into());
        assert_eq!(config.log_level_pair(), (Some(Severity::Warn), Some(Severity::Debug)));
        assert_eq!(config.console_level(), Severity::Warn);
        assert_eq!(config.file_level(), Some(Severity::Debug));

        config.log_level = Some(":error".into());
        assert_eq!(config.log_level_pair(), (None, Some(Severity::Error)));
        assert_eq!(config.console_level(), Severity::Info);

        config.log_level = Some("debug".into());
        assert_eq!(config.log_level_pair(), (Some(Severity::Debug), Some(Severity::Debug)));

        // Explicit levels win over the pair.
        config.console.level = Some(Severity::Error);
        config.file.level = Some(Severity::Warn);
        assert_eq!(config.console_level(), Severity::Error);
        assert_eq!(config.file_level(), Some(Severity::Warn));
    }

    #[test]
    fn test_from_conversions() {
        let config: LoggerConfig = Severity::Warn.into();
        assert_eq!(config.console_level(), Severity::Warn);

        let capture = CaptureBuffer::new();
        let config: LoggerConfig = DisplayPreference::Capture(capture.clone()).into();
        assert_eq!(config.display, DisplayPreference::Capture(capture));
        assert_ne!(config.display, DisplayPreference::Capture(CaptureBuffer::new()));
    }

    #[test]
    fn test_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logger.json");
        std::fs::write(&path, r#"{ "webhook": "10.0.0.1:9100" }"#).unwrap();

        let config = LoggerConfig::try_from_json_file(&path).unwrap();
        assert_eq!(config.webhook.as_deref(), Some("10.0.0.1:9100"));

        assert!(LoggerConfig::try_from_json_file(dir.path().join("missing.json")).is_err());
    }
}
