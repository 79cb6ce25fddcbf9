// Copyright (c) 2026 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The four level [`Severity`] taxonomy used for filtering, and the mapping from the
//! level vocabularies of other logging conventions into it.
//!
//! Ranks are ascending: `debug < info < warn < error`. A sink whose minimum severity is
//! `min` accepts a record `s` iff `s.rank() >= min.rank()`, see
//! [`Severity::enables`].

use std::str::FromStr;

use crossterm::style::{StyledContent, Stylize};
use serde::Deserialize;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use tracing_core::LevelFilter;

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(try_from = "String")]
pub enum Severity {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// Levels of npm style emitters (`silly` .. `error`), plus a couple of common aliases.
/// Anything not in this table maps to [`Severity::Info`].
pub const EXTERNAL_LEVEL_TABLE: [(&str, Severity); 8] = [
    ("silly", Severity::Debug),
    ("verbose", Severity::Debug),
    ("debug", Severity::Debug),
    ("info", Severity::Info),
    ("http", Severity::Info),
    ("warn", Severity::Warn),
    ("warning", Severity::Warn),
    ("error", Severity::Error),
];

impl Severity {
    pub const ALL: [Severity; 4] =
        [Severity::Debug, Severity::Info, Severity::Warn, Severity::Error];

    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Severity::Debug => 1,
            Severity::Info => 2,
            Severity::Warn => 3,
            Severity::Error => 4,
        }
    }

    /// Position in [`Severity::ALL`].
    #[must_use]
    pub const fn index(self) -> usize { (self.rank() - 1) as usize }

    /// Should a record of this severity pass a sink whose minimum is `min`?
    #[must_use]
    pub const fn enables(self, min: Severity) -> bool { self.rank() >= min.rank() }

    /// The [`tracing::Level`] used to emit an event of this severity.
    #[must_use]
    pub const fn as_tracing_level(self) -> tracing::Level {
        match self {
            Severity::Debug => tracing::Level::DEBUG,
            Severity::Info => tracing::Level::INFO,
            Severity::Warn => tracing::Level::WARN,
            Severity::Error => tracing::Level::ERROR,
        }
    }

    /// The most verbose [`LevelFilter`] that can still produce a record which passes
    /// `self` as a minimum. `TRACE` events map to debug, so a debug minimum has to let
    /// them through.
    #[must_use]
    pub const fn as_level_filter_hint(self) -> LevelFilter {
        match self {
            Severity::Debug => LevelFilter::TRACE,
            Severity::Info => LevelFilter::INFO,
            Severity::Warn => LevelFilter::WARN,
            Severity::Error => LevelFilter::ERROR,
        }
    }

    /// Level name colored for the console: debug grey, info cyan, warn yellow, error
    /// red.
    #[must_use]
    pub fn styled_name(self) -> StyledContent<&'static str> {
        match self {
            Severity::Debug => "debug".grey(),
            Severity::Info => "info".cyan(),
            Severity::Warn => "warn".yellow(),
            Severity::Error => "error".red(),
        }
    }
}

impl TryFrom<String> for Severity {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, strum::ParseError> { Severity::from_str(&value) }
}

/// Map a level name from a foreign vocabulary (eg: npm's `silly`, `verbose`, `http`)
/// into a [`Severity`]. Total: unknown names become [`Severity::Info`].
#[must_use]
pub fn map_external_level(level: &str) -> Severity {
    let level = level.trim();
    EXTERNAL_LEVEL_TABLE
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(level))
        .map_or(Severity::Info, |(_, severity)| *severity)
}

impl From<tracing::Level> for Severity {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Severity::Debug,
            tracing::Level::INFO => Severity::Info,
            tracing::Level::WARN => Severity::Warn,
            tracing::Level::ERROR => Severity::Error,
        }
    }
}

impl From<log::Level> for Severity {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace | log::Level::Debug => Severity::Debug,
            log::Level::Info => Severity::Info,
            log::Level::Warn => Severity::Warn,
            log::Level::Error => Severity::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_npm_levels_map_into_four_severities() {
        assert_eq!(map_external_level("silly"), Severity::Debug);
        assert_eq!(map_external_level("verbose"), Severity::Debug);
        assert_eq!(map_external_level("info"), Severity::Info);
        assert_eq!(map_external_level("http"), Severity::Info);
        assert_eq!(map_external_level("warn"), Severity::Warn);
        assert_eq!(map_external_level("error"), Severity::Error);
        assert_eq!(map_external_level("ERROR"), Severity::Error);
    }

    #[test]
    fn test_unknown_levels_default_to_info() {
        for it in ["", "silent", "fatal", "trace-ish", "  ", "💥", "warn!"] {
            assert_eq!(map_external_level(it), Severity::Info, "level: {it:?}");
        }
    }

    #[test]
    fn test_ranks_are_ascending_and_consistent_with_ord() {
        let ranks: Vec<u8> = Severity::iter().map(Severity::rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Warn < Severity::Error);
        for (index, it) in Severity::ALL.iter().enumerate() {
            assert_eq!(it.index(), index);
        }
    }

    #[test]
    fn test_enables() {
        assert!(Severity::Error.enables(Severity::Warn));
        assert!(Severity::Info.enables(Severity::Info));
        assert!(!Severity::Debug.enables(Severity::Info));
        assert!(!Severity::Warn.enables(Severity::Error));
    }

    #[test]
    fn test_tracing_levels() {
        assert_eq!(Severity::from(tracing::Level::TRACE), Severity::Debug);
        assert_eq!(Severity::from(tracing::Level::WARN), Severity::Warn);
        for it in Severity::ALL {
            assert_eq!(Severity::from(it.as_tracing_level()), it);
        }
    }

    #[test]
    fn test_log_levels() {
        assert_eq!(Severity::from(log::Level::Trace), Severity::Debug);
        assert_eq!(Severity::from(log::Level::Info), Severity::Info);
        assert_eq!(Severity::from(log::Level::Error), Severity::Error);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("WARN".parse::<Severity>().unwrap(), Severity::Warn);
        assert_eq!("debug".parse::<Severity>().unwrap(), Severity::Debug);
        assert!("verbose".parse::<Severity>().is_err());
        assert_eq!(Severity::Error.to_string(), "error");
        assert_eq!(Severity::default(), Severity::Info);
    }

    #[test]
    fn test_deserialize() {
        let it: Severity = serde_json::from_str("\"Error\"").unwrap();
        assert_eq!(it, Severity::Error);
        assert!(serde_json::from_str::<Severity>("\"loud\"").is_err());
    }

    #[test]
    fn test_try_from_string() {
        assert_eq!(Severity::try_from("warn".to_string()), Ok(Severity::Warn));
        assert_eq!(
            Severity::try_from("loud".to_string()),
            Err(strum::ParseError::VariantNotFound)
        );
    }
}
