// Copyright (c) 2026 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Errors raised while building sinks or loading configuration. None of them ever
//! reach the caller of a log method: sink construction failures are reported on the
//! console and the sink is left out.

use std::path::PathBuf;

use miette::Diagnostic;

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum LogBridgeError {
    #[error("Could not create log folder: '{}'", .path.display())]
    #[diagnostic(
        code(logbridge::file::create_dir),
        help("Check that the parent folder exists and is writable")
    )]
    CreateLogDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not remove the previous log file: '{}'", .path.display())]
    #[diagnostic(code(logbridge::file::remove_stale))]
    RemoveStaleLogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid log file path: '{}'", .path.display())]
    #[diagnostic(
        code(logbridge::file::invalid_path),
        help("The path must name a file inside a folder")
    )]
    InvalidLogFilePath { path: PathBuf },

    #[error("Could not open log file: '{}'", .path.display())]
    #[diagnostic(code(logbridge::file::open))]
    OpenLogFile {
        path: PathBuf,
        #[source]
        source: tracing_appender::rolling::InitError,
    },

    #[error("Could not read config file: '{}'", .path.display())]
    #[diagnostic(code(logbridge::config::read))]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse logger config")]
    #[diagnostic(
        code(logbridge::config::parse),
        help("Field names are camelCase, eg: `logNoColors`, `file.path`")
    )]
    ConfigParse(#[source] serde_json::Error),

    #[error("Could not spawn worker thread for the {sink} sink")]
    #[diagnostic(code(logbridge::network::spawn_worker))]
    SpawnWorker {
        sink: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not build webhook HTTP client")]
    #[diagnostic(code(logbridge::webhook::client))]
    WebhookClient(#[source] reqwest::Error),

    #[error("Webhook request to {url} failed")]
    #[diagnostic(code(logbridge::webhook::send))]
    WebhookSend {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Could not resolve remote collector address {host}:{port}")]
    #[diagnostic(code(logbridge::collector::resolve))]
    CollectorResolve {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Remote collector {host}:{port} is unreachable")]
    #[diagnostic(code(logbridge::collector::unreachable))]
    CollectorUnreachable {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not connect to remote collector {host}:{port} after {attempts} attempt(s)")]
    #[diagnostic(
        code(logbridge::collector::connect),
        help("The collector sink is now silent, restart the process to retry")
    )]
    CollectorConnect {
        host: String,
        port: u16,
        attempts: u32,
        #[source]
        source: Box<LogBridgeError>,
    },

    #[error("TLS error while talking to the remote collector")]
    #[diagnostic(code(logbridge::collector::tls))]
    Tls(#[source] native_tls::Error),

    #[error("TLS handshake with the remote collector {host} failed: {reason}")]
    #[diagnostic(code(logbridge::collector::tls_handshake))]
    TlsHandshake { host: String, reason: String },

    #[error("Could not encode log record as JSON")]
    #[diagnostic(code(logbridge::collector::encode))]
    RecordEncode(#[source] serde_json::Error),

    #[error("Could not write to the remote collector")]
    #[diagnostic(code(logbridge::collector::write))]
    CollectorWrite(#[source] std::io::Error),
}
