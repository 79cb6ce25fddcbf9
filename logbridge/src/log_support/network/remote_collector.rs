// Copyright (c) 2026 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Logstash style collector sink: one JSON object per line over a TCP (or TLS)
//! connection that is kept open between records.
//!
//! ```text
//! {"@timestamp":"2026-10-19T08:15:02.113Z","level":"error","message":"boom",
//!  "node_name":"agent007","meta":{"location":"eu-west","deployment":"staging"}}
//! ```
//!
//! Connecting is retried `max_connect_retries` times (forever if negative), with
//! `timeout_connect_retries` milliseconds in between. Once retries are exhausted the
//! sink goes silent for the rest of the process, and drops every record it receives.

use std::{io::{self, Write},
          net::{TcpStream, ToSocketAddrs},
          time::Duration};

use chrono::SecondsFormat;
use serde::Serialize;

use crate::{LogBridgeError, Record, RecordSink, RemoteCollectorConfig, ok};

/// Lower bound for the pause between connection attempts.
pub const MIN_CONNECT_RETRY_BACKOFF: Duration = Duration::from_millis(10);

/// Have `attempts` connection attempts used up `max_retries` retries? A negative
/// `max_retries` never runs out.
#[must_use]
pub fn is_retry_exhausted(max_retries: i32, attempts: u32) -> bool {
    max_retries >= 0 && i64::from(attempts) - 1 >= i64::from(max_retries)
}

#[derive(Debug)]
pub enum CollectorStream {
    Plain(TcpStream),
    Tls(Box<native_tls::TlsStream<TcpStream>>),
}

impl Write for CollectorStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            CollectorStream::Plain(stream) => stream.write(buf),
            CollectorStream::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            CollectorStream::Plain(stream) => stream.flush(),
            CollectorStream::Tls(stream) => stream.flush(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CollectorLine<'a> {
    #[serde(rename = "@timestamp")]
    timestamp: String,
    level: &'a str,
    message: &'a str,
    node_name: &'a str,
    meta: CollectorMeta<'a>,
}

#[derive(Debug, Serialize)]
struct CollectorMeta<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deployment: Option<&'a str>,
}

#[derive(Debug)]
pub struct RemoteCollectorSink {
    config: RemoteCollectorConfig,
    stream: Option<CollectorStream>,
    is_silent: bool,
}

impl RemoteCollectorSink {
    #[must_use]
    pub fn new(config: RemoteCollectorConfig) -> Self {
        Self {
            config,
            stream: None,
            is_silent: false,
        }
    }

    #[must_use]
    pub fn is_silent(&self) -> bool { self.is_silent }

    /// Render `record` as one line of JSON, including the trailing newline.
    ///
    /// # Errors
    ///
    /// Serializing a record can't really fail, the error is propagated anyway.
    pub fn render_line(&self, record: &Record) -> miette::Result<String> {
        let line = CollectorLine {
            timestamp: record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            level: record.severity.as_ref(),
            message: &record.message,
            node_name: self.config.node_name(),
            meta: CollectorMeta {
                location: self.config.location_name.as_deref(),
                deployment: self.config.deployment.as_deref(),
            },
        };
        let mut acc = serde_json::to_string(&line).map_err(LogBridgeError::RecordEncode)?;
        acc.push('\n');
        Ok(acc)
    }

    fn connect_once(&self) -> Result<CollectorStream, LogBridgeError> {
        let host = self.config.host.as_str();
        let port = self.config.port;

        let addrs = (host, port)
            .to_socket_addrs()
            .map_err(|source| LogBridgeError::CollectorResolve {
                host: host.to_string(),
                port,
                source,
            })?
            .collect::<Vec<_>>();

        let tcp_stream = TcpStream::connect(addrs.as_slice()).map_err(|source| {
            LogBridgeError::CollectorUnreachable {
                host: host.to_string(),
                port,
                source,
            }
        })?;

        if !self.config.ssl_enable {
            return Ok(CollectorStream::Plain(tcp_stream));
        }

        let connector = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(!self.config.reject_unauthorized)
            .danger_accept_invalid_hostnames(!self.config.reject_unauthorized)
            .build()
            .map_err(LogBridgeError::Tls)?;

        let tls_stream = connector.connect(host, tcp_stream).map_err(|error| {
            LogBridgeError::TlsHandshake {
                host: host.to_string(),
                reason: error.to_string(),
            }
        })?;

        Ok(CollectorStream::Tls(Box::new(tls_stream)))
    }

    /// Connect, retrying as configured. On exhaustion the sink goes silent.
    fn try_connect(&mut self) -> miette::Result<()> {
        let max_retries = self.config.max_connect_retries();
        let backoff = self.config.retry_timeout().max(MIN_CONNECT_RETRY_BACKOFF);
        let mut attempts: u32 = 0;
        let stream = loop {
            attempts = attempts.saturating_add(1);
            match self.connect_once() {
                Ok(stream) => break stream,
                Err(error) => {
                    if is_retry_exhausted(max_retries, attempts) {
                        self.is_silent = true;
                        return Err(LogBridgeError::CollectorConnect {
                            host: self.config.host.clone(),
                            port: self.config.port,
                            attempts,
                            source: Box::new(error),
                        }
                        .into());
                    }
                    std::thread::sleep(backoff);
                }
            }
        };
        self.stream = Some(stream);
        ok!()
    }

    fn write_line(&mut self, line: &str) -> miette::Result<()> {
        if self.stream.is_none() {
            self.try_connect()?;
        }
        if let Some(stream) = self.stream.as_mut() {
            stream
                .write_all(line.as_bytes())
                .and_then(|()| stream.flush())
                .map_err(LogBridgeError::CollectorWrite)?;
        }
        ok!()
    }
}

impl RecordSink for RemoteCollectorSink {
    fn name(&self) -> &'static str { "remote collector" }

    fn deliver(&mut self, record: &Record) -> miette::Result<()> {
        if self.is_silent {
            return Ok(());
        }
        let line = self.render_line(record)?;
        match self.write_line(&line) {
            Ok(()) => Ok(()),
            Err(report) if self.is_silent => Err(report),
            Err(_) => {
                // The collector may have closed an idle connection, reconnect once.
                self.stream = None;
                self.write_line(&line)
            }
        }
    }
}
