// Copyright (c) 2026 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::time::Duration;

use serde::Serialize;

use crate::{LogBridgeError, Record, RecordSink, ok};

pub const DEFAULT_WEBHOOK_HOST: &str = "127.0.0.1";
pub const DEFAULT_WEBHOOK_PORT: u16 = 9003;
pub const WEBHOOK_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Split `"host:port"`. An empty host becomes [`DEFAULT_WEBHOOK_HOST`]; a missing or
/// unparsable port becomes [`DEFAULT_WEBHOOK_PORT`].
///
/// ```
/// use logbridge::parse_webhook_target;
///
/// assert_eq!(parse_webhook_target("example.com:1234"), ("example.com".to_string(), 1234));
/// assert_eq!(parse_webhook_target("example.com"), ("example.com".to_string(), 9003));
/// assert_eq!(parse_webhook_target(":80"), ("127.0.0.1".to_string(), 80));
/// ```
#[must_use]
pub fn parse_webhook_target(target: &str) -> (String, u16) {
    let (host, port) = match target.split_once(':') {
        Some((host, port)) => (host.trim(), port.trim().parse::<u16>().ok()),
        None => (target.trim(), None),
    };
    let host = if host.is_empty() { DEFAULT_WEBHOOK_HOST } else { host };
    (host.to_string(), port.unwrap_or(DEFAULT_WEBHOOK_PORT))
}

#[derive(Debug, Serialize)]
struct CollectRequest<'a> {
    method: &'static str,
    params: CollectParams<'a>,
}

#[derive(Debug, Serialize)]
struct CollectParams<'a> {
    level: &'a str,
    message: &'a str,
    meta: serde_json::Map<String, serde_json::Value>,
}

/// `POST`s each record as a JSON-RPC style `collect` call to `http://host:port/`.
#[derive(Debug)]
pub struct WebhookSink {
    url: String,
    client: Option<reqwest::blocking::Client>,
}

impl WebhookSink {
    #[must_use]
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            url: format!("http://{host}:{port}/"),
            client: None,
        }
    }

    #[must_use]
    pub fn url(&self) -> &str { &self.url }

    /// The blocking client owns a runtime of its own, so it is built on the worker
    /// thread when the first record arrives. Proxy env vars are ignored, the target is
    /// usually a local collector.
    fn client(&mut self) -> miette::Result<&reqwest::blocking::Client> {
        let client = match self.client.take() {
            Some(client) => client,
            None => reqwest::blocking::Client::builder()
                .timeout(WEBHOOK_REQUEST_TIMEOUT)
                .no_proxy()
                .build()
                .map_err(LogBridgeError::WebhookClient)?,
        };
        Ok(self.client.insert(client))
    }
}

impl RecordSink for WebhookSink {
    fn name(&self) -> &'static str { "webhook" }

    fn deliver(&mut self, record: &Record) -> miette::Result<()> {
        let body = CollectRequest {
            method: "collect",
            params: CollectParams {
                level: record.severity.as_ref(),
                message: &record.message,
                meta: serde_json::Map::new(),
            },
        };
        let url = self.url.clone();
        self.client()?
            .post(&url)
            .json(&body)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|source| LogBridgeError::WebhookSend { url, source })?;
        ok!()
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    use std::{io::{BufRead, BufReader, Read, Write},
              net::TcpListener,
              thread::JoinHandle};

    /// Accept one HTTP request, answer with `status_line`, and return the request path and
    /// body.
    pub(crate) fn serve_one(listener: TcpListener, status_line: &'static str) -> JoinHandle<(String, String)> {
        std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();

            let mut content_length = 0;
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).unwrap();
                let header = header.trim_end();
                if header.is_empty() {
                    break;
                }
                if let Some((name, value)) = header.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
            }

            let mut body = vec![0; content_length];
            reader.read_exact(&mut body).unwrap();

            let mut stream = reader.into_inner();
            write!(stream, "{status_line}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .unwrap();

            (request_line, String::from_utf8(body).unwrap())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use pretty_assertions::assert_eq;

    use super::{test_server::serve_one, *};
    use crate::Severity;

    #[test]
    fn test_parse_webhook_target() {
        assert_eq!(parse_webhook_target("example.com:1234"), ("example.com".into(), 1234));
        assert_eq!(parse_webhook_target("example.com"), ("example.com".into(), 9003));
        assert_eq!(parse_webhook_target("example.com:"), ("example.com".into(), 9003));
        assert_eq!(parse_webhook_target("example.com:http"), ("example.com".into(), 9003));
        assert_eq!(parse_webhook_target(":4000"), ("127.0.0.1".into(), 4000));
        assert_eq!(parse_webhook_target(""), ("127.0.0.1".into(), 9003));
    }

    #[test]
    fn test_deliver_posts_collect_call() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = serve_one(listener, "HTTP/1.1 200 OK");

        let mut sink = WebhookSink::new("127.0.0.1", port);
        sink.deliver(&Record::new(Severity::Warn, "disk almost full"))
            .unwrap();

        let (request_line, body) = server.join().unwrap();
        assert_eq!(request_line.trim_end(), "POST / HTTP/1.1");

        let body: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "method": "collect",
                "params": { "level": "warn", "message": "disk almost full", "meta": {} }
            })
        );
    }

    #[test]
    fn test_deliver_reports_http_errors() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = serve_one(listener, "HTTP/1.1 500 Internal Server Error");

        let mut sink = WebhookSink::new("127.0.0.1", port);
        let result = sink.deliver(&Record::new(Severity::Error, "boom"));
        assert!(result.is_err());

        server.join().unwrap();
    }

    #[test]
    fn test_deliver_to_closed_port_fails() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let mut sink = WebhookSink::new("127.0.0.1", port);
        assert_eq!(sink.url(), format!("http://127.0.0.1:{port}/"));
        assert!(sink.deliver(&Record::new(Severity::Info, "hello")).is_err());
    }
}
