//! Client side of the HTTP + Server-Sent Events transport.

use super::{Transport, INBOUND_CAPACITY};
use crate::error::{SdkError, SdkResult};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::{header, Client};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::io::StreamReader;
use tracing::{debug, info, warn};
use url::Url;

/// One dispatched Server-Sent Event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

/// Incremental `text/event-stream` line parser.
#[derive(Debug, Default)]
pub struct EventParser {
    event: Option<String>,
    data: Vec<String>,
}

impl EventParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line (without its terminator). Returns an event when the
    /// line is the blank line ending one.
    pub fn push(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent {
            event: event.unwrap_or_else(|| "message".to_string()),
            data,
        })
    }
}

/// Connects with `GET <url>`, learns the POST endpoint from the first
/// `endpoint` event and then posts every outbound frame there.
pub struct SseTransport {
    client: Client,
    url: Url,
    endpoint: Option<Url>,
    reader: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl SseTransport {
    pub fn new(url: Url) -> Self {
        Self {
            client: Client::new(),
            url,
            endpoint: None,
            reader: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The POST endpoint announced by the server, once connected.
    pub fn endpoint(&self) -> Option<&Url> {
        self.endpoint.as_ref()
    }
}

#[async_trait]
impl Transport for SseTransport {
    async fn connect(&mut self) -> SdkResult<mpsc::Receiver<String>> {
        debug!(url = %self.url, "Opening event stream");
        let response = self
            .client
            .get(self.url.clone())
            .header(header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| SdkError::Connection(format!("{}: {}", self.url, e)))?;

        if !response.status().is_success() {
            return Err(SdkError::Connection(format!(
                "{} answered {}",
                self.url,
                response.status()
            )));
        }

        let body = Box::pin(response.bytes_stream().map_err(std::io::Error::other));
        let mut lines = FramedRead::new(StreamReader::new(body), LinesCodec::new());
        let mut parser = EventParser::new();

        let endpoint = loop {
            let line = match lines.next().await {
                Some(Ok(line)) => line,
                Some(Err(e)) => return Err(SdkError::Connection(e.to_string())),
                None => {
                    return Err(SdkError::Connection(
                        "Event stream ended before the endpoint event".to_string(),
                    ))
                }
            };
            match parser.push(&line) {
                Some(event) if event.event == "endpoint" => break self.url.join(&event.data)?,
                Some(event) => warn!(event = %event.event, "Ignoring event before endpoint"),
                None => {}
            }
        };
        info!(endpoint = %endpoint, "SSE transport connected");
        self.endpoint = Some(endpoint);

        let (tx, rx) = mpsc::channel(INBOUND_CAPACITY);
        let handle = tokio::spawn(async move {
            while let Some(line) = lines.next().await {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!(error = %e, "Event stream failed");
                        break;
                    }
                };
                match parser.push(&line) {
                    Some(event) if event.event == "message" => {
                        if tx.send(event.data).await.is_err() {
                            break;
                        }
                    }
                    Some(event) => debug!(event = %event.event, "Ignoring event"),
                    None => {}
                }
            }
            debug!("Event stream ended");
        });

        *self.reader.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
        Ok(rx)
    }

    async fn send(&self, frame: String) -> SdkResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SdkError::Write("Transport is closed".to_string()));
        }
        let endpoint = self
            .endpoint
            .clone()
            .ok_or_else(|| SdkError::Write("Transport is not connected".to_string()))?;

        let response = self
            .client
            .post(endpoint)
            .header(header::CONTENT_TYPE, "application/json")
            .body(frame)
            .send()
            .await
            .map_err(|e| SdkError::Write(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SdkError::Write(format!("{}: {}", status, body)));
        }
        Ok(())
    }

    async fn close(&self) -> SdkResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if let Some(handle) = self.reader.lock().unwrap_or_else(|e| e.into_inner()).take() {
            handle.abort();
        }
        info!(url = %self.url, "SSE transport closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(parser: &mut EventParser, text: &str) -> Vec<SseEvent> {
        text.split('\n').filter_map(|line| parser.push(line)).collect()
    }

    #[test]
    fn test_parses_named_events() {
        let mut parser = EventParser::new();
        let events = feed(
            &mut parser,
            "event: endpoint\ndata: /messages?sessionId=abc\n\nevent: message\ndata: {\"id\":1}\n\n",
        );
        assert_eq!(
            events,
            vec![
                SseEvent {
                    event: "endpoint".to_string(),
                    data: "/messages?sessionId=abc".to_string()
                },
                SseEvent {
                    event: "message".to_string(),
                    data: "{\"id\":1}".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_comments_and_keep_alives_are_skipped() {
        let mut parser = EventParser::new();
        let events = feed(&mut parser, ":\n\n: ping\n\ndata: x\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "message");
        assert_eq!(events[0].data, "x");
    }

    #[test]
    fn test_multi_line_data_is_joined() {
        let mut parser = EventParser::new();
        let events = feed(&mut parser, "data:a\ndata: b\n\n");
        assert_eq!(events[0].data, "a\nb");
    }

    #[tokio::test]
    async fn test_send_before_connect_fails() {
        let transport = SseTransport::new(Url::parse("http://127.0.0.1:1/sse").unwrap());
        let err = transport.send("{}".to_string()).await.unwrap_err();
        assert!(matches!(err, SdkError::Write(_)));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let transport = SseTransport::new(Url::parse("http://127.0.0.1:1/sse").unwrap());
        transport.close().await.unwrap();
        transport.close().await.unwrap();
        assert!(matches!(
            transport.send("{}".to_string()).await,
            Err(SdkError::Write(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_connection_error() {
        let mut transport = SseTransport::new(Url::parse("http://127.0.0.1:1/sse").unwrap());
        let err = transport.connect().await.unwrap_err();
        assert!(matches!(err, SdkError::Connection(_)));
    }
}
