//! Subprocess transport: frames travel over a child's stdin/stdout.

use super::{Transport, INBOUND_CAPACITY};
use crate::error::{SdkError, SdkResult};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::process::Stdio;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{mpsc, Mutex};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::{debug, info, warn};

/// Spawns `command args...` on connect. There is one implicit session per
/// child; dropping its stdin on close is the only teardown signal it gets.
pub struct StdioTransport {
    command: String,
    args: Vec<String>,
    stdin: Mutex<Option<FramedWrite<ChildStdin, LinesCodec>>>,
    child: Mutex<Option<Child>>,
}

impl StdioTransport {
    pub fn new(command: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
            stdin: Mutex::new(None),
            child: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn connect(&mut self) -> SdkResult<mpsc::Receiver<String>> {
        debug!(command = %self.command, args = ?self.args, "Spawning server process");
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SdkError::Connection(format!("Failed to spawn {}: {}", self.command, e)))?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => return Err(SdkError::Connection("Child stdio is not piped".to_string())),
        };
        info!(command = %self.command, pid = ?child.id(), "Server process started");

        let (tx, rx) = mpsc::channel(INBOUND_CAPACITY);
        let mut lines = FramedRead::new(stdout, LinesCodec::new());
        tokio::spawn(async move {
            while let Some(line) = lines.next().await {
                match line {
                    Ok(line) if line.trim().is_empty() => continue,
                    Ok(line) => {
                        if tx.send(line).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to read from server process");
                        break;
                    }
                }
            }
            debug!("Server process output closed");
        });

        *self.stdin.lock().await = Some(FramedWrite::new(stdin, LinesCodec::new()));
        *self.child.lock().await = Some(child);
        Ok(rx)
    }

    async fn send(&self, frame: String) -> SdkResult<()> {
        let mut stdin = self.stdin.lock().await;
        let sink = stdin
            .as_mut()
            .ok_or_else(|| SdkError::Write("Transport is closed".to_string()))?;
        sink.send(frame)
            .await
            .map_err(|e| SdkError::Write(e.to_string()))
    }

    async fn close(&self) -> SdkResult<()> {
        // Dropping stdin delivers EOF to the child
        let Some(mut sink) = self.stdin.lock().await.take() else {
            return Ok(());
        };
        if let Err(e) = SinkExt::<String>::close(&mut sink).await {
            debug!(error = %e, "Failed to flush stdin on close");
        }
        drop(sink);

        if let Some(mut child) = self.child.lock().await.take() {
            match child.wait().await {
                Ok(status) => info!(%status, "Server process exited"),
                Err(e) => warn!(error = %e, "Failed to wait for server process"),
            }
        }
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frames_round_trip_through_child() {
        let mut transport = StdioTransport::new("cat", Vec::<String>::new());
        let mut inbound = transport.connect().await.unwrap();

        transport.send(r#"{"jsonrpc":"2.0","method":"ping"}"#.to_string()).await.unwrap();
        assert_eq!(
            inbound.recv().await.unwrap(),
            r#"{"jsonrpc":"2.0","method":"ping"}"#
        );

        transport.close().await.unwrap();
        assert!(inbound.recv().await.is_none());

        // second close is a no-op, sending afterwards is a write error
        transport.close().await.unwrap();
        assert!(matches!(
            transport.send("{}".to_string()).await,
            Err(SdkError::Write(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_command_is_connection_error() {
        let mut transport = StdioTransport::new("/nonexistent/toolwire-server", ["--flag"]);
        assert!(matches!(
            transport.connect().await,
            Err(SdkError::Connection(_))
        ));
    }
}
