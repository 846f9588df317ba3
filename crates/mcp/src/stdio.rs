// Newline-delimited JSON-RPC over a reader/writer pair (stdin/stdout in production)

use crate::server::McpServer;
use crate::session::ServerSession;
use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinSet;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use toolwire_core::SessionId;
use tracing::{debug, info, warn};

/// Serve the process's stdin/stdout as one implicit session
pub async fn serve_stdio(server: McpServer) -> Result<()> {
    serve(server, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Serve a single session until `reader` reaches EOF.
///
/// Requests are dispatched concurrently; in-flight requests finish and
/// their responses are flushed before this returns.
pub async fn serve<R, W>(server: McpServer, reader: R, writer: W) -> Result<()>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let session = Arc::new(ServerSession::new(SessionId::new(), server));
    let mut outbound = session.connect()?;

    let mut sink = FramedWrite::new(writer, LinesCodec::new());
    let writer_task = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            debug!(frame = %frame, "Sending frame");
            sink.send(frame).await.context("Failed to write frame")?;
        }
        Ok::<_, anyhow::Error>(())
    });

    let mut lines = FramedRead::new(reader, LinesCodec::new());
    let mut in_flight = JoinSet::new();

    while let Some(line) = lines.next().await {
        let line = line.context("Failed to read frame")?;
        if line.trim().is_empty() {
            continue;
        }
        debug!(frame = %line, "Received frame");

        let session = session.clone();
        in_flight.spawn(async move {
            if let Err(e) = session.handle_frame(&line).await {
                warn!(error = %e, "Failed to handle frame");
            }
        });

        while in_flight.try_join_next().is_some() {}
    }

    info!("Input closed, shutting down session");
    while in_flight.join_next().await.is_some() {}
    session.close();

    writer_task.await.context("Writer task panicked")??;
    Ok(())
}
