use super::{ApiResult, ErrorResponse};
use crate::config::AppState;
use crate::sessions::SessionGuard;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::Stream;
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use toolwire_core::protocol::JsonRpcMessage;
use toolwire_core::SessionId;
use toolwire_mcp::ServerSession;

/// Open an event stream for a new session.
///
/// The first event is `endpoint`, whose data is the URL the client must
/// POST its frames to. Every later event is a `message` carrying one
/// outbound JSON-RPC frame.
pub async fn open_stream(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let session = Arc::new(ServerSession::new(SessionId::new(), state.mcp.clone()));
    let mut outbound = session.connect()?;

    let endpoint = format!(
        "{}?sessionId={}",
        state.config.paths.messages,
        session.id()
    );
    let guard = SessionGuard::register(state.sessions.clone(), session);
    tracing::info!(
        session = %guard.session().id(),
        active = state.sessions.len(),
        "SSE client connected"
    );

    let stream = async_stream::stream! {
        let _guard = guard;
        yield Ok(Event::default().event("endpoint").data(endpoint));

        while let Some(frame) = outbound.recv().await {
            yield Ok(Event::default().event("message").data(frame));
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// Accept one client frame for an open session.
///
/// Replies `202 Accepted` as soon as the frame is parsed; the JSON-RPC
/// response (if any) travels back over the session's event stream.
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MessageQuery>,
    body: String,
) -> Response {
    let session = query
        .session_id
        .as_deref()
        .and_then(|id| state.sessions.get(&SessionId::from(id)));

    let Some(session) = session else {
        tracing::warn!(session = ?query.session_id, "Message for unknown session");
        return (StatusCode::BAD_REQUEST, "No transport found for sessionId").into_response();
    };

    let message = match JsonRpcMessage::parse(&body) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(session = %session.id(), error = %e, "Rejecting malformed message");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::with_details("Invalid message", e.to_string())),
            )
                .into_response();
        }
    };

    tokio::spawn(async move {
        if let Err(e) = session.dispatch(message).await {
            tracing::warn!(session = %session.id(), error = %e, "Failed to deliver response");
        }
    });

    (StatusCode::ACCEPTED, "Accepted").into_response()
}
