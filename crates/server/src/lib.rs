//! HTTP + Server-Sent Events transport for the MCP demo server.
//!
//! `GET /sse` opens a session and streams its outbound frames;
//! `POST /messages?sessionId=<id>` feeds client frames into it.

pub mod api;
pub mod config;
pub mod sessions;

pub use config::{AppState, ServerConfig};
pub use sessions::{SessionGuard, SessionTable};
