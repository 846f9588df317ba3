// Live SSE sessions keyed by id

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use toolwire_core::SessionId;
use toolwire_mcp::ServerSession;

/// Shared id -> session map. An id is present exactly while its event
/// stream is open.
#[derive(Clone, Default)]
pub struct SessionTable {
    inner: Arc<RwLock<HashMap<SessionId, Arc<ServerSession>>>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: Arc<ServerSession>) {
        self.write().insert(session.id().clone(), session);
    }

    pub fn get(&self, id: &SessionId) -> Option<Arc<ServerSession>> {
        self.read().get(id).cloned()
    }

    pub fn remove(&self, id: &SessionId) -> Option<Arc<ServerSession>> {
        self.write().remove(id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<SessionId, Arc<ServerSession>>> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<SessionId, Arc<ServerSession>>> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// Held by an open event stream. Dropping it (client went away or the
/// stream ended) unregisters and closes the session.
pub struct SessionGuard {
    table: SessionTable,
    session: Arc<ServerSession>,
}

impl SessionGuard {
    pub fn register(table: SessionTable, session: Arc<ServerSession>) -> Self {
        table.insert(session.clone());
        Self { table, session }
    }

    pub fn session(&self) -> &Arc<ServerSession> {
        &self.session
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let id = self.session.id();
        self.table.remove(id);
        self.session.close();
        tracing::info!(session = %id, remaining = self.table.len(), "SSE client disconnected");
    }
}
