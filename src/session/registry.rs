//! External ↔ backend session directory
//!
//! Maps the session ids ADK callers use onto Goose agent session ids. The
//! mapping is a bijection held in one table with a reverse index; both are
//! only ever updated together under the write lock.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument};

use crate::{
    error::{AppError, AppResult},
    routes::metrics::record_session_created,
    session::backend::SessionBackend,
};

/// One external ↔ backend session pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionMapping {
    pub external_id: String,
    pub backend_id: String,
}

#[derive(Debug, Default)]
struct MappingTable {
    by_external: HashMap<String, String>,
    by_backend: HashMap<String, String>,
}

impl MappingTable {
    fn backend_for(&self, external_id: &str) -> Option<&String> {
        self.by_external.get(external_id)
    }

    /// Insert a pair. Fails without touching either index if either id is
    /// already mapped.
    fn insert(&mut self, external_id: &str, backend_id: &str) -> AppResult<()> {
        if let Some(existing) = self.by_external.get(external_id) {
            return Err(AppError::BadRequest(format!(
                "session {} is already mapped to {}",
                external_id, existing
            )));
        }
        if let Some(existing) = self.by_backend.get(backend_id) {
            return Err(AppError::BadRequest(format!(
                "goose session {} is already mapped to {}",
                backend_id, existing
            )));
        }

        self.by_external
            .insert(external_id.to_string(), backend_id.to_string());
        self.by_backend
            .insert(backend_id.to_string(), external_id.to_string());
        Ok(())
    }

    fn remove(&mut self, external_id: &str) -> Option<String> {
        let backend_id = self.by_external.remove(external_id)?;
        self.by_backend.remove(&backend_id);
        Some(backend_id)
    }
}

/// Process-wide session directory
pub struct SessionRegistry {
    table: RwLock<MappingTable>,
    backend: Arc<dyn SessionBackend>,
    working_dir: String,
}

impl SessionRegistry {
    pub fn new(backend: Arc<dyn SessionBackend>, working_dir: impl Into<String>) -> Self {
        Self {
            table: RwLock::new(MappingTable::default()),
            backend,
            working_dir: working_dir.into(),
        }
    }

    /// Resolve the backend id for `external_id`, starting a backend session
    /// on first use.
    ///
    /// The write lock is held across the start call, so concurrent first
    /// uses of one id start exactly one backend session. On failure nothing
    /// is recorded and a later call retries.
    #[instrument(skip(self))]
    pub async fn get_or_create(&self, external_id: &str) -> AppResult<String> {
        if let Some(backend_id) = self.table.read().await.backend_for(external_id) {
            return Ok(backend_id.clone());
        }

        let mut table = self.table.write().await;
        if let Some(backend_id) = table.backend_for(external_id) {
            return Ok(backend_id.clone());
        }

        let backend_id = self
            .backend
            .start_session(&self.working_dir)
            .await
            .map_err(|e| AppError::SessionStart {
                session_id: external_id.to_string(),
                source: Box::new(e),
            })?;

        if let Err(e) = table.insert(external_id, &backend_id) {
            error!(backend_id = %backend_id, error = %e, "Goose returned a session id that is already mapped");
            return Err(AppError::Internal(anyhow::anyhow!(
                "goose session {} is already in use",
                backend_id
            )));
        }

        record_session_created();
        info!(backend_id = %backend_id, "Mapped new session");
        Ok(backend_id)
    }

    /// Map `external_id` onto an existing backend session, resuming it.
    #[instrument(skip(self))]
    pub async fn attach(&self, external_id: &str, backend_id: &str) -> AppResult<String> {
        let mut table = self.table.write().await;
        if table.backend_for(external_id).is_some() || table.by_backend.contains_key(backend_id) {
            return Err(AppError::BadRequest(format!(
                "session {} or goose session {} is already mapped",
                external_id, backend_id
            )));
        }

        let resumed_id = self.backend.resume_session(backend_id).await?;
        table.insert(external_id, &resumed_id)?;

        info!(backend_id = %resumed_id, "Attached existing Goose session");
        Ok(resumed_id)
    }

    /// Unmap `external_id` and stop its backend session.
    ///
    /// Both directions are removed before the backend is contacted; a
    /// failing stop call is reported but the mapping stays removed.
    #[instrument(skip(self))]
    pub async fn stop(&self, external_id: &str) -> AppResult<()> {
        let backend_id = self
            .table
            .write()
            .await
            .remove(external_id)
            .ok_or_else(|| AppError::NotFound(format!("session {}", external_id)))?;

        debug!(backend_id = %backend_id, "Unmapped session, stopping Goose agent");
        self.backend.stop_session(&backend_id).await
    }

    /// Backend id mapped to `external_id`, if any
    pub async fn lookup(&self, external_id: &str) -> Option<String> {
        self.table.read().await.backend_for(external_id).cloned()
    }

    /// External id mapped to `backend_id`, if any
    pub async fn external_for(&self, backend_id: &str) -> Option<String> {
        self.table.read().await.by_backend.get(backend_id).cloned()
    }

    /// Snapshot of all mappings, ordered by external id
    pub async fn list_mappings(&self) -> Vec<SessionMapping> {
        let table = self.table.read().await;
        let mut mappings: Vec<SessionMapping> = table
            .by_external
            .iter()
            .map(|(external_id, backend_id)| SessionMapping {
                external_id: external_id.clone(),
                backend_id: backend_id.clone(),
            })
            .collect();
        mappings.sort_by(|a, b| a.external_id.cmp(&b.external_id));
        mappings
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.by_external.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
