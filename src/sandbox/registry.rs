//! Per-session orchestrators shared by an embedding application.

use std::collections::HashMap;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

use super::{SandboxSettings, Session, SessionOrchestrator};
use crate::engine::SandboxRuntime;
use crate::error::DevcellError;

/// Orchestrator shared between callers of one session.
pub type SharedOrchestrator<R> = Arc<Mutex<SessionOrchestrator<Arc<R>>>>;

/// Maps session identifiers to orchestrators sharing one runtime.
///
/// Each session gets its own async mutex, so calls for one session are
/// serialized while different sessions proceed independently.
pub struct SessionRegistry<R: SandboxRuntime> {
    workspace_root: Utf8PathBuf,
    settings: SandboxSettings,
    runtime: Arc<R>,
    sessions: Mutex<HashMap<String, SharedOrchestrator<R>>>,
}

impl<R: SandboxRuntime> SessionRegistry<R> {
    /// Create an empty registry.
    #[must_use]
    pub fn new(workspace_root: Utf8PathBuf, settings: SandboxSettings, runtime: Arc<R>) -> Self {
        Self {
            workspace_root,
            settings,
            runtime,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Return the workspace root sessions are created under.
    #[must_use]
    pub fn workspace_root(&self) -> &Utf8Path {
        &self.workspace_root
    }

    /// Return the orchestrator for `id`, opening the session on first use.
    ///
    /// # Errors
    ///
    /// Returns `WorkspaceError::InvalidSessionId` or `WorkspaceError::Io` when
    /// the session cannot be opened.
    pub async fn orchestrator(&self, id: &str) -> Result<SharedOrchestrator<R>, DevcellError> {
        let mut sessions = self.sessions.lock().await;
        if let Some(existing) = sessions.get(id) {
            return Ok(Arc::clone(existing));
        }

        let session = Session::open(id, &self.workspace_root)?;
        debug!(session = id, project_dir = %session.project_dir(), "session opened");
        let orchestrator = Arc::new(Mutex::new(SessionOrchestrator::new(
            session,
            Arc::clone(&self.runtime),
            self.settings.clone(),
        )));
        sessions.insert(String::from(id), Arc::clone(&orchestrator));
        Ok(orchestrator)
    }

    /// Return the number of open sessions.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Return true when no session has been opened.
    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}
