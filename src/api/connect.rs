//! Engine connection and session opening for the CLI adapter.

use crate::config::AppConfig;
use crate::engine::{DockerRuntime, EngineConnector, SocketResolver};
use crate::error::Result as DevcellResult;
use crate::sandbox::{SandboxSettings, Session, SessionOrchestrator};

/// Open `session_id` under the configured workspace root and bind it to the
/// container engine.
///
/// Settings and the session are validated before the engine is contacted.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` for invalid sandbox settings,
/// `WorkspaceError::InvalidSessionId` for an unusable identifier, and the
/// connection or health-check errors of [`EngineConnector`].
pub async fn open_orchestrator<E: mockable::Env>(
    config: &AppConfig,
    session_id: &str,
    env: &E,
) -> DevcellResult<SessionOrchestrator<DockerRuntime>> {
    let settings = SandboxSettings::from_config(config)?;
    let session = Session::open(session_id, &config.workspace.root)?;

    let resolver = SocketResolver::new(env);
    let docker = EngineConnector::connect_with_fallback_and_verify_async(
        config.engine_socket.as_deref(),
        &resolver,
    )
    .await?;

    Ok(SessionOrchestrator::new(
        session,
        DockerRuntime::new(docker),
        settings,
    ))
}
