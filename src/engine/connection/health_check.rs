//! Health check and connect-and-verify functionality.

use std::time::Duration;

use bollard::Docker;

use super::{EngineConnector, HEALTH_CHECK_TIMEOUT_SECS, SocketResolver};
use crate::error::{ContainerError, DevcellError};

impl EngineConnector {
    async fn ping_with_timeout(docker: &Docker) -> Result<(), DevcellError> {
        let timeout = Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECS);

        tokio::time::timeout(timeout, docker.ping())
            .await
            .map_err(|_| {
                DevcellError::from(ContainerError::HealthCheckTimeout {
                    seconds: HEALTH_CHECK_TIMEOUT_SECS,
                })
            })?
            .map_err(|e| {
                DevcellError::from(ContainerError::HealthCheckFailed {
                    message: e.to_string(),
                })
            })?;
        Ok(())
    }

    /// Verify the container engine is responsive.
    ///
    /// Sends a ping request to the engine and waits for a response, which
    /// confirms the engine is operational and not just that the socket is
    /// reachable.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::HealthCheckFailed` if the engine does not
    /// respond correctly, or `ContainerError::HealthCheckTimeout` if the check
    /// times out.
    pub async fn health_check_async(docker: &Docker) -> Result<(), DevcellError> {
        Self::ping_with_timeout(docker).await
    }

    /// Connect using fallback resolution and verify the engine responds.
    ///
    /// # Errors
    ///
    /// Returns connection errors from [`Self::connect`] and health check
    /// errors from [`Self::health_check_async`].
    pub async fn connect_with_fallback_and_verify_async<E: mockable::Env>(
        config_socket: Option<&str>,
        resolver: &SocketResolver<'_, E>,
    ) -> Result<Docker, DevcellError> {
        let docker = Self::connect_with_fallback(config_socket, resolver)?;
        Self::ping_with_timeout(&docker).await?;
        Ok(docker)
    }
}
