//! Sandbox lifecycle: bring a session's container to readiness.
//!
//! A container moves through `absent -> provisioning -> ready` on first use and
//! `stopped -> starting -> ready` afterwards. Readiness means the dev server is
//! running and the engine has published its port.

mod backoff;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

pub use self::backoff::ReadinessPolicy;
use super::{SandboxSettings, Session};
use crate::engine::{
    CommandLine, CommandResult, ContainerStatus, ExecMode, ExecRequest, SandboxRuntime,
};
use crate::error::{ContainerError, DevcellError};

/// Reference to the container serving one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxHandle {
    /// Engine-assigned container identifier.
    pub container_id: String,
    /// Container name, equal to the session identifier.
    pub name: String,
}

/// Where a ready sandbox can be reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessInfo {
    /// Container name.
    pub name: String,
    /// Dev-server URL on the published host port.
    pub url: String,
}

/// Engine-observed state of a session's container before acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// No container with the session's name exists.
    Absent,
    /// The container exists but is not running.
    Stopped,
    /// The container is running.
    Running,
}

impl LifecycleState {
    /// Classify the result of a container lookup.
    #[must_use]
    pub const fn of(status: Option<&ContainerStatus>) -> Self {
        match status {
            None => Self::Absent,
            Some(found) if found.running => Self::Running,
            Some(_) => Self::Stopped,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Absent => "absent",
            Self::Stopped => "stopped",
            Self::Running => "running",
        })
    }
}

/// Drives one session's container to readiness.
pub struct LifecycleManager<'a, R: SandboxRuntime + ?Sized> {
    runtime: &'a R,
    settings: &'a SandboxSettings,
}

impl<'a, R: SandboxRuntime + ?Sized> LifecycleManager<'a, R> {
    /// Create a manager borrowing the runtime and settings.
    #[must_use]
    pub const fn new(runtime: &'a R, settings: &'a SandboxSettings) -> Self {
        Self { runtime, settings }
    }

    /// Ensure the session's sandbox is running and its dev server reachable.
    ///
    /// `slot` is cleared first. A newly created container is stored as soon
    /// as it exists, so a provisioning failure still leaves it referenced. An
    /// existing container is stored only once the sandbox is ready.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::ProvisioningFailed` when a bootstrap command
    /// exits non-zero, `ContainerError::ReadinessTimeout` when the container,
    /// dev server or port does not come up in time, or any runtime error.
    #[instrument(skip_all, fields(session = session.id()))]
    pub async fn acquire(
        &self,
        session: &Session,
        slot: &mut Option<SandboxHandle>,
    ) -> Result<ReadinessInfo, DevcellError> {
        *slot = None;
        self.ensure_image().await?;

        let existing = self.runtime.get_container(session.id()).await?;
        let state = LifecycleState::of(existing.as_ref());
        info!(%state, "acquiring sandbox");

        let handle = match existing {
            None => {
                let created = self.create(session).await?;
                *slot = Some(created.clone());
                self.bootstrap(&created).await?;
                created
            }
            Some(status) => {
                let found = SandboxHandle {
                    container_id: status.id,
                    name: status.name,
                };
                if !status.running {
                    self.start(&found).await?;
                }
                found
            }
        };

        self.ensure_dev_server(&handle).await?;
        let host_port = self.published_port(&handle).await?;
        let url = self.settings.dev_server_url(host_port);
        *slot = Some(handle);
        info!(url = %url, "sandbox ready");

        Ok(ReadinessInfo {
            name: String::from(session.id()),
            url,
        })
    }

    async fn ensure_image(&self) -> Result<(), DevcellError> {
        let image = self.settings.image.as_str();
        if self.runtime.image_exists(image).await? {
            debug!(image, "image present");
            return Ok(());
        }
        info!(image, "pulling sandbox image");
        self.runtime.pull_image(image).await
    }

    async fn create(&self, session: &Session) -> Result<SandboxHandle, DevcellError> {
        info!("provisioning new sandbox");
        let spec = self.settings.container_spec(session);
        let container_id = self.runtime.run_container(&spec).await?;
        Ok(SandboxHandle {
            container_id,
            name: spec.name,
        })
    }

    async fn bootstrap(&self, handle: &SandboxHandle) -> Result<(), DevcellError> {
        for command in &self.settings.bootstrap {
            info!(command = %command, "running bootstrap command");
            let request = sandbox_request(
                &handle.container_id,
                &self.settings.workdir,
                command.clone(),
                ExecMode::Attached,
            )?;
            let result = run_attached(self.runtime, &request).await?;
            if !result.succeeded() {
                return Err(DevcellError::from(ContainerError::ProvisioningFailed {
                    container_id: handle.container_id.clone(),
                    command: command.to_string(),
                    exit_code: result.exit_code,
                    output: result.output,
                }));
            }
        }
        Ok(())
    }

    async fn start(&self, handle: &SandboxHandle) -> Result<(), DevcellError> {
        info!("starting stopped sandbox");
        self.runtime.start_container(&handle.container_id).await?;

        let runtime = self.runtime;
        let name = handle.name.as_str();
        self.settings
            .readiness
            .wait_until(name, "container to run", move || container_running(runtime, name))
            .await
    }

    async fn ensure_dev_server(&self, handle: &SandboxHandle) -> Result<(), DevcellError> {
        let probe = sandbox_request(
            &handle.container_id,
            &self.settings.workdir,
            self.settings.dev_server_probe.clone(),
            ExecMode::Attached,
        )?;
        if dev_server_running(self.runtime, &probe).await?.is_some() {
            debug!("dev server already running");
            return Ok(());
        }

        info!(command = %self.settings.dev_server_command, "launching dev server");
        let launch = sandbox_request(
            &handle.container_id,
            &self.settings.workdir,
            self.settings.dev_server_command.clone(),
            ExecMode::Detached,
        )?;
        self.runtime.exec(&launch).await?;

        let runtime = self.runtime;
        let probe_ref = &probe;
        self.settings
            .readiness
            .wait_until(&handle.name, "dev server", move || {
                dev_server_running(runtime, probe_ref)
            })
            .await
    }

    async fn published_port(&self, handle: &SandboxHandle) -> Result<u16, DevcellError> {
        let runtime = self.runtime;
        let container_id = handle.container_id.as_str();
        let port = self.settings.dev_server_port;
        self.settings
            .readiness
            .wait_until(&handle.name, "published port", move || {
                runtime.port_mapping(container_id, port)
            })
            .await
    }
}

/// Build a request running `command` from the sandbox workdir.
pub(crate) fn sandbox_request(
    container_id: &str,
    workdir: &str,
    command: CommandLine,
    mode: ExecMode,
) -> Result<ExecRequest, DevcellError> {
    Ok(ExecRequest::new(container_id, command, mode)?.with_working_dir(workdir))
}

/// Run an attached request and require a result.
pub(crate) async fn run_attached<R: SandboxRuntime + ?Sized>(
    runtime: &R,
    request: &ExecRequest,
) -> Result<CommandResult, DevcellError> {
    runtime.exec(request).await?.ok_or_else(|| {
        DevcellError::from(ContainerError::ExecFailed {
            container_id: String::from(request.container_id()),
            message: String::from("attached command returned no result"),
        })
    })
}

async fn container_running<R: SandboxRuntime + ?Sized>(
    runtime: &R,
    name: &str,
) -> Result<Option<()>, DevcellError> {
    match runtime.get_container(name).await? {
        Some(status) => Ok(status.running.then_some(())),
        None => Err(DevcellError::from(ContainerError::NotFound {
            container_id: String::from(name),
        })),
    }
}

async fn dev_server_running<R: SandboxRuntime + ?Sized>(
    runtime: &R,
    probe: &ExecRequest,
) -> Result<Option<()>, DevcellError> {
    let result = run_attached(runtime, probe).await?;
    Ok(result.succeeded().then_some(()))
}
