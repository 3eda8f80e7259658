//! Container exec lifecycle with output capture and detached launches.
//!
//! This module wraps Bollard exec APIs behind a small trait seam so command
//! execution behaviour can be unit-tested without a live daemon.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bollard::container::LogOutput;
use bollard::exec::{CreateExecOptions, CreateExecResults, StartExecOptions, StartExecResults};
use bollard::{Docker, errors::Error as BollardError};
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::debug;

use super::EngineConnector;
use crate::engine::CommandLine;
use crate::error::{ContainerError, DevcellError, WorkspaceError};

const EXEC_INSPECT_POLL_INTERVAL_MS: u64 = 100;

/// Boxed future type returned by [`ContainerExecClient::create_exec`].
pub type CreateExecFuture<'a> =
    Pin<Box<dyn Future<Output = Result<CreateExecResults, BollardError>> + Send + 'a>>;

/// Boxed future type returned by [`ContainerExecClient::start_exec`].
pub type StartExecFuture<'a> =
    Pin<Box<dyn Future<Output = Result<StartExecResults, BollardError>> + Send + 'a>>;

/// Boxed future type returned by [`ContainerExecClient::inspect_exec`].
pub type InspectExecFuture<'a> = Pin<
    Box<
        dyn Future<Output = Result<bollard::models::ExecInspectResponse, BollardError>> + Send + 'a,
    >,
>;

/// Behaviour required to run and inspect exec sessions.
pub trait ContainerExecClient {
    /// Create an exec session in a running container.
    fn create_exec(
        &self,
        container_id: &str,
        options: CreateExecOptions<String>,
    ) -> CreateExecFuture<'_>;

    /// Start a previously created exec session.
    fn start_exec(&self, exec_id: &str, options: Option<StartExecOptions>) -> StartExecFuture<'_>;

    /// Inspect an exec session for running status and exit code.
    fn inspect_exec(&self, exec_id: &str) -> InspectExecFuture<'_>;
}

impl ContainerExecClient for Docker {
    fn create_exec(
        &self,
        container_id: &str,
        options: CreateExecOptions<String>,
    ) -> CreateExecFuture<'_> {
        let container_id_owned = String::from(container_id);
        Box::pin(async move { Self::create_exec(self, &container_id_owned, options).await })
    }

    fn start_exec(&self, exec_id: &str, options: Option<StartExecOptions>) -> StartExecFuture<'_> {
        let exec_id_owned = String::from(exec_id);
        Box::pin(async move { Self::start_exec(self, &exec_id_owned, options).await })
    }

    fn inspect_exec(&self, exec_id: &str) -> InspectExecFuture<'_> {
        let exec_id_owned = String::from(exec_id);
        Box::pin(async move { Self::inspect_exec(self, &exec_id_owned).await })
    }
}

/// Execution mode for container commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// Capture combined output and wait for the exit code.
    Attached,
    /// Start the process in the background and return immediately.
    Detached,
}

impl ExecMode {
    const fn is_attached(self) -> bool {
        matches!(self, Self::Attached)
    }
}

/// Parameters required to run a command in a running container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRequest {
    container_id: String,
    command: CommandLine,
    working_dir: Option<String>,
    mode: ExecMode,
}

impl ExecRequest {
    /// Create a new command execution request.
    ///
    /// # Errors
    ///
    /// Returns `WorkspaceError::InvalidArgument` when `container_id` or the
    /// command's program is blank.
    pub fn new(
        container_id: impl Into<String>,
        command: CommandLine,
        mode: ExecMode,
    ) -> Result<Self, DevcellError> {
        let container_id_value = container_id.into();
        if container_id_value.trim().is_empty() {
            return Err(invalid_request("container", "container id must not be empty"));
        }
        if command.program().trim().is_empty() {
            return Err(invalid_request(
                "command",
                "command executable must not be empty",
            ));
        }

        Ok(Self {
            container_id: container_id_value,
            command,
            working_dir: None,
            mode,
        })
    }

    /// Run the command from `working_dir` inside the container.
    #[must_use]
    pub fn with_working_dir(mut self, working_dir: impl Into<String>) -> Self {
        self.working_dir = Some(working_dir.into());
        self
    }

    /// Return target container identifier.
    #[must_use]
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Return the command line.
    #[must_use]
    pub const fn command(&self) -> &CommandLine {
        &self.command
    }

    /// Return the in-container working directory, if set.
    #[must_use]
    pub fn working_dir(&self) -> Option<&str> {
        self.working_dir.as_deref()
    }

    /// Return execution mode.
    #[must_use]
    pub const fn mode(&self) -> ExecMode {
        self.mode
    }
}

/// Exit code and combined output of a finished command.
///
/// Output holds stdout and stderr interleaved in the order the engine
/// delivered them, decoded lossily as UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    /// Process exit code.
    pub exit_code: i64,
    /// Combined stdout and stderr.
    pub output: String,
}

impl CommandResult {
    /// Return true when the command exited zero.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

type OutputStream = Pin<Box<dyn Stream<Item = Result<LogOutput, BollardError>> + Send>>;

impl EngineConnector {
    /// Execute a command in a running container.
    ///
    /// Attached requests return the exit code and combined output; detached
    /// requests return `None` as soon as the engine has started the process.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::ExecFailed` when any exec step fails.
    pub async fn exec_async<C: ContainerExecClient>(
        client: &C,
        request: &ExecRequest,
    ) -> Result<Option<CommandResult>, DevcellError> {
        debug!(
            container = request.container_id(),
            command = %request.command(),
            mode = ?request.mode(),
            "executing command in sandbox"
        );

        let create_result = client
            .create_exec(request.container_id(), build_create_exec_options(request))
            .await
            .map_err(|error| {
                exec_failed(
                    request.container_id(),
                    format!("create exec failed: {error}"),
                )
            })?;

        let exec_id = create_result.id;
        let start_result = client
            .start_exec(&exec_id, Some(build_start_exec_options(request)))
            .await
            .map_err(|error| {
                exec_failed(
                    request.container_id(),
                    format!("start exec failed: {error}"),
                )
            })?;

        match (request.mode(), start_result) {
            (ExecMode::Attached, StartExecResults::Attached { output, .. }) => {
                let collected = collect_output_async(request.container_id(), output).await?;
                let exit_code =
                    wait_for_exit_code_async(client, request.container_id(), &exec_id).await?;
                debug!(
                    container = request.container_id(),
                    exit_code, "sandbox command finished"
                );
                Ok(Some(CommandResult {
                    exit_code,
                    output: collected,
                }))
            }
            (ExecMode::Detached, StartExecResults::Detached) => Ok(None),
            (ExecMode::Attached, StartExecResults::Detached) => Err(exec_failed(
                request.container_id(),
                "daemon returned detached start result for attached mode",
            )),
            (ExecMode::Detached, StartExecResults::Attached { .. }) => Err(exec_failed(
                request.container_id(),
                "daemon returned attached start result for detached mode",
            )),
        }
    }
}

async fn collect_output_async(
    container_id: &str,
    mut output: OutputStream,
) -> Result<String, DevcellError> {
    let mut buffer = Vec::new();
    while let Some(chunk) = output.next().await {
        let log_output = chunk
            .map_err(|error| exec_failed(container_id, format!("exec stream failed: {error}")))?;
        buffer.extend_from_slice(&log_output.into_bytes());
    }
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

async fn wait_for_exit_code_async<C: ContainerExecClient>(
    client: &C,
    container_id: &str,
    exec_id: &str,
) -> Result<i64, DevcellError> {
    loop {
        let inspect = client
            .inspect_exec(exec_id)
            .await
            .map_err(|error| exec_failed(container_id, format!("inspect exec failed: {error}")))?;

        if inspect.running.unwrap_or(false) {
            sleep(Duration::from_millis(EXEC_INSPECT_POLL_INTERVAL_MS)).await;
            continue;
        }

        return inspect.exit_code.ok_or_else(|| {
            exec_failed(
                container_id,
                format!("exec session '{exec_id}' completed without an exit code"),
            )
        });
    }
}

fn build_create_exec_options(request: &ExecRequest) -> CreateExecOptions<String> {
    let attached = request.mode().is_attached();
    CreateExecOptions::<String> {
        attach_stdin: Some(false),
        attach_stdout: Some(attached),
        attach_stderr: Some(attached),
        tty: Some(false),
        cmd: Some(request.command().argv()),
        working_dir: request.working_dir().map(String::from),
        ..CreateExecOptions::default()
    }
}

const fn build_start_exec_options(request: &ExecRequest) -> StartExecOptions {
    StartExecOptions {
        detach: !request.mode().is_attached(),
        tty: false,
        output_capacity: None,
    }
}

fn invalid_request(argument: &str, reason: &str) -> DevcellError {
    DevcellError::from(WorkspaceError::InvalidArgument {
        argument: String::from(argument),
        reason: String::from(reason),
    })
}

fn exec_failed(container_id: &str, message: impl Into<String>) -> DevcellError {
    DevcellError::from(ContainerError::ExecFailed {
        container_id: String::from(container_id),
        message: message.into(),
    })
}
