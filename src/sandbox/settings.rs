//! Validated sandbox settings derived from [`AppConfig`].

use std::time::Duration;

use crate::config::{AppConfig, ReadinessConfig, SandboxConfig};
use crate::engine::{CommandLine, ContainerSpec};
use crate::error::{ConfigError, DevcellError};

use super::Session;
use super::lifecycle::ReadinessPolicy;

/// Everything the lifecycle and workspace layers need to know about a sandbox.
///
/// Configured commands are split on whitespace into argv vectors; they are
/// not interpreted by a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxSettings {
    /// Image the container is created from.
    pub image: String,
    /// In-container mount point and working directory.
    pub workdir: String,
    /// Port the dev server listens on inside the container.
    pub dev_server_port: u16,
    /// Host used when rendering the dev-server URL.
    pub url_host: String,
    /// Container main process.
    pub keep_alive: CommandLine,
    /// Commands run in order after creation.
    pub bootstrap: Vec<CommandLine>,
    /// Exits zero when the dev server is running.
    pub dev_server_probe: CommandLine,
    /// Launches the dev server.
    pub dev_server_command: CommandLine,
    /// Type-check command.
    pub lint_command: CommandLine,
    /// Backoff used while waiting for readiness.
    pub readiness: ReadinessPolicy,
}

impl SandboxSettings {
    /// Validate the sandbox sections of `config`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when a port is zero, the workdir is
    /// not absolute, a command is blank, or the readiness delays are
    /// inconsistent.
    pub fn from_config(config: &AppConfig) -> Result<Self, DevcellError> {
        let sandbox = &config.sandbox;
        validate_sandbox(sandbox)?;
        let readiness = validate_readiness(&config.readiness)?;

        let bootstrap = sandbox
            .bootstrap_commands()
            .iter()
            .map(|command| parse_command("sandbox.bootstrap", command))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            image: String::from(config.sandbox_image()),
            workdir: sandbox.workdir.clone(),
            dev_server_port: sandbox.dev_server_port,
            url_host: sandbox.url_host.clone(),
            keep_alive: parse_command("sandbox.keep_alive_command", &sandbox.keep_alive_command)?,
            bootstrap,
            dev_server_probe: parse_command("sandbox.dev_server_probe", &sandbox.dev_server_probe)?,
            dev_server_command: parse_command(
                "sandbox.dev_server_command",
                &sandbox.dev_server_command,
            )?,
            lint_command: parse_command("sandbox.lint_command", &sandbox.lint_command)?,
            readiness,
        })
    }

    /// Build the container description for `session`.
    #[must_use]
    pub fn container_spec(&self, session: &Session) -> ContainerSpec {
        ContainerSpec {
            name: String::from(session.id()),
            image: self.image.clone(),
            host_dir: session.project_dir().to_path_buf(),
            workdir: self.workdir.clone(),
            container_port: self.dev_server_port,
            command: self.keep_alive.clone(),
        }
    }

    /// Render the dev-server URL for a published host port.
    #[must_use]
    pub fn dev_server_url(&self, host_port: u16) -> String {
        format!("http://{}:{host_port}", self.url_host)
    }
}

fn validate_sandbox(sandbox: &SandboxConfig) -> Result<(), DevcellError> {
    if sandbox.dev_server_port == 0 {
        return Err(invalid("sandbox.dev_server_port", "must be non-zero"));
    }
    if !sandbox.workdir.starts_with('/') {
        return Err(invalid("sandbox.workdir", "must be an absolute container path"));
    }
    if sandbox.url_host.trim().is_empty() {
        return Err(invalid("sandbox.url_host", "must not be empty"));
    }
    Ok(())
}

fn validate_readiness(readiness: &ReadinessConfig) -> Result<ReadinessPolicy, DevcellError> {
    if readiness.initial_delay_ms == 0 {
        return Err(invalid("readiness.initial_delay_ms", "must be non-zero"));
    }
    if readiness.max_delay_ms < readiness.initial_delay_ms {
        return Err(invalid(
            "readiness.max_delay_ms",
            "must not be less than readiness.initial_delay_ms",
        ));
    }
    if readiness.timeout_secs == 0 {
        return Err(invalid("readiness.timeout_secs", "must be non-zero"));
    }
    Ok(ReadinessPolicy::new(
        Duration::from_millis(readiness.initial_delay_ms),
        Duration::from_millis(readiness.max_delay_ms),
        Duration::from_secs(readiness.timeout_secs),
    ))
}

fn parse_command(field: &str, command: &str) -> Result<CommandLine, DevcellError> {
    let mut words = command.split_whitespace();
    let program = words
        .next()
        .ok_or_else(|| invalid(field, "command must not be empty"))?;
    Ok(CommandLine::new(program).args(words))
}

fn invalid(field: &str, reason: &str) -> DevcellError {
    DevcellError::from(ConfigError::InvalidValue {
        field: String::from(field),
        reason: String::from(reason),
    })
}
