//! Configuration data types for devcell.

use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoResult, PostMergeContext, PostMergeHook};
use serde::{Deserialize, Serialize};

/// Image used for sandboxes when none is configured.
pub const DEFAULT_IMAGE: &str = "node:22-alpine";

/// Commands run in order inside a freshly created sandbox.
pub const DEFAULT_BOOTSTRAP_COMMANDS: &[&str] = &[
    "apk add --no-cache git",
    "npx -y degit OMGATE23/vite-react-ts-tailwind-router-template . --force",
    "npm install",
];

/// Host-side workspace configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Directory under which one project directory per session is created.
    pub root: Utf8PathBuf,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: Utf8PathBuf::from("workspace"),
        }
    }
}

/// Sandbox container layout and the commands run inside it.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// In-container path where the project directory is bind-mounted.
    pub workdir: String,

    /// Container port the dev server listens on; published to a host port.
    pub dev_server_port: u16,

    /// Host name used when rendering the dev-server URL.
    pub url_host: String,

    /// Long-running command that keeps the container alive.
    pub keep_alive_command: String,

    /// Bootstrap commands; `None` selects [`DEFAULT_BOOTSTRAP_COMMANDS`].
    pub bootstrap: Option<Vec<String>>,

    /// Command exiting zero when the dev server process is running.
    pub dev_server_probe: String,

    /// Command launching the dev server (run detached).
    pub dev_server_command: String,

    /// Type-check command run by `lint`.
    pub lint_command: String,
}

impl SandboxConfig {
    /// Return the bootstrap commands, falling back to the built-in sequence.
    #[must_use]
    pub fn bootstrap_commands(&self) -> Vec<String> {
        self.bootstrap.clone().unwrap_or_else(|| {
            DEFAULT_BOOTSTRAP_COMMANDS
                .iter()
                .map(|command| String::from(*command))
                .collect()
        })
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            workdir: String::from("/app"),
            dev_server_port: 5173,
            url_host: String::from("localhost"),
            keep_alive_command: String::from("tail -f /dev/null"),
            bootstrap: None,
            dev_server_probe: String::from("pgrep -f vite"),
            dev_server_command: String::from("npm run dev -- --host"),
            lint_command: String::from("npx tsc --noEmit"),
        }
    }
}

/// Bounded exponential backoff used while waiting for readiness.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReadinessConfig {
    /// First delay between probes, in milliseconds.
    pub initial_delay_ms: u64,

    /// Upper bound on the delay between probes, in milliseconds.
    pub max_delay_ms: u64,

    /// Overall budget before giving up, in seconds.
    pub timeout_secs: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 250,
            max_delay_ms: 2_000,
            timeout_secs: 60,
        }
    }
}

/// Root application configuration.
///
/// This structure is loaded from configuration files, environment variables,
/// and command-line arguments with layered precedence. The precedence order
/// (lowest to highest) is: defaults, configuration file, environment variables,
/// command-line arguments.
///
/// Configuration files are discovered in this order:
/// 1. Path specified via `DEVCELL_CONFIG_PATH` environment variable
/// 2. `.devcell.toml` in the current working directory
/// 3. `.devcell.toml` in the home directory
/// 4. `~/.config/devcell/config.toml` (XDG default)
#[derive(Debug, Clone, Default, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(
    prefix = "DEVCELL",
    post_merge_hook,
    discovery(
        app_name = "devcell",
        env_var = "DEVCELL_CONFIG_PATH",
        config_file_name = "config.toml",
        dotfile_name = ".devcell.toml",
        config_cli_long = "config",
        config_cli_visible = true,
    )
)]
pub struct AppConfig {
    /// The container engine socket path or URL.
    pub engine_socket: Option<String>,

    /// The container image used for new sandboxes.
    pub image: Option<String>,

    /// Host workspace configuration.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub workspace: WorkspaceConfig,

    /// Sandbox layout and command configuration.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub sandbox: SandboxConfig,

    /// Readiness polling configuration.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub readiness: ReadinessConfig,
}

impl AppConfig {
    /// Return the configured image, or [`DEFAULT_IMAGE`] when unset or blank.
    #[must_use]
    pub fn sandbox_image(&self) -> &str {
        self.image
            .as_deref()
            .map(str::trim)
            .filter(|image| !image.is_empty())
            .unwrap_or(DEFAULT_IMAGE)
    }
}

impl PostMergeHook for AppConfig {
    fn post_merge(&mut self, _ctx: &PostMergeContext) -> OrthoResult<()> {
        // Blank sockets behave like an unset socket so environment fallbacks apply.
        if self
            .engine_socket
            .as_deref()
            .is_some_and(|socket| socket.trim().is_empty())
        {
            self.engine_socket = None;
        }
        Ok(())
    }
}
