//! Configuration system for devcell.
//!
//! This module provides the configuration structures and CLI definitions for
//! devcell. Configuration loading and precedence merging is handled by the
//! `ortho_config` crate. Precedence: CLI flags override environment variables,
//! which override configuration files, which override defaults.
//!
//! The configuration file is expected at `~/.config/devcell/config.toml` by
//! default.
//!
//! # Example Configuration
//!
//! ```toml
//! engine_socket = "unix:///run/user/1000/podman/podman.sock"
//! image = "node:22-alpine"
//!
//! [workspace]
//! root = "/srv/devcell/workspace"
//!
//! [sandbox]
//! workdir = "/app"
//! dev_server_port = 5173
//! bootstrap = ["apk add --no-cache git", "npm install"]
//!
//! [readiness]
//! initial_delay_ms = 250
//! max_delay_ms = 2000
//! timeout_secs = 60
//! ```

mod cli;
mod loader;
mod types;


pub use cli::{
    Cli, Commands, LogsArgs, MoveArgs, PathArgs, ReadArgs, ReplaceArgs, RunArgs, SearchArgs,
    SessionArgs, WriteArgs,
};
pub use loader::{env_var_names, load_config};
pub use types::{
    AppConfig, DEFAULT_BOOTSTRAP_COMMANDS, DEFAULT_IMAGE, ReadinessConfig, SandboxConfig,
    WorkspaceConfig,
};
