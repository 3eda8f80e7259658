//! Per-session containerized development sandboxes.
//!
//! `devcell` gives an external caller, typically a coding agent, a running
//! and network-reachable development container for each opaque session
//! identifier, backed by an isolated host directory. Guarded primitives let
//! the caller inspect, edit and run commands inside that sandbox without
//! reaching outside the session's project directory.
//!
//! # Architecture
//!
//! Each session owns a project directory under the workspace root, which is
//! bind-mounted into a container named after the session. Text reads and
//! edits act on the host directory; deletion, search and arbitrary commands
//! run inside the container. Every caller-supplied path is resolved and
//! contained before use, and every in-sandbox command is an argv vector.
//!
//! # Modules
//!
//! - [`api`]: Operation dispatch used by the CLI and embedders
//! - [`config`]: Configuration system with layered precedence (CLI > env > file > defaults)
//! - [`engine`]: Container engine connection and the sandbox runtime seam
//! - [`error`]: Semantic error types and the payload error taxonomy
//! - [`sandbox`]: Sessions, lifecycle, path containment and workspace operations

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod sandbox;
