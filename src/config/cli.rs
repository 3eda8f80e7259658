//! Command-line argument definitions for devcell.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Command-line interface for devcell.
#[derive(Debug, Parser)]
#[command(name = "devcell")]
#[command(
    author,
    version,
    about = "Per-session containerized development sandboxes"
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file.
    #[arg(long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Container engine socket path or URL.
    #[arg(long, global = true)]
    pub engine_socket: Option<String>,

    /// Container image used for new sandboxes.
    #[arg(long, global = true)]
    pub image: Option<String>,

    /// Directory holding one project directory per session.
    #[arg(long, global = true)]
    pub workspace_root: Option<Utf8PathBuf>,
}

/// Available subcommands.
///
/// Every subcommand acquires the session's sandbox first, then performs its
/// operation and prints the JSON outcome.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Provision or restart the sandbox and print its dev-server URL.
    Acquire(SessionArgs),

    /// List the immediate children of a directory.
    Ls(PathArgs),

    /// Print a file, optionally as a line-numbered table.
    Read(ReadArgs),

    /// Create a folder or write a file.
    Write(WriteArgs),

    /// Recursively delete a path inside the sandbox.
    Rm(PathArgs),

    /// Search the project for a literal term.
    Search(SearchArgs),

    /// Replace one exact block of text in a file.
    Replace(ReplaceArgs),

    /// Move or rename a file or folder.
    Mv(MoveArgs),

    /// Run a shell command inside the sandbox.
    Run(RunArgs),

    /// Run the type checker inside the sandbox.
    Lint(SessionArgs),

    /// Print the tail of the sandbox output.
    Logs(LogsArgs),
}

/// Session selection shared by every subcommand.
#[derive(Debug, Args)]
pub struct SessionArgs {
    /// Session identifier; also the container name.
    #[arg(long, short = 's', required = true)]
    pub session: String,
}

/// Arguments naming one path in the session's project directory.
#[derive(Debug, Args)]
pub struct PathArgs {
    /// Target session.
    #[command(flatten)]
    pub target: SessionArgs,

    /// Path relative to the project directory.
    #[arg(default_value = ".")]
    pub path: String,
}

/// Arguments for the `read` subcommand.
#[derive(Debug, Args)]
pub struct ReadArgs {
    /// Target session.
    #[command(flatten)]
    pub target: SessionArgs,

    /// File path relative to the project directory.
    #[arg(required = true)]
    pub path: String,

    /// Render as a Markdown table with line numbers.
    #[arg(long)]
    pub annotated: bool,
}

/// Arguments for the `write` subcommand.
#[derive(Debug, Args)]
pub struct WriteArgs {
    /// Target session.
    #[command(flatten)]
    pub target: SessionArgs,

    /// Path relative to the project directory.
    #[arg(required = true)]
    pub path: String,

    /// Entry kind: `file` or `folder`.
    #[arg(long, default_value = "file")]
    pub kind: String,

    /// File content; empty when omitted.
    #[arg(long)]
    pub content: Option<String>,
}

/// Arguments for the `search` subcommand.
#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Target session.
    #[command(flatten)]
    pub target: SessionArgs,

    /// Literal text to search for.
    #[arg(required = true)]
    pub term: String,
}

/// Arguments for the `replace` subcommand.
#[derive(Debug, Args)]
pub struct ReplaceArgs {
    /// Target session.
    #[command(flatten)]
    pub target: SessionArgs,

    /// File path relative to the project directory.
    #[arg(required = true)]
    pub path: String,

    /// Exact block to replace.
    #[arg(long, required = true)]
    pub search: String,

    /// Replacement block.
    #[arg(long, required = true)]
    pub replace: String,
}

/// Arguments for the `mv` subcommand.
#[derive(Debug, Args)]
pub struct MoveArgs {
    /// Target session.
    #[command(flatten)]
    pub target: SessionArgs,

    /// Existing path.
    #[arg(required = true)]
    pub source: String,

    /// New path; must not exist.
    #[arg(required = true)]
    pub destination: String,
}

/// Arguments for the `run` subcommand.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Target session.
    #[command(flatten)]
    pub target: SessionArgs,

    /// Shell command, joined with spaces.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Arguments for the `logs` subcommand.
#[derive(Debug, Args)]
pub struct LogsArgs {
    /// Target session.
    #[command(flatten)]
    pub target: SessionArgs,

    /// Number of trailing lines.
    #[arg(long, default_value_t = 50)]
    pub lines: usize,
}

impl Commands {
    /// Return the session targeted by this subcommand.
    #[must_use]
    pub fn session(&self) -> &str {
        match self {
            Self::Acquire(args) | Self::Lint(args) => &args.session,
            Self::Ls(args) | Self::Rm(args) => &args.target.session,
            Self::Read(args) => &args.target.session,
            Self::Write(args) => &args.target.session,
            Self::Search(args) => &args.target.session,
            Self::Replace(args) => &args.target.session,
            Self::Mv(args) => &args.target.session,
            Self::Run(args) => &args.target.session,
            Self::Logs(args) => &args.target.session,
        }
    }
}
