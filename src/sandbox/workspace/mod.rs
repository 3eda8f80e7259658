//! Guarded file and command primitives over a session's workspace.
//!
//! Text reads and mutations go straight to the host-mounted project directory
//! through a `cap-std` directory handle. Deletion, search, `run` and `lint`
//! execute inside the sandbox from its workdir. Every caller-supplied path is
//! resolved by [`PathGuard`] before it reaches either side.

mod text;

use std::fmt;
use std::str::FromStr;

use cap_std::fs_utf8::Dir;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::lifecycle::{run_attached, sandbox_request};
use super::path_guard::{GuardedPath, PathGuard};
use super::{SandboxHandle, SandboxSettings, Session, io_error};
use crate::engine::{CommandLine, CommandResult, ExecMode, SandboxRuntime};
use crate::error::{ContainerError, DevcellError, WorkspaceError};

/// Default number of log lines returned by [`WorkspaceOps::logs`].
pub const DEFAULT_LOG_TAIL: usize = 50;

/// Whether a directory entry is a file or a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Anything that is not a directory.
    File,
    /// A directory, or a symlink to one.
    Folder,
}

/// One immediate child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Entry name.
    pub name: String,
    /// Entry type.
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// Path relative to the project directory.
    pub path: String,
}

/// One matching line reported by [`WorkspaceOps::search`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMatch {
    /// File path relative to the project directory.
    pub file: String,
    /// 1-based line number.
    pub line: u64,
    /// Matching line with surrounding whitespace trimmed.
    pub content: String,
}

/// File text, raw or annotated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    /// The text.
    pub content: String,
}

/// Confirmation returned by mutating operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    /// Always `success`.
    pub status: String,
    /// Human-readable summary.
    pub message: String,
}

impl Acknowledgement {
    fn success(message: String) -> Self {
        Self {
            status: String::from("success"),
            message,
        }
    }
}

/// Tail of the container's combined output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogTail {
    /// Log text.
    pub logs: String,
}

/// What [`WorkspaceOps::write`] creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    /// A regular file, overwritten if present.
    File,
    /// A directory, created with its parents.
    Folder,
}

impl FromStr for WriteKind {
    type Err = DevcellError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "file" => Ok(Self::File),
            "folder" => Ok(Self::Folder),
            _ => Err(invalid_argument("type", "must be 'file' or 'folder'")),
        }
    }
}

impl fmt::Display for WriteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::File => "file",
            Self::Folder => "folder",
        })
    }
}

/// Workspace primitives bound to a live sandbox.
pub struct WorkspaceOps<'a, R: SandboxRuntime + ?Sized> {
    runtime: &'a R,
    session: &'a Session,
    settings: &'a SandboxSettings,
    handle: &'a SandboxHandle,
}

impl<'a, R: SandboxRuntime + ?Sized> WorkspaceOps<'a, R> {
    /// Bind the primitives to a sandbox.
    ///
    /// # Errors
    ///
    /// Returns `WorkspaceError::NoContainer` when `handle` is `None`.
    pub fn bind(
        runtime: &'a R,
        session: &'a Session,
        settings: &'a SandboxSettings,
        handle: Option<&'a SandboxHandle>,
    ) -> Result<Self, DevcellError> {
        let bound = handle.ok_or(WorkspaceError::NoContainer)?;
        Ok(Self {
            runtime,
            session,
            settings,
            handle: bound,
        })
    }

    /// List the immediate children of `subpath`, folders first, then by name.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` for paths outside the project, `NotFound`
    /// when the path does not exist, and `InvalidArgument` for files.
    pub fn list(&self, subpath: &str) -> Result<Vec<FileEntry>, DevcellError> {
        let target = self.guard().resolve(subpath)?;
        let project = self.project()?;
        if !exists(&project, &target)? {
            return Err(not_found(subpath));
        }
        if !project.is_dir(target.relative()) {
            return Err(invalid_argument("path", "not a directory"));
        }

        let dir = project
            .open_dir(target.relative())
            .map_err(|error| io_error(target.absolute(), &error))?;
        let mut entries = Vec::new();
        for entry in dir
            .entries()
            .map_err(|error| io_error(target.absolute(), &error))?
        {
            let name = entry
                .and_then(|found| found.file_name())
                .map_err(|error| io_error(target.absolute(), &error))?;
            let entry_type = if dir.is_dir(&name) {
                EntryType::Folder
            } else {
                EntryType::File
            };
            let path = if target.is_root() {
                name.clone()
            } else {
                target.relative().join(&name).into_string()
            };
            entries.push(FileEntry {
                name,
                entry_type,
                path,
            });
        }

        entries.sort_by(|left, right| {
            folder_rank(left.entry_type)
                .cmp(&folder_rank(right.entry_type))
                .then_with(|| left.name.cmp(&right.name))
        });
        Ok(entries)
    }

    /// Return the text of a file.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the path is missing or a directory.
    pub fn read(&self, path: &str) -> Result<FileContent, DevcellError> {
        let content = self.read_text(path)?;
        Ok(FileContent { content })
    }

    /// Return a file as a Markdown table with line numbers.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Self::read`].
    pub fn read_annotated(&self, path: &str) -> Result<FileContent, DevcellError> {
        let content = text::annotate(&self.read_text(path)?);
        Ok(FileContent { content })
    }

    /// Create a folder, or create or overwrite a file.
    ///
    /// Missing parents are created in both cases; creating an existing folder
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` for paths outside the project and
    /// `InvalidArgument` when a file would replace the project directory.
    pub fn write(
        &self,
        path: &str,
        kind: WriteKind,
        content: Option<&str>,
    ) -> Result<Acknowledgement, DevcellError> {
        let target = self.guard().resolve(path)?;
        let project = self.project()?;

        match kind {
            WriteKind::Folder => {
                project
                    .create_dir_all(target.relative())
                    .map_err(|error| io_error(target.absolute(), &error))?;
                Ok(Acknowledgement::success(format!("Folder {path} created")))
            }
            WriteKind::File => {
                if target.is_root() {
                    return Err(invalid_argument(
                        "path",
                        "the project directory is not a file",
                    ));
                }
                if let Some(parent) = target.relative_parent() {
                    project
                        .create_dir_all(parent)
                        .map_err(|error| io_error(target.absolute(), &error))?;
                }
                project
                    .write(target.relative(), content.unwrap_or_default())
                    .map_err(|error| io_error(target.absolute(), &error))?;
                debug!(path = %target.relative(), "file written");
                Ok(Acknowledgement::success(format!("File {path} created")))
            }
        }
    }

    /// Recursively remove `path` from inside the sandbox.
    ///
    /// A symlink is removed itself, not its target. Removing a missing path
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` for paths outside the project,
    /// `InvalidArgument` for the project directory itself, and
    /// `ContainerError::CommandFailed` when the removal exits non-zero.
    pub async fn delete(&self, path: &str) -> Result<Acknowledgement, DevcellError> {
        let target = self.guard().resolve_entry(path)?;
        if target.is_root() {
            return Err(invalid_argument(
                "path",
                "the project directory cannot be deleted",
            ));
        }

        let command = CommandLine::new("rm")
            .args(["-rf", "--"])
            .arg(target.relative().as_str());
        self.run_checked(command).await?;
        Ok(Acknowledgement::success(format!("Deleted {path}")))
    }

    /// Search the project for lines containing `term` literally.
    ///
    /// Binary files are skipped. No matches is an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty term, or a runtime error.
    pub async fn search(&self, term: &str) -> Result<Vec<SearchMatch>, DevcellError> {
        if term.is_empty() {
            return Err(invalid_argument("term", "must not be empty"));
        }

        let command = CommandLine::new("grep")
            .args(["-r", "-n", "-I", "-F", "-e"])
            .arg(term)
            .arg(".");
        let result = self.run_attached(command).await?;
        if !result.succeeded() && result.output.is_empty() {
            return Ok(Vec::new());
        }
        Ok(text::parse_matches(&result.output))
    }

    /// Replace the single exact occurrence of `search` in a file.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing file, `InvalidArgument` for an empty
    /// search block, `NoMatch` when it does not occur and `AmbiguousMatch`
    /// when it occurs more than once. The file is untouched on error.
    pub fn replace_block(
        &self,
        path: &str,
        search: &str,
        replace: &str,
    ) -> Result<Acknowledgement, DevcellError> {
        if search.is_empty() {
            return Err(invalid_argument("search", "must not be empty"));
        }
        let target = self.guard().resolve(path)?;
        let project = self.project()?;
        if !project.is_file(target.relative()) {
            return Err(not_found(path));
        }

        let original = project
            .read_to_string(target.relative())
            .map_err(|error| io_error(target.absolute(), &error))?;
        match original.matches(search).count() {
            0 => Err(DevcellError::from(WorkspaceError::NoMatch {
                path: String::from(path),
            })),
            1 => {
                let updated = original.replacen(search, replace, 1);
                project
                    .write(target.relative(), updated)
                    .map_err(|error| io_error(target.absolute(), &error))?;
                Ok(Acknowledgement::success(String::from(
                    "Code block replaced successfully.",
                )))
            }
            count => Err(DevcellError::from(WorkspaceError::AmbiguousMatch {
                path: String::from(path),
                count,
            })),
        }
    }

    /// Move or rename `source` to `destination`, creating missing parents.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` when either path is outside the project,
    /// `NotFound` when `source` is missing, `InvalidArgument` when `source` is
    /// the project directory and `AlreadyExists` when `destination` exists.
    pub fn move_item(
        &self,
        source: &str,
        destination: &str,
    ) -> Result<Acknowledgement, DevcellError> {
        let guard = self.guard();
        let from = guard.resolve_entry(source)?;
        let to = guard.resolve_entry(destination)?;
        let project = self.project()?;

        if from.is_root() {
            return Err(invalid_argument(
                "source",
                "the project directory cannot be moved",
            ));
        }
        if !exists(&project, &from)? {
            return Err(not_found(source));
        }
        if exists(&project, &to)? {
            return Err(DevcellError::from(WorkspaceError::AlreadyExists {
                path: String::from(destination),
            }));
        }
        if let Some(parent) = to.relative_parent() {
            project
                .create_dir_all(parent)
                .map_err(|error| io_error(to.absolute(), &error))?;
        }
        project
            .rename(from.relative(), &project, to.relative())
            .map_err(|error| io_error(from.absolute(), &error))?;
        Ok(Acknowledgement::success(format!(
            "Moved {source} to {destination}"
        )))
    }

    /// Run `command` through `sh -c` in the sandbox workdir.
    ///
    /// Non-zero exits are returned, not raised.
    ///
    /// # Errors
    ///
    /// Returns a runtime error when the command cannot be executed.
    pub async fn run(&self, command: &str) -> Result<CommandResult, DevcellError> {
        self.run_attached(CommandLine::shell(command)).await
    }

    /// Run the configured type-check command.
    ///
    /// # Errors
    ///
    /// Returns a runtime error when the command cannot be executed.
    pub async fn lint(&self) -> Result<CommandResult, DevcellError> {
        self.run_attached(self.settings.lint_command.clone()).await
    }

    /// Return the last `tail` lines of the container's output.
    ///
    /// # Errors
    ///
    /// Returns a runtime error when the logs cannot be read.
    pub async fn logs(&self, tail: usize) -> Result<LogTail, DevcellError> {
        let logs = self.runtime.logs(&self.handle.container_id, tail).await?;
        Ok(LogTail { logs })
    }

    fn guard(&self) -> PathGuard<'a> {
        PathGuard::new(self.session.project_dir())
    }

    fn project(&self) -> Result<Dir, DevcellError> {
        let project_dir = self.session.project_dir();
        Dir::open_ambient_dir(project_dir, cap_std::ambient_authority())
            .map_err(|error| io_error(project_dir, &error))
    }

    fn read_text(&self, path: &str) -> Result<String, DevcellError> {
        let target = self.guard().resolve(path)?;
        let project = self.project()?;
        if !project.is_file(target.relative()) {
            return Err(DevcellError::from(WorkspaceError::NotAFile {
                path: String::from(path),
            }));
        }
        project
            .read_to_string(target.relative())
            .map_err(|error| io_error(target.absolute(), &error))
    }

    async fn run_attached(&self, command: CommandLine) -> Result<CommandResult, DevcellError> {
        let request = sandbox_request(
            &self.handle.container_id,
            &self.settings.workdir,
            command,
            ExecMode::Attached,
        )?;
        run_attached(self.runtime, &request).await
    }

    async fn run_checked(&self, command: CommandLine) -> Result<CommandResult, DevcellError> {
        let rendered = command.to_string();
        let result = self.run_attached(command).await?;
        if result.succeeded() {
            return Ok(result);
        }
        Err(DevcellError::from(ContainerError::CommandFailed {
            container_id: self.handle.container_id.clone(),
            command: rendered,
            exit_code: result.exit_code,
            output: result.output,
        }))
    }
}

fn exists(project: &Dir, target: &GuardedPath) -> Result<bool, DevcellError> {
    match project.symlink_metadata(target.relative()) {
        Ok(_) => Ok(true),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(error) => Err(io_error(target.absolute(), &error)),
    }
}

const fn folder_rank(entry_type: EntryType) -> u8 {
    match entry_type {
        EntryType::Folder => 0,
        EntryType::File => 1,
    }
}

fn not_found(path: &str) -> DevcellError {
    DevcellError::from(WorkspaceError::NotFound {
        path: String::from(path),
    })
}

fn invalid_argument(argument: &str, reason: &str) -> DevcellError {
    DevcellError::from(WorkspaceError::InvalidArgument {
        argument: String::from(argument),
        reason: String::from(reason),
    })
}
