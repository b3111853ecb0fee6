use std::io;
use thiserror::Error;

use crate::config::settings::ConfigError;
use crate::gerrit::client::GerritError;
use crate::git::repository::ConflictState;

/// Errors that can occur during git operations
#[derive(Debug, Error)]
pub enum GitError {
    #[error("{0}")]
    Validation(String),

    #[error("Command 'git {command}' failed with exit code {exit_code}: {reason}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
        reason: String,
    },

    #[error("Git log returned no entries")]
    EmptyLog,

    #[error("Cannot start {requested} while a {pending} is waiting for conflict resolution")]
    ConflictPending {
        pending: ConflictState,
        requested: &'static str,
    },

    #[error("Working tree has uncommitted changes")]
    DirtyTree,

    #[error("Not a git repository")]
    NotARepository,

    #[error("Failed to parse git output: {0}")]
    ParseError(String),

    #[error("Git version {0} is too old. Minimum required: 2.20")]
    GitVersionTooOld(String),

    #[error("Failed to detect git version: {0}")]
    GitVersionDetectionFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl GitError {
    /// Raw stderr of a failed git invocation, if any
    pub fn stderr(&self) -> Option<&str> {
        match self {
            GitError::CommandFailed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

/// Coarse classification used by callers to decide how to surface a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Git,
    Busy,
    Network,
    Parse,
    Config,
    Io,
}

/// Top-level application error that wraps all module-specific errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Gerrit error: {0}")]
    Gerrit(#[from] GerritError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cannot run {operation}: another operation is still in progress")]
    Busy { operation: &'static str },

    #[error("{message}")]
    Conflict {
        message: String,
        #[source]
        source: GitError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Git(err) => git_kind(err),
            AppError::Gerrit(err) => match err {
                GerritError::JsonError(_) | GerritError::InvalidResponse(_) => ErrorKind::Parse,
                _ => ErrorKind::Network,
            },
            AppError::Config(_) => ErrorKind::Config,
            AppError::Busy { .. } => ErrorKind::Busy,
            AppError::Conflict { .. } => ErrorKind::Git,
            AppError::Io(_) => ErrorKind::Io,
        }
    }
}

fn git_kind(err: &GitError) -> ErrorKind {
    match err {
        GitError::Validation(_) | GitError::DirtyTree => ErrorKind::Validation,
        GitError::ParseError(_) => ErrorKind::Parse,
        GitError::IoError(_) => ErrorKind::Io,
        _ => ErrorKind::Git,
    }
}

/// Result type for git operations
pub type GitResult<T> = std::result::Result<T, GitError>;

/// Result type for application-level operations
pub type AppResult<T> = std::result::Result<T, AppError>;
