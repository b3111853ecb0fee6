use crate::error::{AppError, GitError};
use crate::gerrit::client::GerritError;

#[derive(Debug, Clone)]
pub struct UserFriendlyError {
    pub simple_message: String,
    pub suggestion: Option<String>,
    pub raw_error: String,
}

pub struct ErrorTranslator;

impl ErrorTranslator {
    /// Translate an AppError into a user-friendly error message
    pub fn translate_app_error(error: &AppError) -> UserFriendlyError {
        match error {
            AppError::Git(git_err) => Self::translate(git_err),
            AppError::Conflict { message, source } => UserFriendlyError {
                simple_message: message.clone(),
                suggestion: Some(
                    "Fix the conflicting files, stage them, then run 'gflow continue' (or 'gflow abort')"
                        .to_string(),
                ),
                raw_error: source.to_string(),
            },
            AppError::Busy { operation } => UserFriendlyError {
                simple_message: format!("Cannot {} while another operation is running.", operation),
                suggestion: Some("Wait for the current operation to finish and try again".to_string()),
                raw_error: error.to_string(),
            },
            AppError::Gerrit(gerrit_err) => Self::translate_gerrit(gerrit_err),
            AppError::Config(config_err) => UserFriendlyError {
                simple_message: "Configuration error occurred.".to_string(),
                suggestion: Some("Check your config file at ~/.config/gerrit-flow/config.toml".to_string()),
                raw_error: config_err.to_string(),
            },
            AppError::Io(io_err) => UserFriendlyError {
                simple_message: "I/O error occurred.".to_string(),
                suggestion: Some("Check file permissions and disk space".to_string()),
                raw_error: io_err.to_string(),
            },
        }
    }

    /// Translate a GitError into a user-friendly error message
    pub fn translate(error: &GitError) -> UserFriendlyError {
        let raw_error = error.to_string();

        let (simple_message, suggestion) = match error {
            GitError::Validation(message) => (message.clone(), None),
            GitError::EmptyLog => ("There are no commits to show.".to_string(), None),
            GitError::DirtyTree => (
                "Your working tree has uncommitted changes.".to_string(),
                Some("Commit, stash or clean your changes before fetching a change".to_string()),
            ),
            GitError::ConflictPending { pending, .. } => (
                format!("A {} is still waiting for conflict resolution.", pending),
                Some(format!("Continue or abort the {} first", pending)),
            ),
            GitError::CommandFailed { stderr, .. } if !stderr.trim().is_empty() => {
                match Self::match_error_patterns(stderr) {
                    Some(found) => found,
                    None => (stderr.trim().to_string(), None),
                }
            }
            _ => Self::match_error_patterns(&raw_error).unwrap_or_else(|| (raw_error.clone(), None)),
        };

        UserFriendlyError {
            simple_message,
            suggestion,
            raw_error,
        }
    }

    fn translate_gerrit(error: &GerritError) -> UserFriendlyError {
        let (simple_message, suggestion) = match error {
            GerritError::HostNotConfigured => (
                "No Gerrit host is configured.".to_string(),
                Some("Set gerrit.host in ~/.config/gerrit-flow/config.toml".to_string()),
            ),
            GerritError::ApiError { status: 401 | 403, .. } => (
                "Gerrit rejected the credentials.".to_string(),
                Some("Check gerrit.username and the HTTP password environment variable".to_string()),
            ),
            GerritError::ApiError { status: 404, .. } => (
                "Gerrit could not find the requested change or project.".to_string(),
                Some("Check gerrit.project and the change number".to_string()),
            ),
            GerritError::NetworkError(_) => (
                "Could not reach the Gerrit server.".to_string(),
                Some("Check the host, port and your network connection".to_string()),
            ),
            _ => ("Unexpected response from Gerrit.".to_string(), None),
        };

        UserFriendlyError {
            simple_message,
            suggestion,
            raw_error: error.to_string(),
        }
    }

    /// Match common git and Gerrit stderr patterns
    fn match_error_patterns(error_text: &str) -> Option<(String, Option<String>)> {
        let lower = error_text.to_lowercase();

        if lower.contains("does not have any commits yet") {
            return Some(("The repository has no commits yet.".to_string(), None));
        }

        // Gerrit rejects pushes that carry no new commits
        if lower.contains("no new changes") {
            return Some((
                "Gerrit found no new changes to review.".to_string(),
                Some("Commit or amend before pushing again".to_string()),
            ));
        }

        if lower.contains("couldn't find remote ref") {
            return Some((
                "That change or patch set does not exist on the remote.".to_string(),
                Some("Check the change number and patch set".to_string()),
            ));
        }

        if lower.contains("could not apply") || lower.contains("conflict") {
            return Some((
                "The operation stopped on conflicts that need to be resolved.".to_string(),
                Some("Fix conflicts in the listed files, stage them, then continue.".to_string()),
            ));
        }

        if lower.contains("non-fast-forward") || lower.contains("updates were rejected") {
            return Some((
                "The remote rejected the push because the branch has moved on.".to_string(),
                Some("Rebase onto the target branch and push again".to_string()),
            ));
        }

        if lower.contains("would be overwritten") {
            return Some((
                "Local changes would be overwritten by this operation.".to_string(),
                Some("Commit or discard your changes first".to_string()),
            ));
        }

        if lower.contains("nothing to commit") || lower.contains("working tree clean") {
            return Some(("No changes to commit - working directory is clean.".to_string(), None));
        }

        if lower.contains("pathspec") && lower.contains("did not match") {
            return Some((
                "File path not found in the repository.".to_string(),
                Some("Check the file path and try again. Use 'gflow status' to see available files.".to_string()),
            ));
        }

        if lower.contains("not a git repository") {
            return Some((
                "Current directory is not a git repository.".to_string(),
                Some("Run gflow from inside a git checkout".to_string()),
            ));
        }

        if lower.contains("authentication failed")
            || lower.contains("permission denied")
            || lower.contains("could not read from remote repository")
        {
            return Some((
                "Authentication failed when accessing the remote.".to_string(),
                Some("Check your SSH key or HTTP credentials for Gerrit".to_string()),
            ));
        }

        None
    }
}
