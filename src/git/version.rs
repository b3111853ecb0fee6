use crate::error::{GitError, GitResult};
use crate::git::executor::CommandRunner;
use std::path::Path;

/// Minimum required git version
const MIN_GIT_VERSION: (u32, u32) = (2, 20);

/// Represents a git version
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct GitVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl GitVersion {
    /// Detect the version of the `binary` git executable
    pub async fn detect(runner: &dyn CommandRunner, binary: &str) -> GitResult<Self> {
        let result = runner
            .run(binary, &["--version".to_string()], Path::new("."), None)
            .await;

        if let Some(error) = &result.error {
            return Err(GitError::GitVersionDetectionFailed(error.to_string()));
        }

        Self::parse(&result.stdout_text())
    }

    /// Parse `git --version` output such as `git version 2.39.3 (Apple Git-146)`
    pub fn parse(version_str: &str) -> GitResult<Self> {
        let unexpected =
            || GitError::ParseError(format!("Unexpected git version format: {}", version_str.trim()));

        let number = version_str
            .trim()
            .strip_prefix("git version ")
            .and_then(|rest| rest.split_whitespace().next())
            .ok_or_else(unexpected)?;

        let mut fields = number.split('.');
        let mut next_number = |required: bool| -> GitResult<u32> {
            match fields.next().map(str::parse::<u32>) {
                Some(Ok(value)) => Ok(value),
                // Vendor builds append non-numeric fields after the patch level
                Some(Err(_)) | None if !required => Ok(0),
                _ => Err(unexpected()),
            }
        };

        Ok(GitVersion {
            major: next_number(true)?,
            minor: next_number(true)?,
            patch: next_number(false)?,
        })
    }

    /// Check if this version meets minimum requirements
    pub fn is_supported(&self) -> bool {
        self.major > MIN_GIT_VERSION.0
            || (self.major == MIN_GIT_VERSION.0 && self.minor >= MIN_GIT_VERSION.1)
    }

    /// Detect the installed version and fail when it is too old
    pub async fn validate(runner: &dyn CommandRunner, binary: &str) -> GitResult<Self> {
        let version = Self::detect(runner, binary).await?;

        if !version.is_supported() {
            return Err(GitError::GitVersionTooOld(format!(
                "{}\n\nPlease upgrade git to version {}.{} or higher.",
                version, MIN_GIT_VERSION.0, MIN_GIT_VERSION.1
            )));
        }

        Ok(version)
    }
}

impl std::fmt::Display for GitVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
