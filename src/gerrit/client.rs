use crate::gerrit::api::{BranchInfo, ChangeInfo};
use async_trait::async_trait;
use thiserror::Error;

/// Line Gerrit prepends to every JSON response to defeat XSSI
pub const XSSI_PREFIX: &str = ")]}'";

/// Errors that can occur while talking to Gerrit
#[derive(Debug, Error)]
pub enum GerritError {
    #[error("Gerrit host not configured")]
    HostNotConfigured,

    #[error("Gerrit returned status {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid Gerrit response: {0}")]
    InvalidResponse(String),
}

/// Remove the `)]}'` guard line from a Gerrit response body
pub fn strip_xssi_prefix(body: &str) -> &str {
    match body.strip_prefix(XSSI_PREFIX) {
        Some(rest) => rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n')).unwrap_or(rest),
        None => body,
    }
}

/// The Gerrit REST queries the revision session relies on
#[async_trait]
pub trait GerritClient: Send + Sync {
    /// `GET changes/?q=status:open+project:<project>[&n=<limit>]`
    async fn open_changes(&self, project: &str, limit: Option<u32>) -> Result<Vec<ChangeInfo>, GerritError>;

    /// `GET changes/?q=<change>&o=CURRENT_REVISION`
    async fn change_with_current_revision(&self, change: u64) -> Result<ChangeInfo, GerritError>;

    /// `GET projects/<project>/branches/`
    async fn branches(&self, project: &str) -> Result<Vec<BranchInfo>, GerritError>;

    /// `GET changes/<change_id>/revisions/<revision>/review`
    async fn review(&self, change_id: &str, revision: &str) -> Result<ChangeInfo, GerritError>;
}
