use serde::Deserialize;
use std::collections::HashMap;

/// Subset of Gerrit's `ChangeInfo` entity used by the session
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ChangeInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub change_id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "_number")]
    pub number: u64,
    #[serde(default)]
    pub current_revision: Option<String>,
    #[serde(default)]
    pub revisions: HashMap<String, RevisionInfo>,
}

impl ChangeInfo {
    /// Patch set number of the current revision, when the query asked for it
    pub fn current_patch_set(&self) -> Option<u32> {
        self.current_revision
            .as_ref()
            .and_then(|rev| self.revisions.get(rev))
            .map(|rev| rev.number)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RevisionInfo {
    #[serde(rename = "_number")]
    pub number: u32,
    #[serde(default, rename = "ref")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BranchInfo {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub revision: Option<String>,
}

impl BranchInfo {
    /// Short branch name for `refs/heads/*` refs
    pub fn head_name(&self) -> Option<&str> {
        self.reference.strip_prefix("refs/heads/")
    }
}
