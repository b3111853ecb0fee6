use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use super::snapshot::{FileQuickPick, FileSnapshot};
use crate::error::GitResult;
use crate::git::parser::{self, FileEntry, FileStatus};
use crate::git::repository::GitFacade;

/// Options for each `ls-files` query
const MODIFIED_QUERY: &[&str] = &["--exclude-standard", "-m"];
const DELETED_QUERY: &[&str] = &["--exclude-standard", "-d"];
const UNTRACKED_QUERY: &[&str] = &["--exclude-standard", "-o"];
const STAGED_QUERY: &[&str] = &["--name-status", "--cached"];

/// Keeps the latest [`FileSnapshot`] of a working tree
///
/// Every refresh re-queries git and swaps in a fresh snapshot; readers see
/// either the previous snapshot or the new one, never a mix.
#[derive(Debug)]
pub struct FileStatusAggregator {
    git: Arc<GitFacade>,
    snapshot: RwLock<FileSnapshot>,
}

impl FileStatusAggregator {
    pub fn new(git: Arc<GitFacade>) -> Self {
        Self {
            git,
            snapshot: RwLock::new(FileSnapshot::default()),
        }
    }

    /// Rebuild the snapshot from the modified, deleted, untracked and staged queries
    ///
    /// The four queries run concurrently; any failure fails the whole refresh
    /// and leaves the previous snapshot in place.
    pub async fn refresh(&self) -> GitResult<FileSnapshot> {
        let (modified, deleted, untracked, staged) = tokio::try_join!(
            self.git.list_files(MODIFIED_QUERY),
            self.git.list_files(DELETED_QUERY),
            self.git.list_files(UNTRACKED_QUERY),
            self.git.diff(STAGED_QUERY, &[]),
        )?;

        let mut entries: Vec<FileEntry> = parser::parse_file_list(&deleted, FileStatus::Deleted);
        entries.extend(parser::parse_file_list(&modified, FileStatus::Modified));
        entries.extend(parser::parse_file_list(&untracked, FileStatus::Untracked));
        entries.extend(parser::parse_staged_status(&staged)?);

        let snapshot = FileSnapshot::from_entries(entries);
        debug!(entries = snapshot.len(), "file status refreshed");

        *self.snapshot.write().await = snapshot.clone();
        Ok(snapshot)
    }

    /// The most recently refreshed snapshot
    pub async fn snapshot(&self) -> FileSnapshot {
        self.snapshot.read().await.clone()
    }

    pub async fn is_dirty(&self) -> bool {
        self.snapshot.read().await.is_dirty()
    }

    pub async fn filter(&self, statuses: &[FileStatus]) -> Vec<FileEntry> {
        self.snapshot
            .read()
            .await
            .filter(statuses)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn descriptors(&self, statuses: &[FileStatus]) -> Vec<FileQuickPick> {
        self.snapshot.read().await.descriptors(statuses)
    }
}
