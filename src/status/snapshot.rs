use std::collections::HashMap;

use crate::git::parser::{FileEntry, FileStatus};

/// Selection-list item for presentation code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileQuickPick {
    pub path: String,
    pub label: String,
    pub description: String,
}

impl From<&FileEntry> for FileQuickPick {
    fn from(entry: &FileEntry) -> Self {
        Self {
            path: entry.path.clone(),
            label: entry.path.clone(),
            description: entry.description(),
        }
    }
}

/// Every changed path in the working tree, keyed by `(path, status)`
///
/// A path that is both modified and staged appears twice, once per status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSnapshot {
    entries: HashMap<(String, FileStatus), FileEntry>,
}

impl FileSnapshot {
    pub fn from_entries(entries: impl IntoIterator<Item = FileEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| ((entry.path.clone(), entry.status), entry))
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &str, status: FileStatus) -> Option<&FileEntry> {
        self.entries.get(&(path.to_string(), status))
    }

    /// Number of entries whose status is one of `statuses`
    pub fn count_of(&self, statuses: &[FileStatus]) -> usize {
        self.entries
            .values()
            .filter(|entry| statuses.contains(&entry.status))
            .count()
    }

    /// Modified or deleted tracked files exist; untracked files alone do not count
    pub fn is_dirty(&self) -> bool {
        self.count_of(&[FileStatus::Modified, FileStatus::Deleted]) != 0
    }

    /// Entries with one of `statuses`, grouped in the order given and sorted by path
    pub fn filter(&self, statuses: &[FileStatus]) -> Vec<&FileEntry> {
        let mut matched = Vec::new();
        for status in statuses {
            let mut group: Vec<&FileEntry> = self
                .entries
                .values()
                .filter(|entry| entry.status == *status)
                .collect();
            group.sort_by(|a, b| a.path.cmp(&b.path));
            matched.extend(group);
        }
        matched
    }

    pub fn descriptors(&self, statuses: &[FileStatus]) -> Vec<FileQuickPick> {
        self.filter(statuses).into_iter().map(FileQuickPick::from).collect()
    }
}
