use crate::error::{GitError, GitResult};
use std::fmt;

/// Classification of a path in the working tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileStatus {
    Modified,
    Deleted,
    Untracked,
    Staged,
    Clean,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileStatus::Modified => "Modified",
            FileStatus::Deleted => "Deleted",
            FileStatus::Untracked => "Untracked",
            FileStatus::Staged => "Staged",
            FileStatus::Clean => "Clean",
        };
        f.write_str(name)
    }
}

/// How a staged path differs from HEAD, from `git diff --name-status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StagedKind {
    Added,
    Copied,
    Deleted,
    Modified,
    Renamed,
    TypeChanged,
    Unmerged,
    Unknown,
}

impl StagedKind {
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'A' => Some(StagedKind::Added),
            'C' => Some(StagedKind::Copied),
            'D' => Some(StagedKind::Deleted),
            'M' => Some(StagedKind::Modified),
            'R' => Some(StagedKind::Renamed),
            'T' => Some(StagedKind::TypeChanged),
            'U' => Some(StagedKind::Unmerged),
            'X' => Some(StagedKind::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for StagedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StagedKind::Added => "Added",
            StagedKind::Copied => "Copied",
            StagedKind::Deleted => "Deleted",
            StagedKind::Modified => "Modified",
            StagedKind::Renamed => "Renamed",
            StagedKind::TypeChanged => "Type Changed",
            StagedKind::Unmerged => "Unmerged",
            StagedKind::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// A single path with its status; `staged_kind` is set only for staged entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: String,
    pub status: FileStatus,
    pub staged_kind: Option<StagedKind>,
}

impl FileEntry {
    pub fn new(path: impl Into<String>, status: FileStatus) -> Self {
        Self {
            path: path.into(),
            status,
            staged_kind: None,
        }
    }

    pub fn staged(path: impl Into<String>, kind: StagedKind) -> Self {
        Self {
            path: path.into(),
            status: FileStatus::Staged,
            staged_kind: Some(kind),
        }
    }

    /// Human-readable status, preferring the staged subtype
    pub fn description(&self) -> String {
        match self.staged_kind {
            Some(kind) if self.status == FileStatus::Staged => kind.to_string(),
            _ => self.status.to_string(),
        }
    }
}

/// Parse newline-delimited `git ls-files` output into entries of one status
pub fn parse_file_list(output: &str, status: FileStatus) -> Vec<FileEntry> {
    output
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(|line| FileEntry::new(line, status))
        .collect()
}

/// Parse `git diff --name-status --cached` output
///
/// Each line is `<code>[score]\t<path>`; renames and copies carry a source and
/// a destination path, of which the destination is kept.
pub fn parse_staged_status(output: &str) -> GitResult<Vec<FileEntry>> {
    let mut entries = Vec::new();

    for line in output.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split('\t');
        let code_field = fields.next().unwrap_or_default();
        let path = fields
            .next_back()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| GitError::ParseError(format!("Missing path in staged entry: {}", line)))?;

        let mut code_chars = code_field.chars();
        let kind = code_chars
            .next()
            .and_then(StagedKind::from_code)
            .filter(|_| code_chars.all(|c| c.is_ascii_digit()))
            .ok_or_else(|| GitError::ParseError(format!("Unrecognized staged status code: {}", code_field)))?;

        entries.push(FileEntry::staged(path, kind));
    }

    Ok(entries)
}

/// Commit author as printed by `git log`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub email: String,
}

/// One entry of the default `git log` output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitLog {
    pub commit: String,
    pub author: Author,
    pub date: String,
    pub comment: String,
    pub change_id: Option<String>,
}

/// Parse a single `git log -n 1` entry
///
/// Expects the `commit`, `Author:` and `Date:` header lines followed by the
/// indented message. A trailing `Change-Id:` footer is lifted out of the
/// message; its absence is not an error.
pub fn parse_log_entry(output: &str) -> GitResult<CommitLog> {
    let mut lines = output.lines().map(|line| line.trim_end_matches('\r'));

    let commit = lines
        .next()
        .and_then(|line| line.strip_prefix("commit "))
        .and_then(|rest| rest.split_whitespace().next())
        .ok_or_else(|| GitError::ParseError("Log entry does not start with a commit line".to_string()))?
        .to_string();

    // Merge commits carry a "Merge:" line before the author
    let author_raw = lines
        .by_ref()
        .find_map(|line| line.strip_prefix("Author:"))
        .ok_or_else(|| GitError::ParseError(format!("Log entry for {} has no author", commit)))?
        .trim();
    let author = parse_author(author_raw);

    let date = lines
        .next()
        .and_then(|line| line.strip_prefix("Date:"))
        .ok_or_else(|| GitError::ParseError(format!("Log entry for {} has no date", commit)))?
        .trim()
        .to_string();

    let mut body = Vec::new();
    let mut change_id = None;
    for line in lines {
        let line = line.trim();
        if let Some(id) = line.strip_prefix("Change-Id:") {
            change_id = Some(id.trim().to_string());
            break;
        }
        body.push(line);
    }

    while body.first().is_some_and(|l| l.is_empty()) {
        body.remove(0);
    }
    while body.last().is_some_and(|l| l.is_empty()) {
        body.pop();
    }

    Ok(CommitLog {
        commit,
        author,
        date,
        comment: body.join("\n"),
        change_id,
    })
}

fn parse_author(raw: &str) -> Author {
    match (raw.find('<'), raw.rfind('>')) {
        (Some(open), Some(close)) if open < close => Author {
            name: raw[..open].trim().to_string(),
            email: raw[open + 1..close].trim().to_string(),
        },
        _ => Author {
            name: raw.to_string(),
            email: String::new(),
        },
    }
}
