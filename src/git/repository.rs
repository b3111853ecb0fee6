use crate::audit::{AuditEntry, AuditLogger};
use crate::error::{GitError, GitResult};
use crate::git::executor::{CommandRunner, ProcessError, ProcessRunner};
use crate::git::parser::{self, CommitLog};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Default remote name used for fetch and push
pub const DEFAULT_REMOTE: &str = "origin";

/// Which sequencer operation, if any, is stopped on conflicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictState {
    #[default]
    Idle,
    CherryPick,
    Rebase,
}

impl fmt::Display for ConflictState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictState::Idle => f.write_str("idle"),
            ConflictState::CherryPick => f.write_str("cherry-pick"),
            ConflictState::Rebase => f.write_str("rebase"),
        }
    }
}

/// Runs git subcommands against one working tree
///
/// Every operation funnels through [`GitFacade::git`], which assembles
/// `git <subcommand> [options...] -- [args...]` and runs it in the
/// repository root.
pub struct GitFacade {
    root: PathBuf,
    binary: String,
    runner: Arc<dyn CommandRunner>,
    conflict: RwLock<ConflictState>,
    audit: Option<AuditLogger>,
}

impl fmt::Debug for GitFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitFacade")
            .field("root", &self.root)
            .field("binary", &self.binary)
            .field("audit", &self.audit.is_some())
            .finish()
    }
}

impl GitFacade {
    /// Create a facade for a known repository root using a real process runner
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self::with_runner(root, Arc::new(default_runner()))
    }

    /// Create a facade that runs commands through `runner`
    pub fn with_runner<P: AsRef<Path>>(root: P, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            binary: "git".to_string(),
            runner,
            conflict: RwLock::new(ConflictState::Idle),
            audit: None,
        }
    }

    /// Use a different git executable
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Record every invocation in an audit log
    pub fn with_audit(mut self, audit: AuditLogger) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Detect git repository from current working directory
    pub fn discover() -> GitResult<Self> {
        let current_dir = env::current_dir()?;
        Self::discover_from(current_dir)
    }

    /// Detect git repository starting from a specific directory
    pub fn discover_from<P: AsRef<Path>>(start_path: P) -> GitResult<Self> {
        discover_root(start_path).map(Self::new)
    }

    /// Get the repository root
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn runner(&self) -> Arc<dyn CommandRunner> {
        Arc::clone(&self.runner)
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub async fn conflict_state(&self) -> ConflictState {
        *self.conflict.read().await
    }

    pub async fn cherry_pick_in_progress(&self) -> bool {
        self.conflict_state().await == ConflictState::CherryPick
    }

    pub async fn rebase_in_progress(&self) -> bool {
        self.conflict_state().await == ConflictState::Rebase
    }

    /// Read the conflict state from git's sequencer markers
    ///
    /// Looks for `CHERRY_PICK_HEAD`, `rebase-merge` and `rebase-apply` in the
    /// git directory and replaces the tracked state with what they show. Used
    /// at startup and after every failed sequencer command.
    pub async fn detect_conflict_state(&self) -> GitResult<ConflictState> {
        let git_dir = self.git_dir()?;

        let state = if git_dir.join("CHERRY_PICK_HEAD").exists() {
            ConflictState::CherryPick
        } else if git_dir.join("rebase-merge").exists() || git_dir.join("rebase-apply").exists() {
            ConflictState::Rebase
        } else {
            ConflictState::Idle
        };

        *self.conflict.write().await = state;
        Ok(state)
    }

    /// `.git` under the root, or the directory a linked worktree's `.git` file points at
    fn git_dir(&self) -> GitResult<PathBuf> {
        let dot_git = self.root.join(".git");
        if !dot_git.is_file() {
            return Ok(dot_git);
        }

        let contents = std::fs::read_to_string(&dot_git)?;
        let target = contents
            .lines()
            .find_map(|line| line.strip_prefix("gitdir:"))
            .map(str::trim)
            .ok_or_else(|| {
                GitError::ParseError(format!("No gitdir line in {}", dot_git.display()))
            })?;
        Ok(self.root.join(target))
    }

    pub async fn stage(&self, path: &str) -> GitResult<String> {
        self.git("add", &[], &[path], None).await
    }

    pub async fn reset(&self, path: &str, hard: bool) -> GitResult<String> {
        let options: &[&str] = if hard { &["--hard"] } else { &[] };
        self.git("reset", options, &[path], None).await
    }

    /// Discard working-tree changes to `path` by checking it out from the index
    pub async fn clean(&self, path: &str) -> GitResult<String> {
        self.checkout_path(path).await
    }

    /// Commit the index; with `amend` the previous message is reused and `message` ignored
    pub async fn commit(&self, message: Option<&str>, amend: bool) -> GitResult<String> {
        if amend {
            return self.git("commit", &["--amend", "--no-edit"], &[], None).await;
        }

        let message = message.filter(|m| !m.is_empty()).ok_or_else(|| {
            GitError::Validation("Requires a message to commit with".to_string())
        })?;
        let input = format!("{}\n", message);
        self.git("commit", &["--file", "-"], &[], Some(&input)).await
    }

    /// Fetch from `origin`, optionally naming a specific ref or URL
    pub async fn fetch(&self, url: &str, options: &[&str], origin: &str) -> GitResult<String> {
        let mut args = vec![origin];
        if !url.is_empty() {
            args.push(url);
        }
        self.git("fetch", options, &args, None).await
    }

    /// Check out a revision (branch, remote branch, `FETCH_HEAD`, ...)
    pub async fn checkout(&self, reference: &str) -> GitResult<String> {
        self.git("checkout", &[reference], &[], None).await
    }

    /// Restore a path from the index
    pub async fn checkout_path(&self, path: &str) -> GitResult<String> {
        self.git("checkout", &[], &[path], None).await
    }

    /// Cherry-pick a revision; a failure marks the cherry-pick in progress only if git left it stopped
    pub async fn cherry_pick(&self, reference: &str) -> GitResult<String> {
        self.begin(ConflictState::CherryPick, "cherry-pick").await?;
        let result = self.git("cherry-pick", &[reference], &[], None).await;
        self.settle(ConflictState::CherryPick, result.is_ok()).await;
        result
    }

    /// Resume a conflicted cherry-pick; `Ok(None)` when none is pending
    pub async fn cherry_pick_continue(&self) -> GitResult<Option<String>> {
        self.resume(ConflictState::CherryPick, "cherry-pick", "--continue").await
    }

    /// Abandon a conflicted cherry-pick; `Ok(None)` when none is pending
    pub async fn cherry_pick_abort(&self) -> GitResult<Option<String>> {
        self.resume(ConflictState::CherryPick, "cherry-pick", "--abort").await
    }

    pub async fn push(&self, targets: &[&str], origin: &str) -> GitResult<String> {
        let mut args = vec![origin];
        args.extend_from_slice(targets);
        self.git("push", &[], &args, None).await
    }

    /// Rebase onto `branch`; a failure marks the rebase in progress only if git left it stopped
    pub async fn rebase(&self, branch: &str) -> GitResult<String> {
        self.begin(ConflictState::Rebase, "rebase").await?;
        let result = self.git("rebase", &[], &[branch], None).await;
        self.settle(ConflictState::Rebase, result.is_ok()).await;
        result
    }

    pub async fn rebase_continue(&self) -> GitResult<Option<String>> {
        self.resume(ConflictState::Rebase, "rebase", "--continue").await
    }

    pub async fn rebase_abort(&self) -> GitResult<Option<String>> {
        self.resume(ConflictState::Rebase, "rebase", "--abort").await
    }

    /// Read the commit `skip` entries behind HEAD
    pub async fn log(&self, skip: usize) -> GitResult<CommitLog> {
        let skip = skip.to_string();
        let output = self.git("log", &["--skip", &skip, "-n", "1"], &[], None).await?;
        if output.trim().is_empty() {
            return Err(GitError::EmptyLog);
        }
        parser::parse_log_entry(&output)
    }

    pub async fn diff(&self, options: &[&str], args: &[&str]) -> GitResult<String> {
        self.run_git("diff", options, args, None, false).await
    }

    pub async fn list_files(&self, options: &[&str]) -> GitResult<String> {
        self.run_git("ls-files", options, &[], None, false).await
    }

    /// Run `git <subcommand> [options...] -- [args...]` and return stdout
    pub async fn git(
        &self,
        subcommand: &str,
        options: &[&str],
        args: &[&str],
        stdin: Option<&str>,
    ) -> GitResult<String> {
        self.run_git(subcommand, options, args, stdin, true).await
    }

    async fn run_git(
        &self,
        subcommand: &str,
        options: &[&str],
        args: &[&str],
        stdin: Option<&str>,
        verbose: bool,
    ) -> GitResult<String> {
        let mut full_args = Vec::with_capacity(options.len() + args.len() + 2);
        full_args.push(subcommand.to_string());
        full_args.extend(options.iter().map(|s| s.to_string()));
        full_args.push("--".to_string());
        full_args.extend(args.iter().map(|s| s.to_string()));
        let command = full_args.join(" ");

        if verbose {
            info!(target: "gerrit_flow::git", "git {}", command);
        } else {
            debug!(target: "gerrit_flow::git", "git {}", command);
        }

        let result = self
            .runner
            .run(&self.binary, &full_args, &self.root, stdin)
            .await;

        if let Some(audit) = &self.audit {
            let entry = AuditEntry::new(&command, &self.root, result.exit_code);
            if let Err(e) = audit.record(&entry) {
                warn!("Failed to write audit log: {}", e);
            }
        }

        if result.success() {
            return Ok(result.stdout_text());
        }

        let stderr = result.stderr_text();
        let reason = match &result.error {
            Some(ProcessError::Exit { stderr, .. }) => stderr.clone(),
            Some(e) => e.to_string(),
            None => stderr.trim().to_string(),
        };
        let err = GitError::CommandFailed {
            command,
            exit_code: result.exit_code,
            stderr,
            reason,
        };
        warn!("{}", err);
        Err(err)
    }

    async fn begin(&self, requested: ConflictState, name: &'static str) -> GitResult<()> {
        let pending = self.conflict_state().await;
        if pending != ConflictState::Idle && pending != requested {
            return Err(GitError::ConflictPending {
                pending,
                requested: name,
            });
        }
        Ok(())
    }

    async fn settle(&self, kind: ConflictState, succeeded: bool) {
        if succeeded {
            let mut state = self.conflict.write().await;
            if *state == kind {
                *state = ConflictState::Idle;
            }
            return;
        }
        self.reconcile(kind).await;
    }

    /// Re-read the markers after a failed sequencer command
    async fn reconcile(&self, kind: ConflictState) {
        match self.detect_conflict_state().await {
            Ok(state) if state == kind => {
                debug!("{} stopped, waiting for conflict resolution", kind);
            }
            Ok(state) => debug!("{} failed without stopping, state is {}", kind, state),
            Err(e) => warn!("Could not read conflict markers after {}: {}", kind, e),
        }
    }

    async fn resume(
        &self,
        kind: ConflictState,
        subcommand: &str,
        flag: &str,
    ) -> GitResult<Option<String>> {
        if self.conflict_state().await != kind {
            return Ok(None);
        }
        match self.git(subcommand, &[flag], &[], None).await {
            Ok(output) => {
                *self.conflict.write().await = ConflictState::Idle;
                Ok(Some(output))
            }
            Err(e) => {
                self.reconcile(kind).await;
                Err(e)
            }
        }
    }
}

/// Runner used by [`GitFacade::new`]: never waits on an editor or a credential prompt
pub fn default_runner() -> ProcessRunner {
    ProcessRunner::new()
        .with_env("GIT_EDITOR", "true")
        .with_env("GIT_TERMINAL_PROMPT", "0")
}

/// Walk up from `start_path` to the directory containing `.git`
pub fn discover_root<P: AsRef<Path>>(start_path: P) -> GitResult<PathBuf> {
    let mut current = start_path.as_ref().to_path_buf();

    loop {
        if current.join(".git").exists() {
            return Ok(current);
        }

        if !current.pop() {
            return Err(GitError::NotARepository);
        }
    }
}
