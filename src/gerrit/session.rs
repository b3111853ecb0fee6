use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard, RwLock, broadcast};
use tracing::{debug, info, instrument, warn};

use crate::error::{AppError, AppResult, GitError, GitResult};
use crate::gerrit::api::ChangeInfo;
use crate::gerrit::client::{GerritClient, GerritError};
use crate::gerrit::reference::Ref;
use crate::git::parser::FileStatus;
use crate::git::repository::{ConflictState, DEFAULT_REMOTE, GitFacade};
use crate::status::{FileQuickPick, FileStatusAggregator};

const FETCH_HEAD: &str = "FETCH_HEAD";
const FALLBACK_BRANCH: &str = "master";
const EVENT_CAPACITY: usize = 16;

/// What to do with `FETCH_HEAD` once a change ref has been fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchApply {
    Checkout,
    CherryPick,
}

impl FetchApply {
    async fn apply(self, git: &GitFacade, revision: &str) -> GitResult<String> {
        match self {
            FetchApply::Checkout => git.checkout(revision).await,
            FetchApply::CherryPick => git.cherry_pick(revision).await,
        }
    }

    fn operation(self) -> &'static str {
        match self {
            FetchApply::Checkout => "checkout",
            FetchApply::CherryPick => "cherry-pick",
        }
    }
}

/// Notifications sent whenever the checked-out branch or ref changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    BranchChanged(String),
    RefChanged(Ref),
}

/// Point-in-time view of the session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub current_ref: Option<Ref>,
    pub current_branch: Option<String>,
    pub project: Option<String>,
    pub cherry_pick_in_progress: bool,
    pub rebase_in_progress: bool,
    pub operation_locked: bool,
}

#[derive(Debug, Default)]
struct Position {
    current_ref: Option<Ref>,
    current_branch: Option<String>,
    project: Option<String>,
}

/// Drives Gerrit review workflows on one working tree
///
/// Branch checkout, change checkout, cherry-pick, push, rebase and the
/// continue/abort calls each hold the operation lock for their whole
/// duration. A second operation started meanwhile fails with
/// [`AppError::Busy`] instead of waiting.
pub struct RevisionSession {
    git: Arc<GitFacade>,
    files: Arc<FileStatusAggregator>,
    gerrit: Arc<dyn GerritClient>,
    remote: String,
    position: RwLock<Position>,
    lock: Mutex<()>,
    events: broadcast::Sender<SessionEvent>,
}

impl RevisionSession {
    pub fn new(
        git: Arc<GitFacade>,
        files: Arc<FileStatusAggregator>,
        gerrit: Arc<dyn GerritClient>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            git,
            files,
            gerrit,
            remote: DEFAULT_REMOTE.to_string(),
            position: RwLock::new(Position::default()),
            lock: Mutex::new(()),
            events,
        }
    }

    /// Fetch from and push to `remote` instead of `origin`
    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    /// Gerrit project used for change and branch queries until HEAD says otherwise
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        let project = project.into();
        if !project.is_empty() {
            self.position.get_mut().project = Some(project);
        }
        self
    }

    pub fn git(&self) -> &Arc<GitFacade> {
        &self.git
    }

    pub fn files(&self) -> &Arc<FileStatusAggregator> {
        &self.files
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn state(&self) -> SessionState {
        let position = self.position.read().await;
        SessionState {
            current_ref: position.current_ref,
            current_branch: position.current_branch.clone(),
            project: position.project.clone(),
            cherry_pick_in_progress: self.git.cherry_pick_in_progress().await,
            rebase_in_progress: self.git.rebase_in_progress().await,
            operation_locked: self.lock.try_lock().is_err(),
        }
    }

    /// Take the operation lock, failing at once if another operation holds it
    ///
    /// The guard releases the lock when dropped, whether the operation
    /// succeeded or not.
    fn acquire(&self, operation: &'static str) -> AppResult<MutexGuard<'_, ()>> {
        self.lock.try_lock().map_err(|_| {
            warn!("Rejected {}: another operation is in progress", operation);
            AppError::Busy { operation }
        })
    }

    /// Fetch the remote and check out `<remote>/<name>`
    #[instrument(skip(self))]
    pub async fn checkout_branch(&self, name: &str) -> AppResult<String> {
        let _guard = self.acquire("checkout branch")?;

        self.git.fetch("", &["-fv"], &self.remote).await?;
        let output = self
            .git
            .checkout(&format!("{}/{}", self.remote, name))
            .await?;

        self.set_branch(name).await;
        self.position.write().await.current_ref = None;
        info!("Checked out branch {}", name);
        Ok(output)
    }

    /// Fetch a change revision and check it out (detached HEAD)
    #[instrument(skip(self))]
    pub async fn checkout_ref(&self, reference: Ref) -> AppResult<String> {
        let _guard = self.acquire("checkout change")?;
        self.fetch_ref(reference, FetchApply::Checkout).await
    }

    /// Fetch a change revision and cherry-pick it onto HEAD
    ///
    /// On conflicts the cherry-pick stays in progress and the error is
    /// [`AppError::Conflict`]; resolve the files, stage them and call
    /// [`RevisionSession::cherrypick_continue`].
    #[instrument(skip(self))]
    pub async fn cherrypick_ref(&self, reference: Ref) -> AppResult<String> {
        let _guard = self.acquire("cherry-pick change")?;
        self.fetch_ref(reference, FetchApply::CherryPick).await
    }

    async fn fetch_ref(&self, reference: Ref, apply: FetchApply) -> AppResult<String> {
        if self.files.refresh().await?.is_dirty() {
            warn!("Refusing to {} {} on a dirty tree", apply.operation(), reference);
            return Err(GitError::DirtyTree.into());
        }

        self.git
            .fetch(&reference.fetch_spec(), &[], &self.remote)
            .await?;
        let output = match apply.apply(&self.git, FETCH_HEAD).await {
            Ok(output) => output,
            Err(err) if apply == FetchApply::CherryPick => {
                return Err(self.conflict_or(ConflictState::CherryPick, err).await);
            }
            Err(err) => return Err(err.into()),
        };

        self.set_ref(reference).await;
        info!("Applied {} via {}", reference, apply.operation());
        Ok(output)
    }

    /// Push HEAD for review on `branch`
    #[instrument(skip(self))]
    pub async fn push(&self, branch: &str) -> AppResult<String> {
        let _guard = self.acquire("push")?;

        let target = format!("HEAD:refs/for/{}", branch);
        let output = self.git.push(&[&target], &self.remote).await?;

        self.set_branch(branch).await;
        if let Err(e) = self.files.refresh().await {
            warn!("Failed to refresh file status after push: {}", e);
        }
        Ok(output)
    }

    /// Fetch the remote and rebase onto `<remote>/<branch>`
    #[instrument(skip(self))]
    pub async fn rebase(&self, branch: &str) -> AppResult<String> {
        let _guard = self.acquire("rebase")?;

        self.git.fetch("", &["-fv"], &self.remote).await?;
        let output = match self.git.rebase(&format!("{}/{}", self.remote, branch)).await {
            Ok(output) => output,
            Err(err) => return Err(self.conflict_or(ConflictState::Rebase, err).await),
        };

        self.set_branch(branch).await;
        Ok(output)
    }

    #[instrument(skip(self))]
    pub async fn cherrypick_continue(&self) -> AppResult<Option<String>> {
        let _guard = self.acquire("cherry-pick --continue")?;
        Ok(self.git.cherry_pick_continue().await?)
    }

    #[instrument(skip(self))]
    pub async fn rebase_continue(&self) -> AppResult<Option<String>> {
        let _guard = self.acquire("rebase --continue")?;
        Ok(self.git.rebase_continue().await?)
    }

    #[instrument(skip(self))]
    pub async fn cherrypick_abort(&self) -> AppResult<Option<String>> {
        let _guard = self.acquire("cherry-pick --abort")?;
        Ok(self.git.cherry_pick_abort().await?)
    }

    #[instrument(skip(self))]
    pub async fn rebase_abort(&self) -> AppResult<Option<String>> {
        let _guard = self.acquire("rebase --abort")?;
        Ok(self.git.rebase_abort().await?)
    }

    /// Adopt project, branch and ref from the Gerrit change at HEAD
    ///
    /// Returns the adopted ref, or `None` when HEAD carries no Change-Id or
    /// the repository has no commits yet.
    #[instrument(skip(self))]
    pub async fn sync_from_head(&self) -> AppResult<Option<Ref>> {
        self.files.refresh().await?;

        let log = match self.git.log(0).await {
            Ok(log) => log,
            Err(GitError::EmptyLog) => return Ok(None),
            Err(err) if is_unborn(&err) => {
                debug!("Repository has no commits yet");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        let Some(change_id) = log.change_id else {
            debug!("HEAD {} has no Change-Id", log.commit);
            return Ok(None);
        };

        let review = self.gerrit.review(&change_id, &log.commit).await?;
        let patch_set = review.current_patch_set().ok_or_else(|| {
            GerritError::InvalidResponse(format!("Change {} has no current revision", review.number))
        })?;
        let reference = Ref::new(review.number, patch_set);

        if !review.project.is_empty() {
            self.position.write().await.project = Some(review.project.clone());
        }
        if !review.branch.is_empty() {
            self.set_branch(&review.branch).await;
        }
        self.set_ref(reference).await;
        Ok(Some(reference))
    }

    /// Branch names of the project, falling back to the current branch or `master`
    pub async fn branches(&self) -> AppResult<Vec<String>> {
        let project = self.project().await;
        let mut names: Vec<String> = self
            .gerrit
            .branches(&project)
            .await?
            .iter()
            .filter_map(|b| b.head_name())
            .map(str::to_string)
            .collect();

        if names.is_empty() {
            let fallback = self.position.read().await.current_branch.clone();
            names.push(fallback.unwrap_or_else(|| FALLBACK_BRANCH.to_string()));
        }
        Ok(names)
    }

    pub async fn open_changes(&self, limit: Option<u32>) -> AppResult<Vec<ChangeInfo>> {
        let project = self.project().await;
        Ok(self.gerrit.open_changes(&project, limit).await?)
    }

    /// Every patch set of `change`, newest first
    pub async fn patchsets(&self, change: u64) -> AppResult<Vec<Ref>> {
        let info = self.gerrit.change_with_current_revision(change).await?;
        let latest = info.current_patch_set().ok_or_else(|| {
            GerritError::InvalidResponse(format!("Change {} has no current revision", change))
        })?;
        Ok((1..=latest).rev().map(|ps| Ref::new(change, ps)).collect())
    }

    pub async fn is_dirty(&self) -> AppResult<bool> {
        Ok(self.files.refresh().await?.is_dirty())
    }

    /// Files that can be staged
    pub async fn dirty_files(&self) -> AppResult<Vec<FileQuickPick>> {
        let snapshot = self.files.refresh().await?;
        Ok(snapshot.descriptors(&[FileStatus::Deleted, FileStatus::Modified, FileStatus::Untracked]))
    }

    /// Files that can be unstaged
    pub async fn staged_files(&self) -> AppResult<Vec<FileQuickPick>> {
        let snapshot = self.files.refresh().await?;
        Ok(snapshot.descriptors(&[FileStatus::Staged]))
    }

    /// A "resolve conflicts" error when git left `kind` stopped, the plain git error otherwise
    async fn conflict_or(&self, kind: ConflictState, err: GitError) -> AppError {
        if self.git.conflict_state().await != kind {
            return err.into();
        }
        AppError::Conflict {
            message: format!("Resolve conflicts in {}, then continue", kind),
            source: err,
        }
    }

    async fn project(&self) -> String {
        self.position.read().await.project.clone().unwrap_or_default()
    }

    async fn set_branch(&self, branch: &str) {
        let mut position = self.position.write().await;
        if position.current_branch.as_deref() != Some(branch) {
            position.current_branch = Some(branch.to_string());
            let _ = self.events.send(SessionEvent::BranchChanged(branch.to_string()));
        }
    }

    async fn set_ref(&self, reference: Ref) {
        let mut position = self.position.write().await;
        if position.current_ref != Some(reference) {
            position.current_ref = Some(reference);
            let _ = self.events.send(SessionEvent::RefChanged(reference));
        }
    }
}

fn is_unborn(err: &GitError) -> bool {
    err.stderr()
        .is_some_and(|stderr| stderr.contains("does not have any commits yet"))
}
