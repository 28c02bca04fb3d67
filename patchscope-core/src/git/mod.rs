//! libgit2-backed [`VcsBackend`].
//!
//! [`GitBackend`] is a cheap handle to a background `std::thread` that owns
//! the `git2::Repository` for its whole life. `Repository` is `Send` but not
//! `Sync`, so instead of sharing it behind a lock every call is shipped to
//! that thread as a job over a `crossbeam_channel` and answered through a
//! `tokio::sync::oneshot`. Dropping the last handle closes the channel and the
//! thread exits.

mod worker;

use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel::Sender;
use git2::Repository;
use tokio::sync::oneshot;
use tracing::info;

use crate::backend::{SimilarityOptions, VcsBackend};
use crate::error::BackendError;
use crate::types::{CommitId, CommitRef, OwnedDiffHunk, PatchDescriptor, PatchHandle};

use worker::Job;

/// The diff between a commit and one of its parents.
///
/// Holds what is needed to rebuild the libgit2 diff on the worker thread, plus
/// the delta snapshot taken once similarity detection has run.
#[derive(Debug, Clone)]
pub struct GitDiff {
    pub(crate) commit: CommitId,
    pub(crate) base: Option<CommitId>,
    pub(crate) similarity: Option<SimilarityOptions>,
    pub(crate) snapshot: Option<Vec<PatchDescriptor>>,
}

impl GitDiff {
    fn new(commit: CommitId, base: Option<CommitId>) -> Self {
        Self { commit, base, similarity: None, snapshot: None }
    }

    pub fn commit(&self) -> &CommitId {
        &self.commit
    }

    pub fn base(&self) -> Option<&CommitId> {
        self.base.as_ref()
    }
}

/// Handle to the git worker thread.
#[derive(Debug)]
pub struct GitBackend {
    tx: Sender<Job>,
    root: PathBuf,
}

impl GitBackend {
    /// Opens the repository containing `path` (searching parent directories).
    ///
    /// # Errors
    ///
    /// Returns the libgit2 error when no repository is found or it cannot be read.
    pub fn open(path: &Path) -> Result<Self, BackendError> {
        let repo = Repository::discover(path)?;
        Self::spawn(repo)
    }

    /// Creates a new, empty repository at `path` and opens it.
    ///
    /// # Errors
    ///
    /// Returns the libgit2 error if the directory cannot be initialized.
    pub fn init(path: &Path) -> Result<Self, BackendError> {
        let repo = Repository::init(path)?;
        info!(path = %path.display(), "initialized repository");
        Self::spawn(repo)
    }

    /// Clones `url` into `path` and opens the result.
    ///
    /// Blocks for the duration of the transfer; call it off the UI task.
    ///
    /// # Errors
    ///
    /// Returns the libgit2 error if fetching or checkout fails.
    pub fn clone_from(url: &str, path: &Path) -> Result<Self, BackendError> {
        let repo = git2::build::RepoBuilder::new().clone(url, path)?;
        info!(url, path = %path.display(), "cloned repository");
        Self::spawn(repo)
    }

    fn spawn(repo: Repository) -> Result<Self, BackendError> {
        let root = worker::display_root(&repo).to_path_buf();
        let (tx, rx) = crossbeam_channel::unbounded::<Job>();
        thread::Builder::new()
            .name("git-worker".into())
            .spawn(move || worker::git_worker_loop(repo, rx))
            .map_err(|_| BackendError::WorkerGone)?;
        info!(root = %root.display(), "git worker started");
        Ok(Self { tx, root })
    }

    /// Directory the repository was opened at.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Runs `f` on the worker thread and waits for its answer.
    async fn call<T, F>(&self, f: F) -> Result<T, BackendError>
    where
        T: Send + 'static,
        F: FnOnce(&Repository) -> Result<T, BackendError> + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job = Box::new(move |repo| {
            let _ = reply_tx.send(f(repo));
        });
        self.tx.send(job).map_err(|_| BackendError::WorkerGone)?;
        reply_rx.await.map_err(|_| BackendError::WorkerGone)?
    }

    /// Up to `limit` commits reachable from `start` (default `HEAD`), newest first.
    ///
    /// # Errors
    ///
    /// Fails if `start` does not resolve or the walk hits a corrupt object.
    pub async fn history(&self, start: Option<String>, limit: usize) -> Result<Vec<CommitRef>, BackendError> {
        self.call(move |repo| worker::history(repo, start.as_deref(), limit)).await
    }

    /// Line-level hunks of the patch behind `handle`.
    ///
    /// # Errors
    ///
    /// Fails if the commits named by the handle are gone or the diff cannot
    /// be rebuilt.
    pub async fn hunks(&self, handle: PatchHandle) -> Result<Vec<OwnedDiffHunk>, BackendError> {
        self.call(move |repo| worker::hunks(repo, &handle)).await
    }
}

impl VcsBackend for GitBackend {
    type Diff = GitDiff;

    async fn resolve_commit(&self, rev: &str) -> Result<CommitRef, BackendError> {
        let rev = rev.to_owned();
        self.call(move |repo| worker::resolve_commit(repo, &rev)).await
    }

    async fn diffs(&self, commit: &CommitRef) -> Result<Vec<GitDiff>, BackendError> {
        let id = commit.id().clone();
        self.call(move |repo| worker::parent_diffs(repo, &id)).await
    }

    async fn find_similar(
        &self,
        diff: GitDiff,
        options: &SimilarityOptions,
    ) -> Result<GitDiff, BackendError> {
        let options = *options;
        self.call(move |repo| worker::find_similar(repo, diff, &options)).await
    }

    async fn patches(&self, diff: GitDiff) -> Result<Vec<PatchDescriptor>, BackendError> {
        self.call(move |repo| worker::patches(repo, diff)).await
    }
}
