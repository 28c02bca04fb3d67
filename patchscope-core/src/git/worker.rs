//! Synchronous git2 operations executed on the worker thread.
//!
//! Every function takes the thread's `&Repository` and returns owned data;
//! no `git2` value with a repository lifetime leaves this module.

use std::path::Path;

use crossbeam_channel::Receiver;
use git2::{Diff, DiffFindOptions, DiffOptions, Oid, Patch, Repository, Sort};
use tracing::debug;

use crate::backend::SimilarityOptions;
use crate::error::BackendError;
use crate::git::GitDiff;
use crate::types::{
    ChangeKind, CommitId, CommitRef, OwnedDiffHunk, OwnedDiffLine, PatchDescriptor, PatchHandle,
    Signature,
};

/// A unit of work for the worker thread.
pub(crate) type Job = Box<dyn FnOnce(&Repository) + Send>;

/// Runs jobs against `repo` until every sender has been dropped.
pub(crate) fn git_worker_loop(repo: Repository, rx: Receiver<Job>) {
    for job in rx {
        job(&repo);
    }
    debug!("git worker exiting");
}

fn oid(id: &CommitId) -> Result<Oid, BackendError> {
    Oid::from_str(id.as_str()).map_err(BackendError::from)
}

fn signature(sig: &git2::Signature<'_>) -> Signature {
    Signature {
        name: String::from_utf8_lossy(sig.name_bytes()).into_owned(),
        email: String::from_utf8_lossy(sig.email_bytes()).into_owned(),
        when: sig.when().into(),
    }
}

/// Snapshots a `git2::Commit` into an owned [`CommitRef`].
pub(crate) fn commit_ref(commit: &git2::Commit<'_>) -> CommitRef {
    CommitRef::new(
        commit.id().into(),
        String::from_utf8_lossy(commit.message_bytes()).into_owned(),
        signature(&commit.author()),
        commit.committer().when().into(),
        commit.parent_ids().map(CommitId::from).collect(),
    )
}

pub(crate) fn resolve_commit(repo: &Repository, rev: &str) -> Result<CommitRef, BackendError> {
    let commit = repo.revparse_single(rev)?.peel_to_commit()?;
    Ok(commit_ref(&commit))
}

/// One unprocessed diff per parent. Only checks that the trees exist; the
/// actual tree comparison happens when the diff is used.
pub(crate) fn parent_diffs(repo: &Repository, commit: &CommitId) -> Result<Vec<GitDiff>, BackendError> {
    let c = repo.find_commit(oid(commit)?)?;
    c.tree()?;
    c.parents()
        .map(|parent| -> Result<GitDiff, BackendError> {
            parent.tree()?;
            Ok(GitDiff::new(commit.clone(), Some(parent.id().into())))
        })
        .collect()
}

/// Compares the trees of `base` and `commit`. A missing base diffs against
/// the empty tree.
fn tree_diff<'r>(
    repo: &'r Repository,
    commit: &CommitId,
    base: Option<&CommitId>,
) -> Result<Diff<'r>, BackendError> {
    let new_tree = repo.find_commit(oid(commit)?)?.tree()?;
    let old_tree = match base {
        Some(b) => Some(repo.find_commit(oid(b)?)?.tree()?),
        None => None,
    };
    let mut opts = DiffOptions::new();
    let diff = repo.diff_tree_to_tree(old_tree.as_ref(), Some(&new_tree), Some(&mut opts))?;
    Ok(diff)
}

/// Runs rename/copy detection on `raw`.
///
/// libgit2 reads `diff.renames` from the repository config when no detection
/// flag is set, so with both kinds disabled the call is skipped entirely.
fn apply_similarity(raw: &mut Diff<'_>, options: &SimilarityOptions) -> Result<(), BackendError> {
    if !options.renames && !options.copies {
        return Ok(());
    }
    raw.find_similar(Some(&mut find_options(options)))?;
    Ok(())
}

fn find_options(options: &SimilarityOptions) -> DiffFindOptions {
    let mut find = DiffFindOptions::new();
    find.renames(options.renames).copies(options.copies);
    if let Some(t) = options.rename_threshold {
        find.rename_threshold(t);
    }
    if let Some(t) = options.copy_threshold {
        find.copy_threshold(t);
    }
    if let Some(limit) = options.rename_limit {
        find.rename_limit(limit);
    }
    find
}

/// Rebuilds `diff`, applies rename/copy detection and snapshots the deltas.
pub(crate) fn find_similar(
    repo: &Repository,
    diff: GitDiff,
    options: &SimilarityOptions,
) -> Result<GitDiff, BackendError> {
    let mut raw = tree_diff(repo, &diff.commit, diff.base.as_ref())?;
    apply_similarity(&mut raw, options)?;
    let mut diff = diff;
    diff.similarity = Some(*options);
    diff.snapshot = Some(describe_deltas(&raw, &diff));
    Ok(diff)
}

/// Patch descriptors of `diff`, computing the tree comparison if rename
/// detection did not already do so.
pub(crate) fn patches(repo: &Repository, diff: GitDiff) -> Result<Vec<PatchDescriptor>, BackendError> {
    if let Some(snapshot) = diff.snapshot {
        return Ok(snapshot);
    }
    let raw = tree_diff(repo, &diff.commit, diff.base.as_ref())?;
    Ok(describe_deltas(&raw, &diff))
}

fn describe_deltas(raw: &Diff<'_>, diff: &GitDiff) -> Vec<PatchDescriptor> {
    raw.deltas()
        .enumerate()
        .map(|(index, delta)| {
            let path = |f: git2::DiffFile<'_>| {
                f.path().map(|p| p.to_string_lossy().into_owned()).unwrap_or_default()
            };
            let mut handle = PatchHandle::new(diff.commit.clone(), diff.base.clone(), index);
            if let Some(options) = diff.similarity {
                handle = handle.with_similarity(options);
            }
            PatchDescriptor::new(
                path(delta.old_file()),
                path(delta.new_file()),
                ChangeKind::from(delta.status()),
                handle,
            )
        })
        .collect()
}

/// Materializes the hunks behind a patch handle.
///
/// Binary and unchanged files have no text patch and yield no hunks.
pub(crate) fn hunks(repo: &Repository, handle: &PatchHandle) -> Result<Vec<OwnedDiffHunk>, BackendError> {
    let mut raw = tree_diff(repo, handle.commit(), handle.base())?;
    if let Some(options) = handle.similarity() {
        apply_similarity(&mut raw, options)?;
    }
    let Some(patch) = Patch::from_diff(&raw, handle.index())? else {
        return Ok(Vec::new());
    };

    let mut out = Vec::with_capacity(patch.num_hunks());
    for h in 0..patch.num_hunks() {
        let (hunk, line_count) = patch.hunk(h)?;
        let mut lines = Vec::with_capacity(line_count);
        for l in 0..line_count {
            let line = patch.line_in_hunk(h, l)?;
            lines.push(OwnedDiffLine {
                origin: line.origin(),
                content: String::from_utf8_lossy(line.content()).into_owned(),
                old_lineno: line.old_lineno(),
                new_lineno: line.new_lineno(),
            });
        }
        out.push(OwnedDiffHunk {
            header: String::from_utf8_lossy(hunk.header()).into_owned(),
            old_start: hunk.old_start(),
            new_start: hunk.new_start(),
            lines,
        });
    }
    Ok(out)
}

/// Up to `limit` commits reachable from `start` (or `HEAD`), newest first.
///
/// A repository without any commits has an empty history.
pub(crate) fn history(
    repo: &Repository,
    start: Option<&str>,
    limit: usize,
) -> Result<Vec<CommitRef>, BackendError> {
    let mut walk = repo.revwalk()?;
    walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
    match start {
        Some(rev) => walk.push(repo.revparse_single(rev)?.peel_to_commit()?.id())?,
        None => match repo.head() {
            Ok(head) => walk.push(head.peel_to_commit()?.id())?,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        },
    }

    let mut commits = Vec::new();
    for id in walk.take(limit) {
        let commit = repo.find_commit(id?)?;
        commits.push(commit_ref(&commit));
    }
    Ok(commits)
}

/// Working directory of `repo`, or its git dir for bare repositories.
pub(crate) fn display_root(repo: &Repository) -> &Path {
    repo.workdir().unwrap_or_else(|| repo.path())
}
