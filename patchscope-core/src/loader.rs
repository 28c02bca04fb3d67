//! Commit diff loader.
//!
//! Turns a commit into the ordered list of file patches it introduces relative
//! to its first parent, with rename/copy detection applied. The loader keeps no
//! state and never retries; each call is a fresh read from the backend.

use tracing::debug;

use crate::backend::{SimilarityOptions, VcsBackend};
use crate::error::{LoadError, Stage};
use crate::types::{CommitRef, PatchDescriptor};

/// Loads the patches `commit` introduces over its first parent.
///
/// A commit without parents has no diffs; that is reported as an empty list,
/// not as an error, and similarity detection is skipped. Patch order is the
/// backend's order; nothing is sorted, filtered or deduplicated here.
///
/// # Errors
///
/// Backend failures are classified by the step that failed, see [`LoadError`].
pub async fn load_patches<B: VcsBackend>(
    backend: &B,
    commit: &CommitRef,
    similarity: &SimilarityOptions,
) -> Result<Vec<PatchDescriptor>, LoadError> {
    let diffs = backend
        .diffs(commit)
        .await
        .map_err(|e| LoadError::classify(Stage::Diff, e))?;

    let Some(diff) = diffs.into_iter().next() else {
        debug!(commit = %commit.id().short(), "no diff base, empty patch list");
        return Ok(Vec::new());
    };

    let diff = backend
        .find_similar(diff, similarity)
        .await
        .map_err(|e| LoadError::classify(Stage::Similarity, e))?;

    let patches = backend
        .patches(diff)
        .await
        .map_err(|e| LoadError::classify(Stage::Patches, e))?;

    debug!(commit = %commit.id().short(), count = patches.len(), "patches loaded");
    Ok(patches)
}

/// Resolves `rev` and then loads its patches.
///
/// # Errors
///
/// Returns [`LoadError::UnresolvableCommit`] when `rev` does not name a
/// commit, otherwise the same errors as [`load_patches`].
pub async fn resolve_and_load<B: VcsBackend>(
    backend: &B,
    rev: &str,
    similarity: &SimilarityOptions,
) -> Result<(CommitRef, Vec<PatchDescriptor>), LoadError> {
    let commit = backend
        .resolve_commit(rev)
        .await
        .map_err(|e| LoadError::classify(Stage::Resolve, e))?;
    let patches = load_patches(backend, &commit, similarity).await?;
    Ok((commit, patches))
}
