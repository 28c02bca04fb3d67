//! The version-control capability the inspection core consumes.
//!
//! The core never touches repository storage itself. It asks a [`VcsBackend`]
//! to resolve commits, produce the diffs between a commit and its parents,
//! run rename/copy detection and list the per-file patches. All four calls
//! are asynchronous and fallible.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::types::{CommitRef, PatchDescriptor};

/// Knobs for similarity (rename/copy) detection.
///
/// `None` thresholds leave the backend's own defaults in place; for libgit2
/// that is 50% similarity for both renames and copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityOptions {
    /// Pair deleted and added files into renames.
    pub renames: bool,
    /// Pair modified or added files with their sources into copies.
    pub copies: bool,
    /// Percentage similarity required for a rename.
    pub rename_threshold: Option<u16>,
    /// Percentage similarity required for a copy.
    pub copy_threshold: Option<u16>,
    /// Maximum number of candidate pairs examined before giving up.
    pub rename_limit: Option<usize>,
}

impl Default for SimilarityOptions {
    fn default() -> Self {
        Self {
            renames: true,
            copies: false,
            rename_threshold: None,
            copy_threshold: None,
            rename_limit: None,
        }
    }
}

/// Asynchronous access to a repository.
///
/// `Diff` is the backend's own diff object. The core treats it as opaque and
/// only threads it from [`diffs`](VcsBackend::diffs) through
/// [`find_similar`](VcsBackend::find_similar) into
/// [`patches`](VcsBackend::patches).
pub trait VcsBackend: Send + Sync + 'static {
    type Diff: Send + 'static;

    /// Resolves a revision expression (full id, short id, branch, `HEAD~2`, ...).
    fn resolve_commit(
        &self,
        rev: &str,
    ) -> impl Future<Output = Result<CommitRef, BackendError>> + Send;

    /// One diff per parent of `commit`, in parent order. A root commit yields
    /// no diffs at all.
    fn diffs(
        &self,
        commit: &CommitRef,
    ) -> impl Future<Output = Result<Vec<Self::Diff>, BackendError>> + Send;

    /// Rewrites `diff` so that matching add/delete pairs become renames or copies.
    fn find_similar(
        &self,
        diff: Self::Diff,
        options: &SimilarityOptions,
    ) -> impl Future<Output = Result<Self::Diff, BackendError>> + Send;

    /// Per-file patches of `diff`, in the backend's delta order.
    fn patches(
        &self,
        diff: Self::Diff,
    ) -> impl Future<Output = Result<Vec<PatchDescriptor>, BackendError>> + Send;
}
