//! Commit inspection core for patchscope.
//!
//! Loads the file-level patches a commit introduces ([`loader`]), tracks which
//! commit is on display and when its patches are stale ([`inspection`]), and
//! correlates the caller's patch selection across reloads ([`selection`]).
//! Repository access goes through the [`backend::VcsBackend`] capability; the
//! [`git`] module provides the libgit2 implementation.

pub mod backend;
pub mod error;
pub mod git;
pub mod inspection;
pub mod loader;
pub mod selection;
pub mod types;
pub mod view;

pub use backend::{SimilarityOptions, VcsBackend};
pub use error::{BackendError, LoadError};
pub use git::GitBackend;
pub use inspection::{CommitInspector, InspectionState, LoadCompletion, Phase};
pub use types::{ChangeKind, CommitId, CommitRef, PatchDescriptor, PatchHandle};
pub use view::{CommitSummary, CommitView, PatchListStatus};
