//! Error types for the backend capability and for patch loading.

use thiserror::Error;

/// Failure reported by a [`VcsBackend`](crate::backend::VcsBackend) call.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("git error: {0}")]
    Git(#[source] git2::Error),
    #[error("git worker thread has stopped")]
    WorkerGone,
}

impl From<git2::Error> for BackendError {
    fn from(e: git2::Error) -> Self {
        if e.code() == git2::ErrorCode::NotFound {
            BackendError::NotFound(e.message().to_owned())
        } else {
            BackendError::Git(e)
        }
    }
}

/// Why a commit's patch list could not be produced.
///
/// The inspection state machine recovers from all of these by showing an
/// empty list together with the failure; none of them is fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("commit cannot be resolved: {0}")]
    UnresolvableCommit(String),
    #[error("similarity detection failed: {0}")]
    SimilarityDetectionFailed(String),
}

/// Which loader step a backend error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage {
    Resolve,
    Diff,
    Similarity,
    Patches,
}

impl LoadError {
    /// Maps a backend error onto the load taxonomy. A missing object is
    /// always an unresolvable commit, whatever step tripped over it.
    pub(crate) fn classify(stage: Stage, err: BackendError) -> Self {
        match (stage, err) {
            (_, err @ BackendError::WorkerGone) => LoadError::BackendUnavailable(err.to_string()),
            (_, BackendError::NotFound(msg)) => LoadError::UnresolvableCommit(msg),
            (Stage::Resolve, err) => LoadError::UnresolvableCommit(err.to_string()),
            (Stage::Similarity, err) => LoadError::SimilarityDetectionFailed(err.to_string()),
            (Stage::Diff | Stage::Patches, err) => LoadError::BackendUnavailable(err.to_string()),
        }
    }
}
