//! Commit inspection state machine.
//!
//! Tracks which commit is on display and which patch list belongs to it.
//!
//! ```text
//!   Idle ──set_commit(C)──▶ Loading(C) ──complete(ok | err)──▶ Ready(C)
//!                             ▲  │                               │
//!                             │  └──────set_commit(D != C)───────┤
//!                             └──────────────────────────────────┘
//! ```
//!
//! Every transition into `Loading` bumps a generation counter. A load result
//! carries the generation it was issued under and is applied only if that is
//! still the latest one, so a slow response for an older commit can never
//! overwrite the patches of a newer one. Superseded loads are not cancelled;
//! their results are dropped when they arrive.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::backend::{SimilarityOptions, VcsBackend};
use crate::error::LoadError;
use crate::loader;
use crate::selection;
use crate::types::{CommitId, CommitRef, PatchDescriptor};
use crate::view::{CommitSummary, CommitView, PatchListStatus};

/// Source of per-instance ids, so a completion issued by a torn-down state
/// machine never matches a fresh one that happens to be at the same count.
static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Identifies one load request of one state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Generation {
    instance: u64,
    seq: u64,
}

/// Lifecycle phase of the patch list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No commit has been inspected yet.
    #[default]
    Idle,
    /// A load is in flight for the target commit.
    Loading,
    /// The patch list (possibly empty, possibly failed) belongs to the target commit.
    Ready,
}

/// Permission to run one load, handed out on every staleness transition.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    pub generation: Generation,
    pub commit: CommitRef,
}

/// The outcome of a load, tagged with the request it answers.
#[derive(Debug, Clone)]
pub struct LoadCompletion {
    pub generation: Generation,
    pub commit: CommitId,
    pub result: Result<Vec<PatchDescriptor>, LoadError>,
}

/// Runtime-agnostic inspection state.
///
/// Decides when a load is needed and whether an arriving result may be
/// applied. It performs no I/O; [`CommitInspector`] pairs it with a backend.
#[derive(Debug)]
pub struct InspectionState {
    instance: u64,
    seq: u64,
    target: Option<CommitRef>,
    patches: Vec<PatchDescriptor>,
    phase: Phase,
    failure: Option<LoadError>,
}

impl Default for InspectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl InspectionState {
    pub fn new() -> Self {
        Self {
            instance: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
            seq: 0,
            target: None,
            patches: Vec::new(),
            phase: Phase::Idle,
            failure: None,
        }
    }

    /// Makes `commit` the commit on display.
    ///
    /// Returns `None` when `commit` has the same id as the current target, so
    /// re-rendering with an unchanged commit never reloads. Otherwise the
    /// current patches are invalidated and a ticket for a fresh load is issued.
    pub fn set_commit(&mut self, commit: CommitRef) -> Option<LoadTicket> {
        if self.target.as_ref().is_some_and(|t| t.id() == commit.id()) {
            return None;
        }
        debug!(commit = %commit.id().short(), "commit changed, patches are stale");
        Some(self.begin_load(commit))
    }

    /// Issues a new load for the current commit after a failed one.
    ///
    /// Returns `None` unless the last load for the target commit failed.
    pub fn retry(&mut self) -> Option<LoadTicket> {
        if self.phase != Phase::Ready || self.failure.is_none() {
            return None;
        }
        let commit = self.target.clone()?;
        debug!(commit = %commit.id().short(), "retrying failed load");
        Some(self.begin_load(commit))
    }

    fn begin_load(&mut self, commit: CommitRef) -> LoadTicket {
        self.seq += 1;
        self.patches.clear();
        self.failure = None;
        self.phase = Phase::Loading;
        self.target = Some(commit.clone());
        LoadTicket { generation: self.generation(), commit }
    }

    /// Applies a load result if it answers the latest request.
    ///
    /// Returns `true` when the state changed. Results for superseded requests,
    /// or from another state machine, are discarded and `false` is returned.
    pub fn complete(&mut self, completion: LoadCompletion) -> bool {
        if completion.generation != self.generation() || self.phase != Phase::Loading {
            debug!(commit = %completion.commit.short(), "discarding superseded load result");
            return false;
        }
        match completion.result {
            Ok(patches) => {
                self.patches = patches;
                self.failure = None;
            }
            Err(err) => {
                warn!(commit = %completion.commit.short(), error = %err, "patch load failed");
                self.patches.clear();
                self.failure = Some(err);
            }
        }
        self.phase = Phase::Ready;
        true
    }

    /// Forgets the current commit and invalidates any load in flight.
    pub fn reset(&mut self) {
        self.seq += 1;
        self.target = None;
        self.patches.clear();
        self.failure = None;
        self.phase = Phase::Idle;
    }

    pub fn generation(&self) -> Generation {
        Generation { instance: self.instance, seq: self.seq }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The commit on display, whether or not its patches have arrived.
    pub fn commit(&self) -> Option<&CommitRef> {
        self.target.as_ref()
    }

    /// Patches of the latest ready state; empty while idle or loading.
    pub fn current_patches(&self) -> &[PatchDescriptor] {
        &self.patches
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    /// The error of the latest load, if it failed.
    pub fn failure(&self) -> Option<&LoadError> {
        self.failure.as_ref()
    }

    pub fn status(&self) -> PatchListStatus {
        match (self.phase, &self.failure) {
            (Phase::Idle, _) => PatchListStatus::Idle,
            (Phase::Loading, _) => PatchListStatus::Loading,
            (Phase::Ready, Some(err)) => PatchListStatus::Failed(err.clone()),
            (Phase::Ready, None) if self.patches.is_empty() => PatchListStatus::NoChanges,
            (Phase::Ready, None) => PatchListStatus::Ready,
        }
    }
}

/// [`InspectionState`] bound to a backend.
///
/// `set_commit` hands back the load as a `'static` future instead of spawning
/// it, so the caller decides where it runs. Feed the future's output to
/// [`complete`](CommitInspector::complete) on the thread that owns the
/// inspector.
pub struct CommitInspector<B> {
    backend: Arc<B>,
    similarity: SimilarityOptions,
    state: InspectionState,
}

impl<B: VcsBackend> CommitInspector<B> {
    pub fn new(backend: Arc<B>, similarity: SimilarityOptions) -> Self {
        Self { backend, similarity, state: InspectionState::new() }
    }

    /// See [`InspectionState::set_commit`]. The returned future runs the
    /// loader exactly once.
    pub fn set_commit(
        &mut self,
        commit: CommitRef,
    ) -> Option<impl Future<Output = LoadCompletion> + Send + 'static> {
        let ticket = self.state.set_commit(commit)?;
        Some(self.load(ticket))
    }

    /// See [`InspectionState::retry`].
    pub fn retry(&mut self) -> Option<impl Future<Output = LoadCompletion> + Send + 'static> {
        let ticket = self.state.retry()?;
        Some(self.load(ticket))
    }

    fn load(&self, ticket: LoadTicket) -> impl Future<Output = LoadCompletion> + Send + 'static {
        let backend = Arc::clone(&self.backend);
        let similarity = self.similarity;
        async move {
            let LoadTicket { generation, commit } = ticket;
            let result = loader::load_patches(&*backend, &commit, &similarity).await;
            LoadCompletion { generation, commit: commit.id().clone(), result }
        }
    }

    /// See [`InspectionState::complete`].
    pub fn complete(&mut self, completion: LoadCompletion) -> bool {
        self.state.complete(completion)
    }

    pub fn reset(&mut self) {
        self.state.reset();
    }

    pub fn state(&self) -> &InspectionState {
        &self.state
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn current_patches(&self) -> &[PatchDescriptor] {
        self.state.current_patches()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    /// Builds the render model for the current commit, marking the row whose
    /// new path matches `selected`. `None` while no commit is on display.
    pub fn view<'a>(&'a self, selected: Option<&PatchDescriptor>) -> Option<CommitView<'a>> {
        let commit = self.state.commit()?;
        Some(CommitView {
            summary: CommitSummary::from_commit(commit),
            rows: selection::mark_selection(self.state.current_patches(), selected),
            status: self.state.status(),
        })
    }
}
