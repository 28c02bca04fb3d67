//! State machine behaviour against a scripted backend.
//!
//! Exercises: reload idempotence, last-request-wins under out-of-order
//! completion, root commits, selection correlation across reloads and
//! failure isolation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use patchscope_core::backend::{SimilarityOptions, VcsBackend};
use patchscope_core::error::{BackendError, LoadError};
use patchscope_core::inspection::{CommitInspector, Phase};
use patchscope_core::loader;
use patchscope_core::types::{
    ChangeKind, CommitId, CommitRef, GitTime, PatchDescriptor, PatchHandle, Signature,
};
use patchscope_core::view::PatchListStatus;
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy)]
enum FailAt {
    Diff,
    Similarity,
}

struct FakeDiff {
    commit: CommitId,
}

#[derive(Default)]
struct FakeBackend {
    commits: HashMap<String, CommitRef>,
    patches: HashMap<CommitId, Vec<PatchDescriptor>>,
    failures: HashMap<CommitId, FailAt>,
    gates: Mutex<HashMap<CommitId, oneshot::Receiver<()>>>,
    diff_calls: AtomicUsize,
    similar_calls: AtomicUsize,
}

impl FakeBackend {
    fn with_commit(mut self, commit: CommitRef, patches: Vec<PatchDescriptor>) -> Self {
        self.patches.insert(commit.id().clone(), patches);
        self.commits.insert(commit.id().as_str().to_owned(), commit);
        self
    }

    fn failing(mut self, id: &str, at: FailAt) -> Self {
        self.failures.insert(CommitId::new(id), at);
        self
    }

    /// Holds the diff step for `id` until the returned sender fires.
    fn gate(&self, id: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(CommitId::new(id), rx);
        tx
    }
}

impl VcsBackend for FakeBackend {
    type Diff = FakeDiff;

    async fn resolve_commit(&self, rev: &str) -> Result<CommitRef, BackendError> {
        self.commits
            .get(rev)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("revspec '{rev}' not found")))
    }

    async fn diffs(&self, commit: &CommitRef) -> Result<Vec<FakeDiff>, BackendError> {
        self.diff_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().unwrap().remove(commit.id());
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if let Some(FailAt::Diff) = self.failures.get(commit.id()) {
            return Err(BackendError::Git(git2::Error::from_str("object database offline")));
        }
        if commit.is_root() {
            return Ok(Vec::new());
        }
        Ok(vec![FakeDiff { commit: commit.id().clone() }])
    }

    async fn find_similar(
        &self,
        diff: FakeDiff,
        _options: &SimilarityOptions,
    ) -> Result<FakeDiff, BackendError> {
        self.similar_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(FailAt::Similarity) = self.failures.get(&diff.commit) {
            return Err(BackendError::Git(git2::Error::from_str("too many rename candidates")));
        }
        Ok(diff)
    }

    async fn patches(&self, diff: FakeDiff) -> Result<Vec<PatchDescriptor>, BackendError> {
        Ok(self.patches.get(&diff.commit).cloned().unwrap_or_default())
    }
}

fn commit(id: &str, parents: &[&str]) -> CommitRef {
    let author = Signature {
        name: "Ada Lovelace".into(),
        email: "ada@example.com".into(),
        when: GitTime::new(1_700_000_000, 0),
    };
    CommitRef::new(
        CommitId::new(id),
        format!("commit {id}\n"),
        author,
        GitTime::new(1_700_000_000, 0),
        parents.iter().map(|p| CommitId::new(*p)).collect(),
    )
}

fn patch(commit: &str, index: usize, old: &str, new: &str, kind: ChangeKind) -> PatchDescriptor {
    let handle = PatchHandle::new(CommitId::new(commit), None, index);
    PatchDescriptor::new(old, new, kind, handle)
}

fn paths(patches: &[PatchDescriptor]) -> Vec<&str> {
    patches.iter().map(|p| p.new_path()).collect()
}

#[tokio::test]
async fn same_commit_twice_loads_once() {
    let c = commit("c0ffee", &["beef00"]);
    let backend = Arc::new(
        FakeBackend::default()
            .with_commit(c.clone(), vec![patch("c0ffee", 0, "a.rs", "a.rs", ChangeKind::Modified)]),
    );
    let mut inspector = CommitInspector::new(Arc::clone(&backend), SimilarityOptions::default());

    let load = inspector.set_commit(c.clone()).expect("first set_commit loads");
    assert!(inspector.set_commit(c.clone()).is_none());
    assert!(inspector.complete(load.await));

    assert!(inspector.set_commit(c).is_none(), "ready commit is not reloaded");
    assert_eq!(backend.diff_calls.load(Ordering::SeqCst), 1);
    assert_eq!(paths(inspector.current_patches()), vec!["a.rs"]);
}

#[tokio::test]
async fn later_request_wins_over_slower_earlier_one() {
    let a = commit("aaaaaa", &["000000"]);
    let b = commit("bbbbbb", &["aaaaaa"]);
    let backend = Arc::new(
        FakeBackend::default()
            .with_commit(a.clone(), vec![patch("aaaaaa", 0, "a.rs", "a.rs", ChangeKind::Added)])
            .with_commit(b.clone(), vec![patch("bbbbbb", 0, "b.rs", "b.rs", ChangeKind::Added)]),
    );
    let mut inspector = CommitInspector::new(backend, SimilarityOptions::default());

    let load_a = inspector.set_commit(a).unwrap();
    let load_b = inspector.set_commit(b).unwrap();
    assert!(inspector.is_loading());
    assert!(inspector.current_patches().is_empty());

    assert!(inspector.complete(load_b.await));
    assert!(!inspector.complete(load_a.await), "stale result must be dropped");

    assert_eq!(inspector.state().phase(), Phase::Ready);
    assert_eq!(paths(inspector.current_patches()), vec!["b.rs"]);
}

#[tokio::test]
async fn spawned_loads_resolving_out_of_order_keep_newest() {
    let a = commit("aaaaaa", &["000000"]);
    let b = commit("bbbbbb", &["aaaaaa"]);
    let backend = Arc::new(
        FakeBackend::default()
            .with_commit(a.clone(), vec![patch("aaaaaa", 0, "a.rs", "a.rs", ChangeKind::Added)])
            .with_commit(b.clone(), vec![patch("bbbbbb", 0, "b.rs", "b.rs", ChangeKind::Added)]),
    );
    let release_a = backend.gate("aaaaaa");
    let mut inspector = CommitInspector::new(Arc::clone(&backend), SimilarityOptions::default());

    let task_a = tokio::spawn(inspector.set_commit(a).unwrap());
    let task_b = tokio::spawn(inspector.set_commit(b).unwrap());

    assert!(inspector.complete(task_b.await.unwrap()));
    release_a.send(()).unwrap();
    assert!(!inspector.complete(task_a.await.unwrap()));

    assert_eq!(paths(inspector.current_patches()), vec!["b.rs"]);
    assert_eq!(backend.diff_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn late_failure_of_superseded_load_is_ignored() {
    let a = commit("aaaaaa", &["000000"]);
    let b = commit("bbbbbb", &["aaaaaa"]);
    let backend = Arc::new(
        FakeBackend::default()
            .with_commit(a.clone(), Vec::new())
            .with_commit(b.clone(), vec![patch("bbbbbb", 0, "b.rs", "b.rs", ChangeKind::Added)])
            .failing("aaaaaa", FailAt::Diff),
    );
    let release_a = backend.gate("aaaaaa");
    let mut inspector = CommitInspector::new(Arc::clone(&backend), SimilarityOptions::default());

    let task_a = tokio::spawn(inspector.set_commit(a).unwrap());
    let task_b = tokio::spawn(inspector.set_commit(b).unwrap());

    assert!(inspector.complete(task_b.await.unwrap()));
    release_a.send(()).unwrap();
    let late = task_a.await.unwrap();
    assert!(late.result.is_err());
    assert!(!inspector.complete(late));

    assert_eq!(inspector.state().phase(), Phase::Ready);
    assert!(inspector.state().failure().is_none());
    assert_eq!(inspector.state().status(), PatchListStatus::Ready);
    assert_eq!(paths(inspector.current_patches()), vec!["b.rs"]);
}

#[tokio::test]
async fn root_commit_has_no_changes_and_skips_similarity() {
    let root = commit("r00t00", &[]);
    let backend = Arc::new(FakeBackend::default().with_commit(root.clone(), Vec::new()));
    let mut inspector = CommitInspector::new(Arc::clone(&backend), SimilarityOptions::default());

    let load = inspector.set_commit(root).unwrap();
    assert!(inspector.complete(load.await));

    assert!(inspector.current_patches().is_empty());
    assert_eq!(inspector.state().status(), PatchListStatus::NoChanges);
    assert!(inspector.state().failure().is_none());
    assert_eq!(backend.similar_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn selection_is_recognised_again_after_switching_commits() {
    let c1 = commit("111111", &["000000"]);
    let c2 = commit("222222", &["111111"]);
    let backend = Arc::new(
        FakeBackend::default()
            .with_commit(
                c1.clone(),
                vec![
                    patch("111111", 0, "README.md", "README.md", ChangeKind::Modified),
                    patch("111111", 1, "src/foo.ts", "src/foo.ts", ChangeKind::Modified),
                ],
            )
            .with_commit(
                c2.clone(),
                vec![
                    patch("222222", 0, "src/bar.ts", "src/bar.ts", ChangeKind::Added),
                    patch("222222", 1, "src/foo.ts", "src/foo.ts", ChangeKind::Modified),
                ],
            ),
    );
    let mut inspector = CommitInspector::new(backend, SimilarityOptions::default());

    let load = inspector.set_commit(c1).unwrap();
    inspector.complete(load.await);

    let mut selected: Option<PatchDescriptor> = None;
    patchscope_core::selection::report_selection(inspector.current_patches(), 1, |p| {
        selected = Some(p.clone());
    });
    let selected = selected.expect("callback fired");

    let load = inspector.set_commit(c2).unwrap();
    inspector.complete(load.await);

    let view = inspector.view(Some(&selected)).unwrap();
    let flags: Vec<(&str, bool)> =
        view.rows.iter().map(|r| (r.patch.new_path(), r.is_selected)).collect();
    assert_eq!(flags, vec![("src/bar.ts", false), ("src/foo.ts", true)]);
    assert_ne!(view.rows[1].patch, &selected, "descriptor is a new instance");
}

#[tokio::test]
async fn backend_failure_leaves_ready_empty_and_flagged() {
    let x = commit("deadbe", &["000000"]);
    let backend = Arc::new(
        FakeBackend::default()
            .with_commit(x.clone(), vec![patch("deadbe", 0, "a", "a", ChangeKind::Added)])
            .failing("deadbe", FailAt::Diff),
    );
    let mut inspector = CommitInspector::new(backend, SimilarityOptions::default());

    let load = inspector.set_commit(x).unwrap();
    assert!(inspector.complete(load.await));

    let state = inspector.state();
    assert_eq!(state.phase(), Phase::Ready);
    assert!(state.current_patches().is_empty());
    assert!(matches!(state.failure(), Some(LoadError::BackendUnavailable(_))));
    assert!(matches!(state.status(), PatchListStatus::Failed(_)));
    assert_ne!(state.status(), PatchListStatus::NoChanges);
}

#[tokio::test]
async fn failed_load_can_be_retried() {
    let x = commit("deadbe", &["000000"]);
    let backend = Arc::new(FakeBackend::default().with_commit(x.clone(), Vec::new()).failing("deadbe", FailAt::Diff));
    let mut inspector = CommitInspector::new(Arc::clone(&backend), SimilarityOptions::default());

    let load = inspector.set_commit(x).unwrap();
    inspector.complete(load.await);
    let again = inspector.retry().expect("retry after failure");
    inspector.complete(again.await);

    assert_eq!(backend.diff_calls.load(Ordering::SeqCst), 2);
    assert!(inspector.retry().is_some(), "still failing, still retryable");
}

#[tokio::test]
async fn similarity_failure_is_reported_as_such() {
    let x = commit("5a5a5a", &["000000"]);
    let backend = FakeBackend::default()
        .with_commit(x.clone(), Vec::new())
        .failing("5a5a5a", FailAt::Similarity);

    let err = loader::load_patches(&backend, &x, &SimilarityOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::SimilarityDetectionFailed(_)));
}

#[tokio::test]
async fn unknown_revision_is_unresolvable() {
    let backend = FakeBackend::default();
    let err = loader::resolve_and_load(&backend, "no-such-branch", &SimilarityOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::UnresolvableCommit(_)));
}

#[tokio::test]
async fn patch_order_is_passed_through_untouched() {
    let c = commit("0rder0", &["000000"]);
    let listed = vec![
        patch("0rder0", 0, "z.rs", "z.rs", ChangeKind::Modified),
        patch("0rder0", 1, "a.rs", "a.rs", ChangeKind::Deleted),
        patch("0rder0", 2, "m.rs", "m.rs", ChangeKind::Added),
    ];
    let backend = FakeBackend::default().with_commit(c.clone(), listed.clone());

    let loaded = loader::load_patches(&backend, &c, &SimilarityOptions::default()).await.unwrap();
    assert_eq!(loaded, listed);
}
