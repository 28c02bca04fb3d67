//! End-to-end inspection against real repositories built in a temp dir.
//!
//! Exercises: GitBackend::open/init, history, resolve_commit, the loader with
//! rename detection, and on-demand hunks.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use git2::{Oid, Repository, Signature, Time};
use patchscope_core::backend::{SimilarityOptions, VcsBackend};
use patchscope_core::error::LoadError;
use patchscope_core::git::GitBackend;
use patchscope_core::inspection::CommitInspector;
use patchscope_core::loader;
use patchscope_core::types::{ChangeKind, CommitId};
use patchscope_core::view::PatchListStatus;

const OLD_TXT: &str = "alpha\nbravo\ncharlie\ndelta\necho\nfoxtrot\ngolf\nhotel\n";

/// Writes (`Some`) or deletes (`None`) each file, stages it and commits on HEAD.
fn commit_files(repo: &Repository, files: &[(&str, Option<&str>)], message: &str, secs: i64) -> Oid {
    let workdir = repo.workdir().unwrap().to_path_buf();
    let mut index = repo.index().unwrap();
    for (path, content) in files {
        let full = workdir.join(path);
        match content {
            Some(text) => {
                if let Some(dir) = full.parent() {
                    fs::create_dir_all(dir).unwrap();
                }
                fs::write(&full, text).unwrap();
                index.add_path(Path::new(path)).unwrap();
            }
            None => {
                fs::remove_file(&full).unwrap();
                index.remove_path(Path::new(path)).unwrap();
            }
        }
    }
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::new("Ada Lovelace", "ada@example.com", &Time::new(secs, 60)).unwrap();
    let parents = match repo.head() {
        Ok(head) => vec![head.peel_to_commit().unwrap()],
        Err(_) => Vec::new(),
    };
    let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs).unwrap()
}

/// C1: root commit with README.md and old.txt.
/// C2: edits README.md, adds notes.txt, renames old.txt to renamed.txt.
fn two_commit_repo() -> (tempfile::TempDir, Oid, Oid) {
    let dir = tempfile::TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let c1 = commit_files(
        &repo,
        &[("README.md", Some("# demo\n")), ("old.txt", Some(OLD_TXT))],
        "Initial import\n",
        1_700_000_000,
    );
    let c2 = commit_files(
        &repo,
        &[
            ("README.md", Some("# demo\n\nNow with notes.\n")),
            ("notes.txt", Some("completely unrelated content\nthat shares nothing\n")),
            ("old.txt", None),
            ("renamed.txt", Some(OLD_TXT)),
        ],
        "Rename and annotate\n",
        1_700_000_100,
    );
    (dir, c1, c2)
}

#[tokio::test]
async fn root_then_child_commit_scenario() {
    let (dir, c1, c2) = two_commit_repo();
    let backend = Arc::new(GitBackend::open(dir.path()).unwrap());
    let mut inspector = CommitInspector::new(Arc::clone(&backend), SimilarityOptions::default());

    let first = backend.resolve_commit(&c1.to_string()).await.unwrap();
    assert!(first.is_root());
    let load = inspector.set_commit(first).unwrap();
    assert!(inspector.complete(load.await));
    assert!(inspector.current_patches().is_empty());
    assert_eq!(inspector.state().status(), PatchListStatus::NoChanges);

    let second = backend.resolve_commit("HEAD").await.unwrap();
    assert_eq!(second.id(), &CommitId::from(c2));
    assert_eq!(second.parents(), &[CommitId::from(c1)]);
    let load = inspector.set_commit(second).unwrap();
    assert!(inspector.complete(load.await));

    let patches = inspector.current_patches();
    assert_eq!(patches.len(), 3);
    let renamed: Vec<_> = patches.iter().filter(|p| p.kind() == ChangeKind::Renamed).collect();
    assert_eq!(renamed.len(), 1);
    assert_eq!(renamed[0].old_path(), "old.txt");
    assert_eq!(renamed[0].new_path(), "renamed.txt");
    assert!(patches.iter().any(|p| p.new_path() == "notes.txt" && p.kind() == ChangeKind::Added));
    assert!(patches.iter().any(|p| p.new_path() == "README.md" && p.kind() == ChangeKind::Modified));
}

#[tokio::test]
async fn renames_can_be_switched_off() {
    let (dir, _c1, c2) = two_commit_repo();
    let backend = GitBackend::open(dir.path()).unwrap();
    let commit = backend.resolve_commit(&c2.to_string()).await.unwrap();
    let options = SimilarityOptions { renames: false, ..SimilarityOptions::default() };

    let patches = loader::load_patches(&backend, &commit, &options).await.unwrap();

    assert_eq!(patches.len(), 4);
    assert!(patches.iter().all(|p| p.kind() != ChangeKind::Renamed));
}

#[tokio::test]
async fn hunks_follow_the_patch_handle() {
    let (dir, _c1, _c2) = two_commit_repo();
    let backend = GitBackend::open(dir.path()).unwrap();
    let commit = backend.resolve_commit("HEAD").await.unwrap();
    let patches = loader::load_patches(&backend, &commit, &SimilarityOptions::default())
        .await
        .unwrap();

    let readme = patches.iter().find(|p| p.new_path() == "README.md").unwrap();
    let hunks = backend.hunks(readme.handle().clone()).await.unwrap();
    assert_eq!(hunks.len(), 1);
    assert!(hunks[0].header.starts_with("@@"));
    let added: Vec<&str> = hunks[0]
        .lines
        .iter()
        .filter(|l| l.origin == '+')
        .map(|l| l.content.as_str())
        .collect();
    assert_eq!(added, vec!["\n", "Now with notes.\n"]);

    let renamed = patches.iter().find(|p| p.kind() == ChangeKind::Renamed).unwrap();
    let hunks = backend.hunks(renamed.handle().clone()).await.unwrap();
    assert!(hunks.is_empty(), "pure rename has no content changes");
}

#[tokio::test]
async fn history_lists_newest_first() {
    let (dir, c1, c2) = two_commit_repo();
    let backend = GitBackend::open(dir.path()).unwrap();

    let all = backend.history(None, 50).await.unwrap();
    let ids: Vec<&CommitId> = all.iter().map(|c| c.id()).collect();
    assert_eq!(ids, vec![&CommitId::from(c2), &CommitId::from(c1)]);
    assert_eq!(all[0].subject(), "Rename and annotate");
    assert_eq!(all[0].author().when.offset_minutes, 60);

    let limited = backend.history(Some("HEAD~1".into()), 50).await.unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].id(), &CommitId::from(c1));
}

#[tokio::test]
async fn fresh_repository_has_empty_history() {
    let dir = tempfile::TempDir::new().unwrap();
    let backend = GitBackend::init(dir.path()).unwrap();
    assert!(backend.history(None, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_revision_is_unresolvable() {
    let (dir, _c1, _c2) = two_commit_repo();
    let backend = GitBackend::open(dir.path()).unwrap();
    let err = loader::resolve_and_load(&backend, "no-such-branch", &SimilarityOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::UnresolvableCommit(_)));
}
