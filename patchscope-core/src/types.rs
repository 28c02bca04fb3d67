//! Owned data types shared by the git worker, the inspection core and the UI.
//!
//! Nothing in here borrows from a `git2::Repository`. Every value can cross the
//! worker-thread boundary and be stored in UI state for as long as it is needed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::backend::SimilarityOptions;

/// Number of hex characters shown for an abbreviated commit id.
pub const SHORT_ID_LEN: usize = 6;

/// Hex object id of a commit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommitId(String);

impl CommitId {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first [`SHORT_ID_LEN`] characters, or the whole id if it is shorter.
    pub fn short(&self) -> &str {
        self.0.get(..SHORT_ID_LEN).unwrap_or(&self.0)
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<git2::Oid> for CommitId {
    fn from(oid: git2::Oid) -> Self {
        Self(oid.to_string())
    }
}

/// A point in time as git records it: seconds since the epoch plus the
/// author's UTC offset in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GitTime {
    pub seconds: i64,
    pub offset_minutes: i32,
}

impl GitTime {
    pub fn new(seconds: i64, offset_minutes: i32) -> Self {
        Self { seconds, offset_minutes }
    }
}

impl From<git2::Time> for GitTime {
    fn from(t: git2::Time) -> Self {
        Self::new(t.seconds(), t.offset_minutes())
    }
}

/// Name, email and timestamp of an author or committer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub when: GitTime,
}

/// Immutable snapshot of a commit as read from the backend.
///
/// Two `CommitRef`s describe the same commit when their ids are equal; the
/// inspection state machine never compares anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRef {
    id: CommitId,
    message: String,
    author: Signature,
    committed_at: GitTime,
    parents: Vec<CommitId>,
}

impl CommitRef {
    pub fn new(
        id: CommitId,
        message: impl Into<String>,
        author: Signature,
        committed_at: GitTime,
        parents: Vec<CommitId>,
    ) -> Self {
        Self { id, message: message.into(), author, committed_at, parents }
    }

    pub fn id(&self) -> &CommitId {
        &self.id
    }

    /// Full commit message, including the trailing newline git stores.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// First line of the message.
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    pub fn author(&self) -> &Signature {
        &self.author
    }

    /// Committer timestamp, shown as "last modified".
    pub fn committed_at(&self) -> GitTime {
        self.committed_at
    }

    /// Parent ids in the order git stores them; the first is the diff base.
    pub fn parents(&self) -> &[CommitId] {
        &self.parents
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }
}

/// How a file changed between a commit and its diff base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Added,
    Deleted,
    Modified,
    Renamed,
    Copied,
    TypeChanged,
    /// Anything else libgit2 reports (ignored, untracked, conflicted, ...).
    Other,
}

impl ChangeKind {
    /// Single-letter badge as printed by `git diff --name-status`.
    pub fn badge(self) -> char {
        match self {
            ChangeKind::Added => 'A',
            ChangeKind::Deleted => 'D',
            ChangeKind::Modified => 'M',
            ChangeKind::Renamed => 'R',
            ChangeKind::Copied => 'C',
            ChangeKind::TypeChanged => 'T',
            ChangeKind::Other => '?',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Modified => "modified",
            ChangeKind::Renamed => "renamed",
            ChangeKind::Copied => "copied",
            ChangeKind::TypeChanged => "type changed",
            ChangeKind::Other => "other",
        }
    }
}

impl From<git2::Delta> for ChangeKind {
    fn from(delta: git2::Delta) -> Self {
        match delta {
            git2::Delta::Added => ChangeKind::Added,
            git2::Delta::Deleted => ChangeKind::Deleted,
            git2::Delta::Modified => ChangeKind::Modified,
            git2::Delta::Renamed => ChangeKind::Renamed,
            git2::Delta::Copied => ChangeKind::Copied,
            git2::Delta::Typechange => ChangeKind::TypeChanged,
            _ => ChangeKind::Other,
        }
    }
}

/// Opaque reference to the hunk data of one patch.
///
/// Records how the diff that produced the patch was computed so the backend
/// can rebuild it on demand. Callers only pass it back to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchHandle {
    commit: CommitId,
    base: Option<CommitId>,
    similarity: Option<SimilarityOptions>,
    index: usize,
}

impl PatchHandle {
    pub fn new(commit: CommitId, base: Option<CommitId>, index: usize) -> Self {
        Self { commit, base, similarity: None, index }
    }

    pub fn with_similarity(mut self, options: SimilarityOptions) -> Self {
        self.similarity = Some(options);
        self
    }

    pub fn commit(&self) -> &CommitId {
        &self.commit
    }

    pub fn base(&self) -> Option<&CommitId> {
        self.base.as_ref()
    }

    pub fn similarity(&self) -> Option<&SimilarityOptions> {
        self.similarity.as_ref()
    }

    /// Position of the delta inside its diff.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// One file-level change within a diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchDescriptor {
    old_path: String,
    new_path: String,
    kind: ChangeKind,
    handle: PatchHandle,
}

impl PatchDescriptor {
    pub fn new(
        old_path: impl Into<String>,
        new_path: impl Into<String>,
        kind: ChangeKind,
        handle: PatchHandle,
    ) -> Self {
        Self { old_path: old_path.into(), new_path: new_path.into(), kind, handle }
    }

    pub fn old_path(&self) -> &str {
        &self.old_path
    }

    /// Path on the new side of the diff. Also the key used to correlate a
    /// selection across reloads.
    pub fn new_path(&self) -> &str {
        &self.new_path
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    pub fn handle(&self) -> &PatchHandle {
        &self.handle
    }

    /// `old -> new` for renames and copies, the new path otherwise.
    pub fn display_path(&self) -> String {
        match self.kind {
            ChangeKind::Renamed | ChangeKind::Copied if self.old_path != self.new_path => {
                format!("{} -> {}", self.old_path, self.new_path)
            }
            _ => self.new_path.clone(),
        }
    }
}

/// A single line of diff output.
///
/// Origin characters match `git2::DiffLine::origin()` conventions:
/// `'+'` added, `'-'` removed, `' '` context, plus the end-of-file markers
/// `'='`, `'>'` and `'<'`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedDiffLine {
    pub origin: char,
    /// Line content including its trailing newline, if any.
    pub content: String,
    pub old_lineno: Option<u32>,
    pub new_lineno: Option<u32>,
}

/// One `@@` hunk of a patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedDiffHunk {
    /// The raw `@@ -old_start,old_lines +new_start,new_lines @@` header.
    pub header: String,
    pub old_start: u32,
    pub new_start: u32,
    pub lines: Vec<OwnedDiffLine>,
}
