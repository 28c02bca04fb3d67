//! Render model handed to the presentation layer.
//!
//! Everything here is a projection of [`CommitRef`] and the inspection state;
//! no decisions are made in this module.

use chrono::{DateTime, FixedOffset};

use crate::error::LoadError;
use crate::selection::PatchRow;
use crate::types::{CommitRef, GitTime};

/// What the patch list currently shows.
///
/// `NoChanges` and `Failed` both come with an empty list, but they are kept
/// apart so the UI can say "no changes" for an empty diff and show a warning
/// for a backend failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchListStatus {
    Idle,
    Loading,
    NoChanges,
    Failed(LoadError),
    Ready,
}

/// Header fields of the commit view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    pub short_id: String,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub authored: String,
    pub last_modified: String,
    pub parents: Vec<String>,
}

impl CommitSummary {
    pub fn from_commit(commit: &CommitRef) -> Self {
        let author = commit.author();
        Self {
            short_id: commit.id().short().to_owned(),
            message: commit.message().trim_end().to_owned(),
            author_name: author.name.clone(),
            author_email: author.email.clone(),
            authored: format_time(author.when),
            last_modified: format_time(commit.committed_at()),
            parents: commit.parents().iter().map(|p| p.short().to_owned()).collect(),
        }
    }

    /// Parent short ids joined by spaces, as shown in the header.
    pub fn parents_line(&self) -> String {
        self.parents.join(" ")
    }
}

/// Commit summary plus the patch rows, ready to draw.
#[derive(Debug, Clone)]
pub struct CommitView<'a> {
    pub summary: CommitSummary,
    pub rows: Vec<PatchRow<'a>>,
    pub status: PatchListStatus,
}

const TIME_FORMAT: &str = "%Y-%m-%d at %H:%M:%S";

/// Formats a git timestamp in its own UTC offset as `YYYY-MM-DD at HH:MM:SS`.
pub fn format_time(time: GitTime) -> String {
    let Some(utc) = DateTime::from_timestamp(time.seconds, 0) else {
        return format!("@{}", time.seconds);
    };
    match FixedOffset::east_opt(time.offset_minutes * 60) {
        Some(offset) => utc.with_timezone(&offset).format(TIME_FORMAT).to_string(),
        None => utc.format(TIME_FORMAT).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CommitId, Signature};

    #[test]
    fn times_render_in_their_own_offset() {
        // 2023-11-14 22:13:20 UTC
        assert_eq!(format_time(GitTime::new(1_700_000_000, 0)), "2023-11-14 at 22:13:20");
        assert_eq!(format_time(GitTime::new(1_700_000_000, 120)), "2023-11-15 at 00:13:20");
        assert_eq!(format_time(GitTime::new(1_700_000_000, -300)), "2023-11-14 at 17:13:20");
    }

    #[test]
    fn summary_projects_commit_fields() {
        let author = Signature {
            name: "Grace".into(),
            email: "grace@example.com".into(),
            when: GitTime::new(1_700_000_000, 0),
        };
        let commit = CommitRef::new(
            CommitId::new("0123456789abcdef0123456789abcdef01234567"),
            "Fix the frobnicator\n\nLonger body.\n",
            author,
            GitTime::new(1_700_000_060, 0),
            vec![
                CommitId::new("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"),
                CommitId::new("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"),
            ],
        );
        let summary = CommitSummary::from_commit(&commit);
        assert_eq!(summary.short_id, "012345");
        assert_eq!(summary.message, "Fix the frobnicator\n\nLonger body.");
        assert_eq!(summary.author_name, "Grace");
        assert_eq!(summary.author_email, "grace@example.com");
        assert_eq!(summary.last_modified, "2023-11-14 at 22:14:20");
        assert_eq!(summary.parents_line(), "aaaaaa bbbbbb");
    }
}
