//! The HG reader collaborator: data types describing a changeset, and the
//! trait the pipeline drives to pull them in topological order.

use std::fmt;

/// A single file-level change recorded against a changeset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileOp {
    /// A new file, at `path` with the given mode bits.
    Add { path: String, mode: u32 },
    /// An existing file's content or mode changed.
    Modify { path: String, mode: u32 },
    /// A file removed from the tree.
    Delete { path: String },
    /// A file moved from `from` to `to`, optionally with a new mode.
    Rename { from: String, to: String, mode: u32 },
}

/// A UTC timestamp with the author's original timezone offset, preserved
/// verbatim for both author and committer time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timestamp {
    /// Seconds since the Unix epoch.
    pub seconds: i64,
    /// Offset from UTC, in seconds (e.g. `-18000` for UTC-5).
    pub tz_offset: i32,
}

/// A single `.hgtags` line change observed at a changeset: either a tag
/// pointing at a revision, or a removal of that tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagChange {
    /// `tag` now points at `revision`.
    Set { tag: String, revision: String },
    /// `tag` was removed.
    Remove { tag: String },
}

/// An HG changeset as delivered by the reader: revision id, 0-2 parents,
/// branch label, author, timestamp, message, file operations, and the
/// `.hgtags` diff introduced at this revision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Changeset {
    /// Opaque HG revision identifier.
    pub revision: String,
    /// 0, 1, or 2 parent revision identifiers.
    pub parents: Vec<String>,
    /// The HG branch label this changeset belongs to.
    pub branch: String,
    /// Raw HG username string, not yet parsed into an [`crate::commit::Identity`].
    pub author: String,
    /// Author/committer timestamp.
    pub timestamp: Timestamp,
    /// Commit message, possibly empty.
    pub message: String,
    /// File-level changes introduced by this revision.
    pub file_ops: Vec<FileOp>,
    /// `.hgtags` diff introduced by this revision.
    pub tag_changes: Vec<TagChange>,
}

impl fmt::Display for Changeset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.revision)
    }
}

/// External collaborator yielding changesets in topological order. Assumed
/// by the pipeline to never reorder parents ahead of children.
pub trait HgSource {
    /// Pull the next changeset, or `None` at the end of history.
    fn next_changeset(&mut self) -> crate::Result<Option<Changeset>>;
}

/// An in-memory [`HgSource`] driven by a fixed, pre-built changeset list.
/// Used by integration tests in place of a real Mercurial repository.
pub struct ReplaySource {
    changesets: std::vec::IntoIter<Changeset>,
}

impl ReplaySource {
    /// Build a source that yields `changesets` in the given order, then ends.
    pub fn new(changesets: Vec<Changeset>) -> Self {
        ReplaySource {
            changesets: changesets.into_iter(),
        }
    }
}

impl HgSource for ReplaySource {
    fn next_changeset(&mut self) -> crate::Result<Option<Changeset>> {
        Ok(self.changesets.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changeset(revision: &str, parents: &[&str], branch: &str) -> Changeset {
        Changeset {
            revision: revision.to_string(),
            parents: parents.iter().map(|s| s.to_string()).collect(),
            branch: branch.to_string(),
            author: "bob".to_string(),
            timestamp: Timestamp {
                seconds: 0,
                tz_offset: 0,
            },
            message: String::new(),
            file_ops: Vec::new(),
            tag_changes: Vec::new(),
        }
    }

    #[test]
    fn replay_source_yields_in_given_order_then_none() {
        let mut src = ReplaySource::new(vec![
            changeset("r0", &[], "main"),
            changeset("r1", &["r0"], "main"),
        ]);
        assert_eq!(src.next_changeset().unwrap().unwrap().revision, "r0");
        assert_eq!(src.next_changeset().unwrap().unwrap().revision, "r1");
        assert!(src.next_changeset().unwrap().is_none());
    }
}
