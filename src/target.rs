//! The Git writer collaborator: persists commits and ref updates. Tree
//! construction from a file-operation list is delegated entirely to the
//! writer; the pipeline only supplies the operations and author/committer
//! and message data.

use crate::commit::Identity;
use crate::source::FileOp;
use crate::source::Timestamp;
use std::collections::HashMap;

/// External collaborator accepting commit and ref-update requests.
pub trait GitWriter {
    /// Persist a commit object and return its Git object id.
    fn write_commit(
        &mut self,
        parents: &[String],
        author: &Identity,
        committer: &Identity,
        timestamp: Timestamp,
        message: &str,
        file_ops: &[FileOp],
    ) -> crate::Result<String>;

    /// Point `refname` at `commit_id`, creating or updating it.
    fn update_ref(&mut self, refname: &str, commit_id: &str) -> crate::Result<()>;

    /// Remove `refname` entirely (used for `.hgtags` tag deletions).
    fn delete_ref(&mut self, refname: &str) -> crate::Result<()>;
}

/// A recorded commit, as observed by [`InMemoryWriter`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitRecord {
    /// Assigned object id, e.g. `c0`, `c1`, ...
    pub id: String,
    /// Parent commit ids, in order.
    pub parents: Vec<String>,
    /// Commit author identity.
    pub author: Identity,
    /// Commit committer identity.
    pub committer: Identity,
    /// Commit timestamp.
    pub timestamp: Timestamp,
    /// Commit message.
    pub message: String,
    /// File operations recorded against this commit.
    pub file_ops: Vec<FileOp>,
}

/// An in-memory [`GitWriter`] recording every commit and ref update, for use
/// by integration tests in place of a real object store.
#[derive(Default)]
pub struct InMemoryWriter {
    /// Commits written so far, in write order.
    pub commits: Vec<CommitRecord>,
    /// Current refname -> commit id mapping.
    pub refs: HashMap<String, String>,
    /// Refnames deleted over the lifetime of this writer.
    pub deleted_refs: Vec<String>,
}

impl InMemoryWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }
}

impl GitWriter for InMemoryWriter {
    fn write_commit(
        &mut self,
        parents: &[String],
        author: &Identity,
        committer: &Identity,
        timestamp: Timestamp,
        message: &str,
        file_ops: &[FileOp],
    ) -> crate::Result<String> {
        let id = format!("c{}", self.commits.len());
        self.commits.push(CommitRecord {
            id: id.clone(),
            parents: parents.to_vec(),
            author: author.clone(),
            committer: committer.clone(),
            timestamp,
            message: message.to_string(),
            file_ops: file_ops.to_vec(),
        });
        Ok(id)
    }

    fn update_ref(&mut self, refname: &str, commit_id: &str) -> crate::Result<()> {
        self.refs.insert(refname.to_string(), commit_id.to_string());
        Ok(())
    }

    fn delete_ref(&mut self, refname: &str) -> crate::Result<()> {
        self.refs.remove(refname);
        self.deleted_refs.push(refname.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity {
            name: "bob".to_string(),
            email: "bob@localhost".to_string(),
        }
    }

    #[test]
    fn writer_assigns_sequential_commit_ids() {
        let mut writer = InMemoryWriter::new();
        let ts = Timestamp {
            seconds: 0,
            tz_offset: 0,
        };
        let c0 = writer
            .write_commit(&[], &identity(), &identity(), ts, "first", &[])
            .unwrap();
        let c1 = writer
            .write_commit(&[c0.clone()], &identity(), &identity(), ts, "second", &[])
            .unwrap();
        assert_eq!(c0, "c0");
        assert_eq!(c1, "c1");
        assert_eq!(writer.commits[1].parents, vec!["c0".to_string()]);
    }

    #[test]
    fn deleting_a_ref_removes_it_and_records_the_deletion() {
        let mut writer = InMemoryWriter::new();
        writer.update_ref("refs/tags/v1", "c0").unwrap();
        writer.delete_ref("refs/tags/v1").unwrap();
        assert!(!writer.refs.contains_key("refs/tags/v1"));
        assert_eq!(writer.deleted_refs, vec!["refs/tags/v1".to_string()]);
    }
}
