//! Revision Pipeline: drives changesets from the HG reader through project
//! selection, ref allocation, and commit building, into the Git writer.

use crate::commit;
use crate::config::Config;
use crate::refalloc::Kind;
use crate::refalloc::RefAllocator;
use crate::selector;
use crate::source::Changeset;
use crate::source::HgSource;
use crate::source::TagChange;
use crate::target::GitWriter;
use crate::Result;
use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

/// The allocated ref and last-seen state for one (project, HG branch label)
/// pair still active in the current frontier.
#[derive(Clone, Debug)]
struct BranchHead {
    refname: String,
    last_hg_rev: String,
    last_git_commit: String,
}

/// Relaxed-ordering counters a concurrent progress reporter may poll without
/// locking; the pipeline itself only ever writes them from its single
/// thread.
#[derive(Default)]
pub struct Progress {
    /// Changesets pulled from the HG reader so far.
    pub processed: AtomicU64,
    /// Changesets routed to no project, an unmapped branch, or suppressed
    /// as an empty change.
    pub skipped: AtomicU64,
    /// Git commits actually written.
    pub emitted: AtomicU64,
}

impl Progress {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the three counters (processed, skipped, emitted).
    pub fn snapshot(&self) -> (u64, u64, u64) {
        (
            self.processed.load(Ordering::Relaxed),
            self.skipped.load(Ordering::Relaxed),
            self.emitted.load(Ordering::Relaxed),
        )
    }
}

/// Options governing pipeline behavior that come from the CLI surface.
#[derive(Clone, Debug, Default)]
pub struct PipelineOptions {
    /// Stop cleanly after emitting this HG revision.
    pub end_revision: Option<String>,
    /// Append `HG-revision: <rev>` to every commit message.
    pub decorate_revision_id: bool,
    /// Whether `--verbose=dump_all` was given: forces emission of otherwise
    /// suppressed empty changes and logs every project/branch skip.
    pub dump_all: bool,
}

/// Drives the conversion: consumes changesets, allocates refs, builds
/// commits, and maintains the HG→Git commit map and branch-head table.
pub struct Pipeline<'cfg> {
    config: &'cfg Config,
    enabled_projects: Vec<String>,
    allocator: RefAllocator,
    commit_map: HashMap<String, String>,
    branch_heads: HashMap<(String, String), BranchHead>,
    options: PipelineOptions,
    progress: Progress,
}

impl<'cfg> Pipeline<'cfg> {
    /// Build a pipeline for `config`, with only `enabled_projects` eligible
    /// to own incoming changesets (see `selector::enabled_projects`).
    pub fn new(config: &'cfg Config, enabled_projects: Vec<String>, options: PipelineOptions) -> Self {
        Pipeline {
            config,
            enabled_projects,
            allocator: RefAllocator::new(),
            commit_map: HashMap::new(),
            branch_heads: HashMap::new(),
            options,
            progress: Progress::default(),
        }
    }

    /// Counters a progress reporter may poll concurrently.
    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    /// Run to completion (or until `--end-revision` is reached).
    pub fn run(&mut self, source: &mut dyn HgSource, writer: &mut dyn GitWriter) -> Result<()> {
        loop {
            let changeset = match source.next_changeset()? {
                Some(cs) => cs,
                None => break,
            };
            Progress::bump(&self.progress.processed);
            let revision = changeset.revision.clone();
            self.process_changeset(changeset, writer)?;
            if self.options.end_revision.as_deref() == Some(revision.as_str()) {
                log::info!("reached --end-revision {}, stopping", revision);
                break;
            }
        }
        Ok(())
    }

    fn process_changeset(&mut self, cs: Changeset, writer: &mut dyn GitWriter) -> Result<()> {
        // Step 2: select the owning project via branch-filter match.
        let project = match selector::select_project(self.config, &self.enabled_projects, &cs.branch) {
            Some(p) => p,
            None => {
                if self.options.dump_all {
                    log::info!(
                        "skipping revision {}: no project owns branch {:?}",
                        cs.revision,
                        cs.branch
                    );
                }
                Progress::bump(&self.progress.skipped);
                return Ok(());
            }
        };
        let project_name = project.name.clone();

        // Step 3: allocate (or retrieve) the branch ref.
        let allocation = self.allocator.allocate(project, &cs.branch, Kind::Branch)?;
        let branch_refname = match &allocation.refname {
            Some(refname) => refname.clone(),
            None => {
                if self.options.dump_all {
                    log::info!(
                        "skipping revision {}: branch {:?} is explicitly unmapped in project {:?}",
                        cs.revision,
                        cs.branch,
                        project_name
                    );
                }
                Progress::bump(&self.progress.skipped);
                self.process_tag_changes(&project_name, &cs, writer)?;
                return Ok(());
            }
        };

        // Step 4: resolve parents through the HG->Git commit map, omitting
        // any that were skipped or unmapped.
        let parents: Vec<String> = cs
            .parents
            .iter()
            .filter_map(|p| self.commit_map.get(p).cloned())
            .collect();

        // Step 6: author/committer/message.
        let identity = commit::parse_author(&cs.author);
        let decorate = self.options.decorate_revision_id.then(|| cs.revision.clone());
        let message = commit::compose_message(&cs.message, &cs.file_ops, decorate.as_deref());

        // Empty-change policy: suppressed unless --verbose=dump_all forces
        // emission even of changesets with no file ops and no message.
        if cs.file_ops.is_empty() && cs.message.is_empty() && !self.options.dump_all {
            log::debug!("skipping empty changeset {}", cs.revision);
            Progress::bump(&self.progress.skipped);
            self.process_tag_changes(&project_name, &cs, writer)?;
            return Ok(());
        }

        // Step 5 & 7: hand the file operations and identities to the
        // writer, which owns tree construction, and record the mapping.
        let commit_id = writer.write_commit(
            &parents,
            &identity,
            &identity,
            cs.timestamp,
            &message,
            &cs.file_ops,
        )?;
        self.commit_map.insert(cs.revision.clone(), commit_id.clone());
        Progress::bump(&self.progress.emitted);

        // Step 8: update the branch head and its revision ref.
        writer.update_ref(&branch_refname, &commit_id)?;
        let revision_refname =
            self.allocator
                .allocate_revision_ref(project, &branch_refname, &allocation, &cs.revision)?;
        writer.update_ref(&revision_refname, &commit_id)?;
        self.branch_heads.insert(
            (project_name.clone(), cs.branch.clone()),
            BranchHead {
                refname: branch_refname,
                last_hg_rev: cs.revision.clone(),
                last_git_commit: commit_id,
            },
        );

        // Step 9: process this changeset's .hgtags diff.
        self.process_tag_changes(&project_name, &cs, writer)?;
        Ok(())
    }

    fn process_tag_changes(
        &mut self,
        project_name: &str,
        cs: &Changeset,
        writer: &mut dyn GitWriter,
    ) -> Result<()> {
        if cs.tag_changes.is_empty() {
            return Ok(());
        }
        let project = self
            .config
            .projects
            .iter()
            .find(|p| p.name == project_name)
            .expect("project_name came from this config");

        for change in &cs.tag_changes {
            match change {
                TagChange::Set { tag, revision } => {
                    let allocation = self.allocator.allocate(project, tag, Kind::Tag)?;
                    let refname = match &allocation.refname {
                        Some(r) => r.clone(),
                        None => continue,
                    };
                    if let Some(commit_id) = self.commit_map.get(revision) {
                        writer.update_ref(&refname, commit_id)?;
                    } else {
                        log::warn!(
                            "tag {:?} points at unmapped revision {:?}, skipping ref update",
                            tag,
                            revision
                        );
                    }
                }
                TagChange::Remove { tag } => {
                    let allocation = self.allocator.allocate(project, tag, Kind::Tag)?;
                    if let Some(refname) = &allocation.refname {
                        writer.delete_ref(refname)?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Overrides;
    use crate::source::FileOp;
    use crate::source::ReplaySource;
    use crate::source::Timestamp;
    use crate::target::InMemoryWriter;

    fn changeset(revision: &str, parents: &[&str], branch: &str, message: &str) -> Changeset {
        Changeset {
            revision: revision.to_string(),
            parents: parents.iter().map(|s| s.to_string()).collect(),
            branch: branch.to_string(),
            author: "Alice Example <alice@example.org>".to_string(),
            timestamp: Timestamp {
                seconds: 0,
                tz_offset: 0,
            },
            message: message.to_string(),
            file_ops: vec![FileOp::Add {
                path: "README".to_string(),
                mode: 0o100644,
            }],
            tag_changes: Vec::new(),
        }
    }

    fn config(xml: &str) -> Config {
        let doc = crate::config::parse_document(xml).unwrap();
        Config::resolve(&doc, &Overrides::default()).unwrap()
    }

    #[test]
    fn root_commit_has_no_parents_and_updates_branch_ref() {
        let cfg = config(r#"<Projects><Project Name="p"/></Projects>"#);
        let enabled = selector::enabled_projects(&cfg, &selector::ProjectFilters::parse(&[]).unwrap());
        let mut pipeline = Pipeline::new(&cfg, enabled, PipelineOptions::default());
        let mut source = ReplaySource::new(vec![changeset("r0", &[], "main", "initial")]);
        let mut writer = InMemoryWriter::new();
        pipeline.run(&mut source, &mut writer).unwrap();

        assert_eq!(writer.commits.len(), 1);
        assert!(writer.commits[0].parents.is_empty());
        assert_eq!(writer.refs.get("refs/heads/main").unwrap(), "c0");
        assert_eq!(writer.refs.get("refs/revisions/main/r0").unwrap(), "c0");
    }

    #[test]
    fn second_commit_resolves_parent_through_commit_map() {
        let cfg = config(r#"<Projects><Project Name="p"/></Projects>"#);
        let enabled = selector::enabled_projects(&cfg, &selector::ProjectFilters::parse(&[]).unwrap());
        let mut pipeline = Pipeline::new(&cfg, enabled, PipelineOptions::default());
        let mut source = ReplaySource::new(vec![
            changeset("r0", &[], "main", "initial"),
            changeset("r1", &["r0"], "main", "second"),
        ]);
        let mut writer = InMemoryWriter::new();
        pipeline.run(&mut source, &mut writer).unwrap();

        assert_eq!(writer.commits[1].parents, vec!["c0".to_string()]);
    }

    #[test]
    fn end_revision_stops_after_that_commit() {
        let cfg = config(r#"<Projects><Project Name="p"/></Projects>"#);
        let enabled = selector::enabled_projects(&cfg, &selector::ProjectFilters::parse(&[]).unwrap());
        let options = PipelineOptions {
            end_revision: Some("r0".to_string()),
            ..Default::default()
        };
        let mut pipeline = Pipeline::new(&cfg, enabled, options);
        let mut source = ReplaySource::new(vec![
            changeset("r0", &[], "main", "initial"),
            changeset("r1", &["r0"], "main", "second"),
        ]);
        let mut writer = InMemoryWriter::new();
        pipeline.run(&mut source, &mut writer).unwrap();

        assert_eq!(writer.commits.len(), 1);
    }

    #[test]
    fn unowned_branch_is_skipped_without_emitting_a_commit() {
        let cfg = config(r#"<Projects><Project Name="p" Branch="main"/></Projects>"#);
        let enabled = selector::enabled_projects(&cfg, &selector::ProjectFilters::parse(&[]).unwrap());
        let mut pipeline = Pipeline::new(&cfg, enabled, PipelineOptions::default());
        let mut source = ReplaySource::new(vec![changeset("r0", &[], "other", "initial")]);
        let mut writer = InMemoryWriter::new();
        pipeline.run(&mut source, &mut writer).unwrap();

        assert!(writer.commits.is_empty());
        assert_eq!(pipeline.progress().snapshot(), (1, 1, 0));
    }

    #[test]
    fn tag_set_updates_ref_to_mapped_commit() {
        let cfg = config(r#"<Projects><Project Name="p"/></Projects>"#);
        let enabled = selector::enabled_projects(&cfg, &selector::ProjectFilters::parse(&[]).unwrap());
        let mut pipeline = Pipeline::new(&cfg, enabled, PipelineOptions::default());
        let mut cs = changeset("r0", &[], "main", "initial");
        cs.tag_changes.push(TagChange::Set {
            tag: "v1".to_string(),
            revision: "r0".to_string(),
        });
        let mut source = ReplaySource::new(vec![cs]);
        let mut writer = InMemoryWriter::new();
        pipeline.run(&mut source, &mut writer).unwrap();

        assert_eq!(writer.refs.get("refs/tags/v1").unwrap(), "c0");
    }
}
