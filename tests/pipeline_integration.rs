use hg2git::commit::parse_author;
use hg2git::config;
use hg2git::pipeline::Pipeline;
use hg2git::pipeline::PipelineOptions;
use hg2git::selector;
use hg2git::source::Changeset;
use hg2git::source::FileOp;
use hg2git::source::ReplaySource;
use hg2git::source::TagChange;
use hg2git::source::Timestamp;
use hg2git::target::InMemoryWriter;
use std::io::Write;

fn ts() -> Timestamp {
    Timestamp {
        seconds: 1_700_000_000,
        tz_offset: -18000,
    }
}

fn changeset(revision: &str, parents: &[&str], branch: &str, message: &str) -> Changeset {
    Changeset {
        revision: revision.to_string(),
        parents: parents.iter().map(|s| s.to_string()).collect(),
        branch: branch.to_string(),
        author: "Alice Example <alice@example.org>".to_string(),
        timestamp: ts(),
        message: message.to_string(),
        file_ops: vec![FileOp::Add {
            path: "README".to_string(),
            mode: 0o100644,
        }],
        tag_changes: Vec::new(),
    }
}

/// Loads a configuration file from disk exactly like the binary's
/// `--config <file>` flag does, then converts a small two-branch history
/// through it end to end.
#[test]
fn config_loaded_from_disk_drives_a_full_conversion() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"<Projects>
            <Default>
                <Replace Chars=" " With="-"/>
            </Default>
            <Project Name="main">
                <MapBranch Branch="default" Refname="refs/heads/main"/>
                <MapBranch Branch="release/*" Refname="refs/heads/rel-$1"/>
            </Project>
        </Projects>"#
    )
    .unwrap();

    let xml = std::fs::read_to_string(file.path()).unwrap();
    let doc = config::parse_document(&xml).unwrap();
    let cfg = config::Config::resolve(&doc, &config::Overrides::default()).unwrap();
    let filters = selector::ProjectFilters::parse(&[]).unwrap();
    let enabled = selector::enabled_projects(&cfg, &filters);
    assert_eq!(enabled, vec!["main".to_string()]);

    let mut pipeline = Pipeline::new(&cfg, enabled, PipelineOptions::default());
    let mut source = ReplaySource::new(vec![
        changeset("r0", &[], "default", "initial import"),
        changeset("r1", &["r0"], "default", "second commit"),
        changeset("r2", &["r1"], "release/2.0", "branch point"),
    ]);
    let mut writer = InMemoryWriter::new();
    pipeline.run(&mut source, &mut writer).unwrap();

    assert_eq!(writer.commits.len(), 3);
    assert_eq!(writer.refs.get("refs/heads/main").unwrap(), "c1");
    assert_eq!(writer.refs.get("refs/heads/rel-2.0").unwrap(), "c2");
    assert_eq!(writer.commits[2].parents, vec!["c1".to_string()]);
    assert_eq!(pipeline.progress().snapshot(), (3, 0, 3));
}

/// A revision on a branch with no matching `MapBranch` rule is skipped, but
/// a later revision on a known branch still resolves its parent correctly
/// by simply omitting the skipped ancestor.
#[test]
fn unmapped_intermediate_revision_is_omitted_from_parent_chain() {
    let doc = config::parse_document(
        r#"<Projects>
            <Project Name="main" InheritDefaultMappings="No">
                <MapBranch Branch="default" Refname="refs/heads/main"/>
            </Project>
        </Projects>"#,
    )
    .unwrap();
    let cfg = config::Config::resolve(&doc, &config::Overrides::default()).unwrap();
    let enabled = selector::enabled_projects(&cfg, &selector::ProjectFilters::parse(&[]).unwrap());
    let mut pipeline = Pipeline::new(&cfg, enabled, PipelineOptions::default());

    let mut source = ReplaySource::new(vec![
        changeset("r0", &[], "default", "initial"),
        changeset("r1", &["r0"], "scratch/throwaway", "untracked branch work"),
        changeset("r2", &["r1"], "default", "merge back"),
    ]);
    let mut writer = InMemoryWriter::new();
    pipeline.run(&mut source, &mut writer).unwrap();

    assert_eq!(writer.commits.len(), 2);
    assert!(writer.commits[1].parents.is_empty());
    assert_eq!(pipeline.progress().snapshot(), (3, 1, 2));
}

/// `.hgtags` deletions remove the ref even when the tag was set on a
/// revision from an earlier, already-converted changeset.
#[test]
fn tag_removed_after_being_set_deletes_the_ref() {
    let doc = config::parse_document(r#"<Projects><Project Name="main"/></Projects>"#).unwrap();
    let cfg = config::Config::resolve(&doc, &config::Overrides::default()).unwrap();
    let enabled = selector::enabled_projects(&cfg, &selector::ProjectFilters::parse(&[]).unwrap());
    let mut pipeline = Pipeline::new(&cfg, enabled, PipelineOptions::default());

    let mut first = changeset("r0", &[], "default", "initial");
    first.tag_changes.push(TagChange::Set {
        tag: "v1.0".to_string(),
        revision: "r0".to_string(),
    });
    let mut second = changeset("r1", &["r0"], "default", "oops, retag");
    second.tag_changes.push(TagChange::Remove {
        tag: "v1.0".to_string(),
    });

    let mut source = ReplaySource::new(vec![first, second]);
    let mut writer = InMemoryWriter::new();
    pipeline.run(&mut source, &mut writer).unwrap();

    assert!(!writer.refs.contains_key("refs/tags/v1.0"));
    assert_eq!(writer.deleted_refs, vec!["refs/tags/v1.0".to_string()]);
}

/// Author identities parsed from raw HG usernames carry straight through to
/// the Git writer unchanged.
#[test]
fn author_identity_reaches_the_writer_intact() {
    let doc = config::parse_document(r#"<Projects><Project Name="main"/></Projects>"#).unwrap();
    let cfg = config::Config::resolve(&doc, &config::Overrides::default()).unwrap();
    let enabled = selector::enabled_projects(&cfg, &selector::ProjectFilters::parse(&[]).unwrap());
    let mut pipeline = Pipeline::new(&cfg, enabled, PipelineOptions::default());

    let mut cs = changeset("r0", &[], "default", "initial");
    cs.author = "bob".to_string();
    let mut source = ReplaySource::new(vec![cs]);
    let mut writer = InMemoryWriter::new();
    pipeline.run(&mut source, &mut writer).unwrap();

    let expected = parse_author("bob");
    assert_eq!(writer.commits[0].author, expected);
    assert_eq!(writer.commits[0].committer, expected);
}
