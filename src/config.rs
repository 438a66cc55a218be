//! Config Model: resolves the hardcoded -> `Default` -> `Project` layering
//! into per-project rule sets, and parses the on-disk XML schema into the
//! raw tree this module resolves.

use crate::glob::Pattern;
use crate::glob::PatternSequence;
use crate::sanitize::ReplaceRule;
use crate::sanitize::Sanitizer;
use crate::vars::Environment;
use crate::Error;
use crate::Result;

/// A `MapBranch`/`MapTag` rule before compilation.
#[derive(Clone, Debug)]
pub struct RawMapRule {
    /// The source `Branch`/`Tag` pattern, uncompiled.
    pub source: String,
    /// The `Refname` substitution template, absent means explicitly unmapped.
    pub refname: Option<String>,
    /// The `RevisionRef` substitution template (`MapBranch` only).
    pub revision_ref: Option<String>,
}

/// A `Project` (or `Default`) section before resolution.
#[derive(Clone, Debug, Default)]
pub struct RawProject {
    /// `Name` attribute; `*` is a valid project name.
    pub name: String,
    /// `Branch` attribute; defaults to `**` when absent.
    pub branch: Option<String>,
    /// Whether Default's Vars/Replace rules are prepended to this project's.
    pub inherit_default: bool,
    /// Whether Default's and the hardcoded MapBranch/MapTag tiers apply.
    pub inherit_default_mappings: bool,
    /// Whether this project is only enabled via an explicit `--project` match.
    pub explicit_only: bool,
    /// Other project names this one transitively force-enables.
    pub needs_projects: Vec<String>,
    /// `<Vars>` child element names and their raw text values, in document order.
    pub vars: Vec<(String, String)>,
    /// `<Replace>` rules, in document order.
    pub replace: Vec<ReplaceRule>,
    /// `<MapBranch>` rules, in document order.
    pub map_branch: Vec<RawMapRule>,
    /// `<MapTag>` rules, in document order.
    pub map_tag: Vec<RawMapRule>,
}

impl RawProject {
    fn with_defaults(name: &str) -> Self {
        RawProject {
            name: name.to_string(),
            inherit_default: true,
            inherit_default_mappings: true,
            explicit_only: false,
            ..Default::default()
        }
    }
}

/// The parsed-but-unresolved configuration document.
#[derive(Clone, Debug, Default)]
pub struct Document {
    /// The `<Default>` section, if present.
    pub default: Option<RawProject>,
    /// Every `<Project>` section, in document order.
    pub projects: Vec<RawProject>,
}

/// CLI-provided overrides that feed configuration resolution.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    /// `--branches <ns>`, overriding the hardcoded `$Branches` seed.
    pub branches_ns: Option<String>,
    /// `--tags <ns>`, overriding the hardcoded `$Tags` seed.
    pub tags_ns: Option<String>,
    /// `--no-default-config`: ignore the `<Default>` section entirely.
    pub no_default_config: bool,
}

/// A compiled `MapBranch`/`MapTag` rule.
#[derive(Clone, Debug)]
pub struct MapRule {
    /// The compiled source pattern.
    pub pattern: Pattern,
    /// The `Refname` substitution template, absent means explicitly unmapped.
    pub refname_template: Option<String>,
    /// The `RevisionRef` substitution template, if any.
    pub revision_ref_template: Option<String>,
}

/// A fully resolved project: five ordered lists plus its branch filter and
/// flags, immutable for the remainder of the run.
#[derive(Clone, Debug)]
pub struct Project {
    /// Unique project name.
    pub name: String,
    /// Pattern sequence used to claim HG branch labels during selection.
    pub branch_filter: PatternSequence,
    /// Whether this project requires an explicit `--project` match to enable.
    pub explicit_only: bool,
    /// Other project names this one transitively force-enables.
    pub needs_projects: Vec<String>,
    /// Fully merged, cycle-checked variable environment.
    pub vars: Environment,
    /// Compiled MapBranch rules, project-own first, Default's, then hardcoded.
    pub map_branch: Vec<MapRule>,
    /// Compiled MapTag rules, in the same merge order as `map_branch`.
    pub map_tag: Vec<MapRule>,
    /// Refname sanitizer built from this project's merged Replace rules.
    pub sanitizer: Sanitizer,
}

/// The fully resolved configuration: one [`Project`] per `<Project>`
/// element, in document order.
#[derive(Clone, Debug)]
pub struct Config {
    /// One resolved [`Project`] per `<Project>` element, in document order.
    pub projects: Vec<Project>,
}

impl Config {
    /// Resolve a parsed [`Document`] against CLI [`Overrides`].
    pub fn resolve(doc: &Document, overrides: &Overrides) -> Result<Config> {
        let mut names = std::collections::HashSet::new();
        for p in &doc.projects {
            if !names.insert(p.name.clone()) {
                return Err(Error::Config(format!("duplicate project name: {}", p.name)));
            }
        }
        for p in &doc.projects {
            for needed in &p.needs_projects {
                if !names.contains(needed) {
                    return Err(Error::Config(format!(
                        "project {:?} needs undefined project {:?}",
                        p.name, needed
                    )));
                }
            }
        }

        let default = if overrides.no_default_config {
            None
        } else {
            doc.default.as_ref()
        };

        let branches_ns = overrides
            .branches_ns
            .clone()
            .unwrap_or_else(|| "refs/heads/".to_string());
        let tags_ns = overrides
            .tags_ns
            .clone()
            .unwrap_or_else(|| "refs/tags/".to_string());

        let mut projects = Vec::with_capacity(doc.projects.len());
        for raw in &doc.projects {
            projects.push(resolve_project(raw, default, &branches_ns, &tags_ns)?);
        }
        Ok(Config { projects })
    }
}

fn resolve_project(
    raw: &RawProject,
    default: Option<&RawProject>,
    branches_ns: &str,
    tags_ns: &str,
) -> Result<Project> {
    let mut env = Environment::default();
    // Step 1: hardcoded seeds, always present regardless of InheritDefault.
    env.define("Branches", branches_ns);
    env.define("Tags", tags_ns);

    // Step 2: Vars/Replace — Default's prepend the project's own, i.e. the
    // project's own definitions are applied last and win on name collision.
    let mut replace = Vec::new();
    if raw.inherit_default {
        if let Some(default) = default {
            for (k, v) in &default.vars {
                env.define(k.clone(), v.clone());
            }
            replace.extend(default.replace.iter().cloned());
        }
    }
    for (k, v) in &raw.vars {
        env.define(k.clone(), v.clone());
    }
    replace.extend(raw.replace.iter().cloned());

    // Step 4: eager cycle check.
    env.check_cycles()?;

    // Step 3: MapBranch/MapTag merge — project's own rules first, Default's
    // follow, hardcoded defaults come last. InheritDefaultMappings="No"
    // suppresses both the Default and hardcoded tiers.
    let mut map_branch_raw: Vec<RawMapRule> = raw.map_branch.clone();
    let mut map_tag_raw: Vec<RawMapRule> = raw.map_tag.clone();
    if raw.inherit_default_mappings {
        if let Some(default) = default {
            map_branch_raw.extend(default.map_branch.iter().cloned());
            map_tag_raw.extend(default.map_tag.iter().cloned());
        }
        map_branch_raw.push(RawMapRule {
            source: "**".to_string(),
            refname: Some("$Branches$1".to_string()),
            revision_ref: None,
        });
        map_tag_raw.push(RawMapRule {
            source: "**".to_string(),
            refname: Some("$Tags$1".to_string()),
            revision_ref: None,
        });
    }

    let map_branch = compile_map_rules(&map_branch_raw)?;
    let map_tag = compile_map_rules(&map_tag_raw)?;

    // Step 5: compile the project's Branch filter used for project selection.
    let branch_source = raw.branch.clone().unwrap_or_else(|| "**".to_string());
    let branch_filter = PatternSequence::compile(&branch_source)?;

    let sanitizer = Sanitizer::new(replace.clone());

    Ok(Project {
        name: raw.name.clone(),
        branch_filter,
        explicit_only: raw.explicit_only,
        needs_projects: raw.needs_projects.clone(),
        vars: env,
        map_branch,
        map_tag,
        sanitizer,
    })
}

fn compile_map_rules(raw: &[RawMapRule]) -> Result<Vec<MapRule>> {
    raw.iter()
        .map(|r| {
            Ok(MapRule {
                pattern: Pattern::compile(&r.source)?,
                refname_template: r.refname.clone(),
                revision_ref_template: r.revision_ref.clone(),
            })
        })
        .collect()
}

/// Parse the on-disk XML configuration schema into a [`Document`].
/// Unknown elements and attribute values are configuration errors — this
/// prevents silent misbehavior when the schema drifts.
pub fn parse_document(xml: &str) -> Result<Document> {
    let tree = roxmltree::Document::parse(xml)?;
    let root = tree.root_element();
    if root.tag_name().name() != "Projects" {
        return Err(Error::Config(format!(
            "expected root element <Projects>, found <{}>",
            root.tag_name().name()
        )));
    }

    let mut doc = Document::default();
    for child in root.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "Default" => {
                doc.default = Some(parse_project_element(child, "Default")?);
            }
            "Project" => {
                doc.projects.push(parse_project_element(child, "Project")?);
            }
            other => {
                return Err(Error::Config(format!(
                    "unknown top-level element <{}>",
                    other
                )));
            }
        }
    }
    Ok(doc)
}

fn parse_project_element(node: roxmltree::Node<'_, '_>, tag: &str) -> Result<RawProject> {
    let name = node.attribute("Name").unwrap_or("*").to_string();
    let mut project = RawProject::with_defaults(&name);
    project.branch = node.attribute("Branch").map(|s| s.to_string());

    if let Some(v) = node.attribute("InheritDefault") {
        project.inherit_default = parse_yes_no(tag, "InheritDefault", v)?;
    }
    if let Some(v) = node.attribute("InheritDefaultMappings") {
        project.inherit_default_mappings = parse_yes_no(tag, "InheritDefaultMappings", v)?;
    }
    if let Some(v) = node.attribute("ExplicitOnly") {
        project.explicit_only = parse_yes_no(tag, "ExplicitOnly", v)?;
    }
    if let Some(v) = node.attribute("NeedsProjects") {
        project.needs_projects = v
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    for attr in node.attributes() {
        match attr.name() {
            "Name" | "Branch" | "InheritDefault" | "InheritDefaultMappings" | "ExplicitOnly"
            | "NeedsProjects" => {}
            other => {
                return Err(Error::Config(format!(
                    "unknown attribute {:?} on <{}>",
                    other, tag
                )));
            }
        }
    }

    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "Vars" => {
                for var in child.children().filter(|n| n.is_element()) {
                    let value = var.text().unwrap_or("").trim().to_string();
                    project.vars.push((var.tag_name().name().to_string(), value));
                }
            }
            "Replace" => {
                let chars = child.attribute("Chars").ok_or_else(|| {
                    Error::Config("<Replace> missing required 'Chars' attribute".to_string())
                })?;
                let with = child.attribute("With").ok_or_else(|| {
                    Error::Config("<Replace> missing required 'With' attribute".to_string())
                })?;
                project.replace.push(ReplaceRule {
                    chars: chars.to_string(),
                    with: with.to_string(),
                });
            }
            "MapBranch" => {
                project.map_branch.push(parse_map_rule(child, "MapBranch", "Branch")?);
            }
            "MapTag" => {
                project.map_tag.push(parse_map_rule(child, "MapTag", "Tag")?);
            }
            other => {
                return Err(Error::Config(format!(
                    "unknown child element <{}> inside <{}>",
                    other, tag
                )));
            }
        }
    }

    Ok(project)
}

fn parse_map_rule(node: roxmltree::Node<'_, '_>, tag: &str, source_attr: &str) -> Result<RawMapRule> {
    let source = node.attribute(source_attr).ok_or_else(|| {
        Error::Config(format!(
            "<{}> missing required '{}' attribute",
            tag, source_attr
        ))
    })?;
    let refname = node.attribute("Refname").map(|s| s.to_string());
    let revision_ref = if tag == "MapBranch" {
        node.attribute("RevisionRef").map(|s| s.to_string())
    } else {
        None
    };
    Ok(RawMapRule {
        source: source.to_string(),
        refname,
        revision_ref,
    })
}

fn parse_yes_no(tag: &str, attr: &str, value: &str) -> Result<bool> {
    match value {
        "Yes" => Ok(true),
        "No" => Ok(false),
        other => Err(Error::Config(format!(
            "invalid value {:?} for {}@{} (expected Yes/No)",
            other, tag, attr
        ))),
    }
}
