//! Ref Allocator: maps `(project, branch-or-tag name)` to a
//! unique Git refname, resolving collisions with a `__<N>` suffix, and
//! derives per-commit revision refs.

use crate::config::MapRule;
use crate::config::Project;
use crate::Error;
use crate::Result;
use std::collections::HashMap;

/// Whether a name is being resolved as a branch or a tag; they consult
/// different map-rule lists on the [`Project`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Resolved against `Project::map_branch`.
    Branch,
    /// Resolved against `Project::map_tag`.
    Tag,
}

/// The outcome of allocating (or looking up) a ref for a source name.
#[derive(Clone, Debug)]
pub struct Allocation {
    /// `None` when the matching rule has no `Refname` template: the name is
    /// explicitly unmapped and the caller should suppress commit emission.
    pub refname: Option<String>,
    /// The matched rule's `RevisionRef` template, if any (branches only).
    pub revision_ref_template: Option<String>,
    /// Captures bound by the matching rule's pattern, for reuse when
    /// deriving the revision ref.
    pub captures: Vec<String>,
}

/// Tracks claimed refnames and the stable allocation decision for each
/// `(project, source name, kind)` seen so far.
#[derive(Default)]
pub struct RefAllocator {
    registry: HashMap<String, (String, String, Kind)>,
    allocated: HashMap<(String, String, Kind), Allocation>,
}

impl RefAllocator {
    /// Create an empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate (or retrieve the previously allocated) ref for `source_name`
    /// under `project`. Stable for the remainder of the run once claimed.
    pub fn allocate(
        &mut self,
        project: &Project,
        source_name: &str,
        kind: Kind,
    ) -> Result<Allocation> {
        let key = (project.name.clone(), source_name.to_string(), kind);
        if let Some(existing) = self.allocated.get(&key) {
            return Ok(existing.clone());
        }

        let rules: &[MapRule] = match kind {
            Kind::Branch => &project.map_branch,
            Kind::Tag => &project.map_tag,
        };

        let matched = rules
            .iter()
            .find_map(|rule| rule.pattern.matches(source_name).map(|caps| (rule, caps)));

        let allocation = match matched {
            None => Allocation {
                refname: None,
                revision_ref_template: None,
                captures: Vec::new(),
            },
            Some((rule, captures)) => match &rule.refname_template {
                None => Allocation {
                    refname: None,
                    revision_ref_template: None,
                    captures,
                },
                Some(template) => {
                    let substituted = project
                        .vars
                        .substitute_in_refname_context(template, &captures)?;
                    let claimed = self.claim(project, &substituted, source_name, kind)?;
                    Allocation {
                        refname: Some(claimed),
                        revision_ref_template: rule.revision_ref_template.clone(),
                        captures,
                    }
                }
            },
        };

        self.allocated.insert(key, allocation.clone());
        Ok(allocation)
    }

    /// Claim `proposed` in the registry, applying the project's sanitizer
    /// and resolving collisions with a `__N` suffix.
    fn claim(
        &mut self,
        project: &Project,
        proposed: &str,
        source_name: &str,
        kind: Kind,
    ) -> Result<String> {
        let sanitized = project.sanitizer.apply(proposed).map_err(|e| match e {
            Error::Config(msg) => Error::Target(msg),
            other => other,
        })?;
        let project_name = &project.name;
        let mut candidate = sanitized.clone();
        let mut suffix = 0u32;
        loop {
            match self.registry.get(&candidate) {
                None => break,
                Some((p, n, k)) if p == project_name && n == source_name && *k == kind => break,
                Some(_) => {
                    suffix += 1;
                    candidate = format!("{}__{}", sanitized, suffix);
                }
            }
        }
        self.registry.insert(
            candidate.clone(),
            (project_name.clone(), source_name.to_string(), kind),
        );
        Ok(candidate)
    }

    /// Derive the revision ref for a single commit, given the branch
    /// allocation's captures and the matched rule's template (or the
    /// default form `refs/revisions/<branch>/r<rev>`).
    pub fn allocate_revision_ref(
        &mut self,
        project: &Project,
        branch_refname: &str,
        allocation: &Allocation,
        hg_rev: &str,
    ) -> Result<String> {
        let rev_str = hg_rev.to_string();
        let extra = [("rev", rev_str.as_str())];
        let template = match &allocation.revision_ref_template {
            Some(t) => t.clone(),
            None => {
                let stripped = branch_refname
                    .strip_prefix("refs/heads/")
                    .unwrap_or(branch_refname);
                format!("refs/revisions/{}/r$rev", stripped)
            }
        };
        let substituted = project.vars.substitute_in_refname_context_with_extra(
            &template,
            &allocation.captures,
            &extra,
        )?;
        project.sanitizer.apply(&substituted).map_err(|e| match e {
            Error::Config(msg) => Error::Target(msg),
            other => other,
        })
    }
}
