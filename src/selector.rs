//! Project Selector: filters `Project` sections against the
//! CLI `--project` inclusion/exclusion patterns, and routes a changeset's
//! HG branch label to the project that owns it.

use crate::config::Config;
use crate::config::Project;
use crate::glob::Pattern;

/// One `--project` filter entry: a compiled name pattern plus polarity.
struct Filter {
    pattern: Pattern,
    negative: bool,
}

/// Parses the repeatable, comma-separable `--project` CLI option.
pub struct ProjectFilters {
    filters: Vec<Filter>,
}

impl ProjectFilters {
    /// Build from the raw `--project` values as given on the command line
    /// (each element may itself be comma-separated).
    pub fn parse(values: &[String]) -> crate::Result<Self> {
        let mut filters = Vec::new();
        for value in values {
            for entry in value.split(',') {
                let entry = entry.trim();
                if entry.is_empty() {
                    continue;
                }
                let (negative, text) = match entry.strip_prefix('!') {
                    Some(rest) => (true, rest),
                    None => (false, entry),
                };
                filters.push(Filter {
                    pattern: Pattern::compile(text)?,
                    negative,
                });
            }
        }
        Ok(ProjectFilters { filters })
    }

    fn has_positive(&self) -> bool {
        self.filters.iter().any(|f| !f.negative)
    }

    fn matches(&self, name: &str) -> bool {
        let mut positive_hit = !self.has_positive();
        for filter in &self.filters {
            if filter.pattern.matches(name).is_some() {
                if filter.negative {
                    return false;
                }
                positive_hit = true;
            }
        }
        positive_hit
    }
}

/// Compute the set of enabled project names: names that pass the CLI
/// filters (or all `ExplicitOnly="No"` projects when no positive filter is
/// given), plus any project transitively required via `NeedsProjects`, even
/// if it would otherwise be excluded.
pub fn enabled_projects(config: &Config, filters: &ProjectFilters) -> Vec<String> {
    let mut enabled = std::collections::HashSet::new();
    for project in &config.projects {
        let directly_enabled = if filters.has_positive() {
            filters.matches(&project.name)
        } else {
            !project.explicit_only && filters.matches(&project.name)
        };
        if directly_enabled {
            enabled.insert(project.name.clone());
        }
    }

    // Force-enable transitive NeedsProjects dependencies.
    let mut changed = true;
    while changed {
        changed = false;
        let additions: Vec<String> = config
            .projects
            .iter()
            .filter(|p| enabled.contains(&p.name))
            .flat_map(|p| p.needs_projects.iter().cloned())
            .filter(|name| !enabled.contains(name))
            .collect();
        for name in additions {
            enabled.insert(name);
            changed = true;
        }
    }

    config
        .projects
        .iter()
        .map(|p| p.name.clone())
        .filter(|name| enabled.contains(name))
        .collect()
}

/// Find the first enabled project (in configuration order) whose `Branch`
/// filter matches `branch_label`.
pub fn select_project<'a>(
    config: &'a Config,
    enabled: &[String],
    branch_label: &str,
) -> Option<&'a Project> {
    config
        .projects
        .iter()
        .filter(|p| enabled.iter().any(|name| name == &p.name))
        .find(|p| p.branch_filter.eval(branch_label).is_some())
}
