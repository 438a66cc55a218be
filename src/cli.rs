//! Command-line surface, built with `clap`'s derive API.

use clap::ArgEnum;
use clap::Parser;
use std::path::PathBuf;

/// Converts a Mercurial repository history into an equivalent Git repository.
#[derive(Parser, Debug)]
#[clap(name = "hg2git", version, about)]
pub struct Cli {
    /// Path to the source Mercurial repository.
    pub repo_path: PathBuf,

    /// Path to the XML configuration file.
    #[clap(short = 'c', long = "config", value_name = "file")]
    pub config: Option<PathBuf>,

    /// Write logs to this file in addition to stderr.
    #[clap(long = "log", value_name = "file")]
    pub log: Option<PathBuf>,

    /// Stop cleanly after emitting this HG revision.
    #[clap(long = "end-revision", value_name = "N")]
    pub end_revision: Option<String>,

    /// Suppress all output except errors.
    #[clap(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Periodically report progress, optionally every N seconds (default 5).
    #[clap(long = "progress", min_values = 0, max_values = 1, value_name = "seconds")]
    pub progress: Option<Option<u64>>,

    /// Namespace used for the `$Branches` hardcoded variable.
    #[clap(long = "branches", value_name = "ns")]
    pub branches: Option<String>,

    /// Namespace used for the `$Tags` hardcoded variable.
    #[clap(long = "tags", value_name = "ns")]
    pub tags: Option<String>,

    /// Ignore the `<Default>` section entirely.
    #[clap(long = "no-default-config")]
    pub no_default_config: bool,

    /// Increase log verbosity; repeatable and accumulates.
    #[clap(long = "verbose", arg_enum)]
    pub verbose: Vec<VerboseLevel>,

    /// Restrict which `<Project>` sections are enabled; repeatable,
    /// comma-separable, and `!`-prefixable to exclude.
    #[clap(long = "project", value_name = "filter")]
    pub project: Vec<String>,

    /// Path to the target Git repository.
    #[clap(long = "target-repository", value_name = "path")]
    pub target_repository: Option<PathBuf>,

    /// Append an `HG-revision:` tagline to every synthesized commit message.
    #[clap(long = "decorate-commit-message", arg_enum, value_name = "revision-id")]
    pub decorate_commit_message: Option<DecorateMode>,

    /// Resolve the configuration and project selection, then exit without
    /// touching the HG or Git collaborators.
    #[clap(long = "check-config", hide = true)]
    pub check_config: bool,
}

/// One `--verbose` level. Repeated flags accumulate (see [`VerboseFlags`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, ArgEnum)]
pub enum VerboseLevel {
    /// Log the resolved configuration tree.
    #[clap(name = "dump")]
    Dump,
    /// Log each HG revision as it is processed.
    #[clap(name = "revs")]
    Revs,
    /// Shorthand for `dump,revs`.
    #[clap(name = "all")]
    All,
    /// Force emission of empty changesets and log every project/branch skip.
    #[clap(name = "dump_all")]
    DumpAll,
}

/// The single accepted value of `--decorate-commit-message`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ArgEnum)]
pub enum DecorateMode {
    /// Append `HG-revision: <rev>` to every synthesized commit message.
    #[clap(name = "revision-id")]
    RevisionId,
}

/// The resolved verbosity flags after accumulating every `--verbose` entry.
/// `all` is treated as equivalent to `dump,revs`; `dump_all` is an
/// orthogonal extension that additionally forces emission of otherwise
/// suppressed empty changes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VerboseFlags {
    /// `--verbose=dump` or `--verbose=all` was given.
    pub dump: bool,
    /// `--verbose=revs` or `--verbose=all` was given.
    pub revs: bool,
    /// `--verbose=dump_all` was given.
    pub dump_all: bool,
}

impl VerboseFlags {
    /// Accumulate a set of repeated `--verbose` occurrences into flags.
    pub fn from_levels(levels: &[VerboseLevel]) -> Self {
        let mut flags = VerboseFlags::default();
        for level in levels {
            match level {
                VerboseLevel::Dump => flags.dump = true,
                VerboseLevel::Revs => flags.revs = true,
                VerboseLevel::All => {
                    flags.dump = true;
                    flags.revs = true;
                }
                VerboseLevel::DumpAll => flags.dump_all = true,
            }
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_implies_dump_and_revs() {
        let flags = VerboseFlags::from_levels(&[VerboseLevel::All]);
        assert!(flags.dump);
        assert!(flags.revs);
        assert!(!flags.dump_all);
    }

    #[test]
    fn dump_all_is_orthogonal_to_dump_and_revs() {
        let flags = VerboseFlags::from_levels(&[VerboseLevel::DumpAll]);
        assert!(!flags.dump);
        assert!(!flags.revs);
        assert!(flags.dump_all);
    }

    #[test]
    fn parses_minimal_invocation() {
        let cli = Cli::parse_from(["hg2git", "/repo"]);
        assert_eq!(cli.repo_path, PathBuf::from("/repo"));
        assert!(!cli.quiet);
        assert!(cli.verbose.is_empty());
    }

    #[test]
    fn progress_accepts_bare_flag_or_explicit_seconds() {
        let cli = Cli::parse_from(["hg2git", "/repo", "--progress"]);
        assert_eq!(cli.progress, Some(None));
        let cli = Cli::parse_from(["hg2git", "/repo", "--progress", "10"]);
        assert_eq!(cli.progress, Some(Some(10)));
    }
}
