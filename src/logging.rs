//! Thin wrapper around `env_logger`, wiring verbosity and an optional file
//! sink from the CLI surface.

use crate::cli::VerboseFlags;
use log::LevelFilter;
use std::fs::OpenOptions;
use std::path::Path;

/// Map `--quiet`/`--verbose` onto a log level: quiet silences everything but
/// errors; bare runs log at info; `dump`/`revs`/`all` bump to debug;
/// `dump_all` always wins and logs at trace.
fn level_for(quiet: bool, verbose: VerboseFlags) -> LevelFilter {
    if quiet {
        LevelFilter::Error
    } else if verbose.dump_all {
        LevelFilter::Trace
    } else if verbose.dump || verbose.revs {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Initialize the global logger from `--quiet`/`--verbose` and an optional
/// `--log <file>` path. Opening the log file is best-effort: on failure the
/// logger falls back to stderr and records a `warn`.
pub fn init_logger(quiet: bool, verbose: VerboseFlags, log_path: Option<&Path>) {
    let level = level_for(quiet, verbose);

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);

    let mut fallback_warning = None;
    if let Some(path) = log_path {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => {
                fallback_warning = Some(format!(
                    "could not open log file {:?} ({}), logging to stderr",
                    path, e
                ));
            }
        }
    }

    builder.init();
    if let Some(message) = fallback_warning {
        log::warn!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::VerboseLevel;

    #[test]
    fn quiet_wins_over_any_verbosity() {
        let verbose = VerboseFlags::from_levels(&[VerboseLevel::DumpAll]);
        assert_eq!(level_for(true, verbose), LevelFilter::Error);
    }

    #[test]
    fn bare_run_logs_at_info() {
        assert_eq!(level_for(false, VerboseFlags::default()), LevelFilter::Info);
    }

    #[test]
    fn dump_or_revs_bumps_to_debug() {
        let verbose = VerboseFlags::from_levels(&[VerboseLevel::Dump]);
        assert_eq!(level_for(false, verbose), LevelFilter::Debug);
    }

    #[test]
    fn dump_all_bumps_to_trace() {
        let verbose = VerboseFlags::from_levels(&[VerboseLevel::DumpAll]);
        assert_eq!(level_for(false, verbose), LevelFilter::Trace);
    }
}
