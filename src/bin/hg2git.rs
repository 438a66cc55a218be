use clap::Parser;
use hg2git::cli::Cli;
use hg2git::cli::VerboseFlags;
use hg2git::config;
use hg2git::logging;
use hg2git::selector;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = VerboseFlags::from_levels(&cli.verbose);
    logging::init_logger(cli.quiet, verbose, cli.log.as_deref());

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> hg2git::Result<()> {
    let doc = match &cli.config {
        Some(path) => {
            let xml = std::fs::read_to_string(path)?;
            config::parse_document(&xml)?
        }
        None => config::Document::default(),
    };

    let overrides = config::Overrides {
        branches_ns: cli.branches.clone(),
        tags_ns: cli.tags.clone(),
        no_default_config: cli.no_default_config,
    };
    let cfg = config::Config::resolve(&doc, &overrides)?;

    let filters = selector::ProjectFilters::parse(&cli.project)?;
    let enabled = selector::enabled_projects(&cfg, &filters);

    log::info!(
        "resolved {} project(s), {} enabled",
        cfg.projects.len(),
        enabled.len()
    );
    for name in &enabled {
        log::debug!("project {:?} enabled", name);
    }

    if cli.check_config {
        return Ok(());
    }

    // A real conversion needs a concrete HgSource reading `cli.repo_path`
    // and a GitWriter targeting `cli.target_repository`; this build only
    // ships the pipeline's traits and in-memory test doubles, so the
    // embedding application must link real ones against
    // `hg2git::pipeline::Pipeline::run`.
    Err(hg2git::Error::Source(format!(
        "no Mercurial reader or Git writer is wired into this build; {:?} was not converted",
        cli.repo_path
    )))
}
