use std::{env, io, process, sync::Arc};

use clap::Parser;
use filesearch_core::{
    database::Database, fetcher::HttpFetcher, refresh, zypper, Error, Result,
};
use tracing::{debug, error};

mod cli;
mod config;
mod display;
mod list;
mod logging;
mod search;

/// The command is chosen by the name the binary was invoked as, so that a
/// single executable can be linked in as both zypper subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    FileSearch,
    FileList,
}

fn command_from_name(argv0: &str) -> Command {
    if argv0.ends_with("zypper-file-list") {
        Command::FileList
    } else {
        Command::FileSearch
    }
}

async fn run(command: Command, args: cli::Args, settings: config::Settings) -> Result<()> {
    debug!("initial setup complete");

    // Make sure we can get the arch before touching anything else.
    let arch = zypper::arch()?;

    debug!("opening database");
    let db = Database::open()?;
    debug!("database opened");

    let release_ver = (!settings.release_ver.is_empty()).then_some(settings.release_ver.as_str());
    let mut repos = zypper::list_repositories(release_ver)?;
    if settings.enabled {
        repos.retain(|repo| repo.enabled);
    }

    let fetcher = Arc::new(HttpFetcher::new());
    refresh::refresh(&db, &fetcher, &repos).await?;

    let results = match command {
        Command::FileSearch => search::run(&db, &repos, &args.terms, &arch)?,
        Command::FileList => list::run(&db, &repos, &args.terms, &arch)?,
    };
    if results.is_empty() {
        return Err(Error::NoResults);
    }

    display::render(&mut io::stdout().lock(), &results, settings.format)
}

#[tokio::main]
async fn main() {
    let command = command_from_name(&env::args().next().unwrap_or_default());
    let args = cli::Args::parse();
    let settings = match config::Settings::load(&args) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("failed to read configuration: {err}");
            process::exit(1);
        }
    };
    logging::setup_logging(settings.verbose);

    if let Err(err) = run(command, args, settings).await {
        error!("{err}");
        process::exit(1);
    }
}
