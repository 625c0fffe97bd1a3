//! `page-translate`: translate a HubSpot page in place.
//!
//! Usage:
//!   page-translate [--config FILE] [--page-id ID]... <extract|translate|update|run>
//!
//! Credentials come from the environment (`HUBSPOT_API_KEY`,
//! `GEMINI_API_KEY` or `GPT_API_KEY`); `PAGE_ID` is used when no
//! `--page-id` is given.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use page_translate::cli;
use page_translate::config::{Config, Credentials};
use page_translate::hubspot::HubSpotClient;
use page_translate::retry::ThreadSleeper;
use page_translate::transfer::CancelFlag;
use page_translate::translate::translator_for;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "page-translate", version, about = "Translate HubSpot CMS pages in place")]
struct Args {
    /// Config file (default: ./page-translate.toml if present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Page id; repeat for several pages with `run` (default: $PAGE_ID)
    #[arg(long = "page-id", global = true, value_name = "ID")]
    page_ids: Vec<String>,

    /// Directory for the mapping artifacts
    #[arg(long, global = true, value_name = "DIR")]
    work_dir: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the page and save its translatable text
    Extract,
    /// Translate the saved text, resuming a previous run
    Translate,
    /// Patch the page from the translated text and write it back
    Update {
        /// Delete both mapping files after a successful update
        #[arg(long)]
        delete_artifacts: bool,
    },
    /// Extract, translate and update in one go
    Run,
}

fn init_logging(verbose: u8, quiet: bool) {
    let default_level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn page_ids(args: &Args, creds: &Credentials) -> Vec<String> {
    if !args.page_ids.is_empty() {
        return args.page_ids.clone();
    }
    creds
        .page_id
        .iter()
        .flat_map(|ids| ids.split(','))
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

fn single_page(ids: &[String]) -> Result<&str> {
    match ids {
        [id] => Ok(id.as_str()),
        [] => bail!("no page id: pass --page-id or set PAGE_ID"),
        _ => bail!("this command takes a single page id"),
    }
}

fn execute(args: &Args) -> Result<bool> {
    let env: HashMap<String, String> = std::env::vars().collect();
    let mut config = Config::load(args.config.as_deref()).context("loading config")?;
    config.apply_env(&env).context("applying environment")?;
    if let Some(dir) = &args.work_dir {
        config.paths.work_dir = dir.clone();
    }
    if let Command::Update { delete_artifacts: true } = args.command {
        config.paths.delete_artifacts = true;
    }
    let creds = Credentials::from_env(&env);
    let ids = page_ids(args, &creds);
    let sleeper = ThreadSleeper;

    match &args.command {
        Command::Extract => {
            let store = HubSpotClient::new(&config.hubspot, creds.hubspot_token()?)?;
            let path = cli::extract(&config, &store, &sleeper, single_page(&ids)?)?;
            info!(path = %path.display(), "extract done");
        }
        Command::Translate => {
            let key = creds.translator_key(config.translate.provider)?;
            let translator = translator_for(&config.translate, key)?;
            let report = cli::translate(&config, translator.as_ref(), &sleeper)?;
            info!(
                translated = report.translated,
                copied = report.copied,
                resumed = report.resumed,
                skipped = report.skipped,
                "translate done"
            );
            if !report.failed.is_empty() {
                warn!(failed = report.failed.len(), "rerun to retry the failed entries");
            }
        }
        Command::Update { .. } => {
            let store = HubSpotClient::new(&config.hubspot, creds.hubspot_token()?)?;
            let report = cli::update(&config, &store, &sleeper, single_page(&ids)?)?;
            info!(
                applied = report.patch.applied,
                unresolved = report.patch.unresolved.len(),
                "update done"
            );
        }
        Command::Run => {
            if ids.is_empty() {
                bail!("no page id: pass --page-id or set PAGE_ID");
            }
            let store = HubSpotClient::new(&config.hubspot, creds.hubspot_token()?)?;
            let key = creds.translator_key(config.translate.provider)?;
            let translator = translator_for(&config.translate, key)?;
            let cancel = CancelFlag::new();
            let report = cli::run(&config, &store, translator.as_ref(), &sleeper, ids, &cancel)?;
            for outcome in &report.outcomes {
                match &outcome.result {
                    Ok(run) => info!(
                        document = %outcome.document,
                        translated = run.translate.translated,
                        applied = run.update.patch.applied,
                        unresolved = run.update.patch.unresolved.len(),
                        "page done"
                    ),
                    Err(err) => error!(document = %outcome.document, error = %err, "page failed"),
                }
            }
            return Ok(report.is_success());
        }
    }
    Ok(true)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);
    match execute(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
