//! Command logic behind the `page-translate` binary.
//!
//! Each phase reads and writes the artifacts named by [`Config`]:
//! - `extract`   fetch a page and save its eligible leaves
//! - `translate` fill the transformed mapping, resuming where it stopped
//! - `update`    patch the page from the transformed mapping and write it back
//! - `run`       all three in memory, for one or more pages

use std::fs;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::backup::backup_file;
use crate::config::Config;
use crate::error::Result;
use crate::mapping::FlatMapping;
use crate::retry::Sleeper;
use crate::store::{PageSink, PageSource};
use crate::transfer::{BatchReport, CancelFlag, Transfer, UpdateReport};
use crate::translate::{TranslateReport, TranslationSession, Translator};

fn session<'a>(
    config: &Config,
    translator: &'a dyn Translator,
    sleeper: &'a dyn Sleeper,
) -> Result<TranslationSession<'a>> {
    Ok(TranslationSession::new(
        translator,
        sleeper,
        config.mapper()?,
        config.translate_settings()?,
    )
    .with_policy(config.policy()?))
}

/// Fetch `document` and write the source mapping. Returns the artifact path.
pub fn extract<S: PageSource + PageSink>(
    config: &Config,
    store: &S,
    sleeper: &dyn Sleeper,
    document: &str,
) -> Result<PathBuf> {
    let transfer = Transfer::new(store, sleeper, config.transfer_settings()?);
    let extracted = transfer.extract(document)?;
    let path = config.source_artifact();
    extracted.mapping.save(&path)?;
    info!(path = %path.display(), entries = extracted.mapping.len(), "saved source mapping");
    Ok(path)
}

/// Translate the source mapping into the transformed mapping.
///
/// An existing transformed mapping is resumed, after a timestamped backup.
/// Nothing is written when every entry is already present.
pub fn translate(
    config: &Config,
    translator: &dyn Translator,
    sleeper: &dyn Sleeper,
) -> Result<TranslateReport> {
    let source = FlatMapping::load(&config.source_artifact())?;
    let target_path = config.translated_artifact();
    let mut target = FlatMapping::load_or_default(&target_path)?;
    let session = session(config, translator, sleeper)?;

    let pending = session.pending(&source, &target);
    if pending == 0 {
        info!(entries = source.len(), "everything is already translated");
        return session.run(&source, &mut target, &mut |_| Ok(()));
    }
    if target_path.exists() {
        let backup = backup_file(&target_path)?;
        info!(path = %backup.display(), resumed = target.len(), "backed up transformed mapping");
    }
    info!(pending, total = source.len(), "translating");
    session.run(&source, &mut target, &mut |mapping| mapping.save(&target_path))
}

/// Patch `document` from the transformed mapping and write it back.
pub fn update<S: PageSource + PageSink>(
    config: &Config,
    store: &S,
    sleeper: &dyn Sleeper,
    document: &str,
) -> Result<UpdateReport> {
    let input = config.update_input();
    let transformed = FlatMapping::load(&input)?;
    info!(path = %input.display(), entries = transformed.len(), "loaded transformed mapping");
    let transfer = Transfer::new(store, sleeper, config.transfer_settings()?);
    let report = transfer.update(document, &transformed)?;
    if config.paths.delete_artifacts {
        remove_artifacts(config);
    }
    Ok(report)
}

fn remove_artifacts(config: &Config) {
    for path in [config.source_artifact(), config.translated_artifact()] {
        if !path.exists() {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => info!(path = %path.display(), "deleted artifact"),
            Err(err) => warn!(path = %path.display(), error = %err, "could not delete artifact"),
        }
    }
}

/// Run the whole pipeline for each document.
pub fn run<S, I, D>(
    config: &Config,
    store: &S,
    translator: &dyn Translator,
    sleeper: &dyn Sleeper,
    documents: I,
    cancel: &CancelFlag,
) -> Result<BatchReport>
where
    S: PageSource + PageSink,
    I: IntoIterator<Item = D>,
    D: Into<String>,
{
    let session = session(config, translator, sleeper)?;
    let transfer = Transfer::new(store, sleeper, config.transfer_settings()?);
    Ok(transfer.run_batch(documents, &session, cancel))
}
