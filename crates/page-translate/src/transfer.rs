//! Transfer orchestrator: fetch, flatten, transform, patch, redact, write back.
//!
//! Only the two store calls are retried. Everything between them is in
//! memory and either succeeds or is reported per entry.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::backup::write_page_backup;
use crate::error::{Error, Result};
use crate::flatten::{FlattenStats, Flattener};
use crate::mapper::{MalformedKey, PatchMapper};
use crate::mapping::FlatMapping;
use crate::patch::{apply_batch, PatchReport};
use crate::policy::EligibilityPolicy;
use crate::redact::Redaction;
use crate::retry::{execute_with_backoff, RetryConfig, Sleeper};
use crate::store::{PageSink, PageSource};
use crate::translate::{TranslateReport, TranslationSession};

#[derive(Debug, Clone)]
pub struct TransferSettings {
    pub policy: EligibilityPolicy,
    pub mapper: PatchMapper,
    pub redaction: Redaction,
    pub retry: RetryConfig,
    pub root_label: Option<String>,
    /// Where to save the patched page before write-back. No backup if unset.
    pub backup_dir: Option<PathBuf>,
}

impl TransferSettings {
    pub fn new(policy: EligibilityPolicy, mapper: PatchMapper, redaction: Redaction) -> Self {
        Self {
            policy,
            mapper,
            redaction,
            retry: RetryConfig::default(),
            root_label: None,
            backup_dir: None,
        }
    }

    /// Label flattened paths with `label` and drop it again when resolving.
    pub fn with_root_label(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        self.mapper = self.mapper.with_root_label(label.clone());
        self.root_label = (!label.is_empty()).then_some(label);
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_backup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backup_dir = Some(dir.into());
        self
    }
}

/// Cooperative cancellation, checked between documents.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub mapping: FlatMapping,
    pub stats: FlattenStats,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateReport {
    pub patch: PatchReport,
    pub not_marked: usize,
    pub malformed: Vec<MalformedKey>,
    /// Managed subtrees removed before write-back.
    pub redacted: usize,
    pub backup: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub extracted: FlattenStats,
    pub translate: TranslateReport,
    pub update: UpdateReport,
}

#[derive(Debug)]
pub struct DocumentOutcome {
    pub document: String,
    pub result: Result<RunReport>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<DocumentOutcome>,
    /// Documents never started because the run was cancelled.
    pub cancelled: Vec<String>,
}

impl BatchReport {
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.cancelled.is_empty()
    }
}

pub struct Transfer<'a, S> {
    store: &'a S,
    sleeper: &'a dyn Sleeper,
    settings: TransferSettings,
}

impl<'a, S: PageSource + PageSink> Transfer<'a, S> {
    pub fn new(store: &'a S, sleeper: &'a dyn Sleeper, settings: TransferSettings) -> Self {
        Self {
            store,
            sleeper,
            settings,
        }
    }

    pub fn settings(&self) -> &TransferSettings {
        &self.settings
    }

    /// Fetch a page, retrying transient failures.
    pub fn fetch(&self, document: &str) -> Result<Value> {
        execute_with_backoff(&self.settings.retry, self.sleeper, "fetch", || {
            self.store.fetch(document)
        })
        .map_err(|source| Error::Transfer {
            document: document.to_string(),
            source,
        })
    }

    fn flatten(&self, page: &Value) -> Extracted {
        let mut flattener = Flattener::new(&self.settings.policy);
        if let Some(label) = &self.settings.root_label {
            flattener = flattener.with_root_label(label.as_str());
        }
        let flattened = flattener.flatten(page);
        Extracted {
            mapping: flattened.to_mapping(),
            stats: flattened.stats,
        }
    }

    /// Fetch a page and collect its eligible leaves.
    pub fn extract(&self, document: &str) -> Result<Extracted> {
        let page = self.fetch(document)?;
        let extracted = self.flatten(&page);
        info!(
            document,
            entries = extracted.mapping.len(),
            leaves = extracted.stats.leaves,
            unaddressable = extracted.stats.unaddressable,
            "extracted"
        );
        Ok(extracted)
    }

    /// Fetch the current page, patch it from `transformed`, and write it back.
    pub fn update(&self, document: &str, transformed: &FlatMapping) -> Result<UpdateReport> {
        let page = self.fetch(document)?;
        self.write_back(document, page, transformed)
    }

    fn write_back(
        &self,
        document: &str,
        mut page: Value,
        transformed: &FlatMapping,
    ) -> Result<UpdateReport> {
        let batch = self.settings.mapper.resolve_all(transformed);
        let patch = apply_batch(&mut page, batch.patches);
        if !patch.unresolved.is_empty() {
            warn!(
                document,
                unresolved = patch.unresolved.len(),
                "some entries did not resolve against the page"
            );
        }

        let backup = match &self.settings.backup_dir {
            Some(dir) => Some(write_page_backup(dir, document, &page)?),
            None => None,
        };

        let (body, redacted) = self.settings.redaction.redact(&page);
        execute_with_backoff(&self.settings.retry, self.sleeper, "update", || {
            self.store.update(document, &body)
        })
        .map_err(|source| Error::Transfer {
            document: document.to_string(),
            source,
        })?;

        info!(document, applied = patch.applied, redacted, "page updated");
        Ok(UpdateReport {
            patch,
            not_marked: batch.not_marked,
            malformed: batch.malformed,
            redacted,
            backup,
        })
    }

    /// The whole pipeline for one document, without intermediate artifacts.
    pub fn run(&self, document: &str, session: &TranslationSession<'_>) -> Result<RunReport> {
        let page = self.fetch(document)?;
        let extracted = self.flatten(&page);
        let mut transformed = FlatMapping::new();
        let translate = session.run(&extracted.mapping, &mut transformed, &mut |_| Ok(()))?;
        let update = self.write_back(document, page, &transformed)?;
        Ok(RunReport {
            extracted: extracted.stats,
            translate,
            update,
        })
    }

    /// [`run`](Self::run) for each document in turn.
    ///
    /// A failed document does not stop the others. Once `cancel` is set, the
    /// remaining documents are listed as cancelled.
    pub fn run_batch<I, D>(
        &self,
        documents: I,
        session: &TranslationSession<'_>,
        cancel: &CancelFlag,
    ) -> BatchReport
    where
        I: IntoIterator<Item = D>,
        D: Into<String>,
    {
        let mut report = BatchReport::default();
        for document in documents {
            let document = document.into();
            if cancel.is_cancelled() {
                report.cancelled.push(document);
                continue;
            }
            let result = self.run(&document, session);
            if let Err(err) = &result {
                error!(document = %document, error = %err, "document failed");
            }
            report.outcomes.push(DocumentOutcome { document, result });
        }
        if !report.cancelled.is_empty() {
            warn!(skipped = report.cancelled.len(), "run cancelled");
        }
        report
    }
}
