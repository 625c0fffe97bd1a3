mod common;

use std::time::Duration;

use common::{
    hubspot_settings, mapping, quick_translate_settings, sample_page, Upper, SAMPLE_KEYS,
};
use page_path::{decode, PathPattern};
use page_translate::error::{Error, TransferError};
use page_translate::mapper::PatchMapper;
use page_translate::patch::{patched, PatchResult, UnresolvedReason};
use page_translate::redact::redact;
use page_translate::retry::{RecordingSleeper, RetryError};
use page_translate::store::MemoryPages;
use page_translate::transfer::{CancelFlag, Transfer};
use page_translate::translate::TranslationSession;
use serde_json::json;

#[test]
fn basic_patch_scenario() {
    let tree = json!({"a": {"b": ["x", "y"]}});
    let mapper = PatchMapper::new("_th").unwrap();
    let batch = mapper.resolve_all(&mapping(&[("a.b[0]_th", "new")]));
    assert_eq!(batch.patches[0].0, decode("a.b[0]").unwrap());

    let (out, report) = patched(&tree, batch.patches);
    assert_eq!(out, json!({"a": {"b": ["new", "y"]}}));
    assert_eq!(report.applied, 1);
    assert!(report.is_clean());
}

#[test]
fn unresolved_scenario() {
    let tree = json!({"a": {"b": ["x", "y"]}});
    let mapper = PatchMapper::new("_th").unwrap();
    let batch = mapper.resolve_all(&mapping(&[("a.c_th", "v")]));

    let (out, report) = patched(&tree, batch.patches);
    assert_eq!(out, tree);
    assert_eq!(report.applied, 0);
    assert_eq!(report.unresolved.len(), 1);
    assert_eq!(report.unresolved[0].path, decode("a.c").unwrap());
    assert!(matches!(report.unresolved[0].reason, UnresolvedReason::Lookup(_)));
}

#[test]
fn redaction_scenario() {
    let tree = json!({"id": 1, "createdAt": "...", "content": {"title": "Hi"}});
    let patterns = [
        PathPattern::parse("id").unwrap(),
        PathPattern::parse("createdAt").unwrap(),
    ];
    assert_eq!(redact(&tree, &patterns), json!({"content": {"title": "Hi"}}));
}

#[test]
fn single_apply_reports_applied() {
    let mut tree = json!({"a": {"b": ["x", "y"]}});
    let result = page_translate::patch::apply(&mut tree, &decode("a.b[1]").unwrap(), json!("z"));
    assert_eq!(result, PatchResult::Applied);
}

#[test]
fn extract_collects_default_policy_entries() {
    let pages = MemoryPages::new().with_page("123", sample_page());
    let sleeper = RecordingSleeper::new();
    let transfer = Transfer::new(&pages, &sleeper, hubspot_settings());

    let extracted = transfer.extract("123").unwrap();
    let keys: Vec<&str> = extracted.mapping.keys().collect();
    assert_eq!(keys, SAMPLE_KEYS);
    assert_eq!(extracted.mapping.get("root.htmlTitle"), Some("About us | Acme"));
    assert_eq!(extracted.stats.eligible, SAMPLE_KEYS.len());
}

#[test]
fn update_patches_redacts_and_backs_up() {
    let dir = tempfile::tempdir().unwrap();
    let pages = MemoryPages::new().with_page("123", sample_page());
    let sleeper = RecordingSleeper::new();
    let settings = hubspot_settings().with_backup_dir(dir.path().join("backups"));
    let transfer = Transfer::new(&pages, &sleeper, settings);

    let transformed = mapping(&[
        ("root.htmlTitle", "About us | Acme"),
        ("root.htmlTitle_th", "เกี่ยวกับเรา | Acme"),
        ("root.widgets.hero.body.title_th", "ยินดีต้อนรับ"),
        ("root.widgets.hero.body.subtitle_th", "ไม่มี"),
        ("root.widgets[_th", "broken"),
    ]);
    let report = transfer.update("123", &transformed).unwrap();

    assert_eq!(report.patch.applied, 2);
    assert_eq!(report.patch.unresolved.len(), 1);
    assert_eq!(report.not_marked, 1);
    assert_eq!(report.malformed.len(), 1);
    assert_eq!(report.redacted, 4);

    let updates = pages.updates();
    assert_eq!(updates.len(), 1);
    let body = &updates[0].1;
    assert!(body.get("id").is_none());
    assert!(body.get("slug").is_none());
    assert_eq!(body["htmlTitle"], json!("เกี่ยวกับเรา | Acme"));
    assert_eq!(body["widgets"]["hero"]["body"]["title"], json!("ยินดีต้อนรับ"));
    assert!(body["widgets"]["hero"]["body"].get("subtitle").is_none());

    // The backup keeps the managed fields and the patched text.
    let backup = report.backup.unwrap();
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(backup).unwrap()).unwrap();
    assert_eq!(saved["id"], json!("123"));
    assert_eq!(saved["htmlTitle"], json!("เกี่ยวกับเรา | Acme"));
}

#[test]
fn run_translates_end_to_end() {
    let pages = MemoryPages::new().with_page("123", sample_page());
    let sleeper = RecordingSleeper::new();
    let transfer = Transfer::new(&pages, &sleeper, hubspot_settings());
    let translator = Upper::default();
    let settings = quick_translate_settings()
        .with_passthrough(PathPattern::parse("content_type").unwrap())
        .with_passthrough(PathPattern::parse("dnd_area.label").unwrap());
    let session =
        TranslationSession::new(&translator, &sleeper, PatchMapper::new("_th").unwrap(), settings);

    let report = transfer.run("123", &session).unwrap();
    assert_eq!(report.translate.translated, 3);
    assert_eq!(report.translate.copied, 2);
    assert_eq!(report.update.patch.applied, 5);
    assert!(report.update.patch.is_clean());

    let page = pages.page("123").unwrap();
    assert_eq!(page["htmlTitle"], json!("ABOUT US | ACME"));
    assert_eq!(page["metaDescription"], json!("WHO WE ARE"));
    assert_eq!(page["layoutSections"]["dnd_area"]["label"], json!("Main section"));
    // Never collected, never touched.
    assert_eq!(page["widgets"]["hero"]["body"]["text"], json!("Lorem ipsum dolor"));
    assert_eq!(
        page["layoutSections"]["dnd_area"]["rows"][0]["0"]["rows"][0]["0"]["label"],
        json!("Dynamic row label")
    );
    // Managed fields are left as the store had them.
    assert_eq!(page["id"], json!("123"));
}

#[test]
fn fetch_retries_transient_failures() {
    let pages = MemoryPages::new().with_page("123", sample_page());
    pages.fail_fetch(TransferError::Transient("503".into()));
    pages.fail_fetch(TransferError::Transient("502".into()));
    let sleeper = RecordingSleeper::new();
    let transfer = Transfer::new(&pages, &sleeper, hubspot_settings());

    assert!(transfer.fetch("123").is_ok());
    assert_eq!(pages.fetch_count(), 3);
    assert_eq!(
        sleeper.slept(),
        vec![Duration::from_millis(10), Duration::from_millis(20)]
    );
}

#[test]
fn failed_fetch_means_no_write_back() {
    let pages = MemoryPages::new();
    let sleeper = RecordingSleeper::new();
    let transfer = Transfer::new(&pages, &sleeper, hubspot_settings());

    let err = transfer
        .update("404", &mapping(&[("root.htmlTitle_th", "x")]))
        .unwrap_err();
    match err {
        Error::Transfer { document, source } => {
            assert_eq!(document, "404");
            assert_eq!(source, RetryError::Permanent(TransferError::NotFound("404".into())));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(pages.updates().is_empty());
    assert!(sleeper.slept().is_empty());
}

#[test]
fn write_back_gives_up_after_retry_budget() {
    let pages = MemoryPages::new().with_page("123", sample_page());
    for _ in 0..3 {
        pages.fail_update(TransferError::Transient("503".into()));
    }
    let sleeper = RecordingSleeper::new();
    let transfer = Transfer::new(&pages, &sleeper, hubspot_settings());

    let err = transfer
        .update("123", &mapping(&[("root.htmlTitle_th", "x")]))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Transfer {
            source: RetryError::Exhausted { attempts: 3, .. },
            ..
        }
    ));
    assert!(pages.updates().is_empty());
    assert_eq!(pages.page("123"), Some(sample_page()));
}

#[test]
fn batch_isolates_failures_and_honours_cancel() {
    let pages = MemoryPages::new()
        .with_page("1", sample_page())
        .with_page("3", json!({"title": "Third"}));
    let sleeper = RecordingSleeper::new();
    let transfer = Transfer::new(&pages, &sleeper, hubspot_settings());
    let translator = Upper::default();
    let session = TranslationSession::new(
        &translator,
        &sleeper,
        PatchMapper::new("_th").unwrap(),
        quick_translate_settings(),
    );

    let cancel = CancelFlag::new();
    let report = transfer.run_batch(["1", "2", "3"], &session, &cancel);
    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.failed(), 1);
    assert!(report.outcomes[1].result.is_err());
    assert_eq!(pages.page("3").unwrap()["title"], json!("THIRD"));
    assert!(!report.is_success());

    cancel.cancel();
    let report = transfer.run_batch(vec!["1".to_string()], &session, &cancel);
    assert!(report.outcomes.is_empty());
    assert_eq!(report.cancelled, vec!["1".to_string()]);
}

#[test]
fn failed_translations_stay_untouched_on_the_page() {
    let pages = MemoryPages::new().with_page("1", json!({"title": "a", "heading": "b"}));
    let sleeper = RecordingSleeper::new();
    let transfer = Transfer::new(&pages, &sleeper, hubspot_settings());
    let translator = Upper::failing_on(&["a"]);
    let session = TranslationSession::new(
        &translator,
        &sleeper,
        PatchMapper::new("_th").unwrap(),
        quick_translate_settings(),
    );

    let report = transfer.run("1", &session).unwrap();
    assert_eq!(report.translate.failed.len(), 1);
    assert_eq!(report.translate.failed[0].key, "root.title");
    assert_eq!(pages.page("1"), Some(json!({"title": "a", "heading": "B"})));
    // Permanent errors are not retried.
    assert_eq!(translator.call_count(), 2);
}
