//! page-translate: move translatable text out of a CMS page and back in.
//!
//! A page is fetched as a JSON tree, its eligible string leaves are
//! flattened into a `path -> text` mapping, each text is sent through a
//! translation service, and the results are patched back onto the live page
//! by path before the store-managed fields are stripped and the page is
//! written back.
//!
//! Paths and patterns come from the `page-path` crate.
//!
//! ```
//! use page_translate::flatten::Flattener;
//! use page_translate::mapper::PatchMapper;
//! use page_translate::mapping::FlatMapping;
//! use page_translate::patch::patched;
//! use page_translate::policy::EligibilityPolicy;
//! use serde_json::json;
//!
//! let page = json!({"widgets": {"hero": {"title": "Hello"}}});
//! let policy = EligibilityPolicy::permissive();
//! let source = Flattener::new(&policy).with_root_label("root").flatten(&page).to_mapping();
//! assert_eq!(source.get("root.widgets.hero.title"), Some("Hello"));
//!
//! let mut transformed = FlatMapping::new();
//! transformed.insert("root.widgets.hero.title_th", "สวัสดี");
//!
//! let mapper = PatchMapper::new("_th").unwrap().with_root_label("root");
//! let (out, report) = patched(&page, mapper.resolve_all(&transformed).patches);
//! assert_eq!(report.applied, 1);
//! assert_eq!(out, json!({"widgets": {"hero": {"title": "สวัสดี"}}}));
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod flatten;
pub mod hubspot;
pub mod mapper;
pub mod mapping;
pub mod patch;
pub mod policy;
pub mod redact;
pub mod retry;
pub mod store;
pub mod transfer;
pub mod translate;

pub use error::{Error, Result, TransferError, TransformError};
pub use page_path::{Path, PathPattern, Step};
