//! HubSpot CMS v3 page store over blocking HTTP.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result, TransferError};
use crate::store::{PageSink, PageSource};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageKind {
    #[default]
    SitePage,
    BlogPost,
}

impl PageKind {
    pub fn endpoint(self) -> &'static str {
        match self {
            PageKind::SitePage => "cms/v3/pages/site-pages",
            PageKind::BlogPost => "cms/v3/blogs/posts",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HubSpotConfig {
    pub base_url: String,
    pub page_kind: PageKind,
    pub timeout_secs: u64,
}

impl Default for HubSpotConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.hubapi.com".into(),
            page_kind: PageKind::SitePage,
            timeout_secs: 30,
        }
    }
}

/// Map an HTTP status to a transfer failure class.
pub fn classify_status(status: StatusCode, document: &str, body: &str) -> TransferError {
    let detail = format!("{document}: HTTP {status}: {body}");
    match status.as_u16() {
        404 => TransferError::NotFound(document.to_string()),
        401 | 403 => TransferError::Auth(detail),
        408 | 429 | 500..=599 => TransferError::Transient(detail),
        _ => TransferError::Permanent(detail),
    }
}

fn from_reqwest(document: &str, err: &reqwest::Error) -> TransferError {
    let detail = format!("{document}: {err}");
    if err.is_timeout() || err.is_connect() || err.is_request() {
        TransferError::Transient(detail)
    } else {
        TransferError::Permanent(detail)
    }
}

pub struct HubSpotClient {
    client: Client,
    base_url: String,
    kind: PageKind,
    token: String,
}

impl HubSpotClient {
    pub fn new(config: &HubSpotConfig, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            kind: config.page_kind,
            token: token.into(),
        })
    }

    fn page_url(&self, document: &str) -> String {
        format!("{}/{}/{document}", self.base_url, self.kind.endpoint())
    }

    fn check(document: &str, response: Response) -> Result<Response, TransferError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(classify_status(status, document, &body))
    }
}

impl PageSource for HubSpotClient {
    fn fetch(&self, document: &str) -> Result<Value, TransferError> {
        let url = self.page_url(document);
        debug!(%url, "GET page");
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| from_reqwest(document, &e))?;
        Self::check(document, response)?
            .json::<Value>()
            .map_err(|e| TransferError::Permanent(format!("{document}: invalid page body: {e}")))
    }
}

impl PageSink for HubSpotClient {
    fn update(&self, document: &str, body: &Value) -> Result<(), TransferError> {
        let url = self.page_url(document);
        debug!(%url, "PATCH page");
        let response = self
            .client
            .patch(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .map_err(|e| from_reqwest(document, &e))?;
        Self::check(document, response).map(|_| ())
    }
}
