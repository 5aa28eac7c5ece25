//! Client side of the link-resolution service.
//!
//! [`WikiApi`] is the seam the crawl is written against; [`MediaWikiClient`] implements it
//! over the MediaWiki Action API (`formatversion=2` JSON).

use crate::config::{MISSING_PAGE_ID, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("API returned error {code}: {info}")]
    Remote { code: String, info: String },

    #[error("Malformed API response: {0}")]
    Malformed(String),

    #[error("Invalid API endpoint: {0}")]
    InvalidEndpoint(String),
}

impl ApiError {
    /// Transport failures, throttling and server errors are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Http(_) => true,
            ApiError::Status { status, .. } => *status == 429 || *status >= 500,
            ApiError::Remote { code, .. } => code == "maxlag" || code == "ratelimited",
            ApiError::Malformed(_) | ApiError::InvalidEndpoint(_) => false,
        }
    }
}

/// One page entry of a resolution query, with missing pages mapped to [`MISSING_PAGE_ID`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    pub page_id: i64,
    pub namespace: i32,
    pub title: String,
}

impl PageInfo {
    pub fn is_missing(&self) -> bool {
        self.page_id == MISSING_PAGE_ID
    }
}

/// Answer to a single batched resolution query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    /// from -> to, title normalizations first, then redirects
    pub redirects: Vec<(String, String)>,
    pub pages: Vec<PageInfo>,
}

pub trait WikiApi: Sync {
    /// Canonical title, namespace and redirect metadata for up to 50 titles.
    fn query_pages(
        &self,
        titles: &[String],
    ) -> impl Future<Output = Result<PageQuery, ApiError>> + Send;

    /// Raw wikitext of a single page, `None` if the page does not exist.
    fn fetch_wikitext(
        &self,
        title: &str,
    ) -> impl Future<Output = Result<Option<String>, ApiError>> + Send;
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    query: Option<QueryBody>,
    #[serde(default)]
    error: Option<RemoteError>,
}

#[derive(Deserialize, Default)]
struct QueryBody {
    #[serde(default)]
    normalized: Vec<TitleMapping>,
    #[serde(default)]
    redirects: Vec<TitleMapping>,
    #[serde(default)]
    pages: Vec<WirePage>,
}

#[derive(Deserialize)]
struct TitleMapping {
    from: String,
    to: String,
}

#[derive(Deserialize)]
struct RemoteError {
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Deserialize)]
struct WirePage {
    #[serde(default)]
    pageid: Option<i64>,
    #[serde(default)]
    ns: i32,
    #[serde(default)]
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    #[serde(default)]
    revisions: Vec<WireRevision>,
}

#[derive(Deserialize)]
struct WireRevision {
    #[serde(default)]
    slots: Option<WireSlots>,
}

#[derive(Deserialize)]
struct WireSlots {
    main: WireSlot,
}

#[derive(Deserialize)]
struct WireSlot {
    #[serde(default)]
    content: String,
}

impl WirePage {
    fn page_id(&self) -> i64 {
        if self.missing || self.invalid {
            MISSING_PAGE_ID
        } else {
            self.pageid.unwrap_or(MISSING_PAGE_ID)
        }
    }
}

impl QueryResponse {
    fn into_body(self) -> Result<QueryBody, ApiError> {
        if let Some(err) = self.error {
            return Err(ApiError::Remote {
                code: err.code,
                info: err.info,
            });
        }
        Ok(self.query.unwrap_or_default())
    }
}

pub struct MediaWikiClient {
    client: Client,
    endpoint: Url,
}

impl MediaWikiClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ApiError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| ApiError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .connect_timeout(timeout / 2)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn get_json<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T, ApiError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                url: self.endpoint.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Malformed(e.to_string()))
    }
}

impl WikiApi for MediaWikiClient {
    async fn query_pages(&self, titles: &[String]) -> Result<PageQuery, ApiError> {
        let joined = titles.join("|");
        debug!(count = titles.len(), "Querying page metadata");

        let response: QueryResponse = self
            .get_json(&[
                ("action", "query"),
                ("format", "json"),
                ("formatversion", "2"),
                ("redirects", "1"),
                ("prop", "info"),
                ("titles", joined.as_str()),
            ])
            .await?;
        let body = response.into_body()?;

        let redirects = body
            .normalized
            .into_iter()
            .chain(body.redirects)
            .map(|m| (m.from, m.to))
            .collect();
        let pages = body
            .pages
            .into_iter()
            .map(|p| PageInfo {
                page_id: p.page_id(),
                namespace: p.ns,
                title: p.title,
            })
            .collect();

        Ok(PageQuery { redirects, pages })
    }

    async fn fetch_wikitext(&self, title: &str) -> Result<Option<String>, ApiError> {
        debug!(title = title, "Fetching wikitext");

        let response: QueryResponse = self
            .get_json(&[
                ("action", "query"),
                ("format", "json"),
                ("formatversion", "2"),
                ("redirects", "1"),
                ("prop", "revisions"),
                ("rvprop", "content"),
                ("rvslots", "main"),
                ("titles", title),
            ])
            .await?;
        let body = response.into_body()?;

        let Some(page) = body.pages.into_iter().next() else {
            return Ok(None);
        };
        if page.page_id() == MISSING_PAGE_ID {
            return Ok(None);
        }

        let content = page
            .revisions
            .into_iter()
            .next()
            .and_then(|rev| rev.slots)
            .map(|slots| slots.main.content)
            .unwrap_or_default();
        Ok(Some(content))
    }
}
