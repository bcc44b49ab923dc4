//! Custom-search API client.
//!
//! Web queries return academic URLs only; image queries return a single
//! best-guess diagram URL. Search failures retry a fixed number of times
//! with a randomized sleep, then surface as [`LecternError::Search`].

use std::time::Duration;

use rand::Rng;
use serde::Deserialize;
use tracing::{debug, info, warn};

use lectern_shared::{LecternError, Result, SearchConfig};

use crate::scrape::{SearchHit, scrape_page};

/// Default API base. Tests override this with a mock server URL.
const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("Lectern/", env!("CARGO_PKG_VERSION"));

/// How many raw results to request before academic filtering.
const RAW_RESULT_COUNT: u32 = 20;

/// Domains considered academic sources.
const ACADEMIC_DOMAINS: &[&str] = &[
    ".edu",
    ".gov",
    ".org",
    "arxiv.org",
    "researchgate.net",
    "springer.com",
    "ieeexplore.ieee.org",
    "journals.sagepub.com",
    "nature.com",
    "sciencedirect.com",
];

/// Keywords suggesting an image is an educational diagram.
const DIAGRAM_KEYWORDS: &[&str] = &[
    "diagram",
    "flowchart",
    "chart",
    "concept",
    "explanation",
    "graph",
    "visual",
    "equations",
];

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Runtime retry/result options, resolved from [`SearchConfig`].
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Scraped sites per query.
    pub num_results: usize,
    /// Search attempts before giving up.
    pub retries: u32,
    /// Randomized backoff window between attempts, in milliseconds.
    pub backoff_min_ms: u64,
    pub backoff_max_ms: u64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            num_results: 3,
            retries: 3,
            backoff_min_ms: 2000,
            backoff_max_ms: 5000,
        }
    }
}

impl From<&SearchConfig> for SearchOptions {
    fn from(config: &SearchConfig) -> Self {
        Self {
            num_results: config.num_results,
            retries: config.retries,
            backoff_min_ms: config.backoff_min_ms,
            backoff_max_ms: config.backoff_max_ms,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for the custom-search API.
#[derive(Debug, Clone)]
pub struct SearchClient {
    api_key: String,
    engine_id: String,
    base_url: String,
    options: SearchOptions,
    http: reqwest::Client,
}

impl SearchClient {
    /// Create a new search client.
    pub fn new(api_key: impl Into<String>, engine_id: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LecternError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key: api_key.into(),
            engine_id: engine_id.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            options: SearchOptions::default(),
            http,
        })
    }

    /// Point the client at a different API base (mock servers in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override retry/result options.
    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    /// Search with bounded retry, returning up to `num_sites` academic URLs.
    ///
    /// Attempts the query exactly `options.retries` times; each failure
    /// sleeps a uniformly random duration inside the backoff window. After
    /// the final failure the error is returned as [`LecternError::Search`].
    pub async fn safe_search(&self, query: &str, num_sites: usize) -> Result<Vec<String>> {
        let retries = self.options.retries;

        for attempt in 1..=retries {
            match self.attempt_search(query).await {
                Ok(all_results) => {
                    let academic: Vec<String> = all_results
                        .into_iter()
                        .filter(|url| is_academic_url(url))
                        .take(num_sites)
                        .collect();
                    debug!(query, results = academic.len(), "search succeeded");
                    return Ok(academic);
                }
                Err(e) => {
                    warn!(query, attempt, retries, error = %e, "search failed");
                    if attempt < retries {
                        let wait = self.random_backoff();
                        debug!(wait_ms = wait.as_millis() as u64, "retrying after backoff");
                        tokio::time::sleep(wait).await;
                    }
                }
            }
        }

        Err(LecternError::Search(format!(
            "failed search after {retries} retries: {query}"
        )))
    }

    /// Search and scrape: fetch each academic hit's page text.
    /// Hits whose pages yield no text are dropped.
    pub async fn search_web(&self, query: &str, num_sites: usize) -> Result<Vec<SearchHit>> {
        let urls = self.safe_search(query, num_sites).await?;

        let mut hits = Vec::new();
        for url in urls {
            info!(%url, "scanning url");
            match scrape_page(&self.http, &url).await {
                Ok(text) if !text.trim().is_empty() => hits.push(SearchHit { url, text }),
                Ok(_) => debug!(%url, "page yielded no text, skipping"),
                Err(e) => warn!(%url, error = %e, "scrape failed, skipping"),
            }
        }

        Ok(hits)
    }

    /// Image search: return a single best-guess diagram URL for the query.
    ///
    /// Prefers hits that validate as images AND look like educational
    /// diagrams; falls back to the first merely-valid image; `None` when
    /// nothing validates.
    pub async fn image_search(&self, query: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/customsearch/v1?q={}&searchType=image&key={}&cx={}&num=3",
            self.base_url,
            urlencode(query),
            self.api_key,
            self.engine_id
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| LecternError::Network(format!("image search: {e}")))?;

        if !response.status().is_success() {
            return Err(LecternError::Search(format!(
                "image search failed: HTTP {}",
                response.status()
            )));
        }

        let results: SearchResponse = response
            .json()
            .await
            .map_err(|e| LecternError::Search(format!("invalid image search response: {e}")))?;

        // First pass: valid image that looks like a diagram.
        for item in &results.items {
            if is_likely_diagram(&item.link, item.title.as_deref(), item.snippet.as_deref())
                && self.is_image_valid(&item.link).await
            {
                return Ok(Some(item.link.clone()));
            }
        }

        // Fallback: first valid image of any kind.
        for item in &results.items {
            if self.is_image_valid(&item.link).await {
                return Ok(Some(item.link.clone()));
            }
        }

        Ok(None)
    }

    /// Run one search query against the API.
    async fn attempt_search(&self, query: &str) -> Result<Vec<String>> {
        let url = format!(
            "{}/customsearch/v1?q={}&key={}&cx={}&num={}",
            self.base_url,
            urlencode(query),
            self.api_key,
            self.engine_id,
            RAW_RESULT_COUNT
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| LecternError::Network(format!("search: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LecternError::Search(format!("search: HTTP {status}")));
        }

        let results: SearchResponse = response
            .json()
            .await
            .map_err(|e| LecternError::Search(format!("invalid search response: {e}")))?;

        Ok(results.items.into_iter().map(|i| i.link).collect())
    }

    /// Check an image URL responds 200 with an `image/*` content type.
    async fn is_image_valid(&self, image_url: &str) -> bool {
        match self.http.get(image_url).send().await {
            Ok(response) => {
                response.status().is_success()
                    && response
                        .headers()
                        .get(reqwest::header::CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .is_some_and(|ct| ct.contains("image"))
            }
            Err(_) => false,
        }
    }

    /// Uniformly random sleep inside the configured backoff window.
    fn random_backoff(&self) -> Duration {
        let min = self.options.backoff_min_ms;
        let max = self.options.backoff_max_ms.max(min);
        let ms = if min == max {
            min
        } else {
            rand::thread_rng().gen_range(min..=max)
        };
        Duration::from_millis(ms)
    }
}

// ---------------------------------------------------------------------------
// Heuristics
// ---------------------------------------------------------------------------

/// Check whether a URL belongs to an academic source.
pub fn is_academic_url(url: &str) -> bool {
    ACADEMIC_DOMAINS.iter().any(|domain| url.contains(domain))
}

/// Check whether an image URL/metadata suggests an educational diagram.
pub fn is_likely_diagram(image_url: &str, title: Option<&str>, snippet: Option<&str>) -> bool {
    let url_lower = image_url.to_lowercase();
    if DIAGRAM_KEYWORDS.iter().any(|kw| url_lower.contains(kw)) {
        return true;
    }

    let title_lower = title.unwrap_or_default().to_lowercase();
    let snippet_lower = snippet.unwrap_or_default().to_lowercase();
    DIAGRAM_KEYWORDS
        .iter()
        .any(|kw| title_lower.contains(kw) || snippet_lower.contains(kw))
}

/// Minimal percent-encoding for query strings.
fn urlencode(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: String,
    title: Option<String>,
    snippet: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
