//! Query provider contract and the Google implementation.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::{Client, StatusCode, header::USER_AGENT};
use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::models::DispatchConfig;

/// Search endpoint queried by [`GoogleProvider`].
const SEARCH_URL: &str = "https://www.google.com/search";

/// User agents rotated per request to vary the automated fingerprint.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.107 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.114 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; rv:78.0) Gecko/20100101 Firefox/78.0",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:89.0) Gecko/20100101 Firefox/89.0",
];

/// External search provider queried one result page at a time.
///
/// Implementations must surface only classified errors: `RateLimited`,
/// `Timeout`, or `Provider`. Nothing else crosses this boundary.
#[async_trait]
pub trait QueryProvider: Send + Sync {
    /// Fetch up to `count` result locators for `query`, starting at the
    /// provider's result index `start`.
    async fn fetch(&self, query: &str, start: usize, count: usize) -> Result<Vec<String>>;
}

/// Provider scraping Google's HTML result pages.
pub struct GoogleProvider {
    client: Client,
}

impl GoogleProvider {
    /// Build a provider from the dispatch configuration.
    pub fn new(config: &DispatchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    fn pick_user_agent() -> &'static str {
        let idx = rand::rng().random_range(0..USER_AGENTS.len());
        USER_AGENTS[idx]
    }
}

#[async_trait]
impl QueryProvider for GoogleProvider {
    async fn fetch(&self, query: &str, start: usize, count: usize) -> Result<Vec<String>> {
        let params: Vec<(&str, String)> = vec![
            ("q", query.to_string()),
            // Request a couple extra; the page carries non-result links.
            ("num", (count + 2).to_string()),
            ("start", start.to_string()),
            ("hl", "en".to_string()),
        ];

        let response = self
            .client
            .get(SEARCH_URL)
            .query(&params)
            .header(USER_AGENT, Self::pick_user_agent())
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::RateLimited);
        }
        if !status.is_success() {
            return Err(AppError::provider(format!(
                "search returned status {status}"
            )));
        }

        let html = response.text().await.map_err(classify_request_error)?;
        Ok(parse_result_links(&html, count))
    }
}

/// Map a request error to its classified dispatch outcome.
fn classify_request_error(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::Timeout
    } else if e.status() == Some(StatusCode::TOO_MANY_REQUESTS) {
        AppError::RateLimited
    } else {
        AppError::Provider(e.to_string())
    }
}

/// Extract up to `limit` result locators from a result page.
///
/// Result links appear either as redirect anchors (`/url?q=...`) or as
/// direct external anchors. Google-internal links are dropped, and
/// order-preserving dedup keeps the first occurrence.
pub fn parse_result_links(html: &str, limit: usize) -> Vec<String> {
    static ANCHOR: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));

    let document = Html::parse_document(html);

    let mut seen = std::collections::HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&ANCHOR) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        let candidate = match href.strip_prefix("/url?q=") {
            Some(rest) => rest.split('&').next().unwrap_or(rest),
            None => href,
        };

        let Ok(parsed) = url::Url::parse(candidate) else {
            continue;
        };
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            continue;
        }
        let Some(host) = parsed.host_str() else {
            continue;
        };
        if host.contains("google.") {
            continue;
        }

        if seen.insert(candidate.to_string()) {
            links.push(candidate.to_string());
            if links.len() >= limit {
                break;
            }
        }
    }

    links
}
