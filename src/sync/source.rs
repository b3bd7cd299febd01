//! Page source contract and the GHDB implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, REFERER};

use crate::error::{AppError, Result};
use crate::models::{DorkPage, SyncConfig};

/// Remote paginated feed of raw dork records.
///
/// Implementations answer one page window per call. The advertised
/// `records_total` on the returned page is a hint, not a guarantee.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch one page of `length` records starting at `offset`, ordered
    /// newest first.
    async fn fetch_page(&self, offset: u64, length: u64) -> Result<DorkPage>;
}

/// Page source for the Exploit-DB Google Hacking Database.
///
/// The public /ghdb endpoint is broken; the main page URL answers
/// DataTables AJAX requests with JSON when the `X-Requested-With` header
/// is set.
pub struct GhdbSource {
    client: Client,
    endpoint: String,
}

impl GhdbSource {
    /// Build a source from the sync configuration.
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Requested-With",
            HeaderValue::from_static("XMLHttpRequest"),
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
        );
        if let Ok(referer) = HeaderValue::from_str(&config.endpoint) {
            headers.insert(REFERER, referer);
        }

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl PageSource for GhdbSource {
    async fn fetch_page(&self, offset: u64, length: u64) -> Result<DorkPage> {
        let params: Vec<(&str, String)> = vec![
            ("draw", "1".to_string()),
            ("columns[0][data]", "date".to_string()),
            ("columns[1][data]", "url_title".to_string()),
            ("columns[2][data]", "cat_id".to_string()),
            ("columns[3][data]", "author_id".to_string()),
            ("order[0][column]", "0".to_string()),
            ("order[0][dir]", "desc".to_string()),
            ("start", offset.to_string()),
            ("length", length.to_string()),
            ("search[value]", String::new()),
            ("search[regex]", "false".to_string()),
        ];

        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await
            .map_err(|e| AppError::transient(format!("page request at offset {offset}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::transient(format!(
                "GHDB returned status {status} at offset {offset}"
            )));
        }

        response
            .json::<DorkPage>()
            .await
            .map_err(|e| AppError::protocol(format!("decoding page at offset {offset}: {e}")))
    }
}
