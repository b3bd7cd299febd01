//! Rate-limited execution dispatcher.

use std::time::Duration;

use rand::Rng;

use crate::dispatch::provider::QueryProvider;
use crate::error::{AppError, Result};
use crate::models::DispatchConfig;

/// Convert a caller-supplied pacing interval in seconds, rejecting
/// negative and non-finite values before they can panic the conversion.
pub fn pacing_from_secs(secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(AppError::config(
            "pacing seconds must be a non-negative finite number",
        ));
    }
    Ok(Duration::from_secs_f64(secs))
}

/// Dispatches a query against a [`QueryProvider`] with paced, bounded
/// result collection.
///
/// One sequential request at a time; the provider actively penalizes
/// burst traffic, so there is no parallel fan-out.
pub struct Dispatcher<P: QueryProvider> {
    provider: P,
    config: DispatchConfig,
}

impl<P: QueryProvider> Dispatcher<P> {
    /// Create a dispatcher over the given provider.
    pub fn new(provider: P, config: DispatchConfig) -> Self {
        Self { provider, config }
    }

    /// Run `query` against the provider, collecting up to `max_results`
    /// result locators.
    ///
    /// Consumption stops at `max_results` or when the provider's stream
    /// is exhausted (a short or empty page), whichever comes first.
    /// Between provider requests the dispatcher sleeps `pacing`, or an
    /// interval uniformly sampled from the configured pacing range when
    /// none is given. Provider failures arrive already classified
    /// (`RateLimited`, `Timeout`, `Provider`) and yield no partial
    /// results.
    pub async fn run(
        &self,
        query: &str,
        max_results: usize,
        pacing: Option<Duration>,
    ) -> Result<Vec<String>> {
        let mut results: Vec<String> = Vec::new();
        let mut start = 0usize;

        while results.len() < max_results {
            if start > 0 {
                let delay = pacing.unwrap_or_else(|| self.sample_pacing());
                tokio::time::sleep(delay).await;
            }

            let want = (max_results - results.len()).min(self.config.page_size);
            let batch = self.provider.fetch(query, start, want).await?;
            if batch.is_empty() {
                break;
            }

            let got = batch.len();
            for locator in batch {
                if results.len() < max_results {
                    results.push(locator);
                }
            }
            if got < want {
                break;
            }
            start += got;
        }

        log::info!("Query returned {} result locators", results.len());
        Ok(results)
    }

    /// Sample an inter-request pacing interval from the configured range.
    fn sample_pacing(&self) -> Duration {
        let lo = self.config.pacing_min_secs;
        let hi = self.config.pacing_max_secs;
        let secs = if hi > lo {
            rand::rng().random_range(lo..=hi)
        } else {
            lo
        };
        Duration::from_secs_f64(secs)
    }
}
