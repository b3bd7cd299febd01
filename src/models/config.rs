//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Synchronization behavior settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Query dispatch behavior settings
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.sync.endpoint.trim().is_empty() {
            return Err(AppError::config("sync.endpoint is empty"));
        }
        if self.sync.user_agent.trim().is_empty() {
            return Err(AppError::config("sync.user_agent is empty"));
        }
        if self.sync.timeout_secs == 0 {
            return Err(AppError::config("sync.timeout_secs must be > 0"));
        }
        if self.sync.page_size == 0 {
            return Err(AppError::config("sync.page_size must be > 0"));
        }
        if self.sync.checkpoint_interval == 0 {
            return Err(AppError::config("sync.checkpoint_interval must be > 0"));
        }
        if self.dispatch.timeout_secs == 0 {
            return Err(AppError::config("dispatch.timeout_secs must be > 0"));
        }
        if self.dispatch.page_size == 0 {
            return Err(AppError::config("dispatch.page_size must be > 0"));
        }
        if self.dispatch.pacing_min_secs > self.dispatch.pacing_max_secs {
            return Err(AppError::config(
                "dispatch.pacing_min_secs must not exceed pacing_max_secs",
            ));
        }
        Ok(())
    }
}

/// Settings for the synchronization engine and its page source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// GHDB JSON endpoint
    #[serde(default = "defaults::endpoint")]
    pub endpoint: String,

    /// User-Agent header for page requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Records requested per page window
    #[serde(default = "defaults::page_size")]
    pub page_size: u64,

    /// Delay between page requests in milliseconds
    #[serde(default = "defaults::page_delay")]
    pub page_delay_ms: u64,

    /// Snapshot the store every N pages during a full sync
    #[serde(default = "defaults::checkpoint_interval")]
    pub checkpoint_interval: u32,

    /// Retry attempts for a transiently failing page request
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Base delay between retries in milliseconds, scaled per attempt
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::endpoint(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            page_size: defaults::page_size(),
            page_delay_ms: defaults::page_delay(),
            checkpoint_interval: defaults::checkpoint_interval(),
            max_retries: defaults::max_retries(),
            retry_delay_ms: defaults::retry_delay(),
        }
    }
}

/// Settings for the execution dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Default number of result locators to collect
    #[serde(default = "defaults::max_results")]
    pub max_results: usize,

    /// Result locators requested per provider page
    #[serde(default = "defaults::dispatch_page_size")]
    pub page_size: usize,

    /// Lower bound of the randomized pacing interval in seconds
    #[serde(default = "defaults::pacing_min")]
    pub pacing_min_secs: f64,

    /// Upper bound of the randomized pacing interval in seconds
    #[serde(default = "defaults::pacing_max")]
    pub pacing_max_secs: f64,

    /// Provider request timeout in seconds
    #[serde(default = "defaults::dispatch_timeout")]
    pub timeout_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_results: defaults::max_results(),
            page_size: defaults::dispatch_page_size(),
            pacing_min_secs: defaults::pacing_min(),
            pacing_max_secs: defaults::pacing_max(),
            timeout_secs: defaults::dispatch_timeout(),
        }
    }
}

mod defaults {
    pub fn endpoint() -> String {
        "https://www.exploit-db.com/google-hacking-database".to_string()
    }

    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
            .to_string()
    }

    pub fn timeout() -> u64 {
        15
    }

    pub fn page_size() -> u64 {
        120
    }

    pub fn page_delay() -> u64 {
        500
    }

    pub fn checkpoint_interval() -> u32 {
        4
    }

    pub fn max_retries() -> u32 {
        3
    }

    pub fn retry_delay() -> u64 {
        1000
    }

    pub fn max_results() -> usize {
        10
    }

    pub fn dispatch_page_size() -> usize {
        10
    }

    pub fn pacing_min() -> f64 {
        2.0
    }

    pub fn pacing_max() -> f64 {
        6.0
    }

    pub fn dispatch_timeout() -> u64 {
        30
    }
}
