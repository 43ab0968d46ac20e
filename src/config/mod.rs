pub mod cli;
pub mod toml_config;

use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_file_prefix, validate_path, validate_positive_number, validate_range, validate_url,
    Validate,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_ENDPOINT: &str = "https://goadmin.ifrc.org/api/v2/country/";
pub const DEFAULT_OUTPUT_PATH: &str = "ifrc_data";
pub const DEFAULT_FILE_PREFIX: &str = "ifrc_countries";
pub const DEFAULT_RAW_PREFIX: &str = "raw_country_data";

/// 分頁抓取的重試與等待設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Attempts per page for network failures. Rate-limit responses are not counted.
    pub max_retries: u32,
    pub request_timeout_seconds: u64,
    /// Backoff after failed attempt `n` is `n * backoff_step_seconds`.
    pub backoff_step_seconds: u64,
    /// Used when a 429/503 response carries no usable `Retry-After`.
    pub rate_limit_wait_seconds: u64,
    pub page_delay_seconds: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            request_timeout_seconds: 30,
            backoff_step_seconds: 5,
            rate_limit_wait_seconds: 60,
            page_delay_seconds: 1,
        }
    }
}

impl RetryPolicy {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_secs(self.backoff_step_seconds.saturating_mul(u64::from(attempt)))
    }

    pub fn default_rate_limit_wait(&self) -> Duration {
        Duration::from_secs(self.rate_limit_wait_seconds)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_secs(self.page_delay_seconds)
    }
}

impl Validate for RetryPolicy {
    fn validate(&self) -> Result<()> {
        validate_positive_number("source.max_retries", u64::from(self.max_retries), 1)?;
        validate_range("source.timeout_seconds", self.request_timeout_seconds, 1, 600)?;
        Ok(())
    }
}

/// 一次執行所需的完整設定 (預設值 + TOML 檔 + 命令列覆蓋)
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub api_endpoint: String,
    pub output_path: String,
    pub file_prefix: String,
    pub raw_prefix: String,
    pub retry: RetryPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            raw_prefix: DEFAULT_RAW_PREFIX.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

impl ConfigProvider for RunConfig {
    fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn file_prefix(&self) -> &str {
        &self.file_prefix
    }

    fn raw_prefix(&self) -> &str {
        &self.raw_prefix
    }

    fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }
}

impl Validate for RunConfig {
    fn validate(&self) -> Result<()> {
        validate_url("source.endpoint", &self.api_endpoint)?;
        validate_path("load.output_path", &self.output_path)?;
        validate_file_prefix("load.file_prefix", &self.file_prefix)?;
        validate_file_prefix("load.raw_prefix", &self.raw_prefix)?;
        self.retry.validate()
    }
}
