use crate::config::{RetryPolicy, RunConfig};
use crate::utils::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional config file. Every key may be left out.
///
/// ```toml
/// [source]
/// endpoint = "https://goadmin.ifrc.org/api/v2/country/"
/// max_retries = 3
/// timeout_seconds = 30
///
/// [load]
/// output_path = "ifrc_data"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TomlConfig {
    pub source: SourceConfig,
    pub load: LoadConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub max_retries: Option<u32>,
    pub retry_delay_seconds: Option<u64>,
    pub rate_limit_wait_seconds: Option<u64>,
    pub page_delay_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadConfig {
    pub output_path: Option<String>,
    pub file_prefix: Option<String>,
    pub raw_prefix: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| EtlError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 套用到既有設定上，檔案中沒有的欄位保持原值
    pub fn apply_to(&self, config: &mut RunConfig) {
        let source = &self.source;
        if let Some(endpoint) = &source.endpoint {
            config.api_endpoint = endpoint.clone();
        }

        let retry: &mut RetryPolicy = &mut config.retry;
        if let Some(timeout) = source.timeout_seconds {
            retry.request_timeout_seconds = timeout;
        }
        if let Some(max_retries) = source.max_retries {
            retry.max_retries = max_retries;
        }
        if let Some(step) = source.retry_delay_seconds {
            retry.backoff_step_seconds = step;
        }
        if let Some(wait) = source.rate_limit_wait_seconds {
            retry.rate_limit_wait_seconds = wait;
        }
        if let Some(delay) = source.page_delay_seconds {
            retry.page_delay_seconds = delay;
        }

        let load = &self.load;
        if let Some(output_path) = &load.output_path {
            config.output_path = output_path.clone();
        }
        if let Some(prefix) = &load.file_prefix {
            config.file_prefix = prefix.clone();
        }
        if let Some(prefix) = &load.raw_prefix {
            config.raw_prefix = prefix.clone();
        }
    }
}
