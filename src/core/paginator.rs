use crate::config::RetryPolicy;
use crate::domain::model::{Page, Record};
use crate::domain::ports::Sleeper;
use crate::utils::error::Result;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Why pagination ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The last page had no `next` link.
    Completed,
    /// A page kept failing until the retry budget ran out.
    RetriesExhausted,
    /// A response body was not a JSON object.
    MalformedBody,
}

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub records: Vec<Record>,
    pub pages: usize,
    pub stop: StopReason,
}

enum AttemptError {
    RateLimited(Duration),
    Transient(reqwest::Error),
    Malformed(serde_json::Error),
}

/// HTTP side of pagination: one GET per attempt, retry policy, waits through the [`Sleeper`].
pub struct PageFetcher<Z: Sleeper> {
    client: Client,
    sleeper: Z,
    policy: RetryPolicy,
}

impl<Z: Sleeper> PageFetcher<Z> {
    pub fn new(sleeper: Z, policy: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(policy.request_timeout())
            .build()?;

        Ok(Self {
            client,
            sleeper,
            policy,
        })
    }

    /// Lazily walks the `next` chain starting at `start`.
    pub fn paginate(&self, start: Url) -> Paginator<'_, Z> {
        Paginator {
            fetcher: self,
            next: Some(start),
            pages_fetched: 0,
            stop: None,
        }
    }

    pub async fn fetch_all(&self, start: Url) -> FetchOutcome {
        self.paginate(start).collect_records().await
    }

    async fn attempt(&self, url: &Url) -> std::result::Result<Value, AttemptError> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(AttemptError::Transient)?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE {
            let wait = retry_after(response.headers(), self.policy.default_rate_limit_wait());
            return Err(AttemptError::RateLimited(wait));
        }

        let response = response
            .error_for_status()
            .map_err(AttemptError::Transient)?;
        let body = response.bytes().await.map_err(AttemptError::Transient)?;

        serde_json::from_slice(&body).map_err(AttemptError::Malformed)
    }

    /// Rate-limit waits do not use up `max_retries`; other failures back off linearly.
    async fn fetch_body(&self, url: &Url) -> std::result::Result<Value, StopReason> {
        let max_retries = self.policy.max_retries;
        let mut failures = 0;

        loop {
            match self.attempt(url).await {
                Ok(body) => return Ok(body),
                Err(AttemptError::RateLimited(wait)) => {
                    tracing::warn!("⏳ Rate limited. Waiting {} seconds...", wait.as_secs());
                    self.sleeper.sleep(wait).await;
                }
                Err(AttemptError::Transient(e)) => {
                    failures += 1;
                    tracing::warn!("❌ Error fetching data: {}", e);

                    if failures >= max_retries {
                        tracing::error!(
                            "🛑 Max retries ({}) reached for {}, stopping pagination",
                            max_retries,
                            url
                        );
                        return Err(StopReason::RetriesExhausted);
                    }

                    let wait = self.policy.backoff(failures);
                    tracing::info!(
                        "🔁 Retrying in {} seconds... (Attempt {}/{})",
                        wait.as_secs(),
                        failures,
                        max_retries
                    );
                    self.sleeper.sleep(wait).await;
                }
                Err(AttemptError::Malformed(e)) => {
                    tracing::error!("❌ Error parsing JSON response from {}: {}", url, e);
                    return Err(StopReason::MalformedBody);
                }
            }
        }
    }
}

/// Cursor over the page chain. Yields pages until the chain ends or a page fails.
pub struct Paginator<'a, Z: Sleeper> {
    fetcher: &'a PageFetcher<Z>,
    next: Option<Url>,
    pages_fetched: usize,
    stop: Option<StopReason>,
}

impl<Z: Sleeper> Paginator<'_, Z> {
    pub async fn next_page(&mut self) -> Option<Page> {
        let url = self.next.take()?;

        if self.pages_fetched > 0 {
            self.fetcher
                .sleeper
                .sleep(self.fetcher.policy.page_delay())
                .await;
        }

        tracing::info!("📄 Fetching page {}: {}", self.pages_fetched + 1, url);

        let page = match self.fetcher.fetch_body(&url).await {
            Ok(body) => parse_page(body, &url),
            Err(reason) => Err(reason),
        };

        match page {
            Ok(page) => {
                self.pages_fetched += 1;
                self.next = page.next.clone();
                if self.next.is_none() {
                    self.stop = Some(StopReason::Completed);
                }
                Some(page)
            }
            Err(reason) => {
                self.stop = Some(reason);
                None
            }
        }
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// `None` while more pages may follow.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop
    }

    pub async fn collect_records(mut self) -> FetchOutcome {
        let mut records = Vec::new();

        while let Some(page) = self.next_page().await {
            tracing::info!("  Found {} records on this page", page.records.len());
            records.extend(page.records);
        }

        tracing::info!("📊 Number of records fetched: {}", records.len());
        FetchOutcome {
            records,
            pages: self.pages_fetched,
            stop: self.stop.unwrap_or(StopReason::Completed),
        }
    }
}

fn retry_after(headers: &HeaderMap, fallback: Duration) -> Duration {
    let Some(value) = headers.get(RETRY_AFTER) else {
        return fallback;
    };

    match value.to_str().ok().and_then(|v| v.trim().parse::<u64>().ok()) {
        Some(seconds) => Duration::from_secs(seconds),
        None => {
            tracing::warn!(
                "⚠️ Unusable Retry-After header {:?}, waiting {} seconds",
                value,
                fallback.as_secs()
            );
            fallback
        }
    }
}

fn parse_page(body: Value, current: &Url) -> std::result::Result<Page, StopReason> {
    let Value::Object(mut body) = body else {
        tracing::error!("❌ Response from {} is not a JSON object", current);
        return Err(StopReason::MalformedBody);
    };

    let records = match body.remove("results") {
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match item {
                Value::Object(data) => Some(Record::new(data)),
                other => {
                    tracing::warn!("⚠️ Skipping non-object result {}: {}", index, other);
                    None
                }
            })
            .collect(),
        _ => {
            tracing::warn!("⚠️ No results found on this page or unexpected format");
            Vec::new()
        }
    };

    let next = match body.get("next") {
        None | Some(Value::Null) => None,
        Some(Value::String(link)) if link.is_empty() => None,
        Some(Value::String(link)) => match current.join(link) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!("⚠️ Cannot resolve next link '{}': {}", link, e);
                None
            }
        },
        Some(other) => {
            tracing::warn!("⚠️ Ignoring non-string next link: {}", other);
            None
        }
    };

    Ok(Page { records, next })
}
