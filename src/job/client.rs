//! HTTP client for the remote price-search service

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RepricerError, RepricerResult};
use crate::types::{JobStatus, PriceSearchItem, PriceSearchResult, StartJobResponse};

/// Transport seam for the price-search service.
///
/// The coordinator only sees this trait; tests substitute a scripted stub.
#[async_trait]
pub trait PriceSearchApi: Send + Sync {
    /// Submit the full product list; returns the opaque job id.
    async fn start_job(&self, items: &[PriceSearchItem]) -> RepricerResult<String>;

    /// Fetch the current status of a job.
    async fn job_status(&self, job_id: &str) -> RepricerResult<JobStatus>;

    /// Best-effort server-side cancellation of a job.
    async fn stop_job(&self, job_id: &str) -> RepricerResult<()>;

    /// Degraded one-shot mode: submit and wait for the full result set in a
    /// single response, under a hard timeout.
    async fn search_prices(&self, items: &[PriceSearchItem])
        -> RepricerResult<Vec<PriceSearchResult>>;
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    items: &'a [PriceSearchItem],
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<PriceSearchResult>,
    #[serde(default, rename = "totalProcessed")]
    total_processed: u64,
}

/// reqwest-backed implementation of [`PriceSearchApi`].
pub struct HttpPriceSearchClient {
    http: reqwest::Client,
    base_url: String,
    /// Hard timeout for the synchronous one-shot variant.
    sync_timeout: Duration,
}

impl HttpPriceSearchClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            sync_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_sync_timeout(mut self, timeout: Duration) -> Self {
        self.sync_timeout = timeout;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn error_body(response: reqwest::Response) -> String {
        let status = response.status();
        match response.text().await {
            Ok(body) if !body.is_empty() => format!("server error: {} {}", status.as_u16(), body),
            _ => format!("server error: {}", status.as_u16()),
        }
    }
}

#[async_trait]
impl PriceSearchApi for HttpPriceSearchClient {
    async fn start_job(&self, items: &[PriceSearchItem]) -> RepricerResult<String> {
        let url = self.endpoint("/price-jobs/");
        let response = self
            .http
            .post(&url)
            .json(&SearchRequest { items })
            .send()
            .await
            .map_err(|e| RepricerError::JobSubmit(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RepricerError::JobSubmit(Self::error_body(response).await));
        }

        let body: StartJobResponse = response
            .json()
            .await
            .map_err(|e| RepricerError::JobSubmit(format!("bad job-start response: {}", e)))?;
        debug!(job_id = %body.job_id, items = items.len(), "price-search job started");
        Ok(body.job_id)
    }

    async fn job_status(&self, job_id: &str) -> RepricerResult<JobStatus> {
        let url = self.endpoint(&format!("/price-jobs/{}/", job_id));
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| RepricerError::PollTransport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RepricerError::PollTransport(Self::error_body(response).await));
        }

        response
            .json::<JobStatus>()
            .await
            .map_err(|e| RepricerError::PollTransport(format!("bad status body: {}", e)))
    }

    async fn stop_job(&self, job_id: &str) -> RepricerResult<()> {
        let url = self.endpoint(&format!("/price-jobs/{}/stop/", job_id));
        let response = self
            .http
            .post(&url)
            .send()
            .await
            .map_err(|e| RepricerError::PollTransport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RepricerError::PollTransport(Self::error_body(response).await));
        }
        Ok(())
    }

    async fn search_prices(
        &self,
        items: &[PriceSearchItem],
    ) -> RepricerResult<Vec<PriceSearchResult>> {
        let url = self.endpoint("/search-prices/");
        let response = self
            .http
            .post(&url)
            .json(&SearchRequest { items })
            .timeout(self.sync_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RepricerError::JobSubmit("price search timed out".to_string())
                } else {
                    RepricerError::JobSubmit(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(RepricerError::JobSubmit(Self::error_body(response).await));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| RepricerError::JobSubmit(format!("bad search response: {}", e)))?;
        debug!(
            results = body.results.len(),
            total_processed = body.total_processed,
            "one-shot price search finished"
        );
        Ok(body.results)
    }
}
