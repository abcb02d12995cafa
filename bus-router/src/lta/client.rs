//! LTA DataMall HTTP client.
//!
//! Provides async methods for the bulk network datasets and for live bus
//! arrivals. Handles authentication, pagination and concurrency limits.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::domain::{Segment, Service, Stop, StopArrivals, StopCode};

use super::NetworkSource;
use super::convert::{convert_all, convert_arrivals, convert_service, convert_stop, derive_segments};
use super::error::LtaError;
use super::types::{BusArrivalResponse, BusRouteRecord, BusServiceRecord, BusStopRecord, Page};

/// Default base URL for the DataMall API.
const DEFAULT_BASE_URL: &str = "http://datamall2.mytransport.sg/ltaodataservice";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Rows per page of a bulk dataset.
pub const PAGE_SIZE: usize = 500;

/// Configuration for the LTA client.
#[derive(Debug, Clone)]
pub struct LtaConfig {
    /// DataMall account key
    pub api_key: String,
    /// Base URL for the API (defaults to production DataMall)
    pub base_url: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl LtaConfig {
    /// Create a new config with the given account key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 30,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// LTA DataMall API client.
///
/// Uses a semaphore to limit concurrent requests and avoid rate limiting.
#[derive(Debug, Clone)]
pub struct LtaClient {
    http: reqwest::Client,
    base_url: String,
    semaphore: Arc<Semaphore>,
}

impl LtaClient {
    /// Create a new LTA client with the given configuration.
    pub fn new(config: LtaConfig) -> Result<Self, LtaError> {
        let mut headers = HeaderMap::new();

        let api_key = HeaderValue::from_str(&config.api_key).map_err(|_| LtaError::ApiError {
            status: 0,
            message: "Invalid account key format".to_string(),
        })?;
        headers.insert("AccountKey", api_key);
        headers.insert("accept", HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        dataset: &str,
        query: &[(&str, String)],
    ) -> Result<T, LtaError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| LtaError::ApiError {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        let url = format!("{}/{}", self.base_url, dataset);
        let response = self.http.get(&url).query(query).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(LtaError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LtaError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LtaError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| LtaError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })
    }

    /// Fetch every row of a bulk dataset.
    ///
    /// DataMall serves at most [`PAGE_SIZE`] rows per request; pages are
    /// requested with an increasing `$skip` until one comes back empty.
    pub async fn fetch_paged<T: DeserializeOwned>(&self, dataset: &str) -> Result<Vec<T>, LtaError> {
        let mut rows = Vec::new();
        let mut skip = 0;

        loop {
            let page: Page<T> = self.get_json(dataset, &[("$skip", skip.to_string())]).await?;
            if page.value.is_empty() {
                break;
            }
            rows.extend(page.value);
            skip += PAGE_SIZE;
            debug!(dataset, rows = rows.len(), "fetched page");
        }

        Ok(rows)
    }

    /// Live arrivals at a stop.
    pub async fn get_arrivals(&self, stop: &StopCode) -> Result<StopArrivals, LtaError> {
        let response: BusArrivalResponse = self
            .get_json("BusArrivalv2", &[("BusStopCode", stop.as_str().to_string())])
            .await?;

        convert_arrivals(stop, &response).map_err(|e| LtaError::InvalidRecord(e.to_string()))
    }
}

impl NetworkSource for LtaClient {
    async fn fetch_all_stops(&self) -> Result<Vec<Stop>, LtaError> {
        let records: Vec<BusStopRecord> = self.fetch_paged("BusStops").await?;
        Ok(convert_all("BusStops", &records, convert_stop))
    }

    async fn fetch_all_services(&self) -> Result<Vec<Service>, LtaError> {
        let records: Vec<BusServiceRecord> = self.fetch_paged("BusServices").await?;
        Ok(convert_all("BusServices", &records, convert_service))
    }

    async fn fetch_all_segments(
        &self,
        normal_speed: f64,
        express_speed: f64,
    ) -> Result<Vec<Segment>, LtaError> {
        let records: Vec<BusRouteRecord> = self.fetch_paged("BusRoutes").await?;
        Ok(derive_segments(&records, normal_speed, express_speed))
    }
}
