use crate::api::error::{ApiError, Result};
use crate::api::query::build_query;
use crate::config::AppConfig;
use crate::domain::{FilterOptions, FilterState};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use url::Url;

const OPTIONS_PATH: &str = "/stats/available-options";
const GENERAL_PATH: &str = "/stats/general";
const REGIONS_PATH: &str = "/stats/regions";
const TIME_SERIES_PATH: &str = "/stats/time-series";
const TOP_EMITTERS_PATH: &str = "/stats/top-emitters";
const CATEGORIES_PATH: &str = "/stats/categories";
const REGION_CATEGORY_PATH: &str = "/stats/region-category";
const HEALTH_PATH: &str = "/health";

/// Ranking parameters for the top-emitters resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopEmittersParams {
    pub n: usize,
    pub by: String,
}

impl Default for TopEmittersParams {
    fn default() -> Self {
        Self {
            n: 10,
            by: "REGION".to_string(),
        }
    }
}

/// `/health` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub data_loaded: bool,
    #[serde(default)]
    pub model_loaded: bool,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// Typed fetch operations against the statistics service.
///
/// Every call is an independent GET; the client keeps no state between
/// requests and never retries. Payloads come back as raw JSON because field
/// names differ between endpoints and service versions, see
/// [`crate::normalize`].
#[derive(Debug, Clone)]
pub struct StatsClient {
    http: reqwest::Client,
    base_url: Url,
    fallback_years: Vec<i32>,
}

impl StatsClient {
    pub fn new(base_url: &str, timeout: Duration, fallback_years: Vec<i32>) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("co2-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            fallback_years,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            &config.api_base_url,
            config.request_timeout,
            config.fallback_years.clone(),
        )
    }

    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Filter selector values.
    ///
    /// Never fails: while the service is missing or still loading its data
    /// the dashboard must stay usable, so any failure degrades to the
    /// configured fallback years with empty region and category sets.
    pub async fn available_options(&self) -> FilterOptions {
        let options = self.get_json(OPTIONS_PATH, "").await.and_then(|payload| {
            serde_json::from_value::<FilterOptions>(payload).map_err(|source| ApiError::Decode {
                url: OPTIONS_PATH.to_string(),
                source,
            })
        });

        match options {
            Ok(options) => options,
            Err(err) => {
                tracing::warn!(error = %err, "filter options unavailable, using fallback");
                FilterOptions::fallback(&self.fallback_years)
            }
        }
    }

    pub async fn general_stats(&self, filters: Option<&FilterState>) -> Result<Value> {
        self.get_json(GENERAL_PATH, &build_query(filters, &[])).await
    }

    pub async fn region_stats(&self, filters: Option<&FilterState>) -> Result<Value> {
        let query = build_query(filters, &[("by", "REGION".to_string())]);
        self.get_json(REGIONS_PATH, &query).await
    }

    pub async fn time_series(&self, filters: Option<&FilterState>) -> Result<Value> {
        self.get_json(TIME_SERIES_PATH, &build_query(filters, &[]))
            .await
    }

    pub async fn top_emitters(
        &self,
        filters: Option<&FilterState>,
        params: &TopEmittersParams,
    ) -> Result<Value> {
        let query = build_query(
            filters,
            &[("n", params.n.to_string()), ("by", params.by.clone())],
        );
        self.get_json(TOP_EMITTERS_PATH, &query).await
    }

    pub async fn category_stats(&self, filters: Option<&FilterState>) -> Result<Value> {
        self.get_json(CATEGORIES_PATH, &build_query(filters, &[]))
            .await
    }

    pub async fn region_category_stats(&self, filters: Option<&FilterState>) -> Result<Value> {
        self.get_json(REGION_CATEGORY_PATH, &build_query(filters, &[]))
            .await
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        let payload = self.get_json(HEALTH_PATH, "").await?;
        serde_json::from_value(payload).map_err(|source| ApiError::Decode {
            url: HEALTH_PATH.to_string(),
            source,
        })
    }

    fn endpoint(&self, path: &str, query: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}{query}"))?)
    }

    async fn get_json(&self, path: &str, query: &str) -> Result<Value> {
        let url = self.endpoint(path, query)?;
        tracing::debug!(%url, "GET");

        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%url, %status, "request rejected");
            return Err(ApiError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }
}
