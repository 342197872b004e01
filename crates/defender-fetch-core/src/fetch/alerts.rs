//! Alerts API query

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{AccessToken, TimeRange, TimeWindow};

/// Queries the alerts API for alerts created inside a time window
#[derive(Debug, Clone)]
pub struct AlertFetcher {
    client: Client,
    alerts_url: Url,
    time_range: TimeRange,
}

impl AlertFetcher {
    /// Create a fetcher reading from `{api_base}/api/alerts`
    pub fn new(client: Client, api_base: &Url, time_range: TimeRange) -> Result<Self> {
        let mut alerts_url = api_base.clone();
        alerts_url
            .path_segments_mut()
            .map_err(|()| Error::config(format!("api '{api_base}' is not a base URL")))?
            .pop_if_empty()
            .extend(["api", "alerts"]);

        Ok(Self {
            client,
            alerts_url,
            time_range,
        })
    }

    /// Create a fetcher from the run configuration
    pub fn from_config(client: Client, config: &Config) -> Result<Self> {
        let time_range = TimeRange::parse(&config.timerange)?;
        Self::new(client, &config.endpoints.api_url()?, time_range)
    }

    /// Configured time range
    pub fn time_range(&self) -> TimeRange {
        self.time_range
    }

    /// Alerts endpoint, without query
    pub fn alerts_url(&self) -> &Url {
        &self.alerts_url
    }

    /// Fetch alerts created since `now + time_range`
    pub async fn fetch(&self, token: &AccessToken) -> Result<String> {
        let window = TimeWindow::from_now(self.time_range)?;
        self.fetch_since(token, &window).await
    }

    /// Fetch alerts created at or after `window.start`, returning the raw body
    pub async fn fetch_since(&self, token: &AccessToken, window: &TimeWindow) -> Result<String> {
        if token.is_blank() {
            return Err(Error::TokenRequest("refusing to query alerts with an empty token".to_string()));
        }

        info!("Fetching alerts after {window}");

        let filter = window.filter();
        let response = self
            .client
            .get(self.alerts_url.clone())
            .query(&[("$expand", "evidence"), ("$filter", filter.as_str())])
            .header(AUTHORIZATION, token.bearer())
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| Error::Api(e.to_string()))?;

        let status = response.status();

        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = %status, "Alerts API rejected the request: {body}");
            return Err(Error::ApiClient { status, body });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!("alerts API returned {status}: {body}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Api(e.to_string()))?;

        debug!(bytes = body.len(), "Alerts response: {body}");
        Ok(body)
    }
}
