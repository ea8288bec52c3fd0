//! HTTP client for the panel aggregation endpoint.
//!
//! One POST per request; the endpoint fans the prompt out to every
//! provider and answers with a JSON object keyed by agent id.

use crate::config::ApiConfig;
use crate::error::{PanelError, PanelResult};
use crate::models::{ApiStatus, PanelRequest, PanelResponse};
use reqwest::header::ACCEPT;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Client for the aggregation endpoint.
#[derive(Debug, Clone)]
pub struct PanelClient {
    http_client: reqwest::Client,
    url: String,
}

impl PanelClient {
    /// Build a client for the configured endpoint.
    pub fn new(config: &ApiConfig) -> PanelResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        Ok(Self {
            http_client: builder.build()?,
            url: config.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST the request and decode the per-agent answers.
    pub async fn send(&self, request: &PanelRequest) -> PanelResult<PanelResponse> {
        debug!(url = %self.url, ?request, "Sending panel request");

        let response = self
            .http_client
            .post(&self.url)
            .header(ACCEPT, "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Panel request failed");
                PanelError::Transport(e)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(status = status.as_u16(), "Panel endpoint returned an error");
            return Err(PanelError::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let result: PanelResponse = response
            .json()
            .await
            .map_err(|e| PanelError::Decode(e.to_string()))?;

        if result.is_empty() {
            warn!("Panel endpoint answered without any agent responses");
        }
        info!(responses = result.len(), "Panel request succeeded");
        Ok(result)
    }

    /// Probe the endpoint with a throwaway prompt.
    pub async fn test_connection(&self) -> ApiStatus {
        info!(url = %self.url, "Testing API connection");
        let probe = PanelRequest::new("", None, "test");

        let outcome = self
            .http_client
            .post(&self.url)
            .header(ACCEPT, "application/json")
            .json(&probe)
            .send()
            .await;

        match outcome {
            Ok(response) if response.status().is_success() => {
                info!("API is accessible");
                ApiStatus::Working
            }
            Ok(response) => {
                let message = format!("HTTP {}", response.status().as_u16());
                warn!("API test failed: {}", message);
                ApiStatus::CorsError(Some(message))
            }
            Err(e) if e.is_connect() => {
                warn!("API unreachable: {}", e);
                ApiStatus::CorsError(None)
            }
            Err(e) => {
                warn!("API test failed: {}", e);
                ApiStatus::CorsError(Some(e.to_string()))
            }
        }
    }
}
