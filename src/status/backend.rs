use super::types::{ActionResponse, ErrorBody, StatusResponse, TriggerRequest};
use crate::config::ApiConfig;
use crate::error::{Result, SitegateError};
use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::{debug, warn};

/// Remote source of truth for the site status
#[async_trait]
pub trait StatusBackend: Send + Sync {
    /// `GET /shutdown/status`
    async fn fetch_status(&self) -> Result<StatusResponse>;

    /// `POST /shutdown/trigger`
    async fn trigger_shutdown(&self, maintenance_message: &str) -> Result<ActionResponse>;

    /// `POST /shutdown/restart`
    async fn restart(&self) -> Result<ActionResponse>;
}

/// Status backend talking to the institute REST API over HTTP
pub struct HttpStatusBackend {
    client: Client,
    base_url: String,
}

impl HttpStatusBackend {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl StatusBackend for HttpStatusBackend {
    async fn fetch_status(&self) -> Result<StatusResponse> {
        let url = self.endpoint("/shutdown/status");
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.json::<StatusResponse>().await?)
    }

    async fn trigger_shutdown(&self, maintenance_message: &str) -> Result<ActionResponse> {
        let url = self.endpoint("/shutdown/trigger");
        debug!("POST {}", url);

        let body = TriggerRequest {
            maintenance_message: maintenance_message.to_string(),
        };
        let response = self.client.post(&url).json(&body).send().await?;
        action_result(response).await
    }

    async fn restart(&self) -> Result<ActionResponse> {
        let url = self.endpoint("/shutdown/restart");
        debug!("POST {}", url);

        let response = self.client.post(&url).send().await?;
        action_result(response).await
    }
}

/// Turn a non-2xx response into [`SitegateError::Remote`], using the API's
/// `error`/`message` text when it sent one.
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|parsed| parsed.text().map(str::to_string))
        .unwrap_or_else(|| format!("Status API returned {}", status));

    warn!("Status API request failed with {}: {}", status, message);
    Err(SitegateError::remote(status.as_u16(), message))
}

async fn action_result(response: Response) -> Result<ActionResponse> {
    let response = ensure_success(response).await?;
    let status = response.status().as_u16();
    let action = response.json::<ActionResponse>().await?;

    if !action.success {
        let message = if action.message.is_empty() {
            "Status API reported failure".to_string()
        } else {
            action.message
        };
        return Err(SitegateError::remote(status, message));
    }

    Ok(action)
}
