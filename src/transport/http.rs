use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};
use uuid::Uuid;

use super::{ApiRequest, ApiResponse, RequestBody, Transport, TransportError};
use crate::config::ClientConfig;
use crate::constants::{REQUEST_ID_HEADER, TOKEN_KEY};
use crate::credentials::CredentialStore;

/// reqwest-backed transport. Attaches the stored bearer token to every
/// request; a missing or empty token sends the request anonymously.
pub struct HttpTransport {
    http: reqwest::Client,
    config: ClientConfig,
    credentials: Arc<dyn CredentialStore>,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("api_url", &self.config.api_url)
            .field("timeout", &self.config.request_timeout)
            .finish()
    }
}

impl HttpTransport {
    pub fn new(
        config: ClientConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            config,
            credentials,
        })
    }

    fn url_for(&self, request: &ApiRequest) -> Result<reqwest::Url, TransportError> {
        let endpoint = self.config.endpoint(&request.path);
        let mut url = reqwest::Url::parse(&endpoint)
            .map_err(|e| TransportError::Other(format!("Invalid URL '{endpoint}': {e}")))?;

        if !request.segments.is_empty() {
            url.path_segments_mut()
                .map_err(|_| TransportError::Other(format!("'{endpoint}' cannot take path segments")))?
                .pop_if_empty()
                .extend(&request.segments);
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.url_for(&request)?;
        let request_id = Uuid::new_v4().to_string();

        let mut builder = self
            .http
            .request(request.method.clone(), url.clone())
            .header(REQUEST_ID_HEADER, &request_id);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(fields) => builder.form(fields),
        };

        if let Some(token) = self.credentials.get(TOKEN_KEY).filter(|t| !t.is_empty()) {
            builder = builder.bearer_auth(token);
        }

        debug!(
            method = %request.method,
            url = %url,
            request_id = %request_id,
            "➡️ Sending request"
        );

        let response = builder.send().await.map_err(|e| {
            error!(url = %url, request_id = %request_id, "❌ Transport failure: {e}");
            TransportError::Request(e)
        })?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!(status, request_id = %request_id, "⬅️ Response received");
        Ok(ApiResponse { status, body })
    }
}
