//! Deployment config fetcher over HTTP.

use idconsole_ports::{BoxFuture, DeploymentConfigPort, DeploymentConfigResponse};
use idconsole_shared::{ErrorClass, ErrorCode, ErrorEnvelope, Result, redact_url_credentials};
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use std::time::Duration;
use url::Url;

/// Settings for [`HttpDeploymentConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpDeploymentConfigSettings {
    /// Absolute URL of the deployment document.
    pub document_url: Url,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

/// Fetches the deployment document with a plain unauthenticated GET.
#[derive(Debug, Clone)]
pub struct HttpDeploymentConfig {
    client: reqwest::Client,
    document_url: Url,
}

impl HttpDeploymentConfig {
    /// Build the fetcher.
    pub fn new(settings: HttpDeploymentConfigSettings) -> Result<Self> {
        if settings.timeout_ms == 0 {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "timeout must be greater than zero",
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|error| {
                ErrorEnvelope::unexpected(
                    ErrorCode::new("deployment", "client_init_failed"),
                    format!("failed to build deployment config client: {error}"),
                    ErrorClass::NonRetriable,
                )
            })?;

        Ok(Self {
            client,
            document_url: settings.document_url,
        })
    }

    /// URL this fetcher requests.
    #[must_use]
    pub const fn document_url(&self) -> &Url {
        &self.document_url
    }

    async fn fetch_once(&self) -> Result<DeploymentConfigResponse> {
        let response = self
            .client
            .get(self.document_url.clone())
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .map_err(|error| map_reqwest_error(&error, &self.document_url))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|error| map_reqwest_error(&error, &self.document_url))?;

        Ok(DeploymentConfigResponse { status, body })
    }
}

impl DeploymentConfigPort for HttpDeploymentConfig {
    fn fetch(&self) -> BoxFuture<'_, Result<DeploymentConfigResponse>> {
        Box::pin(self.fetch_once())
    }
}

fn map_reqwest_error(error: &reqwest::Error, url: &Url) -> ErrorEnvelope {
    let url = redact_url_credentials(url.as_str());
    if error.is_timeout() {
        return ErrorEnvelope::unexpected(
            ErrorCode::timeout(),
            "deployment config request timed out",
            ErrorClass::Retriable,
        )
        .with_metadata("url", url);
    }
    if error.is_connect() {
        return ErrorEnvelope::unexpected(
            ErrorCode::io(),
            format!("deployment config connection failed: {error}"),
            ErrorClass::Retriable,
        )
        .with_metadata("url", url);
    }
    ErrorEnvelope::unexpected(
        ErrorCode::new("deployment", "request_failed"),
        format!("deployment config request failed: {error}"),
        ErrorClass::NonRetriable,
    )
    .with_metadata("url", url)
}
