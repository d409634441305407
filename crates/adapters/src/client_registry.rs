//! Lazily built HTTP clients bound to the active profile's endpoints.

use crate::headers::pagination_from_headers;
use idconsole_domain::PaginationMeta;
use idconsole_ports::{ApiKind, ClientRegistryPort, ProfileEndpoints};
use idconsole_shared::{ErrorClass, ErrorCode, ErrorEnvelope, Result, redact_url_credentials};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use url::Url;

/// Query parameters of a paginated list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    /// Token from a previous page's `Link` header.
    pub page_token: Option<String>,
    /// Requested page size.
    pub page_size: Option<u32>,
}

/// One page of a list response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiPage {
    /// HTTP status code.
    pub status: u16,
    /// Decoded JSON body (`Null` when the body is empty).
    pub body: Value,
    /// Tokens and total count from the response headers.
    pub pagination: PaginationMeta,
}

/// A client bound to one API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    kind: ApiKind,
    base_url: Url,
    http: reqwest::Client,
}

impl ApiClient {
    /// Which API this client talks to.
    #[must_use]
    pub const fn kind(&self) -> ApiKind {
        self.kind
    }

    /// Base URL the client is bound to.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// GET `path` relative to the base URL and decode one page.
    pub async fn get_page(&self, path: &str, query: &PageQuery) -> Result<ApiPage> {
        let mut url = self.base_url.join(path.trim_start_matches('/')).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("client", "invalid_path"),
                format!("invalid request path: {error}"),
            )
            .with_metadata("path", path)
        })?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(token) = &query.page_token {
                pairs.append_pair("page_token", token);
            }
            if let Some(size) = query.page_size {
                pairs.append_pair("page_size", &size.to_string());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|error| map_reqwest_error(&error, self.kind))?;
        let status = response.status().as_u16();
        let pagination = pagination_from_headers(response.headers());
        let bytes = response
            .bytes()
            .await
            .map_err(|error| map_reqwest_error(&error, self.kind))?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(|error| {
                ErrorEnvelope::unexpected(
                    ErrorCode::new("client", "invalid_response"),
                    format!("{} API returned invalid JSON: {error}", self.kind),
                    ErrorClass::NonRetriable,
                )
            })?
        };

        Ok(ApiPage {
            status,
            body,
            pagination,
        })
    }
}

/// Registry of per-API clients, rebuilt after every `reset`.
#[derive(Debug)]
pub struct HttpClientRegistry {
    timeout: Duration,
    clients: Mutex<HashMap<ApiKind, ApiClient>>,
    resets: AtomicU64,
}

impl HttpClientRegistry {
    /// Create an empty registry whose clients use `timeout_ms`.
    #[must_use]
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            timeout: Duration::from_millis(timeout_ms),
            clients: Mutex::new(HashMap::new()),
            resets: AtomicU64::new(0),
        }
    }

    /// Client for `kind` bound to the matching base URL of `endpoints`.
    ///
    /// A cached client bound to a different base URL is replaced.
    pub fn client_for(&self, kind: ApiKind, endpoints: &ProfileEndpoints) -> Result<ApiClient> {
        let raw = match kind {
            ApiKind::Admin => endpoints.admin_base_url.as_str(),
            ApiKind::Public => endpoints.public_base_url.as_str(),
        };
        let base_url = parse_base_url(raw)?;

        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = clients.get(&kind).filter(|client| client.base_url == base_url) {
            return Ok(client.clone());
        }

        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|error| {
                ErrorEnvelope::unexpected(
                    ErrorCode::new("client", "init_failed"),
                    format!("failed to build {kind} API client: {error}"),
                    ErrorClass::NonRetriable,
                )
            })?;
        let client = ApiClient {
            kind,
            base_url,
            http,
        };
        clients.insert(kind, client.clone());
        Ok(client)
    }

    /// Number of clients currently cached.
    #[must_use]
    pub fn cached_clients(&self) -> usize {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of resets since construction.
    #[must_use]
    pub fn reset_count(&self) -> u64 {
        self.resets.load(Ordering::SeqCst)
    }
}

impl ClientRegistryPort for HttpClientRegistry {
    fn reset(&self) {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

// `Url::join` replaces the last path segment unless the base ends with `/`.
fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_owned()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("client", "invalid_base_url"),
            format!("invalid API base URL: {error}"),
        )
        .with_metadata("url", redact_url_credentials(trimmed))
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ErrorEnvelope::expected(
            ErrorCode::new("client", "invalid_base_url"),
            "API base URL must use http or https",
        )
        .with_metadata("url", redact_url_credentials(trimmed)));
    }
    Ok(url)
}

fn map_reqwest_error(error: &reqwest::Error, kind: ApiKind) -> ErrorEnvelope {
    if error.is_timeout() {
        return ErrorEnvelope::unexpected(
            ErrorCode::timeout(),
            format!("{kind} API request timed out"),
            ErrorClass::Retriable,
        );
    }
    if error.is_connect() {
        return ErrorEnvelope::unexpected(
            ErrorCode::io(),
            format!("{kind} API connection failed: {error}"),
            ErrorClass::Retriable,
        );
    }
    ErrorEnvelope::unexpected(
        ErrorCode::new("client", "request_failed"),
        format!("{kind} API request failed: {error}"),
        ErrorClass::NonRetriable,
    )
}
