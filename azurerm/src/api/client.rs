use reqwest::header::{HeaderMap, AUTHORIZATION, RETRY_AFTER};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tfsdk::Completion;

use super::auth::TokenCredential;
use super::common::{ApiQueryParams, ArmErrorResponse, ListResponse};
use super::error::ApiError;
use super::lro;
use super::pool::{ConnectionPoolConfig, ConnectionStats, RequestCounters, RequestOutcome};

const CLIENT_REQUEST_ID: &str = "x-ms-client-request-id";

/// Azure Resource Manager API client
#[derive(Clone)]
pub struct ArmClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    credential: TokenCredential,
    retry_config: RetryConfig,
    counters: RequestCounters,
}

#[derive(Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub timeout_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
            timeout_seconds: 30,
        }
    }
}

/// A successful response, kept raw so long-running operation headers can be inspected.
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// `Retry-After` in seconds, if the server sent one.
    pub fn retry_after(&self) -> Option<Duration> {
        self.header(RETRY_AFTER.as_str())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body).map_err(|e| {
            tracing::error!("Failed to deserialize response: {}, body: {}", e, self.body);
            ApiError::ParseError(format!("Failed to parse response: {}", e))
        })
    }

    /// The body as JSON, `Null` when empty or not JSON.
    pub fn value(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

impl ArmClient {
    /// Create a new API client with default configuration
    pub fn new(endpoint: &str, credential: TokenCredential) -> Result<Self, ApiError> {
        Self::with_config(endpoint, credential, RetryConfig::default())
    }

    /// Create a new API client with custom retry configuration
    pub fn with_config(
        endpoint: &str,
        credential: TokenCredential,
        retry_config: RetryConfig,
    ) -> Result<Self, ApiError> {
        let pool_config = ConnectionPoolConfig {
            request_timeout: Duration::from_secs(retry_config.timeout_seconds),
            ..Default::default()
        };

        let http_client = pool_config.build_client()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url: endpoint.trim_end_matches('/').to_string(),
                credential,
                retry_config,
                counters: RequestCounters::default(),
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn url(&self, path: &str, params: &ApiQueryParams) -> String {
        format!("{}{}{}", self.inner.base_url, path, params.to_query_string())
    }

    /// GET a resource.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, api_version: &str) -> Result<T, ApiError> {
        let url = self.url(path, &ApiQueryParams::api_version(api_version));
        self.send(Method::GET, &url, None).await?.json()
    }

    /// GET an absolute URL, e.g. an operation status or a `nextLink`.
    pub async fn get_url(&self, url: &str) -> Result<RawResponse, ApiError> {
        self.send(Method::GET, url, None).await
    }

    /// GET every page of a collection, optionally filtered server side.
    pub async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        api_version: &str,
        filter: Option<&str>,
    ) -> Result<Vec<T>, ApiError> {
        let params = ApiQueryParams::api_version(api_version).add_optional("$filter", filter);
        let mut next = Some(self.url(path, &params));
        let mut items = Vec::new();

        while let Some(url) = next.take() {
            let page: ListResponse<T> = self.send(Method::GET, &url, None).await?.json()?;
            items.extend(page.value);
            next = page.next_link.filter(|link| !link.is_empty());
        }

        Ok(items)
    }

    /// PUT a resource. Long-running creates complete through the returned [`Completion`].
    pub async fn put<B: Serialize>(
        &self,
        path: &str,
        api_version: &str,
        body: &B,
    ) -> Result<Completion, ApiError> {
        let url = self.url(path, &ApiQueryParams::api_version(api_version));
        let response = self.send(Method::PUT, &url, Some(to_json(body)?)).await?;
        Ok(lro::write_completion(self, &response, &url))
    }

    /// PATCH a resource with a partial body.
    pub async fn patch<B: Serialize>(
        &self,
        path: &str,
        api_version: &str,
        body: &B,
    ) -> Result<Completion, ApiError> {
        let url = self.url(path, &ApiQueryParams::api_version(api_version));
        let response = self.send(Method::PATCH, &url, Some(to_json(body)?)).await?;
        Ok(lro::write_completion(self, &response, &url))
    }

    /// DELETE a resource. Not found is reported as [`ApiError::NotFound`].
    pub async fn delete(&self, path: &str, api_version: &str) -> Result<Completion, ApiError> {
        let url = self.url(path, &ApiQueryParams::api_version(api_version));
        let response = self.send(Method::DELETE, &url, None).await?;
        Ok(lro::delete_completion(self, &response))
    }

    /// Attempts made by this client and its clones so far.
    pub fn connection_stats(&self) -> ConnectionStats {
        self.inner.counters.snapshot()
    }

    /// Web API operations
    pub fn web(&self) -> crate::api::web::WebApi<'_> {
        crate::api::web::WebApi::new(self)
    }

    /// Dynatrace.Observability API operations
    pub fn dynatrace(&self) -> crate::api::dynatrace::DynatraceApi<'_> {
        crate::api::dynatrace::DynatraceApi::new(self)
    }

    /// Microsoft.KubernetesConfiguration API operations
    pub fn kubernetes_configuration(
        &self,
    ) -> crate::api::kubernetes_configuration::KubernetesConfigurationApi<'_> {
        crate::api::kubernetes_configuration::KubernetesConfigurationApi::new(self)
    }

    /// Microsoft.Network API operations
    pub fn network(&self) -> crate::api::network::NetworkApi<'_> {
        crate::api::network::NetworkApi::new(self)
    }

    /// Microsoft.ServiceLinker API operations
    pub fn service_linker(&self) -> crate::api::service_linker::ServiceLinkerApi<'_> {
        crate::api::service_linker::ServiceLinkerApi::new(self)
    }

    /// Microsoft.DevOpsInfrastructure API operations
    pub fn devops_infrastructure(
        &self,
    ) -> crate::api::devops_infrastructure::DevOpsInfrastructureApi<'_> {
        crate::api::devops_infrastructure::DevOpsInfrastructureApi::new(self)
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> Result<RawResponse, ApiError> {
        let auth_header = format!(
            "Bearer {}",
            self.inner.credential.token(&self.inner.http_client).await?
        );

        self.execute_with_retry(
            || {
                let request_id = uuid::Uuid::new_v4().to_string();
                tracing::debug!(method = %method, url = %url, request_id = %request_id, "sending ARM request");

                let mut request = self
                    .inner
                    .http_client
                    .request(method.clone(), url)
                    .header(AUTHORIZATION, &auth_header)
                    .header(CLIENT_REQUEST_ID, request_id);
                if let Some(body) = &body {
                    request = request.json(body);
                }
                request.send()
            },
            url,
        )
        .await
    }

    /// Execute request with retry logic
    async fn execute_with_retry<F, Fut>(&self, request_fn: F, url: &str) -> Result<RawResponse, ApiError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
    {
        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= self.inner.retry_config.max_retries {
            if attempt > 0 {
                let backoff = std::cmp::min(
                    self.inner.retry_config.initial_backoff_ms * (2_u64.pow(attempt - 1)),
                    self.inner.retry_config.max_backoff_ms,
                );
                self.inner.counters.record_retry();
                let stats = self.inner.counters.snapshot();
                tracing::debug!(
                    throttled = stats.throttled_requests,
                    retried = stats.retried_requests,
                    "Retrying request to {} after {}ms (attempt {})",
                    url,
                    backoff,
                    attempt
                );
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }

            match request_fn().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        self.inner.counters.record(RequestOutcome::Succeeded);
                        return Self::read_response(response).await;
                    }

                    self.inner.counters.record(if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        RequestOutcome::Throttled
                    } else {
                        RequestOutcome::Failed
                    });

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(ApiError::NotFound(strip_query(url).to_string()));
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(ApiError::RateLimited);
                    } else if status.is_server_error() {
                        last_error = Some(ApiError::ServiceUnavailable);
                    } else {
                        return Err(Self::handle_error_response(response).await);
                    }
                }
                Err(e) => {
                    self.inner.counters.record(RequestOutcome::Failed);

                    if e.is_timeout() {
                        last_error =
                            Some(ApiError::Timeout(self.inner.retry_config.timeout_seconds));
                    } else if e.is_connect() {
                        last_error = Some(ApiError::ServiceUnavailable);
                    } else {
                        return Err(ApiError::RequestError(e));
                    }
                }
            }

            attempt += 1;
        }

        let stats = self.inner.counters.snapshot();
        tracing::warn!(
            url = %url,
            attempts = attempt,
            total = stats.total_requests,
            failed = stats.failed_requests,
            throttled = stats.throttled_requests,
            "giving up on request"
        );
        Err(last_error.unwrap_or(ApiError::ServiceUnavailable))
    }

    async fn read_response(response: reqwest::Response) -> Result<RawResponse, ApiError> {
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await?;
        tracing::debug!(status, "ARM response body: {}", body);
        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }

    /// Handle error response
    async fn handle_error_response(response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        if status == 401 || status == 403 {
            return ApiError::AuthError(text);
        }

        match serde_json::from_str::<ArmErrorResponse>(&text) {
            Ok(err_resp) => ApiError::ApiError {
                status,
                code: err_resp.error.code,
                message: err_resp.error.message,
            },
            Err(_) => ApiError::ApiError {
                status,
                code: String::new(),
                message: text,
            },
        }
    }
}

fn to_json<B: Serialize>(body: &B) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body)
        .map_err(|e| ApiError::ParseError(format!("Failed to serialize request body: {}", e)))
}

fn strip_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(path, _)| path)
}
