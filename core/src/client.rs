//! Request orchestration for the English Assistant API.
//!
//! # Design
//! `ApiClient` is the single choke point for outbound calls. For every
//! request it:
//!
//! 1. answers GETs from the response cache while the entry is younger than
//!    the configured TTL;
//! 2. joins an identical in-flight request (same fingerprint, any method)
//!    instead of issuing a second network call;
//! 3. otherwise dispatches the call under the configured deadline, classifies
//!    the outcome into `ClientError`, stores successful GETs in the cache and
//!    clears the in-flight entry.
//!
//! Both tables sit behind one mutex so the cache check, the in-flight check
//! and the in-flight insert happen as one step. The network call runs in its
//! own tokio task, spawned while that lock is held: the task's final
//! bookkeeping has to take the same lock, so it can never clear the entry
//! before it was inserted, and it still settles when every waiter has gone.
//! That bookkeeping lives in a drop guard, so a panicking transport still
//! frees the fingerprint.
//!
//! No request is retried here. A failed call leaves no state behind, so the
//! next identical call goes to the network.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;

use crate::cache::{fingerprint, ResponseCache};
use crate::config::{ClientConfig, ErrorMessages};
use crate::endpoint::Endpoint;
use crate::error::{ClientError, ConfigError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, Transport};

pub type ClientResult<T> = Result<T, ClientError>;

type PendingResponse = Shared<BoxFuture<'static, ClientResult<ApiResponse>>>;

/// Successful result envelope. `success` is always `true`; failures travel
/// as `Err(ClientError)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Value,
}

impl ApiResponse {
    pub fn new(data: Value) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Per-request options. Every recognised option is listed here; strict
/// deserialization rejects anything else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RequestOptions {
    pub method: HttpMethod,
    /// Merged over the default `Content-Type: application/json`.
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestOptions {
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn get() -> Self {
        Self::new(HttpMethod::Get)
    }

    pub fn post(body: Value) -> Self {
        Self::new(HttpMethod::Post).body(body)
    }

    pub fn put(body: Value) -> Self {
        Self::new(HttpMethod::Put).body(body)
    }

    pub fn delete() -> Self {
        Self::new(HttpMethod::Delete)
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

struct Tables {
    cache: ResponseCache,
    in_flight: HashMap<String, PendingResponse>,
}

struct Inner {
    config: ClientConfig,
    base_url: String,
    transport: Arc<dyn Transport>,
    tables: Mutex<Tables>,
}

impl Inner {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn round_trip(&self, request: HttpRequest) -> ClientResult<ApiResponse> {
        let method = request.method;
        let url = request.url.clone();
        let started = Instant::now();
        let messages = &self.config.messages;

        let sent = tokio::time::timeout(self.config.timeout(), self.transport.send(request)).await;
        let response = match sent {
            Err(_) => {
                tracing::warn!(
                    %method,
                    %url,
                    timeout_ms = self.config.timeout_ms,
                    "request timed out"
                );
                return Err(ClientError::timeout(&messages.timeout));
            }
            Ok(Err(e)) => {
                tracing::warn!(%method, %url, error = %e, "transport failure");
                return Err(ClientError::network(&messages.network, e.to_string()));
            }
            Ok(Ok(response)) => response,
        };

        tracing::debug!(
            %method,
            %url,
            status = response.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "response received"
        );
        classify(response)
    }
}

/// Clears a dispatched request's in-flight entry when its task ends, including
/// by panic or abort. A successful GET payload is cached under the same lock.
struct InFlightGuard {
    inner: Arc<Inner>,
    key: String,
    payload: Option<Value>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut tables = self.inner.tables();
        if let Some(payload) = self.payload.take() {
            tables.cache.insert(self.key.clone(), payload, Instant::now());
        }
        tables.in_flight.remove(&self.key);
    }
}

/// Map a raw response to the envelope or a classified error.
fn classify(response: HttpResponse) -> ClientResult<ApiResponse> {
    let status = response.status;
    let parsed = if response.body.trim().is_empty() {
        Ok(Value::Null)
    } else {
        serde_json::from_str::<Value>(&response.body)
    };

    if !(200..300).contains(&status) {
        let details = match parsed {
            Ok(Value::Null) => None,
            Ok(body) => Some(body),
            Err(_) => Some(Value::String(response.body)),
        };
        return Err(ClientError::from_response(status, details));
    }

    parsed.map(ApiResponse::new).map_err(|e| {
        ClientError::new(
            format!("Invalid JSON in response: {e}"),
            status,
            Some(Value::String(response.body)),
        )
    })
}

/// Caching, deduplicating client for the English Assistant API.
///
/// Cloning is cheap and every clone shares the same cache and in-flight
/// table.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Client over the default reqwest transport.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let transport = ReqwestTransport::new()?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let tables = Tables {
            cache: ResponseCache::new(config.cache_ttl(), config.max_cache_entries),
            in_flight: HashMap::new(),
        };
        Self {
            inner: Arc::new(Inner {
                config,
                base_url,
                transport,
                tables: Mutex::new(tables),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn messages(&self) -> &ErrorMessages {
        &self.inner.config.messages
    }

    /// Shorthand for `err.display_message(self.messages())`.
    pub fn display_message<'a>(&'a self, err: &'a ClientError) -> &'a str {
        err.display_message(self.messages())
    }

    /// Issue `options.method` against `base_url + path`.
    pub async fn request(&self, path: &str, options: RequestOptions) -> ClientResult<ApiResponse> {
        let url = self.resolve(path)?;
        self.execute(url, options).await
    }

    /// Like `request`, decoding `data` into `T`.
    pub async fn call<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> ClientResult<T> {
        let response = self.request(path, options).await?;
        decode(response.data)
    }

    /// Remove cached responses whose fingerprint contains `pattern`, or all
    /// of them. In-flight requests are unaffected.
    pub fn clear_cache(&self, pattern: Option<&str>) -> usize {
        let removed = self.inner.tables().cache.clear(pattern);
        tracing::debug!(pattern = pattern.unwrap_or("*"), removed, "cache cleared");
        removed
    }

    /// Drop every entry older than the TTL.
    pub fn purge_expired_cache(&self) -> usize {
        self.inner.tables().cache.purge_expired(Instant::now())
    }

    pub fn cache_len(&self) -> usize {
        self.inner.tables().cache.len()
    }

    pub fn in_flight_len(&self) -> usize {
        self.inner.tables().in_flight.len()
    }

    pub(crate) async fn send_endpoint<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        path: &str,
        body: Option<Value>,
    ) -> ClientResult<T> {
        if endpoint.requires_body && body.is_none() {
            return Err(ClientError::network(
                format!("{} {} requires a request body", endpoint.method, endpoint.path),
                "missing body",
            ));
        }
        let options = RequestOptions {
            method: endpoint.method,
            headers: Vec::new(),
            body,
        };
        self.call(path, options).await
    }

    /// GET against an absolute URL outside `base_url`.
    pub(crate) async fn get_absolute<T: DeserializeOwned>(&self, url: &str) -> ClientResult<T> {
        let url = parse_url(url)?;
        let response = self.execute(url, RequestOptions::get()).await?;
        decode(response.data)
    }

    /// Join `path` onto `base_url`. Paths whose dot segments climb out of
    /// the base are rejected.
    fn resolve(&self, path: &str) -> ClientResult<String> {
        let joined = if path.is_empty() || path.starts_with('/') || path.starts_with('?') {
            format!("{}{path}", self.inner.base_url)
        } else {
            format!("{}/{path}", self.inner.base_url)
        };
        let base = url::Url::parse(&self.inner.base_url).map_err(|e| {
            ClientError::network(format!("Invalid base URL: {}", self.inner.base_url), e.to_string())
        })?;
        let url = url::Url::parse(&joined)
            .map_err(|e| ClientError::network(format!("Invalid request URL: {joined}"), e.to_string()))?;
        if !is_under(&base, &url) {
            return Err(ClientError::network(
                format!("Request path {path} resolves outside {}", self.inner.base_url),
                url.to_string(),
            ));
        }
        Ok(url.to_string())
    }

    fn build_request(&self, url: String, options: RequestOptions) -> ClientResult<HttpRequest> {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        for (name, value) in options.headers {
            match headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(&name)) {
                Some(slot) => slot.1 = value,
                None => headers.push((name, value)),
            }
        }

        let body = options
            .body
            .map(|body| serde_json::to_string(&body))
            .transpose()
            .map_err(|e| ClientError::network("Request body could not be serialized", e.to_string()))?;

        Ok(HttpRequest {
            method: options.method,
            url,
            headers,
            body,
        })
    }

    async fn execute(&self, url: String, options: RequestOptions) -> ClientResult<ApiResponse> {
        let request = self.build_request(url, options)?;
        let key = fingerprint(&request);
        let method = request.method;
        let url = request.url.clone();

        let pending = {
            let mut tables = self.inner.tables();
            if method == HttpMethod::Get {
                if let Some(data) = tables.cache.get(&key, Instant::now()) {
                    tracing::debug!(%method, %url, "cache hit");
                    return Ok(ApiResponse::new(data.clone()));
                }
            }
            match tables.in_flight.get(&key) {
                Some(pending) => {
                    tracing::debug!(%method, %url, "joining in-flight request");
                    pending.clone()
                }
                None => {
                    tracing::debug!(%method, %url, "dispatching request");
                    let pending = self.dispatch(key.clone(), request);
                    tables.in_flight.insert(key, pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// Must be called with the tables lock held.
    fn dispatch(&self, key: String, request: HttpRequest) -> PendingResponse {
        let cacheable = request.method == HttpMethod::Get;
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let mut guard = InFlightGuard {
                inner,
                key,
                payload: None,
            };
            let outcome = guard.inner.round_trip(request).await;
            if let (true, Ok(response)) = (cacheable, &outcome) {
                guard.payload = Some(response.data.clone());
            }
            drop(guard);
            outcome
        });

        async move {
            task.await.unwrap_or_else(|e| {
                Err(ClientError::new(
                    "Request task did not complete",
                    ClientError::NETWORK_STATUS,
                    Some(Value::String(e.to_string())),
                ))
            })
        }
        .boxed()
        .shared()
    }
}

/// Whether `url` stays on the base URL's origin and under its path.
fn is_under(base: &url::Url, url: &url::Url) -> bool {
    if base.scheme() != url.scheme()
        || base.host_str() != url.host_str()
        || base.port_or_known_default() != url.port_or_known_default()
    {
        return false;
    }
    let prefix = base.path().trim_end_matches('/');
    let path = url.path();
    path == prefix || path.starts_with(&format!("{prefix}/"))
}

fn parse_url(raw: &str) -> ClientResult<String> {
    url::Url::parse(raw)
        .map(|url| url.to_string())
        .map_err(|e| ClientError::network(format!("Invalid request URL: {raw}"), e.to_string()))
}

fn decode<T: DeserializeOwned>(data: Value) -> ClientResult<T> {
    serde_json::from_value(data.clone()).map_err(|e| {
        ClientError::new(
            format!("Unexpected response shape: {e}"),
            ClientError::NETWORK_STATUS,
            Some(data),
        )
    })
}
