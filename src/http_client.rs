//! Upstream aggregation API client.
//!
//! Features:
//! - One GET per endpoint against a configurable base URL
//! - `{ "data": ... }` envelope unwrapping
//! - Pluggable response cache (TTL by default)
//! - Injectable transport so tests never touch the network
//! - HTTP/2, TLS 1.3, Brotli/Zstd/Gzip compression via reqwest

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::cache::{CachePolicy, NoCache, TtlCache};
use crate::config::Config;
use crate::error::{ConfigError, UpstreamError};
use crate::fields::is_truthy;

/// Performs one GET and decodes the body as JSON.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value, UpstreamError>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a client with the configured timeouts and user agent.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let client = Client::builder()
            // ═══════════════════════════════════════════════════════════════
            // CONNECTION REUSE
            // ═══════════════════════════════════════════════════════════════
            // Every page fans out to the same host, keep connections warm
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .tcp_keepalive(std::time::Duration::from_secs(60))
            .tcp_nodelay(true)
            // ═══════════════════════════════════════════════════════════════
            // TLS + COMPRESSION
            // ═══════════════════════════════════════════════════════════════
            .use_rustls_tls()
            .brotli(true)
            .zstd(true)
            .gzip(true)
            .deflate(true)
            // ═══════════════════════════════════════════════════════════════
            // TIMEOUTS
            // ═══════════════════════════════════════════════════════════════
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, url: &str) -> Result<Value, UpstreamError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}

/// Client for the aggregation API shared by every source provider.
#[derive(Clone)]
pub struct UpstreamClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    cache: Arc<dyn CachePolicy>,
}

impl UpstreamClient {
    /// Create a client from configuration: reqwest transport plus a TTL
    /// cache (or no cache when the TTL is zero).
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let transport = HttpTransport::new(config)?;
        let cache: Arc<dyn CachePolicy> = if config.cache_ttl_secs == 0 {
            Arc::new(NoCache)
        } else {
            Arc::new(TtlCache::with_capacity(config.cache_ttl(), config.cache_max_entries))
        };
        Ok(Self {
            base_url: config.base_url().to_string(),
            transport: Arc::new(transport),
            cache,
        })
    }

    /// Create a client over an arbitrary transport, without caching.
    pub fn with_transport(base_url: impl Into<String>, transport: impl Transport + 'static) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transport: Arc::new(transport),
            cache: Arc::new(NoCache),
        }
    }

    /// Replace the cache policy.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn CachePolicy>) -> Self {
        self.cache = cache;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch `base_url + endpoint` and unwrap the `data` envelope.
    ///
    /// Failures are logged and returned; this never panics. Only successful
    /// payloads are cached.
    #[instrument(skip(self), fields(endpoint = %endpoint))]
    pub async fn fetch_resource(&self, endpoint: &str) -> Result<Value, UpstreamError> {
        let url = format!("{}{}", self.base_url, endpoint);

        if let Some(cached) = self.cache.get(&url).await {
            return Ok(cached);
        }

        debug!("Fetching upstream resource");
        match self.transport.get_json(&url).await {
            Ok(payload) => {
                let data = unwrap_envelope(payload);
                self.cache.put(&url, data.clone()).await;
                Ok(data)
            }
            Err(e) => {
                warn!("API Error ({endpoint}): {e}");
                Err(e)
            }
        }
    }

    /// Like [`fetch_resource`](Self::fetch_resource), but collapses errors
    /// and falsy payloads (null, empty string, `false`, `0`) to `None`.
    pub async fn fetch_data(&self, endpoint: &str) -> Option<Value> {
        self.fetch_resource(endpoint)
            .await
            .ok()
            .filter(is_truthy)
    }
}

impl std::fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Return the `data` member when it is present and truthy, otherwise the
/// payload itself.
pub fn unwrap_envelope(payload: Value) -> Value {
    match payload {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) if is_truthy(&data) => data,
            Some(data) => {
                map.insert("data".to_string(), data);
                Value::Object(map)
            }
            None => Value::Object(map),
        },
        other => other,
    }
}
