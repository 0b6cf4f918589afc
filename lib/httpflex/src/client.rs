//! HTTP client implementation using hyper-util.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures_util::TryStreamExt;
use http_body_util::{BodyExt, BodyStream, Full};
use hyper::body::Incoming;
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tower::Layer;
use tower::util::BoxCloneService;
use tower_service::Service;

#[cfg(feature = "middleware-logging")]
use crate::middleware::LoggingLayer;
use crate::{
    ByteStream, Error, JsonCodec, Proxy, Request, Response, Result,
    config::{ClientConfig, ClientConfigBuilder},
    connector::{ProxyConnector, https_connector},
};

// ============================================================================
// Type-Erased Service for Middleware Composition
// ============================================================================

/// Type-erased service for middleware composition.
///
/// This type allows storing and composing arbitrary Tower layers without
/// exposing complex generic types to users.
pub type BoxedService = BoxCloneService<Request<Bytes>, Response<Bytes>, Error>;

/// Future type for Tower Service implementation.
pub type ServiceFuture = Pin<Box<dyn Future<Output = Result<Response<Bytes>>> + Send + 'static>>;

/// Thread-safe wrapper for `BoxedService`.
///
/// This wrapper uses a Mutex to make the service Sync, which is required
/// by the `HttpClient` trait.
#[derive(Clone)]
struct SyncService {
    inner: Arc<Mutex<BoxedService>>,
}

impl SyncService {
    fn new(service: BoxedService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    fn call(&self, request: Request<Bytes>) -> ServiceFuture {
        // Lock, clone the service, and release the lock immediately
        let mut service = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();

        Box::pin(async move { service.call(request).await })
    }
}

// ============================================================================
// Raw Client (internal, used for direct hyper access)
// ============================================================================

type DirectClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;
type ProxiedClient = Client<ProxyConnector, Full<Bytes>>;

/// Raw HTTP client using hyper-util (internal implementation).
///
/// Proxied connections live in their own pools, one per proxy: the
/// connection pool is keyed by destination only.
#[derive(Clone)]
struct RawHyperClient {
    direct: DirectClient,
    proxied: Arc<Mutex<HashMap<Proxy, ProxiedClient>>>,
    config: ClientConfig,
}

impl RawHyperClient {
    fn new(config: ClientConfig) -> Self {
        let direct = Self::client_builder(&config).build(https_connector(config.connect_timeout));

        Self {
            direct,
            proxied: Arc::default(),
            config,
        }
    }

    fn client_builder(config: &ClientConfig) -> hyper_util::client::legacy::Builder {
        let mut builder = Client::builder(TokioExecutor::new());
        builder
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host);
        builder
    }

    fn proxied_client(&self, proxy: &Proxy) -> Result<ProxiedClient> {
        let mut cache = self
            .proxied
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(client) = cache.get(proxy) {
            return Ok(client.clone());
        }

        let connector = ProxyConnector::new(proxy, self.config.connect_timeout)?;
        let client = Self::client_builder(&self.config).build(connector);
        cache.insert(proxy.clone(), client.clone());
        tracing::debug!(%proxy, "proxy connection pool created");
        Ok(client)
    }

    /// Build a hyper request from a httpflex request.
    fn build_hyper_request(
        request: Request<Bytes>,
    ) -> Result<(http::Request<Full<Bytes>>, Option<Proxy>)> {
        let (method, url, headers, proxy, body) = request.into_parts();

        if proxy.is_some() && url.scheme() != "http" {
            return Err(Error::invalid_request(format!(
                "only plain http targets can go through a proxy, got {url}"
            )));
        }

        let mut builder = http::Request::builder()
            .method(http::Method::try_from(method)?)
            .uri(url.as_str());

        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let body = body.map_or_else(Full::default, Full::new);
        let http_request = builder
            .body(body)
            .map_err(|e| Error::invalid_request(e.to_string()))?;

        Ok((http_request, proxy))
    }

    /// Extract response headers as a `HashMap`.
    ///
    /// Repeated headers (`Set-Cookie` included) are joined with `", "`.
    /// Values that are not visible ASCII are skipped.
    fn extract_headers(headers: &http::HeaderMap) -> HashMap<String, String> {
        let mut extracted: HashMap<String, String> = HashMap::with_capacity(headers.keys_len());
        for (name, value) in headers {
            let Ok(value) = value.to_str() else {
                continue;
            };
            extracted
                .entry(name.to_string())
                .and_modify(|joined| {
                    joined.push_str(", ");
                    joined.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }
        extracted
    }

    /// Send the request and wait for the response headers.
    async fn send(&self, request: Request<Bytes>) -> Result<http::Response<Incoming>> {
        let (hyper_request, proxy) = Self::build_hyper_request(request)?;

        let pending = match proxy {
            Some(proxy) => self.proxied_client(&proxy)?.request(hyper_request),
            None => self.direct.request(hyper_request),
        };

        tokio::time::timeout(self.config.timeout, pending)
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(Self::map_hyper_error)
    }

    async fn execute(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        let exchange = async {
            let response = self.send(request).await?;

            let status = response.status().as_u16();
            let response_headers = Self::extract_headers(response.headers());

            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|e| Error::connection(e.to_string()))?
                .to_bytes();

            Ok::<_, Error>(Response::new(status, response_headers, body))
        };

        tokio::time::timeout(self.config.timeout, exchange)
            .await
            .map_err(|_| Error::Timeout)?
    }

    #[allow(clippy::needless_pass_by_value)]
    fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
        let msg = error_chain(&err);

        if err.is_connect() {
            return Error::connection(msg);
        }

        if msg.contains("ssl") || msg.contains("tls") || msg.contains("certificate") {
            return Error::tls(msg);
        }

        Error::connection(msg)
    }

    /// Execute a request and return a streaming response.
    ///
    /// The timeout stops at the response headers.
    async fn execute_streaming(&self, request: Request<Bytes>) -> Result<Response<ByteStream>> {
        let response = self.send(request).await?;

        let status = response.status().as_u16();
        let response_headers = Self::extract_headers(response.headers());

        let body_stream = BodyStream::new(response.into_body())
            .try_filter_map(|frame| async move { Ok(frame.into_data().ok()) })
            .map_err(|e| Error::connection(e.to_string()));

        Ok(Response::new(
            status,
            response_headers,
            ByteStream::new(body_stream),
        ))
    }
}

/// Error message including its sources, so that the root cause of a
/// connect failure is not lost.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl Service<Request<Bytes>> for RawHyperClient {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send + 'static>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        let client = self.clone();
        Box::pin(async move { client.execute(request).await })
    }
}

// ============================================================================
// Public Client
// ============================================================================

/// HTTP client using hyper-util with connection pooling, TLS, forward
/// proxies and middleware support.
///
/// # Example
///
/// ```no_run
/// use httpflex::HyperClient;
/// use std::time::Duration;
///
/// // Simple client without middleware
/// let client = HyperClient::new();
///
/// // Client with logging middleware
/// let client = HyperClient::builder()
///     .timeout(Duration::from_secs(5))
///     .with_logging()
///     .build();
/// ```
#[derive(Clone)]
pub struct HyperClient {
    service: SyncService,
    raw: RawHyperClient,
    config: ClientConfig,
}

impl std::fmt::Debug for HyperClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperClient {
    /// Create a new client with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration (no middleware).
    #[must_use]
    pub fn with_config(config: ClientConfig) -> Self {
        let raw = RawHyperClient::new(config.clone());
        Self::with_service(BoxCloneService::new(raw.clone()), raw, config)
    }

    /// Create a client with a pre-configured service (used by builder).
    fn with_service(service: BoxedService, raw: RawHyperClient, config: ClientConfig) -> Self {
        Self {
            service: SyncService::new(service),
            raw,
            config,
        }
    }

    /// Create a new client builder.
    #[must_use]
    pub fn builder() -> HyperClientBuilder {
        HyperClientBuilder::default()
    }

    /// Get the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl Default for HyperClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Streaming bypasses middleware: layers work on buffered responses.
impl httpflex_core::HttpClient for HyperClient {
    async fn execute(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        self.service.call(request).await
    }

    async fn execute_streaming(&self, request: Request<Bytes>) -> Result<Response<ByteStream>> {
        tracing::debug!(method = %request.method(), url = %request.url(), "sending streaming request");
        self.raw.execute_streaming(request).await
    }

    fn json_codec(&self) -> JsonCodec {
        self.config.json_codec
    }
}

// ============================================================================
// Tower Service Implementation
// ============================================================================

impl Service<Request<Bytes>> for HyperClient {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        // SyncService is always ready (the underlying service is polled when called)
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        self.service.call(request)
    }
}

/// Builder for [`HyperClient`].
///
/// # Example
///
/// ```no_run
/// use httpflex::HyperClient;
/// use httpflex::middleware::LoggingLayer;
///
/// let client = HyperClient::builder()
///     .layer(LoggingLayer::debug())
///     .build();
/// ```
#[derive(Default)]
pub struct HyperClientBuilder {
    config: ClientConfigBuilder,
    layers: Vec<Arc<dyn Fn(BoxedService) -> BoxedService + Send + Sync>>,
}

impl std::fmt::Debug for HyperClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperClientBuilder")
            .field("config", &self.config)
            .field("layers_count", &self.layers.len())
            .finish()
    }
}

impl HyperClientBuilder {
    // ========================================================================
    // Core Configuration
    // ========================================================================

    /// Set the request timeout (applied at the connection level, not middleware).
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.config = self.config.pool_idle_per_host(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.pool_idle_timeout(timeout);
        self
    }

    /// Set the default JSON style of request bodies.
    #[must_use]
    pub fn json_codec(mut self, codec: JsonCodec) -> Self {
        self.config = self.config.json_codec(codec);
        self
    }

    // ========================================================================
    // Middleware
    // ========================================================================

    /// Add a Tower layer to the client.
    ///
    /// Layers are applied in order: first added = innermost, last added =
    /// outermost (processes requests first).
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error>
            + Clone
            + Send
            + 'static,
        <L::Service as Service<Request<Bytes>>>::Future: Send,
    {
        self.layers.push(Arc::new(move |service| {
            BoxCloneService::new(layer.layer(service))
        }));
        self
    }

    /// Add request/response logging.
    #[cfg(feature = "middleware-logging")]
    #[must_use]
    pub fn with_logging(self) -> Self {
        self.layer(LoggingLayer::new())
    }

    /// Add debug-level logging (includes headers and more detail).
    #[cfg(feature = "middleware-logging")]
    #[must_use]
    pub fn with_debug_logging(self) -> Self {
        self.layer(LoggingLayer::debug())
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Build the client with all configured middleware.
    #[must_use]
    pub fn build(self) -> HyperClient {
        let config = self.config.build();
        let raw = RawHyperClient::new(config.clone());

        let mut service: BoxedService = BoxCloneService::new(raw.clone());
        for layer_fn in self.layers {
            service = layer_fn(service);
        }

        HyperClient::with_service(service, raw, config)
    }
}
