//! HTTP client traits.
//!
//! - [`HttpClient`] - Low-level HTTP execution, buffered or streaming
//! - [`HttpClientExt`] - Receive a body in a given [`ReceiveMode`]
//!
//! Implement [`HttpClient`] to plug another transport, or a mock, under
//! the request orchestrator.

use std::future::Future;

use bytes::Bytes;

use crate::{ByteStream, JsonCodec, ReceiveMode, Received, Request, Response, Result};

/// Core HTTP client trait.
///
/// This trait defines the interface for executing HTTP requests.
/// Implementations should be async-first and support connection pooling.
/// A non-2xx status is a response, never an error.
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request and buffer the response body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails for any reason:
    /// - Network errors
    /// - TLS errors
    /// - Timeouts
    /// - Invalid request
    fn execute(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<Response<Bytes>>> + Send;

    /// Execute an HTTP request and hand over the body unread.
    ///
    /// # Errors
    ///
    /// Same as [`HttpClient::execute`], up to the response headers.
    fn execute_streaming(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<Response<ByteStream>>> + Send;

    /// JSON style a request helper built on this client starts with.
    fn json_codec(&self) -> JsonCodec {
        JsonCodec::default()
    }
}

/// Extension trait for [`HttpClient`] with convenience methods.
pub trait HttpClientExt: HttpClient {
    /// Execute a request and receive the body in `mode`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn receive(
        &self,
        request: Request<Bytes>,
        mode: ReceiveMode,
    ) -> impl Future<Output = Result<Response<Received>>> + Send {
        async move {
            let response = match mode {
                ReceiveMode::Stream => self
                    .execute_streaming(request)
                    .await?
                    .map_body(Received::Stream),
                ReceiveMode::Bytes => self.execute(request).await?.map_body(Received::Bytes),
                ReceiveMode::Text => self
                    .execute(request)
                    .await?
                    .map_body(|body| Received::text_from(&body)),
            };
            tracing::debug!(
                %mode,
                status = response.status(),
                "response received"
            );
            Ok(response)
        }
    }
}

// Blanket implementation for all HttpClient implementors
impl<T: HttpClient> HttpClientExt for T {}
