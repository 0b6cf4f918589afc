//! Connectors: HTTPS with rustls, and plain HTTP through a forward proxy.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use http::Uri;
use hyper::rt::{Read, ReadBufCursor, Write};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::{Connected, Connection, HttpConnector};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tower_service::Service;

use crate::{Error, Proxy, Result};

/// Plain TCP connector with the configured connect timeout.
fn http_connector(connect_timeout: Duration) -> HttpConnector {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(connect_timeout));
    http
}

/// Create an HTTPS connector with rustls.
///
/// This connector supports both HTTP/1.1 and HTTP/2, with TLS enabled
/// using the Mozilla root certificates. Plain `http` URLs are allowed.
#[must_use]
pub fn https_connector(connect_timeout: Duration) -> HttpsConnector<HttpConnector> {
    // Build rustls client config with webpki roots
    let root_store: rustls::RootCertStore =
        webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();

    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    HttpsConnectorBuilder::new()
        .with_tls_config(tls_config)
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .wrap_connector(http_connector(connect_timeout))
}

// ============================================================================
// Forward proxy
// ============================================================================

/// Connector that opens every connection to the same forward proxy.
///
/// Connections are flagged as proxied so the client writes request targets
/// in absolute form (`GET http://host/path HTTP/1.1`).
#[derive(Debug, Clone)]
pub struct ProxyConnector {
    http: HttpConnector,
    proxy: Uri,
}

impl ProxyConnector {
    /// Create a connector for `proxy`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if the proxy address is not a valid URI.
    pub fn new(proxy: &Proxy, connect_timeout: Duration) -> Result<Self> {
        let uri = proxy
            .uri()
            .parse::<Uri>()
            .map_err(|e| Error::invalid_request(format!("invalid proxy {proxy}: {e}")))?;
        Ok(Self {
            http: http_connector(connect_timeout),
            proxy: uri,
        })
    }
}

impl Service<Uri> for ProxyConnector {
    type Response = ProxiedStream;
    type Error = Box<dyn std::error::Error + Send + Sync>;
    type Future = Pin<Box<dyn Future<Output = std::result::Result<ProxiedStream, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        self.http.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, _destination: Uri) -> Self::Future {
        let connecting = self.http.call(self.proxy.clone());
        Box::pin(async move {
            let stream = connecting.await?;
            Ok(ProxiedStream { inner: stream })
        })
    }
}

/// TCP stream to a forward proxy.
#[derive(Debug)]
pub struct ProxiedStream {
    inner: TokioIo<TcpStream>,
}

impl Connection for ProxiedStream {
    fn connected(&self) -> Connected {
        self.inner.connected().proxy(true)
    }
}

impl Read for ProxiedStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: ReadBufCursor<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl Write for ProxiedStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }

    fn poll_write_vectored(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write_vectored(cx, bufs)
    }
}
