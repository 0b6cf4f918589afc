//! HTTP request building.
//!
//! Use [`Request::builder`] to construct requests with headers, query parameters, and bodies.
//!
//! # Example
//!
//! ```
//! use httpflex_core::{Request, Method};
//! use bytes::Bytes;
//!
//! let url = "https://api.example.com".parse().expect("url");
//! let request = Request::<Bytes>::builder(Method::Get, url)
//!     .header("Accept", "application/json")
//!     .query("page", "1")
//!     .build();
//! assert_eq!(request.header("accept"), Some("application/json"));
//! ```

use std::fmt;

use bytes::Bytes;

use crate::Method;

/// Ordered header list. Names may repeat.
pub type Headers = Vec<(String, String)>;

/// An HTTP forward proxy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Proxy {
    host: String,
    port: u16,
}

impl Proxy {
    /// Creates a proxy address.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Proxy host name or address.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Proxy port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// The `http://host:port` URI of the proxy.
    #[must_use]
    pub fn uri(&self) -> String {
        format!("http://{self}")
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') && !self.host.starts_with('[') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// An HTTP request with method, URL, headers, and optional body.
#[derive(Debug, Clone)]
pub struct Request<B = Bytes> {
    method: Method,
    url: url::Url,
    headers: Headers,
    proxy: Option<Proxy>,
    body: Option<B>,
}

impl<B> Request<B> {
    /// Creates a new [`RequestBuilder`].
    #[must_use]
    pub fn builder(method: Method, url: url::Url) -> RequestBuilder<B> {
        RequestBuilder::new(method, url)
    }

    /// Reassemble a request from its parts.
    #[must_use]
    pub fn from_parts(
        method: Method,
        url: url::Url,
        headers: Headers,
        proxy: Option<Proxy>,
        body: Option<B>,
    ) -> Self {
        Self {
            method,
            url,
            headers,
            proxy,
            body,
        }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Request URL.
    #[must_use]
    pub fn url(&self) -> &url::Url {
        &self.url
    }

    /// Request headers, in insertion order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Mutable access to headers.
    #[must_use]
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// First header value by name, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Forward proxy the request must go through.
    #[must_use]
    pub const fn proxy(&self) -> Option<&Proxy> {
        self.proxy.as_ref()
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> Option<&B> {
        self.body.as_ref()
    }

    /// Consume into (method, url, headers, proxy, body).
    #[must_use]
    pub fn into_parts(self) -> (Method, url::Url, Headers, Option<Proxy>, Option<B>) {
        (self.method, self.url, self.headers, self.proxy, self.body)
    }
}

/// Builder for constructing [`Request`] instances.
#[derive(Debug, Clone)]
pub struct RequestBuilder<B = Bytes> {
    method: Method,
    url: url::Url,
    headers: Headers,
    proxy: Option<Proxy>,
    body: Option<B>,
}

impl<B> RequestBuilder<B> {
    /// Creates a new builder.
    #[must_use]
    pub fn new(method: Method, url: url::Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            proxy: None,
            body: None,
        }
    }

    /// Appends a header. Earlier values with the same name are kept.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets a header, dropping every earlier value with the same name (ignoring case).
    #[must_use]
    pub fn set_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    /// Appends multiple headers.
    #[must_use]
    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Appends a query parameter to the URL.
    #[must_use]
    pub fn query(mut self, name: &str, value: &str) -> Self {
        self.url.query_pairs_mut().append_pair(name, value);
        self
    }

    /// Sends the request through a forward proxy.
    #[must_use]
    pub fn proxy(mut self, proxy: Option<Proxy>) -> Self {
        self.proxy = proxy;
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: B) -> Self {
        self.body = Some(body);
        self
    }

    /// Builds the [`Request`].
    #[must_use]
    pub fn build(self) -> Request<B> {
        Request {
            method: self.method,
            url: self.url,
            headers: self.headers,
            proxy: self.proxy,
            body: self.body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> url::Url {
        url::Url::parse("https://api.example.com/users").expect("valid URL")
    }

    #[test]
    fn request_builder_basic() {
        let request = Request::<Bytes>::builder(Method::Get, url())
            .header("Accept", "application/json")
            .build();

        assert_eq!(request.method(), &Method::Get);
        assert_eq!(request.url().as_str(), "https://api.example.com/users");
        assert_eq!(request.header("accept"), Some("application/json"));
        assert!(request.proxy().is_none());
        assert!(request.body().is_none());
    }

    #[test]
    fn request_builder_with_query() {
        let request = Request::<Bytes>::builder(Method::Get, url())
            .query("page", "1")
            .query("limit", "10")
            .build();

        assert_eq!(
            request.url().as_str(),
            "https://api.example.com/users?page=1&limit=10"
        );
    }

    #[test]
    fn header_keeps_duplicates() {
        let request = Request::<Bytes>::builder(Method::Get, url())
            .header("X-Tag", "a")
            .header("X-Tag", "b")
            .build();

        assert_eq!(request.headers().len(), 2);
        assert_eq!(request.header("x-tag"), Some("a"));
    }

    #[test]
    fn set_header_replaces_ignoring_case() {
        let request = Request::<Bytes>::builder(Method::Post, url())
            .header("content-type", "text/plain")
            .header("Accept", "*/*")
            .set_header("Content-Type", "application/json")
            .build();

        assert_eq!(
            request.headers(),
            [
                ("Accept".to_string(), "*/*".to_string()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ]
            .as_slice()
        );
    }

    #[test]
    fn request_builder_with_body_and_proxy() {
        let body = Bytes::from(r#"{"name":"test"}"#);
        let request = Request::builder(Method::Post, url())
            .proxy(Some(Proxy::new("proxy.local", 3128)))
            .body(body.clone())
            .build();

        let (method, _, _, proxy, sent) = request.into_parts();
        assert_eq!(method, Method::Post);
        assert_eq!(proxy.map(|p| p.uri()), Some("http://proxy.local:3128".to_string()));
        assert_eq!(sent, Some(body));
    }

    #[test]
    fn proxy_uri_brackets_ipv6() {
        assert_eq!(Proxy::new("::1", 8080).uri(), "http://[::1]:8080");
        assert_eq!(Proxy::new("[::1]", 8080).uri(), "http://[::1]:8080");
        assert_eq!(Proxy::new("10.0.0.1", 80).to_string(), "10.0.0.1:80");
    }
}
