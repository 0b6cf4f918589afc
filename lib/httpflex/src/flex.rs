//! Fluent request orchestrator.
//!
//! [`HttpFlex`] targets one URL. Setters configure headers, content type,
//! proxy and JSON style; each call then encodes a [`Body`], sends it once
//! and decodes the response into the shape the caller asks for.
//!
//! # Example
//!
//! ```no_run
//! use httpflex::{HttpFlex, Json, Multipart};
//!
//! # async fn run() -> httpflex::Result<()> {
//! let flex = HttpFlex::new("https://api.example.com/upload")?
//!     .header("Accept", "application/json");
//!
//! let form = Multipart::new().put("name", "report").put("file", std::path::Path::new("report.pdf"));
//! let Json(reply): Json<serde_json::Value> = flex.post(form).await?;
//! # Ok(())
//! # }
//! ```

use base64::Engine;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    Body, CONTENT_TYPE, ContentType, Decode, Error, Headers, HttpClient, HttpClientExt,
    HyperClient, Json, JsonCodec, Proxy, Request, Response, Result, encode,
};

/// Address used by [`HttpFlex::new_or_loopback`] when the given URL does not parse.
pub const LOOPBACK: &str = "http://127.0.0.1/";

/// Fluent HTTP request helper bound to one URL.
#[derive(Debug, Clone)]
pub struct HttpFlex<C = HyperClient> {
    client: C,
    url: Url,
    headers: Headers,
    proxy: Option<Proxy>,
    codec: JsonCodec,
}

impl HttpFlex<HyperClient> {
    /// Target `url` with a new default client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if `url` does not parse.
    pub fn new(url: &str) -> Result<Self> {
        Self::with_client(HyperClient::new(), url)
    }

    /// Target `url`, falling back to `http://127.0.0.1/` when it does not parse.
    #[must_use]
    pub fn new_or_loopback(url: &str) -> Self {
        let target = Url::parse(url).unwrap_or_else(|err| {
            tracing::warn!(%url, error = %err, "invalid URL, using loopback address");
            loopback()
        });
        Self::from_url(HyperClient::new(), target)
    }
}

#[allow(clippy::expect_used)]
fn loopback() -> Url {
    Url::parse(LOOPBACK).expect("loopback URL is valid")
}

impl<C: HttpClient> HttpFlex<C> {
    /// Target `url` through `client`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if `url` does not parse.
    pub fn with_client(client: C, url: &str) -> Result<Self> {
        Ok(Self::from_url(client, Url::parse(url)?))
    }

    /// Target an already parsed URL through `client`.
    #[must_use]
    pub fn from_url(client: C, url: Url) -> Self {
        Self {
            codec: client.json_codec(),
            client,
            url,
            headers: Vec::new(),
            proxy: None,
        }
    }

    /// Target URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Underlying client.
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    // ========================================================================
    // Setters
    // ========================================================================

    /// Append a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Append several headers.
    #[must_use]
    pub fn headers<N, V>(mut self, headers: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(name, value)| (name.into(), value.into())));
        self
    }

    /// Set the `Content-Type` header, replacing any previous one.
    ///
    /// Multipart, URL-encoded and JSON bodies override it with their own.
    #[must_use]
    pub fn content_type(self, content_type: &ContentType) -> Self {
        self.set_header(CONTENT_TYPE, content_type.as_str())
    }

    /// Send requests through an HTTP forward proxy.
    ///
    /// Only plain `http` targets can be proxied.
    #[must_use]
    pub fn proxy(mut self, host: impl Into<String>, port: u16) -> Self {
        self.proxy = Some(Proxy::new(host, port));
        self
    }

    /// Authenticate against the proxy with HTTP Basic credentials.
    #[must_use]
    pub fn proxy_auth(self, username: &str, password: &str) -> Self {
        let credentials = format!("{username}:{password}");
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes());
        self.set_header("Proxy-Authorization", format!("Basic {encoded}"))
    }

    /// JSON style of JSON bodies sent by this instance.
    ///
    /// Defaults to the client's [`ClientConfig::json_codec`](crate::ClientConfig::json_codec).
    /// JSON values inside forms are always compact.
    #[must_use]
    pub const fn json_codec(mut self, codec: JsonCodec) -> Self {
        self.codec = codec;
        self
    }

    fn set_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
        self
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// `GET` the target.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails or the body does not decode into `R`.
    pub async fn get<R: Decode>(&self) -> Result<R> {
        self.method("GET", Body::Empty).await
    }

    /// `DELETE` the target.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails or the body does not decode into `R`.
    pub async fn delete<R: Decode>(&self) -> Result<R> {
        self.method("DELETE", Body::Empty).await
    }

    /// `POST` a body to the target.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be encoded, the exchange fails or
    /// the response does not decode into `R`.
    pub async fn post<R: Decode>(&self, body: impl Into<Body>) -> Result<R> {
        self.method("POST", body).await
    }

    /// Send a request with any method name, upper-cased.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be encoded, the exchange fails or
    /// the response does not decode into `R`.
    pub async fn method<R: Decode>(&self, method: &str, body: impl Into<Body>) -> Result<R> {
        self.exchange(method, body).await.map(Response::into_body)
    }

    /// `GET` the target and parse the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails or the body is not a `T`.
    pub async fn get_json<T: DeserializeOwned>(&self) -> Result<T> {
        self.get::<Json<T>>().await.map(Json::into_inner)
    }

    /// `POST` a body and parse the reply as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be encoded, the exchange fails or
    /// the reply is not a `T`.
    pub async fn post_json<T: DeserializeOwned>(&self, body: impl Into<Body>) -> Result<T> {
        self.post::<Json<T>>(body).await.map(Json::into_inner)
    }

    /// Send a request and keep status and headers next to the decoded body.
    ///
    /// A non-2xx status is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be encoded, the exchange fails or
    /// the response does not decode into `R`.
    pub async fn exchange<R: Decode>(
        &self,
        method: &str,
        body: impl Into<Body>,
    ) -> Result<Response<R>> {
        let body = body.into();
        let kind = body.kind();
        let method = method.to_string();
        let codec = self.codec;

        // Streams and files are read with blocking I/O.
        let encoded = tokio::task::spawn_blocking(move || encode(&method, body, codec))
            .await
            .map_err(|err| Error::Body(std::io::Error::other(err)))??;

        let mut builder = Request::builder(encoded.method, self.url.clone())
            .headers(self.headers.iter().cloned())
            .proxy(self.proxy.clone());
        if let Some(content_type) = &encoded.content_type {
            builder = builder.set_header(CONTENT_TYPE, content_type.as_str());
        }
        if !encoded.payload.is_empty() {
            builder = builder.body(encoded.payload);
        }
        let request: Request<Bytes> = builder.build();

        tracing::debug!(
            method = %request.method(),
            url = %request.url(),
            body = kind,
            size = request.body().map_or(0, Bytes::len),
            mode = %R::MODE,
            "sending request"
        );

        let response = self.client.receive(request, R::MODE).await?;
        response.try_map_body(|received| R::decode(received, codec))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use assert2::{check, let_assert};

    use super::*;
    use crate::{ByteStream, Method, Multipart, UrlEncoded};

    /// Client that records the request and answers with a fixed body.
    #[derive(Clone, Default)]
    struct Recorder {
        seen: Arc<Mutex<Vec<Request<Bytes>>>>,
        reply: &'static str,
    }

    impl Recorder {
        fn replying(reply: &'static str) -> Self {
            Self {
                reply,
                ..Self::default()
            }
        }

        fn last(&self) -> Request<Bytes> {
            self.seen
                .lock()
                .expect("lock")
                .last()
                .cloned()
                .expect("a request")
        }
    }

    impl HttpClient for Recorder {
        async fn execute(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
            self.seen.lock().expect("lock").push(request);
            Ok(Response::new(200, HashMap::new(), Bytes::from(self.reply)))
        }

        async fn execute_streaming(
            &self,
            request: Request<Bytes>,
        ) -> Result<Response<ByteStream>> {
            self.seen.lock().expect("lock").push(request);
            Ok(Response::new(
                200,
                HashMap::new(),
                ByteStream::from_bytes(Bytes::from(self.reply)),
            ))
        }
    }

    fn flex(client: &Recorder) -> HttpFlex<Recorder> {
        HttpFlex::with_client(client.clone(), "http://example.com/api").expect("url")
    }

    #[test]
    fn invalid_url_fails_loudly() {
        let_assert!(Err(err) = HttpFlex::with_client(Recorder::default(), "not a url"));
        check!(err.kind() == crate::ErrorKind::Configuration);
    }

    #[test]
    fn invalid_url_can_fall_back_to_loopback() {
        let flex = HttpFlex::new_or_loopback("::not a url::");
        check!(flex.url().as_str() == LOOPBACK);
    }

    #[tokio::test]
    async fn get_sends_no_body() {
        let client = Recorder::replying("hello");

        let text: String = flex(&client).get().await.expect("get");

        check!(text == "hello");
        let request = client.last();
        check!(request.method() == &Method::Get);
        check!(request.body().is_none());
        check!(request.header(CONTENT_TYPE).is_none());
    }

    #[tokio::test]
    async fn json_body_forces_content_type() {
        let client = Recorder::replying(r#"{"ok":true}"#);
        let flex = flex(&client).content_type(&ContentType::PlainText);

        let reply: serde_json::Value = flex
            .post_json(serde_json::json!({"x": 1}))
            .await
            .expect("post");

        check!(reply["ok"] == true);
        let request = client.last();
        check!(request.header("content-type") == Some("application/json"));
        check!(request.headers().iter().filter(|(n, _)| n.eq_ignore_ascii_case(CONTENT_TYPE)).count() == 1);
        check!(request.body().map(|b| b.to_vec()) == Some(br#"{"x":1}"#.to_vec()));
    }

    #[tokio::test]
    async fn text_body_keeps_user_content_type() {
        let client = Recorder::default();
        let flex = flex(&client).content_type(&ContentType::Xml);

        let () = flex.post("<a/>").await.expect("post");

        let request = client.last();
        check!(request.header(CONTENT_TYPE) == Some("application/xml"));
        check!(request.body().map(|b| b.to_vec()) == Some(b"<a/>".to_vec()));
    }

    #[tokio::test]
    async fn forms_force_their_content_type() {
        let client = Recorder::default();

        let () = flex(&client)
            .post(Multipart::with_boundary("B0undary").put("a", "1"))
            .await
            .expect("multipart");
        check!(
            client.last().header(CONTENT_TYPE) == Some("multipart/form-data; boundary=B0undary")
        );

        let () = flex(&client)
            .post(UrlEncoded::new().put("a", 1).put("b", "x"))
            .await
            .expect("urlencoded");
        let request = client.last();
        check!(request.header(CONTENT_TYPE) == Some("application/x-www-form-urlencoded"));
        check!(request.body().map(|b| b.to_vec()) == Some(b"a=1&b=x".to_vec()));
    }

    #[tokio::test]
    async fn encoding_failure_sends_nothing() {
        let client = Recorder::default();

        let result: Result<String> = flex(&client).post(UrlEncoded::new()).await;

        let_assert!(Err(Error::EmptyForm) = result);
        check!(client.seen.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn method_name_is_upper_cased() {
        let client = Recorder::default();

        let () = flex(&client).method("patch", "x").await.expect("patch");

        check!(client.last().method() == &Method::Patch);
    }

    #[tokio::test]
    async fn proxy_settings_travel_with_the_request() {
        let client = Recorder::default();
        let flex = flex(&client)
            .proxy("10.0.0.1", 3128)
            .proxy_auth("user", "pass");

        let () = flex.get().await.expect("get");

        let request = client.last();
        check!(request.proxy() == Some(&Proxy::new("10.0.0.1", 3128)));
        check!(request.header("Proxy-Authorization") == Some("Basic dXNlcjpwYXNz"));
    }

    #[tokio::test]
    async fn pretty_codec_is_per_instance() {
        let client = Recorder::default();
        let pretty = flex(&client).json_codec(JsonCodec::Pretty);
        let compact = flex(&client);

        let () = pretty.post(serde_json::json!({"x": 1})).await.expect("pretty");
        check!(client.last().body().map(|b| b.to_vec()) == Some(b"{\n  \"x\": 1\n}".to_vec()));

        let () = compact.post(serde_json::json!({"x": 1})).await.expect("compact");
        check!(client.last().body().map(|b| b.to_vec()) == Some(br#"{"x":1}"#.to_vec()));
    }

    #[test]
    fn codec_defaults_to_client_config() {
        let client = HyperClient::builder().json_codec(JsonCodec::Pretty).build();

        let from_client = HttpFlex::with_client(client.clone(), "http://example.com/").expect("url");
        let overridden = from_client.clone().json_codec(JsonCodec::Compact);

        check!(from_client.codec == JsonCodec::Pretty);
        check!(overridden.codec == JsonCodec::Compact);
        check!(HttpFlex::new("http://example.com/").expect("url").codec == JsonCodec::Compact);
    }

    #[tokio::test]
    async fn stream_shape_uses_streaming_call() {
        let client = Recorder::replying("0123456789");

        let stream: ByteStream = flex(&client).get().await.expect("get");

        check!(stream.collect_bytes().await.expect("collect").len() == 10);
    }

    #[tokio::test]
    async fn exchange_exposes_status() {
        let client = Recorder::replying("[1,2,3]");

        let response = flex(&client)
            .exchange::<Json<Vec<u8>>>("get", ())
            .await
            .expect("exchange");

        check!(response.status() == 200);
        check!(response.into_body().into_inner() == vec![1, 2, 3]);
    }
}
