//! Fluent HTTP request helper for Rust.
//!
//! Point an [`HttpFlex`] at a URL, hand it any [`Body`] (text, bytes, a
//! reader, a file, a [`Multipart`] or [`UrlEncoded`] form, or any
//! serializable value) and say which shape you want back: the type you ask
//! for decides whether the response is streamed, buffered or parsed.
//!
//! # Example
//!
//! ```no_run
//! use httpflex::{HttpFlex, UrlEncoded};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct Token {
//!     access_token: String,
//! }
//!
//! # async fn run() -> httpflex::Result<()> {
//! let form = UrlEncoded::new()
//!     .put("grant_type", "client_credentials")
//!     .put_encoded("scope", "read write");
//!
//! let token: Token = HttpFlex::new("https://auth.example.com/token")?
//!     .post_json(form)
//!     .await?;
//!
//! let page: String = HttpFlex::new("https://example.com/")?
//!     .header("Authorization", format!("Bearer {}", token.access_token))
//!     .get()
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod connector;
mod download;
mod flex;
pub mod middleware;
pub mod prelude;

// Re-export client types
pub use client::{BoxedService, HyperClient, HyperClientBuilder, ServiceFuture};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use connector::{ProxiedStream, ProxyConnector, https_connector};
pub use download::{
    decode_data_url, download_to, extract_json_object, fetch_bytes, fetch_stream, query_params,
};
pub use flex::{HttpFlex, LOOPBACK};

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use httpflex_core::{
    Body, ByteSource, ByteStream, CONTENT_TYPE, ContentType, Decode, EncodedBody, Error,
    ErrorKind, FieldValue, Headers, HttpClient, HttpClientExt, Json, JsonCodec, Method, Multipart,
    Proxy, ReceiveMode, Received, Request, RequestBuilder, Response, Result, ResultExt,
    UrlEncoded, encode, from_json, to_json,
};

// Re-export http types for status codes and headers
pub use httpflex_core::{StatusCode, header};

pub use url;
