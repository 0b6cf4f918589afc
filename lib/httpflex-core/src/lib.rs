//! Core types and traits for the httpflex HTTP helper.
//!
//! This crate holds everything that does not need a network:
//! - [`ContentType`] - Content type catalog
//! - [`Body`] and [`encode`] - Polymorphic request bodies and their encoder
//! - [`Multipart`] and [`UrlEncoded`] - Form builders over [`FieldValue`]s
//! - [`Decode`], [`ReceiveMode`] and [`Received`] - Typed response decoding
//! - [`Request`], [`RequestBuilder`] and [`Response`] - HTTP message types
//! - [`HttpClient`] - Transport trait implemented by the runtime crate
//! - [`Error`], [`ErrorKind`] and [`Result`] - Error handling

mod body;
mod client;
mod content_type;
mod decode;
mod error;
mod field;
mod json;
mod method;
mod multipart;
pub mod prelude;
mod request;
mod response;
mod urlencoded;

pub use body::{Body, EncodedBody, encode};
pub use client::{HttpClient, HttpClientExt};
pub use content_type::{CONTENT_TYPE, ContentType};
pub use decode::{Decode, Json, ReceiveMode, Received};
pub use error::{Error, ErrorKind, Result, ResultExt};
pub use field::{ByteSource, FieldValue};
pub use json::{JsonCodec, from_json, to_json};
pub use method::Method;
pub use multipart::Multipart;
pub use request::{Headers, Proxy, Request, RequestBuilder};
pub use response::{ByteStream, Response};
pub use urlencoded::UrlEncoded;

// Re-export http crate types for status codes and headers
pub use http::{StatusCode, header};
