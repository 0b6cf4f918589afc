//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and functions
//! for easy glob importing:
//!
//! ```ignore
//! use httpflex_core::prelude::*;
//! ```

pub use crate::{
    Body, ByteStream, ContentType, Decode, Error, ErrorKind, FieldValue, HttpClient,
    HttpClientExt, Json, JsonCodec, Method, Multipart, Request, RequestBuilder, Response, Result,
    ResultExt, UrlEncoded, from_json, to_json,
};
