//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and functions
//! for easy glob importing:
//!
//! ```ignore
//! use httpflex::prelude::*;
//! ```

pub use crate::{
    Body, ByteStream, ClientConfig, ContentType, Error, ErrorKind, FieldValue, HttpClient,
    HttpFlex, HyperClient, Json, JsonCodec, Multipart, Response, Result, ResultExt, StatusCode,
    UrlEncoded, download_to, fetch_bytes, fetch_stream,
};
pub use serde::{Deserialize, Serialize};
