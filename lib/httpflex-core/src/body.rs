//! Request bodies and the body encoder.
//!
//! [`Body`] lists every shape a request body can take. [`encode`] turns one
//! into the bytes to send and, for forms and JSON, the content type that
//! must go with them.

use std::io::Read;
use std::path::PathBuf;

use bytes::{Bytes, BytesMut};

use crate::field::{ByteSource, copy_chunked, read_file};
use crate::{ContentType, Error, JsonCodec, Method, Multipart, Result, UrlEncoded};

/// A request body.
#[derive(Default)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// UTF-8 text, sent verbatim.
    Text(String),
    /// An open byte source, drained once when the request is encoded.
    Stream(ByteSource),
    /// Raw bytes.
    Bytes(Bytes),
    /// The content of a file.
    File(PathBuf),
    /// A `multipart/form-data` form, consumed by the encoder.
    ///
    /// Convert from `&mut Multipart` to keep the form for another round.
    Multipart(Multipart),
    /// An `application/x-www-form-urlencoded` form, consumed by the encoder.
    ///
    /// Convert from `&mut UrlEncoded` to keep the form for another round.
    UrlEncoded(UrlEncoded),
    /// Any other value, sent as JSON.
    Json(serde_json::Value),
}

impl Body {
    /// Any serializable value, sent as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented as JSON.
    ///
    /// # Example
    ///
    /// ```
    /// use httpflex_core::Body;
    ///
    /// let body = Body::json(&serde_json::json!({ "x": 1 })).expect("json");
    /// assert_eq!(body.kind(), "json");
    /// ```
    pub fn json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }

    /// An open byte source.
    pub fn stream(reader: impl Read + Send + 'static) -> Self {
        Self::Stream(Box::new(reader))
    }

    /// A file path.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// Variant name, for logs and `Debug`.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Text(_) => "text",
            Self::Stream(_) => "stream",
            Self::Bytes(_) => "bytes",
            Self::File(_) => "file",
            Self::Multipart(_) => "multipart",
            Self::UrlEncoded(_) => "urlencoded",
            Self::Json(_) => "json",
        }
    }
}

impl std::fmt::Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Multipart(form) => f.debug_tuple("Multipart").field(form).finish(),
            Self::UrlEncoded(form) => f.debug_tuple("UrlEncoded").field(form).finish(),
            Self::Json(value) => f.debug_tuple("Json").field(value).finish(),
        }
    }
}

impl From<()> for Body {
    fn from((): ()) -> Self {
        Self::Empty
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(value))
    }
}

impl From<Bytes> for Body {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<PathBuf> for Body {
    fn from(value: PathBuf) -> Self {
        Self::File(value)
    }
}

impl From<Multipart> for Body {
    fn from(value: Multipart) -> Self {
        Self::Multipart(value)
    }
}

impl From<UrlEncoded> for Body {
    fn from(value: UrlEncoded) -> Self {
        Self::UrlEncoded(value)
    }
}

/// Takes the fields, leaving `form` empty and ready to refill.
impl From<&mut Multipart> for Body {
    fn from(form: &mut Multipart) -> Self {
        Self::Multipart(form.take())
    }
}

/// Takes the fields, leaving `form` empty and ready to refill.
impl From<&mut UrlEncoded> for Body {
    fn from(form: &mut UrlEncoded) -> Self {
        Self::UrlEncoded(form.take())
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl<B: Into<Body>> From<Option<B>> for Body {
    fn from(value: Option<B>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

// ============================================================================
// Encoder
// ============================================================================

/// Wire-ready request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    /// Upper-cased request method.
    pub method: Method,
    /// Bytes to send.
    pub payload: Bytes,
    /// Content type the body requires, replacing any previous one.
    pub content_type: Option<ContentType>,
}

/// Turn a body into the bytes to send.
///
/// Text, streams, bytes and files are sent as-is and leave the content type
/// to the caller. Forms and JSON force their own content type.
///
/// This function blocks while streams and files are read.
///
/// # Errors
///
/// Returns an error if a stream or file cannot be read, a value cannot be
/// serialized, or a form is empty or closed.
///
/// # Example
///
/// ```
/// use httpflex_core::{Body, ContentType, JsonCodec, encode};
///
/// let body = Body::json(&serde_json::json!({ "x": 1 })).expect("json");
/// let encoded = encode("post", body, JsonCodec::Compact).expect("encode");
///
/// assert_eq!(encoded.method.to_string(), "POST");
/// assert_eq!(encoded.payload.as_ref(), br#"{"x":1}"#);
/// assert_eq!(encoded.content_type, Some(ContentType::Json));
/// ```
pub fn encode(method: &str, body: Body, codec: JsonCodec) -> Result<EncodedBody> {
    let method = Method::parse(method)?;
    let kind = body.kind();

    let (payload, content_type) = match body {
        Body::Empty => (Bytes::new(), None),
        Body::Text(text) => (Bytes::from(text), None),
        Body::Stream(mut reader) => {
            let mut buf = BytesMut::new();
            copy_chunked(reader.as_mut(), &mut buf).map_err(Error::Body)?;
            (buf.freeze(), None)
        }
        Body::Bytes(bytes) => (bytes, None),
        Body::File(path) => (read_file(&path)?, None),
        Body::Multipart(mut form) => {
            let content_type = form.content_type();
            (form.build()?, Some(content_type))
        }
        Body::UrlEncoded(mut form) => (Bytes::from(form.build()?), Some(form.content_type())),
        Body::Json(value) => (codec.to_bytes(&value)?, Some(ContentType::Json)),
    };

    tracing::debug!(%method, kind, size = payload.len(), "request body encoded");
    Ok(EncodedBody {
        method,
        payload,
        content_type,
    })
}
