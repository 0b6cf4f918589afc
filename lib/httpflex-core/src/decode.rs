//! Response decoding.
//!
//! The type a caller asks for decides how the body is received: a
//! [`ByteStream`] is handed over unread, bytes are buffered, everything
//! else is read as text first. [`Decode::MODE`] carries that choice so the
//! transport knows it before the exchange starts.

use bytes::Bytes;
use derive_more::Display;
use serde::de::DeserializeOwned;

use crate::{ByteStream, Error, JsonCodec, Result};

/// How the transport should hand over a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ReceiveMode {
    /// Unread chunk stream.
    #[display("stream")]
    Stream,
    /// Fully buffered bytes.
    #[display("bytes")]
    Bytes,
    /// Fully buffered text.
    #[display("text")]
    Text,
}

/// A response body as handed over by the transport.
#[derive(Debug)]
pub enum Received {
    /// Unread chunk stream.
    Stream(ByteStream),
    /// Buffered bytes.
    Bytes(Bytes),
    /// Buffered text.
    Text(String),
}

impl Received {
    /// The mode this body was received in.
    #[must_use]
    pub const fn mode(&self) -> ReceiveMode {
        match self {
            Self::Stream(_) => ReceiveMode::Stream,
            Self::Bytes(_) => ReceiveMode::Bytes,
            Self::Text(_) => ReceiveMode::Text,
        }
    }

    /// Turn buffered bytes into text, replacing invalid UTF-8 sequences.
    #[must_use]
    pub fn text_from(bytes: &[u8]) -> Self {
        Self::Text(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Buffer the body into bytes, draining a stream if needed.
    ///
    /// # Errors
    ///
    /// Returns the first error yielded by a stream.
    pub async fn into_bytes(self) -> Result<Bytes> {
        match self {
            Self::Stream(stream) => stream.collect_bytes().await,
            Self::Bytes(bytes) => Ok(bytes),
            Self::Text(text) => Ok(Bytes::from(text)),
        }
    }

    fn into_text(self) -> Result<String> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Bytes(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Self::Stream(_) => Err(unread_stream(ReceiveMode::Text)),
        }
    }

    fn into_buffered(self) -> Result<Bytes> {
        match self {
            Self::Bytes(bytes) => Ok(bytes),
            Self::Text(text) => Ok(Bytes::from(text)),
            Self::Stream(_) => Err(unread_stream(ReceiveMode::Bytes)),
        }
    }
}

/// A stream cannot be drained synchronously: use [`Received::into_bytes`].
fn unread_stream(expected: ReceiveMode) -> Error {
    Error::invalid_request(format!(
        "received an unread stream where a {expected} body was expected"
    ))
}

/// A shape a response body can be decoded into.
///
/// # Example
///
/// ```
/// use httpflex_core::{Decode, JsonCodec, ReceiveMode, Received};
///
/// assert_eq!(<String as Decode>::MODE, ReceiveMode::Text);
///
/// let value = serde_json::Value::decode(Received::Text(r#"{"a":1}"#.into()), JsonCodec::Compact)
///     .expect("decode");
/// assert_eq!(value["a"], 1);
/// ```
pub trait Decode: Sized {
    /// How the transport must hand over the body.
    const MODE: ReceiveMode;

    /// Convert the received body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::JsonDeserialization`] when the body does not parse
    /// into the requested type, or [`Error::InvalidRequest`] when a buffered
    /// shape is handed an unread stream.
    fn decode(received: Received, codec: JsonCodec) -> Result<Self>;
}

impl Decode for ByteStream {
    const MODE: ReceiveMode = ReceiveMode::Stream;

    fn decode(received: Received, _codec: JsonCodec) -> Result<Self> {
        let stream = match received {
            Received::Stream(stream) => stream,
            Received::Bytes(bytes) => Self::from_bytes(bytes),
            Received::Text(text) => Self::from_bytes(Bytes::from(text)),
        };
        Ok(stream)
    }
}

impl Decode for Bytes {
    const MODE: ReceiveMode = ReceiveMode::Bytes;

    fn decode(received: Received, _codec: JsonCodec) -> Result<Self> {
        received.into_buffered()
    }
}

impl Decode for Vec<u8> {
    const MODE: ReceiveMode = ReceiveMode::Bytes;

    fn decode(received: Received, _codec: JsonCodec) -> Result<Self> {
        received.into_buffered().map(|bytes| bytes.to_vec())
    }
}

impl Decode for String {
    const MODE: ReceiveMode = ReceiveMode::Text;

    fn decode(received: Received, _codec: JsonCodec) -> Result<Self> {
        received.into_text()
    }
}

impl Decode for () {
    const MODE: ReceiveMode = ReceiveMode::Text;

    fn decode(_received: Received, _codec: JsonCodec) -> Result<Self> {
        Ok(())
    }
}

impl Decode for serde_json::Value {
    const MODE: ReceiveMode = ReceiveMode::Text;

    fn decode(received: Received, codec: JsonCodec) -> Result<Self> {
        codec.parse(&received.into_text()?)
    }
}

/// Decode the body as JSON into `T`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Unwrap the decoded value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: DeserializeOwned> Decode for Json<T> {
    const MODE: ReceiveMode = ReceiveMode::Text;

    fn decode(received: Received, codec: JsonCodec) -> Result<Self> {
        codec.parse(&received.into_text()?).map(Json)
    }
}
