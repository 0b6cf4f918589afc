//! JSON serialization utilities.

use bytes::Bytes;

use crate::Result;

/// JSON output style used when a body or form field falls back to JSON.
///
/// Deserialization is identical for both styles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum JsonCodec {
    /// No insignificant whitespace (`{"x":1}`).
    #[default]
    Compact,
    /// Two-space indented output.
    Pretty,
}

impl JsonCodec {
    /// Serialize a value to JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    ///
    /// # Example
    ///
    /// ```
    /// use httpflex_core::JsonCodec;
    /// use serde::Serialize;
    ///
    /// #[derive(Serialize)]
    /// struct User { name: String }
    ///
    /// let user = User { name: "Alice".to_string() };
    /// let bytes = JsonCodec::Compact.to_bytes(&user).expect("serialize");
    /// assert_eq!(bytes.as_ref(), br#"{"name":"Alice"}"#);
    /// ```
    pub fn to_bytes<T: serde::Serialize + ?Sized>(self, value: &T) -> Result<Bytes> {
        let bytes = match self {
            Self::Compact => serde_json::to_vec(value)?,
            Self::Pretty => serde_json::to_vec_pretty(value)?,
        };
        Ok(Bytes::from(bytes))
    }

    /// Deserialize JSON text with path-aware error messages.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON deserialization fails.
    #[allow(clippy::unused_self)]
    pub fn parse<T: serde::de::DeserializeOwned>(self, text: &str) -> Result<T> {
        from_json(text.as_bytes())
    }
}

/// Serialize a value to compact JSON bytes.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    JsonCodec::Compact.to_bytes(value)
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// Uses `serde_path_to_error` to provide detailed error messages that include
/// the exact path to the field that failed to deserialize.
///
/// # Errors
///
/// Returns an error if JSON deserialization fails, with the error message
/// including the path to the problematic field (e.g., "user.address.city").
///
/// # Example
///
/// ```
/// use httpflex_core::from_json;
/// use serde::Deserialize;
///
/// #[derive(Debug, PartialEq, Deserialize)]
/// struct User { name: String }
///
/// let bytes = br#"{"name":"Alice"}"#;
/// let user: User = from_json(bytes).expect("deserialize");
/// assert_eq!(user, User { name: "Alice".to_string() });
/// ```
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })
}
