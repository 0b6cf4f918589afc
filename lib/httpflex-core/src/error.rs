//! Error types for httpflex.

use derive_more::{Display, Error, From};

// ============================================================================
// Error Kind
// ============================================================================

/// Broad classification of an [`Error`].
///
/// Lets callers decide on a policy per failure class without matching on
/// every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ErrorKind {
    /// The request body could not be serialized or read.
    #[display("encoding")]
    Encoding,
    /// A form container was used outside of its valid lifecycle.
    #[display("precondition")]
    Precondition,
    /// The exchange with the server failed.
    #[display("transport")]
    Transport,
    /// The response body does not match the requested shape.
    #[display("decode")]
    Decode,
    /// The target address or request configuration is invalid.
    #[display("configuration")]
    Configuration,
    /// Local file system failure outside of body encoding.
    #[display("io")]
    Io,
}

// ============================================================================
// Error Type
// ============================================================================

/// Main error type for httpflex operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// Reading a stream or file body failed.
    #[display("failed to read request body: {_0}")]
    #[from(skip)]
    Body(std::io::Error),

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// A URL-encoded form was built without any field.
    #[display("cannot build an empty URL-encoded form")]
    #[from(skip)]
    EmptyForm,

    /// A form was built after it was closed.
    #[display("form is closed")]
    #[from(skip)]
    FormClosed,

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "user.address.city").
        path: String,
        /// Error message.
        message: String,
    },

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    /// Invalid request configuration.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// File system error while storing a download.
    #[display("I/O error: {_0}")]
    #[from]
    Io(std::io::Error),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// The failure class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Body(_) | Self::JsonSerialization(_) => ErrorKind::Encoding,
            Self::EmptyForm | Self::FormClosed => ErrorKind::Precondition,
            Self::Connection(_) | Self::Tls(_) | Self::Timeout => ErrorKind::Transport,
            Self::JsonDeserialization { .. } => ErrorKind::Decode,
            Self::InvalidUrl(_) | Self::InvalidRequest(_) => ErrorKind::Configuration,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns `true` if the request body could not be produced.
    #[must_use]
    pub const fn is_encoding(&self) -> bool {
        matches!(self.kind(), ErrorKind::Encoding)
    }

    /// Returns `true` if the response body did not match the requested shape.
    #[must_use]
    pub const fn is_decode(&self) -> bool {
        matches!(self.kind(), ErrorKind::Decode)
    }
}

// ============================================================================
// Log-and-continue
// ============================================================================

/// Opt-in log-and-continue handling for fallible operations.
///
/// # Example
///
/// ```
/// use httpflex_core::{Error, ResultExt};
///
/// let result: httpflex_core::Result<u32> = Err(Error::Timeout);
/// assert_eq!(result.log_err(), None);
/// ```
pub trait ResultExt<T> {
    /// Log the error at `warn` level and turn it into `None`.
    fn log_err(self) -> Option<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(error = %err, kind = %err.kind(), "request failed, continuing without a value");
                None
            }
        }
    }
}
