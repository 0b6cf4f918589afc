//! Content type catalog.

/// Header name used by every [`ContentType`].
pub const CONTENT_TYPE: &str = "Content-Type";

/// Content type for request bodies.
///
/// The fixed variants cover the common MIME types. Anything else, including
/// computed types such as a multipart boundary, goes through [`ContentType::Custom`],
/// which owns its value so that two requests never share it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// Plain text content type (`text/plain`).
    PlainText,
    /// Form URL-encoded content type (`application/x-www-form-urlencoded`).
    FormUrlEncoded,
    /// JSON content type (`application/json`).
    Json,
    /// XML content type (`application/xml`).
    Xml,
    /// MP3 audio (`audio/mp3`).
    Mp3,
    /// MP4 video (`video/mp4`).
    Mp4,
    /// Binary content type (`application/octet-stream`).
    OctetStream,
    /// Any other header value.
    Custom(String),
}

impl ContentType {
    /// A content type with an arbitrary header value.
    #[must_use]
    pub fn custom(value: impl Into<String>) -> Self {
        Self::Custom(value.into())
    }

    /// The `multipart/form-data` content type for the given boundary.
    #[must_use]
    pub fn multipart(boundary: &str) -> Self {
        Self::Custom(format!("multipart/form-data; boundary={boundary}"))
    }

    /// Get the MIME type string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::PlainText => "text/plain",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
            Self::Json => "application/json",
            Self::Xml => "application/xml",
            Self::Mp3 => "audio/mp3",
            Self::Mp4 => "video/mp4",
            Self::OctetStream => "application/octet-stream",
            Self::Custom(value) => value,
        }
    }

    /// Always `Content-Type`.
    #[must_use]
    pub const fn header_name(&self) -> &'static str {
        CONTENT_TYPE
    }

    /// The `(name, value)` header pair.
    #[must_use]
    pub fn header_values(&self) -> (&'static str, &str) {
        (CONTENT_TYPE, self.as_str())
    }

    /// The header line without terminator, e.g. `Content-Type: application/json`.
    #[must_use]
    pub fn description(&self) -> String {
        format!("{CONTENT_TYPE}: {}", self.as_str())
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
