//! Multipart form data support for file uploads.
//!
//! [`Multipart`] keeps an insertion-ordered set of named fields and
//! serializes them to `multipart/form-data`. Files, streams and raw bytes
//! become file parts, text is sent as-is and anything else is sent as JSON.
//!
//! # Example
//!
//! ```
//! use httpflex_core::Multipart;
//!
//! let mut form = Multipart::with_boundary("XyZ")
//!     .put("name", "John Doe")
//!     .put("avatar", vec![0x89, 0x50, 0x4E, 0x47]);
//!
//! let body = form.build().expect("build");
//! assert!(body.ends_with(b"--XyZ--\r\n"));
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::field::{Fields, copy_chunked, drain_stream};
use crate::{ContentType, Error, FieldValue, Result};

/// A `multipart/form-data` body under construction.
#[derive(Debug)]
pub struct Multipart {
    boundary: String,
    fields: Fields,
    buffer: BytesMut,
    closed: bool,
}

impl Default for Multipart {
    fn default() -> Self {
        Self::new()
    }
}

impl Multipart {
    /// Create a new empty form with a time-based boundary.
    #[must_use]
    pub fn new() -> Self {
        Self::with_boundary(generate_boundary())
    }

    /// Create a new form with a custom boundary.
    ///
    /// The boundary should be a unique string that doesn't appear in any part data.
    #[must_use]
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            fields: Fields::default(),
            buffer: BytesMut::new(),
            closed: false,
        }
    }

    /// Create a form pre-populated with `fields`.
    #[must_use]
    pub fn from_fields<N, V>(fields: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<String>,
        V: Into<FieldValue>,
    {
        Self::new().put_all(fields)
    }

    /// Add a field, replacing any field with the same name.
    #[must_use]
    pub fn put(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Add several fields.
    #[must_use]
    pub fn put_all<N, V>(mut self, fields: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<String>,
        V: Into<FieldValue>,
    {
        for (name, value) in fields {
            self.insert(name, value);
        }
        self
    }

    /// Add a field in place, returning the value it replaced.
    ///
    /// Ignored once the form is closed.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        if self.closed {
            return None;
        }
        self.fields.insert(name.into(), value.into())
    }

    /// Remove a field.
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    /// Field value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Field names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.names()
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// No field has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Get the boundary string.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// The `multipart/form-data; boundary=<boundary>` content type.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        ContentType::multipart(&self.boundary)
    }

    /// Serialize the current fields.
    ///
    /// Every call starts from an empty buffer, so building twice yields the
    /// same bytes. Stream fields are drained on the first build and kept as
    /// bytes afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FormClosed`] after [`close`](Self::close), or
    /// [`Error::Body`] if a file or stream cannot be read.
    pub fn build(&mut self) -> Result<Bytes> {
        if self.closed {
            return Err(Error::FormClosed);
        }
        self.buffer.clear();

        for (name, value) in self.fields.iter_mut() {
            if let Err(err) = write_part(&mut self.buffer, &self.boundary, name, value) {
                self.buffer.clear();
                return Err(err);
            }
        }

        self.buffer.put_slice(b"--");
        self.buffer.put_slice(self.boundary.as_bytes());
        self.buffer.put_slice(b"--\r\n");

        tracing::debug!(
            fields = self.fields.len(),
            size = self.buffer.len(),
            "multipart form built"
        );
        Ok(Bytes::copy_from_slice(&self.buffer))
    }

    /// Bytes produced by the last [`build`](Self::build), empty if it failed.
    #[must_use]
    pub fn last_built(&self) -> &[u8] {
        &self.buffer
    }

    /// Clear fields and buffer so the form can be reused.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.fields.clear();
    }

    /// Move the fields out, leaving an empty form with the same boundary
    /// and closed state.
    ///
    /// `Body::from(&mut form)` sends the taken fields and keeps `form`
    /// around to be filled again.
    #[must_use]
    pub fn take(&mut self) -> Self {
        let mut empty = Self::with_boundary(self.boundary.clone());
        empty.closed = self.closed;
        std::mem::replace(self, empty)
    }

    /// Release the buffer and the fields. Calling it again has no effect.
    pub fn close(&mut self) {
        self.reset();
        self.buffer = BytesMut::new();
        self.closed = true;
    }

    /// [`close`](Self::close) was called.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Append one framed part.
fn write_part(
    buf: &mut BytesMut,
    boundary: &str,
    name: &str,
    value: &mut FieldValue,
) -> Result<()> {
    buf.put_slice(b"--");
    buf.put_slice(boundary.as_bytes());
    buf.put_slice(b"\r\nContent-Disposition: form-data; name=\"");
    buf.put_slice(name.as_bytes());
    buf.put_slice(b"\"");

    match value {
        FieldValue::File(_) | FieldValue::Stream(_) | FieldValue::Bytes(_) => {
            buf.put_slice(b"; filename=\"");
            buf.put_slice(name.as_bytes());
            buf.put_slice(b"\"\r\n");
            buf.put_slice(ContentType::OctetStream.description().as_bytes());
            buf.put_slice(b"\r\n\r\n");
        }
        FieldValue::Text(_) => buf.put_slice(b"\r\n\r\n"),
        FieldValue::Bool(_) | FieldValue::Int(_) | FieldValue::Float(_) | FieldValue::Json(_) => {
            buf.put_slice(b"\r\n");
            buf.put_slice(ContentType::Json.description().as_bytes());
            buf.put_slice(b"\r\n\r\n");
        }
    }

    match value {
        FieldValue::File(path) => {
            let mut file = std::fs::File::open(&*path).map_err(Error::Body)?;
            copy_chunked(&mut file, buf).map_err(Error::Body)?;
        }
        FieldValue::Stream(_) => {
            if let Some(bytes) = drain_stream(value)? {
                buf.put_slice(&bytes);
            }
        }
        FieldValue::Bytes(bytes) => buf.put_slice(bytes),
        FieldValue::Text(text) => buf.put_slice(text.as_bytes()),
        FieldValue::Bool(flag) => buf.put_slice(&crate::to_json(flag)?),
        FieldValue::Int(number) => buf.put_slice(&crate::to_json(number)?),
        FieldValue::Float(number) => buf.put_slice(&crate::to_json(number)?),
        FieldValue::Json(json) => buf.put_slice(&crate::to_json(json)?),
    }

    buf.put_slice(b"\r\n");
    Ok(())
}

/// Generate a time-based boundary string.
fn generate_boundary() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);

    format!("-FormBoundary{timestamp:x}")
}
