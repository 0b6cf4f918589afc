//! `application/x-www-form-urlencoded` bodies.
//!
//! Values are written as-is: [`UrlEncoded::put_encoded`] is the only
//! way to get a value percent-encoded.

use std::io::Read;

use base64::Engine;

use crate::field::{Fields, read_file};
use crate::{ContentType, Error, FieldValue, Result};

/// A URL-encoded form under construction.
#[derive(Debug, Default)]
pub struct UrlEncoded {
    fields: Fields,
    buffer: String,
    closed: bool,
}

impl UrlEncoded {
    /// Create a new empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
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

    /// Add a text field after form-urlencoding it (`a b&c` → `a+b%26c`).
    #[must_use]
    pub fn put_encoded(self, name: impl Into<String>, value: &str) -> Self {
        let encoded: String = url::form_urlencoded::byte_serialize(value.as_bytes()).collect();
        self.put(name, encoded)
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

    /// Always `application/x-www-form-urlencoded`.
    #[must_use]
    pub const fn content_type(&self) -> ContentType {
        ContentType::FormUrlEncoded
    }

    /// Serialize the fields as `name=value` pairs joined by `&`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyForm`] when there is no field,
    /// [`Error::FormClosed`] after [`close`](Self::close), or
    /// [`Error::Body`] if a file or stream cannot be read as text.
    pub fn build(&mut self) -> Result<String> {
        if self.closed {
            return Err(Error::FormClosed);
        }
        if self.fields.is_empty() {
            return Err(Error::EmptyForm);
        }
        self.buffer.clear();

        for (name, value) in self.fields.iter_mut() {
            let text = match stringify(value) {
                Ok(text) => text,
                Err(err) => {
                    self.buffer.clear();
                    return Err(err);
                }
            };
            if !self.buffer.is_empty() {
                self.buffer.push('&');
            }
            self.buffer.push_str(name);
            self.buffer.push('=');
            self.buffer.push_str(&text);
        }

        Ok(self.buffer.clone())
    }

    /// Text produced by the last [`build`](Self::build), empty if it failed.
    #[must_use]
    pub fn last_built(&self) -> &str {
        &self.buffer
    }

    /// Clear fields and buffer so the form can be reused.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.fields.clear();
    }

    /// Move the fields out, leaving an empty form with the same closed state.
    ///
    /// `Body::from(&mut form)` sends the taken fields and keeps `form`
    /// around to be filled again.
    #[must_use]
    pub fn take(&mut self) -> Self {
        let empty = Self {
            closed: self.closed,
            ..Self::default()
        };
        std::mem::replace(self, empty)
    }

    /// Release the buffer and the fields. Calling it again has no effect.
    pub fn close(&mut self) {
        self.reset();
        self.buffer = String::new();
        self.closed = true;
    }

    /// [`close`](Self::close) was called.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }
}

fn stringify(value: &mut FieldValue) -> Result<String> {
    // A stream only yields once: keep its text for the next build.
    if let FieldValue::Stream(reader) = value {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).map_err(Error::Body)?;
        *value = FieldValue::Text(String::from_utf8_lossy(&bytes).into_owned());
    }

    let text = match value {
        FieldValue::File(path) => {
            let bytes = read_file(path)?;
            String::from_utf8(bytes.to_vec()).map_err(|e| {
                Error::Body(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            })?
        }
        FieldValue::Stream(_) => String::new(),
        FieldValue::Bytes(bytes) => base64::engine::general_purpose::STANDARD.encode(bytes),
        FieldValue::Text(text) => text.clone(),
        FieldValue::Bool(flag) => flag.to_string(),
        FieldValue::Int(number) => number.to_string(),
        // Same rendering as a multipart JSON part: `1.0` stays `1.0`.
        FieldValue::Float(number) => serde_json::to_string(number)?,
        FieldValue::Json(json) => json.to_string(),
    };
    Ok(text)
}
