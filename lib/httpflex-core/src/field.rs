//! Form field values shared by [`Multipart`](crate::Multipart) and
//! [`UrlEncoded`](crate::UrlEncoded).

use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use bytes::{BufMut, Bytes, BytesMut};

use crate::{Error, Result};

/// Size of the intermediate buffer used when copying stream and file content.
pub(crate) const CHUNK_SIZE: usize = 128 * 1024;

/// A blocking byte source, drained at most once.
pub type ByteSource = Box<dyn Read + Send>;

/// The value of a single form field.
///
/// Each form decides how a variant is written on the wire: multipart sends
/// files, streams and bytes as file parts, URL-encoded forms turn everything
/// into text.
pub enum FieldValue {
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Bytes(Bytes),
    /// An open byte source, drained when the form is built.
    Stream(ByteSource),
    /// A file read when the form is built.
    File(PathBuf),
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// Any other value, sent as JSON.
    Json(serde_json::Value),
}

impl FieldValue {
    /// An open byte source.
    pub fn stream(reader: impl Read + Send + 'static) -> Self {
        Self::Stream(Box::new(reader))
    }

    /// A file path.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// Any serializable value, sent as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented as JSON.
    pub fn json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }

    /// Variant name, for logs and `Debug`.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Stream(_) => "stream",
            Self::File(_) => "file",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Json(_) => "json",
        }
    }
}

impl std::fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
            Self::Int(value) => f.debug_tuple("Int").field(value).finish(),
            Self::Float(value) => f.debug_tuple("Float").field(value).finish(),
            Self::Json(value) => f.debug_tuple("Json").field(value).finish(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(value))
    }
}

impl From<&[u8]> for FieldValue {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(Bytes::copy_from_slice(value))
    }
}

impl From<Bytes> for FieldValue {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<PathBuf> for FieldValue {
    fn from(value: PathBuf) -> Self {
        Self::File(value)
    }
}

impl From<&Path> for FieldValue {
    fn from(value: &Path) -> Self {
        Self::File(value.to_path_buf())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

macro_rules! int_field {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    Self::Int(i64::from(value))
                }
            }
        )*
    };
}

int_field!(i8, i16, i32, i64, u8, u16, u32);

/// Integers that may not fit in `i64`: larger values become a JSON number,
/// or decimal text past `u64`.
macro_rules! wide_int_field {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    if let Ok(number) = i64::try_from(value) {
                        Self::Int(number)
                    } else if let Ok(number) = u64::try_from(value) {
                        Self::Json(serde_json::Value::from(number))
                    } else {
                        Self::Text(value.to_string())
                    }
                }
            }
        )*
    };
}

wide_int_field!(u64, usize, isize, i128, u128);

impl From<f32> for FieldValue {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

// ============================================================================
// Ordered fields
// ============================================================================

/// Insertion-ordered, unique-name field list.
///
/// Overwriting a name keeps its original position.
#[derive(Debug, Default)]
pub(crate) struct Fields {
    entries: Vec<(String, FieldValue)>,
}

impl Fields {
    pub(crate) fn insert(&mut self, name: String, value: FieldValue) -> Option<FieldValue> {
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<FieldValue> {
        let index = self.entries.iter().position(|(existing, _)| existing == name)?;
        Some(self.entries.remove(index).1)
    }

    pub(crate) fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut FieldValue)> {
        self.entries
            .iter_mut()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

// ============================================================================
// Chunked copy
// ============================================================================

/// Copy everything from `reader` into `buf` through a bounded chunk.
pub(crate) fn copy_chunked(reader: &mut dyn Read, buf: &mut BytesMut) -> std::io::Result<usize> {
    let mut chunk = vec![0_u8; CHUNK_SIZE];
    let mut total = 0;
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => return Ok(total),
            Ok(read) => {
                buf.put_slice(chunk.get(..read).unwrap_or_default());
                total += read;
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
}

/// Drain a stream field and replace it with the bytes it produced.
///
/// Forms can be built more than once; a stream only yields its content once.
pub(crate) fn drain_stream(value: &mut FieldValue) -> Result<Option<Bytes>> {
    let FieldValue::Stream(reader) = value else {
        return Ok(None);
    };
    let mut buf = BytesMut::new();
    copy_chunked(reader.as_mut(), &mut buf).map_err(Error::Body)?;
    let bytes = buf.freeze();
    *value = FieldValue::Bytes(bytes.clone());
    Ok(Some(bytes))
}

/// Read a whole file through a bounded chunk.
pub(crate) fn read_file(path: &Path) -> Result<Bytes> {
    let mut file = std::fs::File::open(path).map_err(Error::Body)?;
    let mut buf = BytesMut::new();
    copy_chunked(&mut file, &mut buf).map_err(Error::Body)?;
    Ok(buf.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reader that hands out at most `step` bytes per call.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        step: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let end = (self.pos + self.step).min(self.data.len());
            let slice = self.data.get(self.pos..end).unwrap_or_default();
            let n = slice.len().min(buf.len());
            buf.get_mut(..n)
                .unwrap_or_default()
                .copy_from_slice(slice.get(..n).unwrap_or_default());
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn conversions_pick_variants() {
        assert!(matches!(FieldValue::from("a"), FieldValue::Text(_)));
        assert!(matches!(FieldValue::from(vec![1_u8]), FieldValue::Bytes(_)));
        assert!(matches!(
            FieldValue::from(PathBuf::from("a.txt")),
            FieldValue::File(_)
        ));
        assert!(matches!(FieldValue::from(7_u32), FieldValue::Int(7)));
        assert!(matches!(FieldValue::from(true), FieldValue::Bool(true)));
        assert!(matches!(
            FieldValue::json(&serde_json::json!({"a": 1})).expect("json"),
            FieldValue::Json(_)
        ));
    }

    #[test]
    fn fields_keep_first_position_on_overwrite() {
        let mut fields = Fields::default();
        fields.insert("a".to_string(), FieldValue::from(1));
        fields.insert("b".to_string(), FieldValue::from(2));
        let previous = fields.insert("a".to_string(), FieldValue::from(3));

        assert!(matches!(previous, Some(FieldValue::Int(1))));
        assert_eq!(fields.names().collect::<Vec<_>>(), ["a", "b"]);
        assert!(matches!(fields.get("a"), Some(FieldValue::Int(3))));
    }

    #[test]
    fn fields_remove() {
        let mut fields = Fields::default();
        fields.insert("a".to_string(), FieldValue::from("x"));
        assert!(fields.remove("a").is_some());
        assert!(fields.remove("a").is_none());
        assert!(fields.is_empty());
    }

    #[test]
    fn copy_chunked_handles_short_reads() {
        let data: Vec<u8> = (0..=255).cycle().take(CHUNK_SIZE * 2 + 17).collect();
        let mut reader = Trickle {
            data: data.clone(),
            pos: 0,
            step: 1000,
        };
        let mut buf = BytesMut::new();

        let copied = copy_chunked(&mut reader, &mut buf).expect("copy");

        assert_eq!(copied, data.len());
        assert_eq!(buf.as_ref(), data.as_slice());
    }

    #[test]
    fn drain_stream_materializes_bytes() {
        let mut value = FieldValue::stream(std::io::Cursor::new(b"payload".to_vec()));

        let drained = drain_stream(&mut value).expect("drain");

        assert_eq!(drained.as_deref(), Some(b"payload".as_slice()));
        assert!(matches!(value, FieldValue::Bytes(ref b) if b.as_ref() == b"payload"));
    }

    #[test]
    fn read_file_missing_is_body_error() {
        let err = read_file(Path::new("/definitely/not/here.bin")).expect_err("missing file");
        assert!(err.is_encoding());
    }

    #[test]
    fn wide_integers_keep_their_value() {
        assert!(matches!(FieldValue::from(42_u64), FieldValue::Int(42)));
        assert!(matches!(FieldValue::from(-3_isize), FieldValue::Int(-3)));
        assert!(
            matches!(FieldValue::from(u64::MAX), FieldValue::Json(ref n) if n.as_u64() == Some(u64::MAX))
        );
        assert!(
            matches!(FieldValue::from(u128::MAX), FieldValue::Text(ref t) if *t == u128::MAX.to_string())
        );
    }
}
