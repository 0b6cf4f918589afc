//! Single-URL download helpers.
//!
//! Every helper accepts `data:` URLs, decoded locally without a network
//! round-trip. Other URLs are fetched with a `GET` through [`HttpFlex`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use base64::Engine;
use bytes::Bytes;
use percent_encoding::percent_decode_str;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::{ByteStream, Error, HttpFlex, Response, Result};

const DATA_SCHEME: &str = "data:";

/// Download the body at `url`.
///
/// The body is returned whatever the status code; a non-2xx status is logged.
///
/// # Errors
///
/// Returns an error if the URL is invalid, a `data:` payload does not decode,
/// or the exchange fails.
pub async fn fetch_bytes(url: &str) -> Result<Bytes> {
    if let Some(data) = decode_data_url(url) {
        return data;
    }
    let response: Response<Bytes> = HttpFlex::new(url)?.exchange("GET", ()).await?;
    warn_on_failure(url, &response);
    Ok(response.into_body())
}

/// Download the body at `url` as a stream of chunks.
///
/// # Errors
///
/// Returns an error if the URL is invalid, a `data:` payload does not decode,
/// or the exchange fails before the response headers.
pub async fn fetch_stream(url: &str) -> Result<ByteStream> {
    if let Some(data) = decode_data_url(url) {
        return data.map(ByteStream::from_bytes);
    }
    let response: Response<ByteStream> = HttpFlex::new(url)?.exchange("GET", ()).await?;
    warn_on_failure(url, &response);
    Ok(response.into_body())
}

/// Download `url` into a new file at `path`.
///
/// Nothing is fetched when `path` already is a regular file. Otherwise the
/// file is created and must not exist yet.
///
/// # Errors
///
/// Returns an error if the download fails or the file cannot be created
/// (for instance when `path` is a directory).
pub async fn download_to(url: &str, path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    if tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| meta.is_file())
    {
        tracing::debug!(path = %path.display(), "file already present, skipping download");
        return Ok(path.to_path_buf());
    }

    let bytes = fetch_bytes(url).await?;
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(&bytes).await?;
    file.flush().await?;

    tracing::debug!(path = %path.display(), size = bytes.len(), "download stored");
    Ok(path.to_path_buf())
}

fn warn_on_failure<B>(url: &str, response: &Response<B>) {
    if !response.is_success() {
        tracing::warn!(%url, status = response.status(), "download answered with an error status");
    }
}

/// Decode a `data:` URL, or `None` when `url` uses another scheme.
///
/// The payload is base64 when the media type ends with `;base64`,
/// percent-encoded text otherwise.
#[must_use]
pub fn decode_data_url(url: &str) -> Option<Result<Bytes>> {
    let rest = url
        .get(..DATA_SCHEME.len())
        .filter(|scheme| scheme.eq_ignore_ascii_case(DATA_SCHEME))
        .and_then(|_| url.get(DATA_SCHEME.len()..))?;

    let Some((meta, payload)) = rest.split_once(',') else {
        return Some(Err(Error::invalid_request("data URL without ',' separator")));
    };

    let decoded = percent_decode_str(payload).collect::<Vec<u8>>();
    let is_base64 = meta
        .rsplit(';')
        .next()
        .is_some_and(|last| last.trim().eq_ignore_ascii_case("base64"));

    if !is_base64 {
        return Some(Ok(Bytes::from(decoded)));
    }

    let compact: Vec<u8> = decoded
        .into_iter()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    Some(
        base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map(Bytes::from)
            .map_err(|e| Error::invalid_request(format!("invalid base64 in data URL: {e}"))),
    )
}

/// Decoded query parameters of `url`. A repeated name keeps its last value.
#[must_use]
pub fn query_params(url: &Url) -> HashMap<String, String> {
    url.query_pairs().into_owned().collect()
}

/// The slice of `text` from the first `{` to the last `}`, both included.
///
/// # Example
///
/// ```
/// use httpflex::extract_json_object;
///
/// let text = r#"callback({"id": 1});"#;
/// assert_eq!(extract_json_object(text), Some(r#"{"id": 1}"#));
/// assert_eq!(extract_json_object("no json here"), None);
/// ```
#[must_use]
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    text.get(start..=end)
}
