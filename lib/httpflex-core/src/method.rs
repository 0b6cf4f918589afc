//! HTTP method types.

use derive_more::Display;

use crate::{Error, Result};

/// HTTP request method.
///
/// Any method name is accepted; names outside the standard set are kept
/// upper-cased in [`Method::Extension`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub enum Method {
    /// GET method - retrieve a resource.
    #[display("GET")]
    Get,
    /// POST method - create a resource.
    #[display("POST")]
    Post,
    /// PUT method - replace a resource.
    #[display("PUT")]
    Put,
    /// DELETE method - remove a resource.
    #[display("DELETE")]
    Delete,
    /// PATCH method - partially update a resource.
    #[display("PATCH")]
    Patch,
    /// HEAD method - retrieve headers only.
    #[display("HEAD")]
    Head,
    /// OPTIONS method - retrieve allowed methods.
    #[display("OPTIONS")]
    Options,
    /// CONNECT method - open a tunnel.
    #[display("CONNECT")]
    Connect,
    /// TRACE method - loop the request back.
    #[display("TRACE")]
    Trace,
    /// Any other method, upper-cased.
    #[display("{_0}")]
    Extension(String),
}

impl Method {
    /// Parse a method name, upper-casing it first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if the name is empty or is not a
    /// valid HTTP token.
    ///
    /// # Example
    ///
    /// ```
    /// use httpflex_core::Method;
    ///
    /// assert_eq!(Method::parse("post").expect("method"), Method::Post);
    /// assert_eq!(Method::parse("purge").expect("method").to_string(), "PURGE");
    /// ```
    pub fn parse(name: &str) -> Result<Self> {
        let upper = name.trim().to_ascii_uppercase();
        let method = match upper.as_str() {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            "PATCH" => Self::Patch,
            "HEAD" => Self::Head,
            "OPTIONS" => Self::Options,
            "CONNECT" => Self::Connect,
            "TRACE" => Self::Trace,
            _ => {
                // Reject what http::Method would reject later on.
                http::Method::from_bytes(upper.as_bytes())
                    .map_err(|_| Error::invalid_request(format!("invalid HTTP method: {name:?}")))?;
                Self::Extension(upper)
            }
        };
        Ok(method)
    }

    /// Returns `true` if the method is safe (does not modify resources).
    #[must_use]
    pub const fn is_safe(&self) -> bool {
        matches!(self, Self::Get | Self::Head | Self::Options | Self::Trace)
    }

    /// Returns `true` if the method is idempotent.
    #[must_use]
    pub const fn is_idempotent(&self) -> bool {
        matches!(
            self,
            Self::Get | Self::Head | Self::Options | Self::Trace | Self::Put | Self::Delete
        )
    }
}

impl std::str::FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<Method> for http::Method {
    type Error = Error;

    fn try_from(method: Method) -> Result<Self> {
        let method = match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Delete => Self::DELETE,
            Method::Patch => Self::PATCH,
            Method::Head => Self::HEAD,
            Method::Options => Self::OPTIONS,
            Method::Connect => Self::CONNECT,
            Method::Trace => Self::TRACE,
            Method::Extension(name) => Self::from_bytes(name.as_bytes())
                .map_err(|e| Error::invalid_request(format!("invalid HTTP method: {e}")))?,
        };
        Ok(method)
    }
}

impl From<http::Method> for Method {
    fn from(method: http::Method) -> Self {
        match method {
            http::Method::GET => Self::Get,
            http::Method::POST => Self::Post,
            http::Method::PUT => Self::Put,
            http::Method::DELETE => Self::Delete,
            http::Method::PATCH => Self::Patch,
            http::Method::HEAD => Self::Head,
            http::Method::OPTIONS => Self::Options,
            http::Method::CONNECT => Self::Connect,
            http::Method::TRACE => Self::Trace,
            other => Self::Extension(other.as_str().to_ascii_uppercase()),
        }
    }
}
