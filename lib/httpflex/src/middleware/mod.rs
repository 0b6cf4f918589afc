//! Tower middleware layers for the httpflex HTTP client.
//!
//! Layers wrap the buffered request path of [`HyperClient`](crate::HyperClient)
//! and are added with [`HyperClientBuilder::layer`](crate::HyperClientBuilder::layer).
//! Streaming requests bypass them.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `middleware-logging` | `.with_logging()` and `.with_debug_logging()` helpers |
//!
//! # Example
//!
//! ```no_run
//! use httpflex::HyperClient;
//! use httpflex::middleware::LoggingLayer;
//!
//! let client = HyperClient::builder()
//!     .layer(LoggingLayer::new())
//!     .build();
//! ```

mod logging;

pub use logging::{LogLevel, Logging, LoggingLayer};

// Re-export tower types for convenience
pub use tower::{Layer, ServiceBuilder};
