//! Document loading
//!
//! This module provides everything needed to turn a URL into a decoded
//! document:
//! - Pluggable transports (HTTP, local files, test doubles)
//! - JSON and YAML decoding with format detection
//! - A single-flight document cache keyed by canonical URL
//!
//! # Example Usage
//!
//! ```no_run
//! use skeme_core::loader::{DefaultTransport, DocumentCache, DocumentDecoder, DocumentLoader, FetchOverrides, SerdeYamlDecoder};
//! use std::sync::Arc;
//!
//! # async fn example() -> skeme_core::Result<()> {
//! let loader = DocumentLoader::new(
//!     Arc::new(DefaultTransport::with_default_config()?),
//!     DocumentDecoder::new(Some(Arc::new(SerdeYamlDecoder))),
//!     Some(Arc::new(DocumentCache::new())),
//!     &FetchOverrides::new(),
//! );
//! let document = loader.load(&url::Url::parse("https://example.com/openapi.yaml").unwrap()).await?;
//! println!("{}", serde_json::to_string_pretty(&*document).unwrap());
//! # Ok(())
//! # }
//! ```
//!
//! Copyright (c) 2025 Skeme Team
//! Licensed under the Apache-2.0 license

pub mod cache;
pub mod decoder;
pub mod fetcher;
pub mod transport;

pub use cache::{canonical_url, CacheStats, Document, DocumentCache};
pub use decoder::{DocumentDecoder, Format, SerdeYamlDecoder, YamlDecoder};
pub use fetcher::DocumentLoader;
pub use transport::{
    Credentials, DefaultTransport, FetchOptions, FetchOverrides, FileTransport, HttpTransport,
    HttpTransportConfig, Method, RedirectPolicy, RequestMode, Transport, TransportResponse,
};
