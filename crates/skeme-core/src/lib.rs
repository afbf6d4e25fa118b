//! Skeme Core Library
//!
//! Resolves `$ref` references across JSON and YAML documents. Referenced
//! documents are fetched over HTTP(S) or read from `file://` URLs, decoded,
//! cached per canonical URL and substituted into the referencing document
//! until no references remain.
//!
//! # Example
//!
//! ```no_run
//! use skeme_core::{resolve, ResolveOptions};
//!
//! # async fn example() -> skeme_core::Result<()> {
//! let options = ResolveOptions::with_defaults()?.with_keep_refs(true);
//! let schema = resolve("https://example.com/api/openapi.yaml", options).await?;
//! println!("{}", serde_json::to_string_pretty(&schema).unwrap());
//! # Ok(())
//! # }
//! ```
//!
//! Copyright (c) 2025 Skeme Team
//! Licensed under the Apache-2.0 license

#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

pub mod error;
pub mod loader;
pub mod options;
pub mod pointer;
pub mod resolver;

pub use error::{Error, ErrorKind, Result};
pub use loader::{
    canonical_url, CacheStats, DefaultTransport, DocumentCache, FetchOptions, FetchOverrides,
    FileTransport, Format, HttpTransport, HttpTransportConfig, SerdeYamlDecoder, Transport,
    TransportResponse, YamlDecoder,
};
pub use options::ResolveOptions;
pub use pointer::get_nested_value;
pub use resolver::{NodeShape, ReferenceResolver, ResolutionContext, KEEP_REFS_MARKER, REF_KEY};

/// Version of the skeme core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Resolve every reference reachable from `path_or_url` in a fresh session
pub async fn resolve(path_or_url: &str, options: ResolveOptions) -> Result<serde_json::Value> {
    ReferenceResolver::new(options).resolve(path_or_url).await
}
