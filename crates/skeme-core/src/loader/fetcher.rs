//! Document loading: transport, status policy, decoding and caching
//!
//! Copyright (c) 2025 Skeme Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::loader::cache::{canonical_url, Document, DocumentCache};
use crate::loader::decoder::DocumentDecoder;
use crate::loader::transport::{FetchOptions, FetchOverrides, Transport};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};
use url::Url;

/// Loads documents by URL, at most once per canonical URL when caching
#[derive(Clone)]
pub struct DocumentLoader {
    transport: Arc<dyn Transport>,
    decoder: DocumentDecoder,
    cache: Option<Arc<DocumentCache>>,
    fetch_options: FetchOptions,
}

impl fmt::Debug for DocumentLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentLoader")
            .field("decoder", &self.decoder)
            .field("cache", &self.cache)
            .field("fetch_options", &self.fetch_options)
            .finish_non_exhaustive()
    }
}

impl DocumentLoader {
    /// Create a loader. `cache: None` fetches on every call.
    pub fn new(
        transport: Arc<dyn Transport>,
        decoder: DocumentDecoder,
        cache: Option<Arc<DocumentCache>>,
        overrides: &FetchOverrides,
    ) -> Self {
        Self {
            transport,
            decoder,
            cache,
            fetch_options: FetchOptions::default().merged(overrides),
        }
    }

    /// Options sent with every transport call
    pub fn fetch_options(&self) -> &FetchOptions {
        &self.fetch_options
    }

    pub fn cache(&self) -> Option<&Arc<DocumentCache>> {
        self.cache.as_ref()
    }

    /// Load the document behind `url`, ignoring its fragment
    pub async fn load(&self, url: &Url) -> Result<Document> {
        let key = canonical_url(url);
        match &self.cache {
            Some(cache) => cache.get_or_load(&key, || self.fetch_and_decode(url)).await,
            None => self.fetch_and_decode(url).await.map(Arc::new),
        }
    }

    #[instrument(level = "debug", skip(self, url), fields(url = %url))]
    async fn fetch_and_decode(&self, url: &Url) -> Result<Value> {
        let response = self.transport.fetch(url, &self.fetch_options).await?;
        debug!(status = response.status, bytes = response.body.len(), "Fetched document");

        // 4xx responses are decoded like any other payload; only server
        // errors abort the load.
        if response.is_server_error() {
            return Err(Error::fetch(
                url.as_str(),
                Some(response.status),
                format!("status: {}", response.status),
            ));
        }

        self.decoder.decode(&response, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::loader::decoder::SerdeYamlDecoder;
    use crate::loader::transport::TransportResponse;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Serves one canned response and records what it was asked for
    struct CannedTransport {
        response: TransportResponse,
        calls: AtomicUsize,
        seen_options: Mutex<Option<FetchOptions>>,
    }

    impl CannedTransport {
        fn new(response: TransportResponse) -> Arc<Self> {
            Arc::new(Self {
                response,
                calls: AtomicUsize::new(0),
                seen_options: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl Transport for CannedTransport {
        async fn fetch(&self, _url: &Url, options: &FetchOptions) -> Result<TransportResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.seen_options.lock().unwrap() = Some(options.clone());
            Ok(self.response.clone())
        }
    }

    fn loader(transport: Arc<CannedTransport>, cache: Option<Arc<DocumentCache>>) -> DocumentLoader {
        DocumentLoader::new(
            transport,
            DocumentDecoder::new(Some(Arc::new(SerdeYamlDecoder))),
            cache,
            &FetchOverrides::new().header("x-api-key", "k"),
        )
    }

    #[tokio::test]
    async fn test_cached_loader_fetches_once_per_canonical_url() {
        let transport = CannedTransport::new(TransportResponse::new(200, r#"{"a": {"b": 1}}"#));
        let cache = Arc::new(DocumentCache::new());
        let loader = loader(transport.clone(), Some(cache.clone()));

        let first = loader.load(&Url::parse("http://h/doc.json#a").unwrap()).await.unwrap();
        let second = loader.load(&Url::parse("http://h/doc.json#a/b").unwrap()).await.unwrap();

        assert_eq!(*first, json!({"a": {"b": 1}}));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert!(cache.contains("http://h/doc.json"));
    }

    #[tokio::test]
    async fn test_uncached_loader_fetches_every_time() {
        let transport = CannedTransport::new(TransportResponse::new(200, "[]"));
        let loader = loader(transport.clone(), None);
        let url = Url::parse("http://h/doc.json").unwrap();

        loader.load(&url).await.unwrap();
        loader.load(&url).await.unwrap();
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_transport_receives_merged_defaults() {
        let transport = CannedTransport::new(TransportResponse::new(200, "{}"));
        let loader = loader(transport.clone(), None);
        loader.load(&Url::parse("http://h/doc.json").unwrap()).await.unwrap();

        let seen = transport.seen_options.lock().unwrap().clone().unwrap();
        assert_eq!(seen.method, crate::loader::transport::Method::GET);
        assert_eq!(seen.headers["x-api-key"], "k");
    }

    #[tokio::test]
    async fn test_server_errors_fail_but_client_errors_pass_through() {
        let transport = CannedTransport::new(TransportResponse::new(503, "{}"));
        let err = loader(transport, None)
            .load(&Url::parse("http://h/doc.json").unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Fetch);
        assert_eq!(err.status(), Some(503));

        let transport = CannedTransport::new(TransportResponse::new(404, r#"{"error": "not found"}"#));
        let document = loader(transport, None)
            .load(&Url::parse("http://h/doc.json").unwrap())
            .await
            .unwrap();
        assert_eq!(*document, json!({"error": "not found"}));
    }

    #[tokio::test]
    async fn test_yaml_content_type_is_honored() {
        let response = TransportResponse::new(200, "list:\n  - 1\n  - 2\n").with_header("Content-Type", "text/yaml");
        let transport = CannedTransport::new(response);
        let document = loader(transport, None)
            .load(&Url::parse("http://h/spec").unwrap())
            .await
            .unwrap();
        assert_eq!(*document, json!({"list": [1, 2]}));
    }
}
