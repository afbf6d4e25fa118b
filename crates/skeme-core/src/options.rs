//! Options for a resolution session

use crate::error::Result;
use crate::loader::{
    DefaultTransport, DocumentCache, FetchOverrides, HttpTransportConfig, SerdeYamlDecoder,
    Transport, YamlDecoder,
};
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Everything a [`crate::ReferenceResolver`] needs from its caller
#[derive(Clone)]
pub struct ResolveOptions {
    /// Transport used for every document fetch
    pub transport: Arc<dyn Transport>,
    /// YAML capability; without it YAML documents are decoded as JSON
    pub yaml: Option<Arc<dyn YamlDecoder>>,
    /// Merged into every transport call
    pub fetch_options: FetchOverrides,
    /// Base for a relative root input
    pub base_url: Option<Url>,
    /// Load each canonical URL at most once per session
    pub cache: bool,
    /// Cache to use instead of a fresh one, for sharing across sessions
    pub shared_cache: Option<Arc<DocumentCache>>,
    /// Merge reference siblings and keep the original `$ref` under a marker
    pub keep_refs: bool,
    /// Fail on objects whose `$ref` is not a string instead of treating them as plain objects
    pub strict_refs: bool,
}

impl fmt::Debug for ResolveOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveOptions")
            .field("yaml", &self.yaml.is_some())
            .field("fetch_options", &self.fetch_options)
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .field("cache", &self.cache)
            .field("shared_cache", &self.shared_cache.is_some())
            .field("keep_refs", &self.keep_refs)
            .field("strict_refs", &self.strict_refs)
            .finish()
    }
}

impl ResolveOptions {
    /// Options around an explicit transport, with no YAML support
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            yaml: None,
            fetch_options: FetchOverrides::default(),
            base_url: None,
            cache: true,
            shared_cache: None,
            keep_refs: false,
            strict_refs: false,
        }
    }

    /// HTTP and file transport plus serde_yaml decoding
    pub fn with_defaults() -> Result<Self> {
        Self::with_http_config(HttpTransportConfig::default())
    }

    pub fn with_http_config(config: HttpTransportConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(DefaultTransport::new(config)?)).with_yaml(Arc::new(SerdeYamlDecoder)))
    }

    pub fn with_yaml(mut self, yaml: Arc<dyn YamlDecoder>) -> Self {
        self.yaml = Some(yaml);
        self
    }

    pub fn with_fetch_options(mut self, overrides: FetchOverrides) -> Self {
        self.fetch_options = overrides;
        self
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache = enabled;
        self
    }

    /// Use `cache` for this session. Implies caching is enabled.
    pub fn with_shared_cache(mut self, cache: Arc<DocumentCache>) -> Self {
        self.cache = true;
        self.shared_cache = Some(cache);
        self
    }

    pub fn with_keep_refs(mut self, keep_refs: bool) -> Self {
        self.keep_refs = keep_refs;
        self
    }

    pub fn with_strict_refs(mut self, strict_refs: bool) -> Self {
        self.strict_refs = strict_refs;
        self
    }
}
