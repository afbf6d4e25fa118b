//! Shared test support utilities for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use skeme_core::{
    canonical_url, Error, FetchOptions, ResolveOptions, Result, SerdeYamlDecoder, Transport,
    TransportResponse,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// Host the fixtures are served from. Nothing listens there.
pub const FIXTURE_BASE: &str = "http://not-existing-host:3000/schemas/";

/// Absolute fixture URL for a path relative to the fixture directory
pub fn fixture_url(path: &str) -> String {
    format!("{}{}", FIXTURE_BASE, path)
}

/// Serves files under `tests/fixtures` by URL path, whatever the host.
///
/// Counts calls per canonical URL, can delay every response to keep loads
/// in flight, and can answer chosen paths with a fixed status.
pub struct FixtureTransport {
    root: PathBuf,
    delay: Option<Duration>,
    statuses: HashMap<String, u16>,
    calls: Mutex<HashMap<String, usize>>,
}

impl FixtureTransport {
    pub fn new() -> Self {
        Self {
            root: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures"),
            delay: None,
            statuses: HashMap::new(),
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Answer `url` with `status` and whatever body the fixture has
    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.statuses.insert(url.to_string(), status);
        self
    }

    /// Number of fetches issued for `url`
    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl Transport for FixtureTransport {
    async fn fetch(&self, url: &Url, _options: &FetchOptions) -> Result<TransportResponse> {
        let key = canonical_url(url);
        *self.calls.lock().unwrap().entry(key.clone()).or_default() += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let path = self.root.join(url.path().trim_start_matches('/'));
        let status = self.statuses.get(&key).copied().unwrap_or(200);
        match tokio::fs::read(&path).await {
            Ok(body) => Ok(TransportResponse::new(status, body)),
            Err(_) if status != 200 => Ok(TransportResponse::new(status, Vec::new())),
            Err(e) => Err(Error::fetch_with_source(url.as_str(), "fixture not found", e)),
        }
    }
}

/// Options over `transport` with YAML support, as the functional suite uses
pub fn fixture_options(transport: Arc<FixtureTransport>) -> ResolveOptions {
    ResolveOptions::new(transport).with_yaml(Arc::new(SerdeYamlDecoder))
}

/// Decoded content of a fixture file
pub fn fixture_json(path: &str) -> Value {
    let full = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/schemas").join(path);
    let text = std::fs::read_to_string(&full).expect("Failed to read fixture");
    serde_json::from_str(&text).expect("Failed to parse fixture")
}
