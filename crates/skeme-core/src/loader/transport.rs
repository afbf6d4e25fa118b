//! Document transports
//!
//! A transport turns a URL into a raw response. The resolver never talks to
//! the network or the filesystem directly; callers inject a [`Transport`]
//! and are responsible for any timeout policy beyond what the transport
//! applies itself.
//!
//! Copyright (c) 2025 Skeme Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::redirect::Policy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

pub use reqwest::Method;

/// Request mode, carried for transports that distinguish cross-origin requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    #[default]
    Cors,
    NoCors,
    SameOrigin,
}

/// Whether credentials travel with the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Credentials {
    Omit,
    SameOrigin,
    #[default]
    Include,
}

/// How redirects are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedirectPolicy {
    /// Follow redirects automatically
    #[default]
    Follow,
    /// Hand the 3xx response back to the caller
    Manual,
    /// Treat a redirect as a fetch failure
    Error,
}

/// Options for a single transport call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub method: Method,
    pub mode: RequestMode,
    pub credentials: Credentials,
    pub redirect: RedirectPolicy,
    pub headers: BTreeMap<String, String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            mode: RequestMode::Cors,
            credentials: Credentials::Include,
            redirect: RedirectPolicy::Follow,
            headers: BTreeMap::new(),
        }
    }
}

impl FetchOptions {
    /// Overlay caller overrides on these options. Overrides win, headers are unioned.
    pub fn merged(&self, overrides: &FetchOverrides) -> Self {
        let mut merged = self.clone();
        if let Some(method) = &overrides.method {
            merged.method = method.clone();
        }
        if let Some(mode) = overrides.mode {
            merged.mode = mode;
        }
        if let Some(credentials) = overrides.credentials {
            merged.credentials = credentials;
        }
        if let Some(redirect) = overrides.redirect {
            merged.redirect = redirect;
        }
        for (name, value) in &overrides.headers {
            merged.headers.insert(name.clone(), value.clone());
        }
        merged
    }
}

/// Caller-supplied adjustments merged into every transport call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOverrides {
    pub method: Option<Method>,
    pub mode: Option<RequestMode>,
    pub credentials: Option<Credentials>,
    pub redirect: Option<RedirectPolicy>,
    pub headers: BTreeMap<String, String>,
}

impl FetchOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header sent with every request
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn redirect(mut self, redirect: RedirectPolicy) -> Self {
        self.redirect = Some(redirect);
        self
    }
}

/// Raw response returned by a transport
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    /// Header names are stored lowercased
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// True for 2xx statuses
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Body as UTF-8 text
    pub fn text(&self) -> std::result::Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.body)
    }

    /// Body parsed as JSON
    pub fn json(&self) -> serde_json::Result<Value> {
        serde_json::from_slice(&self.body)
    }
}

/// Retrieves raw documents for URLs
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &Url, options: &FetchOptions) -> Result<TransportResponse>;
}

/// Configuration for [`HttpTransport`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpTransportConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Whether to validate TLS certificates
    pub validate_tls: bool,
    /// Hop limit when following redirects
    pub max_redirects: usize,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("skeme/{}", env!("CARGO_PKG_VERSION")),
            validate_tls: true,
            max_redirects: 10,
        }
    }
}

/// HTTP(S) transport backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    following: reqwest::Client,
    non_following: reqwest::Client,
    config: HttpTransportConfig,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self> {
        let following = Self::build_client(&config, Policy::limited(config.max_redirects))?;
        let non_following = Self::build_client(&config, Policy::none())?;
        Ok(Self {
            following,
            non_following,
            config,
        })
    }

    pub fn with_default_config() -> Result<Self> {
        Self::new(HttpTransportConfig::default())
    }

    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    fn build_client(config: &HttpTransportConfig, policy: Policy) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .danger_accept_invalid_certs(!config.validate_tls)
            .redirect(policy)
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {}", e)))
    }
}

fn is_credential_header(name: &str) -> bool {
    name.eq_ignore_ascii_case("authorization") || name.eq_ignore_ascii_case("cookie")
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &Url, options: &FetchOptions) -> Result<TransportResponse> {
        let client = match options.redirect {
            RedirectPolicy::Follow => &self.following,
            RedirectPolicy::Manual | RedirectPolicy::Error => &self.non_following,
        };

        let mut request = client.request(options.method.clone(), url.clone());
        for (name, value) in &options.headers {
            if options.credentials == Credentials::Omit && is_credential_header(name) {
                trace!(header = %name, "Dropping credential header");
                continue;
            }
            request = request.header(name.as_str(), value.as_str());
        }

        debug!(url = %url, method = %options.method, "Sending HTTP request");
        let response = request
            .send()
            .await
            .map_err(|e| Error::fetch_with_source(url.as_str(), format!("request failed: {}", e), e))?;

        let status = response.status();
        if status.is_redirection() && options.redirect == RedirectPolicy::Error {
            return Err(Error::fetch(
                url.as_str(),
                Some(status.as_u16()),
                format!("redirect not allowed, status: {}", status.as_u16()),
            ));
        }

        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_ascii_lowercase(), value.to_string()))
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::fetch_with_source(url.as_str(), format!("failed to read body: {}", e), e))?;

        Ok(TransportResponse {
            status: status.as_u16(),
            headers,
            body: body.to_vec(),
        })
    }
}

/// Transport for `file://` URLs
#[derive(Debug, Clone, Copy, Default)]
pub struct FileTransport;

#[async_trait]
impl Transport for FileTransport {
    async fn fetch(&self, url: &Url, _options: &FetchOptions) -> Result<TransportResponse> {
        if url.scheme() != "file" {
            return Err(Error::fetch(
                url.as_str(),
                None,
                format!("unsupported scheme '{}' for file transport", url.scheme()),
            ));
        }

        let path = url
            .to_file_path()
            .map_err(|_| Error::fetch(url.as_str(), None, "not a local file path"))?;

        debug!(path = %path.display(), "Reading local document");
        let body = tokio::fs::read(&path).await.map_err(|e| {
            Error::fetch_with_source(url.as_str(), format!("cannot read {}: {}", path.display(), e), e)
        })?;

        Ok(TransportResponse::new(200, body))
    }
}

/// Routes `file` URLs to [`FileTransport`] and `http(s)` URLs to [`HttpTransport`]
#[derive(Debug, Clone)]
pub struct DefaultTransport {
    http: HttpTransport,
    file: FileTransport,
}

impl DefaultTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self> {
        Ok(Self {
            http: HttpTransport::new(config)?,
            file: FileTransport,
        })
    }

    pub fn with_default_config() -> Result<Self> {
        Self::new(HttpTransportConfig::default())
    }
}

#[async_trait]
impl Transport for DefaultTransport {
    async fn fetch(&self, url: &Url, options: &FetchOptions) -> Result<TransportResponse> {
        match url.scheme() {
            "file" => self.file.fetch(url, options).await,
            "http" | "https" => self.http.fetch(url, options).await,
            other => Err(Error::fetch(
                url.as_str(),
                None,
                format!("unsupported scheme '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_fetch_options() {
        let options = FetchOptions::default();
        assert_eq!(options.method, Method::GET);
        assert_eq!(options.mode, RequestMode::Cors);
        assert_eq!(options.credentials, Credentials::Include);
        assert_eq!(options.redirect, RedirectPolicy::Follow);
        assert!(options.headers.is_empty());
    }

    #[test]
    fn test_overrides_win_and_headers_union() {
        let mut base = FetchOptions::default();
        base.headers.insert("accept".to_string(), "application/json".to_string());
        base.headers.insert("x-trace".to_string(), "base".to_string());

        let overrides = FetchOverrides::new()
            .header("x-trace", "override")
            .header("authorization", "Bearer abc")
            .redirect(RedirectPolicy::Manual);

        let merged = base.merged(&overrides);
        assert_eq!(merged.redirect, RedirectPolicy::Manual);
        assert_eq!(merged.credentials, Credentials::Include);
        assert_eq!(merged.headers["accept"], "application/json");
        assert_eq!(merged.headers["x-trace"], "override");
        assert_eq!(merged.headers["authorization"], "Bearer abc");
    }

    #[test]
    fn test_response_helpers() {
        let response = TransportResponse::new(404, r#"{"missing": true}"#)
            .with_header("Content-Type", "application/json");
        assert!(!response.ok());
        assert!(!response.is_server_error());
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.header("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(response.json().unwrap()["missing"], true);

        let response = TransportResponse::new(502, "bad gateway");
        assert!(response.is_server_error());
        assert_eq!(response.text().unwrap(), "bad gateway");
    }

    #[tokio::test]
    async fn test_file_transport_reads_documents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.json");
        fs::write(&path, r#"{"x": 1}"#).unwrap();

        let url = Url::from_file_path(&path).unwrap();
        let response = FileTransport.fetch(&url, &FetchOptions::default()).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.json().unwrap()["x"], 1);
    }

    #[tokio::test]
    async fn test_file_transport_missing_file_is_fetch_error() {
        let dir = tempdir().unwrap();
        let url = Url::from_file_path(dir.path().join("absent.json")).unwrap();
        let err = FileTransport.fetch(&url, &FetchOptions::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Fetch);
    }

    #[tokio::test]
    async fn test_default_transport_rejects_unknown_scheme() {
        let transport = DefaultTransport::with_default_config().unwrap();
        let url = Url::parse("ftp://example.com/doc.json").unwrap();
        let err = transport.fetch(&url, &FetchOptions::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Fetch);
        assert!(err.to_string().contains("unsupported scheme 'ftp'"));
    }
}
