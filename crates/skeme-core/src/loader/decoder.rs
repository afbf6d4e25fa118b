//! Format detection and decoding of fetched documents
//!
//! Copyright (c) 2025 Skeme Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::loader::transport::TransportResponse;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::warn;
use url::Url;

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// YAML format (.yaml, .yml, text/yaml)
    Yaml,
    /// JSON format (everything else)
    Json,
}

impl Format {
    /// Decide the format of a response.
    ///
    /// YAML when the `Content-Type` header contains `text/yaml` or when the
    /// last path segment of the URL ends in `.yml`/`.yaml`; JSON otherwise.
    pub fn detect(response: &TransportResponse, url: &Url) -> Self {
        let yaml_content_type = response
            .header("content-type")
            .map(|content_type| content_type.contains("text/yaml"))
            .unwrap_or(false);

        if yaml_content_type || Self::from_url(url) == Some(Format::Yaml) {
            Format::Yaml
        } else {
            Format::Json
        }
    }

    /// Format implied by the extension of the URL's last path segment
    pub fn from_url(url: &Url) -> Option<Self> {
        let segment = url.path_segments()?.next_back()?;
        let (_, extension) = segment.rsplit_once('.')?;
        match extension.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(Format::Yaml),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Yaml => write!(f, "YAML"),
            Format::Json => write!(f, "JSON"),
        }
    }
}

/// Parses YAML text into the same value shape JSON decoding produces
pub trait YamlDecoder: Send + Sync {
    fn load(&self, text: &str) -> anyhow::Result<Value>;
}

/// [`YamlDecoder`] backed by serde_yaml
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdeYamlDecoder;

impl YamlDecoder for SerdeYamlDecoder {
    fn load(&self, text: &str) -> anyhow::Result<Value> {
        // Parse as YAML first so YAML-specific errors surface as such
        let yaml_value: serde_yaml::Value = serde_yaml::from_str(text)?;
        Ok(serde_json::to_value(yaml_value)?)
    }
}

/// Turns transport responses into value trees
#[derive(Clone, Default)]
pub struct DocumentDecoder {
    yaml: Option<Arc<dyn YamlDecoder>>,
}

impl fmt::Debug for DocumentDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentDecoder")
            .field("yaml", &self.yaml.is_some())
            .finish()
    }
}

impl DocumentDecoder {
    pub fn new(yaml: Option<Arc<dyn YamlDecoder>>) -> Self {
        Self { yaml }
    }

    pub fn supports_yaml(&self) -> bool {
        self.yaml.is_some()
    }

    /// Decode a response fetched from `url`
    pub fn decode(&self, response: &TransportResponse, url: &Url) -> Result<Value> {
        match Format::detect(response, url) {
            Format::Yaml => match &self.yaml {
                Some(yaml) => {
                    let text = response
                        .text()
                        .map_err(|e| Error::decode(url.as_str(), Format::Yaml, e))?;
                    yaml.load(text)
                        .map_err(|e| Error::decode(url.as_str(), Format::Yaml, e))
                }
                None => {
                    warn!(
                        url = %url,
                        "No YAML decoder configured, attempting to decode YAML document as JSON"
                    );
                    self.decode_json(response, url)
                }
            },
            Format::Json => self.decode_json(response, url),
        }
    }

    fn decode_json(&self, response: &TransportResponse, url: &Url) -> Result<Value> {
        response
            .json()
            .map_err(|e| Error::decode(url.as_str(), Format::Json, e))
    }
}
