//! Error types for the skeme core library
//!
//! Every failure aborts the top-level resolution: nothing in the engine
//! recovers from these errors or returns partial results.

use crate::loader::decoder::Format;
use thiserror::Error;

/// Main error type for reference resolution
#[derive(Error, Debug)]
pub enum Error {
    /// Transport failure or a server-side (5xx) response status
    #[error("cannot resolve url {url}: {message}")]
    Fetch {
        url: String,
        status: Option<u16>,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Payload could not be parsed as the inferred format
    #[error("failed to decode {format} document {url}: {message}")]
    Decode {
        url: String,
        format: Format,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Fragment path does not exist inside the target document
    #[error("The object\n  {document}\n  cannot be resolved with the hash: {fragment}\n  ")]
    PointerResolution { document: String, fragment: String },

    /// A reference chain revisited a document already on the current path
    #[error("reference cycle for {url} ({chain})")]
    CycleDetected { url: String, chain: String },

    /// A node could not be classified as scalar, sequence, mapping or reference
    #[error("unknown value shape in {url}: {shape}")]
    UnknownValueShape { url: String, shape: String },

    /// Input could not be turned into an absolute URL
    #[error("invalid url '{input}'{}: {source}", .base.as_ref().map(|b| format!(" relative to {}", b)).unwrap_or_default())]
    InvalidUrl {
        input: String,
        base: Option<String>,
        #[source]
        source: url::ParseError,
    },

    /// Caller supplied options that cannot work together
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Discriminant of [`Error`] without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Fetch,
    Decode,
    PointerResolution,
    CycleDetected,
    UnknownValueShape,
    InvalidUrl,
    Configuration,
}

impl Error {
    /// Create a fetch error without an underlying cause
    pub fn fetch(url: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            status,
            message: message.into(),
            source: None,
        }
    }

    /// Create a fetch error wrapping a transport error
    pub fn fetch_with_source(
        url: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Fetch {
            url: url.into(),
            status: None,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a decode error wrapping the parser error
    pub fn decode(url: impl Into<String>, format: Format, source: impl Into<anyhow::Error>) -> Self {
        let source = source.into();
        Self::Decode {
            url: url.into(),
            format,
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Create a pointer resolution error, serializing the target for diagnosis
    pub fn pointer_resolution(document: &serde_json::Value, fragment: impl Into<String>) -> Self {
        Self::PointerResolution {
            document: serde_json::to_string(document).unwrap_or_else(|_| "<unserializable>".to_string()),
            fragment: fragment.into(),
        }
    }

    /// Create a cycle error from the chain that led back to `url`
    pub fn cycle_detected(url: impl Into<String>, chain: &[String]) -> Self {
        let url = url.into();
        let chain = chain
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(url.as_str()))
            .collect::<Vec<_>>()
            .join(" -> ");
        Self::CycleDetected { url, chain }
    }

    /// Create an unknown shape error
    pub fn unknown_value_shape(url: impl Into<String>, shape: impl Into<String>) -> Self {
        Self::UnknownValueShape {
            url: url.into(),
            shape: shape.into(),
        }
    }

    /// Create an invalid URL error
    pub fn invalid_url(input: impl Into<String>, base: Option<&url::Url>, source: url::ParseError) -> Self {
        Self::InvalidUrl {
            input: input.into(),
            base: base.map(|b| b.to_string()),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Copy of this error without its source chain. The message already
    /// describes the cause, so kind, URL and status are preserved.
    pub fn detached(&self) -> Self {
        match self {
            Self::Fetch { url, status, message, .. } => Self::Fetch {
                url: url.clone(),
                status: *status,
                message: message.clone(),
                source: None,
            },
            Self::Decode { url, format, message, .. } => Self::Decode {
                url: url.clone(),
                format: *format,
                message: message.clone(),
                source: None,
            },
            Self::PointerResolution { document, fragment } => Self::PointerResolution {
                document: document.clone(),
                fragment: fragment.clone(),
            },
            Self::CycleDetected { url, chain } => Self::CycleDetected {
                url: url.clone(),
                chain: chain.clone(),
            },
            Self::UnknownValueShape { url, shape } => Self::UnknownValueShape {
                url: url.clone(),
                shape: shape.clone(),
            },
            Self::InvalidUrl { input, base, source } => Self::InvalidUrl {
                input: input.clone(),
                base: base.clone(),
                source: *source,
            },
            Self::Configuration { message } => Self::Configuration {
                message: message.clone(),
            },
        }
    }

    /// The kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Fetch { .. } => ErrorKind::Fetch,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::PointerResolution { .. } => ErrorKind::PointerResolution,
            Self::CycleDetected { .. } => ErrorKind::CycleDetected,
            Self::UnknownValueShape { .. } => ErrorKind::UnknownValueShape,
            Self::InvalidUrl { .. } => ErrorKind::InvalidUrl,
            Self::Configuration { .. } => ErrorKind::Configuration,
        }
    }

    /// Get the URL associated with this error, if any
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Fetch { url, .. }
            | Self::Decode { url, .. }
            | Self::CycleDetected { url, .. }
            | Self::UnknownValueShape { url, .. } => Some(url),
            _ => None,
        }
    }

    /// HTTP status reported by the transport, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Fetch { status, .. } => *status,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cycle_message_names_offending_url() {
        let err = Error::cycle_detected(
            "http://host/a.json",
            &["http://host/a.json".to_string(), "http://host/b.json".to_string()],
        );
        assert_eq!(err.kind(), ErrorKind::CycleDetected);
        let message = err.to_string();
        assert!(message.contains("reference cycle for http://host/a.json"));
        assert!(message.contains("http://host/a.json -> http://host/b.json -> http://host/a.json"));
        assert_eq!(err.url(), Some("http://host/a.json"));
    }

    #[test]
    fn test_pointer_message_embeds_document_and_hash() {
        let err = Error::pointer_resolution(&json!({"x": 1}), "#x/y");
        let message = err.to_string();
        assert!(message.contains(r#"{"x":1}"#));
        assert!(message.contains("cannot be resolved with the hash: #x/y"));
        assert_eq!(err.url(), None);
    }

    #[test]
    fn test_fetch_error_carries_status() {
        let err = Error::fetch("http://host/a.json", Some(503), "status: 503");
        assert_eq!(err.kind(), ErrorKind::Fetch);
        assert_eq!(err.status(), Some(503));
        assert!(err.to_string().starts_with("cannot resolve url http://host/a.json"));
    }

    #[test]
    fn test_detached_copy_keeps_kind_and_message() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Error::fetch_with_source("http://host/a.json", "cannot read: gone", io);
        let copy = err.detached();
        assert_eq!(copy.kind(), ErrorKind::Fetch);
        assert_eq!(copy.url(), Some("http://host/a.json"));
        assert_eq!(copy.to_string(), err.to_string());
        assert!(std::error::Error::source(&err).is_some());
        assert!(std::error::Error::source(&copy).is_none());

        let err = Error::decode("http://host/a.yaml", Format::Yaml, anyhow::anyhow!("bad indent"));
        assert!(matches!(err.detached(), Error::Decode { format: Format::Yaml, .. }));
    }

    #[test]
    fn test_invalid_url_mentions_base() {
        let base = url::Url::parse("http://host/dir/").unwrap();
        let err = Error::invalid_url("http://[::1", Some(&base), url::ParseError::InvalidIpv6Address);
        assert!(err.to_string().contains("relative to http://host/dir/"));

        let err = Error::invalid_url("nope", None, url::ParseError::RelativeUrlWithoutBase);
        assert!(!err.to_string().contains("relative to"));
    }
}
