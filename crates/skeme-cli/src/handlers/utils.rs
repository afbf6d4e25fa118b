//! Shared utilities for command handlers

use crate::cli::Cli;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::redaction;
use skeme_core::{FetchOverrides, ResolveOptions};
use std::path::Path;
use tracing::debug;
use url::Url;

/// Turn user input into something the resolver accepts.
///
/// URLs pass through unchanged. Anything else is a filesystem path and
/// becomes a `file://` URL, unless a base URL is configured and no such
/// file exists, in which case the input stays relative to that base.
pub fn input_to_url(input: &str, has_base_url: bool) -> Result<String> {
    if Url::parse(input).is_ok() {
        return Ok(input.to_string());
    }

    let path = Path::new(input);
    if has_base_url && !path.exists() {
        return Ok(input.to_string());
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    Url::from_file_path(&absolute)
        .map(String::from)
        .map_err(|_| Error::invalid_args(format!("cannot turn '{}' into a file URL", input)))
}

/// Base URL from the command line, else from the configuration file
pub fn base_url(cli: &Cli, config: &Config) -> Result<Option<Url>> {
    cli.base_url
        .as_deref()
        .or(config.resolve.base_url.as_deref())
        .map(|raw| {
            Url::parse(raw).map_err(|e| Error::invalid_args(format!("invalid base URL '{}': {}", raw, e)))
        })
        .transpose()
}

/// Build resolver options. Command-line flags win over the configuration file.
pub fn build_options(cli: &Cli, config: &Config, base_url: Option<Url>) -> Result<ResolveOptions> {
    let mut transport = config.http.transport.clone();
    if let Some(timeout) = cli.timeout {
        transport.timeout_secs = timeout;
    }

    let mut overrides = FetchOverrides::new();
    let headers = config
        .http
        .headers
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .chain(cli.headers.iter().map(|(name, value)| (name.as_str(), value.as_str())));
    for (name, value) in headers {
        debug!(header = %name, value = %redaction::redact_header(name, value), "Adding request header");
        overrides = overrides.header(name, value);
    }

    let mut options = ResolveOptions::with_http_config(transport)?
        .with_fetch_options(overrides)
        .with_cache(config.resolve.cache && !cli.no_cache)
        .with_keep_refs(cli.keep_refs || config.resolve.keep_refs)
        .with_strict_refs(cli.strict_refs || config.resolve.strict_refs);

    if let Some(base_url) = base_url {
        options = options.with_base_url(base_url);
    }

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_urls_pass_through() {
        assert_eq!(
            input_to_url("http://host/spec.json#a/b", false).unwrap(),
            "http://host/spec.json#a/b"
        );
        assert_eq!(input_to_url("file:///tmp/spec.json", false).unwrap(), "file:///tmp/spec.json");
    }

    #[test]
    fn test_paths_become_file_urls() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("spec.json");
        fs::write(&path, "{}").unwrap();

        let url = input_to_url(path.to_str().unwrap(), true).unwrap();
        assert_eq!(url, Url::from_file_path(&path).unwrap().as_str());
    }

    #[test]
    fn test_relative_input_kept_when_base_url_is_set() {
        assert_eq!(
            input_to_url("definitely-missing/spec.json", true).unwrap(),
            "definitely-missing/spec.json"
        );
        let url = input_to_url("definitely-missing/spec.json", false).unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("/definitely-missing/spec.json"));
    }

    #[test]
    fn test_cli_flags_win_over_config() {
        let mut config = Config::default();
        config.resolve.base_url = Some("http://config/".to_string());
        config.http.headers.insert("x-team".to_string(), "docs".to_string());
        config.http.transport.timeout_secs = 60;

        let cli = Cli::parse_from([
            "skeme",
            "spec.json",
            "--base-url",
            "http://cli/",
            "--no-cache",
            "--keep-refs",
            "-H",
            "x-team: api",
        ]);

        let base = base_url(&cli, &config).unwrap();
        assert_eq!(base.as_ref().map(Url::as_str), Some("http://cli/"));

        let options = build_options(&cli, &config, base).unwrap();
        assert!(!options.cache);
        assert!(options.keep_refs);
        assert!(!options.strict_refs);
        assert_eq!(options.fetch_options.headers["x-team"], "api");
    }

    #[test]
    fn test_invalid_base_url_is_argument_error() {
        let cli = Cli::parse_from(["skeme", "spec.json", "-b", "not a url"]);
        assert!(matches!(base_url(&cli, &Config::default()), Err(Error::InvalidArgs(_))));
    }
}
