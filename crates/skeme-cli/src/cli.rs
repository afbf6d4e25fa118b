//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Skeme - resolve `$ref` references across JSON and YAML documents
///
/// Loads a document from a URL or local path, follows every `$ref` it
/// contains (relative, absolute and with `#path/to/value` fragments) and
/// prints the fully resolved document.
#[derive(Parser, Debug)]
#[command(name = "skeme", version, author, about, long_about = None)]
pub struct Cli {
    /// URL or path of the document to resolve
    #[arg(value_name = "URL", conflicts_with = "url")]
    pub input: Option<String>,

    /// URL or path of the document to resolve
    #[arg(short, long, value_name = "URL")]
    pub url: Option<String>,

    /// Base URL for relative inputs
    #[arg(short, long, env = "SKEME_BASE_URL")]
    pub base_url: Option<String>,

    /// Merge sibling properties into resolved objects and record the original $ref
    #[arg(long)]
    pub keep_refs: bool,

    /// Fetch every reference even if its document was already loaded
    #[arg(long)]
    pub no_cache: bool,

    /// Reject objects whose $ref is not a string
    #[arg(long)]
    pub strict_refs: bool,

    /// Extra request header (can be used multiple times)
    #[arg(short = 'H', long = "header", value_name = "NAME:VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// HTTP timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Write the resolved document to a file instead of stdout
    #[arg(long = "save-to", value_name = "FILE")]
    pub save_to: Option<PathBuf>,

    /// Print shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<Shell>,

    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, env = "SKEME_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for the resolved document [default: human]
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The document to resolve, from either the positional argument or `--url`
    pub fn target(&self) -> Option<&str> {
        self.input.as_deref().or(self.url.as_deref())
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}

/// Parse a `NAME:VALUE` header argument
pub fn parse_header(raw: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:VALUE, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("header name is empty in '{}'", raw));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
